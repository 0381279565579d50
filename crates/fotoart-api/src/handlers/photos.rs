use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use fotoart_core::models::{BooleanResponse, FavoriteRequest};
use fotoart_core::UploadedPhoto;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[utoipa::path(
    delete,
    path = "/photo/{id}",
    tag = "photos",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Photo ID")),
    responses(
        (status = 200, description = "Photo removed", body = BooleanResponse),
        (status = 404, description = "Photo not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn delete_photo(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BooleanResponse>, HttpAppError> {
    state.photos.delete(user.user_id, id).await?;
    Ok(Json(BooleanResponse::ok()))
}

#[utoipa::path(
    patch,
    path = "/photo/{id}/favorite",
    tag = "photos",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Photo ID")),
    request_body = FavoriteRequest,
    responses(
        (status = 200, description = "Updated photo", body = UploadedPhoto),
        (status = 404, description = "Photo not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn set_favorite(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<FavoriteRequest>,
) -> Result<Json<UploadedPhoto>, HttpAppError> {
    let photo = state
        .photos
        .set_favorite(user.user_id, id, request.is_favorite)
        .await?;
    Ok(Json(photo))
}
