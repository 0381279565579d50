//! Unauthenticated access to published collections

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use fotoart_core::{PublicCollection, ShortLinkInfo};

use super::collections::PhotoListQuery;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Count a visit and redirect to the public listing
#[utoipa::path(
    get,
    path = "/s/{token}",
    tag = "public",
    params(("token" = String, Path, description = "Short-link token")),
    responses(
        (status = 302, description = "Redirect to the public listing"),
        (status = 404, description = "Unknown token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn resolve_short_link(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let location = state.collections.resolve_public_token(&token).await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]))
}

#[utoipa::path(
    get,
    path = "/public/{token}",
    tag = "public",
    params(("token" = String, Path, description = "Short-link token"), PhotoListQuery),
    responses(
        (status = 200, description = "Published collection", body = PublicCollection),
        (status = 404, description = "Unknown token or collection not published", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn public_collection(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Query(query): Query<PhotoListQuery>,
) -> Result<Json<PublicCollection>, HttpAppError> {
    let collection = state
        .photos
        .public_collection(
            &token,
            query.sort.as_deref(),
            query.favorites.unwrap_or(false),
        )
        .await?;
    Ok(Json(collection))
}

/// Link metadata for previews. Does not count a visit.
#[utoipa::path(
    get,
    path = "/short-link/{token}",
    tag = "public",
    params(("token" = String, Path, description = "Short-link token")),
    responses(
        (status = 200, description = "Link with collection name, owner and covers", body = ShortLinkInfo),
        (status = 404, description = "Unknown token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn short_link_info(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<ShortLinkInfo>, HttpAppError> {
    Ok(Json(state.collections.short_link_info(&token).await?))
}
