//! Collection lifecycle handlers: create, inspect, list, delete, cover,
//! publish/unpublish and the owner's photo listing.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use fotoart_core::models::{
    BooleanResponse, CollectionsListResponse, CreateCollectionRequest, CreateCollectionResponse,
    PhotosResponse, PublishResponse, UpdateCoverRequest,
};
use fotoart_core::CollectionInfo;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PhotoListQuery {
    /// `uploaded_new` (default), `uploaded_old`, `name_az`, `name_za` or `random`
    pub sort: Option<String>,
    /// Only favorite photos
    pub favorites: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CollectionSearchQuery {
    /// Case-insensitive substring of the collection name
    pub search: Option<String>,
}

#[utoipa::path(
    post,
    path = "/collection/create",
    tag = "collections",
    security(("bearer_auth" = [])),
    request_body = CreateCollectionRequest,
    responses(
        (status = 201, description = "Collection created", body = CreateCollectionResponse),
        (status = 400, description = "Invalid name or date", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %user.user_id))]
pub async fn create_collection(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateCollectionRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request
        .validate()
        .map_err(|e| HttpAppError(e.into()))?;
    let collection = state.collections.create(user.user_id, &request).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateCollectionResponse { id: collection.id }),
    ))
}

#[utoipa::path(
    get,
    path = "/collection/{id}",
    tag = "collections",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Collection ID")),
    responses(
        (status = 200, description = "Collection with owner and photo count", body = CollectionInfo),
        (status = 404, description = "Collection not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn get_collection(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CollectionInfo>, HttpAppError> {
    Ok(Json(state.collections.get_info(user.user_id, id).await?))
}

#[utoipa::path(
    get,
    path = "/collections",
    tag = "collections",
    security(("bearer_auth" = [])),
    params(CollectionSearchQuery),
    responses(
        (status = 200, description = "Collections, newest date first", body = CollectionsListResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn list_collections(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<CollectionSearchQuery>,
) -> Result<Json<CollectionsListResponse>, HttpAppError> {
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let collections = state.collections.list(user.user_id, search).await?;
    Ok(Json(CollectionsListResponse { collections }))
}

#[utoipa::path(
    delete,
    path = "/collection/{id}",
    tag = "collections",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Collection ID")),
    responses(
        (status = 200, description = "Collection, photos and stored objects removed", body = BooleanResponse),
        (status = 404, description = "Collection not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn delete_collection(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BooleanResponse>, HttpAppError> {
    state.collections.delete(user.user_id, id).await?;
    Ok(Json(BooleanResponse::ok()))
}

#[utoipa::path(
    get,
    path = "/collection/{id}/photos",
    tag = "collections",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Collection ID"), PhotoListQuery),
    responses(
        (status = 200, description = "Photos in the resolved order", body = PhotosResponse),
        (status = 404, description = "Collection not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn list_photos(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<PhotoListQuery>,
) -> Result<Json<PhotosResponse>, HttpAppError> {
    let (files, sort) = state
        .photos
        .list_owned(
            user.user_id,
            id,
            query.sort.as_deref(),
            query.favorites.unwrap_or(false),
        )
        .await?;
    Ok(Json(PhotosResponse { files, sort }))
}

#[utoipa::path(
    post,
    path = "/collection/{id}/publish",
    tag = "collections",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Collection ID")),
    responses(
        (status = 200, description = "Public short link", body = PublishResponse),
        (status = 404, description = "Collection not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn publish_collection(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublishResponse>, HttpAppError> {
    let link = state.collections.publish(user.user_id, id).await?;
    Ok(Json(PublishResponse { link }))
}

#[utoipa::path(
    post,
    path = "/collection/{id}/unpublish",
    tag = "collections",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Collection ID")),
    responses(
        (status = 200, description = "Short link removed", body = BooleanResponse),
        (status = 404, description = "Collection not found or not published", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn unpublish_collection(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BooleanResponse>, HttpAppError> {
    state.collections.unpublish(user.user_id, id).await?;
    Ok(Json(BooleanResponse::ok()))
}

#[utoipa::path(
    patch,
    path = "/collection/{id}/cover",
    tag = "collections",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Collection ID")),
    request_body = UpdateCoverRequest,
    responses(
        (status = 200, description = "Cover replaced", body = BooleanResponse),
        (status = 404, description = "Collection or photo not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %user.user_id))]
pub async fn update_cover(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateCoverRequest>,
) -> Result<Json<BooleanResponse>, HttpAppError> {
    state
        .collections
        .update_cover(user.user_id, id, request.photo_id)
        .await?;
    Ok(Json(BooleanResponse::ok()))
}
