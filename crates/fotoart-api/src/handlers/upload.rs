//! Multipart photo upload

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use fotoart_core::models::UploadResponse;
use fotoart_core::AppError;
use fotoart_services::UploadFile;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

/// Multipart form accepted by `/upload`
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    collection_id: Uuid,
    #[schema(value_type = Vec<String>, format = Binary)]
    files: Vec<Vec<u8>>,
}

/// Upload one or more photos into a collection
///
/// The form carries a `collection_id` text field and one or more `files`
/// parts. Files are stored in form order; a storage failure aborts the rest
/// of the batch, leaving the files before it stored.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "photos",
    security(("bearer_auth" = [])),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Stored photos", body = UploadResponse),
        (status = 400, description = "Missing collection_id or files", body = ErrorResponse),
        (status = 404, description = "Collection not found", body = ErrorResponse),
        (status = 413, description = "Body exceeds the upload limit"),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(user_id = %user.user_id))]
pub async fn upload_photos(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let mut collection_id = None;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "collection_id" => {
                let raw = field.text().await?;
                let id = Uuid::parse_str(raw.trim()).map_err(|_| {
                    AppError::InvalidInput(format!("Invalid collection_id: {}", raw.trim()))
                })?;
                collection_id = Some(id);
            }
            "files" | "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                files.push(UploadFile {
                    file_name,
                    data: data.to_vec(),
                });
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    let collection_id = collection_id
        .ok_or_else(|| AppError::InvalidInput("collection_id is required".to_string()))?;

    let files = state
        .uploads
        .upload_batch(user.user_id, collection_id, files)
        .await?;
    Ok(Json(UploadResponse { files }))
}
