//! Route configuration and setup

use crate::auth::auth_middleware;
use crate::error::set_hide_error_details;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{delete, get, patch, post},
    Json, Router,
};
use fotoart_core::{Config, StorageBackend};
use fotoart_infra::{request_id_middleware, security_headers_middleware, SecurityHeaders};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// In-flight request cap; uploads hold a slot for the whole body.
const HTTP_CONCURRENCY_LIMIT: usize = 512;

/// Build the full router. Needs only the state, so tests can run it over
/// in-memory repositories.
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    set_hide_error_details(config.is_production());

    let protected = protected_routes(config).route_layer(
        axum::middleware::from_fn_with_state(state.clone(), auth_middleware),
    );

    let mut app = public_routes().merge(protected);
    if let Some(mount) = local_media_mount(config) {
        tracing::info!(
            mount = %mount,
            root = %config.storage.local_storage_path,
            "Serving local storage"
        );
        app = app.nest_service(&mount, ServeDir::new(&config.storage.local_storage_path));
    }

    let app = app
        .layer(ConcurrencyLimitLayer::new(HTTP_CONCURRENCY_LIMIT))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn_with_state(
            SecurityHeaders::for_environment(config.is_production()),
            security_headers_middleware,
        ))
        .with_state(state);

    Ok(app)
}

/// Public routes (no authentication required)
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(crate::api_doc::ApiDoc::openapi()) }),
        )
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/auth/reset-password", post(handlers::auth::reset_password))
        .route("/s/{token}", get(handlers::public::resolve_short_link))
        .route("/public/{token}", get(handlers::public::public_collection))
        .route("/short-link/{token}", get(handlers::public::short_link_info))
        .route("/payment/webhook", post(handlers::payments::payment_webhook))
}

/// Protected routes (bearer access token required)
fn protected_routes(config: &Config) -> Router<Arc<AppState>> {
    Router::new()
        .route("/profile", get(handlers::auth::profile))
        .route(
            "/collection/create",
            post(handlers::collections::create_collection),
        )
        .route("/collections", get(handlers::collections::list_collections))
        .route(
            "/collection/{id}",
            get(handlers::collections::get_collection)
                .delete(handlers::collections::delete_collection),
        )
        .route(
            "/collection/{id}/photos",
            get(handlers::collections::list_photos),
        )
        .route(
            "/collection/{id}/publish",
            post(handlers::collections::publish_collection),
        )
        .route(
            "/collection/{id}/unpublish",
            post(handlers::collections::unpublish_collection),
        )
        .route(
            "/collection/{id}/cover",
            patch(handlers::collections::update_cover),
        )
        .route(
            "/upload",
            post(handlers::upload::upload_photos)
                .layer(DefaultBodyLimit::max(config.max_upload_size_bytes())),
        )
        .route("/photo/{id}", delete(handlers::photos::delete_photo))
        .route(
            "/photo/{id}/favorite",
            patch(handlers::photos::set_favorite),
        )
        .route("/payment/create", post(handlers::payments::create_payment))
        .route(
            "/payment/{id}/status",
            get(handlers::payments::payment_status),
        )
        .route("/subscription", get(handlers::payments::subscription))
}

/// Path under which the local backend's public URLs point back at this
/// server, taken from the base URL. `None` for S3 or a root/empty path.
fn local_media_mount(config: &Config) -> Option<String> {
    if config.storage.backend != StorageBackend::Local {
        return None;
    }
    let base = config.storage.local_storage_base_url.as_str();
    let after_scheme = base.split_once("://").map_or(base, |(_, rest)| rest);
    let path = after_scheme.find('/').map(|i| &after_scheme[i..])?;
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if config.base.cors_origins.iter().any(|o| o == "*") {
        if config.is_production() {
            tracing::warn!("CORS configured to allow all origins - not recommended for production");
        }
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .base
            .cors_origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let mut vars: Vec<(String, String)> = vec![
            ("DATABASE_URL".into(), "postgresql://localhost/fotoart".into()),
            ("JWT_SECRET".into(), "0123456789abcdef0123456789abcdef".into()),
        ];
        vars.extend(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        Config::from_lookup(|key| {
            vars.iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    #[test]
    fn test_local_media_mount_from_base_url() {
        let local = config(&[("STORAGE_BACKEND", "local")]);
        assert_eq!(local_media_mount(&local).as_deref(), Some("/media"));

        let nested = config(&[
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_BASE_URL", "https://cdn.example.com/files/photos/"),
        ]);
        assert_eq!(local_media_mount(&nested).as_deref(), Some("/files/photos"));

        let root = config(&[
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_BASE_URL", "https://files.example.com"),
        ]);
        assert_eq!(local_media_mount(&root), None);

        let s3 = config(&[("STORAGE_BACKEND", "s3"), ("S3_BUCKET", "photos")]);
        assert_eq!(local_media_mount(&s3), None);
    }
}
