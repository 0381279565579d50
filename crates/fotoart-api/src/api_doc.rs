//! OpenAPI documentation, served at `/api-docs/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use fotoart_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fotoart API",
        version = "0.1.0",
        description = "Photographers upload photos into dated collections, publish them through short links and pay for storage subscriptions."
    ),
    paths(
        // Auth
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::forgot_password,
        handlers::auth::reset_password,
        handlers::auth::profile,
        // Collections
        handlers::collections::create_collection,
        handlers::collections::get_collection,
        handlers::collections::list_collections,
        handlers::collections::delete_collection,
        handlers::collections::list_photos,
        handlers::collections::publish_collection,
        handlers::collections::unpublish_collection,
        handlers::collections::update_cover,
        // Photos
        handlers::upload::upload_photos,
        handlers::photos::delete_photo,
        handlers::photos::set_favorite,
        // Public
        handlers::public::resolve_short_link,
        handlers::public::public_collection,
        handlers::public::short_link_info,
        // Payments
        handlers::payments::create_payment,
        handlers::payments::payment_status,
        handlers::payments::subscription,
        handlers::payments::payment_webhook,
        // Health
        handlers::health::health_check,
    ),
    components(
        schemas(
            // Users
            models::RegisterRequest,
            models::LoginRequest,
            models::RefreshRequest,
            models::ForgotPasswordRequest,
            models::ResetPasswordRequest,
            models::TokenResponse,
            models::ProfileResponse,
            // Collections
            models::Collection,
            models::CollectionInfo,
            models::CreateCollectionRequest,
            models::CreateCollectionResponse,
            models::CollectionsListResponse,
            models::UpdateCoverRequest,
            models::PublishResponse,
            // Photos
            models::UploadedPhoto,
            models::UploadResponse,
            models::PhotosResponse,
            models::FavoriteRequest,
            models::PhotoSort,
            // Short links
            models::ShortLink,
            models::ShortLinkInfo,
            models::PublicCollection,
            // Payments
            models::SubscriptionPlan,
            models::PaymentStatus,
            models::PaymentRecord,
            models::CreatePaymentRequest,
            models::CreatePaymentResponse,
            models::PaymentStatusResponse,
            models::SubscriptionInfo,
            // Common
            models::BooleanResponse,
            handlers::health::HealthResponse,
            handlers::upload::UploadForm,
            error::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login, token refresh and password reset"),
        (name = "collections", description = "Collection management and publishing"),
        (name = "photos", description = "Photo upload, deletion and favorites"),
        (name = "public", description = "Unauthenticated access through short links"),
        (name = "payments", description = "Subscription purchase and payment processor webhooks"),
        (name = "health", description = "Service health checks")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
