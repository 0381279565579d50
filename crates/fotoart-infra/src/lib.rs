//! Fotoart Infrastructure Library
//!
//! Shared plumbing for the HTTP service:
//! - Telemetry initialization
//! - Middleware (request ID, security headers)
//! - The JSON error body

pub mod error;
pub mod middleware;
pub mod telemetry;

pub use error::ErrorResponse;
pub use middleware::{
    get_request_id, request_id_middleware, security_headers_middleware, RequestId,
    SecurityHeaders, REQUEST_ID_HEADER,
};
pub use telemetry::{init_telemetry, LogFormat};
