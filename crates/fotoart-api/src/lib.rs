//! Fotoart API Library
//!
//! HTTP boundary of the photo-collection service: routing, authentication,
//! error mapping, OpenAPI and application setup. Handlers stay thin and call
//! into `fotoart-services`.

mod api_doc;
mod handlers;

pub mod auth;
pub mod error;
pub mod setup;
pub mod state;

pub use api_doc::ApiDoc;
pub use error::{ErrorResponse, HttpAppError};
pub use state::{AppState, Repositories};
