pub mod collection;
pub mod payment;
pub mod photo;
pub mod short_link;
pub mod sort;
pub mod user;

pub use collection::*;
pub use payment::*;
pub use photo::*;
pub use short_link::*;
pub use sort::PhotoSort;
pub use user::*;

use serde::Serialize;
use utoipa::ToSchema;

/// Generic `{"success": true}` body
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BooleanResponse {
    pub success: bool,
}

impl BooleanResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
