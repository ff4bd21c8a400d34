//! Shared HTTP building blocks

pub mod api_response;
pub mod error;
pub mod validated_json;

pub use api_response::ApiResponse;
pub use error::{ok, ApiError, ApiResult};
pub use validated_json::ValidatedJson;
