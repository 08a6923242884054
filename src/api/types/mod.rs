//! API request/response types

pub mod categorize;
pub mod error;
pub mod json;

pub use categorize::{CategorizeRequest, CategorizeResponse};
pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
