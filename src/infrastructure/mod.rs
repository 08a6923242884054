//! Infrastructure layer - External service implementations

pub mod cache;
pub mod category;
pub mod embedding;
pub mod logging;
pub mod observability;
pub mod services;
