//! Category source implementations

mod postgres;
mod static_source;

pub use postgres::{PostgresCategoryConfig, PostgresCategorySource};
pub use static_source::StaticCategorySource;
