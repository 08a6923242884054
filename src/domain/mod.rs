//! Domain layer - core types, traits and algorithms

pub mod cache;
pub mod category;
pub mod embedding;
mod error;

pub use error::DomainError;
