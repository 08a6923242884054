//! Embedding provider domain models and traits

mod provider;
mod vector;

pub use provider::EmbeddingProvider;
pub use vector::{cosine_similarity, dot, is_finite, l2_norm, normalize};

#[cfg(test)]
pub use provider::mock::MockEmbeddingProvider;
