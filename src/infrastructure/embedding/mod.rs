//! Embedding provider implementations

mod openai;

pub use openai::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
