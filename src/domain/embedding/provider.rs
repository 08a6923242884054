//! Embedding provider trait definition

use std::fmt::Debug;

use crate::domain::DomainError;

/// Turns text into a fixed-length vector.
///
/// `encode` is synchronous and may block for tens to hundreds of
/// milliseconds; async callers must run it on the blocking pool.
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Generate the embedding for a single text
    fn encode(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Dimensionality of produced vectors, if known up front
    fn dimensions(&self) -> Option<usize>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Deterministic provider that counts calls and can simulate latency and failures
    #[derive(Debug)]
    pub struct MockEmbeddingProvider {
        dimensions: usize,
        latency: Option<Duration>,
        fixed: HashMap<String, Vec<f32>>,
        failing: Mutex<HashSet<String>>,
        calls: AtomicUsize,
    }

    impl MockEmbeddingProvider {
        pub fn new(dimensions: usize) -> Self {
            Self {
                dimensions,
                latency: None,
                fixed: HashMap::new(),
                failing: Mutex::new(HashSet::new()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        /// Return `vector` whenever `text` is encoded
        pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
            self.fixed.insert(text.to_string(), vector);
            self
        }

        /// Fail whenever `text` is encoded
        pub fn with_failure(self, text: &str) -> Self {
            self.failing.lock().unwrap().insert(text.to_string());
            self
        }

        pub fn fail_on(&self, text: &str) {
            self.failing.lock().unwrap().insert(text.to_string());
        }

        pub fn clear_failures(&self) {
            self.failing.lock().unwrap().clear();
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl EmbeddingProvider for MockEmbeddingProvider {
        fn encode(&self, text: &str) -> Result<Vec<f32>, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(latency) = self.latency {
                std::thread::sleep(latency);
            }

            if self.failing.lock().unwrap().contains(text) {
                return Err(DomainError::internal(format!("mock failure for '{}'", text)));
            }

            if let Some(vector) = self.fixed.get(text) {
                return Ok(vector.clone());
            }

            // Deterministic mock embedding based on text hash
            let hash = text
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            Ok((0..self.dimensions)
                .map(|i| ((hash.wrapping_add(i as u64 * 7919) % 1000) as f32 / 1000.0) - 0.5)
                .collect())
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }

        fn dimensions(&self) -> Option<usize> {
            Some(self.dimensions)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_mock_provider_dimensions() {
            let provider = MockEmbeddingProvider::new(16);

            let vector = provider.encode("Hello").unwrap();

            assert_eq!(vector.len(), 16);
            assert_eq!(provider.calls(), 1);
        }

        #[test]
        fn test_deterministic_embeddings() {
            let provider = MockEmbeddingProvider::new(8);

            assert_eq!(provider.encode("Hello").unwrap(), provider.encode("Hello").unwrap());
            assert_ne!(provider.encode("Hello").unwrap(), provider.encode("World").unwrap());
        }

        #[test]
        fn test_fixed_vector_and_failure() {
            let provider = MockEmbeddingProvider::new(3)
                .with_vector("a", vec![1.0, 0.0, 0.0])
                .with_failure("b");

            assert_eq!(provider.encode("a").unwrap(), vec![1.0, 0.0, 0.0]);
            assert!(provider.encode("b").is_err());

            provider.clear_failures();
            assert!(provider.encode("b").is_ok());
        }
    }
}
