use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Cache unavailable: {message}")]
    CacheUnavailable { message: String },

    #[error("Timed out waiting for lock on '{key}'")]
    LockTimeout { key: String },

    #[error("Embedding computation failed for '{key}': {message}")]
    ComputationFailed { key: String, message: String },

    #[error("Category registry not initialized")]
    RegistryNotInitialized,

    #[error("Category registry cannot be built from an empty category list")]
    EmptyRegistry,

    #[error("Category registry rebuild failed at '{category}': {message}")]
    RegistryRebuildFailed { category: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    pub fn cache_unavailable(message: impl Into<String>) -> Self {
        Self::CacheUnavailable {
            message: message.into(),
        }
    }

    pub fn lock_timeout(key: impl Into<String>) -> Self {
        Self::LockTimeout { key: key.into() }
    }

    pub fn computation_failed(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ComputationFailed {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn rebuild_failed(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RegistryRebuildFailed {
            category: category.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the error stems from the caller's input rather than the service
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. } | Self::DimensionMismatch { .. } | Self::EmptyRegistry
        )
    }
}
