//! Category source trait

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A category as listed by the source of truth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub name: String,
}

impl CategoryRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Lists the categories the registry is built from. Consumed once per rebuild.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategorySource: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, DomainError>;
}
