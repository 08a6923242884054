//! Category source backed by a fixed list

use async_trait::async_trait;

use crate::domain::DomainError;
use crate::domain::category::{CategoryRecord, CategorySource};

/// Serves the category names given at construction, in order
#[derive(Debug, Clone, Default)]
pub struct StaticCategorySource {
    categories: Vec<CategoryRecord>,
}

impl StaticCategorySource {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: names.into_iter().map(CategoryRecord::new).collect(),
        }
    }
}

#[async_trait]
impl CategorySource for StaticCategorySource {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, DomainError> {
        Ok(self.categories.clone())
    }
}
