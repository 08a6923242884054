//! Category registry: the live set of category embeddings

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::DomainError;
use crate::domain::embedding::{is_finite, normalize};

/// A category label and its raw embedding
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryEntry {
    pub name: String,
    pub embedding: Vec<f32>,
}

impl CategoryEntry {
    pub fn new(name: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            embedding,
        }
    }
}

/// Immutable, internally consistent view of the category set.
///
/// Row `i` of the matrix belongs to `names[i]`. Raw rows are kept as produced
/// by the provider; unit-normalized copies are computed once at construction.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    names: Vec<String>,
    matrix: Vec<f32>,
    normalized: Vec<f32>,
    dimensions: usize,
}

impl RegistrySnapshot {
    /// Snapshot with no categories, the state before the first rebuild
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a snapshot from entries in row order
    pub fn from_entries(entries: Vec<CategoryEntry>) -> Result<Self, DomainError> {
        let Some(first) = entries.first() else {
            return Err(DomainError::EmptyRegistry);
        };

        let dimensions = first.embedding.len();

        if dimensions == 0 {
            return Err(DomainError::invalid_argument(format!(
                "Category '{}' has an empty embedding",
                first.name
            )));
        }

        let mut seen = HashSet::with_capacity(entries.len());
        let mut names = Vec::with_capacity(entries.len());
        let mut matrix = Vec::with_capacity(entries.len() * dimensions);
        let mut normalized = Vec::with_capacity(entries.len() * dimensions);

        for entry in entries {
            if !seen.insert(entry.name.clone()) {
                return Err(DomainError::invalid_argument(format!(
                    "Duplicate category '{}'",
                    entry.name
                )));
            }

            if entry.embedding.len() != dimensions {
                return Err(DomainError::dimension_mismatch(
                    dimensions,
                    entry.embedding.len(),
                ));
            }

            if !is_finite(&entry.embedding) {
                return Err(DomainError::invalid_argument(format!(
                    "Category '{}' has non-finite embedding components",
                    entry.name
                )));
            }

            normalized.extend(normalize(&entry.embedding));
            matrix.extend(entry.embedding);
            names.push(entry.name);
        }

        Ok(Self {
            names,
            matrix,
            normalized,
            dimensions,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Category names in row order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Shared dimensionality of every row (0 when empty)
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Raw embedding of row `index`
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        self.slice(&self.matrix, index)
    }

    /// Unit-normalized embedding of row `index`
    pub fn normalized_row(&self, index: usize) -> Option<&[f32]> {
        self.slice(&self.normalized, index)
    }

    /// Raw embedding of the named category
    pub fn embedding(&self, name: &str) -> Option<&[f32]> {
        let index = self.names.iter().position(|n| n == name)?;
        self.row(index)
    }

    fn slice<'a>(&self, data: &'a [f32], index: usize) -> Option<&'a [f32]> {
        if index >= self.names.len() {
            return None;
        }

        let start = index * self.dimensions;
        Some(&data[start..start + self.dimensions])
    }
}

/// Holder of the live snapshot.
///
/// Readers take an `Arc` to the current snapshot and keep using it while a
/// replacement is installed; a swap is a single pointer exchange.
#[derive(Debug, Default)]
pub struct CategoryRegistry {
    current: RwLock<Arc<RegistrySnapshot>>,
}

impl CategoryRegistry {
    /// Creates an uninitialized registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry serving `snapshot`
    pub fn with_snapshot(snapshot: RegistrySnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Installs `snapshot`, returning the one it replaced
    pub fn replace(&self, snapshot: RegistrySnapshot) -> Arc<RegistrySnapshot> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, Arc::new(snapshot))
    }

    pub fn is_initialized(&self) -> bool {
        !self.snapshot().is_empty()
    }
}
