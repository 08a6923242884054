//! PostgreSQL category source

use std::time::Duration;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::domain::DomainError;
use crate::domain::category::{CategoryRecord, CategorySource};

const DEFAULT_TABLE: &str = "services_servicetype";

/// PostgreSQL category source configuration
#[derive(Debug, Clone)]
pub struct PostgresCategoryConfig {
    /// Database connection URL
    pub url: String,
    /// Table holding `(id, name)` rows
    pub table: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for PostgresCategoryConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/services".to_string(),
            table: DEFAULT_TABLE.to_string(),
            max_connections: 2,
            connect_timeout_secs: 30,
        }
    }
}

impl PostgresCategoryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// Reads category names from a relational table, ordered by primary key
#[derive(Debug, Clone)]
pub struct PostgresCategorySource {
    pool: PgPool,
    query: String,
}

impl PostgresCategorySource {
    /// Creates a source over an existing pool
    pub fn new(pool: PgPool, table: &str) -> Result<Self, DomainError> {
        validate_table_name(table)?;

        Ok(Self {
            pool,
            query: format!("SELECT name FROM {} ORDER BY id", table),
        })
    }

    /// Connects a pool and creates the source
    pub async fn connect(config: &PostgresCategoryConfig) -> Result<Self, DomainError> {
        validate_table_name(&config.table)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        Self::new(pool, &config.table)
    }
}

#[async_trait]
impl CategorySource for PostgresCategorySource {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, DomainError> {
        let rows = sqlx::query(&self.query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list categories: {}", e)))?;

        let mut categories = Vec::with_capacity(rows.len());

        for row in rows {
            let name: String = row
                .try_get("name")
                .map_err(|e| DomainError::storage(format!("Invalid category row: {}", e)))?;
            categories.push(CategoryRecord::new(name));
        }

        Ok(categories)
    }
}

/// Table names are interpolated into SQL and must be plain identifiers
fn validate_table_name(table: &str) -> Result<(), DomainError> {
    let valid = !table.is_empty()
        && !table.starts_with(|c: char| c.is_ascii_digit())
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');

    if valid {
        Ok(())
    } else {
        Err(DomainError::configuration(format!(
            "Invalid category table name: '{}'",
            table
        )))
    }
}
