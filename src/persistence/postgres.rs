//! PostgreSQL implementation of the tag store.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::TagStore;
use super::models::TagRecord;
use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// PostgreSQL-backed tag store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PgTagStore {
    pool: PgPool,
}

impl PgTagStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds a lazily-connecting pool from the gateway configuration.
    ///
    /// The pool does not dial the database here, so an unreachable backend
    /// surfaces as per-call persistence errors (degraded mode) rather than
    /// a startup failure.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] when the connection
    /// string cannot be parsed.
    pub fn connect(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect_lazy(&config.database_url)
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Applies pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn migrate(&self) -> Result<(), GatewayError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))
    }
}

#[async_trait]
impl TagStore for PgTagStore {
    async fn load_all(&self) -> Result<HashMap<String, String>, GatewayError> {
        let rows = sqlx::query_as::<_, (String, String)>("SELECT id, name FROM tag_records")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(rows.into_iter().collect())
    }

    async fn upsert(&self, id: &str, name: &str) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO tag_records (id, name) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, updated_at = NOW()",
        )
        .bind(id)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), GatewayError> {
        sqlx::query("DELETE FROM tag_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<TagRecord>, GatewayError> {
        let rows = sqlx::query_as::<_, (String, String, DateTime<Utc>)>(
            "SELECT id, name, updated_at FROM tag_records ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, name, updated_at)| TagRecord {
                id,
                name,
                updated_at,
            })
            .collect())
    }
}
