//! Persistence gateway for tag name records.
//!
//! [`TagStore`] is the narrow interface between the relay core and the
//! storage technology behind the tag name table. The PostgreSQL
//! implementation is the production backend; the in-memory one backs tests
//! and persistence-disabled deployments.

pub mod memory;
pub mod models;
pub mod postgres;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::GatewayError;
use self::models::TagRecord;

/// Narrow storage interface backing the tag name table.
///
/// Implementations must provide atomic single-key upsert and delete so no
/// read-modify-write race exists at the storage layer.
#[async_trait]
pub trait TagStore: std::fmt::Debug + Send + Sync {
    /// Loads every stored id → name pair.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] when the backend is
    /// unavailable.
    async fn load_all(&self) -> Result<HashMap<String, String>, GatewayError>;

    /// Inserts or replaces the name for `id` atomically.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] when the backend is
    /// unavailable.
    async fn upsert(&self, id: &str, name: &str) -> Result<(), GatewayError>;

    /// Deletes the record for `id`. Deleting an absent record is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] when the backend is
    /// unavailable.
    async fn delete(&self, id: &str) -> Result<(), GatewayError>;

    /// Lists full records for the admin surface.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PersistenceError`] when the backend is
    /// unavailable.
    async fn list(&self) -> Result<Vec<TagRecord>, GatewayError>;
}
