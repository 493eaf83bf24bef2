//! Storage models for the tag name table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored row from the `tag_records` table.
///
/// An empty `name` marks a tag that has been seen but never registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRecord {
    /// Tag identifier (EPC), the primary key.
    pub id: String,
    /// Display name; empty for unregistered tags.
    pub name: String,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}
