//! DTOs for the admin tag record endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::persistence::models::TagRecord;

/// A stored tag record as returned by the admin surface.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TagRecordDto {
    /// Tag identifier (EPC).
    pub id: String,
    /// Display name; empty for unregistered tags.
    pub name: String,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<TagRecord> for TagRecordDto {
    fn from(record: TagRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            updated_at: record.updated_at,
        }
    }
}

/// Response for `GET /api/v1/tags`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TagListResponse {
    /// Stored records, most recently updated first.
    pub data: Vec<TagRecordDto>,
    /// Total record count.
    pub total: usize,
}

/// Request body for `PUT /api/v1/tags/{id}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpsertTagRequest {
    /// New display name; must be non-empty (use DELETE to clear a record).
    pub name: String,
}

/// Response for `PUT /api/v1/tags/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TagUpsertResponse {
    /// Tag identifier.
    pub id: String,
    /// Canonical stored name.
    pub name: String,
}
