//! Snapshot of a resource owned by a remote service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Denormalized copy of a remote resource (e.g. a category)
///
/// Immutable once built; callers get their own clone on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ResourceSnapshot {
    /// Soft-deleted resources keep their data but carry a deletion instant
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
