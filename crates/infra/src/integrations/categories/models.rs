//! Wire types for the category registry API

use catalog_domain::ResourceSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category as returned by `GET /{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Missing means active
    #[serde(default, alias = "active")]
    pub is_active: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CategoryDto {
    pub fn is_active(&self) -> bool {
        self.is_active.unwrap_or(true)
    }
}

impl From<CategoryDto> for ResourceSnapshot {
    fn from(dto: CategoryDto) -> Self {
        let active = dto.is_active();
        Self {
            id: dto.id,
            name: dto.name,
            description: dto.description,
            active,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
            deleted_at: dto.deleted_at,
        }
    }
}

impl From<&ResourceSnapshot> for CategoryDto {
    fn from(snapshot: &ResourceSnapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            name: snapshot.name.clone(),
            description: snapshot.description.clone(),
            is_active: Some(snapshot.active),
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            deleted_at: snapshot.deleted_at,
        }
    }
}
