//! Port interfaces for the video document store

use async_trait::async_trait;
use catalog_domain::{Result, VideoDocument};

use super::query::{PageRequest, QueryDescription};

/// Raw page returned by a store
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawSearchPage {
    /// Total matches, independent of the page window
    pub total_hits: u64,
    pub hits: Vec<VideoDocument>,
}

/// Document store holding indexed videos
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Insert or replace a document by id
    async fn save(&self, document: VideoDocument) -> Result<VideoDocument>;

    /// Delete a document; a blank id is a no-op
    async fn delete_by_id(&self, id: &str) -> Result<()>;

    /// Find a document; a blank id yields `None`
    async fn find_by_id(&self, id: &str) -> Result<Option<VideoDocument>>;

    /// Execute a composed query
    async fn search(&self, query: &QueryDescription, page: &PageRequest) -> Result<RawSearchPage>;
}
