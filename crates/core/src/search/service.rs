//! Video search use-case

use std::sync::Arc;

use catalog_domain::{Result, SearchCriteria, SearchResultPage, Video};
use tracing::{debug, instrument};

use super::builder;
use super::ports::VideoStore;

/// Paginated, filtered video listing over a [`VideoStore`]
pub struct VideoSearchService {
    store: Arc<dyn VideoStore>,
}

impl VideoSearchService {
    pub fn new(store: Arc<dyn VideoStore>) -> Self {
        Self { store }
    }

    /// Run `criteria` against the store
    ///
    /// `total_hits` is the store's reported total, not the page length.
    #[instrument(skip(self, criteria), fields(page = criteria.page, per_page = criteria.per_page))]
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<SearchResultPage<Video>> {
        let (query, page) = builder::build(criteria);
        debug!(clauses = query.clauses().len(), sort = %page.sort.field, "Executing video search");

        let raw = self.store.search(&query, &page).await?;
        let items = raw.hits.into_iter().map(Video::from).collect();

        Ok(SearchResultPage::new(criteria.page, criteria.per_page, raw.total_hits, items))
    }
}
