//! Search request and response values

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::video::Rating;
use crate::errors::{CatalogError, Result};

/// Default sort field for video searches
pub const DEFAULT_SORT: &str = "title";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(CatalogError::InvalidInput(format!("unknown sort direction '{other}'"))),
        }
    }
}

/// Optional video filters; `None` means "not filtered on"
///
/// The `with_*` constructors normalise empty collections to `None` so an
/// empty set never turns into a clause that matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoFilters {
    pub categories: Option<BTreeSet<String>>,
    pub genres: Option<BTreeSet<String>>,
    pub cast_members: Option<BTreeSet<String>>,
    pub launched_at: Option<i32>,
    pub rating: Option<Rating>,
}

impl VideoFilters {
    pub fn with_categories<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = non_empty_set(ids);
        self
    }

    pub fn with_genres<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = non_empty_set(ids);
        self
    }

    pub fn with_cast_members<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cast_members = non_empty_set(ids);
        self
    }

    pub fn with_launched_at(mut self, year: Option<i32>) -> Self {
        self.launched_at = year;
        self
    }

    pub fn with_rating(mut self, rating: Option<Rating>) -> Self {
        self.rating = rating;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_none()
            && self.genres.is_none()
            && self.cast_members.is_none()
            && self.launched_at.is_none()
            && self.rating.is_none()
    }
}

fn non_empty_set<I, S>(ids: I) -> Option<BTreeSet<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let set: BTreeSet<String> = ids
        .into_iter()
        .map(Into::into)
        .filter(|id: &String| !id.trim().is_empty())
        .collect();
    (!set.is_empty()).then_some(set)
}

/// Paginated, filtered video search request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Zero-based page index
    pub page: u32,
    pub per_page: u32,
    pub terms: Option<String>,
    pub sort: String,
    pub direction: SortDirection,
    pub filters: VideoFilters,
}

impl SearchCriteria {
    /// First-class constructor; `per_page` must be positive
    pub fn new(page: u32, per_page: u32) -> Result<Self> {
        if per_page == 0 {
            return Err(CatalogError::InvalidInput("per_page must be greater than 0".to_string()));
        }
        Ok(Self {
            page,
            per_page,
            terms: None,
            sort: DEFAULT_SORT.to_string(),
            direction: SortDirection::Asc,
            filters: VideoFilters::default(),
        })
    }

    /// Free-text terms; blank input counts as absent
    pub fn with_terms(mut self, terms: impl Into<String>) -> Self {
        let terms = terms.into();
        let trimmed = terms.trim();
        self.terms = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Sort field and direction; a blank field keeps the default
    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        let field = field.into();
        if !field.trim().is_empty() {
            self.sort = field.trim().to_string();
        }
        self.direction = direction;
        self
    }

    pub fn with_filters(mut self, filters: VideoFilters) -> Self {
        self.filters = filters;
        self
    }
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultPage<T> {
    pub current_page: u32,
    pub per_page: u32,
    /// Total matches reported by the store, not the length of `items`
    pub total_hits: u64,
    pub items: Vec<T>,
}

impl<T> SearchResultPage<T> {
    pub fn new(current_page: u32, per_page: u32, total_hits: u64, items: Vec<T>) -> Self {
        Self { current_page, per_page, total_hits, items }
    }

    pub fn empty(current_page: u32, per_page: u32) -> Self {
        Self::new(current_page, per_page, 0, Vec::new())
    }

    /// Transform every item, keeping the page envelope
    pub fn map<U, F>(self, f: F) -> SearchResultPage<U>
    where
        F: FnMut(T) -> U,
    {
        SearchResultPage {
            current_page: self.current_page,
            per_page: self.per_page,
            total_hits: self.total_hits,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}
