//! Domain types and models

pub mod resource;
pub mod search;
pub mod video;

pub use resource::ResourceSnapshot;
pub use search::{SearchCriteria, SearchResultPage, SortDirection, VideoFilters, DEFAULT_SORT};
pub use video::{Rating, Video, VideoDocument};
