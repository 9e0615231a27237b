//! Video search: query composition, store port and use-case

pub mod builder;
pub mod ports;
pub mod query;
pub mod service;

pub use builder::{build, sort_field};
pub use ports::{RawSearchPage, VideoStore};
pub use query::{Clause, ClauseValue, PageRequest, QueryDescription, SortOrder};
pub use service::VideoSearchService;
