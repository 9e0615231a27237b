//! Store-neutral query description
//!
//! A [`QueryDescription`] is a conjunction of [`Clause`]s. Adapters render it
//! to their own dialect (Elasticsearch DSL, in-process evaluation); nothing
//! here knows about a concrete store.

use catalog_domain::SortDirection;
use serde::{Deserialize, Serialize};

/// Indexed field names
pub mod fields {
    pub const PUBLISHED: &str = "published";
    pub const CATEGORIES: &str = "categories";
    pub const GENRES: &str = "genres";
    pub const CAST_MEMBERS: &str = "cast_members";
    pub const LAUNCHED_AT: &str = "launched_at";
    pub const RATING: &str = "rating";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";

    /// Suffix of the exact-match sub-field of an analyzed text field
    pub const KEYWORD_SUFFIX: &str = ".keyword";

    /// Analyzed free-text fields; sorting on them goes through the keyword sub-field
    pub const FREE_TEXT: [&str; 2] = [TITLE, DESCRIPTION];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClauseValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<bool> for ClauseValue {
    fn from(value: bool) -> Self {
        ClauseValue::Bool(value)
    }
}

impl From<i32> for ClauseValue {
    fn from(value: i32) -> Self {
        ClauseValue::Int(i64::from(value))
    }
}

impl From<&str> for ClauseValue {
    fn from(value: &str) -> Self {
        ClauseValue::Text(value.to_string())
    }
}

/// One filter clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Clause {
    /// Exact equality on a single-valued field, or membership for a multi-valued one
    Term { field: String, value: ClauseValue },
    /// Field contains any of `values`
    Terms { field: String, values: Vec<String> },
    /// Case-insensitive substring match
    Contains { field: String, text: String },
    /// At least `minimum_should_match` of `should` hold
    AnyOf { should: Vec<Clause>, minimum_should_match: u32 },
}

impl Clause {
    pub fn term(field: &str, value: impl Into<ClauseValue>) -> Self {
        Clause::Term { field: field.to_string(), value: value.into() }
    }

    pub fn terms<I, S>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Clause::Terms { field: field.to_string(), values: values.into_iter().map(Into::into).collect() }
    }

    pub fn contains(field: &str, text: &str) -> Self {
        Clause::Contains { field: field.to_string(), text: text.to_string() }
    }

    /// Whether this clause, or any clause nested in it, targets `field`
    pub fn targets(&self, field: &str) -> bool {
        match self {
            Clause::Term { field: f, .. }
            | Clause::Terms { field: f, .. }
            | Clause::Contains { field: f, .. } => f == field,
            Clause::AnyOf { should, .. } => should.iter().any(|c| c.targets(field)),
        }
    }
}

/// Conjunction of filter clauses
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryDescription {
    filters: Vec<Clause>,
}

impl QueryDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, clause: Clause) -> Self {
        self.filters.push(clause);
        self
    }

    pub fn push(&mut self, clause: Clause) {
        self.filters.push(clause);
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.filters
    }

    /// Top-level clauses touching `field`
    pub fn clauses_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Clause> + 'a {
        self.filters.iter().filter(move |c| c.targets(field))
    }

    pub fn targets(&self, field: &str) -> bool {
        self.clauses_for(field).next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: String,
    pub direction: SortDirection,
}

/// Offset/limit window plus ordering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub offset: u64,
    pub limit: u32,
    pub sort: SortOrder,
}

impl PageRequest {
    /// Zero-based `page` of `per_page` items
    pub fn of(page: u32, per_page: u32, sort: SortOrder) -> Self {
        let offset = u64::from(page).saturating_mul(u64::from(per_page));
        Self { offset, limit: per_page, sort }
    }
}
