//! In-process video store
//!
//! Evaluates a [`QueryDescription`] against documents held in memory. Used by
//! the development profile and by tests that need real filtering semantics
//! without a search cluster.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use catalog_core::search::query::fields::KEYWORD_SUFFIX;
use catalog_core::search::{Clause, ClauseValue, PageRequest, QueryDescription, RawSearchPage, VideoStore};
use catalog_domain::{CatalogError, Result, SortDirection, VideoDocument};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Default)]
pub struct InMemoryVideoStore {
    documents: RwLock<BTreeMap<String, VideoDocument>>,
}

impl InMemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl VideoStore for InMemoryVideoStore {
    async fn save(&self, document: VideoDocument) -> Result<VideoDocument> {
        if document.id.trim().is_empty() {
            return Err(CatalogError::InvalidInput("video id cannot be empty".to_string()));
        }
        self.documents.write().insert(document.id.clone(), document.clone());
        Ok(document)
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Ok(());
        }
        self.documents.write().remove(id);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<VideoDocument>> {
        if id.trim().is_empty() {
            return Ok(None);
        }
        Ok(self.documents.read().get(id).cloned())
    }

    async fn search(&self, query: &QueryDescription, page: &PageRequest) -> Result<RawSearchPage> {
        let documents = self.documents.read();

        let mut matched = Vec::new();
        for document in documents.values() {
            let source = serde_json::to_value(document)
                .map_err(|e| CatalogError::Internal(format!("document encoding failed: {e}")))?;
            if query.clauses().iter().all(|clause| matches(clause, &source)) {
                matched.push((source, document));
            }
        }

        let sort_field = page.sort.field.strip_suffix(KEYWORD_SUFFIX).unwrap_or(&page.sort.field);
        matched.sort_by(|(a, a_doc), (b, b_doc)| {
            compare_field(a.get(sort_field), b.get(sort_field), page.sort.direction)
                .then_with(|| a_doc.id.cmp(&b_doc.id))
        });

        let total_hits = matched.len() as u64;
        let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
        let hits: Vec<VideoDocument> = matched
            .into_iter()
            .skip(offset)
            .take(page.limit as usize)
            .map(|(_, document)| document.clone())
            .collect();

        debug!(total_hits, returned = hits.len(), "In-memory search executed");
        Ok(RawSearchPage { total_hits, hits })
    }
}

fn matches(clause: &Clause, source: &Value) -> bool {
    match clause {
        Clause::Term { field, value } => field_values(source, field).any(|v| equals(value, v)),
        Clause::Terms { field, values } => field_values(source, field)
            .filter_map(Value::as_str)
            .any(|v| values.iter().any(|wanted| wanted == v)),
        Clause::Contains { field, text } => {
            let needle = text.to_lowercase();
            field_values(source, field)
                .filter_map(Value::as_str)
                .any(|v| v.to_lowercase().contains(&needle))
        }
        Clause::AnyOf { should, minimum_should_match } => {
            let hits = should.iter().filter(|c| matches(c, source)).count();
            hits >= *minimum_should_match as usize
        }
    }
}

/// Scalar field as one value, array field as its elements, missing or null as nothing
fn field_values<'a>(source: &'a Value, field: &str) -> Box<dyn Iterator<Item = &'a Value> + 'a> {
    match source.get(field) {
        Some(Value::Array(items)) => Box::new(items.iter()),
        Some(Value::Null) | None => Box::new(std::iter::empty()),
        Some(value) => Box::new(std::iter::once(value)),
    }
}

fn equals(expected: &ClauseValue, actual: &Value) -> bool {
    match expected {
        ClauseValue::Bool(b) => actual.as_bool() == Some(*b),
        ClauseValue::Int(n) => actual.as_i64() == Some(*n),
        ClauseValue::Text(s) => actual.as_str() == Some(s.as_str()),
    }
}

/// Missing values sort last in either direction
fn compare_field(a: Option<&Value>, b: Option<&Value>, direction: SortDirection) -> Ordering {
    fn present(v: Option<&Value>) -> Option<&Value> {
        v.filter(|v| !v.is_null())
    }
    match (present(a), present(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ordering = compare_values(a, b);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}
