//! Elasticsearch-backed video store
//!
//! Talks to the document API (`/{index}/_doc/{id}`) and the search API
//! (`/{index}/_search`) over plain HTTP.

use async_trait::async_trait;
use catalog_core::search::{Clause, ClauseValue, PageRequest, QueryDescription, RawSearchPage, VideoStore};
use catalog_domain::config::SearchStoreConfig;
use catalog_domain::{CatalogError, Result, VideoDocument};
use reqwest::{Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};
use url::Url;

use crate::errors::InfraError;
use crate::http::HttpClient;

#[derive(Debug, Clone)]
pub struct ElasticsearchVideoStore {
    http_client: HttpClient,
    base_url: Url,
    index: String,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source")]
    source: Option<VideoDocument>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    total: TotalHits,
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct TotalHits {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source")]
    source: VideoDocument,
}

impl ElasticsearchVideoStore {
    /// # Errors
    /// Returns `CatalogError::Config` for a missing or malformed base URL.
    pub fn from_config(config: &SearchStoreConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| CatalogError::Config("search.base_url is not set".to_string()))?;
        let http_client = HttpClient::builder().timeout(config.request_timeout()).build()?;
        Self::new(base_url, &config.index, http_client)
    }

    pub fn new(base_url: &str, index: &str, http_client: HttpClient) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CatalogError::Config(format!("Invalid search URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(CatalogError::Config(format!("Search URL '{base_url}' cannot hold a path")));
        }
        Ok(Self { http_client, base_url, index: index.to_string() })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::Config(format!("Search URL '{}' cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .push(&self.index)
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response> {
        self.http_client.send(request).await.map_err(|e| CatalogError::from(InfraError::from(e)))
    }
}

#[async_trait]
impl VideoStore for ElasticsearchVideoStore {
    async fn save(&self, document: VideoDocument) -> Result<VideoDocument> {
        if document.id.trim().is_empty() {
            return Err(CatalogError::InvalidInput("video id cannot be empty".to_string()));
        }
        let mut url = self.url(&["_doc", &document.id])?;
        url.query_pairs_mut().append_pair("refresh", "wait_for");

        let response = self.send(self.http_client.request(Method::PUT, url).json(&document)).await?;
        ensure_success(response).await?;
        Ok(document)
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Ok(());
        }
        let url = self.url(&["_doc", id])?;
        let response = self.send(self.http_client.request(Method::DELETE, url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        ensure_success(response).await.map(|_| ())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<VideoDocument>> {
        if id.trim().is_empty() {
            return Ok(None);
        }
        let url = self.url(&["_doc", id])?;
        let response = self.send(self.http_client.request(Method::GET, url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: GetResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| CatalogError::from(InfraError::from(e)))?;
        Ok(body.found.then_some(body.source).flatten())
    }

    #[instrument(skip_all, fields(index = %self.index, offset = page.offset, limit = page.limit))]
    async fn search(&self, query: &QueryDescription, page: &PageRequest) -> Result<RawSearchPage> {
        let body = render_search(query, page);
        debug!(body = %body, "Executing search");

        let url = self.url(&["_search"])?;
        let response = self.send(self.http_client.request(Method::POST, url).json(&body)).await?;
        let parsed: SearchResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| CatalogError::from(InfraError::from(e)))?;

        Ok(RawSearchPage {
            total_hits: parsed.hits.total.value,
            hits: parsed.hits.hits.into_iter().map(|hit| hit.source).collect(),
        })
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CatalogError::Store(format!("search cluster answered {status}: {body}")))
}

/// Full `_search` request body
pub fn render_search(query: &QueryDescription, page: &PageRequest) -> Value {
    json!({
        "from": page.offset,
        "size": page.limit,
        "track_total_hits": true,
        "sort": [{ page.sort.field.as_str(): { "order": page.sort.direction.as_str() } }],
        "query": render_query(query),
    })
}

pub fn render_query(query: &QueryDescription) -> Value {
    if query.is_empty() {
        return json!({ "match_all": {} });
    }
    let filters: Vec<Value> = query.clauses().iter().map(render_clause).collect();
    json!({ "bool": { "filter": filters } })
}

fn render_clause(clause: &Clause) -> Value {
    match clause {
        Clause::Term { field, value } => json!({ "term": { field.as_str(): render_value(value) } }),
        Clause::Terms { field, values } => json!({ "terms": { field.as_str(): values } }),
        Clause::Contains { field, text } => json!({
            "wildcard": {
                field.as_str(): {
                    "value": format!("*{}*", escape_wildcard(text)),
                    "case_insensitive": true,
                }
            }
        }),
        Clause::AnyOf { should, minimum_should_match } => json!({
            "bool": {
                "should": should.iter().map(render_clause).collect::<Vec<_>>(),
                "minimum_should_match": minimum_should_match,
            }
        }),
    }
}

fn render_value(value: &ClauseValue) -> Value {
    match value {
        ClauseValue::Bool(b) => Value::Bool(*b),
        ClauseValue::Int(n) => Value::from(*n),
        ClauseValue::Text(s) => Value::String(s.clone()),
    }
}

fn escape_wildcard(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '*' | '?' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
