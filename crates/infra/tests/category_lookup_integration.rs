//! End-to-end category lookups over HTTP
//!
//! Wires the REST transport into the resilient lookup client and drives it
//! against a wiremock server; `.expect(n)` pins the exact number of transport
//! attempts.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::{Duration, Instant};

use catalog_core::lookup::{DependencyRegistry, ResilientLookupClient};
use catalog_core::CategoryService;
use catalog_domain::config::{BackoffSettings, DependencyConfig, JitterSettings};
use catalog_domain::{CatalogConfig, LookupError, CATEGORIES_DEPENDENCY};
use catalog_infra::{CatalogGateway, CategoryRestClient};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DEP: &str = CATEGORIES_DEPENDENCY;

fn dependency_config(base_url: String) -> DependencyConfig {
    let mut config = DependencyConfig::new(base_url);
    config.retry.backoff = BackoffSettings::Fixed { delay_ms: 1 };
    config.retry.jitter = JitterSettings::None;
    config
}

fn client_for(config: &DependencyConfig) -> ResilientLookupClient {
    let registry = DependencyRegistry::builder().register(DEP, config).unwrap().build();
    let transport = CategoryRestClient::from_config(DEP, config).unwrap();
    ResilientLookupClient::new(Arc::new(registry)).with_transport(DEP, Arc::new(transport)).unwrap()
}

fn base_url(server: &MockServer) -> String {
    format!("{}/api/categories", server.uri())
}

fn aulas(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": "Aulas",
        "description": "Conteudo gravado",
        "is_active": true,
        "created_at": "2024-01-01T10:00:00Z",
        "updated_at": "2024-01-02T10:00:00Z",
        "deleted_at": null
    })
}

#[tokio::test]
async fn ok_response_is_mapped_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(aulas("abc")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&dependency_config(base_url(&server)));

    let first = client.fetch(DEP, "abc").await.unwrap().expect("category");
    assert_eq!(first.id, "abc");
    assert_eq!(first.name, "Aulas");
    assert_eq!(first.description.as_deref(), Some("Conteudo gravado"));
    assert!(first.active);
    assert!(first.deleted_at.is_none());

    let second = client.fetch(DEP, "abc").await.unwrap();
    assert_eq!(second, Some(first));
}

#[tokio::test]
async fn not_found_makes_one_attempt_and_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories/123"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not found" })))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&dependency_config(base_url(&server)));

    assert_eq!(client.fetch(DEP, "123").await.unwrap(), None);
    assert_eq!(client.fetch(DEP, "123").await.unwrap(), None);
}

#[tokio::test]
async fn server_error_exhausts_retry_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories/123"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "Internal Server Error" })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&dependency_config(base_url(&server)));

    let err = client.fetch(DEP, "123").await.unwrap_err();
    assert_eq!(
        err,
        LookupError::UpstreamFailure { dependency: DEP.into(), id: "123".into(), status: 500 }
    );
    assert_eq!(err.to_string(), "Error observed from categories [resourceId:123] [status:500]");
}

#[tokio::test]
async fn slow_response_classifies_as_read_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/categories/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(aulas("slow"))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let mut config = dependency_config(base_url(&server));
    config.read_timeout_ms = 50;
    let client = client_for(&config);

    let err = client.fetch(DEP, "slow").await.unwrap_err();
    assert_eq!(err, LookupError::ReadTimeout { dependency: DEP.into(), id: "slow".into() });
    assert_eq!(err.to_string(), "Timeout observed from categories [resourceId:slow]");
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener); // release the port so that requests fail with ECONNREFUSED

    let client = client_for(&dependency_config(format!("http://{addr}/api/categories")));

    let err = client.fetch(DEP, "abc").await.unwrap_err();
    assert!(matches!(err, LookupError::Transport { .. }), "got {err:?}");
}

/// Listener that never accepts, with its accept queue already full
fn unanswered_listener() -> (tokio::net::TcpListener, Vec<TcpStream>, SocketAddr) {
    let socket = tokio::net::TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(1).unwrap();
    let addr = listener.local_addr().unwrap();

    let mut held = Vec::new();
    while held.len() < 512 {
        match TcpStream::connect_timeout(&addr, Duration::from_millis(100)) {
            Ok(stream) => held.push(stream),
            Err(_) => break,
        }
    }
    (listener, held, addr)
}

#[tokio::test]
async fn unanswered_connect_classifies_as_connect_timeout_after_retries() {
    let (_listener, _held, addr) = unanswered_listener();

    let mut config = dependency_config(format!("http://{addr}/api/categories"));
    config.connect_timeout_ms = 100;
    let client = client_for(&config);

    let started = Instant::now();
    let err = client.fetch(DEP, "abc").await.unwrap_err();
    let elapsed = started.elapsed();

    assert_eq!(err, LookupError::ConnectTimeout { dependency: DEP.into(), id: "abc".into() });
    assert!(err.is_retryable());
    // two attempts, each bounded by the connect deadline
    assert!(elapsed >= Duration::from_millis(200), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "elapsed {elapsed:?}");

    let breaker = client.registry().get(DEP).unwrap().breaker().metrics();
    assert_eq!(breaker.buffered_calls, 1);
    assert_eq!(breaker.failed_calls, 1);
}

#[tokio::test]
async fn saturated_bulkhead_never_calls_remote() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(aulas("x")))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = dependency_config(base_url(&server));
    config.bulkhead.max_concurrent = 2;
    let client = client_for(&config);

    let state = client.registry().get(DEP).unwrap();
    let _a = state.bulkhead().try_acquire().unwrap();
    let _b = state.bulkhead().try_acquire().unwrap();

    let err = client.fetch(DEP, "x").await.unwrap_err();
    assert_eq!(err, LookupError::BulkheadRejected { dependency: DEP.into() });
}

#[tokio::test]
async fn gateway_serves_categories_and_videos() {
    let server = MockServer::start().await;
    for id in ["c1", "c2"] {
        Mock::given(method("GET"))
            .and(path(format!("/api/categories/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(aulas(id)))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/api/categories/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = CatalogConfig::default();
    config.dependencies.insert(DEP.to_string(), dependency_config(base_url(&server)));
    let gateway = CatalogGateway::from_config(&config).unwrap();

    let service: &CategoryService = gateway.categories();
    let found = service.get_all_by_id(&["c2", "gone", "c1", "c2"]).await.unwrap();
    let ids: Vec<&str> = found.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c2", "c1"]);

    let document = serde_json::from_value(json!({
        "id": "v1",
        "title": "Aulas de Rust",
        "launched_at": 2023,
        "published": true,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
        "categories": ["c1"]
    }))
    .unwrap();
    gateway.store().save(document).await.unwrap();

    let criteria = catalog_domain::SearchCriteria::new(0, 10)
        .unwrap()
        .with_filters(catalog_domain::VideoFilters::default().with_categories(["c1"]));
    let page = gateway.videos().search(&criteria).await.unwrap();
    assert_eq!(page.total_hits, 1);
    assert_eq!(page.items[0].title, "Aulas de Rust");
}
