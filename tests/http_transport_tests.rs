//! reqwest transport against a local mock Exchange API
use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use catalog_sync::application::SyncService;
use catalog_sync::infrastructure::config::SourceSettings;
use catalog_sync::infrastructure::{
    AppConfig, ConcurrentPaginator, HttpClient, HttpClientConfig, InMemoryCatalog, ItemsSource, PageSource,
    PageTransport, SourceConfig, SyncError, Termination, TransportError,
};

const TOKEN: &str = "Basic dGVzdDp0ZXN0";

fn client(timeout_seconds: u64) -> HttpClient {
    HttpClient::new(HttpClientConfig {
        timeout_seconds,
        ..HttpClientConfig::default()
    })
    .unwrap()
}

fn items_source(server: &MockServer) -> ItemsSource {
    ItemsSource::new(SourceConfig {
        base_url: server.uri(),
        auth_token: TOKEN.to_string(),
        pack_size: 2,
    })
}

async fn mount_empty_fallback(server: &MockServer, endpoint: &str) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .with_priority(10)
        .mount(server)
        .await;
}

#[tokio::test]
async fn sends_auth_header_and_paging_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Items"))
        .and(query_param("Pack", "1"))
        .and(query_param("PackSize", "2"))
        .and(header("Authorization", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"uid": "a", "InternalArticle": "SKU-A"}]"#))
        .expect(1)
        .mount(&server)
        .await;

    let source = items_source(&server);
    let response = client(5).fetch(&source.build_request(1)).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(source.decode_page(&response.body).len(), 1);
}

#[tokio::test]
async fn slow_server_is_a_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Items"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let err = client(1)
        .fetch(&items_source(&server).build_request(1))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Timeout { .. }), "{err:?}");
}

#[tokio::test]
async fn server_error_is_fatal_for_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Items"))
        .and(query_param("Pack", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Items"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"uid": "a", "InternalArticle": "SKU-A"}]"#))
        .with_priority(10)
        .mount(&server)
        .await;

    let err = ConcurrentPaginator::new(3)
        .unwrap()
        .run(&items_source(&server), &client(5))
        .await
        .unwrap_err();

    match err {
        SyncError::HttpStatus { page, status, url } => {
            assert_eq!(page, 2);
            assert_eq!(status, 500);
            assert!(url.ends_with("/Items?Pack=2&PackSize=2"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn timed_out_page_yields_partial_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Items"))
        .and(query_param("Pack", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]").set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Items"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"uid": "a", "InternalArticle": "SKU-A"}]"#))
        .with_priority(10)
        .mount(&server)
        .await;

    let outcome = ConcurrentPaginator::new(1)
        .unwrap()
        .run(&items_source(&server), &client(1))
        .await
        .unwrap();

    assert_eq!(outcome.termination, Termination::TimedOut { page: 2 });
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.discarded_pages, 0);
}

#[tokio::test]
async fn malformed_auth_token_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(0)
        .mount(&server)
        .await;
    let source = ItemsSource::new(SourceConfig {
        base_url: server.uri(),
        auth_token: "Basic line\nbreak".to_string(),
        pack_size: 2,
    });

    let err = ConcurrentPaginator::new(1)
        .unwrap()
        .run(&source, &client(5))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::InvalidRequest { page: 1, .. }), "{err:?}");
}

#[tokio::test]
async fn full_run_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Items"))
        .and(query_param("Pack", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[
                {"uid": "item-1", "InternalArticle": "SKU-001", "FullName": "Pump 12V"},
                {"uid": "item-2", "InternalArticle": "SKU-002", "FullName": "Filter"}
            ]"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ItemPricing"))
        .and(query_param("Pack", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[
                {"uid": "d1", "PriceType": "regular", "Date": "2024-01-01T00:00:00",
                 "Items": [{"Item": "item-1", "Price": 120}, {"Item": "item-2", "Price": "200.00"}]},
                {"uid": "d2", "PriceType": "sale", "Date": "2024-02-01T00:00:00",
                 "Items": [{"Item": "item-1", "Price": "100"}]}
            ]"#,
        ))
        .mount(&server)
        .await;
    mount_empty_fallback(&server, "/Items").await;
    mount_empty_fallback(&server, "/ItemPricing").await;

    let mut config = AppConfig {
        source: SourceSettings {
            base_url: server.uri(),
            auth_token: TOKEN.to_string(),
            regular_price_type: "regular".to_string(),
            sale_price_type: "sale".to_string(),
            timeout_seconds: 5,
            ..SourceSettings::default()
        },
        ..AppConfig::default()
    };
    config.sync.batch_size = 2;
    config.validate().unwrap();

    let transport = Arc::new(HttpClient::new(config.source.http_client()).unwrap());
    let catalog = Arc::new(InMemoryCatalog::new());
    let service = SyncService::new(&config, transport, catalog).unwrap();

    let report = service.run().await.unwrap();

    assert_eq!(report.source_total, 2);
    assert_eq!(report.insert_count, 2);
    assert_eq!(report.update_count, 0);
    assert!(!report.is_partial());
    assert_eq!(report.fetches.len(), 2);
    assert!(report.fetches.iter().all(|f| f.batches == 1));
    let pump = &report.change_set.inserts[0];
    assert_eq!(pump.business_key, "SKU-001");
    assert_eq!(pump.price.as_deref(), Some("120"));
    assert_eq!(pump.sales_price.as_deref(), Some("100"));
}
