//! Batch termination, partial results and fatal failures of the paginator
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use catalog_sync::infrastructure::{
    ConcurrentPaginator, ItemsSource, PageResponse, PageTransport, RequestDescriptor, SourceConfig, SyncError,
    Termination, TransportError,
};

#[derive(Clone, Copy)]
enum Reply {
    Records { delay_ms: u64 },
    Empty,
    Status(u16),
    Timeout { delay_ms: u64 },
    Refused,
}

/// Pages `1..=non_empty` hold one item each unless overridden.
struct ScriptedTransport {
    non_empty: u32,
    overrides: HashMap<u32, Reply>,
    requested: Mutex<Vec<u32>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedTransport {
    fn new(non_empty: u32) -> Self {
        Self {
            non_empty,
            overrides: HashMap::new(),
            requested: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    fn with(mut self, page: u32, reply: Reply) -> Self {
        self.overrides.insert(page, reply);
        self
    }

    fn requested(&self) -> Vec<u32> {
        let mut pages = self.requested.lock().unwrap().clone();
        pages.sort_unstable();
        pages
    }
}

fn page_of(url: &str) -> u32 {
    let url = url::Url::parse(url).unwrap();
    url.query_pairs()
        .find(|(key, _)| key == "Pack")
        .and_then(|(_, value)| value.parse().ok())
        .unwrap()
}

#[async_trait]
impl PageTransport for ScriptedTransport {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<PageResponse, TransportError> {
        let page = page_of(&request.url);
        self.requested.lock().unwrap().push(page);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let default = if page <= self.non_empty {
            Reply::Records { delay_ms: 0 }
        } else {
            Reply::Empty
        };
        let reply = self.overrides.get(&page).copied().unwrap_or(default);

        let result = match reply {
            Reply::Records { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(PageResponse {
                    status: 200,
                    body: format!(r#"[{{"uid": "item-{page}", "InternalArticle": "SKU-{page}"}}]"#),
                })
            }
            Reply::Empty => Ok(PageResponse {
                status: 200,
                body: "[]".to_string(),
            }),
            Reply::Status(status) => Ok(PageResponse {
                status,
                body: "Internal Server Error".to_string(),
            }),
            Reply::Timeout { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Err(TransportError::Timeout {
                    url: request.url.clone(),
                })
            }
            Reply::Refused => Err(TransportError::Connection {
                url: request.url.clone(),
                message: "connection refused".to_string(),
            }),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn items_source() -> ItemsSource {
    ItemsSource::new(SourceConfig {
        base_url: "http://exchange.mock".to_string(),
        auth_token: "Basic token".to_string(),
        pack_size: 500,
    })
}

fn sorted_keys(records: &[catalog_sync::domain::RawItem]) -> Vec<String> {
    let mut keys: Vec<String> = records.iter().filter_map(|r| r.business_key.clone()).collect();
    keys.sort();
    keys
}

fn expected_keys(pages: impl IntoIterator<Item = u32>) -> Vec<String> {
    let mut keys: Vec<String> = pages.into_iter().map(|p| format!("SKU-{p}")).collect();
    keys.sort();
    keys
}

#[tokio::test]
async fn stops_after_the_batch_containing_the_first_empty_page() {
    for (non_empty, batch_size) in [(0, 1), (3, 1), (4, 5), (5, 5), (6, 5), (12, 5), (9, 3), (10, 4)] {
        let transport = ScriptedTransport::new(non_empty);
        let paginator = ConcurrentPaginator::new(batch_size).unwrap();

        let outcome = paginator.run(&items_source(), &transport).await.unwrap();

        let expected_batches = (non_empty + 1).div_ceil(batch_size);
        assert_eq!(outcome.batches, expected_batches, "N={non_empty} B={batch_size}");
        assert_eq!(outcome.termination, Termination::LastPage);
        assert_eq!(outcome.discarded_pages, 0);
        assert_eq!(sorted_keys(&outcome.records), expected_keys(1..=non_empty));
        assert_eq!(transport.requested(), (1..=expected_batches * batch_size).collect::<Vec<_>>());
        assert!(transport.max_in_flight.load(Ordering::SeqCst) <= batch_size as usize);
    }
}

#[tokio::test]
async fn timeout_returns_records_decoded_before_the_abort() {
    let transport = ScriptedTransport::new(20)
        .with(7, Reply::Timeout { delay_ms: 50 })
        .with(8, Reply::Records { delay_ms: 300 })
        .with(9, Reply::Records { delay_ms: 300 })
        .with(10, Reply::Records { delay_ms: 300 });

    let outcome = ConcurrentPaginator::new(5)
        .unwrap()
        .run(&items_source(), &transport)
        .await
        .unwrap();

    assert_eq!(outcome.termination, Termination::TimedOut { page: 7 });
    assert!(outcome.is_partial());
    assert_eq!(outcome.batches, 2);
    assert_eq!(sorted_keys(&outcome.records), expected_keys(1..=6));
    assert_eq!(outcome.pages_fetched, 6);
    assert_eq!(outcome.discarded_pages, 3);
    // in-flight requests of the batch were drained, nothing later was issued
    assert_eq!(transport.requested(), (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn error_status_is_fatal_and_names_the_page() {
    let transport = ScriptedTransport::new(20).with(7, Reply::Status(500));

    let err = ConcurrentPaginator::new(5)
        .unwrap()
        .run(&items_source(), &transport)
        .await
        .unwrap_err();

    match &err {
        SyncError::HttpStatus { page, status, url } => {
            assert_eq!(*page, 7);
            assert_eq!(*status, 500);
            assert_eq!(url, "http://exchange.mock/Items?Pack=7&PackSize=500");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!transport.requested().contains(&11));
}

#[tokio::test]
async fn connection_failure_is_fatal() {
    let transport = ScriptedTransport::new(3).with(2, Reply::Refused);

    let err = ConcurrentPaginator::new(2)
        .unwrap()
        .run(&items_source(), &transport)
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Transport { page: 2, .. }));
}

#[tokio::test]
async fn unbuildable_request_is_fatal_and_names_the_page() {
    struct Unbuildable;

    #[async_trait]
    impl PageTransport for Unbuildable {
        async fn fetch(&self, request: &RequestDescriptor) -> Result<PageResponse, TransportError> {
            Err(TransportError::InvalidRequest {
                url: request.url.clone(),
                reason: "Invalid value for header Authorization".to_string(),
            })
        }
    }

    let err = ConcurrentPaginator::new(1)
        .unwrap()
        .run(&items_source(), &Unbuildable)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SyncError::InvalidRequest {
            page: 1,
            reason: "Invalid value for header Authorization".to_string(),
        }
    );
}

#[tokio::test]
async fn empty_page_mid_batch_still_collects_the_batch() {
    // page 2 empty, pages 3 and 4 still decoded in the same batch
    let transport = ScriptedTransport::new(6).with(2, Reply::Empty);

    let outcome = ConcurrentPaginator::new(4)
        .unwrap()
        .run(&items_source(), &transport)
        .await
        .unwrap();

    assert_eq!(outcome.batches, 1);
    assert_eq!(sorted_keys(&outcome.records), expected_keys([1, 3, 4]));
}

#[tokio::test]
async fn malformed_page_counts_as_empty() {
    struct Garbage;

    #[async_trait]
    impl PageTransport for Garbage {
        async fn fetch(&self, _request: &RequestDescriptor) -> Result<PageResponse, TransportError> {
            Ok(PageResponse {
                status: 200,
                body: "<html>maintenance</html>".to_string(),
            })
        }
    }

    let outcome = ConcurrentPaginator::new(3)
        .unwrap()
        .run(&items_source(), &Garbage)
        .await
        .unwrap();

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.batches, 1);
    assert_eq!(outcome.pages_fetched, 3);
}
