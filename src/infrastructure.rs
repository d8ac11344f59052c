//! Infrastructure layer: remote page sources, pagination, HTTP transport,
//! target catalogs, configuration and logging.

pub mod catalog;
pub mod config;
pub mod database_connection;
pub mod http_client;
pub mod logging;
pub mod page_source;
pub mod paginator;
pub mod sqlite_catalog;
pub mod sync_error;

// Re-export commonly used items
pub use catalog::{InMemoryCatalog, TargetCatalog};
pub use config::{AppConfig, ConfigError};
pub use database_connection::DatabaseConnection;
pub use http_client::{HttpClient, HttpClientConfig, PageResponse, PageTransport};
pub use page_source::{ExchangeEndpoint, ItemsSource, PageSource, PricingSource, RequestDescriptor, SourceConfig};
pub use paginator::{ConcurrentPaginator, FetchOutcome, Termination};
pub use sqlite_catalog::SqliteCatalog;
pub use sync_error::{CatalogError, SyncError, TransportError};
