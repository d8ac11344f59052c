//! Error taxonomy of a sync run.
//!
//! Timeouts and decode failures never leave the paginator as errors: they
//! degrade into partial or empty results. Everything in [`SyncError`] is
//! fatal and stops the run before further mutation.

use thiserror::Error;

/// Failure of a single page request before any status was received
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out: {url}")]
    Timeout { url: String },

    #[error("Request failed for {url}: {message}")]
    Connection { url: String, message: String },

    /// The request could not be built, so nothing was sent
    #[error("Invalid request for {url}: {reason}")]
    InvalidRequest { url: String, reason: String },
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Catalog database error: {0}")]
    Database(String),

    #[error("Catalog rejected upsert for SKU={business_key}: {reason}")]
    Rejected { business_key: String, reason: String },
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        Self::Database(e.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Failed the request for page {page} with {status}: {url}")]
    HttpStatus { page: u32, status: u16, url: String },

    #[error("Failed the request for page {page}: {source}")]
    Transport {
        page: u32,
        #[source]
        source: TransportError,
    },

    #[error("Invalid request for page {page}: {reason}")]
    InvalidRequest { page: u32, reason: String },

    #[error("Batch size must be greater than 0")]
    InvalidBatchSize,

    #[error("Catalog failure: {0}")]
    Catalog(#[from] CatalogError),
}

impl SyncError {
    /// Page number the failure is attributed to, if any
    pub fn page(&self) -> Option<u32> {
        match self {
            Self::HttpStatus { page, .. } | Self::Transport { page, .. } | Self::InvalidRequest { page, .. } => {
                Some(*page)
            }
            Self::InvalidBatchSize | Self::Catalog(_) => None,
        }
    }
}
