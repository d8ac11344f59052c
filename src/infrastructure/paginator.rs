//! Batched concurrent pagination over a [`PageSource`].
//!
//! Pages are requested in fixed-size batches. Every request of a batch runs
//! concurrently and completions are handled in arrival order; the next batch
//! is issued only once the current one has fully drained. An empty page ends
//! the run after its batch, a timeout ends it at once with whatever was
//! collected, and any non-success status is fatal.

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::infrastructure::http_client::PageTransport;
use crate::infrastructure::page_source::PageSource;
use crate::infrastructure::sync_error::{SyncError, TransportError};

/// Why pagination stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Termination {
    /// A batch contained a page that decoded to no records
    LastPage,
    /// A request timed out; the records are partial
    TimedOut { page: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome<R> {
    pub records: Vec<R>,
    /// Pages that completed successfully and were decoded
    pub pages_fetched: u32,
    /// Replies of the timed-out batch that arrived after the timeout
    pub discarded_pages: u32,
    pub batches: u32,
    pub termination: Termination,
}

impl<R> FetchOutcome<R> {
    pub fn is_partial(&self) -> bool {
        matches!(self.termination, Termination::TimedOut { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConcurrentPaginator {
    batch_size: u32,
}

impl ConcurrentPaginator {
    pub fn new(batch_size: u32) -> Result<Self, SyncError> {
        if batch_size == 0 {
            return Err(SyncError::InvalidBatchSize);
        }
        Ok(Self { batch_size })
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    pub async fn run<S, T>(&self, source: &S, transport: &T) -> Result<FetchOutcome<S::Record>, SyncError>
    where
        S: PageSource,
        T: PageTransport + ?Sized,
    {
        let label = source.label();
        let mut cursor: u32 = 0;
        let mut records = Vec::new();
        let mut pages_fetched = 0;
        let mut discarded_pages = 0;
        let mut batches = 0;

        info!("Fetching {} with batch size {}", label, self.batch_size);

        loop {
            let first_page = cursor.saturating_add(1);
            let last_in_batch = cursor.saturating_add(self.batch_size);
            let mut in_flight: FuturesUnordered<_> = (first_page..=last_in_batch)
                .map(|page| {
                    let request = source.build_request(page);
                    debug!("Created a request to {}", request.url);
                    async move {
                        let result = transport.fetch(&request).await;
                        (page, request.url, result)
                    }
                })
                .collect();
            cursor = last_in_batch;
            batches += 1;
            info!("Executing {} batch number {} (pages {}-{})", label, batches, first_page, last_in_batch);

            let mut last_page_reached = false;
            let mut timed_out = None;

            while let Some((page, url, result)) = in_flight.next().await {
                if timed_out.is_some() {
                    debug!("Discarding page {} of {} after timeout", page, label);
                    discarded_pages += 1;
                    continue;
                }

                let response = match result {
                    Ok(response) => response,
                    Err(e) if e.is_timeout() => {
                        warn!("Page {} of {} timed out, returning partial results: {}", page, label, e);
                        timed_out = Some(page);
                        continue;
                    }
                    Err(TransportError::InvalidRequest { reason, .. }) => {
                        return Err(SyncError::InvalidRequest { page, reason });
                    }
                    Err(e) => return Err(SyncError::Transport { page, source: e }),
                };

                if !response.is_success() {
                    return Err(SyncError::HttpStatus {
                        page,
                        status: response.status,
                        url,
                    });
                }

                let decoded = source.decode_page(&response.body);
                pages_fetched += 1;
                if decoded.is_empty() {
                    last_page_reached = true;
                }
                records.extend(decoded);
                debug!("{} page {} decoded. Total {}: {}", label, page, label, records.len());
            }

            if let Some(page) = timed_out {
                info!(
                    "{} fetch aborted after timeout on page {}: {} records, {} pages discarded",
                    label,
                    page,
                    records.len(),
                    discarded_pages
                );
                return Ok(FetchOutcome {
                    records,
                    pages_fetched,
                    discarded_pages,
                    batches,
                    termination: Termination::TimedOut { page },
                });
            }

            if last_page_reached || last_in_batch == u32::MAX {
                info!("{} fetch completed: {} records in {} batches", label, records.len(), batches);
                return Ok(FetchOutcome {
                    records,
                    pages_fetched,
                    discarded_pages,
                    batches,
                    termination: Termination::LastPage,
                });
            }
        }
    }
}
