//! Application layer module
//!
//! Orchestrates one sync run on top of the domain and infrastructure layers.

pub mod sync_service;

pub use sync_service::{ApplySummary, FetchSummary, SourceSnapshot, SyncReport, SyncService};
