//! Catalog Sync - pulls paginated catalog and pricing data from a remote
//! Exchange API, canonicalizes it, and diffs it against a target catalog.
//!
//! - `domain`: canonical products, price rules, hashing and diffing
//! - `infrastructure`: page sources, concurrent paginator, HTTP, catalogs,
//!   configuration and logging
//! - `application`: the sync run tying both together

pub mod application;
pub mod domain;
pub mod infrastructure;
