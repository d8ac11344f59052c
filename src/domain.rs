//! Domain layer: canonical product model, normalization rules and diffing.
//!
//! Everything here is pure and synchronous; the network and the target
//! catalog live in `infrastructure`.

pub mod canonical;
pub mod diff;
pub mod hasher;
pub mod normalizer;
pub mod price_rules;
pub mod price_timeline;
pub mod product;
pub mod raw_records;

pub use diff::compare;
pub use hasher::{build_hash_index, compute_hash, compute_hash_with, field_changes, FieldChange};
pub use normalizer::ProductNormalizer;
pub use price_rules::{normalize_price_pair, PricePair};
pub use product::{ChangeSet, ExternalProduct, Product, ProductMap, ProductUpdate, UpsertRequest, UpsertResult};
pub use raw_records::{PriceLine, PriceType, PriceTypeIds, RawItem, RawPricingDocument};
