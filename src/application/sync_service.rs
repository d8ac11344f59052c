//! One sync run: fetch the source, normalize both sides, diff, and
//! optionally apply the resulting change set to the target catalog.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::hasher::{build_hash_index, field_changes};
use crate::domain::normalizer::ProductNormalizer;
use crate::domain::price_rules::normalize_price_pair_with;
use crate::domain::product::{ChangeSet, Product, UpsertRequest};
use crate::domain::raw_records::{RawItem, RawPricingDocument};
use crate::domain::diff::compare;
use crate::infrastructure::catalog::TargetCatalog;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http_client::PageTransport;
use crate::infrastructure::page_source::{ItemsSource, PageSource, PricingSource};
use crate::infrastructure::paginator::{ConcurrentPaginator, FetchOutcome, Termination};
use crate::infrastructure::sync_error::SyncError;

/// Pagination statistics of one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchSummary {
    pub label: String,
    pub records: usize,
    pub pages_fetched: u32,
    /// Replies dropped because they arrived after a timeout
    pub discarded_pages: u32,
    pub batches: u32,
    pub termination: Termination,
}

impl FetchSummary {
    fn of<R>(label: &str, outcome: &FetchOutcome<R>) -> Self {
        Self {
            label: label.to_string(),
            records: outcome.records.len(),
            pages_fetched: outcome.pages_fetched,
            discarded_pages: outcome.discarded_pages,
            batches: outcome.batches,
            termination: outcome.termination,
        }
    }
}

/// Raw data pulled from the source in one run
#[derive(Debug, Clone)]
pub struct SourceSnapshot {
    pub items: Vec<RawItem>,
    pub pricing_documents: Vec<RawPricingDocument>,
    pub fetches: Vec<FetchSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub source_total: usize,
    pub target_total: usize,
    pub update_count: usize,
    pub insert_count: usize,
    /// Distinct digests per side; informational only
    pub source_distinct_hashes: usize,
    pub target_distinct_hashes: usize,
    pub fetches: Vec<FetchSummary>,
    pub change_set: ChangeSet,
}

impl SyncReport {
    /// True when any source stopped on a timeout.
    pub fn is_partial(&self) -> bool {
        self.fetches
            .iter()
            .any(|fetch| matches!(fetch.termination, Termination::TimedOut { .. }))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    pub updated: usize,
    pub inserted: usize,
}

pub struct SyncService {
    items_source: ItemsSource,
    pricing_source: PricingSource,
    paginator: ConcurrentPaginator,
    normalizer: ProductNormalizer,
    transport: Arc<dyn PageTransport>,
    catalog: Arc<dyn TargetCatalog>,
}

impl SyncService {
    pub fn new(
        config: &AppConfig,
        transport: Arc<dyn PageTransport>,
        catalog: Arc<dyn TargetCatalog>,
    ) -> Result<Self, SyncError> {
        Ok(Self {
            items_source: ItemsSource::new(config.source.items_source()),
            pricing_source: PricingSource::new(config.source.pricing_source(), config.source.price_type_ids()),
            paginator: ConcurrentPaginator::new(config.sync.batch_size)?,
            normalizer: ProductNormalizer::new(config.sync.price_decimals),
            transport,
            catalog,
        })
    }

    /// Items first, then pricing documents. Each source runs its own batches.
    pub async fn fetch_source(&self) -> Result<SourceSnapshot, SyncError> {
        let items = self.paginator.run(&self.items_source, self.transport.as_ref()).await?;
        info!("Items fetched: {}", items.records.len());

        let pricing = self.paginator.run(&self.pricing_source, self.transport.as_ref()).await?;
        info!("ItemPricing fetched: {}", pricing.records.len());

        let fetches = vec![
            FetchSummary::of(self.items_source.label(), &items),
            FetchSummary::of(self.pricing_source.label(), &pricing),
        ];
        Ok(SourceSnapshot {
            items: items.records,
            pricing_documents: pricing.records,
            fetches,
        })
    }

    /// Normalizes both sides and diffs them. The target is read, never written.
    pub async fn plan(&self, items: &[RawItem], pricing_documents: &[RawPricingDocument]) -> Result<SyncReport, SyncError> {
        let source_map = self.normalizer.normalize(items, pricing_documents);
        info!("Source normalized products: {}", source_map.len());

        info!("Loading target catalog products...");
        let natives = self.catalog.load_all().await?;
        let target_map = self.normalizer.normalize_external_products(&natives);
        info!("Target normalized products: {}", target_map.len());

        let decimals = self.normalizer.price_decimals();
        let source_hashes = build_hash_index(&source_map, decimals);
        let target_hashes = build_hash_index(&target_map, decimals);
        let shared = source_hashes
            .keys()
            .filter(|digest| target_hashes.contains_key(*digest))
            .count();
        debug!(
            "Hash index: source={}, target={}, identical content={}",
            source_hashes.len(),
            target_hashes.len(),
            shared
        );

        let change_set = compare(&source_map, &target_map, decimals);
        for update in &change_set.updates {
            for change in field_changes(&update.before, &update.after, decimals) {
                debug!(
                    "SKU={} {}: {:?} -> {:?}",
                    update.after.business_key, change.field, change.before, change.after
                );
            }
        }

        info!(
            "Planned {} updates and {} inserts",
            change_set.update_count(),
            change_set.insert_count()
        );

        Ok(SyncReport {
            source_total: source_map.len(),
            target_total: target_map.len(),
            update_count: change_set.update_count(),
            insert_count: change_set.insert_count(),
            source_distinct_hashes: source_hashes.len(),
            target_distinct_hashes: target_hashes.len(),
            fetches: Vec::new(),
            change_set,
        })
    }

    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let snapshot = self.fetch_source().await?;
        let mut report = self.plan(&snapshot.items, &snapshot.pricing_documents).await?;
        report.fetches = snapshot.fetches;
        Ok(report)
    }

    /// Updates first, then inserts. Stops at the first catalog failure.
    pub async fn apply(&self, change_set: &ChangeSet) -> Result<ApplySummary, SyncError> {
        let mut summary = ApplySummary::default();

        for update in &change_set.updates {
            let request = self.upsert_request(&update.after);
            self.catalog.upsert(&request).await?;
            summary.updated += 1;
            info!("Updated product SKU={}", request.business_key);
        }

        for product in &change_set.inserts {
            let request = self.upsert_request(product);
            let result = self.catalog.upsert(&request).await?;
            summary.inserted += 1;
            info!("Inserted product SKU={} ID={}", request.business_key, result.id());
        }

        info!("Sync complete. Updates: {}, Inserts: {}", summary.updated, summary.inserted);
        Ok(summary)
    }

    /// Write shape of a canonical product, with the price rules applied once more.
    /// A missing name is left to the catalog: kept on update, the SKU on insert.
    pub fn upsert_request(&self, product: &Product) -> UpsertRequest {
        let pair = normalize_price_pair_with(
            product.price.as_deref(),
            product.sales_price.as_deref(),
            self.normalizer.price_decimals(),
        );

        UpsertRequest {
            business_key: product.business_key.clone(),
            full_name: product.full_name.clone(),
            on_sale: pair.sale.is_some(),
            regular_price: pair.regular.unwrap_or_default(),
            sale_price: pair.sale.unwrap_or_default(),
        }
    }
}

