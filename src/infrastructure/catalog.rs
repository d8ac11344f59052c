//! Target catalog collaborator.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::product::{ExternalProduct, UpsertRequest, UpsertResult};
use crate::infrastructure::sync_error::CatalogError;

/// Durable store of products, addressed by SKU.
///
/// New products are created as drafts. The sale flag is stored with the
/// product on every write.
#[async_trait]
pub trait TargetCatalog: Send + Sync {
    /// Every record currently held, drafts included.
    async fn load_all(&self) -> Result<Vec<ExternalProduct>, CatalogError>;

    async fn upsert(&self, request: &UpsertRequest) -> Result<UpsertResult, CatalogError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProduct {
    pub record: ExternalProduct,
    pub on_sale: bool,
    pub draft: bool,
}

/// Process-local catalog, used for dry runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<BTreeMap<String, StoredProduct>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = ExternalProduct>) -> Self {
        let products = products
            .into_iter()
            .filter_map(|record| {
                let sku = record.sku.clone()?;
                let on_sale = record.sale_price.as_deref().is_some_and(|s| !s.is_empty());
                Some((sku, StoredProduct { record, on_sale, draft: false }))
            })
            .collect();
        Self {
            products: RwLock::new(products),
        }
    }

    pub async fn get(&self, sku: &str) -> Option<StoredProduct> {
        self.products.read().await.get(sku).cloned()
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }
}

#[async_trait]
impl TargetCatalog for InMemoryCatalog {
    async fn load_all(&self) -> Result<Vec<ExternalProduct>, CatalogError> {
        Ok(self
            .products
            .read()
            .await
            .values()
            .map(|stored| stored.record.clone())
            .collect())
    }

    async fn upsert(&self, request: &UpsertRequest) -> Result<UpsertResult, CatalogError> {
        if request.business_key.is_empty() {
            return Err(CatalogError::Rejected {
                business_key: String::new(),
                reason: "empty SKU".to_string(),
            });
        }

        let mut products = self.products.write().await;
        if let Some(stored) = products.get_mut(&request.business_key) {
            if let Some(name) = &request.full_name {
                stored.record.name = Some(name.clone());
            }
            stored.record.regular_price = Some(request.regular_price.clone());
            stored.record.sale_price = Some(request.sale_price.clone());
            stored.on_sale = request.on_sale;
            debug!("Updated product SKU={}", request.business_key);
            return Ok(UpsertResult::Updated {
                id: stored.record.id.clone(),
            });
        }

        let id = Uuid::new_v4().to_string();
        products.insert(
            request.business_key.clone(),
            StoredProduct {
                record: ExternalProduct {
                    id: id.clone(),
                    sku: Some(request.business_key.clone()),
                    name: Some(request.insert_name().to_string()),
                    regular_price: Some(request.regular_price.clone()),
                    sale_price: Some(request.sale_price.clone()),
                },
                on_sale: request.on_sale,
                draft: true,
            },
        );
        debug!("Inserted product SKU={} ID={}", request.business_key, id);
        Ok(UpsertResult::Inserted { id })
    }
}
