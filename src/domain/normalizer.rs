//! Builds canonical [`Product`] records from source items and from the
//! target catalog's native records.

use tracing::{debug, info};

use crate::domain::canonical::{canonicalize_name, DEFAULT_PRICE_DECIMALS};
use crate::domain::price_rules::normalize_price_pair_with;
use crate::domain::price_timeline::latest_price_by_item;
use crate::domain::product::{ExternalProduct, Product, ProductMap};
use crate::domain::raw_records::{PriceType, RawItem, RawPricingDocument};

#[derive(Debug, Clone)]
pub struct ProductNormalizer {
    price_decimals: u32,
}

impl Default for ProductNormalizer {
    fn default() -> Self {
        Self {
            price_decimals: DEFAULT_PRICE_DECIMALS,
        }
    }
}

impl ProductNormalizer {
    pub fn new(price_decimals: u32) -> Self {
        Self { price_decimals }
    }

    pub fn price_decimals(&self) -> u32 {
        self.price_decimals
    }

    /// Source items + pricing documents → product map keyed by business key.
    ///
    /// Items without identity or business key are skipped, as are products
    /// left without any price. When two items share a business key the later
    /// one wins.
    pub fn normalize(&self, items: &[RawItem], pricing_documents: &[RawPricingDocument]) -> ProductMap {
        let regular_prices = latest_price_by_item(pricing_documents, &PriceType::Regular);
        let sale_prices = latest_price_by_item(pricing_documents, &PriceType::Sale);

        let mut products = ProductMap::new();
        for item in items {
            let (Some(identity), Some(business_key)) = (non_empty(item.identity.as_deref()), non_empty(item.business_key.as_deref())) else {
                debug!("Skipping item without identity or business key: {:?}", item);
                continue;
            };

            let pair = normalize_price_pair_with(
                regular_prices.get(identity).map(String::as_str),
                sale_prices.get(identity).map(String::as_str),
                self.price_decimals,
            );
            if pair.is_empty() {
                continue;
            }

            products.insert(
                business_key.to_string(),
                Product {
                    full_name: canonicalize_name(item.display_name.as_deref()),
                    business_key: business_key.to_string(),
                    price: pair.regular,
                    sales_price: pair.sale,
                },
            );
        }

        info!("Normalization complete. Products with prices: {}", products.len());
        products
    }

    /// Target catalog record → canonical product, `None` without SKU or price.
    pub fn normalize_external_product(&self, native: &ExternalProduct) -> Option<Product> {
        let sku = non_empty(native.sku.as_deref())?;
        let pair = normalize_price_pair_with(
            native.regular_price.as_deref(),
            native.sale_price.as_deref(),
            self.price_decimals,
        );
        if pair.is_empty() {
            return None;
        }

        Some(Product {
            full_name: canonicalize_name(native.name.as_deref()),
            business_key: sku.to_string(),
            price: pair.regular,
            sales_price: pair.sale,
        })
    }

    pub fn normalize_external_products(&self, natives: &[ExternalProduct]) -> ProductMap {
        let products: ProductMap = natives
            .iter()
            .filter_map(|native| self.normalize_external_product(native))
            .map(|product| (product.business_key.clone(), product))
            .collect();

        info!("Target normalization complete. Products with prices: {}", products.len());
        products
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
