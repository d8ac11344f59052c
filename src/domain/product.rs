use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Canonical product shape shared by the source and the target catalog.
///
/// Invariants (enforced by [`crate::domain::price_rules`]):
/// - `sales_price` is only set when `price` is set and `sales_price < price`
/// - `sales_price`, when present, is at least 0.10
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "FullName")]
    pub full_name: Option<String>,
    #[serde(rename = "InternalArticle")]
    pub business_key: String,
    #[serde(rename = "Price")]
    pub price: Option<String>,
    #[serde(rename = "SalesPrice")]
    pub sales_price: Option<String>,
}

impl Product {
    pub fn has_price(&self) -> bool {
        self.price.is_some() || self.sales_price.is_some()
    }

    pub fn is_on_sale(&self) -> bool {
        self.sales_price.is_some()
    }
}

/// Business key → product. Ordered so every run iterates identically.
pub type ProductMap = BTreeMap<String, Product>;

/// A product present on both sides whose content differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    /// Current target state
    pub before: Product,
    /// Desired state from the source
    pub after: Product,
}

/// Classified actions produced by the diff engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub inserts: Vec<Product>,
    pub updates: Vec<ProductUpdate>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty()
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.len()
    }

    pub fn update_count(&self) -> usize {
        self.updates.len()
    }
}

/// Native record of the target catalog, before canonicalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalProduct {
    pub id: String,
    pub sku: Option<String>,
    pub name: Option<String>,
    pub regular_price: Option<String>,
    pub sale_price: Option<String>,
}

/// Write accepted by the target catalog, keyed by SKU.
///
/// Empty strings mean "no price", which is how the catalog clears a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertRequest {
    pub business_key: String,
    /// `None` keeps the stored name on update
    pub full_name: Option<String>,
    pub regular_price: String,
    pub sale_price: String,
    /// Membership of the special sale category
    pub on_sale: bool,
}

impl UpsertRequest {
    /// Name given to a newly created product, the SKU when the source has none.
    pub fn insert_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.business_key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpsertResult {
    Inserted { id: String },
    Updated { id: String },
}

impl UpsertResult {
    pub fn id(&self) -> &str {
        match self {
            Self::Inserted { id } | Self::Updated { id } => id,
        }
    }
}
