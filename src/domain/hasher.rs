//! Content digests of canonical products.

use serde::Serialize;
use std::collections::HashMap;

use crate::domain::canonical::{canonicalize_name, canonicalize_price_with, DEFAULT_PRICE_DECIMALS};
use crate::domain::product::{Product, ProductMap};

/// Fixed-order encoding of the four hashed fields.
#[derive(Serialize)]
struct HashInput<'a> {
    #[serde(rename = "FullName")]
    full_name: Option<String>,
    #[serde(rename = "InternalArticle")]
    business_key: &'a str,
    #[serde(rename = "Price")]
    price: Option<String>,
    #[serde(rename = "SalesPrice")]
    sales_price: Option<String>,
}

/// [`compute_hash_with`] at [`DEFAULT_PRICE_DECIMALS`].
pub fn compute_hash(product: &Product) -> String {
    compute_hash_with(product, DEFAULT_PRICE_DECIMALS)
}

/// BLAKE3 digest (lowercase hex) of a product's canonical fields.
///
/// Fields are re-canonicalized first, so `"120.00"` and `"120"` hash alike.
/// Prices are rounded to `decimals`, the precision the products were
/// normalized with.
pub fn compute_hash_with(product: &Product, decimals: u32) -> String {
    let input = HashInput {
        full_name: canonicalize_name(product.full_name.as_deref()),
        business_key: &product.business_key,
        price: canonicalize_price_with(product.price.as_deref(), decimals),
        sales_price: canonicalize_price_with(product.sales_price.as_deref(), decimals),
    };
    // serializing a struct of strings cannot fail
    let encoded = serde_json::to_vec(&input).unwrap_or_default();
    blake3::hash(&encoded).to_hex().to_string()
}

/// digest → business key. Distinct keys with equal digests overwrite.
pub fn build_hash_index(products: &ProductMap, decimals: u32) -> HashMap<String, String> {
    products
        .iter()
        .map(|(key, product)| (compute_hash_with(product, decimals), key.clone()))
        .collect()
}

/// One differing canonical field between two products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: &'static str,
    pub before: Option<String>,
    pub after: Option<String>,
}

/// Canonical field-level differences from `before` to `after`.
pub fn field_changes(before: &Product, after: &Product, decimals: u32) -> Vec<FieldChange> {
    let pairs = [
        (
            "FullName",
            canonicalize_name(before.full_name.as_deref()),
            canonicalize_name(after.full_name.as_deref()),
        ),
        (
            "InternalArticle",
            Some(before.business_key.clone()),
            Some(after.business_key.clone()),
        ),
        (
            "Price",
            canonicalize_price_with(before.price.as_deref(), decimals),
            canonicalize_price_with(after.price.as_deref(), decimals),
        ),
        (
            "SalesPrice",
            canonicalize_price_with(before.sales_price.as_deref(), decimals),
            canonicalize_price_with(after.sales_price.as_deref(), decimals),
        ),
    ];

    pairs
        .into_iter()
        .filter(|(_, b, a)| b != a)
        .map(|(field, before, after)| FieldChange { field, before, after })
        .collect()
}
