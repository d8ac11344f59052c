//! Paged datasets of the Exchange API.
//!
//! Exactly two endpoints exist, so they are a closed [`ExchangeEndpoint`]
//! enum rather than a registry. Each source is built from an explicit
//! [`SourceConfig`]; nothing is read from globals.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::raw_records::{PriceTypeIds, PricingDocumentWire, RawItem, RawPricingDocument};

/// Request for one page, independent of the HTTP client used to send it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// Connection settings shared by both sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub base_url: String,
    pub auth_token: String,
    pub pack_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeEndpoint {
    Items,
    ItemPricing,
}

impl ExchangeEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::Items => "/Items",
            Self::ItemPricing => "/ItemPricing",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Items => "Products",
            Self::ItemPricing => "ItemPricing",
        }
    }

    /// `{base}{path}?Pack={page}&PackSize={pack_size}` with the auth header.
    pub fn request(self, config: &SourceConfig, page: u32) -> RequestDescriptor {
        let url = format!(
            "{}{}?Pack={}&PackSize={}",
            config.base_url.trim_end_matches('/'),
            self.path(),
            page,
            config.pack_size
        );
        let headers = if config.auth_token.is_empty() {
            Vec::new()
        } else {
            vec![("Authorization".to_string(), config.auth_token.clone())]
        };
        RequestDescriptor { url, headers }
    }
}

/// One remote dataset, paged by a 1-based page number.
pub trait PageSource: Send + Sync {
    type Record: Send;

    fn build_request(&self, page: u32) -> RequestDescriptor;

    /// Malformed payloads decode to no records.
    fn decode_page(&self, body: &str) -> Vec<Self::Record>;

    fn label(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct ItemsSource {
    config: SourceConfig,
}

impl ItemsSource {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }
}

impl PageSource for ItemsSource {
    type Record = RawItem;

    fn build_request(&self, page: u32) -> RequestDescriptor {
        ExchangeEndpoint::Items.request(&self.config, page)
    }

    fn decode_page(&self, body: &str) -> Vec<RawItem> {
        decode_array(body, self.label())
    }

    fn label(&self) -> &str {
        ExchangeEndpoint::Items.label()
    }
}

/// Pricing documents, with price types resolved against the configured ids
#[derive(Debug, Clone)]
pub struct PricingSource {
    config: SourceConfig,
    price_types: PriceTypeIds,
}

impl PricingSource {
    pub fn new(config: SourceConfig, price_types: PriceTypeIds) -> Self {
        Self { config, price_types }
    }
}

impl PageSource for PricingSource {
    type Record = RawPricingDocument;

    fn build_request(&self, page: u32) -> RequestDescriptor {
        ExchangeEndpoint::ItemPricing.request(&self.config, page)
    }

    fn decode_page(&self, body: &str) -> Vec<RawPricingDocument> {
        decode_array::<PricingDocumentWire>(body, self.label())
            .into_iter()
            .map(|wire| RawPricingDocument::from_wire(wire, &self.price_types))
            .collect()
    }

    fn label(&self) -> &str {
        ExchangeEndpoint::ItemPricing.label()
    }
}

/// Top-level JSON array → records. Elements that fail to decode are dropped.
fn decode_array<T: DeserializeOwned>(body: &str, label: &str) -> Vec<T> {
    let values = match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(values)) => values,
        Ok(other) => {
            if !other.is_null() {
                warn!("{} page is not a JSON array, treating as empty", label);
            }
            return Vec::new();
        }
        Err(e) => {
            warn!("Failed to decode {} page: {}", label, e);
            return Vec::new();
        }
    };

    let total = values.len();
    let records: Vec<T> = values
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();
    if records.len() < total {
        debug!("Dropped {} malformed {} records", total - records.len(), label);
    }
    records
}
