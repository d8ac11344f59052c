//! Raw records decoded from the Exchange API.
//!
//! Field names follow the wire format; every field is optional because the
//! upstream payloads are not validated. Normalization decides what to keep.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Catalog item from the `/Items` endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawItem {
    /// Internal correlation id, only used to join pricing documents
    #[serde(rename = "uid", alias = "Uid", alias = "UID", default, deserialize_with = "lenient_string")]
    pub identity: Option<String>,

    /// Stable external key
    #[serde(rename = "InternalArticle", alias = "Article", default, deserialize_with = "lenient_string")]
    pub business_key: Option<String>,

    #[serde(rename = "FullName", alias = "Name", default, deserialize_with = "lenient_string")]
    pub display_name: Option<String>,
}

/// Which of the two tracked price lists a document belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PriceType {
    Regular,
    Sale,
    Other(String),
}

/// Maps the opaque price-type identifiers of the wire to [`PriceType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceTypeIds {
    pub regular: String,
    pub sale: String,
}

impl PriceTypeIds {
    pub fn resolve(&self, raw: &str) -> PriceType {
        if raw == self.regular {
            PriceType::Regular
        } else if raw == self.sale {
            PriceType::Sale
        } else {
            PriceType::Other(raw.to_string())
        }
    }
}

/// One priced line inside a pricing document
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PriceLine {
    #[serde(rename = "Item", default, deserialize_with = "lenient_string")]
    pub item_identity: Option<String>,

    #[serde(rename = "Price", default, deserialize_with = "lenient_string")]
    pub price: Option<String>,
}

/// Wire shape of an `/ItemPricing` document, before price-type resolution
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PricingDocumentWire {
    #[serde(rename = "uid", alias = "Uid", alias = "UID", default, deserialize_with = "lenient_string")]
    pub identity: Option<String>,

    #[serde(rename = "PriceType", default, deserialize_with = "lenient_string")]
    pub price_type: Option<String>,

    #[serde(rename = "Date", default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,

    #[serde(rename = "Items", default, deserialize_with = "lenient_lines")]
    pub lines: Vec<PriceLine>,
}

/// Pricing document with its price type resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPricingDocument {
    pub identity: Option<String>,
    pub price_type: Option<PriceType>,
    pub timestamp: Option<String>,
    pub lines: Vec<PriceLine>,
}

impl RawPricingDocument {
    pub fn from_wire(wire: PricingDocumentWire, ids: &PriceTypeIds) -> Self {
        Self {
            identity: wire.identity,
            price_type: wire.price_type.as_deref().map(|raw| ids.resolve(raw)),
            timestamp: wire.timestamp,
            lines: wire.lines,
        }
    }
}

/// Accepts strings, numbers and booleans; everything else becomes `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// `Items` that is not an array yields no lines; malformed lines are dropped.
fn lenient_lines<'de, D>(deserializer: D) -> Result<Vec<PriceLine>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(values)) => values
            .into_iter()
            .filter_map(|line| serde_json::from_value(line).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_accepts_aliases() {
        let item: RawItem = serde_json::from_value(json!({
            "Uid": "item-1",
            "Article": "SKU-001",
            "Name": "Pump"
        }))
        .unwrap();

        assert_eq!(item.identity.as_deref(), Some("item-1"));
        assert_eq!(item.business_key.as_deref(), Some("SKU-001"));
        assert_eq!(item.display_name.as_deref(), Some("Pump"));
    }

    #[test]
    fn numeric_prices_decode_as_strings() {
        let line: PriceLine = serde_json::from_value(json!({"Item": "item-1", "Price": 12.5})).unwrap();
        assert_eq!(line.price.as_deref(), Some("12.5"));

        let line: PriceLine = serde_json::from_value(json!({"Item": "item-1", "Price": null})).unwrap();
        assert_eq!(line.price, None);
    }

    #[test]
    fn price_type_resolution() {
        let ids = PriceTypeIds {
            regular: "reg".to_string(),
            sale: "sale".to_string(),
        };

        let wire: PricingDocumentWire = serde_json::from_value(json!({
            "uid": "doc-1",
            "PriceType": "sale",
            "Date": "2024-02-01T10:00:00",
            "Items": [{"Item": "item-1", "Price": "100"}, "garbage"]
        }))
        .unwrap();
        let doc = RawPricingDocument::from_wire(wire, &ids);

        assert_eq!(doc.price_type, Some(PriceType::Sale));
        assert_eq!(doc.lines.len(), 1);
        assert_eq!(ids.resolve("other"), PriceType::Other("other".to_string()));
    }

    #[test]
    fn non_array_items_yield_no_lines() {
        let wire: PricingDocumentWire =
            serde_json::from_value(json!({"PriceType": "reg", "Items": "nope"})).unwrap();
        assert!(wire.lines.is_empty());
    }
}
