//! Latest-price resolution over dated pricing documents.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::domain::raw_records::{PriceType, RawPricingDocument};

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parses the document `Date` field. Offsets are converted to UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Most recent price of `price_type` per item identity.
///
/// Documents are scanned newest first and the first price seen for an item
/// wins. Missing or unparseable timestamps sort as oldest; on equal
/// timestamps the document later in input order is scanned first.
pub fn latest_price_by_item(documents: &[RawPricingDocument], price_type: &PriceType) -> HashMap<String, String> {
    let mut ordered: Vec<(Option<NaiveDateTime>, usize, &RawPricingDocument)> = documents
        .iter()
        .enumerate()
        .filter(|(_, doc)| doc.price_type.as_ref() == Some(price_type))
        .map(|(index, doc)| (doc.timestamp.as_deref().and_then(parse_timestamp), index, doc))
        .collect();
    ordered.sort_by_key(|(ts, index, _)| Reverse((*ts, *index)));

    let mut prices = HashMap::new();
    for (_, _, doc) in ordered {
        for line in &doc.lines {
            let (Some(item), Some(price)) = (line.item_identity.as_deref(), line.price.as_deref()) else {
                continue;
            };
            if item.is_empty() {
                continue;
            }
            prices.entry(item.to_string()).or_insert_with(|| price.to_string());
        }
    }
    prices
}
