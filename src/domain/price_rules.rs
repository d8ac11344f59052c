//! Business rules over a (regular, sale) price pair.

use rust_decimal::Decimal;

use crate::domain::canonical::{canonicalize_price_with, parse_price, DEFAULT_PRICE_DECIMALS};

/// Sale prices below this value are treated as missing.
pub const SALE_PRICE_FLOOR: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Canonical regular/sale prices after the business rules ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PricePair {
    pub regular: Option<String>,
    pub sale: Option<String>,
}

impl PricePair {
    pub fn is_empty(&self) -> bool {
        self.regular.is_none() && self.sale.is_none()
    }
}

/// Applies floor, promotion and dominance, in that order.
pub fn normalize_price_pair(regular: Option<&str>, sale: Option<&str>) -> PricePair {
    normalize_price_pair_with(regular, sale, DEFAULT_PRICE_DECIMALS)
}

pub fn normalize_price_pair_with(regular: Option<&str>, sale: Option<&str>, decimals: u32) -> PricePair {
    let mut regular = canonicalize_price_with(regular, decimals);
    let mut sale = canonicalize_price_with(sale, decimals);

    // floor
    if sale.as_deref().and_then(parse_price).is_some_and(|s| s < SALE_PRICE_FLOOR) {
        sale = None;
    }

    // promotion
    if regular.is_none() && sale.is_some() {
        regular = sale.take();
    }

    // dominance
    if let (Some(r), Some(s)) = (regular.as_deref(), sale.as_deref()) {
        if let (Some(r), Some(s)) = (parse_price(r), parse_price(s)) {
            if s >= r {
                sale = None;
            }
        }
    }

    PricePair { regular, sale }
}
