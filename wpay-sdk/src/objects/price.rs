//! Price-source and quote objects.

use compact_str::CompactString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// USD quote of one asset as returned by `/simple/price`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsdQuote {
    pub usd: f64,
}

/// Body of `GET /simple/price?ids=…&vs_currencies=usd`, keyed by asset id.
pub type SimplePriceResponse = BTreeMap<String, UsdQuote>;

/// One line of a `GET /api/v1/quote` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuoteLine {
    Ok {
        symbol: CompactString,
        original_amount: Decimal,
        converted_amount: Decimal,
        exchange_rate: Decimal,
        /// Human-readable amount, e.g. `0.050000 ETH`.
        display: String,
    },
    Error {
        symbol: CompactString,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub usd_amount: Decimal,
    pub quotes: Vec<QuoteLine>,
}
