//! `GET /quote?amount=…&symbols=…` – USD amount priced in several assets.
//!
//! All priced symbols share one rate lookup. An unsupported symbol shows
//! up as an error line and does not fail the others.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use wpay_core::money::Money;
use wpay_core::utils::amount::format_crypto_amount;
use wpay_sdk::objects::{QuoteLine, QuoteResponse};

use crate::state::AppState;

const DEFAULT_SYMBOLS: &str = "ETH,USDC";

pub fn router() -> Router<AppState> {
    Router::new().route("/quote", get(get_quote))
}

#[derive(Debug, Deserialize)]
struct QuoteQuery {
    amount: Decimal,
    /// Comma separated ticker symbols.
    symbols: Option<String>,
}

async fn get_quote(
    state: State<AppState>,
    Query(query): Query<QuoteQuery>,
) -> Result<impl IntoResponse, QuoteApiError> {
    let usd = Money::usd(query.amount).map_err(|_| QuoteApiError::NegativeAmount)?;
    let symbols: Vec<&str> = query
        .symbols
        .as_deref()
        .unwrap_or(DEFAULT_SYMBOLS)
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if symbols.is_empty() {
        return Err(QuoteApiError::NoSymbols);
    }

    let quotes = state
        .orchestrator
        .conversion()
        .convert_many(&usd, &symbols)
        .await
        .into_iter()
        .map(|(symbol, result)| match result {
            Ok(conversion) => QuoteLine::Ok {
                display: format_crypto_amount(conversion.converted_amount.amount(), &symbol),
                original_amount: conversion.original_amount.amount(),
                converted_amount: conversion.converted_amount.amount(),
                exchange_rate: conversion.exchange_rate,
                symbol: symbol.into(),
            },
            Err(e) => QuoteLine::Error {
                symbol: symbol.into(),
                reason: e.to_string(),
            },
        })
        .collect();

    Ok(Json(QuoteResponse {
        usd_amount: usd.amount(),
        quotes,
    }))
}

enum QuoteApiError {
    NegativeAmount,
    NoSymbols,
}

impl IntoResponse for QuoteApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            QuoteApiError::NegativeAmount => {
                (StatusCode::BAD_REQUEST, "amount must not be negative").into_response()
            }
            QuoteApiError::NoSymbols => {
                (StatusCode::BAD_REQUEST, "no symbols requested").into_response()
            }
        }
    }
}
