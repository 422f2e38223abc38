//! HTTP API of the storefront, mounted under `/api/v1`.
//!
//! One buyer session per server: the cart, the settings and the wallet
//! modal are shared by every client.

mod cart;
mod catalog;
mod checkout;
mod quote;
mod settings;

use crate::state::AppState;
use axum::Router;

/// Build the `/api/v1` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(catalog::router())
        .merge(cart::router())
        .merge(settings::router())
        .merge(quote::router())
        .merge(checkout::router())
}
