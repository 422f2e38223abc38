//! Shared wire types for the WalletPay storefront.
//!
//! `objects` holds everything that crosses a process boundary: catalog and
//! cart DTOs, payment assets, the `wallet_pay` request, price-source bodies
//! and the checkout WebSocket protocol. The optional `client` module is a
//! typed HTTP client for the storefront server.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(unsafe_code)]

#[cfg(feature = "client")]
pub mod client;
pub mod objects;
