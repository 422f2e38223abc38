//! Checkout of the buyer's cart.
//!
//! [`CheckoutOrchestrator`] turns a cart snapshot into exactly one
//! [`CheckoutOutcome`]. Card payments settle immediately. Crypto payments
//! quote the cart total in the chosen asset, build a `wallet_pay` request
//! and hand it to a wallet session.

mod error;
mod orchestrator;
mod request;

pub use error::{CheckoutError, CheckoutOutcome};
pub use orchestrator::{CheckoutAttempt, CheckoutOrchestrator, CheckoutServices};
pub use request::{build_wallet_pay_request, caip10_recipient};
