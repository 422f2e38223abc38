#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod checkout;
pub mod config;
pub mod events;
pub mod money;
pub mod pricing;
pub mod storage;
pub mod stores;
pub mod utils;
pub mod wallet;
