//! Buyer-session state: the cart, the settings and the product catalog.

pub mod cart;
pub mod catalog;
pub mod settings;

pub use cart::{CART_STORAGE_KEY, CartAction, CartSnapshot, CartStore};
pub use catalog::{asset_options, find_product, products};
pub use settings::{SETTINGS_STORAGE_KEY, SettingsStore};
