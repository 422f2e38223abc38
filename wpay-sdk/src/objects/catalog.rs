//! Catalog, cart and shipping objects.

use compact_str::CompactString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product offered by the storefront. Prices are in USD.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: CompactString,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: String,
    pub category: CompactString,
    pub sizes: Vec<CompactString>,
}

/// One cart line. A line is identified by product id + size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
    pub size: CompactString,
}

impl CartItem {
    pub fn matches(&self, product_id: &str, size: &str) -> bool {
        self.product.id == product_id && self.size == size
    }

    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// Cart contents together with its totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total_items: u32,
    pub total_price: Decimal,
}

/// `POST /api/v1/cart/items`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCartItem {
    pub product_id: CompactString,
    pub size: CompactString,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// `PATCH /api/v1/cart/items`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCartItem {
    pub product_id: CompactString,
    pub size: CompactString,
    /// Zero or less removes the line.
    pub quantity: i64,
}

/// `DELETE /api/v1/cart/items`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveCartItem {
    pub product_id: CompactString,
    pub size: CompactString,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    CreditCard,
    Crypto,
}
