//! Shopping cart.
//!
//! All changes go through [`CartAction`] and the reducer below. The new
//! state is persisted before it becomes visible, so a failed write leaves
//! the cart unchanged.

use crate::storage::{KeyValueStore, StorageError, read_json, write_json};
use compact_str::CompactString;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use wpay_sdk::objects::{CartItem, CartView, Product};

pub const CART_STORAGE_KEY: &str = "cart";

#[derive(Debug, Clone)]
pub enum CartAction {
    /// Adds to an existing line with the same product and size.
    Add {
        product: Product,
        size: CompactString,
        quantity: u32,
    },
    Remove {
        product_id: CompactString,
        size: CompactString,
    },
    /// A quantity of zero or less removes the line.
    UpdateQuantity {
        product_id: CompactString,
        size: CompactString,
        quantity: i64,
    },
    Clear,
}

/// Frozen cart contents for one checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub total_price: Decimal,
}

impl CartSnapshot {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn reduce(items: &mut Vec<CartItem>, action: CartAction) {
    match action {
        CartAction::Add {
            product,
            size,
            quantity,
        } => match items.iter_mut().find(|i| i.matches(&product.id, &size)) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => items.push(CartItem {
                product,
                quantity,
                size,
            }),
        },
        CartAction::Remove { product_id, size } => {
            items.retain(|i| !i.matches(&product_id, &size));
        }
        CartAction::UpdateQuantity {
            product_id,
            size,
            quantity,
        } => {
            if quantity <= 0 {
                items.retain(|i| !i.matches(&product_id, &size));
            } else if let Some(line) = items.iter_mut().find(|i| i.matches(&product_id, &size)) {
                line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
            }
        }
        CartAction::Clear => items.clear(),
    }
}

fn total_items(items: &[CartItem]) -> u32 {
    items.iter().fold(0u32, |acc, i| acc.saturating_add(i.quantity))
}

fn total_price(items: &[CartItem]) -> Decimal {
    items.iter().map(CartItem::line_total).sum()
}

fn view_of(items: &[CartItem]) -> CartView {
    CartView {
        items: items.to_vec(),
        total_items: total_items(items),
        total_price: total_price(items),
    }
}

#[derive(Clone)]
pub struct CartStore {
    items: Arc<RwLock<Vec<CartItem>>>,
    store: Arc<dyn KeyValueStore>,
}

impl CartStore {
    /// Restore the persisted cart. An unreadable cart starts empty.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let items = match read_json::<Vec<CartItem>>(store.as_ref(), CART_STORAGE_KEY).await {
            Ok(items) => items.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable stored cart");
                Vec::new()
            }
        };
        debug!(lines = items.len(), "Cart loaded");
        Self {
            items: Arc::new(RwLock::new(items)),
            store,
        }
    }

    pub async fn items(&self) -> Vec<CartItem> {
        self.items.read().await.clone()
    }

    pub async fn view(&self) -> CartView {
        view_of(&self.items.read().await)
    }

    pub async fn snapshot(&self) -> CartSnapshot {
        let items = self.items.read().await.clone();
        let total_price = total_price(&items);
        CartSnapshot { items, total_price }
    }

    pub async fn total_items(&self) -> u32 {
        total_items(&self.items.read().await)
    }

    pub async fn total_price(&self) -> Decimal {
        total_price(&self.items.read().await)
    }

    pub async fn add(
        &self,
        product: Product,
        size: impl Into<CompactString>,
        quantity: u32,
    ) -> Result<CartView, StorageError> {
        self.process(CartAction::Add {
            product,
            size: size.into(),
            quantity,
        })
        .await
    }

    pub async fn remove(
        &self,
        product_id: impl Into<CompactString>,
        size: impl Into<CompactString>,
    ) -> Result<CartView, StorageError> {
        self.process(CartAction::Remove {
            product_id: product_id.into(),
            size: size.into(),
        })
        .await
    }

    pub async fn update_quantity(
        &self,
        product_id: impl Into<CompactString>,
        size: impl Into<CompactString>,
        quantity: i64,
    ) -> Result<CartView, StorageError> {
        self.process(CartAction::UpdateQuantity {
            product_id: product_id.into(),
            size: size.into(),
            quantity,
        })
        .await
    }

    pub async fn clear(&self) -> Result<CartView, StorageError> {
        self.process(CartAction::Clear).await
    }
}

impl Processor<CartAction> for CartStore {
    type Output = CartView;
    type Error = StorageError;

    #[tracing::instrument(skip_all, err, name = "CartAction")]
    async fn process(&self, action: CartAction) -> Result<CartView, StorageError> {
        let mut items = self.items.write().await;
        let mut next = items.clone();
        reduce(&mut next, action);
        write_json(self.store.as_ref(), CART_STORAGE_KEY, &next).await?;
        *items = next;
        debug!(lines = items.len(), total_items = total_items(&items), "Cart updated");
        Ok(view_of(&items))
    }
}
