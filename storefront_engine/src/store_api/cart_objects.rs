use serde::{Deserialize, Serialize};
use sf_common::Cents;

use crate::db_types::{CartItem, Product};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item: CartItem,
    pub product: Product,
    pub line_total: Cents,
}

impl CartLine {
    pub fn new(item: CartItem, product: Product) -> Self {
        let line_total = product.price * item.quantity;
        Self { item, product, line_total }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub subtotal: Cents,
    /// Total number of units across all lines.
    pub item_count: i64,
}

impl CartView {
    pub fn new(lines: Vec<CartLine>) -> Self {
        let subtotal = lines.iter().map(|l| l.line_total).sum();
        let item_count = lines.iter().map(|l| l.item.quantity).sum();
        Self { lines, subtotal, item_count }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CartItemRequest {
    pub product_id: i64,
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CartQuantity {
    pub quantity: i64,
}
