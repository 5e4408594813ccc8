use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderItem, OrderStatusType, Payment};

/// Published after the order flow has completed and the order is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlacedEvent {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Payment,
}

impl OrderPlacedEvent {
    pub fn new(order: Order, items: Vec<OrderItem>, payment: Payment) -> Self {
        Self { order, items, payment }
    }
}

/// Published whenever an order moves to a new status, including cancellations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub old_status: OrderStatusType,
    pub order: Order,
}

impl OrderStatusChangedEvent {
    pub fn new(old_status: OrderStatusType, order: Order) -> Self {
        Self { old_status, order }
    }

    pub fn new_status(&self) -> OrderStatusType {
        self.order.status
    }
}
