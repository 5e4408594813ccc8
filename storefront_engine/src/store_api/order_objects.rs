use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderItem, OrderStatusType, Payment, PaymentMethod, Shipment},
    traits::PlacedOrder,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatusType,
}

/// An order with everything that hangs off it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Option<Payment>,
    pub shipment: Option<Shipment>,
}

impl From<PlacedOrder> for OrderDetails {
    fn from(placed: PlacedOrder) -> Self {
        Self {
            order: placed.order,
            items: placed.items,
            payment: Some(placed.payment),
            shipment: Some(placed.shipment),
        }
    }
}
