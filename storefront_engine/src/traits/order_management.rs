use crate::{
    db_types::{Order, OrderItem, OrderStatusType, Payment, PaymentStatus, Shipment, ShipmentUpdate},
    traits::{
        data_objects::{OrderPlan, OrderQueryFilter, Pagination, PlacedOrder, SalesSummary, StatusCount},
        StorageError,
    },
};

/// Orders, along with their line items, payments and shipments.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Executes the order flow for `plan` as a single atomic unit:
    /// 1. insert the order,
    /// 2. insert the order items,
    /// 3. decrement the stock of each product, failing with [`StorageError::InsufficientStock`] if any product does
    ///    not have enough stock left,
    /// 4. record the payment,
    /// 5. create the shipment,
    /// 6. clear the customer's cart.
    ///
    /// If any step fails, none of the changes are kept.
    async fn place_order(&self, plan: OrderPlan) -> Result<PlacedOrder, StorageError>;

    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, StorageError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, StorageError>;

    /// Orders matching the filter, newest first.
    async fn search_orders(&self, filter: &OrderQueryFilter, page: &Pagination) -> Result<Vec<Order>, StorageError>;

    /// Moves the order from `from` to `to`. The write only happens while the order is still in `from`; otherwise
    /// [`StorageError::InvalidData`] is returned and nothing changes. Returns `None` if the order does not exist.
    async fn update_order_status(
        &self,
        id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Option<Order>, StorageError>;

    /// Atomically cancels a pending or processing order: the status becomes `cancelled`, item quantities are returned
    /// to stock, a completed payment is refunded (a pending one is cancelled) and the shipment is cancelled. Orders in
    /// any other status are left alone and [`StorageError::InvalidData`] is returned.
    async fn cancel_order(&self, id: i64) -> Result<Order, StorageError>;

    async fn fetch_payment(&self, order_id: i64) -> Result<Option<Payment>, StorageError>;

    async fn update_payment_status(&self, order_id: i64, status: PaymentStatus)
        -> Result<Option<Payment>, StorageError>;

    async fn fetch_shipment(&self, order_id: i64) -> Result<Option<Shipment>, StorageError>;

    async fn update_shipment(&self, order_id: i64, update: ShipmentUpdate) -> Result<Option<Shipment>, StorageError>;

    /// Number of orders in each status. Statuses with no orders are omitted.
    async fn order_status_counts(&self) -> Result<Vec<StatusCount>, StorageError>;

    /// Order count, units sold and revenue over all orders that have not been cancelled. If `seller_id` is given, only
    /// that seller's order lines are counted.
    async fn sales_summary(&self, seller_id: Option<i64>) -> Result<SalesSummary, StorageError>;
}
