//! Checkout and everything that happens to an order afterwards.
//!
//! The storage backends run the order flow itself (order, items, stock, payment, shipment, cart) atomically in
//! [`OrderManagement::place_order`]. This API validates the cart, prices it, simulates the payment, and enforces
//! who may see and change which order.
use std::fmt::Debug;

use chrono::Utc;
use log::*;
use sf_common::Cents;

use crate::{
    db_types::{
        Actor,
        NewPayment,
        NewShipment,
        Order,
        OrderItem,
        OrderStatusType,
        PaymentStatus,
        Role,
        ShipmentStatus,
        ShipmentUpdate,
    },
    events::{EventProducers, OrderPlacedEvent, OrderStatusChangedEvent},
    helpers::{estimated_delivery, new_tracking_number, new_transaction_ref, DEFAULT_CARRIER},
    store_api::{
        errors::OrderFlowError,
        order_objects::{CheckoutRequest, OrderDetails},
    },
    traits::{CartManagement, CatalogManagement, OrderLine, OrderManagement, OrderPlan, OrderQueryFilter, Pagination},
};

pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B: Debug> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.db)
    }
}

impl<B> OrderFlowApi<B>
where B: CartManagement + CatalogManagement + OrderManagement
{
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    /// Turns the user's cart into an order.
    ///
    /// Card and PayPal payments are settled immediately and the order starts out as `processing`. Cash on delivery
    /// leaves both the payment and the order `pending`.
    pub async fn checkout(&self, user_id: i64, req: CheckoutRequest) -> Result<OrderDetails, OrderFlowError> {
        let shipping_address = req.shipping_address.trim().to_string();
        if shipping_address.is_empty() {
            return Err(OrderFlowError::ValidationError("A shipping address is required".into()));
        }
        let cart = self.db.fetch_cart(user_id).await?;
        if cart.is_empty() {
            return Err(OrderFlowError::EmptyCart);
        }
        let mut lines = Vec::with_capacity(cart.len());
        for item in cart {
            let product = match self.db.fetch_product(item.product_id).await? {
                Some(p) if p.is_active => p,
                Some(p) => return Err(OrderFlowError::ProductUnavailable(p.name)),
                None => return Err(OrderFlowError::ProductUnavailable(format!("Product {}", item.product_id))),
            };
            if !product.is_available(item.quantity) {
                return Err(OrderFlowError::InsufficientStock {
                    product_id: product.id,
                    requested: item.quantity,
                    available: product.stock,
                });
            }
            lines.push(OrderLine {
                product_id: product.id,
                seller_id: product.seller_id,
                product_name: product.name,
                quantity: item.quantity,
                unit_price: product.price,
            });
        }
        let total_amount: Cents = lines.iter().map(OrderLine::line_total).sum();
        let method = req.payment_method;
        let (status, payment_status) = if method.settles_at_checkout() {
            (OrderStatusType::Processing, PaymentStatus::Completed)
        } else {
            (OrderStatusType::Pending, PaymentStatus::Pending)
        };
        let plan = OrderPlan {
            user_id,
            shipping_address,
            status,
            total_amount,
            lines,
            payment: NewPayment {
                amount: total_amount,
                method,
                status: payment_status,
                transaction_ref: new_transaction_ref(method),
            },
            shipment: NewShipment {
                carrier: DEFAULT_CARRIER.to_string(),
                tracking_number: new_tracking_number(),
                estimated_delivery: Some(estimated_delivery(Utc::now())),
            },
        };
        let placed = self.db.place_order(plan).await?;
        info!(
            "📦️ Order #{} placed by user #{user_id}: {} lines, total {}, paid by {method}",
            placed.order.id,
            placed.items.len(),
            placed.order.total_amount
        );
        let event = OrderPlacedEvent::new(placed.order.clone(), placed.items.clone(), placed.payment.clone());
        self.producers.publish_order_placed(event).await;
        Ok(placed.into())
    }

    /// The user's own orders, newest first.
    pub async fn order_history(&self, user_id: i64, page: &Pagination) -> Result<Vec<Order>, OrderFlowError> {
        Ok(self.db.search_orders(&OrderQueryFilter::for_user(user_id), page).await?)
    }

    /// Orders are visible to the customer who placed them, to admins, and to sellers with items in the order.
    pub async fn order_details(&self, actor: &Actor, order_id: i64) -> Result<OrderDetails, OrderFlowError> {
        let (order, items) = self.fetch_order_with_items(order_id).await?;
        let involved = order.user_id == actor.user_id || actor.is_admin() || sells_in(actor, &items);
        if !involved {
            return Err(OrderFlowError::Forbidden(format!("You cannot view order {order_id}")));
        }
        self.details(order, items).await
    }

    /// Cancels an order on behalf of the customer who placed it, or an admin. Stock is returned and the payment is
    /// refunded or cancelled.
    pub async fn cancel_order(&self, actor: &Actor, order_id: i64) -> Result<OrderDetails, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if order.user_id != actor.user_id && !actor.is_admin() {
            return Err(OrderFlowError::Forbidden("You can only cancel your own orders".into()));
        }
        self.cancel(actor, order).await
    }

    async fn cancel(&self, actor: &Actor, order: Order) -> Result<OrderDetails, OrderFlowError> {
        if !order.status.is_cancellable() {
            return Err(OrderFlowError::NotCancellable(order.status));
        }
        let old_status = order.status;
        let order = self.db.cancel_order(order.id).await?;
        info!("📦️ Order #{} cancelled by user #{}", order.id, actor.user_id);
        self.producers.publish_status_changed(OrderStatusChangedEvent::new(old_status, order.clone())).await;
        let items = self.db.fetch_order_items(order.id).await?;
        self.details(order, items).await
    }

    /// Moves an order along the status lifecycle. Admins may update any order, sellers only orders that contain
    /// their products.
    ///
    /// Shipping an order puts the shipment in transit. Delivering it completes the shipment and collects a pending
    /// (cash on delivery) payment. Moving to `cancelled` behaves like [`Self::cancel_order`].
    pub async fn update_status(
        &self,
        actor: &Actor,
        order_id: i64,
        status: OrderStatusType,
    ) -> Result<OrderDetails, OrderFlowError> {
        let (order, items) = self.fetch_order_with_items(order_id).await?;
        self.ensure_fulfiller(actor, &order, &items)?;
        if !order.status.can_transition_to(status) {
            return Err(OrderFlowError::InvalidTransition { from: order.status, to: status });
        }
        if status == OrderStatusType::Cancelled {
            return self.cancel(actor, order).await;
        }
        let old_status = order.status;
        let order = self
            .db
            .update_order_status(order_id, old_status, status)
            .await?
            .ok_or(OrderFlowError::OrderNotFound(order_id))?;
        match status {
            OrderStatusType::Shipped => {
                self.db.update_shipment(order_id, ShipmentUpdate::with_status(ShipmentStatus::InTransit)).await?;
            },
            OrderStatusType::Delivered => {
                self.db.update_shipment(order_id, ShipmentUpdate::with_status(ShipmentStatus::Delivered)).await?;
                let pending = self.db.fetch_payment(order_id).await?.filter(|p| p.status == PaymentStatus::Pending);
                if pending.is_some() {
                    self.db.update_payment_status(order_id, PaymentStatus::Completed).await?;
                    info!("📦️ Payment for order #{order_id} collected on delivery");
                }
            },
            _ => {},
        }
        info!("📦️ Order #{order_id} moved from {old_status} to {status} by user #{}", actor.user_id);
        self.producers.publish_status_changed(OrderStatusChangedEvent::new(old_status, order.clone())).await;
        self.details(order, items).await
    }

    /// Updates the carrier, tracking number or delivery estimate. The shipment status follows the order status and
    /// cannot be set here.
    pub async fn update_shipment(
        &self,
        actor: &Actor,
        order_id: i64,
        mut update: ShipmentUpdate,
    ) -> Result<OrderDetails, OrderFlowError> {
        let (order, items) = self.fetch_order_with_items(order_id).await?;
        self.ensure_fulfiller(actor, &order, &items)?;
        if update.status.take().is_some() {
            debug!("📦️ Ignoring shipment status in update for order #{order_id}");
        }
        if update.is_empty() {
            return Err(OrderFlowError::ValidationError("Nothing to update".into()));
        }
        if update.carrier.as_deref().map(|c| c.trim().is_empty()).unwrap_or(false) ||
            update.tracking_number.as_deref().map(|t| t.trim().is_empty()).unwrap_or(false)
        {
            return Err(OrderFlowError::ValidationError("Carrier and tracking number cannot be blank".into()));
        }
        self.db.update_shipment(order_id, update).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        debug!("📦️ Shipment for order #{order_id} updated by user #{}", actor.user_id);
        self.details(order, items).await
    }

    /// Admin order search.
    pub async fn search_orders(
        &self,
        actor: &Actor,
        filter: &OrderQueryFilter,
        page: &Pagination,
    ) -> Result<Vec<Order>, OrderFlowError> {
        if !actor.is_admin() {
            return Err(OrderFlowError::Forbidden("Only admins can search all orders".into()));
        }
        Ok(self.db.search_orders(filter, page).await?)
    }

    /// Orders containing at least one of the seller's products.
    pub async fn seller_orders(
        &self,
        actor: &Actor,
        status: Option<OrderStatusType>,
        page: &Pagination,
    ) -> Result<Vec<Order>, OrderFlowError> {
        let mut filter = OrderQueryFilter::for_seller(actor.user_id);
        filter.status = status;
        Ok(self.db.search_orders(&filter, page).await?)
    }

    fn ensure_fulfiller(&self, actor: &Actor, order: &Order, items: &[OrderItem]) -> Result<(), OrderFlowError> {
        let allowed = match actor.role {
            Role::Admin => true,
            Role::Seller => sells_in(actor, items),
            Role::Customer => false,
        };
        if allowed {
            Ok(())
        } else {
            warn!("📦️ User #{} tried to update order #{} without being involved in it", actor.user_id, order.id);
            Err(OrderFlowError::Forbidden(format!("You cannot update order {}", order.id)))
        }
    }

    async fn fetch_order_with_items(&self, order_id: i64) -> Result<(Order, Vec<OrderItem>), OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        let items = self.db.fetch_order_items(order_id).await?;
        Ok((order, items))
    }

    async fn details(&self, order: Order, items: Vec<OrderItem>) -> Result<OrderDetails, OrderFlowError> {
        let payment = self.db.fetch_payment(order.id).await?;
        let shipment = self.db.fetch_shipment(order.id).await?;
        Ok(OrderDetails { order, items, payment, shipment })
    }
}

fn sells_in(actor: &Actor, items: &[OrderItem]) -> bool {
    actor.role == Role::Seller && items.iter().any(|i| i.seller_id == actor.user_id)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        db_types::{PaymentMethod, Role},
        memory::MemoryDatabase,
        test_utils::prepare_env::{create_product, create_user},
    };

    fn checkout_req(method: PaymentMethod) -> CheckoutRequest {
        CheckoutRequest { shipping_address: "1 Main Street, Springfield".into(), payment_method: method }
    }

    #[tokio::test]
    async fn card_checkout_runs_the_whole_flow() {
        let db = MemoryDatabase::default();
        let seller = create_user(&db, "sally", Role::Seller).await;
        let carol = create_user(&db, "carol", Role::Customer).await;
        let mug = create_product(&db, &seller, "Mug", 500, 5).await;
        let pen = create_product(&db, &seller, "Pen", 150, 5).await;
        db.upsert_cart_item(carol.user_id, mug.id, 2).await.unwrap();
        db.upsert_cart_item(carol.user_id, pen.id, 1).await.unwrap();
        let api = OrderFlowApi::new(db.clone(), EventProducers::default());

        let details = api.checkout(carol.user_id, checkout_req(PaymentMethod::Card)).await.unwrap();
        assert_eq!(details.order.status, OrderStatusType::Processing);
        assert_eq!(details.order.total_amount.value(), 1150);
        assert_eq!(details.items.len(), 2);
        let payment = details.payment.unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert!(payment.transaction_ref.starts_with("CARD-"));
        let shipment = details.shipment.unwrap();
        assert_eq!(shipment.status, ShipmentStatus::Preparing);
        assert!(shipment.tracking_number.starts_with("SF"));

        assert_eq!(db.fetch_product(mug.id).await.unwrap().unwrap().stock, 3);
        assert_eq!(db.fetch_product(pen.id).await.unwrap().unwrap().stock, 4);
        assert!(db.fetch_cart(carol.user_id).await.unwrap().is_empty());
        assert!(matches!(
            api.checkout(carol.user_id, checkout_req(PaymentMethod::Card)).await,
            Err(OrderFlowError::EmptyCart)
        ));
    }

    #[tokio::test]
    async fn checkout_rejects_bad_carts() {
        let db = MemoryDatabase::default();
        let seller = create_user(&db, "sally", Role::Seller).await;
        let carol = create_user(&db, "carol", Role::Customer).await;
        let mug = create_product(&db, &seller, "Mug", 500, 1).await;
        db.upsert_cart_item(carol.user_id, mug.id, 2).await.unwrap();
        let api = OrderFlowApi::new(db.clone(), EventProducers::default());

        let mut req = checkout_req(PaymentMethod::Card);
        req.shipping_address = "   ".into();
        assert!(matches!(api.checkout(carol.user_id, req).await, Err(OrderFlowError::ValidationError(_))));
        let err = api.checkout(carol.user_id, checkout_req(PaymentMethod::Card)).await.unwrap_err();
        assert!(matches!(err, OrderFlowError::InsufficientStock { requested: 2, available: 1, .. }));

        db.upsert_cart_item(carol.user_id, mug.id, 1).await.unwrap();
        let hide = crate::db_types::ProductUpdate { is_active: Some(false), ..Default::default() };
        db.update_product(mug.id, hide).await.unwrap();
        let err = api.checkout(carol.user_id, checkout_req(PaymentMethod::Card)).await.unwrap_err();
        assert!(matches!(err, OrderFlowError::ProductUnavailable(name) if name == "Mug"));
        // Nothing was written
        assert_eq!(db.fetch_product(mug.id).await.unwrap().unwrap().stock, 1);
        assert_eq!(db.fetch_cart(carol.user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cash_on_delivery_lifecycle() {
        let db = MemoryDatabase::default();
        let seller = create_user(&db, "sally", Role::Seller).await;
        let other_seller = create_user(&db, "sam", Role::Seller).await;
        let carol = create_user(&db, "carol", Role::Customer).await;
        let dave = create_user(&db, "dave", Role::Customer).await;
        let mug = create_product(&db, &seller, "Mug", 500, 5).await;
        db.upsert_cart_item(carol.user_id, mug.id, 1).await.unwrap();
        let api = OrderFlowApi::new(db.clone(), EventProducers::default());

        let details = api.checkout(carol.user_id, checkout_req(PaymentMethod::CashOnDelivery)).await.unwrap();
        let id = details.order.id;
        assert_eq!(details.order.status, OrderStatusType::Pending);
        assert_eq!(details.payment.unwrap().status, PaymentStatus::Pending);

        assert!(matches!(api.order_details(&dave, id).await, Err(OrderFlowError::Forbidden(_))));
        assert!(matches!(api.order_details(&other_seller, id).await, Err(OrderFlowError::Forbidden(_))));
        assert!(api.order_details(&seller, id).await.is_ok());
        assert!(matches!(
            api.update_status(&carol, id, OrderStatusType::Processing).await,
            Err(OrderFlowError::Forbidden(_))
        ));
        assert!(matches!(
            api.update_status(&seller, id, OrderStatusType::Shipped).await,
            Err(OrderFlowError::InvalidTransition { from: OrderStatusType::Pending, to: OrderStatusType::Shipped })
        ));

        api.update_status(&seller, id, OrderStatusType::Processing).await.unwrap();
        let shipped = api.update_status(&seller, id, OrderStatusType::Shipped).await.unwrap();
        assert_eq!(shipped.shipment.unwrap().status, ShipmentStatus::InTransit);
        assert!(matches!(api.cancel_order(&carol, id).await, Err(OrderFlowError::NotCancellable(_))));
        let delivered = api.update_status(&seller, id, OrderStatusType::Delivered).await.unwrap();
        assert_eq!(delivered.order.status, OrderStatusType::Delivered);
        assert_eq!(delivered.shipment.unwrap().status, ShipmentStatus::Delivered);
        assert_eq!(delivered.payment.unwrap().status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn cancellation_restocks_and_refunds() {
        let db = MemoryDatabase::default();
        let seller = create_user(&db, "sally", Role::Seller).await;
        let carol = create_user(&db, "carol", Role::Customer).await;
        let dave = create_user(&db, "dave", Role::Customer).await;
        let admin = create_user(&db, "admin", Role::Admin).await;
        let mug = create_product(&db, &seller, "Mug", 500, 5).await;
        db.upsert_cart_item(carol.user_id, mug.id, 3).await.unwrap();
        let api = OrderFlowApi::new(db.clone(), EventProducers::default());
        let id = api.checkout(carol.user_id, checkout_req(PaymentMethod::Paypal)).await.unwrap().order.id;
        assert_eq!(db.fetch_product(mug.id).await.unwrap().unwrap().stock, 2);

        assert!(matches!(api.cancel_order(&dave, id).await, Err(OrderFlowError::Forbidden(_))));
        let cancelled = api.cancel_order(&carol, id).await.unwrap();
        assert_eq!(cancelled.order.status, OrderStatusType::Cancelled);
        assert_eq!(cancelled.payment.unwrap().status, PaymentStatus::Refunded);
        assert_eq!(cancelled.shipment.unwrap().status, ShipmentStatus::Cancelled);
        assert_eq!(db.fetch_product(mug.id).await.unwrap().unwrap().stock, 5);
        assert!(matches!(api.cancel_order(&admin, id).await, Err(OrderFlowError::NotCancellable(_))));

        let history = api.order_history(carol.user_id, &Pagination::default()).await.unwrap();
        assert_eq!(history.len(), 1);
        let all = api.search_orders(&admin, &OrderQueryFilter::default(), &Pagination::default()).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(matches!(
            api.search_orders(&seller, &OrderQueryFilter::default(), &Pagination::default()).await,
            Err(OrderFlowError::Forbidden(_))
        ));
        let seller_orders = api.seller_orders(&seller, None, &Pagination::default()).await.unwrap();
        assert_eq!(seller_orders.len(), 1);
    }

    #[tokio::test]
    async fn shipment_updates_ignore_status() {
        let db = MemoryDatabase::default();
        let seller = create_user(&db, "sally", Role::Seller).await;
        let carol = create_user(&db, "carol", Role::Customer).await;
        let mug = create_product(&db, &seller, "Mug", 500, 5).await;
        db.upsert_cart_item(carol.user_id, mug.id, 1).await.unwrap();
        let api = OrderFlowApi::new(db.clone(), EventProducers::default());
        let id = api.checkout(carol.user_id, checkout_req(PaymentMethod::Card)).await.unwrap().order.id;

        let update = ShipmentUpdate { status: Some(ShipmentStatus::Delivered), ..Default::default() };
        assert!(matches!(api.update_shipment(&seller, id, update).await, Err(OrderFlowError::ValidationError(_))));
        let update = ShipmentUpdate {
            carrier: Some("Parcel Co".into()),
            status: Some(ShipmentStatus::Delivered),
            ..Default::default()
        };
        let details = api.update_shipment(&seller, id, update).await.unwrap();
        let shipment = details.shipment.unwrap();
        assert_eq!(shipment.carrier, "Parcel Co");
        assert_eq!(shipment.status, ShipmentStatus::Preparing);
    }
}
