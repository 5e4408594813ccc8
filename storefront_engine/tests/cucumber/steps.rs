use cucumber::{then, when};
use sf_common::Cents;
use storefront_engine::{
    cart_objects::CartItemRequest,
    db_types::{OrderStatusType, PaymentMethod, PaymentStatus, ShipmentStatus},
    order_objects::CheckoutRequest,
    CatalogManagement,
};

use crate::cucumber::StorefrontWorld;

#[when(expr = "'{word}' adds {int} '{word}' to their cart")]
async fn add_to_cart(world: &mut StorefrontWorld, name: String, quantity: i64, product: String) {
    let store = world.store();
    let actor = store.actor(&name);
    let product_id = store.product(&product).id;
    let item = CartItemRequest { product_id, quantity };
    store.cart_api().add_item(actor.user_id, item).await.expect("Error adding item");
}

#[when(expr = "'{word}' checks out paying by {word}")]
async fn checkout(world: &mut StorefrontWorld, name: String, method: String) {
    let store = world.store();
    let actor = store.actor(&name);
    let payment_method = method.parse::<PaymentMethod>().expect("Not a payment method");
    let req = CheckoutRequest { shipping_address: format!("{name}'s house, 1 Test Street"), payment_method };
    match store.order_api().checkout(actor.user_id, req).await {
        Ok(order) => {
            store.last_order = Some(order);
            store.last_error = None;
        },
        Err(e) => store.last_error = Some(e.to_string()),
    }
}

#[when(expr = "'{word}' moves the order to {word}")]
async fn move_order(world: &mut StorefrontWorld, name: String, status: String) {
    let store = world.store();
    let actor = store.actor(&name);
    let status = status.parse::<OrderStatusType>().expect("Not an order status");
    let id = store.order().order.id;
    let order = store.order_api().update_status(&actor, id, status).await.expect("Error updating order status");
    store.last_order = Some(order);
}

#[when(expr = "'{word}' cancels the order")]
async fn cancel_order(world: &mut StorefrontWorld, name: String) {
    let store = world.store();
    let actor = store.actor(&name);
    let id = store.order().order.id;
    let order = store.order_api().cancel_order(&actor, id).await.expect("Error cancelling order");
    store.last_order = Some(order);
}

#[then(expr = "the cart of '{word}' totals {word}")]
async fn cart_total(world: &mut StorefrontWorld, name: String, total: String) {
    let store = world.store();
    let actor = store.actor(&name);
    let cart = store.cart_api().view(actor.user_id).await.expect("Error fetching cart");
    assert_eq!(cart.subtotal, total.parse::<Cents>().expect("Not a valid amount"));
}

#[then(expr = "the cart of '{word}' is empty")]
async fn cart_is_empty(world: &mut StorefrontWorld, name: String) {
    let store = world.store();
    let actor = store.actor(&name);
    let cart = store.cart_api().view(actor.user_id).await.expect("Error fetching cart");
    assert!(cart.is_empty(), "Cart has {} lines", cart.lines.len());
}

#[then(expr = "the cart of '{word}' has {int} line(s)")]
async fn cart_lines(world: &mut StorefrontWorld, name: String, lines: usize) {
    let store = world.store();
    let actor = store.actor(&name);
    let cart = store.cart_api().view(actor.user_id).await.expect("Error fetching cart");
    assert_eq!(cart.lines.len(), lines);
}

#[then(expr = "the order is {word}")]
async fn order_status(world: &mut StorefrontWorld, status: String) {
    let status = status.parse::<OrderStatusType>().expect("Not an order status");
    assert_eq!(world.store().order().order.status, status);
}

#[then(expr = "the order total is {word}")]
async fn order_total(world: &mut StorefrontWorld, total: String) {
    let total = total.parse::<Cents>().expect("Not a valid amount");
    assert_eq!(world.store().order().order.total_amount, total);
}

#[then(expr = "the payment is {word}")]
async fn payment_status(world: &mut StorefrontWorld, status: String) {
    let status = status.parse::<PaymentStatus>().expect("Not a payment status");
    let payment = world.store().order().payment.as_ref().expect("Order has no payment");
    assert_eq!(payment.status, status);
}

#[then(expr = "the shipment is {word}")]
async fn shipment_status(world: &mut StorefrontWorld, status: String) {
    let status = status.parse::<ShipmentStatus>().expect("Not a shipment status");
    let shipment = world.store().order().shipment.as_ref().expect("Order has no shipment");
    assert_eq!(shipment.status, status);
}

#[then(expr = "'{word}' has {int} in stock")]
async fn stock_level(world: &mut StorefrontWorld, product: String, stock: i64) {
    let store = world.store();
    let id = store.product(&product).id;
    let product = store.db.fetch_product(id).await.expect("Error fetching product").expect("Product is gone");
    assert_eq!(product.stock, stock);
}

#[then(expr = "checkout fails with {string}")]
async fn checkout_failed(world: &mut StorefrontWorld, message: String) {
    let err = world.store().last_error.as_ref().expect("Checkout did not fail");
    assert!(err.contains(&message), "Expected '{message}' in '{err}'");
}
