use std::sync::Arc;

use log::*;
use storefront_engine::{
    db_types::{PaymentMethod, Role},
    events::EventProducers,
    order_objects::CheckoutRequest,
    CartManagement,
    CatalogManagement,
    MemoryDatabase,
    OrderFlowApi,
    OrderFlowError,
};
use support::prepare_env::{create_product, create_user, prepare_test_env};

mod support;

const NUM_CUSTOMERS: usize = 20;
const STOCK: i64 = 7;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stock_is_never_oversold() {
    prepare_test_env();
    let db = MemoryDatabase::default();
    let seller = create_user(&db, "sally", Role::Seller).await;
    let lamp = create_product(&db, &seller, "Lamp", 2500, STOCK).await;
    let mut customers = Vec::with_capacity(NUM_CUSTOMERS);
    for i in 0..NUM_CUSTOMERS {
        let customer = create_user(&db, &format!("customer{i}"), Role::Customer).await;
        db.upsert_cart_item(customer.user_id, lamp.id, 1).await.unwrap();
        customers.push(customer);
    }
    let api = Arc::new(OrderFlowApi::new(db.clone(), EventProducers::default()));
    info!("🚀️ {NUM_CUSTOMERS} customers competing for {STOCK} lamps");
    let tasks = customers
        .into_iter()
        .map(|c| {
            let api = Arc::clone(&api);
            tokio::spawn(async move {
                let req = CheckoutRequest { shipping_address: "Somewhere".into(), payment_method: PaymentMethod::Card };
                api.checkout(c.user_id, req).await
            })
        })
        .collect::<Vec<_>>();
    let mut sold = 0;
    let mut refused = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => sold += 1,
            Err(OrderFlowError::InsufficientStock { .. }) => refused += 1,
            Err(e) => panic!("Unexpected checkout error: {e}"),
        }
    }
    assert_eq!(sold, STOCK);
    assert_eq!(refused, NUM_CUSTOMERS as i64 - STOCK);
    let lamp = db.fetch_product(lamp.id).await.unwrap().unwrap();
    assert_eq!(lamp.stock, 0);
    info!("🚀️ test complete");
}
