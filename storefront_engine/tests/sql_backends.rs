//! Runs the same storage checks against the SQL backends. Each test is skipped unless its database URL is set:
//! `SF_TEST_POSTGRES_URL` for PostgreSQL and `SF_TEST_MYSQL_URL` for MySQL. The databases are migrated, but not
//! cleared, so all names are randomised.
use log::*;
use sf_common::Cents;
use storefront_engine::{
    db_types::{OrderStatusType, PaymentMethod, PaymentStatus, ProductUpdate, Role, ShipmentStatus},
    events::EventProducers,
    order_objects::CheckoutRequest,
    traits::{BackendKind, OrderQueryFilter, Pagination, ProductQueryFilter, ProductSort},
    CartManagement,
    CatalogManagement,
    OrderFlowApi,
    OrderManagement,
    ReviewManagement,
    Storage,
    StorageConfig,
    StorageError,
    StoragePreference,
    StorefrontDatabase,
    UserManagement,
};
use support::prepare_env::{create_product, create_user, prepare_test_env, unique_name};

mod support;

async fn connect(preference: StoragePreference, var: &str) -> Option<Storage> {
    prepare_test_env();
    let Ok(url) = std::env::var(var) else {
        warn!("🚀️ {var} is not set. Skipping the {preference} backend tests.");
        return None;
    };
    let config = match preference {
        StoragePreference::Postgres => StorageConfig { preference, postgres_url: Some(url), ..Default::default() },
        _ => StorageConfig { preference, mysql_url: Some(url), ..Default::default() },
    };
    Some(Storage::connect(&config).await.expect("Error connecting to the test database"))
}

#[tokio::test]
async fn postgres_backend() {
    if let Some(db) = connect(StoragePreference::Postgres, "SF_TEST_POSTGRES_URL").await {
        assert_eq!(db.backend(), BackendKind::Postgres);
        run_suite(db).await;
    }
}

#[tokio::test]
async fn mysql_backend() {
    if let Some(db) = connect(StoragePreference::MySql, "SF_TEST_MYSQL_URL").await {
        assert_eq!(db.backend(), BackendKind::MySql);
        run_suite(db).await;
    }
}

async fn run_suite(mut db: Storage) {
    users(&db).await;
    catalog(&db).await;
    order_flow(&db).await;
    status_writes(&db).await;
    reviews(&db).await;
    db.close().await.expect("Error closing the database");
    info!("🚀️ Backend suite complete");
}

async fn users(db: &Storage) {
    let name = unique_name("user");
    let actor = create_user(db, &name, Role::Customer).await;
    let user = db.fetch_user_by_username(&name).await.unwrap().unwrap();
    assert_eq!(user.id, actor.user_id);
    assert_eq!(user.role, Role::Customer);
    let by_email = db.fetch_user_by_email(&user.email).await.unwrap().unwrap();
    assert_eq!(by_email.id, user.id);

    let dup = storefront_engine::db_types::NewUser {
        username: name.clone(),
        email: format!("other_{}", user.email),
        password_hash: "x".into(),
        full_name: None,
        role: Role::Customer,
    };
    assert!(matches!(db.create_user(dup).await, Err(StorageError::AlreadyExists(_))));

    let update = storefront_engine::db_types::UserUpdate::default().with_role(Role::Seller);
    let user = db.update_user(user.id, update).await.unwrap().unwrap();
    assert_eq!(user.role, Role::Seller);
    assert!(db.delete_user(user.id).await.unwrap());
    assert!(db.fetch_user(user.id).await.unwrap().is_none());
}

async fn catalog(db: &Storage) {
    let seller = create_user(db, &unique_name("seller"), Role::Seller).await;
    let tag = unique_name("widget");
    let cheap = create_product(db, &seller, &format!("{tag} small"), 150, 5).await;
    let dear = create_product(db, &seller, &format!("{tag} large"), 990, 0).await;
    let hidden = create_product(db, &seller, &format!("{tag} retired"), 500, 5).await;
    db.update_product(hidden.id, ProductUpdate { is_active: Some(false), ..Default::default() }).await.unwrap();

    let filter = ProductQueryFilter::default().with_search(tag.to_uppercase()).with_sort(ProductSort::PriceDesc);
    let found = db.search_products(&filter, &Pagination::default()).await.unwrap();
    assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), vec![dear.id, cheap.id]);

    let mut filter = ProductQueryFilter::default().with_seller(seller.user_id).including_inactive();
    assert_eq!(db.search_products(&filter, &Pagination::all()).await.unwrap().len(), 3);
    filter.in_stock = true;
    filter.max_price = Some(Cents::from(600));
    let found = db.search_products(&filter, &Pagination::all()).await.unwrap();
    assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), vec![hidden.id, cheap.id]);

    // A literal percent sign must not act as a wildcard
    let filter = ProductQueryFilter::default().with_search(format!("{tag}%"));
    assert!(db.search_products(&filter, &Pagination::default()).await.unwrap().is_empty());
}

async fn order_flow(db: &Storage) {
    let seller = create_user(db, &unique_name("seller"), Role::Seller).await;
    let customer = create_user(db, &unique_name("customer"), Role::Customer).await;
    let mug = create_product(db, &seller, &unique_name("mug"), 500, 4).await;
    let pen = create_product(db, &seller, &unique_name("pen"), 150, 2).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());

    db.upsert_cart_item(customer.user_id, mug.id, 3).await.unwrap();
    db.upsert_cart_item(customer.user_id, pen.id, 2).await.unwrap();
    let req = CheckoutRequest { shipping_address: "5 Birch Way".into(), payment_method: PaymentMethod::Card };
    let placed = api.checkout(customer.user_id, req).await.unwrap();
    assert_eq!(placed.order.status, OrderStatusType::Processing);
    assert_eq!(placed.order.total_amount, Cents::from(1800));
    assert_eq!(placed.items.len(), 2);
    assert_eq!(placed.payment.as_ref().unwrap().status, PaymentStatus::Completed);
    assert!(db.fetch_cart(customer.user_id).await.unwrap().is_empty());
    assert_eq!(db.fetch_product(mug.id).await.unwrap().unwrap().stock, 1);
    assert_eq!(db.fetch_product(pen.id).await.unwrap().unwrap().stock, 0);

    // Nothing is written if any line is short
    db.upsert_cart_item(customer.user_id, mug.id, 1).await.unwrap();
    db.upsert_cart_item(customer.user_id, pen.id, 1).await.unwrap();
    let req = CheckoutRequest { shipping_address: "5 Birch Way".into(), payment_method: PaymentMethod::Paypal };
    assert!(api.checkout(customer.user_id, req).await.is_err());
    assert_eq!(db.fetch_product(mug.id).await.unwrap().unwrap().stock, 1);
    assert_eq!(db.fetch_cart(customer.user_id).await.unwrap().len(), 2);
    db.clear_cart(customer.user_id).await.unwrap();

    let orders = db.search_orders(&OrderQueryFilter::for_seller(seller.user_id), &Pagination::default()).await.unwrap();
    assert_eq!(orders.len(), 1);
    let sales = db.sales_summary(Some(seller.user_id)).await.unwrap();
    assert_eq!(sales.units_sold, 5);
    assert_eq!(sales.revenue, Cents::from(1800));

    let cancelled = db.cancel_order(placed.order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatusType::Cancelled);
    assert_eq!(db.fetch_product(mug.id).await.unwrap().unwrap().stock, 4);
    assert_eq!(db.fetch_payment(cancelled.id).await.unwrap().unwrap().status, PaymentStatus::Refunded);
    assert_eq!(db.fetch_shipment(cancelled.id).await.unwrap().unwrap().status, ShipmentStatus::Cancelled);
    assert!(matches!(db.cancel_order(cancelled.id).await, Err(StorageError::InvalidData(_))));
    assert_eq!(db.sales_summary(Some(seller.user_id)).await.unwrap().revenue, Cents::from(0));

    // Deleting a product keeps the order lines, without the product reference
    assert!(db.delete_product(mug.id).await.unwrap());
    let items = db.fetch_order_items(cancelled.id).await.unwrap();
    let mug_line = items.iter().find(|i| i.product_name == mug.name).unwrap();
    assert_eq!(mug_line.product_id, None);
    assert_eq!(mug_line.unit_price, Cents::from(500));
}

async fn status_writes(db: &Storage) {
    let seller = create_user(db, &unique_name("seller"), Role::Seller).await;
    let customer = create_user(db, &unique_name("customer"), Role::Customer).await;
    let kettle = create_product(db, &seller, &unique_name("kettle"), 3000, 5).await;
    let api = OrderFlowApi::new(db.clone(), EventProducers::default());
    db.upsert_cart_item(customer.user_id, kettle.id, 2).await.unwrap();
    let req = CheckoutRequest { shipping_address: "9 Elm Row".into(), payment_method: PaymentMethod::Card };
    let id = api.checkout(customer.user_id, req).await.unwrap().order.id;

    // A write that expects a status the order is no longer in changes nothing
    let err = db.update_order_status(id, OrderStatusType::Pending, OrderStatusType::Shipped).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidData(_)));
    assert_eq!(db.fetch_order(id).await.unwrap().unwrap().status, OrderStatusType::Processing);
    let missing = db.update_order_status(-1, OrderStatusType::Pending, OrderStatusType::Processing).await.unwrap();
    assert!(missing.is_none());

    let shipped = db.update_order_status(id, OrderStatusType::Processing, OrderStatusType::Shipped).await.unwrap();
    assert_eq!(shipped.unwrap().status, OrderStatusType::Shipped);

    // Shipped orders stay shipped: no restock, no refund
    assert!(matches!(db.cancel_order(id).await, Err(StorageError::InvalidData(_))));
    assert_eq!(db.fetch_order(id).await.unwrap().unwrap().status, OrderStatusType::Shipped);
    assert_eq!(db.fetch_product(kettle.id).await.unwrap().unwrap().stock, 3);
    assert_eq!(db.fetch_payment(id).await.unwrap().unwrap().status, PaymentStatus::Completed);
}

async fn reviews(db: &Storage) {
    let seller = create_user(db, &unique_name("seller"), Role::Seller).await;
    let alice = create_user(db, &unique_name("alice"), Role::Customer).await;
    let bob = create_user(db, &unique_name("bob"), Role::Customer).await;
    let book = create_product(db, &seller, &unique_name("book"), 2000, 10).await;
    let review = |user_id, rating| storefront_engine::db_types::NewReview {
        product_id: book.id,
        user_id,
        rating,
        comment: None,
        verified_purchase: false,
    };
    db.create_review(review(alice.user_id, 5)).await.unwrap();
    db.create_review(review(bob.user_id, 2)).await.unwrap();
    assert!(matches!(db.create_review(review(bob.user_id, 4)).await, Err(StorageError::AlreadyExists(_))));
    let summary = db.rating_summary(book.id).await.unwrap();
    assert_eq!(summary.count, 2);
    assert_eq!(summary.average, Some(3.5));
    assert!(!db.has_purchased(alice.user_id, book.id).await.unwrap());
    assert_eq!(db.fetch_reviews_for_product(book.id).await.unwrap().len(), 2);
}
