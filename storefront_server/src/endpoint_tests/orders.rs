use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::{json, Value};
use storefront_engine::{
    db_types::{Actor, Role},
    test_utils::prepare_env::{create_product, create_user},
    traits::CatalogManagement,
    MemoryDatabase,
};

use super::helpers::*;

struct Shop {
    db: MemoryDatabase,
    seller: Actor,
    customer: Actor,
    teapot: i64,
    cups: i64,
}

async fn open_shop() -> Shop {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let seller = create_user(&db, "sam", Role::Seller).await;
    let customer = create_user(&db, "cora", Role::Customer).await;
    let teapot = create_product(&db, &seller, "Teapot", 2500, 5).await.id;
    let cups = create_product(&db, &seller, "Cups", 800, 20).await.id;
    Shop { db, seller, customer, teapot, cups }
}

async fn call(shop: &Shop, req: TestRequest) -> (StatusCode, Value) {
    let (status, body) = send_request(req, memory_store(shop.db.clone())).await;
    let value = if body.is_empty() { Value::Null } else { json(&body) };
    (status, value)
}

async fn add_to_cart(shop: &Shop, token: &str, product_id: i64, quantity: i64) -> StatusCode {
    let req = TestRequest::post()
        .uri("/api/cart")
        .insert_header(bearer(token))
        .set_json(json!({ "product_id": product_id, "quantity": quantity }));
    call(shop, req).await.0
}

async fn checkout(shop: &Shop, token: &str, payment_method: &str) -> (StatusCode, Value) {
    let req = TestRequest::post()
        .uri("/api/checkout")
        .insert_header(bearer(token))
        .set_json(json!({ "shipping_address": "12 Kettle Lane, Brewton", "payment_method": payment_method }));
    call(shop, req).await
}

async fn set_status(shop: &Shop, token: &str, order_id: &Value, status: &str) -> (StatusCode, Value) {
    let req = TestRequest::patch()
        .uri(&format!("/api/orders/{order_id}/status"))
        .insert_header(bearer(token))
        .set_json(json!({ "status": status }));
    call(shop, req).await
}

#[actix_web::test]
async fn cart_requires_login() {
    let shop = open_shop().await;
    let (status, _) = call(&shop, TestRequest::get().uri("/api/cart")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn cart_subtotal() {
    let shop = open_shop().await;
    let token = token_for(&shop.customer, "cora");
    assert_eq!(add_to_cart(&shop, &token, shop.teapot, 1).await, StatusCode::OK);
    assert_eq!(add_to_cart(&shop, &token, shop.cups, 2).await, StatusCode::OK);
    // Adding again increases the quantity
    assert_eq!(add_to_cart(&shop, &token, shop.cups, 2).await, StatusCode::OK);

    let (status, cart) = call(&shop, TestRequest::get().uri("/api/cart").insert_header(bearer(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["lines"].as_array().map(Vec::len), Some(2));
    assert_eq!(cart["item_count"], 5);
    assert_eq!(cart["subtotal"], 2500 + 4 * 800);

    let req = TestRequest::patch()
        .uri(&format!("/api/cart/{}", shop.cups))
        .insert_header(bearer(&token))
        .set_json(json!({ "quantity": 0 }));
    let (status, _) = call(&shop, req).await;
    assert_eq!(status, StatusCode::OK);
    let (_, cart) = call(&shop, TestRequest::get().uri("/api/cart").insert_header(bearer(&token))).await;
    assert_eq!(cart["subtotal"], 2500);
}

#[actix_web::test]
async fn cannot_add_more_than_in_stock() {
    let shop = open_shop().await;
    let token = token_for(&shop.customer, "cora");
    assert_eq!(add_to_cart(&shop, &token, shop.teapot, 3).await, StatusCode::OK);
    assert_eq!(add_to_cart(&shop, &token, shop.teapot, 3).await, StatusCode::CONFLICT);
    assert_eq!(add_to_cart(&shop, &token, 999, 1).await, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn checkout_with_empty_cart() {
    let shop = open_shop().await;
    let token = token_for(&shop.customer, "cora");
    let (status, body) = checkout(&shop, &token, "card").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Your cart is empty");
}

#[actix_web::test]
async fn card_checkout_settles_immediately() {
    let shop = open_shop().await;
    let token = token_for(&shop.customer, "cora");
    add_to_cart(&shop, &token, shop.teapot, 2).await;
    add_to_cart(&shop, &token, shop.cups, 4).await;

    let (status, details) = checkout(&shop, &token, "card").await;
    assert_eq!(status, StatusCode::CREATED, "{details}");
    assert_eq!(details["order"]["status"], "processing");
    assert_eq!(details["order"]["total_amount"], 2 * 2500 + 4 * 800);
    assert_eq!(details["items"].as_array().map(Vec::len), Some(2));
    assert_eq!(details["payment"]["status"], "completed");
    assert_eq!(details["payment"]["method"], "card");
    assert_eq!(details["shipment"]["status"], "preparing");

    let (_, cart) = call(&shop, TestRequest::get().uri("/api/cart").insert_header(bearer(&token))).await;
    assert_eq!(cart["item_count"], 0);
    let teapot = shop.db.fetch_product(shop.teapot).await.unwrap().unwrap();
    assert_eq!(teapot.stock, 3);

    let (status, orders) = call(&shop, TestRequest::get().uri("/api/orders").insert_header(bearer(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders[0]["id"], details["order"]["id"]);
}

#[actix_web::test]
async fn orders_are_private() {
    let shop = open_shop().await;
    let token = token_for(&shop.customer, "cora");
    add_to_cart(&shop, &token, shop.cups, 1).await;
    let (_, details) = checkout(&shop, &token, "paypal").await;
    let uri = format!("/api/orders/{}", details["order"]["id"]);

    let other = create_user(&shop.db, "oscar", Role::Customer).await;
    let req = TestRequest::get().uri(&uri).insert_header(bearer(&token_for(&other, "oscar")));
    let (status, _) = call(&shop, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The seller of an item in the order may see it
    let seller_token = token_for(&shop.seller, "sam");
    let (status, _) = call(&shop, TestRequest::get().uri(&uri).insert_header(bearer(&seller_token))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&shop, TestRequest::get().uri(&uri).insert_header(bearer(&token))).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn customers_cannot_change_order_status() {
    let shop = open_shop().await;
    let token = token_for(&shop.customer, "cora");
    add_to_cart(&shop, &token, shop.cups, 1).await;
    let (_, details) = checkout(&shop, &token, "card").await;
    let (status, _) = set_status(&shop, &token, &details["order"]["id"], "shipped").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn shipped_orders_cannot_be_cancelled() {
    let shop = open_shop().await;
    let token = token_for(&shop.customer, "cora");
    let seller_token = token_for(&shop.seller, "sam");
    add_to_cart(&shop, &token, shop.teapot, 1).await;
    let (_, details) = checkout(&shop, &token, "card").await;
    let order_id = &details["order"]["id"];

    let (status, shipped) = set_status(&shop, &seller_token, order_id, "shipped").await;
    assert_eq!(status, StatusCode::OK, "{shipped}");
    assert_eq!(shipped["order"]["status"], "shipped");
    assert_eq!(shipped["shipment"]["status"], "in_transit");

    let req = TestRequest::post().uri(&format!("/api/orders/{order_id}/cancel")).insert_header(bearer(&token));
    let (status, body) = call(&shop, req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "A shipped order can no longer be cancelled");

    // Skipping back in the lifecycle is not allowed either
    let (status, _) = set_status(&shop, &seller_token, order_id, "processing").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn cancelling_restores_stock() {
    let shop = open_shop().await;
    let token = token_for(&shop.customer, "cora");
    add_to_cart(&shop, &token, shop.teapot, 2).await;
    let (_, details) = checkout(&shop, &token, "card").await;
    let order_id = &details["order"]["id"];
    assert_eq!(shop.db.fetch_product(shop.teapot).await.unwrap().unwrap().stock, 3);

    let req = TestRequest::post().uri(&format!("/api/orders/{order_id}/cancel")).insert_header(bearer(&token));
    let (status, cancelled) = call(&shop, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["order"]["status"], "cancelled");
    assert_eq!(cancelled["payment"]["status"], "refunded");
    assert_eq!(shop.db.fetch_product(shop.teapot).await.unwrap().unwrap().stock, 5);
}

#[actix_web::test]
async fn cash_on_delivery_is_collected_on_delivery() {
    let shop = open_shop().await;
    let token = token_for(&shop.customer, "cora");
    let seller_token = token_for(&shop.seller, "sam");
    add_to_cart(&shop, &token, shop.cups, 3).await;
    let (status, details) = checkout(&shop, &token, "cash_on_delivery").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(details["order"]["status"], "pending");
    assert_eq!(details["payment"]["status"], "pending");
    let order_id = &details["order"]["id"];

    for next in ["processing", "shipped"] {
        let (status, body) = set_status(&shop, &seller_token, order_id, next).await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }
    let (status, delivered) = set_status(&shop, &seller_token, order_id, "delivered").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(delivered["order"]["status"], "delivered");
    assert_eq!(delivered["payment"]["status"], "completed");
    assert_eq!(delivered["shipment"]["status"], "delivered");

    let req = TestRequest::get().uri("/api/seller/orders?status=delivered").insert_header(bearer(&seller_token));
    let (status, orders) = call(&shop, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn admin_stats() {
    let shop = open_shop().await;
    let admin = create_user(&shop.db, "root", Role::Admin).await;
    let token = token_for(&shop.customer, "cora");
    add_to_cart(&shop, &token, shop.teapot, 1).await;
    checkout(&shop, &token, "card").await;
    add_to_cart(&shop, &token, shop.cups, 2).await;
    let (_, second) = checkout(&shop, &token, "card").await;
    let req =
        TestRequest::post().uri(&format!("/api/orders/{}/cancel", second["order"]["id"])).insert_header(bearer(&token));
    call(&shop, req).await;

    let req = TestRequest::get().uri("/api/admin/stats").insert_header(bearer(&token_for(&shop.seller, "sam")));
    let (status, _) = call(&shop, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = TestRequest::get().uri("/api/admin/stats").insert_header(bearer(&token_for(&admin, "root")));
    let (status, stats) = call(&shop, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["counts"]["users"], 3);
    assert_eq!(stats["counts"]["products"], 2);
    assert_eq!(stats["counts"]["orders"], 2);
    // Cancelled orders do not count towards sales
    assert_eq!(stats["sales"]["orders"], 1);
    assert_eq!(stats["sales"]["revenue"], 2500);

    let req = TestRequest::get().uri("/api/seller/stats").insert_header(bearer(&token_for(&shop.seller, "sam")));
    let (status, stats) = call(&shop, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_products"], 2);
    assert_eq!(stats["sales"]["revenue"], 2500);
}
