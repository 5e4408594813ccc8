use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::json;
use storefront_engine::{
    db_types::{ProductUpdate, Role},
    test_utils::prepare_env::{create_product, create_user},
    traits::CatalogManagement,
    MemoryDatabase,
};

use super::helpers::*;

#[actix_web::test]
async fn public_listing_hides_inactive_products() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let seller = create_user(&db, "sam", Role::Seller).await;
    create_product(&db, &seller, "Teapot", 2500, 3).await;
    let retired = create_product(&db, &seller, "Old Teapot", 1500, 0).await;
    let update = ProductUpdate { is_active: Some(false), ..Default::default() };
    db.update_product(retired.id, update).await.unwrap();

    let (status, body) = send_request(TestRequest::get().uri("/products"), memory_store(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let products = json(&body);
    assert_eq!(products.as_array().map(Vec::len), Some(1));
    assert_eq!(products[0]["name"], "Teapot");

    // Asking for inactive products anonymously changes nothing
    let req = TestRequest::get().uri("/products?include_inactive=true");
    let (_, body) = send_request(req, memory_store(db.clone())).await;
    assert_eq!(json(&body).as_array().map(Vec::len), Some(1));

    // ... but the seller sees their own retired products
    let token = token_for(&seller, "sam");
    let uri = format!("/products?include_inactive=true&seller_id={}", seller.user_id);
    let req = TestRequest::get().uri(&uri).insert_header(bearer(&token));
    let (_, body) = send_request(req, memory_store(db.clone())).await;
    assert_eq!(json(&body).as_array().map(Vec::len), Some(2));

    let (status, _) =
        send_request(TestRequest::get().uri(&format!("/products/{}", retired.id)), memory_store(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn product_detail_includes_rating() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let seller = create_user(&db, "sam", Role::Seller).await;
    let product = create_product(&db, &seller, "Kettle", 4200, 10).await;
    let (status, body) =
        send_request(TestRequest::get().uri(&format!("/products/{}", product.id)), memory_store(db)).await;
    assert_eq!(status, StatusCode::OK);
    let detail = json(&body);
    assert_eq!(detail["name"], "Kettle");
    assert_eq!(detail["price"], 4200);
    assert_eq!(detail["rating"]["count"], 0);
    assert!(detail["rating"]["average"].is_null());
}

#[actix_web::test]
async fn customers_cannot_create_products() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let customer = create_user(&db, "cora", Role::Customer).await;
    let token = token_for(&customer, "cora");
    let req = TestRequest::post()
        .uri("/api/seller/products")
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "Knock-off", "description": "", "price": 100, "stock": 1 }));
    let (status, body) = send_request(req, memory_store(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("seller, admin"), "was: {body}");
}

#[actix_web::test]
async fn sellers_manage_only_their_own_products() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let sam = create_user(&db, "sam", Role::Seller).await;
    let sue = create_user(&db, "sue", Role::Seller).await;
    let admin = create_user(&db, "root", Role::Admin).await;

    let req = TestRequest::post()
        .uri("/api/seller/products")
        .insert_header(bearer(&token_for(&sam, "sam")))
        .set_json(json!({ "name": "Lamp", "description": "Brass desk lamp", "price": 5600, "stock": 4 }));
    let (status, body) = send_request(req, memory_store(db.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let lamp = json(&body);
    assert_eq!(lamp["seller_id"], sam.user_id);
    let uri = format!("/api/seller/products/{}", lamp["id"]);

    let req = TestRequest::patch()
        .uri(&uri)
        .insert_header(bearer(&token_for(&sue, "sue")))
        .set_json(json!({ "price": 1 }));
    let (status, body) = send_request(req, memory_store(db.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Insufficient Permissions. You can only manage your own products"}"#);

    let req = TestRequest::patch()
        .uri(&uri)
        .insert_header(bearer(&token_for(&admin, "root")))
        .set_json(json!({ "price": 4900 }));
    let (status, body) = send_request(req, memory_store(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["price"], 4900);

    let req = TestRequest::get().uri("/api/seller/products").insert_header(bearer(&token_for(&sue, "sue")));
    let (_, body) = send_request(req, memory_store(db.clone())).await;
    assert_eq!(json(&body).as_array().map(Vec::len), Some(0));

    let req = TestRequest::delete().uri(&uri).insert_header(bearer(&token_for(&sam, "sam")));
    let (status, _) = send_request(req, memory_store(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let req = TestRequest::get().uri(&format!("/products/{}", lamp["id"]));
    let (status, _) = send_request(req, memory_store(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn admin_manages_categories() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let admin = create_user(&db, "root", Role::Admin).await;
    let seller = create_user(&db, "sam", Role::Seller).await;
    let new_category = json!({ "name": "Garden Tools", "description": "Spades and shears" });

    let req = TestRequest::post()
        .uri("/api/admin/categories")
        .insert_header(bearer(&token_for(&seller, "sam")))
        .set_json(new_category.clone());
    let (status, _) = send_request(req, memory_store(db.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = TestRequest::post()
        .uri("/api/admin/categories")
        .insert_header(bearer(&token_for(&admin, "root")))
        .set_json(new_category);
    let (status, body) = send_request(req, memory_store(db.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let category = json(&body);
    assert_eq!(category["slug"], "garden-tools");

    let uri = format!("/api/admin/categories/{}", category["id"]);
    let req = TestRequest::patch()
        .uri(&uri)
        .insert_header(bearer(&token_for(&admin, "root")))
        .set_json(json!({ "name": "Garden" }));
    let (status, body) = send_request(req, memory_store(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["name"], "Garden");

    let (_, body) = send_request(TestRequest::get().uri("/categories"), memory_store(db.clone())).await;
    assert_eq!(json(&body)[0]["name"], "Garden");

    let req = TestRequest::delete().uri(&uri).insert_header(bearer(&token_for(&admin, "root")));
    let (status, _) = send_request(req, memory_store(db.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) =
        send_request(TestRequest::get().uri(&format!("/categories/{}", category["id"])), memory_store(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
