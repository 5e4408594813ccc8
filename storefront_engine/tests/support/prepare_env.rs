#![allow(dead_code)]
use log::*;
use sf_common::Cents;
use storefront_engine::{
    db_types::{Actor, NewProduct, NewUser, Product, Role},
    CatalogManagement,
    UserManagement,
};

pub fn prepare_test_env() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
}

/// A name that will not clash with data left behind by earlier runs against a persistent database.
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix}_{:08x}", rand::random::<u32>())
}

pub async fn create_user<B: UserManagement>(db: &B, username: &str, role: Role) -> Actor {
    let user = NewUser {
        username: username.to_string(),
        email: format!("{}@example.com", username.to_lowercase()),
        password_hash: "$argon2id$v=19$placeholder".to_string(),
        full_name: None,
        role,
    };
    let user = db.create_user(user).await.expect("Error creating test user");
    Actor::new(user.id, user.role)
}

pub async fn create_product<B: CatalogManagement>(
    db: &B,
    seller: &Actor,
    name: &str,
    price: i64,
    stock: i64,
) -> Product {
    let product = NewProduct {
        seller_id: seller.user_id,
        category_id: None,
        name: name.to_string(),
        description: format!("{name} for testing"),
        price: Cents::from(price),
        stock,
        image_url: None,
    };
    db.create_product(product).await.expect("Error creating test product")
}
