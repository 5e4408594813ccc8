//! Startup data: the bootstrap admin account and an optional demo catalog.
use log::*;
use sf_common::Cents;

use crate::{
    db_types::{NewCategory, NewProduct, User},
    helpers::slugify,
    store_api::{
        auth_api::AuthApi,
        auth_objects::BootstrapAdmin,
        errors::{AuthApiError, StoreApiError},
    },
    traits::{CatalogManagement, Pagination, ProductQueryFilter, UserManagement},
};

/// Creates the bootstrap admin account unless a user with that name already exists.
pub async fn seed_admin<B: UserManagement>(db: B, admin: &BootstrapAdmin) -> Result<User, AuthApiError> {
    AuthApi::new(db).ensure_admin(admin).await
}

// (category, description, [(name, description, price in cents, stock)])
type DemoCategory = (&'static str, &'static str, &'static [(&'static str, &'static str, i64, i64)]);

const DEMO_CATALOG: &[DemoCategory] = &[
    ("Books", "Paperbacks, hardcovers and everything in between", &[
        ("The Rust Programming Language", "The official book on Rust", 3999, 25),
        ("Designing Data-Intensive Applications", "Reliable, scalable and maintainable systems", 4599, 12),
    ]),
    ("Electronics", "Gadgets and accessories", &[
        ("Mechanical Keyboard", "Tenkeyless, brown switches", 8900, 8),
        ("USB-C Hub", "Seven ports, 100W pass-through charging", 3450, 30),
        ("Noise Cancelling Headphones", "Over-ear, 30 hour battery", 19900, 4),
    ]),
    ("Home & Garden", "For the house and the yard", &[
        ("Ceramic Mug", "350ml, dishwasher safe", 1200, 60),
        ("Herb Planter", "Three pots with a drip tray", 2450, 15),
    ]),
];

/// Fills an empty catalog with a few demo categories and products owned by `owner_id`. Nothing is inserted if any
/// category or product exists already. Returns the number of products created.
pub async fn seed_demo_catalog<B: CatalogManagement>(db: &B, owner_id: i64) -> Result<usize, StoreApiError> {
    let any_product = ProductQueryFilter::default().including_inactive();
    let has_products = !db.search_products(&any_product, &Pagination::new(None, Some(1))).await?.is_empty();
    if has_products || !db.list_categories().await?.is_empty() {
        info!("🏷️ The catalog is not empty. Skipping the demo catalog.");
        return Ok(0);
    }
    let mut created = 0;
    for (name, description, products) in DEMO_CATALOG {
        let category = NewCategory {
            name: (*name).to_string(),
            slug: slugify(name),
            description: Some((*description).to_string()),
        };
        let category = db.create_category(category).await?;
        for &(product_name, product_description, price, stock) in products.iter() {
            let product = NewProduct {
                seller_id: owner_id,
                category_id: Some(category.id),
                name: product_name.to_string(),
                description: product_description.to_string(),
                price: Cents::from(price),
                stock,
                image_url: None,
            };
            db.create_product(product).await?;
            created += 1;
        }
    }
    info!("🏷️ Demo catalog created with {created} products in {} categories", DEMO_CATALOG.len());
    Ok(created)
}
