use cucumber::given;
use sf_common::Cents;
use storefront_engine::db_types::Role;

use crate::cucumber::{storefront_world::Storefront, StorefrontWorld};

#[given("a fresh store")]
async fn fresh_store(world: &mut StorefrontWorld) {
    world.system = Some(Storefront::new());
}

#[given(expr = "a customer '{word}'")]
async fn a_customer(world: &mut StorefrontWorld, name: String) {
    world.store().user(&name, Role::Customer).await;
}

#[given(expr = "a seller '{word}' selling '{word}' at {word} with {int} in stock")]
async fn a_seller_with_product(
    world: &mut StorefrontWorld,
    seller: String,
    product: String,
    price: String,
    stock: i64,
) {
    let price = price.parse::<Cents>().expect("Not a valid price");
    let store = world.store();
    let seller = store.user(&seller, Role::Seller).await;
    store.add_product(&seller, &product, price.value(), stock).await;
}
