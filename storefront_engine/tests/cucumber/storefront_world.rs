use std::collections::HashMap;

use cucumber::World;
use storefront_engine::{
    db_types::{Actor, Product, Role},
    events::EventProducers,
    order_objects::OrderDetails,
    CartApi,
    MemoryDatabase,
    OrderFlowApi,
};

use crate::support::prepare_env::{create_product, create_user};

#[derive(Default, Debug, World)]
pub struct StorefrontWorld {
    pub system: Option<Storefront>,
}

#[derive(Debug)]
pub struct Storefront {
    pub db: MemoryDatabase,
    pub users: HashMap<String, Actor>,
    pub products: HashMap<String, Product>,
    pub last_order: Option<OrderDetails>,
    pub last_error: Option<String>,
}

impl StorefrontWorld {
    pub fn store(&mut self) -> &mut Storefront {
        self.system.as_mut().expect("The store has not been set up")
    }
}

impl Storefront {
    pub fn new() -> Self {
        Self {
            db: MemoryDatabase::default(),
            users: HashMap::new(),
            products: HashMap::new(),
            last_order: None,
            last_error: None,
        }
    }

    pub fn cart_api(&self) -> CartApi<MemoryDatabase> {
        CartApi::new(self.db.clone())
    }

    pub fn order_api(&self) -> OrderFlowApi<MemoryDatabase> {
        OrderFlowApi::new(self.db.clone(), EventProducers::default())
    }

    pub async fn user(&mut self, name: &str, role: Role) -> Actor {
        if let Some(actor) = self.users.get(name) {
            return *actor;
        }
        let actor = create_user(&self.db, name, role).await;
        self.users.insert(name.to_string(), actor);
        actor
    }

    pub fn actor(&self, name: &str) -> Actor {
        *self.users.get(name).unwrap_or_else(|| panic!("No user called {name}"))
    }

    pub async fn add_product(&mut self, seller: &Actor, name: &str, price: i64, stock: i64) -> Product {
        let product = create_product(&self.db, seller, name, price, stock).await;
        self.products.insert(name.to_string(), product.clone());
        product
    }

    pub fn product(&self, name: &str) -> &Product {
        self.products.get(name).unwrap_or_else(|| panic!("No product called {name}"))
    }

    pub fn order(&self) -> &OrderDetails {
        self.last_order.as_ref().expect("No order has been placed")
    }
}
