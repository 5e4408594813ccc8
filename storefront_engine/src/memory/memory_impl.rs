//! `MemoryDatabase` keeps every table in process memory behind a single `tokio::sync::RwLock`.
//!
//! Nothing is persisted; the data lives as long as the process. The relational rules of the SQL schema (unique keys,
//! cascading deletes, `SET NULL` references) are reproduced in [`Tables`], so the engine behaves the same whichever
//! backend is in use.
use std::{fmt::Debug, sync::Arc};

use log::*;
use tokio::sync::RwLock;

use super::tables::Tables;
use crate::{
    db_types::{
        CartItem,
        Category,
        CategoryUpdate,
        NewCategory,
        NewProduct,
        NewReview,
        NewUser,
        Order,
        OrderItem,
        OrderStatusType,
        Payment,
        PaymentStatus,
        Product,
        ProductUpdate,
        Review,
        Shipment,
        ShipmentUpdate,
        User,
        UserUpdate,
    },
    traits::{
        BackendKind,
        CartManagement,
        CatalogManagement,
        OrderManagement,
        OrderPlan,
        OrderQueryFilter,
        Pagination,
        PlacedOrder,
        ProductQueryFilter,
        RatingSummary,
        ReviewManagement,
        SalesSummary,
        StatusCount,
        StorageError,
        StoreCounts,
        StorefrontDatabase,
        UserManagement,
    },
};

pub const MEMORY_DB_URL: &str = "memory://";

#[derive(Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl Debug for MemoryDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemoryDatabase")
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        info!("🗃️ Using the in-memory store. Data will be lost when the server stops.");
        Self::default()
    }
}

impl UserManagement for MemoryDatabase {
    async fn fetch_user(&self, id: i64) -> Result<Option<User>, StorageError> {
        Ok(self.tables.read().await.fetch_user(id))
    }

    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        Ok(self.tables.read().await.fetch_user_by_username(username))
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        Ok(self.tables.read().await.fetch_user_by_email(email))
    }

    async fn list_users(&self, page: &Pagination) -> Result<Vec<User>, StorageError> {
        Ok(self.tables.read().await.list_users(page))
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        let user = self.tables.write().await.create_user(user)?;
        debug!("🗃️ User #{} ({}) created", user.id, user.username);
        Ok(user)
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>, StorageError> {
        self.tables.write().await.update_user(id, update)
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StorageError> {
        let deleted = self.tables.write().await.delete_user(id);
        if deleted {
            debug!("🗃️ User #{id} and all their records have been deleted");
        }
        Ok(deleted)
    }
}

impl CatalogManagement for MemoryDatabase {
    async fn fetch_category(&self, id: i64) -> Result<Option<Category>, StorageError> {
        Ok(self.tables.read().await.fetch_category(id))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        Ok(self.tables.read().await.list_categories())
    }

    async fn create_category(&self, category: NewCategory) -> Result<Category, StorageError> {
        self.tables.write().await.create_category(category)
    }

    async fn update_category(&self, id: i64, update: CategoryUpdate) -> Result<Option<Category>, StorageError> {
        self.tables.write().await.update_category(id, update)
    }

    async fn delete_category(&self, id: i64) -> Result<bool, StorageError> {
        Ok(self.tables.write().await.delete_category(id))
    }

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, StorageError> {
        Ok(self.tables.read().await.fetch_product(id))
    }

    async fn search_products(
        &self,
        filter: &ProductQueryFilter,
        page: &Pagination,
    ) -> Result<Vec<Product>, StorageError> {
        Ok(self.tables.read().await.search_products(filter, page))
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, StorageError> {
        self.tables.write().await.create_product(product)
    }

    async fn update_product(&self, id: i64, update: ProductUpdate) -> Result<Option<Product>, StorageError> {
        self.tables.write().await.update_product(id, update)
    }

    async fn delete_product(&self, id: i64) -> Result<bool, StorageError> {
        Ok(self.tables.write().await.delete_product(id))
    }
}

impl CartManagement for MemoryDatabase {
    async fn fetch_cart(&self, user_id: i64) -> Result<Vec<CartItem>, StorageError> {
        Ok(self.tables.read().await.fetch_cart(user_id))
    }

    async fn upsert_cart_item(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartItem, StorageError> {
        self.tables.write().await.upsert_cart_item(user_id, product_id, quantity)
    }

    async fn remove_cart_item(&self, user_id: i64, product_id: i64) -> Result<bool, StorageError> {
        Ok(self.tables.write().await.remove_cart_item(user_id, product_id))
    }

    async fn clear_cart(&self, user_id: i64) -> Result<u64, StorageError> {
        Ok(self.tables.write().await.clear_cart(user_id))
    }
}

impl OrderManagement for MemoryDatabase {
    async fn place_order(&self, plan: OrderPlan) -> Result<PlacedOrder, StorageError> {
        let placed = self.tables.write().await.place_order(plan)?;
        debug!("🗃️ Order #{} placed with {} items", placed.order.id, placed.items.len());
        Ok(placed)
    }

    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, StorageError> {
        Ok(self.tables.read().await.fetch_order(id))
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, StorageError> {
        Ok(self.tables.read().await.fetch_order_items(order_id))
    }

    async fn search_orders(&self, filter: &OrderQueryFilter, page: &Pagination) -> Result<Vec<Order>, StorageError> {
        Ok(self.tables.read().await.search_orders(filter, page))
    }

    async fn update_order_status(
        &self,
        id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Option<Order>, StorageError> {
        self.tables.write().await.update_order_status(id, from, to)
    }

    async fn cancel_order(&self, id: i64) -> Result<Order, StorageError> {
        let order = self.tables.write().await.cancel_order(id)?;
        debug!("🗃️ Order #{id} cancelled and restocked");
        Ok(order)
    }

    async fn fetch_payment(&self, order_id: i64) -> Result<Option<Payment>, StorageError> {
        Ok(self.tables.read().await.fetch_payment(order_id))
    }

    async fn update_payment_status(
        &self,
        order_id: i64,
        status: PaymentStatus,
    ) -> Result<Option<Payment>, StorageError> {
        Ok(self.tables.write().await.update_payment_status(order_id, status))
    }

    async fn fetch_shipment(&self, order_id: i64) -> Result<Option<Shipment>, StorageError> {
        Ok(self.tables.read().await.fetch_shipment(order_id))
    }

    async fn update_shipment(&self, order_id: i64, update: ShipmentUpdate) -> Result<Option<Shipment>, StorageError> {
        Ok(self.tables.write().await.update_shipment(order_id, update))
    }

    async fn order_status_counts(&self) -> Result<Vec<StatusCount>, StorageError> {
        Ok(self.tables.read().await.order_status_counts())
    }

    async fn sales_summary(&self, seller_id: Option<i64>) -> Result<SalesSummary, StorageError> {
        Ok(self.tables.read().await.sales_summary(seller_id))
    }
}

impl ReviewManagement for MemoryDatabase {
    async fn fetch_review(&self, id: i64) -> Result<Option<Review>, StorageError> {
        Ok(self.tables.read().await.fetch_review(id))
    }

    async fn fetch_reviews_for_product(&self, product_id: i64) -> Result<Vec<Review>, StorageError> {
        Ok(self.tables.read().await.fetch_reviews_for_product(product_id))
    }

    async fn create_review(&self, review: NewReview) -> Result<Review, StorageError> {
        self.tables.write().await.create_review(review)
    }

    async fn delete_review(&self, id: i64) -> Result<bool, StorageError> {
        Ok(self.tables.write().await.delete_review(id))
    }

    async fn rating_summary(&self, product_id: i64) -> Result<RatingSummary, StorageError> {
        Ok(self.tables.read().await.rating_summary(product_id))
    }

    async fn has_purchased(&self, user_id: i64, product_id: i64) -> Result<bool, StorageError> {
        Ok(self.tables.read().await.has_purchased(user_id, product_id))
    }
}

impl StorefrontDatabase for MemoryDatabase {
    fn url(&self) -> &str {
        MEMORY_DB_URL
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn store_counts(&self) -> Result<StoreCounts, StorageError> {
        Ok(self.tables.read().await.store_counts())
    }
}
