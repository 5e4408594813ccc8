//! `MySqlDatabase` is the MySQL implementation of the storefront storage interface.
//!
//! Every method acquires a pooled connection and calls through to the query functions in [`super::db`]. Multi-step
//! operations (placing and cancelling orders) run inside a single transaction.
use std::{fmt::Debug, time::Duration};

use log::*;
use sqlx::{migrate, MySqlPool};

use super::db::{carts, catalog, new_pool, orders, reviews, users, DEFAULT_CONNECT_TIMEOUT_SECS};
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
        ShipmentStatus,
        ShipmentUpdate,
        User,
        UserUpdate,
    },
    helpers::redact_url,
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

#[derive(Clone)]
pub struct MySqlDatabase {
    url: String,
    pool: MySqlPool,
}

impl Debug for MySqlDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "MySqlDatabase ({})", self.url)
    }
}

impl MySqlDatabase {
    /// Creates a new connection pool for the database at `url`. One connection is made immediately, so an unreachable
    /// server is reported here rather than on first use.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        Self::new_with_timeout(url, max_connections, Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)).await
    }

    pub async fn new_with_timeout(url: &str, max_connections: u32, timeout: Duration) -> Result<Self, StorageError> {
        let pool = new_pool(url, max_connections, timeout).await?;
        Ok(Self { url: redact_url(url), pool })
    }

    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        migrate!("./src/mysql/migrations").run(&self.pool).await?;
        info!("🗃️ MySQL migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

impl UserManagement for MySqlDatabase {
    async fn fetch_user(&self, id: i64) -> Result<Option<User>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user(id, &mut conn).await
    }

    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_username(username, &mut conn).await
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user_by_email(email, &mut conn).await
    }

    async fn list_users(&self, page: &Pagination) -> Result<Vec<User>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        users::list_users(page, &mut conn).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StorageError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::insert_user(user, &mut conn).await?;
        debug!("🗃️ User #{} ({}) created", user.id, user.username);
        Ok(user)
    }

    async fn update_user(&self, id: i64, update: UserUpdate) -> Result<Option<User>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        users::update_user(id, update, &mut conn).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool, StorageError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = users::delete_user(id, &mut conn).await?;
        if deleted {
            debug!("🗃️ User #{id} and all their records have been deleted");
        }
        Ok(deleted)
    }
}

impl CatalogManagement for MySqlDatabase {
    async fn fetch_category(&self, id: i64) -> Result<Option<Category>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_category(id, &mut conn).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        catalog::list_categories(&mut conn).await
    }

    async fn create_category(&self, category: NewCategory) -> Result<Category, StorageError> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_category(category, &mut conn).await
    }

    async fn update_category(&self, id: i64, update: CategoryUpdate) -> Result<Option<Category>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        catalog::update_category(id, update, &mut conn).await
    }

    async fn delete_category(&self, id: i64) -> Result<bool, StorageError> {
        let mut conn = self.pool.acquire().await?;
        catalog::delete_category(id, &mut conn).await
    }

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_product(id, &mut conn).await
    }

    async fn search_products(
        &self,
        filter: &ProductQueryFilter,
        page: &Pagination,
    ) -> Result<Vec<Product>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        catalog::search_products(filter, page, &mut conn).await
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, StorageError> {
        let mut conn = self.pool.acquire().await?;
        catalog::insert_product(product, &mut conn).await
    }

    async fn update_product(&self, id: i64, update: ProductUpdate) -> Result<Option<Product>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        catalog::update_product(id, update, &mut conn).await
    }

    async fn delete_product(&self, id: i64) -> Result<bool, StorageError> {
        let mut conn = self.pool.acquire().await?;
        catalog::delete_product(id, &mut conn).await
    }
}

impl CartManagement for MySqlDatabase {
    async fn fetch_cart(&self, user_id: i64) -> Result<Vec<CartItem>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        carts::fetch_cart(user_id, &mut conn).await
    }

    async fn upsert_cart_item(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartItem, StorageError> {
        let mut conn = self.pool.acquire().await?;
        carts::upsert_cart_item(user_id, product_id, quantity, &mut conn).await
    }

    async fn remove_cart_item(&self, user_id: i64, product_id: i64) -> Result<bool, StorageError> {
        let mut conn = self.pool.acquire().await?;
        carts::remove_cart_item(user_id, product_id, &mut conn).await
    }

    async fn clear_cart(&self, user_id: i64) -> Result<u64, StorageError> {
        let mut conn = self.pool.acquire().await?;
        carts::clear_cart(user_id, &mut conn).await
    }
}

impl OrderManagement for MySqlDatabase {
    /// Runs the whole order flow in one transaction. An error at any step rolls back everything before it, since the
    /// transaction is dropped without being committed.
    async fn place_order(&self, plan: OrderPlan) -> Result<PlacedOrder, StorageError> {
        if plan.lines.is_empty() {
            return Err(StorageError::InvalidData("An order must have at least one item".into()));
        }
        let mut tx = self.pool.begin().await?;
        let order =
            orders::insert_order(plan.user_id, plan.status, plan.total_amount, &plan.shipping_address, &mut tx).await?;
        let mut items = Vec::with_capacity(plan.lines.len());
        for line in plan.lines {
            let (product_id, quantity) = (line.product_id, line.quantity);
            items.push(orders::insert_order_item(order.id, line, &mut tx).await?);
            orders::decrement_stock(product_id, quantity, &mut tx).await?;
        }
        let payment = orders::insert_payment(order.id, plan.payment, &mut tx).await?;
        let shipment = orders::insert_shipment(order.id, plan.shipment, &mut tx).await?;
        let cleared = carts::clear_cart(plan.user_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{} placed with {} items. {cleared} cart lines cleared", order.id, items.len());
        Ok(PlacedOrder { order, items, payment, shipment })
    }

    async fn fetch_order(&self, id: i64) -> Result<Option<Order>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(id, &mut conn).await
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_items(order_id, &mut conn).await
    }

    async fn search_orders(&self, filter: &OrderQueryFilter, page: &Pagination) -> Result<Vec<Order>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::search_orders(filter, page, &mut conn).await
    }

    async fn update_order_status(
        &self,
        id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Option<Order>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order_status(id, from, to, &mut conn).await
    }

    async fn cancel_order(&self, id: i64) -> Result<Order, StorageError> {
        let mut tx = self.pool.begin().await?;
        let order = match orders::mark_cancelled(id, &mut tx).await? {
            Some(order) => order,
            None => {
                return match orders::fetch_order(id, &mut tx).await? {
                    Some(current) => Err(StorageError::not_cancellable(id, current.status)),
                    None => Err(StorageError::NotFound(format!("Order {id}"))),
                };
            },
        };
        for item in orders::fetch_order_items(id, &mut tx).await? {
            if let Some(product_id) = item.product_id {
                orders::increment_stock(product_id, item.quantity, &mut tx).await?;
            }
        }
        orders::annul_payment(id, &mut tx).await?;
        orders::update_shipment(id, ShipmentUpdate::with_status(ShipmentStatus::Cancelled), &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{id} cancelled and restocked");
        Ok(order)
    }

    async fn fetch_payment(&self, order_id: i64) -> Result<Option<Payment>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_payment(order_id, &mut conn).await
    }

    async fn update_payment_status(
        &self,
        order_id: i64,
        status: PaymentStatus,
    ) -> Result<Option<Payment>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_payment_status(order_id, status, &mut conn).await
    }

    async fn fetch_shipment(&self, order_id: i64) -> Result<Option<Shipment>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_shipment(order_id, &mut conn).await
    }

    async fn update_shipment(&self, order_id: i64, update: ShipmentUpdate) -> Result<Option<Shipment>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_shipment(order_id, update, &mut conn).await
    }

    async fn order_status_counts(&self) -> Result<Vec<StatusCount>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::order_status_counts(&mut conn).await
    }

    async fn sales_summary(&self, seller_id: Option<i64>) -> Result<SalesSummary, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::sales_summary(seller_id, &mut conn).await
    }
}

impl ReviewManagement for MySqlDatabase {
    async fn fetch_review(&self, id: i64) -> Result<Option<Review>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        reviews::fetch_review(id, &mut conn).await
    }

    async fn fetch_reviews_for_product(&self, product_id: i64) -> Result<Vec<Review>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        reviews::fetch_reviews_for_product(product_id, &mut conn).await
    }

    async fn create_review(&self, review: NewReview) -> Result<Review, StorageError> {
        let mut conn = self.pool.acquire().await?;
        reviews::insert_review(review, &mut conn).await
    }

    async fn delete_review(&self, id: i64) -> Result<bool, StorageError> {
        let mut conn = self.pool.acquire().await?;
        reviews::delete_review(id, &mut conn).await
    }

    async fn rating_summary(&self, product_id: i64) -> Result<RatingSummary, StorageError> {
        let mut conn = self.pool.acquire().await?;
        reviews::rating_summary(product_id, &mut conn).await
    }

    async fn has_purchased(&self, user_id: i64, product_id: i64) -> Result<bool, StorageError> {
        let mut conn = self.pool.acquire().await?;
        reviews::has_purchased(user_id, product_id, &mut conn).await
    }
}

impl StorefrontDatabase for MySqlDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    fn backend(&self) -> BackendKind {
        BackendKind::MySql
    }

    async fn store_counts(&self) -> Result<StoreCounts, StorageError> {
        let mut conn = self.pool.acquire().await?;
        let users = users::count_users(&mut conn).await?;
        let products = catalog::count_products(&mut conn).await?;
        let orders = orders::count_orders(&mut conn).await?;
        Ok(StoreCounts { users, products, orders })
    }

    async fn close(&mut self) -> Result<(), StorageError> {
        self.pool.close().await;
        info!("🗃️ MySQL connection pool closed");
        Ok(())
    }
}
