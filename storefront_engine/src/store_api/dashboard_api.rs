use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Actor, Role},
    store_api::{
        dashboard_objects::{AdminStats, SellerStats},
        errors::StoreApiError,
    },
    traits::{Pagination, ProductQueryFilter, StorefrontDatabase},
};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

pub struct DashboardApi<B> {
    db: B,
    low_stock_threshold: i64,
}

impl<B: Debug> Debug for DashboardApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DashboardApi ({:?}, low stock at {})", self.db, self.low_stock_threshold)
    }
}

impl<B> DashboardApi<B>
where B: StorefrontDatabase
{
    pub fn new(db: B) -> Self {
        Self { db, low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD }
    }

    pub fn with_low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold.max(0);
        self
    }

    pub async fn admin_stats(&self, actor: &Actor) -> Result<AdminStats, StoreApiError> {
        if !actor.is_admin() {
            return Err(StoreApiError::Forbidden("Only admins can view store statistics".into()));
        }
        let counts = self.db.store_counts().await?;
        let sales = self.db.sales_summary(None).await?;
        let orders_by_status = self.db.order_status_counts().await?;
        trace!("📦️ Admin stats: {counts:?} {sales:?}");
        Ok(AdminStats { counts, sales, orders_by_status, backend: self.db.backend() })
    }

    /// Product and sales figures for the acting seller.
    pub async fn seller_stats(&self, actor: &Actor) -> Result<SellerStats, StoreApiError> {
        if actor.role == Role::Customer {
            return Err(StoreApiError::Forbidden("Only sellers have a dashboard".into()));
        }
        let filter = ProductQueryFilter::default().with_seller(actor.user_id).including_inactive();
        let products = self.db.search_products(&filter, &Pagination::all()).await?;
        let total_products = i64::try_from(products.len()).unwrap_or(i64::MAX);
        let mut active = products.into_iter().filter(|p| p.is_active).collect::<Vec<_>>();
        let active_products = i64::try_from(active.len()).unwrap_or(i64::MAX);
        active.retain(|p| p.stock <= self.low_stock_threshold);
        active.sort_by_key(|p| (p.stock, p.id));
        let sales = self.db.sales_summary(Some(actor.user_id)).await?;
        Ok(SellerStats {
            total_products,
            active_products,
            low_stock_threshold: self.low_stock_threshold,
            low_stock: active,
            sales,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        db_types::{OrderStatusType, PaymentMethod, ProductUpdate},
        events::EventProducers,
        memory::MemoryDatabase,
        store_api::{order_flow_api::OrderFlowApi, order_objects::CheckoutRequest},
        test_utils::prepare_env::{create_product, create_user},
        traits::{BackendKind, CartManagement, CatalogManagement},
    };

    #[tokio::test]
    async fn stats_exclude_cancelled_orders() {
        let db = MemoryDatabase::default();
        let seller = create_user(&db, "sally", Role::Seller).await;
        let other = create_user(&db, "sam", Role::Seller).await;
        let carol = create_user(&db, "carol", Role::Customer).await;
        let admin = create_user(&db, "admin", Role::Admin).await;
        let mug = create_product(&db, &seller, "Mug", 500, 10).await;
        let pen = create_product(&db, &seller, "Pen", 100, 3).await;
        let hat = create_product(&db, &other, "Hat", 2000, 10).await;
        let hidden = create_product(&db, &seller, "Old mug", 400, 0).await;
        db.update_product(hidden.id, ProductUpdate { is_active: Some(false), ..Default::default() }).await.unwrap();

        let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
        let checkout =
            || CheckoutRequest { shipping_address: "3 Oak Lane".into(), payment_method: PaymentMethod::Card };
        db.upsert_cart_item(carol.user_id, mug.id, 2).await.unwrap();
        db.upsert_cart_item(carol.user_id, hat.id, 1).await.unwrap();
        orders.checkout(carol.user_id, checkout()).await.unwrap();
        db.upsert_cart_item(carol.user_id, pen.id, 1).await.unwrap();
        let second = orders.checkout(carol.user_id, checkout()).await.unwrap();
        orders.cancel_order(&carol, second.order.id).await.unwrap();

        let api = DashboardApi::new(db).with_low_stock_threshold(3);
        assert!(matches!(api.admin_stats(&seller).await, Err(StoreApiError::Forbidden(_))));
        let stats = api.admin_stats(&admin).await.unwrap();
        assert_eq!(stats.backend, BackendKind::Memory);
        assert_eq!(stats.counts.users, 4);
        assert_eq!(stats.counts.products, 4);
        assert_eq!(stats.counts.orders, 2);
        assert_eq!(stats.sales.orders, 1);
        assert_eq!(stats.sales.revenue.value(), 3000);
        let cancelled = stats.orders_by_status.iter().find(|c| c.status == OrderStatusType::Cancelled).unwrap();
        assert_eq!(cancelled.count, 1);

        assert!(matches!(api.seller_stats(&carol).await, Err(StoreApiError::Forbidden(_))));
        let stats = api.seller_stats(&seller).await.unwrap();
        assert_eq!(stats.total_products, 3);
        assert_eq!(stats.active_products, 2);
        assert_eq!(stats.low_stock.len(), 1);
        assert_eq!(stats.low_stock[0].id, pen.id);
        assert_eq!(stats.sales.units_sold, 2);
        assert_eq!(stats.sales.revenue.value(), 1000);
    }
}
