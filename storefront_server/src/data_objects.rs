use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_engine::{
    db_types::{Cents, OrderStatusType, Role, User},
    traits::{OrderQueryFilter, Pagination, ProductQueryFilter, ProductSort},
};

use crate::auth::AccessToken;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleUpdateRequest {
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    #[serde(flatten)]
    pub token: AccessToken,
}

/// `?offset=&limit=` query parameters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageParams {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.offset, self.limit)
    }
}

/// Query parameters for the product listing. `q` is the free-text search term.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQueryParams {
    pub category_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub q: Option<String>,
    pub min_price: Option<Cents>,
    pub max_price: Option<Cents>,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub include_inactive: bool,
    pub sort: Option<ProductSort>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl ProductQueryParams {
    pub fn into_filter(self) -> (ProductQueryFilter, Pagination) {
        let page = Pagination::new(self.offset, self.limit);
        let filter = ProductQueryFilter {
            category_id: self.category_id,
            seller_id: self.seller_id,
            search: self.q,
            min_price: self.min_price,
            max_price: self.max_price,
            in_stock: self.in_stock,
            include_inactive: self.include_inactive,
            sort: self.sort.unwrap_or_default(),
        };
        (filter, page)
    }
}

/// Query parameters for the admin order search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSearchParams {
    pub user_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub status: Option<OrderStatusType>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl OrderSearchParams {
    pub fn into_filter(self) -> (OrderQueryFilter, Pagination) {
        let page = Pagination::new(self.offset, self.limit);
        let filter = OrderQueryFilter {
            user_id: self.user_id,
            seller_id: self.seller_id,
            status: self.status,
            since: self.since,
            until: self.until,
        };
        (filter, page)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SellerOrderParams {
    pub status: Option<OrderStatusType>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}
