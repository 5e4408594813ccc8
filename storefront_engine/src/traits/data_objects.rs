use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sf_common::{string_enum, Cents};

use crate::db_types::{NewPayment, NewShipment, Order, OrderItem, OrderStatusType, Payment, Shipment};

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

//--------------------------------------      Pagination       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { offset: 0, limit: DEFAULT_PAGE_SIZE }
    }
}

impl Pagination {
    /// Builds a page from optional query parameters, clamping the values into range.
    pub fn new(offset: Option<i64>, limit: Option<i64>) -> Self {
        let offset = offset.unwrap_or(0).max(0);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Self { offset, limit }
    }

    /// Effectively unbounded. Used internally where every row is needed.
    pub fn all() -> Self {
        Self { offset: 0, limit: i64::MAX }
    }

    /// Applies the page to an iterator that is already in the right order.
    pub fn apply<T, I: Iterator<Item = T>>(&self, iter: I) -> Vec<T> {
        let skip = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let take = usize::try_from(self.limit).unwrap_or(usize::MAX);
        iter.skip(skip).take(take).collect()
    }
}

//--------------------------------------   ProductQueryFilter  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

string_enum!(ProductSort { Newest => "newest", PriceAsc => "price_asc", PriceDesc => "price_desc", Name => "name" });

impl ProductSort {
    /// The SQL `ORDER BY` clause for this sort order. Ties are broken by id so that pages are stable.
    pub fn order_by(&self) -> &'static str {
        match self {
            ProductSort::Newest => " ORDER BY created_at DESC, id DESC",
            ProductSort::PriceAsc => " ORDER BY price ASC, id ASC",
            ProductSort::PriceDesc => " ORDER BY price DESC, id ASC",
            ProductSort::Name => " ORDER BY name ASC, id ASC",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQueryFilter {
    pub category_id: Option<i64>,
    pub seller_id: Option<i64>,
    /// Case-insensitive search over the product name and description.
    pub search: Option<String>,
    pub min_price: Option<Cents>,
    pub max_price: Option<Cents>,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub include_inactive: bool,
    #[serde(default)]
    pub sort: ProductSort,
}

impl ProductQueryFilter {
    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn with_seller(mut self, seller_id: i64) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    pub fn with_search<S: Into<String>>(mut self, search: S) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_sort(mut self, sort: ProductSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn including_inactive(mut self) -> Self {
        self.include_inactive = true;
        self
    }

    /// The search term, trimmed, if it is not blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// The search term as a `LIKE` pattern, with the wildcard characters in the term escaped.
    pub fn search_pattern(&self) -> Option<String> {
        self.search_term().map(|t| {
            let escaped = t.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
            format!("%{escaped}%")
        })
    }
}

//--------------------------------------    OrderQueryFilter   ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub user_id: Option<i64>,
    /// Only orders containing at least one line sold by this seller.
    pub seller_id: Option<i64>,
    pub status: Option<OrderStatusType>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() &&
            self.seller_id.is_none() &&
            self.status.is_none() &&
            self.since.is_none() &&
            self.until.is_none()
    }

    pub fn for_user(user_id: i64) -> Self {
        Self { user_id: Some(user_id), ..Default::default() }
    }

    pub fn for_seller(seller_id: i64) -> Self {
        Self { seller_id: Some(seller_id), ..Default::default() }
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = Some(status);
        self
    }

    /// Checks an order against the filter. `seller_ids` are the sellers of the order's lines.
    pub fn matches(&self, order: &Order, seller_ids: &[i64]) -> bool {
        self.user_id.map(|id| order.user_id == id).unwrap_or(true) &&
            self.seller_id.map(|id| seller_ids.contains(&id)).unwrap_or(true) &&
            self.status.map(|s| order.status == s).unwrap_or(true) &&
            self.since.map(|t| order.created_at >= t).unwrap_or(true) &&
            self.until.map(|t| order.created_at <= t).unwrap_or(true)
    }
}

//--------------------------------------       OrderPlan       ---------------------------------------------------------
/// One line of an order that is about to be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: i64,
    pub seller_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Cents,
}

impl OrderLine {
    pub fn line_total(&self) -> Cents {
        self.unit_price * self.quantity
    }
}

/// Everything the storage layer needs to run the order flow in one atomic step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlan {
    pub user_id: i64,
    pub shipping_address: String,
    pub status: OrderStatusType,
    pub total_amount: Cents,
    pub lines: Vec<OrderLine>,
    pub payment: NewPayment,
    pub shipment: NewShipment,
}

impl OrderPlan {
    pub fn lines_total(&self) -> Cents {
        self.lines.iter().map(OrderLine::line_total).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Payment,
    pub shipment: Shipment,
}

//--------------------------------------      Aggregates       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: OrderStatusType,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub orders: i64,
    pub units_sold: i64,
    pub revenue: Cents,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    pub users: i64,
    pub products: i64,
    pub orders: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    /// `None` when the product has no reviews.
    pub average: Option<f64>,
    pub count: i64,
}

impl Display for RatingSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.average {
            Some(avg) => write!(f, "{avg:.1} ({} reviews)", self.count),
            None => write!(f, "no reviews"),
        }
    }
}
