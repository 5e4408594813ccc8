use serde::{Deserialize, Serialize};

use crate::{
    db_types::Product,
    traits::{BackendKind, SalesSummary, StatusCount, StoreCounts},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminStats {
    pub counts: StoreCounts,
    /// Excludes cancelled orders.
    pub sales: SalesSummary,
    pub orders_by_status: Vec<StatusCount>,
    pub backend: BackendKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerStats {
    pub total_products: i64,
    pub active_products: i64,
    pub low_stock_threshold: i64,
    /// Active products with stock at or below the threshold, lowest first.
    pub low_stock: Vec<Product>,
    pub sales: SalesSummary,
}
