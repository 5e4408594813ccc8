use serde::{Deserialize, Serialize};
use sf_common::Cents;

use crate::{db_types::Product, traits::RatingSummary};

/// A seller's request to list a new product. The seller is taken from the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProductRequest {
    #[serde(default)]
    pub category_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Cents,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// If no slug is given, one is generated from the name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub rating: RatingSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReviewRequest {
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}
