use crate::{
    db_types::{NewReview, Review},
    traits::{data_objects::RatingSummary, StorageError},
};

#[allow(async_fn_in_trait)]
pub trait ReviewManagement {
    async fn fetch_review(&self, id: i64) -> Result<Option<Review>, StorageError>;

    /// Reviews for the product, newest first.
    async fn fetch_reviews_for_product(&self, product_id: i64) -> Result<Vec<Review>, StorageError>;

    /// Stores the review. A user can review a product only once.
    async fn create_review(&self, review: NewReview) -> Result<Review, StorageError>;

    async fn delete_review(&self, id: i64) -> Result<bool, StorageError>;

    async fn rating_summary(&self, product_id: i64) -> Result<RatingSummary, StorageError>;

    /// True if the user has an order, other than a cancelled one, that contains the product.
    async fn has_purchased(&self, user_id: i64, product_id: i64) -> Result<bool, StorageError>;
}
