use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Actor, NewReview, Product, Review},
    store_api::{catalog_objects::NewReviewRequest, errors::StoreApiError},
    traits::{CatalogManagement, RatingSummary, ReviewManagement},
};

pub const MAX_COMMENT_LENGTH: usize = 2000;

pub struct ReviewApi<B> {
    db: B,
}

impl<B: Debug> Debug for ReviewApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReviewApi ({:?})", self.db)
    }
}

impl<B> ReviewApi<B>
where B: CatalogManagement + ReviewManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn reviews(&self, product_id: i64) -> Result<Vec<Review>, StoreApiError> {
        self.product(product_id).await?;
        Ok(self.db.fetch_reviews_for_product(product_id).await?)
    }

    pub async fn rating(&self, product_id: i64) -> Result<RatingSummary, StoreApiError> {
        Ok(self.db.rating_summary(product_id).await?)
    }

    /// Adds the actor's review of a product. Each user may review a product once, and sellers may not review their
    /// own products. Reviews by customers who bought the product are flagged as verified purchases.
    pub async fn add_review(
        &self,
        actor: &Actor,
        product_id: i64,
        req: NewReviewRequest,
    ) -> Result<Review, StoreApiError> {
        if !(1..=5).contains(&req.rating) {
            return Err(StoreApiError::ValidationError("The rating must be between 1 and 5".into()));
        }
        let comment = req.comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        if comment.as_ref().map(|c| c.chars().count() > MAX_COMMENT_LENGTH).unwrap_or(false) {
            return Err(StoreApiError::ValidationError(format!(
                "Comments are limited to {MAX_COMMENT_LENGTH} characters"
            )));
        }
        let product = self.product(product_id).await?;
        if product.seller_id == actor.user_id {
            return Err(StoreApiError::Forbidden("You cannot review your own product".into()));
        }
        let verified_purchase = self.db.has_purchased(actor.user_id, product_id).await?;
        let review = NewReview { product_id, user_id: actor.user_id, rating: req.rating, comment, verified_purchase };
        let review = self.db.create_review(review).await?;
        info!("⭐️ User #{} gave product #{product_id} {} stars", actor.user_id, review.rating);
        Ok(review)
    }

    /// Reviews can be deleted by their author or an admin.
    pub async fn delete_review(&self, actor: &Actor, review_id: i64) -> Result<(), StoreApiError> {
        let review = self
            .db
            .fetch_review(review_id)
            .await?
            .ok_or_else(|| StoreApiError::NotFound(format!("Review {review_id}")))?;
        if review.user_id != actor.user_id && !actor.is_admin() {
            return Err(StoreApiError::Forbidden("You can only delete your own reviews".into()));
        }
        self.db.delete_review(review_id).await?;
        info!("⭐️ Review #{review_id} deleted by user #{}", actor.user_id);
        Ok(())
    }

    async fn product(&self, product_id: i64) -> Result<Product, StoreApiError> {
        self.db.fetch_product(product_id).await?.ok_or_else(|| StoreApiError::NotFound(format!("Product {product_id}")))
    }
}
