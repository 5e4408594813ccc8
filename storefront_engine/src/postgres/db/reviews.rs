use sqlx::PgConnection;

use crate::{
    db_types::{NewReview, Review},
    traits::{RatingSummary, StorageError},
};

pub async fn fetch_review(id: i64, conn: &mut PgConnection) -> Result<Option<Review>, StorageError> {
    let review = sqlx::query_as("SELECT * FROM reviews WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(review)
}

pub async fn fetch_reviews_for_product(product_id: i64, conn: &mut PgConnection) -> Result<Vec<Review>, StorageError> {
    let reviews = sqlx::query_as("SELECT * FROM reviews WHERE product_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(product_id)
        .fetch_all(conn)
        .await?;
    Ok(reviews)
}

pub async fn insert_review(review: NewReview, conn: &mut PgConnection) -> Result<Review, StorageError> {
    let review = sqlx::query_as(
        r#"
            INSERT INTO reviews (product_id, user_id, rating, comment, verified_purchase)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(review.product_id)
    .bind(review.user_id)
    .bind(review.rating)
    .bind(review.comment)
    .bind(review.verified_purchase)
    .fetch_one(conn)
    .await?;
    Ok(review)
}

pub async fn delete_review(id: i64, conn: &mut PgConnection) -> Result<bool, StorageError> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn rating_summary(product_id: i64, conn: &mut PgConnection) -> Result<RatingSummary, StorageError> {
    let (average, count): (Option<f64>, i64) =
        sqlx::query_as("SELECT AVG(rating)::DOUBLE PRECISION, COUNT(*) FROM reviews WHERE product_id = $1")
            .bind(product_id)
            .fetch_one(conn)
            .await?;
    Ok(RatingSummary { average, count })
}

pub async fn has_purchased(user_id: i64, product_id: i64, conn: &mut PgConnection) -> Result<bool, StorageError> {
    let purchased: bool = sqlx::query_scalar(
        r#"
            SELECT EXISTS (
                SELECT 1 FROM order_items JOIN orders ON orders.id = order_items.order_id
                WHERE orders.user_id = $1 AND order_items.product_id = $2 AND orders.status <> 'cancelled'
            )
        "#,
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(conn)
    .await?;
    Ok(purchased)
}
