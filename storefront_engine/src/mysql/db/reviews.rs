use sqlx::MySqlConnection;

use super::inserted_id;
use crate::{
    db_types::{NewReview, Review},
    traits::{RatingSummary, StorageError},
};

pub async fn fetch_review(id: i64, conn: &mut MySqlConnection) -> Result<Option<Review>, StorageError> {
    let review = sqlx::query_as("SELECT * FROM reviews WHERE id = ?").bind(id).fetch_optional(conn).await?;
    Ok(review)
}

pub async fn fetch_reviews_for_product(
    product_id: i64,
    conn: &mut MySqlConnection,
) -> Result<Vec<Review>, StorageError> {
    let reviews = sqlx::query_as("SELECT * FROM reviews WHERE product_id = ? ORDER BY created_at DESC, id DESC")
        .bind(product_id)
        .fetch_all(conn)
        .await?;
    Ok(reviews)
}

pub async fn insert_review(review: NewReview, conn: &mut MySqlConnection) -> Result<Review, StorageError> {
    let result = sqlx::query(
        "INSERT INTO reviews (product_id, user_id, rating, comment, verified_purchase) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(review.product_id)
    .bind(review.user_id)
    .bind(review.rating)
    .bind(review.comment)
    .bind(review.verified_purchase)
    .execute(&mut *conn)
    .await?;
    let id = inserted_id(result.last_insert_id());
    fetch_review(id, conn).await?.ok_or_else(|| StorageError::NotFound(format!("Review {id}")))
}

pub async fn delete_review(id: i64, conn: &mut MySqlConnection) -> Result<bool, StorageError> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = ?").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn rating_summary(product_id: i64, conn: &mut MySqlConnection) -> Result<RatingSummary, StorageError> {
    let (average, count): (Option<f64>, i64) =
        sqlx::query_as("SELECT CAST(AVG(rating) AS DOUBLE), COUNT(*) FROM reviews WHERE product_id = ?")
            .bind(product_id)
            .fetch_one(conn)
            .await?;
    Ok(RatingSummary { average, count })
}

pub async fn has_purchased(user_id: i64, product_id: i64, conn: &mut MySqlConnection) -> Result<bool, StorageError> {
    let count: i64 = sqlx::query_scalar(
        r#"
            SELECT COUNT(*) FROM order_items JOIN orders ON orders.id = order_items.order_id
            WHERE orders.user_id = ? AND order_items.product_id = ? AND orders.status <> 'cancelled'
        "#,
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}
