use sqlx::MySqlConnection;

use crate::{db_types::CartItem, traits::StorageError};

pub async fn fetch_cart(user_id: i64, conn: &mut MySqlConnection) -> Result<Vec<CartItem>, StorageError> {
    let items = sqlx::query_as("SELECT * FROM cart_items WHERE user_id = ? ORDER BY created_at, id")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub async fn upsert_cart_item(
    user_id: i64,
    product_id: i64,
    quantity: i64,
    conn: &mut MySqlConnection,
) -> Result<CartItem, StorageError> {
    sqlx::query(
        r#"
            INSERT INTO cart_items (user_id, product_id, quantity) VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE quantity = VALUES(quantity)
        "#,
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;
    let item = sqlx::query_as("SELECT * FROM cart_items WHERE user_id = ? AND product_id = ?")
        .bind(user_id)
        .bind(product_id)
        .fetch_one(conn)
        .await?;
    Ok(item)
}

pub async fn remove_cart_item(
    user_id: i64,
    product_id: i64,
    conn: &mut MySqlConnection,
) -> Result<bool, StorageError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = ? AND product_id = ?")
        .bind(user_id)
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn clear_cart(user_id: i64, conn: &mut MySqlConnection) -> Result<u64, StorageError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = ?").bind(user_id).execute(conn).await?;
    Ok(result.rows_affected())
}
