use sqlx::{MySqlConnection, QueryBuilder};

use super::inserted_id;
use crate::{
    db_types::{NewUser, User, UserUpdate},
    traits::{Pagination, StorageError},
};

pub async fn fetch_user(id: i64, conn: &mut MySqlConnection) -> Result<Option<User>, StorageError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = ?").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_user_by_username(username: &str, conn: &mut MySqlConnection) -> Result<Option<User>, StorageError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE username = ?").bind(username).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_user_by_email(email: &str, conn: &mut MySqlConnection) -> Result<Option<User>, StorageError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE email = ?").bind(email).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn list_users(page: &Pagination, conn: &mut MySqlConnection) -> Result<Vec<User>, StorageError> {
    let users = sqlx::query_as("SELECT * FROM users ORDER BY id LIMIT ? OFFSET ?")
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(conn)
        .await?;
    Ok(users)
}

pub async fn insert_user(user: NewUser, conn: &mut MySqlConnection) -> Result<User, StorageError> {
    let result = sqlx::query(
        "INSERT INTO users (username, email, password_hash, full_name, role) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user.username)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.full_name)
    .bind(user.role.to_string())
    .execute(&mut *conn)
    .await?;
    let id = inserted_id(result.last_insert_id());
    fetch_user(id, conn).await?.ok_or_else(|| StorageError::NotFound(format!("User {id}")))
}

pub async fn update_user(
    id: i64,
    update: UserUpdate,
    conn: &mut MySqlConnection,
) -> Result<Option<User>, StorageError> {
    if update.is_empty() {
        return fetch_user(id, conn).await;
    }
    let mut builder = QueryBuilder::new("UPDATE users SET updated_at = CURRENT_TIMESTAMP(6)");
    if let Some(email) = update.email {
        builder.push(", email = ");
        builder.push_bind(email);
    }
    if let Some(full_name) = update.full_name {
        builder.push(", full_name = ");
        builder.push_bind(full_name);
    }
    if let Some(role) = update.role {
        builder.push(", role = ");
        builder.push_bind(role.to_string());
    }
    if let Some(hash) = update.password_hash {
        builder.push(", password_hash = ");
        builder.push_bind(hash);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.build().execute(&mut *conn).await?;
    fetch_user(id, conn).await
}

/// Products, carts, orders and reviews go with the user through `ON DELETE CASCADE`.
pub async fn delete_user(id: i64, conn: &mut MySqlConnection) -> Result<bool, StorageError> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_users(conn: &mut MySqlConnection) -> Result<i64, StorageError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(conn).await?;
    Ok(count)
}
