use sqlx::{PgConnection, QueryBuilder};

use crate::{
    db_types::{NewUser, User, UserUpdate},
    traits::{Pagination, StorageError},
};

pub async fn fetch_user(id: i64, conn: &mut PgConnection) -> Result<Option<User>, StorageError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_user_by_username(username: &str, conn: &mut PgConnection) -> Result<Option<User>, StorageError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE username = $1").bind(username).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_user_by_email(email: &str, conn: &mut PgConnection) -> Result<Option<User>, StorageError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE email = $1").bind(email).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn list_users(page: &Pagination, conn: &mut PgConnection) -> Result<Vec<User>, StorageError> {
    let users = sqlx::query_as("SELECT * FROM users ORDER BY id LIMIT $1 OFFSET $2")
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(conn)
        .await?;
    Ok(users)
}

pub async fn insert_user(user: NewUser, conn: &mut PgConnection) -> Result<User, StorageError> {
    let user = sqlx::query_as(
        r#"
            INSERT INTO users (username, email, password_hash, full_name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(user.username)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.full_name)
    .bind(user.role.to_string())
    .fetch_one(conn)
    .await?;
    Ok(user)
}

pub async fn update_user(id: i64, update: UserUpdate, conn: &mut PgConnection) -> Result<Option<User>, StorageError> {
    if update.is_empty() {
        return fetch_user(id, conn).await;
    }
    let mut builder = QueryBuilder::new("UPDATE users SET updated_at = now()");
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
    builder.push(" RETURNING *");
    let user = builder.build_query_as::<User>().fetch_optional(conn).await?;
    Ok(user)
}

/// Products, carts, orders and reviews go with the user through `ON DELETE CASCADE`.
pub async fn delete_user(id: i64, conn: &mut PgConnection) -> Result<bool, StorageError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_users(conn: &mut PgConnection) -> Result<i64, StorageError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(conn).await?;
    Ok(count)
}
