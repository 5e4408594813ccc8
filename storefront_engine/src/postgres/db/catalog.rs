use log::trace;
use sqlx::{PgConnection, QueryBuilder};

use crate::{
    db_types::{Category, CategoryUpdate, NewCategory, NewProduct, Product, ProductUpdate},
    traits::{Pagination, ProductQueryFilter, StorageError},
};

pub async fn fetch_category(id: i64, conn: &mut PgConnection) -> Result<Option<Category>, StorageError> {
    let category = sqlx::query_as("SELECT * FROM categories WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(category)
}

pub async fn list_categories(conn: &mut PgConnection) -> Result<Vec<Category>, StorageError> {
    let categories = sqlx::query_as("SELECT * FROM categories ORDER BY name, id").fetch_all(conn).await?;
    Ok(categories)
}

pub async fn insert_category(category: NewCategory, conn: &mut PgConnection) -> Result<Category, StorageError> {
    let category =
        sqlx::query_as("INSERT INTO categories (name, slug, description) VALUES ($1, $2, $3) RETURNING *")
            .bind(category.name)
            .bind(category.slug)
            .bind(category.description)
            .fetch_one(conn)
            .await?;
    Ok(category)
}

pub async fn update_category(
    id: i64,
    update: CategoryUpdate,
    conn: &mut PgConnection,
) -> Result<Option<Category>, StorageError> {
    if update.is_empty() {
        return fetch_category(id, conn).await;
    }
    let mut builder = QueryBuilder::new("UPDATE categories SET ");
    let mut set_clause = builder.separated(", ");
    if let Some(name) = update.name {
        set_clause.push("name = ");
        set_clause.push_bind_unseparated(name);
    }
    if let Some(slug) = update.slug {
        set_clause.push("slug = ");
        set_clause.push_bind_unseparated(slug);
    }
    if let Some(description) = update.description {
        set_clause.push("description = ");
        set_clause.push_bind_unseparated(description);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    let category = builder.build_query_as::<Category>().fetch_optional(conn).await?;
    Ok(category)
}

pub async fn delete_category(id: i64, conn: &mut PgConnection) -> Result<bool, StorageError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_product(id: i64, conn: &mut PgConnection) -> Result<Option<Product>, StorageError> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn search_products(
    filter: &ProductQueryFilter,
    page: &Pagination,
    conn: &mut PgConnection,
) -> Result<Vec<Product>, StorageError> {
    let mut builder = QueryBuilder::new("SELECT * FROM products WHERE ");
    let mut where_clause = builder.separated(" AND ");
    where_clause.push("TRUE");
    if !filter.include_inactive {
        where_clause.push("is_active");
    }
    if let Some(category_id) = filter.category_id {
        where_clause.push("category_id = ");
        where_clause.push_bind_unseparated(category_id);
    }
    if let Some(seller_id) = filter.seller_id {
        where_clause.push("seller_id = ");
        where_clause.push_bind_unseparated(seller_id);
    }
    if let Some(min) = filter.min_price {
        where_clause.push("price >= ");
        where_clause.push_bind_unseparated(min);
    }
    if let Some(max) = filter.max_price {
        where_clause.push("price <= ");
        where_clause.push_bind_unseparated(max);
    }
    if filter.in_stock {
        where_clause.push("stock > 0");
    }
    if let Some(pattern) = filter.search_pattern() {
        where_clause.push("(name ILIKE ");
        where_clause.push_bind_unseparated(pattern.clone());
        where_clause.push_unseparated(" OR description ILIKE ");
        where_clause.push_bind_unseparated(pattern);
        where_clause.push_unseparated(")");
    }
    builder.push(filter.sort.order_by());
    builder.push(" LIMIT ");
    builder.push_bind(page.limit);
    builder.push(" OFFSET ");
    builder.push_bind(page.offset);
    trace!("🗃️ Executing query: {}", builder.sql());
    let products = builder.build_query_as::<Product>().fetch_all(conn).await?;
    Ok(products)
}

pub async fn insert_product(product: NewProduct, conn: &mut PgConnection) -> Result<Product, StorageError> {
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (seller_id, category_id, name, description, price, stock, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(product.seller_id)
    .bind(product.category_id)
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.image_url)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

pub async fn update_product(
    id: i64,
    update: ProductUpdate,
    conn: &mut PgConnection,
) -> Result<Option<Product>, StorageError> {
    if update.is_empty() {
        return fetch_product(id, conn).await;
    }
    let mut builder = QueryBuilder::new("UPDATE products SET updated_at = now()");
    if let Some(category_id) = update.category_id {
        builder.push(", category_id = ");
        builder.push_bind(category_id);
    }
    if let Some(name) = update.name {
        builder.push(", name = ");
        builder.push_bind(name);
    }
    if let Some(description) = update.description {
        builder.push(", description = ");
        builder.push_bind(description);
    }
    if let Some(price) = update.price {
        builder.push(", price = ");
        builder.push_bind(price);
    }
    if let Some(stock) = update.stock {
        builder.push(", stock = ");
        builder.push_bind(stock);
    }
    if let Some(image_url) = update.image_url {
        builder.push(", image_url = ");
        builder.push_bind(image_url);
    }
    if let Some(is_active) = update.is_active {
        builder.push(", is_active = ");
        builder.push_bind(is_active);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING *");
    let product = builder.build_query_as::<Product>().fetch_optional(conn).await?;
    Ok(product)
}

/// Cart lines and reviews are removed by cascade. Order items keep their snapshot with `product_id` set to NULL.
pub async fn delete_product(id: i64, conn: &mut PgConnection) -> Result<bool, StorageError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_products(conn: &mut PgConnection) -> Result<i64, StorageError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products").fetch_one(conn).await?;
    Ok(count)
}
