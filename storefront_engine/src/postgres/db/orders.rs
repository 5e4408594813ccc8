use log::{debug, trace};
use sf_common::Cents;
use sqlx::{PgConnection, QueryBuilder};

use crate::{
    db_types::{
        NewPayment,
        NewShipment,
        Order,
        OrderItem,
        OrderStatusType,
        Payment,
        PaymentStatus,
        Shipment,
        ShipmentStatus,
        ShipmentUpdate,
    },
    traits::{OrderLine, OrderQueryFilter, Pagination, SalesSummary, StatusCount, StorageError},
};

/// Inserts a new order using the given connection. This is not atomic. Embed the call in a transaction and pass
/// `&mut *tx` as the connection argument when it is one step of a larger flow.
pub async fn insert_order(
    user_id: i64,
    status: OrderStatusType,
    total_amount: Cents,
    shipping_address: &str,
    conn: &mut PgConnection,
) -> Result<Order, StorageError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (user_id, status, total_amount, shipping_address)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(status.to_string())
    .bind(total_amount)
    .bind(shipping_address)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn insert_order_item(
    order_id: i64,
    line: OrderLine,
    conn: &mut PgConnection,
) -> Result<OrderItem, StorageError> {
    let item = sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, product_id, seller_id, product_name, quantity, unit_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(line.product_id)
    .bind(line.seller_id)
    .bind(line.product_name)
    .bind(line.quantity)
    .bind(line.unit_price)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

/// Takes `quantity` units of the product out of stock. The update only happens if enough stock is left, so two
/// concurrent checkouts can never oversell.
pub async fn decrement_stock(product_id: i64, quantity: i64, conn: &mut PgConnection) -> Result<(), StorageError> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock - $1, updated_at = now() WHERE id = $2 AND stock >= $1",
    )
    .bind(quantity)
    .bind(product_id)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 1 {
        return Ok(());
    }
    let available: Option<i64> =
        sqlx::query_scalar("SELECT stock FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    match available {
        Some(available) => Err(StorageError::InsufficientStock { product_id, requested: quantity, available }),
        None => Err(StorageError::NotFound(format!("Product {product_id}"))),
    }
}

pub async fn increment_stock(product_id: i64, quantity: i64, conn: &mut PgConnection) -> Result<(), StorageError> {
    sqlx::query("UPDATE products SET stock = stock + $1, updated_at = now() WHERE id = $2")
        .bind(quantity)
        .bind(product_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn insert_payment(
    order_id: i64,
    payment: NewPayment,
    conn: &mut PgConnection,
) -> Result<Payment, StorageError> {
    let payment = sqlx::query_as(
        r#"
            INSERT INTO payments (order_id, amount, method, status, transaction_ref)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(payment.amount)
    .bind(payment.method.to_string())
    .bind(payment.status.to_string())
    .bind(payment.transaction_ref)
    .fetch_one(conn)
    .await?;
    Ok(payment)
}

pub async fn insert_shipment(
    order_id: i64,
    shipment: NewShipment,
    conn: &mut PgConnection,
) -> Result<Shipment, StorageError> {
    let shipment = sqlx::query_as(
        r#"
            INSERT INTO shipments (order_id, carrier, tracking_number, status, estimated_delivery)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(shipment.carrier)
    .bind(shipment.tracking_number)
    .bind(ShipmentStatus::Preparing.to_string())
    .bind(shipment.estimated_delivery)
    .fetch_one(conn)
    .await?;
    Ok(shipment)
}

pub async fn fetch_order(id: i64, conn: &mut PgConnection) -> Result<Option<Order>, StorageError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: i64, conn: &mut PgConnection) -> Result<Vec<OrderItem>, StorageError> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Fetches orders according to the criteria in the `OrderQueryFilter`, newest first.
pub async fn search_orders(
    filter: &OrderQueryFilter,
    page: &Pagination,
    conn: &mut PgConnection,
) -> Result<Vec<Order>, StorageError> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !filter.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = filter.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(seller_id) = filter.seller_id {
        where_clause.push("id IN (SELECT order_id FROM order_items WHERE seller_id = ");
        where_clause.push_bind_unseparated(seller_id);
        where_clause.push_unseparated(")");
    }
    if let Some(status) = filter.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status.to_string());
    }
    if let Some(since) = filter.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = filter.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(page.limit);
    builder.push(" OFFSET ");
    builder.push_bind(page.offset);
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {}", orders.len());
    Ok(orders)
}

/// Moves the order from `from` to `to` in a single conditional write.
pub async fn update_order_status(
    id: i64,
    from: OrderStatusType,
    to: OrderStatusType,
    conn: &mut PgConnection,
) -> Result<Option<Order>, StorageError> {
    let order = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = now() WHERE id = $2 AND status = $3 RETURNING *",
    )
    .bind(to.to_string())
    .bind(id)
    .bind(from.to_string())
    .fetch_optional(&mut *conn)
    .await?;
    match order {
        Some(order) => Ok(Some(order)),
        None => match fetch_order(id, conn).await? {
            Some(current) => Err(StorageError::status_conflict(id, current.status, from)),
            None => Ok(None),
        },
    }
}

/// Marks a pending or processing order as cancelled. Returns `None` if no row was changed.
pub async fn mark_cancelled(id: i64, conn: &mut PgConnection) -> Result<Option<Order>, StorageError> {
    let order = sqlx::query_as(
        "UPDATE orders SET status = 'cancelled', updated_at = now() WHERE id = $1 AND status IN ('pending', \
         'processing') RETURNING *",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Refunds a completed payment, or cancels a pending one.
pub async fn annul_payment(order_id: i64, conn: &mut PgConnection) -> Result<(), StorageError> {
    sqlx::query(
        r#"
            UPDATE payments SET
                status = CASE status WHEN 'completed' THEN 'refunded' WHEN 'pending' THEN 'cancelled' ELSE status END,
                updated_at = now()
            WHERE order_id = $1
        "#,
    )
    .bind(order_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_payment(order_id: i64, conn: &mut PgConnection) -> Result<Option<Payment>, StorageError> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE order_id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn update_payment_status(
    order_id: i64,
    status: PaymentStatus,
    conn: &mut PgConnection,
) -> Result<Option<Payment>, StorageError> {
    let payment = sqlx::query_as("UPDATE payments SET status = $1, updated_at = now() WHERE order_id = $2 RETURNING *")
        .bind(status.to_string())
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

pub async fn fetch_shipment(order_id: i64, conn: &mut PgConnection) -> Result<Option<Shipment>, StorageError> {
    let shipment =
        sqlx::query_as("SELECT * FROM shipments WHERE order_id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(shipment)
}

pub async fn update_shipment(
    order_id: i64,
    update: ShipmentUpdate,
    conn: &mut PgConnection,
) -> Result<Option<Shipment>, StorageError> {
    if update.is_empty() {
        debug!("🗃️ No fields to update for the shipment of order {order_id}. Update request skipped.");
        return fetch_shipment(order_id, conn).await;
    }
    let mut builder = QueryBuilder::new("UPDATE shipments SET updated_at = now()");
    if let Some(carrier) = update.carrier {
        builder.push(", carrier = ");
        builder.push_bind(carrier);
    }
    if let Some(tracking_number) = update.tracking_number {
        builder.push(", tracking_number = ");
        builder.push_bind(tracking_number);
    }
    if let Some(status) = update.status {
        builder.push(", status = ");
        builder.push_bind(status.to_string());
    }
    if let Some(eta) = update.estimated_delivery {
        builder.push(", estimated_delivery = ");
        builder.push_bind(eta);
    }
    builder.push(" WHERE order_id = ");
    builder.push_bind(order_id);
    builder.push(" RETURNING *");
    let shipment = builder.build_query_as::<Shipment>().fetch_optional(conn).await?;
    Ok(shipment)
}

pub async fn order_status_counts(conn: &mut PgConnection) -> Result<Vec<StatusCount>, StorageError> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status").fetch_all(conn).await?;
    let mut counts = rows
        .into_iter()
        .map(|(status, count)| {
            let status = status.parse::<OrderStatusType>().map_err(|e| StorageError::InvalidData(e.to_string()))?;
            Ok(StatusCount { status, count })
        })
        .collect::<Result<Vec<_>, StorageError>>()?;
    counts.sort_by_key(|c| c.status);
    Ok(counts)
}

pub async fn sales_summary(seller_id: Option<i64>, conn: &mut PgConnection) -> Result<SalesSummary, StorageError> {
    let (orders, units_sold, revenue): (i64, i64, i64) = match seller_id {
        Some(seller_id) => {
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(DISTINCT order_items.order_id),
                    COALESCE(SUM(order_items.quantity), 0)::BIGINT,
                    COALESCE(SUM(order_items.quantity * order_items.unit_price), 0)::BIGINT
                FROM order_items JOIN orders ON orders.id = order_items.order_id
                WHERE orders.status <> 'cancelled' AND order_items.seller_id = $1
            "#,
            )
            .bind(seller_id)
            .fetch_one(conn)
            .await?
        },
        None => {
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE((
                        SELECT SUM(order_items.quantity) FROM order_items
                        JOIN orders o ON o.id = order_items.order_id
                        WHERE o.status <> 'cancelled'
                    ), 0)::BIGINT,
                    COALESCE(SUM(total_amount), 0)::BIGINT
                FROM orders
                WHERE status <> 'cancelled'
            "#,
            )
            .fetch_one(conn)
            .await?
        },
    };
    Ok(SalesSummary { orders, units_sold, revenue: Cents::from(revenue) })
}

pub async fn count_orders(conn: &mut PgConnection) -> Result<i64, StorageError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(conn).await?;
    Ok(count)
}
