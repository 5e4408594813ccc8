//! The row storage behind [`super::MemoryDatabase`].
//!
//! Every method here runs synchronously against `&mut Tables`, so a caller holding the write lock sees each method
//! (and any sequence of them) as a single atomic step. Validation always happens before the first mutation, so a
//! method that returns an error leaves the tables untouched.
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use sf_common::Cents;

use crate::{
    db_types::{
        CartItem,
        Category,
        CategoryUpdate,
        NewCategory,
        NewProduct,
        NewReview,
        NewUser,
        Order,
        OrderItem,
        OrderStatusType,
        Payment,
        PaymentStatus,
        Product,
        ProductUpdate,
        Review,
        Shipment,
        ShipmentStatus,
        ShipmentUpdate,
        User,
        UserUpdate,
    },
    traits::{
        OrderPlan,
        OrderQueryFilter,
        Pagination,
        PlacedOrder,
        ProductQueryFilter,
        ProductSort,
        RatingSummary,
        SalesSummary,
        StatusCount,
        StorageError,
        StoreCounts,
    },
};

/// An auto-increment table. Ids start at 1 and are never reused.
#[derive(Debug, Clone)]
pub struct Table<T> {
    next_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self { next_id: 1, rows: BTreeMap::new() }
    }
}

impl<T: Clone> Table<T> {
    pub fn insert_with<F: FnOnce(i64) -> T>(&mut self, f: F) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = f(id);
        self.rows.insert(id, row.clone());
        row
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn get_mut(&mut self, id: i64) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn remove(&mut self, id: i64) -> Option<T> {
        self.rows.remove(&id)
    }

    pub fn retain<F: FnMut(&T) -> bool>(&mut self, mut f: F) -> usize {
        let before = self.rows.len();
        self.rows.retain(|_, v| f(v));
        before - self.rows.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[derive(Debug, Clone, Default)]
pub struct Tables {
    users: Table<User>,
    categories: Table<Category>,
    products: Table<Product>,
    cart_items: Table<CartItem>,
    orders: Table<Order>,
    order_items: Table<OrderItem>,
    payments: Table<Payment>,
    shipments: Table<Shipment>,
    reviews: Table<Review>,
}

//--------------------------------------         Users         ---------------------------------------------------------
impl Tables {
    pub fn fetch_user(&self, id: i64) -> Option<User> {
        self.users.get(id).cloned()
    }

    pub fn fetch_user_by_username(&self, username: &str) -> Option<User> {
        self.users.values().find(|u| u.username == username).cloned()
    }

    pub fn fetch_user_by_email(&self, email: &str) -> Option<User> {
        self.users.values().find(|u| u.email == email).cloned()
    }

    pub fn list_users(&self, page: &Pagination) -> Vec<User> {
        page.apply(self.users.values().cloned())
    }

    pub fn create_user(&mut self, user: NewUser) -> Result<User, StorageError> {
        if self.fetch_user_by_username(&user.username).is_some() {
            return Err(StorageError::AlreadyExists(format!("Username '{}'", user.username)));
        }
        if self.fetch_user_by_email(&user.email).is_some() {
            return Err(StorageError::AlreadyExists(format!("Email '{}'", user.email)));
        }
        let now = Utc::now();
        Ok(self.users.insert_with(|id| User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            full_name: user.full_name,
            role: user.role,
            created_at: now,
            updated_at: now,
        }))
    }

    pub fn update_user(&mut self, id: i64, update: UserUpdate) -> Result<Option<User>, StorageError> {
        if let Some(email) = &update.email {
            if self.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(StorageError::AlreadyExists(format!("Email '{email}'")));
            }
        }
        let Some(user) = self.users.get_mut(id) else {
            return Ok(None);
        };
        if update.is_empty() {
            return Ok(Some(user.clone()));
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(full_name) = update.full_name {
            user.full_name = Some(full_name);
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(hash) = update.password_hash {
            user.password_hash = hash;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    pub fn delete_user(&mut self, id: i64) -> bool {
        if self.users.remove(id).is_none() {
            return false;
        }
        let products = self.products.values().filter(|p| p.seller_id == id).map(|p| p.id).collect::<Vec<_>>();
        for product_id in products {
            self.delete_product(product_id);
        }
        self.cart_items.retain(|c| c.user_id != id);
        self.reviews.retain(|r| r.user_id != id);
        let orders = self.orders.values().filter(|o| o.user_id == id).map(|o| o.id).collect::<HashSet<_>>();
        self.orders.retain(|o| !orders.contains(&o.id));
        self.order_items.retain(|i| !orders.contains(&i.order_id));
        self.payments.retain(|p| !orders.contains(&p.order_id));
        self.shipments.retain(|s| !orders.contains(&s.order_id));
        true
    }
}

//--------------------------------------        Catalog        ---------------------------------------------------------
impl Tables {
    pub fn fetch_category(&self, id: i64) -> Option<Category> {
        self.categories.get(id).cloned()
    }

    pub fn list_categories(&self) -> Vec<Category> {
        let mut categories = self.categories.values().cloned().collect::<Vec<_>>();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        categories
    }

    fn check_category_is_unique(
        &self,
        id: Option<i64>,
        name: Option<&str>,
        slug: Option<&str>,
    ) -> Result<(), StorageError> {
        for c in self.categories.values().filter(|c| Some(c.id) != id) {
            if name.map(|n| n == c.name).unwrap_or(false) {
                return Err(StorageError::AlreadyExists(format!("Category '{}'", c.name)));
            }
            if slug.map(|s| s == c.slug).unwrap_or(false) {
                return Err(StorageError::AlreadyExists(format!("Category slug '{}'", c.slug)));
            }
        }
        Ok(())
    }

    pub fn create_category(&mut self, category: NewCategory) -> Result<Category, StorageError> {
        self.check_category_is_unique(None, Some(&category.name), Some(&category.slug))?;
        let now = Utc::now();
        Ok(self.categories.insert_with(|id| Category {
            id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            created_at: now,
        }))
    }

    pub fn update_category(&mut self, id: i64, update: CategoryUpdate) -> Result<Option<Category>, StorageError> {
        self.check_category_is_unique(Some(id), update.name.as_deref(), update.slug.as_deref())?;
        let Some(category) = self.categories.get_mut(id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            category.name = name;
        }
        if let Some(slug) = update.slug {
            category.slug = slug;
        }
        if let Some(description) = update.description {
            category.description = Some(description);
        }
        Ok(Some(category.clone()))
    }

    pub fn delete_category(&mut self, id: i64) -> bool {
        if self.categories.remove(id).is_none() {
            return false;
        }
        let now = Utc::now();
        self.products.rows.values_mut().filter(|p| p.category_id == Some(id)).for_each(|p| {
            p.category_id = None;
            p.updated_at = now;
        });
        true
    }

    pub fn fetch_product(&self, id: i64) -> Option<Product> {
        self.products.get(id).cloned()
    }

    pub fn search_products(&self, filter: &ProductQueryFilter, page: &Pagination) -> Vec<Product> {
        let term = filter.search_term().map(str::to_lowercase);
        let mut products = self
            .products
            .values()
            .filter(|p| filter.include_inactive || p.is_active)
            .filter(|p| filter.category_id.map(|id| p.category_id == Some(id)).unwrap_or(true))
            .filter(|p| filter.seller_id.map(|id| p.seller_id == id).unwrap_or(true))
            .filter(|p| filter.min_price.map(|min| p.price >= min).unwrap_or(true))
            .filter(|p| filter.max_price.map(|max| p.price <= max).unwrap_or(true))
            .filter(|p| !filter.in_stock || p.stock > 0)
            .filter(|p| {
                term.as_ref()
                    .map(|t| p.name.to_lowercase().contains(t) || p.description.to_lowercase().contains(t))
                    .unwrap_or(true)
            })
            .cloned()
            .collect::<Vec<_>>();
        match filter.sort {
            ProductSort::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))),
            ProductSort::PriceAsc => products.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id))),
            ProductSort::PriceDesc => products.sort_by(|a, b| b.price.cmp(&a.price).then(a.id.cmp(&b.id))),
            ProductSort::Name => products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id))),
        }
        page.apply(products.into_iter())
    }

    fn check_product_refs(&self, seller_id: Option<i64>, category_id: Option<i64>) -> Result<(), StorageError> {
        if let Some(id) = seller_id {
            if self.users.get(id).is_none() {
                return Err(StorageError::NotFound(format!("Seller {id}")));
            }
        }
        if let Some(id) = category_id {
            if self.categories.get(id).is_none() {
                return Err(StorageError::NotFound(format!("Category {id}")));
            }
        }
        Ok(())
    }

    pub fn create_product(&mut self, product: NewProduct) -> Result<Product, StorageError> {
        self.check_product_refs(Some(product.seller_id), product.category_id)?;
        let now = Utc::now();
        Ok(self.products.insert_with(|id| Product {
            id,
            seller_id: product.seller_id,
            category_id: product.category_id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            image_url: product.image_url,
            is_active: true,
            created_at: now,
            updated_at: now,
        }))
    }

    pub fn update_product(&mut self, id: i64, update: ProductUpdate) -> Result<Option<Product>, StorageError> {
        self.check_product_refs(None, update.category_id)?;
        let Some(product) = self.products.get_mut(id) else {
            return Ok(None);
        };
        if update.is_empty() {
            return Ok(Some(product.clone()));
        }
        if let Some(category_id) = update.category_id {
            product.category_id = Some(category_id);
        }
        if let Some(name) = update.name {
            product.name = name;
        }
        if let Some(description) = update.description {
            product.description = description;
        }
        if let Some(price) = update.price {
            product.price = price;
        }
        if let Some(stock) = update.stock {
            product.stock = stock;
        }
        if let Some(image_url) = update.image_url {
            product.image_url = Some(image_url);
        }
        if let Some(is_active) = update.is_active {
            product.is_active = is_active;
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    pub fn delete_product(&mut self, id: i64) -> bool {
        if self.products.remove(id).is_none() {
            return false;
        }
        self.cart_items.retain(|c| c.product_id != id);
        self.reviews.retain(|r| r.product_id != id);
        self.order_items.rows.values_mut().filter(|i| i.product_id == Some(id)).for_each(|i| i.product_id = None);
        true
    }
}

//--------------------------------------         Carts         ---------------------------------------------------------
impl Tables {
    pub fn fetch_cart(&self, user_id: i64) -> Vec<CartItem> {
        self.cart_items.values().filter(|c| c.user_id == user_id).cloned().collect()
    }

    pub fn upsert_cart_item(&mut self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartItem, StorageError> {
        if self.users.get(user_id).is_none() {
            return Err(StorageError::NotFound(format!("User {user_id}")));
        }
        if self.products.get(product_id).is_none() {
            return Err(StorageError::NotFound(format!("Product {product_id}")));
        }
        let existing = self.cart_items.rows.values_mut().find(|c| c.user_id == user_id && c.product_id == product_id);
        if let Some(item) = existing {
            item.quantity = quantity;
            return Ok(item.clone());
        }
        let now = Utc::now();
        Ok(self.cart_items.insert_with(|id| CartItem { id, user_id, product_id, quantity, created_at: now }))
    }

    pub fn remove_cart_item(&mut self, user_id: i64, product_id: i64) -> bool {
        self.cart_items.retain(|c| !(c.user_id == user_id && c.product_id == product_id)) > 0
    }

    pub fn clear_cart(&mut self, user_id: i64) -> u64 {
        self.cart_items.retain(|c| c.user_id != user_id) as u64
    }
}

//--------------------------------------        Orders         ---------------------------------------------------------
impl Tables {
    pub fn place_order(&mut self, plan: OrderPlan) -> Result<PlacedOrder, StorageError> {
        if self.users.get(plan.user_id).is_none() {
            return Err(StorageError::NotFound(format!("User {}", plan.user_id)));
        }
        if plan.lines.is_empty() {
            return Err(StorageError::InvalidData("An order must have at least one item".into()));
        }
        let mut required = HashMap::<i64, i64>::new();
        for line in &plan.lines {
            *required.entry(line.product_id).or_default() += line.quantity;
        }
        for (&product_id, &requested) in &required {
            let product =
                self.products.get(product_id).ok_or_else(|| StorageError::NotFound(format!("Product {product_id}")))?;
            if product.stock < requested {
                return Err(StorageError::InsufficientStock { product_id, requested, available: product.stock });
            }
        }
        let now = Utc::now();
        // 1. Order
        let order = self.orders.insert_with(|id| Order {
            id,
            user_id: plan.user_id,
            status: plan.status,
            total_amount: plan.total_amount,
            shipping_address: plan.shipping_address,
            created_at: now,
            updated_at: now,
        });
        // 2. Order items
        let items = plan
            .lines
            .into_iter()
            .map(|line| {
                self.order_items.insert_with(|id| OrderItem {
                    id,
                    order_id: order.id,
                    product_id: Some(line.product_id),
                    seller_id: line.seller_id,
                    product_name: line.product_name,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                })
            })
            .collect::<Vec<_>>();
        // 3. Stock
        for (product_id, quantity) in required {
            if let Some(product) = self.products.get_mut(product_id) {
                product.stock -= quantity;
                product.updated_at = now;
            }
        }
        // 4. Payment
        let payment = self.payments.insert_with(|id| Payment {
            id,
            order_id: order.id,
            amount: plan.payment.amount,
            method: plan.payment.method,
            status: plan.payment.status,
            transaction_ref: plan.payment.transaction_ref,
            created_at: now,
            updated_at: now,
        });
        // 5. Shipment
        let shipment = self.shipments.insert_with(|id| Shipment {
            id,
            order_id: order.id,
            carrier: plan.shipment.carrier,
            tracking_number: plan.shipment.tracking_number,
            status: ShipmentStatus::Preparing,
            estimated_delivery: plan.shipment.estimated_delivery,
            created_at: now,
            updated_at: now,
        });
        // 6. Cart
        self.clear_cart(order.user_id);
        Ok(PlacedOrder { order, items, payment, shipment })
    }

    pub fn fetch_order(&self, id: i64) -> Option<Order> {
        self.orders.get(id).cloned()
    }

    pub fn fetch_order_items(&self, order_id: i64) -> Vec<OrderItem> {
        self.order_items.values().filter(|i| i.order_id == order_id).cloned().collect()
    }

    fn sellers_for_order(&self, order_id: i64) -> Vec<i64> {
        self.order_items.values().filter(|i| i.order_id == order_id).map(|i| i.seller_id).collect()
    }

    pub fn search_orders(&self, filter: &OrderQueryFilter, page: &Pagination) -> Vec<Order> {
        let mut orders = self
            .orders
            .values()
            .filter(|o| filter.matches(o, &self.sellers_for_order(o.id)))
            .cloned()
            .collect::<Vec<_>>();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        page.apply(orders.into_iter())
    }

    pub fn update_order_status(
        &mut self,
        id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Option<Order>, StorageError> {
        let Some(order) = self.orders.get_mut(id) else {
            return Ok(None);
        };
        if order.status != from {
            return Err(StorageError::status_conflict(id, order.status, from));
        }
        order.status = to;
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    pub fn cancel_order(&mut self, id: i64) -> Result<Order, StorageError> {
        let order = self.orders.get(id).ok_or_else(|| StorageError::NotFound(format!("Order {id}")))?;
        if !order.status.is_cancellable() {
            return Err(StorageError::not_cancellable(id, order.status));
        }
        let now = Utc::now();
        let restock = self
            .order_items
            .values()
            .filter(|i| i.order_id == id)
            .filter_map(|i| i.product_id.map(|p| (p, i.quantity)))
            .collect::<Vec<_>>();
        for (product_id, quantity) in restock {
            if let Some(product) = self.products.get_mut(product_id) {
                product.stock += quantity;
                product.updated_at = now;
            }
        }
        for payment in self.payments.rows.values_mut().filter(|p| p.order_id == id) {
            payment.status = match payment.status {
                PaymentStatus::Completed => PaymentStatus::Refunded,
                PaymentStatus::Pending => PaymentStatus::Cancelled,
                other => other,
            };
            payment.updated_at = now;
        }
        for shipment in self.shipments.rows.values_mut().filter(|s| s.order_id == id) {
            shipment.status = ShipmentStatus::Cancelled;
            shipment.updated_at = now;
        }
        let order = self.orders.get_mut(id).ok_or_else(|| StorageError::NotFound(format!("Order {id}")))?;
        order.status = OrderStatusType::Cancelled;
        order.updated_at = now;
        Ok(order.clone())
    }

    pub fn fetch_payment(&self, order_id: i64) -> Option<Payment> {
        self.payments.values().find(|p| p.order_id == order_id).cloned()
    }

    pub fn update_payment_status(&mut self, order_id: i64, status: PaymentStatus) -> Option<Payment> {
        let payment = self.payments.rows.values_mut().find(|p| p.order_id == order_id)?;
        payment.status = status;
        payment.updated_at = Utc::now();
        Some(payment.clone())
    }

    pub fn fetch_shipment(&self, order_id: i64) -> Option<Shipment> {
        self.shipments.values().find(|s| s.order_id == order_id).cloned()
    }

    pub fn update_shipment(&mut self, order_id: i64, update: ShipmentUpdate) -> Option<Shipment> {
        let shipment = self.shipments.rows.values_mut().find(|s| s.order_id == order_id)?;
        if update.is_empty() {
            return Some(shipment.clone());
        }
        if let Some(carrier) = update.carrier {
            shipment.carrier = carrier;
        }
        if let Some(tracking_number) = update.tracking_number {
            shipment.tracking_number = tracking_number;
        }
        if let Some(status) = update.status {
            shipment.status = status;
        }
        if let Some(eta) = update.estimated_delivery {
            shipment.estimated_delivery = Some(eta);
        }
        shipment.updated_at = Utc::now();
        Some(shipment.clone())
    }

    pub fn order_status_counts(&self) -> Vec<StatusCount> {
        OrderStatusType::ALL
            .iter()
            .map(|&status| {
                let n = self.orders.values().filter(|o| o.status == status).count();
                StatusCount { status, count: count(n) }
            })
            .filter(|c| c.count > 0)
            .collect()
    }

    pub fn sales_summary(&self, seller_id: Option<i64>) -> SalesSummary {
        let live_orders = self
            .orders
            .values()
            .filter(|o| o.status != OrderStatusType::Cancelled)
            .map(|o| o.id)
            .collect::<HashSet<_>>();
        let lines = self
            .order_items
            .values()
            .filter(|i| live_orders.contains(&i.order_id))
            .filter(|i| seller_id.map(|s| i.seller_id == s).unwrap_or(true))
            .collect::<Vec<_>>();
        let units_sold = lines.iter().map(|i| i.quantity).sum();
        match seller_id {
            Some(_) => SalesSummary {
                orders: count(lines.iter().map(|i| i.order_id).collect::<HashSet<_>>().len()),
                units_sold,
                revenue: lines.iter().map(|i| i.line_total()).sum(),
            },
            None => SalesSummary {
                orders: count(live_orders.len()),
                units_sold,
                revenue: self
                    .orders
                    .values()
                    .filter(|o| live_orders.contains(&o.id))
                    .map(|o| o.total_amount)
                    .sum::<Cents>(),
            },
        }
    }
}

//--------------------------------------        Reviews        ---------------------------------------------------------
impl Tables {
    pub fn fetch_review(&self, id: i64) -> Option<Review> {
        self.reviews.get(id).cloned()
    }

    pub fn fetch_reviews_for_product(&self, product_id: i64) -> Vec<Review> {
        let mut reviews = self.reviews.values().filter(|r| r.product_id == product_id).cloned().collect::<Vec<_>>();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        reviews
    }

    pub fn create_review(&mut self, review: NewReview) -> Result<Review, StorageError> {
        if self.products.get(review.product_id).is_none() {
            return Err(StorageError::NotFound(format!("Product {}", review.product_id)));
        }
        if self.users.get(review.user_id).is_none() {
            return Err(StorageError::NotFound(format!("User {}", review.user_id)));
        }
        if self.reviews.values().any(|r| r.product_id == review.product_id && r.user_id == review.user_id) {
            return Err(StorageError::AlreadyExists(format!(
                "Review of product {} by user {}",
                review.product_id, review.user_id
            )));
        }
        let now = Utc::now();
        Ok(self.reviews.insert_with(|id| Review {
            id,
            product_id: review.product_id,
            user_id: review.user_id,
            rating: review.rating,
            comment: review.comment,
            verified_purchase: review.verified_purchase,
            created_at: now,
        }))
    }

    pub fn delete_review(&mut self, id: i64) -> bool {
        self.reviews.remove(id).is_some()
    }

    pub fn rating_summary(&self, product_id: i64) -> RatingSummary {
        let ratings =
            self.reviews.values().filter(|r| r.product_id == product_id).map(|r| r.rating).collect::<Vec<_>>();
        let count = count(ratings.len());
        let average = if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().map(|&r| f64::from(r)).sum::<f64>() / ratings.len() as f64)
        };
        RatingSummary { average, count }
    }

    pub fn has_purchased(&self, user_id: i64, product_id: i64) -> bool {
        self.order_items.values().filter(|i| i.product_id == Some(product_id)).any(|i| {
            self.orders
                .get(i.order_id)
                .map(|o| o.user_id == user_id && o.status != OrderStatusType::Cancelled)
                .unwrap_or(false)
        })
    }

    pub fn store_counts(&self) -> StoreCounts {
        StoreCounts {
            users: count(self.users.len()),
            products: count(self.products.len()),
            orders: count(self.orders.len()),
        }
    }
}
