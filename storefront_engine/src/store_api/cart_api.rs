//! The shopping cart.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{CartItem, Product},
    store_api::{
        cart_objects::{CartItemRequest, CartLine, CartView},
        errors::StoreApiError,
    },
    traits::{CartManagement, CatalogManagement},
};

pub struct CartApi<B> {
    db: B,
}

impl<B: Debug> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi ({:?})", self.db)
    }
}

impl<B> CartApi<B>
where B: CartManagement + CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn view(&self, user_id: i64) -> Result<CartView, StoreApiError> {
        let items = self.db.fetch_cart(user_id).await?;
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            match self.db.fetch_product(item.product_id).await? {
                Some(product) => lines.push(CartLine::new(item, product)),
                None => warn!("🛒️ Cart item #{} refers to missing product #{}", item.id, item.product_id),
            }
        }
        Ok(CartView::new(lines))
    }

    /// Adds `quantity` units of the product to the cart, on top of any already there.
    pub async fn add_item(&self, user_id: i64, req: CartItemRequest) -> Result<CartItem, StoreApiError> {
        if req.quantity <= 0 {
            return Err(StoreApiError::ValidationError("The quantity must be at least 1".into()));
        }
        let product = self.available_product(req.product_id).await?;
        let in_cart = self
            .db
            .fetch_cart(user_id)
            .await?
            .into_iter()
            .find(|c| c.product_id == req.product_id)
            .map(|c| c.quantity)
            .unwrap_or(0);
        let quantity = in_cart + req.quantity;
        check_stock(&product, quantity)?;
        let item = self.db.upsert_cart_item(user_id, product.id, quantity).await?;
        debug!("🛒️ User #{user_id} now has {quantity} of product #{} in their cart", product.id);
        Ok(item)
    }

    /// Sets the quantity of a cart line. A quantity of zero removes the line, in which case `None` is returned.
    pub async fn set_quantity(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<Option<CartItem>, StoreApiError> {
        if quantity < 0 {
            return Err(StoreApiError::ValidationError("The quantity cannot be negative".into()));
        }
        if quantity == 0 {
            self.remove_item(user_id, product_id).await?;
            return Ok(None);
        }
        let product = self.available_product(product_id).await?;
        check_stock(&product, quantity)?;
        let item = self.db.upsert_cart_item(user_id, product_id, quantity).await?;
        debug!("🛒️ User #{user_id} set product #{product_id} to {quantity} in their cart");
        Ok(Some(item))
    }

    pub async fn remove_item(&self, user_id: i64, product_id: i64) -> Result<(), StoreApiError> {
        if self.db.remove_cart_item(user_id, product_id).await? {
            debug!("🛒️ Product #{product_id} removed from the cart of user #{user_id}");
            Ok(())
        } else {
            Err(StoreApiError::NotFound(format!("Product {product_id} in your cart")))
        }
    }

    pub async fn clear(&self, user_id: i64) -> Result<u64, StoreApiError> {
        let removed = self.db.clear_cart(user_id).await?;
        debug!("🛒️ Cleared {removed} lines from the cart of user #{user_id}");
        Ok(removed)
    }

    async fn available_product(&self, product_id: i64) -> Result<Product, StoreApiError> {
        match self.db.fetch_product(product_id).await? {
            Some(p) if p.is_active => Ok(p),
            _ => Err(StoreApiError::NotFound(format!("Product {product_id}"))),
        }
    }
}

fn check_stock(product: &Product, quantity: i64) -> Result<(), StoreApiError> {
    if product.is_available(quantity) {
        Ok(())
    } else {
        Err(StoreApiError::InsufficientStock { product_id: product.id, requested: quantity, available: product.stock })
    }
}
