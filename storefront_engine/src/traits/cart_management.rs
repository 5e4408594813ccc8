use crate::{db_types::CartItem, traits::StorageError};

#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// The user's cart lines, oldest first.
    async fn fetch_cart(&self, user_id: i64) -> Result<Vec<CartItem>, StorageError>;

    /// Sets the quantity of `product_id` in the user's cart, creating the line if needed. Stock checks are the
    /// caller's responsibility.
    async fn upsert_cart_item(&self, user_id: i64, product_id: i64, quantity: i64) -> Result<CartItem, StorageError>;

    async fn remove_cart_item(&self, user_id: i64, product_id: i64) -> Result<bool, StorageError>;

    /// Empties the cart and returns the number of lines removed.
    async fn clear_cart(&self, user_id: i64) -> Result<u64, StorageError>;
}
