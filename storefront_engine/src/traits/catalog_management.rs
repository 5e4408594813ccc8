use crate::{
    db_types::{Category, CategoryUpdate, NewCategory, NewProduct, Product, ProductUpdate},
    traits::{
        data_objects::{Pagination, ProductQueryFilter},
        StorageError,
    },
};

/// Categories and products.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn fetch_category(&self, id: i64) -> Result<Option<Category>, StorageError>;

    /// All categories, ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>, StorageError>;

    async fn create_category(&self, category: NewCategory) -> Result<Category, StorageError>;

    async fn update_category(&self, id: i64, update: CategoryUpdate) -> Result<Option<Category>, StorageError>;

    /// Deletes the category. Products in the category are kept, with their `category_id` cleared.
    async fn delete_category(&self, id: i64) -> Result<bool, StorageError>;

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, StorageError>;

    /// Returns the products matching every criterion in `filter`, in the order given by `filter.sort`.
    async fn search_products(
        &self,
        filter: &ProductQueryFilter,
        page: &Pagination,
    ) -> Result<Vec<Product>, StorageError>;

    async fn create_product(&self, product: NewProduct) -> Result<Product, StorageError>;

    async fn update_product(&self, id: i64, update: ProductUpdate) -> Result<Option<Product>, StorageError>;

    /// Deletes the product, its cart lines and its reviews. Order lines that refer to it keep their snapshot of the
    /// name and price, but lose the product reference.
    async fn delete_product(&self, id: i64) -> Result<bool, StorageError>;
}
