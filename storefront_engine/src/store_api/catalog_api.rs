//! Product listings, seller product management and categories.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Actor, Category, CategoryUpdate, NewCategory, NewProduct, Product, ProductUpdate, Role},
    helpers::slugify,
    store_api::{
        catalog_objects::{NewCategoryRequest, NewProductRequest, ProductDetail},
        errors::StoreApiError,
    },
    traits::{CatalogManagement, Pagination, ProductQueryFilter, ReviewManagement},
};

pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement + ReviewManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The public product listing. Inactive products are only included for admins, or for a seller listing their own
    /// products.
    pub async fn list_products(
        &self,
        mut filter: ProductQueryFilter,
        page: &Pagination,
        viewer: Option<&Actor>,
    ) -> Result<Vec<Product>, StoreApiError> {
        let may_see_inactive = match (viewer, filter.seller_id) {
            (Some(actor), _) if actor.is_admin() => true,
            (Some(actor), Some(seller_id)) => actor.user_id == seller_id,
            _ => false,
        };
        filter.include_inactive &= may_see_inactive;
        Ok(self.db.search_products(&filter, page).await?)
    }

    /// All of a seller's products, including inactive ones.
    pub async fn seller_products(&self, actor: &Actor, page: &Pagination) -> Result<Vec<Product>, StoreApiError> {
        let filter = ProductQueryFilter::default().with_seller(actor.user_id).including_inactive();
        Ok(self.db.search_products(&filter, page).await?)
    }

    pub async fn product(&self, id: i64, viewer: Option<&Actor>) -> Result<Product, StoreApiError> {
        let product = self.db.fetch_product(id).await?.ok_or_else(|| product_not_found(id))?;
        let visible = product.is_active || viewer.map(|a| a.can_manage(product.seller_id)).unwrap_or(false);
        if visible {
            Ok(product)
        } else {
            Err(product_not_found(id))
        }
    }

    pub async fn product_detail(&self, id: i64, viewer: Option<&Actor>) -> Result<ProductDetail, StoreApiError> {
        let product = self.product(id, viewer).await?;
        let rating = self.db.rating_summary(id).await?;
        Ok(ProductDetail { product, rating })
    }

    pub async fn create_product(&self, actor: &Actor, req: NewProductRequest) -> Result<Product, StoreApiError> {
        if actor.role == Role::Customer {
            return Err(StoreApiError::Forbidden("Only sellers can list products".into()));
        }
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(StoreApiError::ValidationError("A product needs a name".into()));
        }
        if req.price.is_negative() {
            return Err(StoreApiError::ValidationError("The price cannot be negative".into()));
        }
        if req.stock < 0 {
            return Err(StoreApiError::ValidationError("The stock level cannot be negative".into()));
        }
        if let Some(category_id) = req.category_id {
            self.category(category_id).await?;
        }
        let product = NewProduct {
            seller_id: actor.user_id,
            category_id: req.category_id,
            name,
            description: req.description,
            price: req.price,
            stock: req.stock,
            image_url: req.image_url,
        };
        let product = self.db.create_product(product).await?;
        info!("🏷️ Seller #{} listed product #{} ({})", actor.user_id, product.id, product.name);
        Ok(product)
    }

    /// Sellers can edit their own products. Admins can edit any product.
    pub async fn update_product(
        &self,
        actor: &Actor,
        id: i64,
        update: ProductUpdate,
    ) -> Result<Product, StoreApiError> {
        self.owned_product(actor, id).await?;
        if update.is_empty() {
            return Err(StoreApiError::ValidationError("Nothing to update".into()));
        }
        if update.name.as_deref().map(|n| n.trim().is_empty()).unwrap_or(false) {
            return Err(StoreApiError::ValidationError("A product needs a name".into()));
        }
        if update.price.map(|p| p.is_negative()).unwrap_or(false) {
            return Err(StoreApiError::ValidationError("The price cannot be negative".into()));
        }
        if update.stock.map(|s| s < 0).unwrap_or(false) {
            return Err(StoreApiError::ValidationError("The stock level cannot be negative".into()));
        }
        if let Some(category_id) = update.category_id {
            self.category(category_id).await?;
        }
        let product = self.db.update_product(id, update).await?.ok_or_else(|| product_not_found(id))?;
        debug!("🏷️ Product #{id} updated by user #{}", actor.user_id);
        Ok(product)
    }

    pub async fn delete_product(&self, actor: &Actor, id: i64) -> Result<(), StoreApiError> {
        self.owned_product(actor, id).await?;
        if !self.db.delete_product(id).await? {
            return Err(product_not_found(id));
        }
        info!("🏷️ Product #{id} deleted by user #{}", actor.user_id);
        Ok(())
    }

    async fn owned_product(&self, actor: &Actor, id: i64) -> Result<Product, StoreApiError> {
        let product = self.db.fetch_product(id).await?.ok_or_else(|| product_not_found(id))?;
        if !actor.can_manage(product.seller_id) {
            let owner = product.seller_id;
            warn!("🏷️ User #{} tried to modify product #{id}, which belongs to seller #{owner}", actor.user_id);
            return Err(StoreApiError::Forbidden("You can only manage your own products".into()));
        }
        Ok(product)
    }

    pub async fn categories(&self) -> Result<Vec<Category>, StoreApiError> {
        Ok(self.db.list_categories().await?)
    }

    pub async fn category(&self, id: i64) -> Result<Category, StoreApiError> {
        self.db.fetch_category(id).await?.ok_or_else(|| StoreApiError::NotFound(format!("Category {id}")))
    }

    pub async fn create_category(&self, actor: &Actor, req: NewCategoryRequest) -> Result<Category, StoreApiError> {
        ensure_admin(actor)?;
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(StoreApiError::ValidationError("A category needs a name".into()));
        }
        let slug = slugify(req.slug.as_deref().unwrap_or(&name));
        if slug.is_empty() {
            return Err(StoreApiError::ValidationError(format!("Cannot make a slug from '{name}'")));
        }
        let category = self.db.create_category(NewCategory { name, slug, description: req.description }).await?;
        info!("🏷️ Category '{}' created", category.slug);
        Ok(category)
    }

    pub async fn update_category(
        &self,
        actor: &Actor,
        id: i64,
        mut update: CategoryUpdate,
    ) -> Result<Category, StoreApiError> {
        ensure_admin(actor)?;
        if update.is_empty() {
            return Err(StoreApiError::ValidationError("Nothing to update".into()));
        }
        if let Some(slug) = update.slug.take() {
            let slug = slugify(&slug);
            if slug.is_empty() {
                return Err(StoreApiError::ValidationError("Invalid slug".into()));
            }
            update.slug = Some(slug);
        }
        self.db
            .update_category(id, update)
            .await?
            .ok_or_else(|| StoreApiError::NotFound(format!("Category {id}")))
    }

    pub async fn delete_category(&self, actor: &Actor, id: i64) -> Result<(), StoreApiError> {
        ensure_admin(actor)?;
        if !self.db.delete_category(id).await? {
            return Err(StoreApiError::NotFound(format!("Category {id}")));
        }
        info!("🏷️ Category #{id} deleted");
        Ok(())
    }
}

fn product_not_found(id: i64) -> StoreApiError {
    StoreApiError::NotFound(format!("Product {id}"))
}

fn ensure_admin(actor: &Actor) -> Result<(), StoreApiError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(StoreApiError::Forbidden("Only admins can manage categories".into()))
    }
}
