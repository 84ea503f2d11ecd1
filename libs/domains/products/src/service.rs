//! Product Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{CreateProduct, Product, ProductPatch};
use crate::repository::ProductRepository;

/// Product service in front of a [`ProductRepository`].
///
/// Validates creation payloads and turns missing products into
/// [`ProductError::NotFound`].
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// List products, truncated to `limit` when given
    #[instrument(skip(self))]
    pub async fn list_products(&self, limit: Option<usize>) -> ProductResult<Vec<Product>> {
        self.repository.list(limit).await
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &str) -> ProductResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| ProductError::NotFound(id.to_string()))
    }

    /// Create a product. Nothing is stored if a required field is missing.
    #[instrument(skip(self, input))]
    pub async fn create_product(&self, input: CreateProduct) -> ProductResult<Product> {
        input.validate().map_err(|e| {
            tracing::debug!(errors = %e, "Rejected product creation");
            ProductError::MissingFields
        })?;

        let new_product = input.into_new_product().ok_or(ProductError::MissingFields)?;
        self.repository.create(new_product).await
    }

    #[instrument(skip(self, patch))]
    pub async fn update_product(&self, id: &str, patch: ProductPatch) -> ProductResult<Product> {
        self.repository
            .update(id, patch)
            .await?
            .ok_or_else(|| ProductError::NotFound(id.to_string()))
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: &str) -> ProductResult<()> {
        if self.repository.delete(id).await? {
            Ok(())
        } else {
            Err(ProductError::NotFound(id.to_string()))
        }
    }

    /// Probe the backing store; used by readiness checks
    pub async fn check_store(&self) -> ProductResult<()> {
        self.repository.ping().await
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
