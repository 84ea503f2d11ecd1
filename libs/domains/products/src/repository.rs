use async_trait::async_trait;

use crate::error::ProductResult;
use crate::models::{NewProduct, Product, ProductPatch};

/// Persistence contract for the product catalog.
///
/// Implementations own id generation and the initial `status`, and must be
/// safe to share across request tasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products in store order, truncated to `limit` when given
    async fn list(&self, limit: Option<usize>) -> ProductResult<Vec<Product>>;

    async fn get_by_id(&self, id: &str) -> ProductResult<Option<Product>>;

    /// Persist a new product and return it with its assigned id
    async fn create(&self, input: NewProduct) -> ProductResult<Product>;

    /// Merge `patch` into the product; `None` if the id is unknown
    async fn update(&self, id: &str, patch: ProductPatch) -> ProductResult<Option<Product>>;

    /// Returns whether a product was removed
    async fn delete(&self, id: &str) -> ProductResult<bool>;

    /// Cheap round trip used by the readiness endpoint
    async fn ping(&self) -> ProductResult<()>;
}
