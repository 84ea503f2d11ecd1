//! Application state management

use domain_products::ProductService;

use crate::config::Config;
use crate::storage::ProductStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub products: ProductService<ProductStore>,
}
