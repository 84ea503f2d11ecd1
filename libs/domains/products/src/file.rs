//! JSON file implementation of ProductRepository

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::instrument;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{NewProduct, Product, ProductPatch};
use crate::repository::ProductRepository;

/// Default location of the catalog file, relative to the working directory
pub const DEFAULT_PRODUCTS_FILE: &str = "data/products.json";

/// Product store backed by a JSON array on disk.
///
/// The catalog is loaded once and served from memory. Every mutation is
/// written through to disk (temp file + rename) before it becomes visible;
/// if the write fails the in-memory state is rolled back.
pub struct FileProductRepository {
    path: PathBuf,
    products: RwLock<Vec<Product>>,
}

impl FileProductRepository {
    /// Open the catalog at `path`. A missing or blank file is an empty catalog.
    pub async fn open(path: impl Into<PathBuf>) -> ProductResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let products: Vec<Product> = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            path = %path.display(),
            count = products.len(),
            "Product catalog loaded"
        );

        Ok(Self {
            path,
            products: RwLock::new(products),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, products: &[Product]) -> ProductResult<()> {
        let bytes = serde_json::to_vec_pretty(products)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

fn next_id(existing: &[Product]) -> String {
    loop {
        let id = Uuid::now_v7().to_string();
        if !existing.iter().any(|p| p.id == id) {
            return id;
        }
    }
}

#[async_trait]
impl ProductRepository for FileProductRepository {
    #[instrument(skip(self))]
    async fn list(&self, limit: Option<usize>) -> ProductResult<Vec<Product>> {
        let products = self.products.read().await;
        let take = limit.unwrap_or(products.len());
        Ok(products.iter().take(take).cloned().collect())
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> ProductResult<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    async fn create(&self, input: NewProduct) -> ProductResult<Product> {
        let mut products = self.products.write().await;

        let product = Product::from_new(next_id(&products), input);
        products.push(product.clone());

        if let Err(e) = self.persist(&products).await {
            products.pop();
            return Err(e);
        }

        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: &str, patch: ProductPatch) -> ProductResult<Option<Product>> {
        let mut products = self.products.write().await;

        let Some(index) = products.iter().position(|p| p.id == id) else {
            return Ok(None);
        };

        let updated = products[index].apply_patch(&patch)?;
        let previous = std::mem::replace(&mut products[index], updated.clone());

        if let Err(e) = self.persist(&products).await {
            products[index] = previous;
            return Err(e);
        }

        tracing::info!(product_id = %id, "Product updated");
        Ok(Some(updated))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> ProductResult<bool> {
        let mut products = self.products.write().await;

        let Some(index) = products.iter().position(|p| p.id == id) else {
            return Ok(false);
        };

        let removed = products.remove(index);
        if let Err(e) = self.persist(&products).await {
            products.insert(index, removed);
            return Err(e);
        }

        tracing::info!(product_id = %id, "Product deleted");
        Ok(true)
    }

    async fn ping(&self) -> ProductResult<()> {
        match tokio::fs::metadata(&self.path).await {
            Ok(_) => Ok(()),
            // Nothing written yet; the directory must still be there.
            Err(e) if e.kind() == ErrorKind::NotFound => match self.path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => {
                    tokio::fs::metadata(parent).await?;
                    Ok(())
                }
                _ => Ok(()),
            },
            Err(e) => Err(e.into()),
        }
    }
}
