//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, Document, doc};
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{NewProduct, Product, ProductPatch};
use crate::repository::ProductRepository;

/// Stored shape of a product: the API id lives in `_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProductDocument {
    #[serde(rename = "_id")]
    id: String,
    title: String,
    description: String,
    code: String,
    price: f64,
    stock: i64,
    category: String,
    #[serde(default)]
    thumbnails: Vec<String>,
    status: bool,
}

impl From<Product> for ProductDocument {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            code: p.code,
            price: p.price,
            stock: p.stock,
            category: p.category,
            thumbnails: p.thumbnails,
            status: p.status,
        }
    }
}

impl From<ProductDocument> for Product {
    fn from(d: ProductDocument) -> Self {
        Self {
            id: d.id,
            title: d.title,
            description: d.description,
            code: d.code,
            price: d.price,
            stock: d.stock,
            category: d.category,
            thumbnails: d.thumbnails,
            status: d.status,
        }
    }
}

/// MongoDB implementation of the ProductRepository
pub struct MongoProductRepository {
    db: Database,
    collection: Collection<ProductDocument>,
}

/// `$set` body for an update: the fields `patch` names, read from the
/// already validated `merged` product.
fn patched_fields(merged: &Product, patch: &ProductPatch) -> ProductResult<Document> {
    let stored = bson::to_document(&ProductDocument::from(merged.clone()))
        .map_err(|e| ProductError::Database(e.to_string()))?;
    Ok(stored
        .into_iter()
        .filter(|(key, _)| key != "_id" && patch.fields().contains_key(key))
        .collect())
}

impl MongoProductRepository {
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            db: db.clone(),
            collection: db.collection::<ProductDocument>(collection_name),
        }
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self))]
    async fn list(&self, limit: Option<usize>) -> ProductResult<Vec<Product>> {
        // The driver treats a limit of 0 as "no limit".
        if limit == Some(0) {
            return Ok(Vec::new());
        }

        // v7 ids sort in creation order.
        let mut find = self.collection.find(doc! {}).sort(doc! { "_id": 1 });
        if let Some(limit) = limit {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let documents: Vec<ProductDocument> = find.await?.try_collect().await?;
        Ok(documents.into_iter().map(Product::from).collect())
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> ProductResult<Option<Product>> {
        let document = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(document.map(Product::from))
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    async fn create(&self, input: NewProduct) -> ProductResult<Product> {
        let product = Product::from_new(Uuid::now_v7().to_string(), input);
        self.collection
            .insert_one(ProductDocument::from(product.clone()))
            .await?;

        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    #[instrument(skip(self, patch))]
    async fn update(&self, id: &str, patch: ProductPatch) -> ProductResult<Option<Product>> {
        let filter = doc! { "_id": id };

        let Some(existing) = self.collection.find_one(filter.clone()).await? else {
            return Ok(None);
        };

        // The merge only validates; concurrent updates to other fields are
        // kept because only the patched fields are written.
        let updated = Product::from(existing).apply_patch(&patch)?;
        let changes = patched_fields(&updated, &patch)?;
        if changes.is_empty() {
            return Ok(Some(updated));
        }

        let document = self
            .collection
            .find_one_and_update(filter, doc! { "$set": changes })
            .return_document(ReturnDocument::After)
            .await?;

        // `None` when deleted between the read and the write.
        if document.is_some() {
            tracing::info!(product_id = %id, "Product updated");
        }
        Ok(document.map(Product::from))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> ProductResult<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn ping(&self) -> ProductResult<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product() -> Product {
        Product {
            id: "0192-abc".to_string(),
            title: "Mate".to_string(),
            description: "Calabaza".to_string(),
            code: "M1".to_string(),
            price: 99.5,
            stock: 3,
            category: "bazar".to_string(),
            thumbnails: vec!["a.png".to_string()],
            status: true,
        }
    }

    #[test]
    fn test_document_stores_id_as_underscore_id() {
        let doc = bson::to_document(&ProductDocument::from(product())).unwrap();
        assert_eq!(doc.get_str("_id").unwrap(), "0192-abc");
        assert!(!doc.contains_key("id"));
    }

    #[test]
    fn test_document_conversion_preserves_fields() {
        let doc = bson::to_document(&ProductDocument::from(product())).unwrap();
        let back: ProductDocument = bson::from_document(doc).unwrap();
        assert_eq!(Product::from(back), product());
    }

    #[test]
    fn test_patched_fields_sets_only_named_fields() {
        let patch: ProductPatch =
            serde_json::from_value(json!({ "price": 120, "id": "other", "color": "red" })).unwrap();
        let merged = product().apply_patch(&patch).unwrap();

        let changes = patched_fields(&merged, &patch).unwrap();

        assert_eq!(changes, doc! { "price": 120.0 });
    }

    #[test]
    fn test_patched_fields_is_empty_for_ignored_keys() {
        let patch: ProductPatch = serde_json::from_value(json!({ "id": "other" })).unwrap();
        let merged = product().apply_patch(&patch).unwrap();

        assert!(patched_fields(&merged, &patch).unwrap().is_empty());
    }

    #[test]
    fn test_document_without_thumbnails_defaults_to_empty() {
        let doc = doc! {
            "_id": "x",
            "title": "t",
            "description": "d",
            "code": "c",
            "price": 1.0,
            "stock": 1_i64,
            "category": "k",
            "status": true,
        };
        let parsed: ProductDocument = bson::from_document(doc).unwrap();
        assert!(parsed.thumbnails.is_empty());
    }
}
