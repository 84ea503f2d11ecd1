//! Product store selection and startup connections

mod retry;

pub use retry::{retry_with_backoff, RetryPolicy};

use async_trait::async_trait;
use core_config::mongodb::MongoConfig;
use domain_products::{
    FileProductRepository, MongoProductRepository, NewProduct, Product, ProductPatch,
    ProductRepository, ProductResult,
};
use mongodb::{bson::doc, options::ClientOptions, Client};
use std::time::Duration;
use tracing::info;

use crate::config::StoreConfig;

/// The configured product store.
pub enum ProductStore {
    File(FileProductRepository),
    Mongodb(MongoProductRepository),
}

#[async_trait]
impl ProductRepository for ProductStore {
    async fn list(&self, limit: Option<usize>) -> ProductResult<Vec<Product>> {
        match self {
            ProductStore::File(repo) => repo.list(limit).await,
            ProductStore::Mongodb(repo) => repo.list(limit).await,
        }
    }

    async fn get_by_id(&self, id: &str) -> ProductResult<Option<Product>> {
        match self {
            ProductStore::File(repo) => repo.get_by_id(id).await,
            ProductStore::Mongodb(repo) => repo.get_by_id(id).await,
        }
    }

    async fn create(&self, input: NewProduct) -> ProductResult<Product> {
        match self {
            ProductStore::File(repo) => repo.create(input).await,
            ProductStore::Mongodb(repo) => repo.create(input).await,
        }
    }

    async fn update(&self, id: &str, patch: ProductPatch) -> ProductResult<Option<Product>> {
        match self {
            ProductStore::File(repo) => repo.update(id, patch).await,
            ProductStore::Mongodb(repo) => repo.update(id, patch).await,
        }
    }

    async fn delete(&self, id: &str) -> ProductResult<bool> {
        match self {
            ProductStore::File(repo) => repo.delete(id).await,
            ProductStore::Mongodb(repo) => repo.delete(id).await,
        }
    }

    async fn ping(&self) -> ProductResult<()> {
        match self {
            ProductStore::File(repo) => repo.ping().await,
            ProductStore::Mongodb(repo) => repo.ping().await,
        }
    }
}

/// Open the configured store.
///
/// The MongoDB client is returned alongside so `main` can release it on
/// shutdown.
pub async fn open_store(config: &StoreConfig) -> eyre::Result<(ProductStore, Option<Client>)> {
    match config {
        StoreConfig::File { path } => {
            let repo = FileProductRepository::open(path.clone()).await?;
            info!(path = %repo.path().display(), "Using JSON file product store");
            Ok((ProductStore::File(repo), None))
        }
        StoreConfig::Mongodb(mongo) => {
            let client = connect_mongo_with_retry(mongo, &RetryPolicy::default()).await?;
            let db = client.database(mongo.database());
            let repo = MongoProductRepository::with_collection(&db, &mongo.collection);
            info!(
                database = mongo.database(),
                collection = repo.collection_name(),
                "Using MongoDB product store"
            );
            Ok((ProductStore::Mongodb(repo), Some(client)))
        }
    }
}

/// Connect using a MongoConfig and verify the deployment answers a ping.
pub async fn connect_mongo(config: &MongoConfig) -> Result<Client, mongodb::error::Error> {
    info!("Attempting to connect to MongoDB at {}", config.url());

    let mut options = ClientOptions::parse(config.url()).await?;
    options.max_pool_size = Some(config.max_pool_size);
    options.min_pool_size = Some(config.min_pool_size);
    options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
    options.server_selection_timeout =
        Some(Duration::from_secs(config.server_selection_timeout_secs));
    if let Some(ref app_name) = config.app_name {
        options.app_name = Some(app_name.clone());
    }

    let client = Client::with_options(options)?;
    client
        .database(config.database())
        .run_command(doc! { "ping": 1 })
        .await?;

    info!("Successfully connected to MongoDB");
    Ok(client)
}

pub async fn connect_mongo_with_retry(
    config: &MongoConfig,
    policy: &RetryPolicy,
) -> Result<Client, mongodb::error::Error> {
    retry_with_backoff(|| connect_mongo(config), policy).await
}
