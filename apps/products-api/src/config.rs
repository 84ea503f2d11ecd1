//! Configuration for Products API

use core_config::{
    app_info, env_or_default, env_parse_or, mongodb::MongoConfig, server::ServerConfig, AppInfo,
    ConfigError, FromEnv,
};
use std::path::PathBuf;
use strum::{Display, EnumString};

pub use core_config::Environment;

/// Backing store for the catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreKind {
    File,
    #[strum(to_string = "mongodb", serialize = "mongo")]
    Mongodb,
}

#[derive(Clone, Debug)]
pub enum StoreConfig {
    File { path: PathBuf },
    Mongodb(MongoConfig),
}

impl StoreConfig {
    pub fn kind(&self) -> StoreKind {
        match self {
            StoreConfig::File { .. } => StoreKind::File,
            StoreConfig::Mongodb(_) => StoreKind::Mongodb,
        }
    }
}

impl FromEnv for StoreConfig {
    /// Environment variables:
    /// - `PRODUCTS_STORE`: `file` (default) or `mongodb`
    /// - `PRODUCTS_FILE`: catalog path for the file store (default: data/products.json)
    /// - MongoDB settings, see [`MongoConfig`], when the store is `mongodb`
    fn from_env() -> Result<Self, ConfigError> {
        match env_parse_or("PRODUCTS_STORE", StoreKind::File)? {
            StoreKind::File => Ok(StoreConfig::File {
                path: PathBuf::from(env_or_default(
                    "PRODUCTS_FILE",
                    domain_products::file::DEFAULT_PRODUCTS_FILE,
                )),
            }),
            StoreKind::Mongodb => Ok(StoreConfig::Mongodb(MongoConfig::from_env()?)),
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub store: StoreConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut store = StoreConfig::from_env()?;
        if let StoreConfig::Mongodb(mongo) = &mut store {
            mongo.app_name.get_or_insert_with(|| env!("CARGO_PKG_NAME").to_string());
        }

        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            store,
        })
    }
}
