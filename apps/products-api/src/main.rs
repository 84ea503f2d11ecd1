//! Products API - REST server for the product catalog

use axum_helpers::server::{create_production_app, create_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_products::ProductService;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;
mod storage;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(
        store = %config.store.kind(),
        environment = ?config.environment,
        "Starting {} v{}",
        config.app.name,
        config.app.version
    );

    let (store, mongo_client) = storage::open_store(&config.store).await?;

    let state = AppState {
        config: config.clone(),
        products: ProductService::new(store),
    };

    let api_routes = api::routes(&state);
    let router = create_router::<openapi::ApiDoc>(api_routes, &config.server)?;
    let app = router.merge(api::health::router(state));

    create_production_app(app, &config.server, Duration::from_secs(30), async move {
        if let Some(client) = mongo_client {
            info!("Shutting down: closing MongoDB connections");
            client.shutdown().await;
            info!("MongoDB connection closed");
        }
    })
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Products API shutdown complete");
    Ok(())
}
