//! RepairHub API - repair services and device parts commerce backend.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repairhub::catalog::PgCatalog;
use repairhub::config::AppConfig;
use repairhub::db;
use repairhub::events::EventPublisher;
use repairhub::http::{self, AppState};
use repairhub::service::{CartService, WishlistService};
use repairhub::store::{PgCartStore, PgWishlistStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let db = db::connect(&config.database_url).await?;
    db::seed_default_roles(&db).await?;

    let events = match &config.nats_url {
        Some(url) => match async_nats::connect(url).await {
            Ok(client) => EventPublisher::new(client),
            Err(err) => {
                tracing::warn!(%err, "NATS unavailable, domain events disabled");
                EventPublisher::disabled()
            }
        },
        None => EventPublisher::disabled(),
    };

    let catalog = Arc::new(PgCatalog::new(db.clone()));
    let carts = CartService::new(catalog.clone(), Arc::new(PgCartStore::new(db.clone())));
    let wishlists = WishlistService::new(catalog, Arc::new(PgWishlistStore::new(db.clone())));

    let state = AppState { db, config: config.clone(), carts, wishlists, events };
    let app = http::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("🚀 RepairHub API listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}
