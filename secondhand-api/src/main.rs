use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use secondhand_api::{app, AppState};
use secondhand_offer::OfferLedger;
use secondhand_shared::models::OfferEvent;
use secondhand_store::app_config::Config;
use secondhand_store::{DbClient, PgOfferRepository, PgProductGate, PgProfileDirectory, RedisClient};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "secondhand_api=debug,secondhand_offer=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Secondhand API on port {}", config.server.port);

    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    if config.database.run_migrations {
        db.migrate().await.context("Failed to run migrations")?;
    }

    let products = Arc::new(PgProductGate::new(db.pool.clone()));
    let profiles = Arc::new(PgProfileDirectory::new(db.pool.clone()));
    let ledger = OfferLedger::new(
        Arc::new(PgOfferRepository::new(db.pool.clone())),
        products.clone(),
        profiles.clone(),
    );
    tokio::spawn(log_offer_events(ledger.subscribe()));

    let mut app_state = AppState::new(
        ledger,
        products.clone(),
        products,
        profiles,
        config.auth.clone(),
    );

    match &config.redis {
        Some(redis) => match RedisClient::new(&redis.url).await {
            Ok(client) => {
                app_state = app_state.with_rate_limit(Arc::new(client), config.rate_limit.clone());
            }
            Err(e) => tracing::warn!("Redis unavailable, rate limiting disabled: {}", e),
        },
        None => tracing::info!("No Redis configured, rate limiting disabled"),
    }

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Audit trail of offer transitions.
async fn log_offer_events(mut rx: broadcast::Receiver<OfferEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(payload) => tracing::info!(event = event.name(), "{}", payload),
                Err(e) => tracing::warn!("Failed to encode {} event: {}", event.name(), e),
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Offer event log lagged, skipped {} events", skipped)
            }
            Err(RecvError::Closed) => break,
        }
    }
}
