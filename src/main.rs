use anyhow::{Context, Result};
use config::{Config, StoreBackend};
use dotenvy::dotenv;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod components;
mod config;
mod controllers;
mod crypto;
mod db_ops;
mod errors;
mod export;
mod extractors;
mod line;
mod middleware;
mod models;
mod parser;
mod richmenu;
mod routes;
mod summary;
mod webhook;


#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    let config = Config::from_env()?;
    let store: Arc<dyn db_ops::Store> = match config.store {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set")?;
            Arc::new(db_ops::PgStore::connect(url).await?)
        }
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on restart");
            Arc::new(db_ops::MemStore::default())
        }
    };
    if config.line_channel_access_token.is_none() {
        tracing::warn!("LINE_CHANNEL_ACCESS_TOKEN is not set; LINE calls will fail");
    }
    let line = Arc::new(line::LineClient::new(
        config.line_channel_access_token.clone().unwrap_or_default(),
    ));

    let addr = config.bind_addr;
    let state = models::AppState {
        store,
        line,
        config: Arc::new(config),
    };
    let app = routes::get_routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("listening on {}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
