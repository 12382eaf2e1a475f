use std::sync::Arc;

use anyhow::Context;
use tokio::sync::broadcast;

mod analytics;
mod auth;
mod config;
mod db;
mod dto;
mod error;
mod handlers;
mod models;
mod routes;
mod services;

use auth::rate_limit::RateLimitState;
use config::Config;
use db::{memory::MemoryStore, postgres::PgStore, MoodStore, SettingsStore, UserStore};
use dto::LiveEvent;

#[derive(Clone)]
pub struct AppState {
    pub moods: Arc<dyn MoodStore>,
    pub users: Arc<dyn UserStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub config: Arc<Config>,
    pub ws_tx: broadcast::Sender<LiveEvent>,
    pub rate_limiter: RateLimitState,
}

impl AppState {
    pub fn new<S>(store: Arc<S>, config: Config) -> Self
    where
        S: MoodStore + UserStore + SettingsStore + 'static,
    {
        let (ws_tx, _) = broadcast::channel::<LiveEvent>(256);
        Self {
            moods: store.clone(),
            users: store.clone(),
            settings: store,
            config: Arc::new(config),
            ws_tx,
            rate_limiter: RateLimitState::new(),
        }
    }

    #[cfg(test)]
    pub fn for_tests<S>(store: Arc<S>) -> Self
    where
        S: MoodStore + UserStore + SettingsStore + 'static,
    {
        Self::new(store, Config::for_tests())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodjournal_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Config::from_env()?;

    let state = match config.database_url.as_deref() {
        Some(database_url) => {
            let db = db::create_pool(database_url)
                .await
                .context("Failed to create database pool")?;
            sqlx::migrate!("./migrations")
                .run(&db)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");
            AppState::new(Arc::new(PgStore::new(db)), config)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, entries are kept in memory only");
            AppState::new(Arc::new(MemoryStore::new()), config)
        }
    };

    auth::rate_limit::spawn_cleanup_task(state.rate_limiter.clone());

    let addr = state.config.listen_addr();
    let app = routes::build_router(state)?;

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    // Connect info gives the rate limiter the client IP.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
