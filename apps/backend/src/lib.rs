pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wordmatch_core::GameSettings;

use crate::config::AppConfig;
use crate::db::SqliteMasteryStore;
use crate::services::llm::LlmClient;
use crate::services::rounds::RoundRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SqliteMasteryStore>,
    pub rounds: Arc<RoundRegistry>,
    pub llm: Arc<LlmClient>,
    pub settings: GameSettings,
}

impl AppState {
    pub fn new(store: SqliteMasteryStore, llm: LlmClient, settings: GameSettings) -> Self {
        Self {
            store: Arc::new(store),
            rounds: Arc::new(RoundRegistry::new()),
            llm: Arc::new(llm),
            settings,
        }
    }
}

/// Build the HTTP router for the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Round routes
        .route("/api/rounds", post(routes::rounds::start))
        .route("/api/rounds/remedial", post(routes::rounds::start_remedial))
        .route(
            "/api/rounds/:id",
            get(routes::rounds::get).delete(routes::rounds::delete),
        )
        .route("/api/rounds/:id/flip", post(routes::rounds::flip))
        .route("/api/rounds/:id/tick", post(routes::rounds::tick))
        .route("/api/rounds/:id/finish", post(routes::rounds::finish))
        .route("/api/rounds/:id/retire", post(routes::rounds::retire))
        .route("/api/rounds/:id/graduation", post(routes::rounds::graduation))
        .route("/api/rounds/:id/story", post(routes::rounds::story))
        // Mastery routes
        .route("/api/mastery", get(routes::mastery::list))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.database_path.display(), "Opening mastery database...");
    let store = SqliteMasteryStore::open(&config.database_path)?;

    let llm = LlmClient::new(config.llm.clone());
    if !llm.is_available() {
        tracing::warn!("LLM_API_KEY not set, using built-in words and fallback stories");
    }

    let state = AppState::new(store, llm, config.game.clone());
    let app = router(state);

    let addr = config.addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
