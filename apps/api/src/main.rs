use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use resume_aligner::alignment::history::{HistoryStore, InMemoryHistoryStore, RedisHistoryStore};
use resume_aligner::config::Config;
use resume_aligner::llm_client::{self, GeminiClient};
use resume_aligner::routes::build_router;
use resume_aligner::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "resume_aligner={level},api={level},tower_http={level}",
                level = &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume aligner API v{}", env!("CARGO_PKG_VERSION"));

    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; /align will answer MISSING_API_KEY");
    }

    let generator = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_api_base.clone(),
        config.attempt_timeout,
    )?;
    info!(
        "Generation client initialized (model: {}, attempt timeout: {:?})",
        llm_client::MODEL,
        config.attempt_timeout
    );

    let history: Arc<dyn HistoryStore> = match &config.redis_url {
        Some(url) => Arc::new(RedisHistoryStore::connect(url).await?),
        None => {
            warn!("REDIS_URL is not set; alignment history is kept in memory only");
            Arc::new(InMemoryHistoryStore::new())
        }
    };

    let state = AppState::new(Arc::new(generator), history);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
