// PromptLens Backend Entry Point
// Growth vs dependency analysis for AI prompts

use anyhow::Context;
use promptlens_core::actors::LlmActorHandle;
use promptlens_core::config::AppConfig;
use promptlens_core::database::{self, SqliteUsageStore};
use promptlens_core::quota::{DailyQuota, InMemoryUsageStore, SystemClock, UsageStore};
use promptlens_core::server::{self, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        let subscriber = Registry::default()
            .with(filter)
            .with(JsonStorageLayer)
            .with(BunyanFormattingLayer::new("promptlens".into(), std::io::stdout));
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    Ok(())
}

async fn usage_store(config: &AppConfig) -> anyhow::Result<Arc<dyn UsageStore>> {
    match &config.database_url {
        Some(url) => {
            let pool = database::init_db(url)
                .await
                .with_context(|| format!("Failed to initialize database at {}", url))?;
            let store: Arc<dyn UsageStore> = Arc::new(SqliteUsageStore::new(pool));
            Ok(store)
        }
        None => {
            info!("DATABASE_URL not set; daily usage is kept in memory");
            let store: Arc<dyn UsageStore> = Arc::new(InMemoryUsageStore::new());
            Ok(store)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing()?;

    let config = AppConfig::from_env()?;
    if config.gemini_api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; prompts will be analyzed with the offline heuristic");
    }

    let llm = Arc::new(LlmActorHandle::new(config.gemini_settings()));
    let quota = DailyQuota::new(
        usage_store(&config).await?,
        Arc::new(SystemClock),
        config.session_daily_limit,
    );
    let state = AppState::new(llm, quota, config.remote_timeout());
    let app = server::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, model = %config.gemini_model, "PromptLens listening");

    axum::serve(listener, app).await?;
    Ok(())
}
