use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use kuppi_api::config::{AppConfig, StoreBackend};
use kuppi_api::logging::init_logging;
use kuppi_api::services::notifier_from_config;
use kuppi_api::{build_router, AppState, Collaborators};
use kuppi_core::{GenerationBackend, SystemClock};
use kuppi_crypto::{KdfParams, PasswordHashing, TokenSigner};
use kuppi_db::{Database, MemoryStore, PoolConfig, Stores};
use kuppi_inference::{GeminiBackend, TesseractOcr};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _log_guard = init_logging();

    let config = AppConfig::from_env()?;
    info!(config = ?config, "Configuration loaded");

    let stores = match config.store_backend {
        StoreBackend::Postgres => {
            let db = Database::connect_with_config(&config.database_url, PoolConfig::from_env())
                .await
                .context("Failed to connect to PostgreSQL")?;
            db.migrate().await.context("Failed to run migrations")?;
            info!(subsystem = "database", "Migrations applied");
            db.stores()
        }
        StoreBackend::Memory => {
            tracing::warn!(
                subsystem = "database",
                "Using in-memory stores; all data is lost on restart"
            );
            Stores::in_memory(Arc::new(MemoryStore::new()))
        }
    };

    let generator = GeminiBackend::from_env()?;
    if !generator.is_configured() {
        tracing::warn!(
            subsystem = "inference",
            "GEMINI_API_KEY is not set; generation endpoints will fail"
        );
    }
    info!(subsystem = "inference", model = generator.model_name(), "Generation backend ready");

    let collaborators = Collaborators {
        notifier: notifier_from_config(&config.mail)?,
        generator: Arc::new(generator),
        ocr: Arc::new(TesseractOcr::from_env()),
        clock: Arc::new(SystemClock),
    };

    let hasher = PasswordHashing::new(&KdfParams::default())?;
    let tokens = Arc::new(TokenSigner::new(config.jwt_secret.as_bytes())?);
    let state = AppState::build(&config, stores, collaborators, hasher, tokens);
    let app = build_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
