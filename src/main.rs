use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use order_assistant::bot::{TelegramSender, TurnOrchestrator, WebhookState};
use order_assistant::catalog::CatalogReader;
use order_assistant::config::AppConfig;
use order_assistant::confirmation::ConfirmationEngine;
use order_assistant::db;
use order_assistant::draft::DraftBook;
use order_assistant::intent::KeywordClassifier;
use order_assistant::oracle::GeminiOracle;
use order_assistant::server;
use order_assistant::store::PgStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "order_assistant=info,tower_http=info".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    info!("Starting order assistant");

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to the database")?;

    db::init_database_schema(&pool).await?;

    let store = Arc::new(PgStore::new(pool.clone()));
    let drafts = Arc::new(DraftBook::new());
    let classifier = Arc::new(KeywordClassifier::new(
        &config.turn.confirm_keyword,
        &config.turn.cancel_keyword,
    ));
    let engine = ConfirmationEngine::new(store.clone(), classifier, drafts);
    let oracle = Arc::new(
        GeminiOracle::new(config.oracle.clone()).context("Invalid oracle settings")?,
    );

    let orchestrator = TurnOrchestrator::new(
        store.clone(),
        CatalogReader::new(store),
        oracle,
        engine,
        config.turn.clone(),
    );

    let webhook_state = WebhookState {
        orchestrator: Arc::new(orchestrator),
        sender: Arc::new(TelegramSender::new(Bot::new(&config.telegram_bot_token))),
    };

    let app = server::build_app(pool, webhook_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
