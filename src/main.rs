use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trainhub_api::cache::MemoryCache;
use trainhub_api::config::AppConfig;
use trainhub_api::database::{DatabaseManager, PgStorage};
use trainhub_api::mail::LogMailer;
use trainhub_api::{router, AppState};

#[derive(Parser)]
#[command(name = "trainhub-api")]
#[command(about = "Employee training backend")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Environment file to load before reading configuration
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Apply database migrations before serving
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // A missing env file is fine; the process environment still applies
    let _ = dotenvy::from_path(&args.env_file);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let mut config = AppConfig::from_env();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    info!(environment = ?config.environment, "starting trainhub-api");

    let db = DatabaseManager::connect(&config.database).context("database configuration")?;
    if args.migrate {
        db.migrate().await.context("running migrations")?;
    }

    let state = AppState::new(
        &config,
        Arc::new(PgStorage::new(db)),
        Arc::new(MemoryCache::new()),
        Arc::new(LogMailer),
    )
    .context("security configuration")?;
    let app = router(state, &config);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    info!(address = %bind_addr, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
