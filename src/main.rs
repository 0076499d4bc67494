use std::net::SocketAddr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use srs_ledger::api::{self, AppState};
use srs_ledger::bootstrap::SeedSnapshot;
use srs_ledger::config::AppConfig;
use srs_ledger::contract::RecordsContract;
use srs_ledger::ledger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "srs_ledger=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SRS ledger");

    let config = AppConfig::load()?;
    info!("Configuration loaded ({:?} backend)", config.ledger_backend);

    let store = ledger::open(&config).await?;

    let seed = match &config.seed_path {
        Some(path) => SeedSnapshot::from_path(Path::new(path))?,
        None => SeedSnapshot::builtin()?,
    };

    let contract = RecordsContract::new(store).with_submission_audit(config.audit.record_submissions);
    let app = api::router(AppState::new(contract, seed));

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
