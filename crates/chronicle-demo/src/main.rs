//! Chronicle demo entry point.

use chronicle_demo::config::DemoConfig;
use chronicle_demo::error::AppError;
use chronicle_demo::lifecycle;
use tracing_subscriber::EnvFilter;

const COUNTER_INCREMENTS: i64 = 300;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = DemoConfig::from_env()?;
    tracing::info!(
        dialect = ?config.dialect,
        snapshot_every = config.snapshots.every_n_versions,
        "starting Chronicle demo"
    );

    let pool = lifecycle::connect(&config).await?;
    let report = lifecycle::run(&pool, &config, COUNTER_INCREMENTS).await?;

    tracing::info!(report = %serde_json::to_string(&report)?, "demo finished");
    Ok(())
}
