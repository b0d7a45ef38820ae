//! Skinwatch binary: run the price monitor until interrupted

use skinwatch::AppState;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skinwatch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting skinwatch...");

    let data_dir = std::env::var("SKINWATCH_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./data"));

    let state = AppState::new(&data_dir)?;
    state.monitor.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    state.monitor.stop();

    Ok(())
}
