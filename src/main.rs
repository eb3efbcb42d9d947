//! House Price - Main Entry Point
//!
//! Prediction API server plus training and model staging commands.

use clap::Parser;
use house_price::cli::{run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "house_price=info,tower_http=info".into()),
        )
        .init();

    run(Cli::parse()).await
}
