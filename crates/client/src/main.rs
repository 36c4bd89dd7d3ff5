//! Terminal driver for the gacha bot.
//!
//! Composition root: loads configuration, installs file logging, builds the
//! runtime with an in-process ticket ledger, seeds the guild from the content
//! directory and hands stdin to [`app::CliApp`].
//!
//! ```bash
//! GACHA_CONTENT_DIR=data GACHA_USER_ID=42 cargo run -p gacha-bot
//! ```

mod app;
mod commands;
mod config;
mod logging;
mod render;

use std::sync::Arc;

use anyhow::Result;
use gacha_runtime::{LedgerEconomy, Runtime, RuntimeConfig};

use crate::app::CliApp;
use crate::config::CliConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // 1. Load configuration from environment
    let cli_config = CliConfig::from_env();
    let mut runtime_config = RuntimeConfig::from_env();
    if runtime_config.data_dir.is_none() {
        runtime_config.data_dir = Some(cli_config.records_dir.clone());
    }

    // 2. Setup logging
    let _guard = logging::setup_logging(&cli_config.log_dir)?;
    tracing::info!("Starting gacha terminal");
    tracing::info!("Guild: {}, user: {}", cli_config.guild, cli_config.user);
    tracing::info!("Records: {:?}", runtime_config.data_dir);

    // 3. Build the runtime
    let economy = Arc::new(LedgerEconomy::new());
    let runtime = Runtime::builder()
        .config(runtime_config)
        .economy(economy.clone())
        .build()
        .await?;
    tracing::info!("Runtime built successfully");

    // 4. Seed and run the terminal
    let app = CliApp::new(runtime.handle(), economy, cli_config);
    app.seed()?;
    let outcome = app.run().await;

    runtime.shutdown().await?;
    tracing::info!("Gacha terminal stopped");
    outcome
}
