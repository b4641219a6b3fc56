mod bot;
mod commands;
mod config;
mod gateway;
mod links;
mod pending;
mod relay;
mod resolver;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,relaybot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Command prefix: {}", config.discord.command_prefix);
    match config.discord.guild_id {
        Some(id) => info!("  Guild: {}", id),
        None => info!("  Guild: first joined guild"),
    }
    info!(
        "  Pending replies: capacity {}, ttl {}s",
        config.relay.pending_capacity, config.relay.pending_ttl_secs
    );

    // Run the Discord bot
    info!("Bot is starting...");
    bot::run(config).await?;

    Ok(())
}
