use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serenity::client::{Client, Context, EventHandler};
use serenity::model::channel::Message;
use serenity::model::gateway::{GatewayIntents, Ready};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::commands;
use crate::config::Config;
use crate::pending::PendingReplies;
use crate::relay;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub pending: Mutex<PendingReplies>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let pending = PendingReplies::new(
            config.relay.pending_capacity,
            Duration::from_secs(config.relay.pending_ttl_secs),
        );
        Self {
            config,
            pending: Mutex::new(pending),
        }
    }
}

struct Handler {
    state: Arc<AppState>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Logged in as {} (ID: {})", ready.user.name, ready.user.id);
        info!("Connected to {} guild(s):", ready.guilds.len());
        for guild in &ready.guilds {
            info!("  - {}", guild.id);
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Ignore messages from bots, including our own confirmations.
        if msg.author.bot {
            return;
        }

        if let Err(err) = dispatch(&ctx, &msg, &self.state).await {
            error!("Error handling message {}: {:#}", msg.id, err);
            msg.channel_id
                .say(&ctx.http, "An error occurred. Please try again later.")
                .await
                .ok();
        }
    }
}

async fn dispatch(ctx: &Context, msg: &Message, state: &AppState) -> Result<()> {
    let is_dm = msg.guild_id.is_none();
    if is_dm {
        info!("DM received from {} (ID: {})", msg.author.name, msg.author.id);
    }

    let prefix = &state.config.discord.command_prefix;
    match commands::parse_invocation(&msg.content, prefix) {
        Some(("anon", args)) => {
            if !is_dm {
                msg.channel_id
                    .say(&ctx.http, "This command can only be used in DMs!")
                    .await?;
                return Ok(());
            }
            commands::run_anon(ctx, msg, state, args).await
        }
        // Everything else in a DM goes through the reply-relay listener.
        _ if is_dm => relay::handle_direct_message(ctx, msg, state).await,
        _ => Ok(()),
    }
}

/// Start the Discord bot
pub async fn run(config: Config) -> Result<()> {
    let token = config.token()?;
    let state = Arc::new(AppState::new(config));

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&token, intents)
        .event_handler(Handler { state })
        .await
        .context("Failed to create Discord client")?;

    client.start().await.context("Discord client error")?;

    Ok(())
}
