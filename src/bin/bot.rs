use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::model::guild::Member;
use serenity::model::id::GuildId;
use serenity::model::user::User;
use serenity::prelude::*;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use hearth::commands::{create_all_modules, CommandContext, DispatchSettings, Dispatcher};
use hearth::core::{Config, GuildSettings, LogReporter};
use hearth::features::{AllowAll, BucketContainer, ModulePermissions, PermissionGate};
use hearth::gateway::{inbound_message, member_event, SerenityReplySink};

struct Handler {
    // Set once the dispatcher finished initializing; events before that are dropped
    dispatcher: Arc<OnceCell<Arc<Dispatcher>>>,
}

impl Handler {
    fn dispatcher(&self) -> Option<&Arc<Dispatcher>> {
        self.dispatcher.get()
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, _ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(dispatcher) = self.dispatcher() else {
            return;
        };

        dispatcher.handle_message(&inbound_message(&msg)).await;
    }

    async fn guild_member_addition(&self, _ctx: Context, new_member: Member) {
        if let Some(dispatcher) = self.dispatcher() {
            dispatcher
                .broadcast_member_join(&member_event(new_member.guild_id, &new_member.user))
                .await;
        }
    }

    async fn guild_member_removal(
        &self,
        _ctx: Context,
        guild_id: GuildId,
        user: User,
        _member_data_if_available: Option<Member>,
    ) {
        if let Some(dispatcher) = self.dispatcher() {
            dispatcher
                .broadcast_member_leave(&member_event(guild_id, &user))
                .await;
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🔗 Gateway session ID: {:?}", ready.session_id);
        info!("🤖 Bot ID: {}", ready.user.id);

        if let Some(shard) = ready.shard {
            info!("⚡ Shard: {}/{}", shard[0] + 1, shard[1]);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting Hearth Discord Bot...");

    let guild_settings = GuildSettings::load_or_default(&config.guild_settings_path)
        .map_err(|e| {
            error!(
                "❌ Failed to load guild settings from {}: {e}",
                config.guild_settings_path
            );
            e
        })?;
    info!(
        "📄 Guild settings: {} prefix overrides, {} permission rules",
        guild_settings.prefixes.len(),
        guild_settings.disabled.len()
    );

    let dispatcher_cell = Arc::new(OnceCell::new());
    let handler = Handler {
        dispatcher: Arc::clone(&dispatcher_cell),
    };

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    let buckets = Arc::new(BucketContainer::new());
    let ctx = CommandContext::new(
        Arc::new(SerenityReplySink::new(client.cache_and_http.http.clone())),
        Arc::clone(&buckets),
        config.bot_admins.clone(),
    );

    let permissions: Arc<dyn PermissionGate> = if guild_settings.disabled.is_empty() {
        Arc::new(AllowAll)
    } else {
        Arc::new(ModulePermissions::new(guild_settings.disabled.clone()))
    };

    // Duplicate names or a failing initializer stop the bot before it connects
    let dispatcher = Arc::new(
        Dispatcher::init(
            create_all_modules(&config),
            ctx,
            permissions,
            Arc::new(LogReporter),
            DispatchSettings::from_config(&config, &guild_settings),
        )
        .await?,
    );

    for rule in &guild_settings.disabled {
        if !dispatcher.registry().has_module(&rule.module) {
            warn!("⚠️ Permission rule for unknown module '{}'", rule.module);
        }
    }

    dispatcher_cell
        .set(Arc::clone(&dispatcher))
        .map_err(|_| anyhow::anyhow!("Dispatcher initialized twice"))?;

    let shutdown = CancellationToken::new();

    let refiller = {
        let buckets = Arc::clone(&buckets);
        let shutdown = shutdown.clone();
        tokio::spawn(async move { buckets.run_refiller(shutdown).await })
    };

    let shard_manager = client.shard_manager.clone();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    if let Err(e) = signal {
                        error!("Failed to listen for Ctrl-C: {e}");
                        return;
                    }
                    info!("🛑 Ctrl-C received, shutting down...");
                }
                _ = shutdown.cancelled() => return,
            }
            shard_manager.lock().await.shutdown_all().await;
        });
    }

    info!("Bot configured successfully. Connecting to Discord gateway...");
    info!("Gateway intents: {intents:?}");

    let result = client.start().await;

    dispatcher.shutdown().await;
    shutdown.cancel();
    if let Err(e) = refiller.await {
        error!("Refiller task failed: {e}");
    }

    if let Err(why) = result {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    info!("👋 Bye");
    Ok(())
}
