//! Command dispatcher
//!
//! Routes every inbound message to at most one command or trigger, after the
//! permission gate and the user's token bucket agreed. Observers see every
//! message and membership event. Handler errors and panics are contained per
//! invocation.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::anyhow;
use futures::FutureExt;
use log::{debug, info, warn};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::task::task_tracker::TaskTrackerToken;
use tokio_util::task::TaskTracker;
use uuid::Uuid;

use super::context::CommandContext;
use super::error::DispatchError;
use super::handler::Module;
use super::message::{InboundMessage, MemberEvent};
use super::registry::{CommandRegistry, EntryKind};
use crate::core::config::{Config, DEFAULT_PREFIX};
use crate::core::report::{ErrorReporter, ReportContext};
use crate::core::settings::GuildSettings;
use crate::features::permissions::PermissionGate;

/// Keys one command or trigger costs
pub const COMMAND_COST: u32 = 1;

pub const RATE_LIMIT_NOTICE: &str = "You're sending commands too quickly! Please slow down.";

/// What happened to a message or routing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The handler ran to completion
    Executed,
    /// Not addressed to the bot (no prefix, or commands off for the guild)
    Ignored,
    /// No command or trigger with that name
    NotFound,
    /// The permission gate vetoed the module
    Denied,
    /// Not enough keys in the user's bucket
    RateLimited,
    /// The handler returned an error or panicked
    Failed,
    /// The dispatcher no longer accepts work
    ShuttingDown,
}

/// Message front-end settings
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub default_prefix: String,
    pub guild_prefixes: HashMap<String, String>,
    pub throttle_on_empty: bool,
    pub rate_limit_notice: bool,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            default_prefix: DEFAULT_PREFIX.to_string(),
            guild_prefixes: HashMap::new(),
            throttle_on_empty: false,
            rate_limit_notice: false,
        }
    }
}

impl DispatchSettings {
    pub fn from_config(config: &Config, guilds: &GuildSettings) -> Self {
        Self {
            default_prefix: config.command_prefix.clone(),
            guild_prefixes: guilds.prefixes.clone(),
            throttle_on_empty: config.throttle_on_empty,
            rate_limit_notice: config.rate_limit_notice,
        }
    }

    pub fn prefix_for(&self, guild_id: Option<&str>) -> &str {
        guild_id
            .and_then(|id| self.guild_prefixes.get(id))
            .map(String::as_str)
            .unwrap_or(&self.default_prefix)
    }
}

#[derive(Clone, Copy)]
enum Observed<'e> {
    Message {
        content: &'e str,
        msg: &'e InboundMessage,
    },
    MemberAdd(&'e MemberEvent),
    MemberRemove(&'e MemberEvent),
}

impl Observed<'_> {
    fn stage(&self) -> &'static str {
        match self {
            Observed::Message { .. } => "on_message",
            Observed::MemberAdd(_) => "on_member_add",
            Observed::MemberRemove(_) => "on_member_remove",
        }
    }

    fn report_context(&self, module: &str) -> ReportContext {
        let context = ReportContext::new(module, self.stage());
        match self {
            Observed::Message { msg, .. } => context.with_message(msg),
            Observed::MemberAdd(event) | Observed::MemberRemove(event) => {
                context.with_guild(&event.guild_id)
            }
        }
    }
}

/// Owns the registry and routes messages to modules
///
/// Constructed once by [`Dispatcher::init`]; only a fully initialized
/// dispatcher exists, so routing never sees a partial registry.
pub struct Dispatcher {
    registry: CommandRegistry,
    ctx: CommandContext,
    permissions: Arc<dyn PermissionGate>,
    reporter: Arc<dyn ErrorReporter>,
    settings: DispatchSettings,
    in_flight: TaskTracker,
}

impl Dispatcher {
    /// Register all modules and run their initializers
    ///
    /// A duplicate name fails before any initializer runs.
    pub async fn init(
        modules: Vec<Arc<dyn Module>>,
        ctx: CommandContext,
        permissions: Arc<dyn PermissionGate>,
        reporter: Arc<dyn ErrorReporter>,
        settings: DispatchSettings,
    ) -> Result<Self, DispatchError> {
        let registry = CommandRegistry::build(modules)?;
        let mut ctx = ctx;
        ctx.catalog = Arc::new(registry.catalog());

        for module in registry.modules() {
            module
                .init(&ctx)
                .await
                .map_err(|e| DispatchError::InitFailed {
                    module: module.name(),
                    reason: format!("{e:#}"),
                })?;
        }

        info!(
            "🔌 Initializer finished. Loaded {} modules ({} commands, {} triggers, {} observers)",
            registry.modules().len(),
            registry.names(EntryKind::Command).len(),
            registry.names(EntryKind::Trigger).len(),
            registry.observers().len()
        );

        Ok(Self {
            registry,
            ctx,
            permissions,
            reporter,
            settings,
            in_flight: TaskTracker::new(),
        })
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn context(&self) -> &CommandContext {
        &self.ctx
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    pub fn is_shutting_down(&self) -> bool {
        self.in_flight.is_closed()
    }

    // The token is taken before the check so a concurrent shutdown either
    // rejects us or waits for us.
    fn enter(&self) -> Option<TaskTrackerToken> {
        let token = self.in_flight.token();
        if self.in_flight.is_closed() {
            return None;
        }
        Some(token)
    }

    /// Entry point for every non-bot message
    pub async fn handle_message(&self, msg: &InboundMessage) -> Dispatch {
        let Some(_token) = self.enter() else {
            return Dispatch::ShuttingDown;
        };

        let request_id = Uuid::new_v4();
        debug!(
            "[{}] 📥 Message received | User: {} | Channel: {} | Guild: {} | Content: '{}'",
            request_id,
            msg.author_id,
            msg.channel_id,
            msg.guild_id.as_deref().unwrap_or("DM"),
            msg.content.chars().take(100).collect::<String>()
        );

        self.notify_observers(Observed::Message {
            content: msg.content.trim(),
            msg,
        })
        .await;

        let prefix = self.settings.prefix_for(msg.guild_id.as_deref());
        if prefix.is_empty() {
            return Dispatch::Ignored;
        }
        let Some(rest) = msg.content.strip_prefix(prefix) else {
            return Dispatch::Ignored;
        };
        let (name, content) = split_command(rest);
        if name.is_empty() {
            return Dispatch::Ignored;
        }

        if self.settings.throttle_on_empty
            && !self.ctx.is_bot_admin(&msg.author_id)
            && self.ctx.buckets.cool_down_if_empty(&msg.author_id)
        {
            warn!(
                "[{request_id}] 🧊 User {} keeps commanding with an empty bucket, cooling down",
                msg.author_id
            );
            self.ctx.stats.record_rate_limited();
            self.notify_rate_limited(msg).await;
            return Dispatch::RateLimited;
        }

        let outcome = match self.registry.get(name).map(|entry| entry.kind) {
            Some(EntryKind::Command) => self.run_command(name, content, msg).await,
            Some(EntryKind::Trigger) => self.run_trigger(name, content, msg).await,
            None => Dispatch::NotFound,
        };

        debug!("[{request_id}] {name} -> {outcome:?}");
        outcome
    }

    /// Run a command for a message
    ///
    /// Permission gate first (a veto costs no keys), then one key from the
    /// author's bucket, then the handler inside an isolation boundary.
    pub async fn route(&self, command: &str, content: &str, msg: &InboundMessage) -> Dispatch {
        let Some(_token) = self.enter() else {
            return Dispatch::ShuttingDown;
        };
        self.run_command(command, content, msg).await
    }

    /// Answer a trigger phrase in the originating channel
    ///
    /// Triggers draw from the same buckets as commands.
    pub async fn route_trigger(
        &self,
        trigger: &str,
        content: &str,
        msg: &InboundMessage,
    ) -> Dispatch {
        let Some(_token) = self.enter() else {
            return Dispatch::ShuttingDown;
        };
        self.run_trigger(trigger, content, msg).await
    }

    // Callers hold an in-flight token.
    async fn run_command(&self, command: &str, content: &str, msg: &InboundMessage) -> Dispatch {
        let Some(module) = self.registry.command(command) else {
            return Dispatch::NotFound;
        };
        let Some(handler) = module.as_command() else {
            return Dispatch::NotFound;
        };

        if !self
            .permissions
            .is_allowed(&msg.channel_id, &msg.id, &msg.author_id, module.name())
            .await
        {
            self.ctx.stats.record_denied();
            return Dispatch::Denied;
        }

        if !self.admit(msg).await {
            return Dispatch::RateLimited;
        }

        self.ctx.stats.record_command();
        info!(
            "⚙️ {} ({}) -> {} in channel {}",
            command,
            module.name(),
            msg.author_id,
            msg.channel_id
        );

        let completed = self
            .isolate(handler.action(command, content, msg, &self.ctx), || {
                ReportContext::new(module.name(), "action").with_message(msg)
            })
            .await;

        if completed {
            Dispatch::Executed
        } else {
            Dispatch::Failed
        }
    }

    async fn run_trigger(&self, trigger: &str, content: &str, msg: &InboundMessage) -> Dispatch {
        let Some(module) = self.registry.trigger(trigger) else {
            return Dispatch::NotFound;
        };
        let Some(handler) = module.as_trigger() else {
            return Dispatch::NotFound;
        };

        if !self.admit(msg).await {
            return Dispatch::RateLimited;
        }

        let response =
            std::panic::catch_unwind(AssertUnwindSafe(|| handler.response(trigger, content)))
                .map_err(|panic| anyhow!("panicked: {}", panic_message(panic.as_ref())));

        let text = match response {
            Ok(text) => text,
            Err(e) => {
                self.fault(
                    &e,
                    &ReportContext::new(module.name(), "response").with_message(msg),
                );
                return Dispatch::Failed;
            }
        };

        if text.trim().is_empty() {
            return Dispatch::Executed;
        }

        let sent = self
            .isolate(self.ctx.say(&msg.channel_id, &text), || {
                ReportContext::new(module.name(), "reply").with_message(msg)
            })
            .await;

        if sent {
            Dispatch::Executed
        } else {
            Dispatch::Failed
        }
    }

    /// Show a message to every observer, in declaration order
    ///
    /// Not rate limited. Returns how many observers completed without fault.
    pub async fn broadcast(&self, content: &str, msg: &InboundMessage) -> usize {
        self.broadcast_gated(Observed::Message {
            content: content.trim(),
            msg,
        })
        .await
    }

    pub async fn broadcast_member_join(&self, event: &MemberEvent) -> usize {
        self.broadcast_gated(Observed::MemberAdd(event)).await
    }

    pub async fn broadcast_member_leave(&self, event: &MemberEvent) -> usize {
        self.broadcast_gated(Observed::MemberRemove(event)).await
    }

    async fn broadcast_gated(&self, event: Observed<'_>) -> usize {
        let Some(_token) = self.enter() else {
            return 0;
        };
        self.notify_observers(event).await
    }

    // Callers hold an in-flight token.
    async fn notify_observers(&self, event: Observed<'_>) -> usize {
        let mut delivered = 0;
        for module in self.registry.observers() {
            let Some(observer) = module.as_observer() else {
                continue;
            };

            let call = match event {
                Observed::Message { content, msg } => observer.on_message(content, msg, &self.ctx),
                Observed::MemberAdd(member) => observer.on_member_add(member, &self.ctx),
                Observed::MemberRemove(member) => observer.on_member_remove(member, &self.ctx),
            };

            if self
                .isolate(call, || event.report_context(module.name()))
                .await
            {
                delivered += 1;
            }
        }
        delivered
    }

    /// Stop accepting work, wait for in-flight invocations, uninit modules
    pub async fn shutdown(&self) {
        self.in_flight.close();
        info!(
            "🛑 Dispatcher draining {} in-flight invocations",
            self.in_flight.len()
        );
        self.in_flight.wait().await;

        for module in self.registry.modules() {
            self.isolate(module.uninit(&self.ctx), || {
                ReportContext::new(module.name(), "uninit")
            })
            .await;
        }
        info!("🛑 Dispatcher stopped");
    }

    // Admins bypass the buckets entirely.
    async fn admit(&self, msg: &InboundMessage) -> bool {
        if self.ctx.is_bot_admin(&msg.author_id) {
            return true;
        }

        match self.ctx.buckets.drain(COMMAND_COST, &msg.author_id) {
            Ok(()) => true,
            Err(e) => {
                debug!("🚫 {e}");
                self.ctx.stats.record_rate_limited();
                self.notify_rate_limited(msg).await;
                false
            }
        }
    }

    async fn notify_rate_limited(&self, msg: &InboundMessage) {
        if !self.settings.rate_limit_notice {
            return;
        }
        if let Err(e) = self.ctx.say(&msg.channel_id, RATE_LIMIT_NOTICE).await {
            warn!("Failed to send rate limit notice: {e}");
        }
    }

    /// Await a handler future, turning errors and panics into reports
    async fn isolate<F, C>(&self, call: F, context: C) -> bool
    where
        F: Future<Output = anyhow::Result<()>>,
        C: FnOnce() -> ReportContext,
    {
        let error = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(Ok(())) => return true,
            Ok(Err(e)) => e,
            Err(panic) => anyhow!("panicked: {}", panic_message(panic.as_ref())),
        };
        self.fault(&error, &context());
        false
    }

    fn fault(&self, error: &anyhow::Error, context: &ReportContext) {
        self.ctx.stats.record_fault();
        self.reporter.report(error, context);
    }
}

/// Split `name rest of the text` after the prefix
fn split_command(rest: &str) -> (&str, &str) {
    match rest.split_once(char::is_whitespace) {
        Some((name, content)) => (name, content.trim()),
        None => (rest.trim_end(), ""),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
