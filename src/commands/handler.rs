//! Module capability traits
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Split into command, trigger and observer capabilities behind `Module`
//! - 1.0.0: Initial implementation for modular command handling

use anyhow::Result;
use async_trait::async_trait;

use super::context::CommandContext;
use super::message::{InboundMessage, MemberEvent};

/// A unit of bot functionality
///
/// A module implements any combination of [`CommandHandler`],
/// [`TriggerHandler`] and [`EventObserver`] and exposes them through the
/// `as_*` accessors. The dispatcher discovers capabilities once, at
/// registration.
///
/// # Example
///
/// ```ignore
/// pub struct Ping;
///
/// impl Module for Ping {
///     fn name(&self) -> &'static str {
///         "ping"
///     }
///
///     fn as_command(&self) -> Option<&dyn CommandHandler> {
///         Some(self)
///     }
/// }
///
/// #[async_trait]
/// impl CommandHandler for Ping {
///     fn command_names(&self) -> &'static [&'static str] {
///         &["ping"]
///     }
///
///     async fn action(
///         &self,
///         _command: &str,
///         _content: &str,
///         msg: &InboundMessage,
///         ctx: &CommandContext,
///     ) -> Result<()> {
///         ctx.say(&msg.channel_id, "Pong!").await
///     }
/// }
/// ```
#[async_trait]
pub trait Module: Send + Sync {
    /// Module id, also used for permission checks
    fn name(&self) -> &'static str;

    /// One-time initializer, called before any message is routed
    async fn init(&self, _ctx: &CommandContext) -> Result<()> {
        Ok(())
    }

    /// Called once during graceful shutdown, after in-flight work finished
    async fn uninit(&self, _ctx: &CommandContext) -> Result<()> {
        Ok(())
    }

    fn as_command(&self) -> Option<&dyn CommandHandler> {
        None
    }

    fn as_trigger(&self) -> Option<&dyn TriggerHandler> {
        None
    }

    fn as_observer(&self) -> Option<&dyn EventObserver> {
        None
    }
}

/// Explicit prefixed commands
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name(s) this handler processes
    fn command_names(&self) -> &'static [&'static str];

    /// Handle the command
    ///
    /// # Arguments
    ///
    /// * `command` - The matched command name
    /// * `content` - Message text after the command, trimmed
    /// * `msg` - The originating message
    /// * `ctx` - Session handle
    async fn action(
        &self,
        command: &str,
        content: &str,
        msg: &InboundMessage,
        ctx: &CommandContext,
    ) -> Result<()>;
}

/// Canned replies to trigger phrases
pub trait TriggerHandler: Send + Sync {
    fn triggers(&self) -> &'static [&'static str];

    /// Compute the reply. Must not have side effects.
    fn response(&self, trigger: &str, content: &str) -> String;
}

/// Passive observer of every message and membership event
#[async_trait]
pub trait EventObserver: Send + Sync {
    async fn on_message(
        &self,
        _content: &str,
        _msg: &InboundMessage,
        _ctx: &CommandContext,
    ) -> Result<()> {
        Ok(())
    }

    async fn on_member_add(&self, _event: &MemberEvent, _ctx: &CommandContext) -> Result<()> {
        Ok(())
    }

    async fn on_member_remove(&self, _event: &MemberEvent, _ctx: &CommandContext) -> Result<()> {
        Ok(())
    }
}
