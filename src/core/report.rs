//! Error reporting for handler faults
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use log::error;

use crate::commands::message::InboundMessage;

/// Where a fault happened
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportContext {
    pub module: String,
    pub stage: String,
    pub channel_id: Option<String>,
    pub author_id: Option<String>,
    pub guild_id: Option<String>,
    pub content: Option<String>,
}

impl ReportContext {
    pub fn new(module: &str, stage: &str) -> Self {
        Self {
            module: module.to_string(),
            stage: stage.to_string(),
            ..Self::default()
        }
    }

    /// Attach the originating message
    pub fn with_message(mut self, msg: &InboundMessage) -> Self {
        self.channel_id = Some(msg.channel_id.clone());
        self.author_id = Some(msg.author_id.clone());
        self.guild_id = msg.guild_id.clone();
        self.content = Some(msg.content.clone());
        self
    }

    pub fn with_guild(mut self, guild_id: &str) -> Self {
        self.guild_id = Some(guild_id.to_string());
        self
    }
}

/// Sink for handler faults, e.g. an error tracker
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &anyhow::Error, context: &ReportContext);
}

/// Reports faults to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, error: &anyhow::Error, context: &ReportContext) {
        error!(
            "💥 {} failed in {} | Channel: {} | User: {} | Guild: {} | Content: '{}' | {error:#}",
            context.module,
            context.stage,
            context.channel_id.as_deref().unwrap_or("-"),
            context.author_id.as_deref().unwrap_or("-"),
            context.guild_id.as_deref().unwrap_or("DM"),
            context
                .content
                .as_deref()
                .unwrap_or_default()
                .chars()
                .take(100)
                .collect::<String>(),
        );
    }
}
