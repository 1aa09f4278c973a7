//! Shared context for command handlers
//!
//! - **Version**: 2.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.1.0: Add the command catalog for help
//! - 2.0.0: Context is the chat session handle: reply sink, buckets, stats, admins
//! - 1.0.0: Initial implementation with core shared state

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::features::rate_limiting::BucketContainer;

/// Outbound chat messages
///
/// Retries and transport rate limits belong to the implementation.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<()>;
}

/// Registered names, published by the dispatcher at init
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandCatalog {
    pub commands: Vec<String>,
    pub triggers: Vec<String>,
}

/// Process-wide dispatch counters
#[derive(Debug, Default)]
pub struct DispatchStats {
    commands_executed: AtomicU64,
    rate_limited: AtomicU64,
    denied: AtomicU64,
    handler_faults: AtomicU64,
}

impl DispatchStats {
    pub fn record_command(&self) {
        self.commands_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_denied(&self) {
        self.denied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fault(&self) {
        self.handler_faults.fetch_add(1, Ordering::Relaxed);
    }

    pub fn commands_executed(&self) -> u64 {
        self.commands_executed.load(Ordering::Relaxed)
    }

    pub fn rate_limited(&self) -> u64 {
        self.rate_limited.load(Ordering::Relaxed)
    }

    pub fn denied(&self) -> u64 {
        self.denied.load(Ordering::Relaxed)
    }

    pub fn handler_faults(&self) -> u64 {
        self.handler_faults.load(Ordering::Relaxed)
    }
}

/// Session handle passed to every module
///
/// Cheap to clone; everything inside is shared.
#[derive(Clone)]
pub struct CommandContext {
    pub replies: Arc<dyn ReplySink>,
    pub buckets: Arc<BucketContainer>,
    pub stats: Arc<DispatchStats>,
    pub catalog: Arc<CommandCatalog>,
    pub bot_admins: Arc<HashSet<String>>,
    pub started_at: DateTime<Utc>,
}

impl CommandContext {
    pub fn new(
        replies: Arc<dyn ReplySink>,
        buckets: Arc<BucketContainer>,
        bot_admins: HashSet<String>,
    ) -> Self {
        Self {
            replies,
            buckets,
            stats: Arc::new(DispatchStats::default()),
            catalog: Arc::new(CommandCatalog::default()),
            bot_admins: Arc::new(bot_admins),
            started_at: Utc::now(),
        }
    }

    /// Send text to a channel
    pub async fn say(&self, channel_id: &str, text: &str) -> Result<()> {
        self.replies.send_message(channel_id, text).await
    }

    pub fn is_bot_admin(&self, user_id: &str) -> bool {
        self.bot_admins.contains(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullSink;

    #[async_trait]
    impl ReplySink for NullSink {
        async fn send_message(&self, _channel_id: &str, _text: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_command_context_clone() {
        // CommandContext should be Clone for sharing across handlers
        fn assert_clone<T: Clone + Send + Sync>() {}
        assert_clone::<CommandContext>();
    }

    #[test]
    fn test_clones_share_stats() {
        let ctx = CommandContext::new(
            Arc::new(NullSink),
            Arc::new(BucketContainer::new()),
            HashSet::from(["1".to_string()]),
        );
        let other = ctx.clone();
        other.stats.record_command();
        other.stats.record_fault();

        assert_eq!(ctx.stats.commands_executed(), 1);
        assert_eq!(ctx.stats.handler_faults(), 1);
        assert_eq!(ctx.stats.rate_limited(), 0);
        assert!(ctx.is_bot_admin("1"));
        assert!(!ctx.is_bot_admin("2"));
    }
}
