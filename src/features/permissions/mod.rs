//! # Feature: Module Permissions
//!
//! Decides whether a module may run for a given channel and user. Consulted
//! before a command is rate limited, so a vetoed command costs no keys.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: true

use async_trait::async_trait;
use log::debug;

use crate::core::settings::ModuleRule;

#[async_trait]
pub trait PermissionGate: Send + Sync {
    async fn is_allowed(
        &self,
        channel_id: &str,
        message_id: &str,
        author_id: &str,
        module: &str,
    ) -> bool;
}

/// Allows everything
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

#[async_trait]
impl PermissionGate for AllowAll {
    async fn is_allowed(&self, _: &str, _: &str, _: &str, _: &str) -> bool {
        true
    }
}

/// Rule-based permissions from the guild settings file
#[derive(Debug, Default, Clone)]
pub struct ModulePermissions {
    rules: Vec<ModuleRule>,
}

impl ModulePermissions {
    pub fn new(rules: Vec<ModuleRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ModuleRule] {
        &self.rules
    }
}

#[async_trait]
impl PermissionGate for ModulePermissions {
    async fn is_allowed(
        &self,
        channel_id: &str,
        message_id: &str,
        author_id: &str,
        module: &str,
    ) -> bool {
        let blocked = self
            .rules
            .iter()
            .any(|rule| rule.blocks(module, channel_id, author_id));

        if blocked {
            debug!(
                "🔒 Module {module} disabled for message #{message_id} channel #{channel_id} user #{author_id}"
            );
        }
        !blocked
    }
}
