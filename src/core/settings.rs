//! # Guild Settings
//!
//! YAML file with per-guild prefix overrides and module permission rules.
//!
//! ```yaml
//! prefixes:
//!   "123456789012345678": "!"
//! disabled:
//!   - module: fun
//!     channels: ["234567890123456789"]
//!   - module: greetings
//! ```
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Maximum prefix length
pub const MAX_PREFIX_LEN: usize = 25;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct GuildSettings {
    /// Guild id -> command prefix. An empty prefix turns commands off.
    #[serde(default)]
    pub prefixes: HashMap<String, String>,

    /// Modules that are switched off
    #[serde(default)]
    pub disabled: Vec<ModuleRule>,
}

/// Disables a module
///
/// With neither `channels` nor `users` the module is off everywhere.
/// Otherwise it is off in the listed channels and for the listed users.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ModuleRule {
    pub module: String,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub users: Vec<String>,
}

impl ModuleRule {
    pub fn blocks(&self, module: &str, channel_id: &str, author_id: &str) -> bool {
        if self.module != module {
            return false;
        }
        if self.channels.is_empty() && self.users.is_empty() {
            return true;
        }
        self.channels.iter().any(|c| c == channel_id) || self.users.iter().any(|u| u == author_id)
    }
}

impl GuildSettings {
    /// Load settings from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load settings, falling back to defaults if the file does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let settings: GuildSettings = serde_yaml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        for (guild_id, prefix) in &self.prefixes {
            if prefix.chars().count() > MAX_PREFIX_LEN {
                return Err(anyhow::anyhow!(
                    "Prefix for guild {guild_id} too long (max {MAX_PREFIX_LEN} chars)"
                ));
            }
            if prefix.chars().any(char::is_whitespace) {
                return Err(anyhow::anyhow!(
                    "Prefix for guild {guild_id} must not contain whitespace"
                ));
            }
        }

        for rule in &self.disabled {
            if rule.module.trim().is_empty() {
                return Err(anyhow::anyhow!("Permission rule without module name"));
            }
        }
        Ok(())
    }

    /// Prefix override for a guild, if any
    pub fn prefix_for(&self, guild_id: &str) -> Option<&str> {
        self.prefixes.get(guild_id).map(String::as_str)
    }
}
