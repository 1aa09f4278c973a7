//! # Core Module
//!
//! Configuration, guild settings, fault reporting and message splitting.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.7.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Add guild settings and error reporting
//! - 1.1.0: Add response module with Discord message chunking utilities
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod report;
pub mod response;
pub mod settings;

pub use config::{Config, ConfigError};
pub use report::{ErrorReporter, LogReporter, ReportContext};
pub use response::{split_for_message, split_text, MESSAGE_LIMIT};
pub use settings::{GuildSettings, ModuleRule};
