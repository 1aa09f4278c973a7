//! # Command System
//!
//! Prefix commands, trigger phrases and event observers.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Dispatcher with per-user rate limiting, capability traits for modules
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 1.0.0: Initial reorganization with modular command structure

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod message;
pub mod registry;

pub use context::{CommandCatalog, CommandContext, DispatchStats, ReplySink};
pub use dispatcher::{Dispatch, DispatchSettings, Dispatcher};
pub use error::DispatchError;
pub use handler::{CommandHandler, EventObserver, Module, TriggerHandler};
pub use handlers::create_all_modules;
pub use message::{InboundMessage, MemberEvent};
pub use registry::{CommandRegistry, EntryKind};
