// Core layer - configuration, settings, reporting
pub mod core;

// Features layer - rate limiting and permissions
pub mod features;

// Application layer
pub mod commands;

// Serenity adapter
pub mod gateway;

pub use core::Config;
pub use commands::{Dispatch, Dispatcher};
