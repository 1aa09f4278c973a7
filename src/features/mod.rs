//! # Features
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

pub mod permissions;
pub mod rate_limiting;

pub use permissions::{AllowAll, ModulePermissions, PermissionGate};
pub use rate_limiting::{BucketContainer, RateLimitError};
