//! # Rate Limiting Feature
//!
//! Per-user token buckets consulted before every command and trigger.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod bucket;

pub use bucket::{
    BucketContainer, RateLimitError, BUCKET_INITIAL_FILL, BUCKET_UPPER_BOUND, COOLDOWN,
    DROP_INTERVAL, DROP_SIZE,
};
