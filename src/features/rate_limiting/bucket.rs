//! # Feature: Token Buckets
//!
//! One token bucket per Discord user. Every rate-limited action drains a key,
//! and a global refiller drips keys back in on a fixed tick. Buckets move
//! through three regimes: cooldown (`-1`), empty (`0`) and normal (`1..=32`).
//! A cooldown bucket needs one extra silent tick before it resets, an empty
//! bucket resets to a full initial fill on the next tick.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Replace sliding window with per-user token buckets and a global refiller
//! - 1.1.0: Multi-bot support with (bot_id, user_id) composite keys
//! - 1.0.0: Initial release with per-user sliding window rate limiting

use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// How many keys a bucket holds when created
pub const BUCKET_INITIAL_FILL: i32 = 5;

/// The maximum amount of keys the refiller will drip into a bucket
pub const BUCKET_UPPER_BOUND: i32 = 32;

/// How often new keys drip into the buckets
pub const DROP_INTERVAL: Duration = Duration::from_secs(10);

/// How many keys drop per tick
pub const DROP_SIZE: i32 = 1;

/// Cooldown regime, set by the hard throttle
pub const COOLDOWN: i32 = -1;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    /// The user's bucket does not hold enough keys for the requested amount.
    #[error("No keys left for user {user}")]
    NoKeysLeft { user: String },
}

/// Maps Discord user ids to key counts.
///
/// All reads and writes go through a single mutex. The lock is only taken
/// inside these synchronous methods, so callers can never hold it across an
/// `.await`.
#[derive(Debug)]
pub struct BucketContainer {
    buckets: Mutex<HashMap<String, i32>>,
    drop_interval: Duration,
}

impl BucketContainer {
    pub fn new() -> Self {
        Self::with_interval(DROP_INTERVAL)
    }

    /// Create a container whose refiller ticks on a custom interval
    pub fn with_interval(drop_interval: Duration) -> Self {
        BucketContainer {
            buckets: Mutex::new(HashMap::new()),
            drop_interval,
        }
    }

    pub fn drop_interval(&self) -> Duration {
        self.drop_interval
    }

    // A panic while holding the lock cannot leave a half-written count behind,
    // so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, i32>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a bucket seeded with [`BUCKET_INITIAL_FILL`] if the user has none.
    ///
    /// Existing buckets are never re-seeded.
    pub fn create_bucket_if_not_exists(&self, user: &str) {
        let mut buckets = self.lock();
        Self::ensure(&mut buckets, user);
    }

    fn ensure<'a>(buckets: &'a mut HashMap<String, i32>, user: &str) -> &'a mut i32 {
        buckets
            .entry(user.to_string())
            .or_insert(BUCKET_INITIAL_FILL)
    }

    /// Drain `amount` keys from the user's bucket if enough are left.
    ///
    /// On failure the bucket is left untouched.
    pub fn drain(&self, amount: u32, user: &str) -> Result<(), RateLimitError> {
        let mut buckets = self.lock();
        let keys = Self::ensure(&mut buckets, user);

        if i64::from(*keys) < i64::from(amount) {
            return Err(RateLimitError::NoKeysLeft {
                user: user.to_string(),
            });
        }

        // amount <= keys <= i32::MAX here
        *keys -= amount as i32;
        Ok(())
    }

    /// Check if the user still has keys
    pub fn has_keys(&self, user: &str) -> bool {
        let mut buckets = self.lock();
        *Self::ensure(&mut buckets, user) > 0
    }

    /// Current key count. A user without a bucket reads as a fresh one.
    pub fn get(&self, user: &str) -> i32 {
        self.lock()
            .get(user)
            .copied()
            .unwrap_or(BUCKET_INITIAL_FILL)
    }

    /// Put the user into cooldown if their bucket has no keys left.
    ///
    /// Check and set happen under one lock, so a refill tick cannot slip in
    /// between. Returns whether the bucket was cooled down.
    pub fn cool_down_if_empty(&self, user: &str) -> bool {
        let mut buckets = self.lock();
        let keys = Self::ensure(&mut buckets, user);
        if *keys > 0 {
            return false;
        }
        *keys = COOLDOWN;
        true
    }

    /// Operator override of a user's key count
    pub fn set(&self, user: &str, value: i32) {
        self.lock().insert(user.to_string(), value);
    }

    /// Number of buckets currently tracked
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Apply one refill tick to every bucket.
    pub fn refill_tick(&self) {
        let mut buckets = self.lock();
        for keys in buckets.values_mut() {
            *keys = Self::refilled(*keys);
        }
    }

    fn refilled(keys: i32) -> i32 {
        match keys {
            // Chill zone exit
            0 => BUCKET_INITIAL_FILL,
            // Chill zone, and anything an operator pushed below it
            k if k < 0 => k + 1,
            k if k < BUCKET_UPPER_BOUND => (k + DROP_SIZE).min(BUCKET_UPPER_BOUND),
            k => k,
        }
    }

    /// Refill buckets every drop interval until `shutdown` fires.
    ///
    /// The first tick happens one full interval after start.
    pub async fn run_refiller(&self, shutdown: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.drop_interval, self.drop_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "🪣 Bucket refiller started (every {:?}, +{DROP_SIZE} up to {BUCKET_UPPER_BOUND})",
            self.drop_interval
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.refill_tick();
                    debug!("🪣 Refilled {} buckets", self.len());
                }
            }
        }

        info!("🪣 Bucket refiller stopped");
    }
}

impl Default for BucketContainer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const USER: &str = "42";

    #[test]
    fn test_create_bucket_is_idempotent() {
        let buckets = BucketContainer::new();
        for _ in 0..10 {
            buckets.create_bucket_if_not_exists(USER);
        }
        assert_eq!(buckets.get(USER), BUCKET_INITIAL_FILL);
        assert_eq!(buckets.len(), 1);
    }

    #[test]
    fn test_create_bucket_never_reseeds() {
        let buckets = BucketContainer::new();
        buckets.drain(2, USER).unwrap();
        buckets.create_bucket_if_not_exists(USER);
        assert_eq!(buckets.get(USER), 3);
    }

    #[test]
    fn test_drain_boundary() {
        let buckets = BucketContainer::new();
        assert!(buckets.drain(5, USER).is_ok());
        assert_eq!(buckets.get(USER), 0);

        let err = buckets.drain(1, USER).unwrap_err();
        assert_eq!(
            err,
            RateLimitError::NoKeysLeft {
                user: USER.to_string()
            }
        );
        assert_eq!(buckets.get(USER), 0);
    }

    #[test]
    fn test_drain_more_than_available_leaves_bucket() {
        let buckets = BucketContainer::new();
        assert!(buckets.drain(6, USER).is_err());
        assert_eq!(buckets.get(USER), BUCKET_INITIAL_FILL);
    }

    #[test]
    fn test_drain_in_cooldown_fails() {
        let buckets = BucketContainer::new();
        buckets.set(USER, COOLDOWN);
        assert!(buckets.drain(1, USER).is_err());
        assert_eq!(buckets.get(USER), COOLDOWN);
    }

    #[test]
    fn test_has_keys_creates_bucket() {
        let buckets = BucketContainer::new();
        assert!(buckets.is_empty());
        assert!(buckets.has_keys(USER));
        assert_eq!(buckets.len(), 1);

        buckets.set(USER, 0);
        assert!(!buckets.has_keys(USER));
    }

    #[test]
    fn test_get_does_not_create() {
        let buckets = BucketContainer::new();
        assert_eq!(buckets.get("nobody"), BUCKET_INITIAL_FILL);
        assert!(buckets.is_empty());
    }

    #[test]
    fn test_refill_transitions() {
        let buckets = BucketContainer::new();
        buckets.set("cooldown", -1);
        buckets.set("empty", 0);
        buckets.set("almost", 31);
        buckets.set("full", 32);
        buckets.set("granted", 50);

        buckets.refill_tick();

        assert_eq!(buckets.get("cooldown"), 0);
        assert_eq!(buckets.get("empty"), 5);
        assert_eq!(buckets.get("almost"), 32);
        assert_eq!(buckets.get("full"), 32);
        assert_eq!(buckets.get("granted"), 50);
    }

    #[test]
    fn test_cooldown_takes_two_ticks() {
        let buckets = BucketContainer::new();
        buckets.set(USER, COOLDOWN);

        buckets.refill_tick();
        assert!(!buckets.has_keys(USER));

        buckets.refill_tick();
        assert_eq!(buckets.get(USER), BUCKET_INITIAL_FILL);
    }

    #[test]
    fn test_normal_bucket_drips_one() {
        let buckets = BucketContainer::new();
        buckets.create_bucket_if_not_exists(USER);
        buckets.refill_tick();
        assert_eq!(buckets.get(USER), BUCKET_INITIAL_FILL + DROP_SIZE);
    }

    #[test]
    fn test_concurrent_drains_never_overdrain() {
        let buckets = Arc::new(BucketContainer::new());
        buckets.set(USER, 20);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let buckets = Arc::clone(&buckets);
                std::thread::spawn(move || {
                    (0..10).filter(|_| buckets.drain(1, USER).is_ok()).count()
                })
            })
            .collect();

        let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(granted, 20);
        assert_eq!(buckets.get(USER), 0);
    }

    #[test]
    fn test_users_are_independent() {
        let buckets = BucketContainer::new();
        buckets.drain(5, "user1").unwrap();
        assert!(buckets.drain(1, "user1").is_err());
        assert!(buckets.drain(1, "user2").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refiller_ticks_on_interval() {
        let buckets = Arc::new(BucketContainer::new());
        buckets.drain(5, USER).unwrap();

        let shutdown = CancellationToken::new();
        let task = {
            let buckets = Arc::clone(&buckets);
            let shutdown = shutdown.clone();
            tokio::spawn(async move { buckets.run_refiller(shutdown).await })
        };

        tokio::time::sleep(DROP_INTERVAL / 2).await;
        assert_eq!(buckets.get(USER), 0);

        tokio::time::sleep(DROP_INTERVAL).await;
        assert_eq!(buckets.get(USER), BUCKET_INITIAL_FILL);

        shutdown.cancel();
        task.await.unwrap();
    }

    #[test]
    fn test_cool_down_if_empty() {
        let buckets = BucketContainer::new();
        assert!(!buckets.cool_down_if_empty(USER));
        assert_eq!(buckets.get(USER), BUCKET_INITIAL_FILL);

        buckets.set(USER, 0);
        assert!(buckets.cool_down_if_empty(USER));
        assert_eq!(buckets.get(USER), COOLDOWN);

        assert!(buckets.cool_down_if_empty(USER));
        assert_eq!(buckets.get(USER), COOLDOWN);
    }

    #[test]
    fn test_cool_down_never_clobbers_a_refill() {
        let buckets = Arc::new(BucketContainer::new());
        buckets.set(USER, 0);

        let refiller = {
            let buckets = Arc::clone(&buckets);
            std::thread::spawn(move || buckets.refill_tick())
        };
        let cooled = buckets.cool_down_if_empty(USER);
        refiller.join().unwrap();

        // Either the tick won (full bucket, no cooldown) or the cooldown won
        // and the tick then moved it up by one.
        if cooled {
            assert_eq!(buckets.get(USER), 0);
        } else {
            assert_eq!(buckets.get(USER), BUCKET_INITIAL_FILL);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_refiller_stops_on_cancel() {
        let buckets = Arc::new(BucketContainer::new());
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        buckets.run_refiller(shutdown).await;
        assert!(buckets.is_empty());
    }
}
