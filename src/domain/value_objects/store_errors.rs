use thiserror::Error;

/// Raised by the storage layer when an insert trips the
/// `one_open_subscription_per_user` partial unique index. The usecase
/// downcasts it out of the `anyhow` chain and re-signals it as the
/// already-subscribed business error instead of a generic failure.
#[derive(Debug, Error)]
#[error("another open subscription exists for this user")]
pub struct DuplicateOpenSubscription;

/// Transient storage failure (pool exhausted, connection refused). Safe for
/// the caller to retry with backoff; distinguished from business errors so
/// the client can show a retry affordance.
#[derive(Debug, Error)]
#[error("storage is unavailable")]
pub struct StoreUnavailable;
