pub mod order_statuses;
pub mod payment_statuses;
pub mod preference_keys;
pub mod subscription_statuses;
