pub mod catalog;
pub mod dietary_profiles;
pub mod orders;
pub mod subscriptions;
