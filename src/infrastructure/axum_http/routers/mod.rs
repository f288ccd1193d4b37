pub mod menus;
pub mod orders;
pub mod subscriptions;
