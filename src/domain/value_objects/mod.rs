pub mod enums;
pub mod menus;
pub mod orders;
pub mod store_errors;
pub mod subscriptions;
