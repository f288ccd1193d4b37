pub mod menu_filter;
pub mod order_activation;
pub mod order_details;
pub mod order_generation;
pub mod order_status;
pub mod subscriptions;

#[cfg(test)]
pub mod test_support;
