use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;

use crate::domain::{
    entities::orders::{InsertOrderWithLines, OrderEntity, OrderItemEntity, OrderMealEntity},
    value_objects::{enums::order_statuses::OrderStatus, orders::OrderStatusTally},
};

#[async_trait]
#[automock]
pub trait OrderRepository {
    /// Inserts a whole generation batch (orders plus snapshot lines) in one
    /// transaction. Any failure rolls the entire batch back.
    async fn create_batch(&self, batch: Vec<InsertOrderWithLines>) -> Result<Vec<OrderEntity>>;

    async fn find_by_id(&self, order_id: i64) -> Result<Option<OrderEntity>>;

    /// The order's snapshot lines, in insertion order.
    async fn find_meal_lines(&self, order_id: i64) -> Result<Vec<OrderMealEntity>>;

    async fn find_item_lines(&self, order_id: i64) -> Result<Vec<OrderItemEntity>>;

    async fn list_by_subscription(&self, subscription_id: i64) -> Result<Vec<OrderEntity>>;

    /// Count of orders in the in-flight band (confirmed, preparing,
    /// out_for_delivery) for one subscription.
    async fn count_in_flight(&self, subscription_id: i64) -> Result<i64>;

    async fn find_oldest_pending(&self, subscription_id: i64) -> Result<Option<OrderEntity>>;

    /// Conditional pending→confirmed promotion. Returns the order only when
    /// the row was still `pending`; a racing retry sees `None` and reports
    /// the in-flight conflict instead of activating a second order.
    async fn confirm_pending_order(
        &self,
        order_id: i64,
        scheduled_delivery_date: DateTime<Utc>,
    ) -> Result<Option<OrderEntity>>;

    async fn update_status(
        &self,
        order_id: i64,
        status: OrderStatus,
        notes: Option<String>,
    ) -> Result<OrderEntity>;

    /// Delivered transition: sets the status and `actual_delivery_date` and
    /// bumps the parent subscription's `consumed_meals` (completing the
    /// subscription when the counter reaches `total_meals`) in the same
    /// transaction.
    async fn mark_delivered(&self, order_id: i64, notes: Option<String>) -> Result<OrderEntity>;

    /// Bulk-cancels the subscription's remaining pending orders; the explicit
    /// companion to subscription cancellation. Returns how many were
    /// cancelled.
    async fn cancel_pending_by_subscription(
        &self,
        subscription_id: i64,
        reason: Option<String>,
    ) -> Result<usize>;

    async fn status_tally(&self, subscription_id: i64) -> Result<OrderStatusTally>;
}
