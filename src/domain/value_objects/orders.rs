use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::orders::{OrderEntity, OrderItemEntity, OrderMealEntity};

use super::enums::{order_statuses::OrderStatus, payment_statuses::PaymentStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusModel {
    pub status: OrderStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivateOrderModel {
    /// Explicit delivery slot; when absent the sequencer derives tomorrow at
    /// the subscription's preferred delivery time.
    pub scheduled_delivery_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderLineDto {
    pub catalog_id: Option<i64>,
    pub name: String,
    pub quantity: i32,
    pub unit_price_minor: i32,
    pub total_price_minor: i32,
}

impl From<OrderMealEntity> for OrderLineDto {
    fn from(line: OrderMealEntity) -> Self {
        Self {
            catalog_id: line.meal_id,
            name: line.name,
            quantity: line.quantity,
            unit_price_minor: line.unit_price_minor,
            total_price_minor: line.total_price_minor,
        }
    }
}

impl From<OrderItemEntity> for OrderLineDto {
    fn from(line: OrderItemEntity) -> Self {
        Self {
            catalog_id: line.item_id,
            name: line.name,
            quantity: line.quantity,
            unit_price_minor: line.unit_price_minor,
            total_price_minor: line.total_price_minor,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDto {
    pub id: i64,
    pub order_number: String,
    pub subscription_id: Option<i64>,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub scheduled_delivery_date: Option<DateTime<Utc>>,
    pub actual_delivery_date: Option<DateTime<Utc>>,
    pub delivery_address_id: Option<i64>,
    pub notes: Option<String>,
    pub total_minor: i32,
    pub created_at: DateTime<Utc>,
}

impl From<OrderEntity> for OrderDto {
    fn from(entity: OrderEntity) -> Self {
        let status = OrderStatus::from_str(&entity.status).unwrap_or(OrderStatus::Pending);
        let payment_status =
            PaymentStatus::from_str(&entity.payment_status).unwrap_or(PaymentStatus::Pending);
        Self {
            id: entity.id,
            order_number: entity.order_number,
            subscription_id: entity.subscription_id,
            user_id: entity.user_id,
            status,
            payment_status,
            scheduled_delivery_date: entity.scheduled_delivery_date,
            actual_delivery_date: entity.actual_delivery_date,
            delivery_address_id: entity.delivery_address_id,
            notes: entity.notes,
            total_minor: entity.total_minor,
            created_at: entity.created_at,
        }
    }
}

/// One order with its snapshot lines expanded.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetailDto {
    #[serde(flatten)]
    pub order: OrderDto,
    pub meals: Vec<OrderLineDto>,
    pub items: Vec<OrderLineDto>,
}

/// Per-status order tallies for one subscription.
#[derive(Debug, Clone, Default)]
pub struct OrderStatusTally {
    pub total: i64,
    pub pending: i64,
    pub in_flight: i64,
    pub delivered: i64,
    pub cancelled: i64,
}
