use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::subscriptions::SubscriptionEntity;

use super::enums::subscription_statuses::SubscriptionStatus;

/// One scheduled delivery's worth of catalog selections inside a plan
/// payload. Quantities reference live catalog rows; the generator snapshots
/// them into order lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliverySelection {
    #[serde(default)]
    pub meals: Vec<SelectionLine>,
    #[serde(default)]
    pub items: Vec<SelectionLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionLine {
    pub catalog_id: i64,
    pub quantity: i32,
}

/// Generation input: how many deliveries to materialize and the selections
/// for each. Shorter selection lists than `total_meals` are allowed; the
/// generator fills the tail with awaiting-selection orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanPayload {
    pub total_meals: i32,
    pub deliveries: Vec<DeliverySelection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscriptionModel {
    pub plan_id: i64,
    pub total_meals: i32,
    /// One entry per scheduled delivery. May be shorter than `total_meals`;
    /// the tail is generated as awaiting-selection orders.
    #[serde(default)]
    pub deliveries: Vec<DeliverySelection>,
    pub preferred_delivery_time: Option<String>,
    pub delivery_address_id: Option<i64>,
    #[serde(default)]
    pub auto_renewal: bool,
    /// Defaults to `pending`; `active` additionally activates the first
    /// order right after generation.
    pub initial_status: Option<SubscriptionStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelSubscriptionModel {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionDto {
    pub id: i64,
    pub user_id: Uuid,
    pub plan_id: i64,
    pub status: SubscriptionStatus,
    pub total_meals: i32,
    pub consumed_meals: i32,
    pub preferred_delivery_time: Option<String>,
    pub delivery_address_id: Option<i64>,
    pub auto_renewal: bool,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<SubscriptionEntity> for SubscriptionDto {
    fn from(entity: SubscriptionEntity) -> Self {
        let status =
            SubscriptionStatus::from_str(&entity.status).unwrap_or(SubscriptionStatus::Pending);
        Self {
            id: entity.id,
            user_id: entity.user_id,
            plan_id: entity.plan_id,
            status,
            total_meals: entity.total_meals,
            consumed_meals: entity.consumed_meals,
            preferred_delivery_time: entity.preferred_delivery_time,
            delivery_address_id: entity.delivery_address_id,
            auto_renewal: entity.auto_renewal,
            cancellation_reason: entity.cancellation_reason,
            cancelled_at: entity.cancelled_at,
            created_at: entity.created_at,
        }
    }
}

/// Progress view fed by the per-status order tallies.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionProgressDto {
    pub subscription: SubscriptionDto,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub in_flight_orders: i64,
    pub delivered_orders: i64,
    pub cancelled_orders: i64,
    pub remaining_meals: i32,
}
