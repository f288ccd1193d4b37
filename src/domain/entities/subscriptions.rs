use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::subscriptions;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscriptions)]
pub struct SubscriptionEntity {
    pub id: i64,
    pub user_id: Uuid,
    pub plan_id: i64,
    pub status: String,
    pub total_meals: i32,
    pub consumed_meals: i32,
    pub preferred_delivery_time: Option<String>,
    pub delivery_address_id: Option<i64>,
    pub auto_renewal: bool,
    pub cancellation_reason: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscriptions)]
pub struct InsertSubscriptionEntity {
    pub user_id: Uuid,
    pub plan_id: i64,
    pub status: String,
    pub total_meals: i32,
    pub consumed_meals: i32,
    pub preferred_delivery_time: Option<String>,
    pub delivery_address_id: Option<i64>,
    pub auto_renewal: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
