use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::infrastructure::postgres::schema::{order_items, order_meals, orders};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = orders)]
pub struct OrderEntity {
    pub id: i64,
    pub order_number: String,
    pub subscription_id: Option<i64>,
    pub user_id: Uuid,
    pub status: String,
    pub payment_status: String,
    pub scheduled_delivery_date: Option<DateTime<Utc>>,
    pub actual_delivery_date: Option<DateTime<Utc>>,
    pub delivery_address_id: Option<i64>,
    pub notes: Option<String>,
    pub total_minor: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = orders)]
pub struct InsertOrderEntity {
    pub order_number: String,
    pub subscription_id: Option<i64>,
    pub user_id: Uuid,
    pub status: String,
    pub payment_status: String,
    pub delivery_address_id: Option<i64>,
    pub notes: Option<String>,
    pub total_minor: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = order_meals)]
pub struct OrderMealEntity {
    pub id: i64,
    pub order_id: i64,
    pub meal_id: Option<i64>,
    pub name: String,
    pub quantity: i32,
    pub unit_price_minor: i32,
    pub total_price_minor: i32,
}

/// Snapshot line copied from the meal catalog at order-generation time.
/// `order_id` is absent because batch generation inserts the parent order
/// and its lines in one transaction; the repository fills it in.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOrderMealLine {
    pub meal_id: Option<i64>,
    pub name: String,
    pub quantity: i32,
    pub unit_price_minor: i32,
    pub total_price_minor: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = order_meals)]
pub struct InsertOrderMealEntity {
    pub order_id: i64,
    pub meal_id: Option<i64>,
    pub name: String,
    pub quantity: i32,
    pub unit_price_minor: i32,
    pub total_price_minor: i32,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = order_items)]
pub struct OrderItemEntity {
    pub id: i64,
    pub order_id: i64,
    pub item_id: Option<i64>,
    pub name: String,
    pub quantity: i32,
    pub unit_price_minor: i32,
    pub total_price_minor: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertOrderItemLine {
    pub item_id: Option<i64>,
    pub name: String,
    pub quantity: i32,
    pub unit_price_minor: i32,
    pub total_price_minor: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = order_items)]
pub struct InsertOrderItemEntity {
    pub order_id: i64,
    pub item_id: Option<i64>,
    pub name: String,
    pub quantity: i32,
    pub unit_price_minor: i32,
    pub total_price_minor: i32,
}

/// One order of a generation batch together with its snapshot lines.
#[derive(Debug, Clone)]
pub struct InsertOrderWithLines {
    pub order: InsertOrderEntity,
    pub meal_lines: Vec<InsertOrderMealLine>,
    pub item_lines: Vec<InsertOrderItemLine>,
}
