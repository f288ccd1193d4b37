use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::infrastructure::postgres::schema::{items, meals};

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = meals)]
pub struct MealEntity {
    pub id: i64,
    pub name: String,
    pub price_minor: i32,
    pub calories: Option<i32>,
    pub spice_level: Option<i32>,
    pub category: Option<String>,
    pub is_available: bool,
    pub is_vegetarian: bool,
    pub is_vegan: bool,
    pub is_gluten_free: bool,
    pub is_dairy_free: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = items)]
pub struct ItemEntity {
    pub id: i64,
    pub name: String,
    pub price_minor: i32,
    pub category: Option<String>,
    pub is_available: bool,
    pub is_vegetarian: bool,
    pub is_vegan: bool,
    pub is_gluten_free: bool,
    pub is_dairy_free: bool,
    pub created_at: DateTime<Utc>,
}
