use diesel::prelude::*;

use crate::infrastructure::postgres::schema::plans;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = plans)]
pub struct PlanEntity {
    pub id: i64,
    pub title: String,
    pub price_per_meal_minor: i32,
    pub duration_days: i32,
    pub calories_target: Option<i32>,
    pub is_active: bool,
}
