use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    entities::{
        catalog::{ItemEntity, MealEntity},
        orders::OrderEntity,
        plans::PlanEntity,
        subscriptions::SubscriptionEntity,
    },
    value_objects::enums::{
        order_statuses::OrderStatus, payment_statuses::PaymentStatus,
        subscription_statuses::SubscriptionStatus,
    },
};

pub fn sample_subscription(id: i64) -> SubscriptionEntity {
    let now = Utc::now();
    SubscriptionEntity {
        id,
        user_id: Uuid::new_v4(),
        plan_id: 1,
        status: SubscriptionStatus::Active.to_string(),
        total_meals: 10,
        consumed_meals: 0,
        preferred_delivery_time: Some("11:30".to_string()),
        delivery_address_id: Some(42),
        auto_renewal: false,
        cancellation_reason: None,
        cancelled_at: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_order(id: i64, subscription_id: Option<i64>, status: OrderStatus) -> OrderEntity {
    let now = Utc::now();
    OrderEntity {
        id,
        order_number: format!("SUB{}-{:03}", subscription_id.unwrap_or(0), id),
        subscription_id,
        user_id: Uuid::new_v4(),
        status: status.to_string(),
        payment_status: PaymentStatus::Pending.to_string(),
        scheduled_delivery_date: None,
        actual_delivery_date: None,
        delivery_address_id: Some(42),
        notes: None,
        total_minor: 0,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_meal(id: i64) -> MealEntity {
    MealEntity {
        id,
        name: format!("Meal {}", id),
        price_minor: 1250,
        calories: Some(600),
        spice_level: Some(1),
        category: Some("mains".to_string()),
        is_available: true,
        is_vegetarian: false,
        is_vegan: false,
        is_gluten_free: false,
        is_dairy_free: false,
        created_at: Utc::now(),
    }
}

pub fn sample_item(id: i64) -> ItemEntity {
    ItemEntity {
        id,
        name: format!("Item {}", id),
        price_minor: 450,
        category: Some("sides".to_string()),
        is_available: true,
        is_vegetarian: true,
        is_vegan: false,
        is_gluten_free: true,
        is_dairy_free: false,
        created_at: Utc::now(),
    }
}

pub fn sample_plan(id: i64) -> PlanEntity {
    PlanEntity {
        id,
        title: format!("Plan {}", id),
        price_per_meal_minor: 1200,
        duration_days: 30,
        calories_target: Some(1800),
        is_active: true,
    }
}
