use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::entities::{
    catalog::{ItemEntity, MealEntity},
    plans::PlanEntity,
};

/// Read-only catalog access: plans, meals, items, and the allergen joins.
#[async_trait]
#[automock]
pub trait CatalogRepository {
    async fn find_active_plan_by_id(&self, plan_id: i64) -> Result<Option<PlanEntity>>;

    async fn list_available_meals(&self) -> Result<Vec<MealEntity>>;

    async fn list_available_items(&self) -> Result<Vec<ItemEntity>>;

    async fn find_meals_by_ids(&self, meal_ids: Vec<i64>) -> Result<Vec<MealEntity>>;

    async fn find_items_by_ids(&self, item_ids: Vec<i64>) -> Result<Vec<ItemEntity>>;

    /// Meal ids appearing in `meal_allergies` for any of the given allergy
    /// ids — the unsafe set for a user's allergy profile.
    async fn unsafe_meal_ids(&self, allergy_ids: Vec<i64>) -> Result<Vec<i64>>;

    async fn unsafe_item_ids(&self, allergy_ids: Vec<i64>) -> Result<Vec<i64>>;
}
