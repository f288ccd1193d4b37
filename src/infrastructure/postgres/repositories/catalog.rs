use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, prelude::*};
use std::sync::Arc;

use crate::{
    domain::{
        entities::{
            catalog::{ItemEntity, MealEntity},
            plans::PlanEntity,
        },
        repositories::catalog::CatalogRepository,
    },
    infrastructure::postgres::{
        postgres_connection::{PgPoolSquad, checkout},
        schema::{item_allergies, items, meal_allergies, meals, plans},
    },
};

pub struct CatalogPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CatalogPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CatalogRepository for CatalogPostgres {
    async fn find_active_plan_by_id(&self, plan_id: i64) -> Result<Option<PlanEntity>> {
        let mut conn = checkout(&self.db_pool)?;

        let result = plans::table
            .filter(plans::id.eq(plan_id))
            .filter(plans::is_active.eq(true))
            .select(PlanEntity::as_select())
            .first::<PlanEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn list_available_meals(&self) -> Result<Vec<MealEntity>> {
        let mut conn = checkout(&self.db_pool)?;

        let results = meals::table
            .filter(meals::is_available.eq(true))
            .order(meals::id.asc())
            .select(MealEntity::as_select())
            .load::<MealEntity>(&mut conn)?;

        Ok(results)
    }

    async fn list_available_items(&self) -> Result<Vec<ItemEntity>> {
        let mut conn = checkout(&self.db_pool)?;

        let results = items::table
            .filter(items::is_available.eq(true))
            .order(items::id.asc())
            .select(ItemEntity::as_select())
            .load::<ItemEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_meals_by_ids(&self, meal_ids: Vec<i64>) -> Result<Vec<MealEntity>> {
        if meal_ids.is_empty() {
            return Ok(vec![]);
        }
        let mut conn = checkout(&self.db_pool)?;

        let results = meals::table
            .filter(meals::id.eq_any(meal_ids))
            .select(MealEntity::as_select())
            .load::<MealEntity>(&mut conn)?;

        Ok(results)
    }

    async fn find_items_by_ids(&self, item_ids: Vec<i64>) -> Result<Vec<ItemEntity>> {
        if item_ids.is_empty() {
            return Ok(vec![]);
        }
        let mut conn = checkout(&self.db_pool)?;

        let results = items::table
            .filter(items::id.eq_any(item_ids))
            .select(ItemEntity::as_select())
            .load::<ItemEntity>(&mut conn)?;

        Ok(results)
    }

    async fn unsafe_meal_ids(&self, allergy_ids: Vec<i64>) -> Result<Vec<i64>> {
        if allergy_ids.is_empty() {
            return Ok(vec![]);
        }
        let mut conn = checkout(&self.db_pool)?;

        let results = meal_allergies::table
            .filter(meal_allergies::allergy_id.eq_any(allergy_ids))
            .select(meal_allergies::meal_id)
            .distinct()
            .load::<i64>(&mut conn)?;

        Ok(results)
    }

    async fn unsafe_item_ids(&self, allergy_ids: Vec<i64>) -> Result<Vec<i64>> {
        if allergy_ids.is_empty() {
            return Ok(vec![]);
        }
        let mut conn = checkout(&self.db_pool)?;

        let results = item_allergies::table
            .filter(item_allergies::allergy_id.eq_any(allergy_ids))
            .select(item_allergies::item_id)
            .distinct()
            .load::<i64>(&mut conn)?;

        Ok(results)
    }
}
