use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::repositories::dietary_profiles::DietaryProfileRepository,
    infrastructure::postgres::{
        postgres_connection::{PgPoolSquad, checkout},
        schema::{dietary_preferences, user_allergies, user_dietary_preferences},
    },
};

pub struct DietaryProfilePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl DietaryProfilePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl DietaryProfileRepository for DietaryProfilePostgres {
    async fn allergy_ids_for_user(&self, user_id: Uuid) -> Result<Vec<i64>> {
        let mut conn = checkout(&self.db_pool)?;

        let results = user_allergies::table
            .filter(user_allergies::user_id.eq(user_id))
            .select(user_allergies::allergy_id)
            .load::<i64>(&mut conn)?;

        Ok(results)
    }

    async fn preference_keys_for_user(&self, user_id: Uuid) -> Result<Vec<String>> {
        let mut conn = checkout(&self.db_pool)?;

        let results = user_dietary_preferences::table
            .inner_join(dietary_preferences::table)
            .filter(user_dietary_preferences::user_id.eq(user_id))
            .select(dietary_preferences::key)
            .load::<String>(&mut conn)?;

        Ok(results)
    }
}
