use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{
        entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
        repositories::subscriptions::SubscriptionRepository,
        value_objects::{
            enums::subscription_statuses::SubscriptionStatus,
            store_errors::DuplicateOpenSubscription,
        },
    },
    infrastructure::postgres::{
        postgres_connection::{PgPoolSquad, checkout},
        schema::subscriptions,
    },
};

/// Partial unique index defending the one-open-subscription-per-user rule.
const OPEN_SUBSCRIPTION_INDEX: &str = "one_open_subscription_per_user";

fn terminal_statuses() -> Vec<String> {
    vec![
        SubscriptionStatus::Cancelled.to_string(),
        SubscriptionStatus::Completed.to_string(),
    ]
}

pub struct SubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SubscriptionPostgres {
    async fn create(
        &self,
        insert_subscription_entity: InsertSubscriptionEntity,
    ) -> Result<SubscriptionEntity> {
        let mut conn = checkout(&self.db_pool)?;

        insert_into(subscriptions::table)
            .values(&insert_subscription_entity)
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                    if info.constraint_name() == Some(OPEN_SUBSCRIPTION_INDEX) =>
                {
                    anyhow::Error::new(DuplicateOpenSubscription)
                }
                other => anyhow::Error::new(other),
            })
    }

    async fn find_by_id(&self, subscription_id: i64) -> Result<Option<SubscriptionEntity>> {
        let mut conn = checkout(&self.db_pool)?;

        let result = subscriptions::table
            .filter(subscriptions::id.eq(subscription_id))
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn find_non_terminal_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SubscriptionEntity>> {
        let mut conn = checkout(&self.db_pool)?;

        let result = subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .filter(subscriptions::status.ne_all(terminal_statuses()))
            .select(SubscriptionEntity::as_select())
            .first::<SubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(result)
    }

    async fn update_status(
        &self,
        subscription_id: i64,
        status: SubscriptionStatus,
    ) -> Result<SubscriptionEntity> {
        let mut conn = checkout(&self.db_pool)?;

        let result = update(subscriptions::table)
            .filter(subscriptions::id.eq(subscription_id))
            .set((
                subscriptions::status.eq(status.to_string()),
                subscriptions::updated_at.eq(Utc::now()),
            ))
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)?;

        Ok(result)
    }

    async fn cancel(
        &self,
        subscription_id: i64,
        reason: Option<String>,
    ) -> Result<SubscriptionEntity> {
        let mut conn = checkout(&self.db_pool)?;
        let now = Utc::now();

        let result = update(subscriptions::table)
            .filter(subscriptions::id.eq(subscription_id))
            .set((
                subscriptions::status.eq(SubscriptionStatus::Cancelled.to_string()),
                subscriptions::cancellation_reason.eq(reason),
                subscriptions::cancelled_at.eq(Some(now)),
                subscriptions::updated_at.eq(now),
            ))
            .returning(SubscriptionEntity::as_returning())
            .get_result::<SubscriptionEntity>(&mut conn)?;

        Ok(result)
    }
}
