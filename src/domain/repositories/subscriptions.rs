use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::{InsertSubscriptionEntity, SubscriptionEntity},
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};

#[async_trait]
#[automock]
pub trait SubscriptionRepository {
    /// Inserts a new subscription. When the partial unique index rejects a
    /// second open subscription for the user, the error chain carries a
    /// `DuplicateOpenSubscription` marker.
    async fn create(
        &self,
        insert_subscription_entity: InsertSubscriptionEntity,
    ) -> Result<SubscriptionEntity>;

    async fn find_by_id(&self, subscription_id: i64) -> Result<Option<SubscriptionEntity>>;

    /// Fast-path lookup for the exclusivity precondition: any subscription of
    /// the user whose status is neither `completed` nor `cancelled`.
    async fn find_non_terminal_by_user(&self, user_id: Uuid)
    -> Result<Option<SubscriptionEntity>>;

    async fn update_status(
        &self,
        subscription_id: i64,
        status: SubscriptionStatus,
    ) -> Result<SubscriptionEntity>;

    async fn cancel(
        &self,
        subscription_id: i64,
        reason: Option<String>,
    ) -> Result<SubscriptionEntity>;
}
