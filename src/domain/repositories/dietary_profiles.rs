use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

/// A user's recorded allergy and dietary-preference edges.
#[async_trait]
#[automock]
pub trait DietaryProfileRepository {
    async fn allergy_ids_for_user(&self, user_id: Uuid) -> Result<Vec<i64>>;

    /// The `key` column of each preference the user has recorded, resolved
    /// through the `user_dietary_preferences` join.
    async fn preference_keys_for_user(&self, user_id: Uuid) -> Result<Vec<String>>;
}
