use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::{
    entities::{
        catalog::{ItemEntity, MealEntity},
        orders::{InsertOrderEntity, InsertOrderItemLine, InsertOrderMealLine, InsertOrderWithLines, OrderEntity},
        subscriptions::SubscriptionEntity,
    },
    repositories::{
        catalog::CatalogRepository, orders::OrderRepository, subscriptions::SubscriptionRepository,
    },
    value_objects::{
        enums::{order_statuses::OrderStatus, payment_statuses::PaymentStatus},
        store_errors::StoreUnavailable,
        subscriptions::{DeliverySelection, PlanPayload, SelectionLine},
    },
};

/// Note carried by orders generated without a delivery selection. The
/// product has not decided how these get filled in; flagging beats guessing.
pub const AWAITING_SELECTION_NOTE: &str = "awaiting selection";

#[derive(Debug, Error)]
pub enum OrderGenerationError {
    #[error("subscription not found")]
    SubscriptionNotFound,
    #[error("invalid plan payload: {0}")]
    Validation(String),
    #[error("order batch aborted, no orders were created: {0}")]
    BatchAborted(#[source] anyhow::Error),
    #[error("storage is unavailable, retry later")]
    StoreUnavailable,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl OrderGenerationError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            OrderGenerationError::SubscriptionNotFound => StatusCode::NOT_FOUND,
            OrderGenerationError::Validation(_) => StatusCode::BAD_REQUEST,
            OrderGenerationError::BatchAborted(_) => StatusCode::INTERNAL_SERVER_ERROR,
            OrderGenerationError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            OrderGenerationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct OrderGenerationUseCase<S, O, C>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    order_repo: Arc<O>,
    catalog_repo: Arc<C>,
}

impl<S, O, C> OrderGenerationUseCase<S, O, C>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>, order_repo: Arc<O>, catalog_repo: Arc<C>) -> Self {
        Self {
            subscription_repo,
            order_repo,
            catalog_repo,
        }
    }

    /// Materializes the full delivery sequence for a subscription: exactly
    /// `total_meals` orders, all `pending`, delivery dates unassigned until
    /// activation, line items snapshotted from the catalog at this moment.
    pub async fn create_subscription_orders(
        &self,
        subscription_id: i64,
        payload: PlanPayload,
    ) -> Result<Vec<OrderEntity>, OrderGenerationError> {
        info!(
            subscription_id,
            total_meals = payload.total_meals,
            delivery_selections = payload.deliveries.len(),
            "order_generation: generating subscription orders"
        );

        let subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| {
                let err = OrderGenerationError::SubscriptionNotFound;
                warn!(
                    subscription_id,
                    status = err.status_code().as_u16(),
                    "order_generation: unknown subscription"
                );
                err
            })?;

        let batch = self.build_batch(&subscription, &payload).await?;

        let orders = self.order_repo.create_batch(batch).await.map_err(|err| {
            if err.downcast_ref::<StoreUnavailable>().is_some() {
                error!(
                    subscription_id,
                    db_error = ?err,
                    "order_generation: storage unavailable during batch insert"
                );
                return OrderGenerationError::StoreUnavailable;
            }
            error!(
                subscription_id,
                db_error = ?err,
                "order_generation: batch insert aborted"
            );
            OrderGenerationError::BatchAborted(err)
        })?;

        info!(
            subscription_id,
            order_count = orders.len(),
            "order_generation: subscription orders created"
        );

        Ok(orders)
    }

    async fn build_batch(
        &self,
        subscription: &SubscriptionEntity,
        payload: &PlanPayload,
    ) -> Result<Vec<InsertOrderWithLines>, OrderGenerationError> {
        if payload.total_meals < 1 {
            return Err(self.validation(
                subscription.id,
                format!("total_meals must be at least 1, got {}", payload.total_meals),
            ));
        }
        if payload.deliveries.len() > payload.total_meals as usize {
            return Err(self.validation(
                subscription.id,
                format!(
                    "{} delivery selections exceed total_meals {}",
                    payload.deliveries.len(),
                    payload.total_meals
                ),
            ));
        }
        for (idx, delivery) in payload.deliveries.iter().enumerate() {
            for line in delivery.meals.iter().chain(delivery.items.iter()) {
                if line.quantity < 1 {
                    return Err(self.validation(
                        subscription.id,
                        format!(
                            "delivery {} references catalog id {} with quantity {}",
                            idx, line.catalog_id, line.quantity
                        ),
                    ));
                }
            }
        }

        let (meals_by_id, items_by_id) = self
            .load_referenced_catalog(subscription.id, &payload.deliveries)
            .await?;

        if payload.deliveries.len() < payload.total_meals as usize {
            warn!(
                subscription_id = subscription.id,
                provided = payload.deliveries.len(),
                total_meals = payload.total_meals,
                "order_generation: payload shorter than total_meals, tail orders await selection"
            );
        }

        let now = Utc::now();
        let mut batch = Vec::with_capacity(payload.total_meals as usize);
        for idx in 0..payload.total_meals as usize {
            let selection = payload.deliveries.get(idx);

            let meal_lines: Vec<InsertOrderMealLine> = selection
                .map(|s| {
                    s.meals
                        .iter()
                        .map(|line| snapshot_meal_line(line, &meals_by_id))
                        .collect()
                })
                .unwrap_or_default();
            let item_lines: Vec<InsertOrderItemLine> = selection
                .map(|s| {
                    s.items
                        .iter()
                        .map(|line| snapshot_item_line(line, &items_by_id))
                        .collect()
                })
                .unwrap_or_default();

            let total_minor: i32 = meal_lines
                .iter()
                .map(|l| l.total_price_minor)
                .chain(item_lines.iter().map(|l| l.total_price_minor))
                .sum();

            let notes = if selection.is_some() {
                None
            } else {
                Some(AWAITING_SELECTION_NOTE.to_string())
            };

            batch.push(InsertOrderWithLines {
                order: InsertOrderEntity {
                    order_number: format!("SUB{}-{:03}", subscription.id, idx + 1),
                    subscription_id: Some(subscription.id),
                    user_id: subscription.user_id,
                    status: OrderStatus::Pending.to_string(),
                    payment_status: PaymentStatus::Pending.to_string(),
                    delivery_address_id: subscription.delivery_address_id,
                    notes,
                    total_minor,
                    created_at: now,
                    updated_at: now,
                },
                meal_lines,
                item_lines,
            });
        }

        Ok(batch)
    }

    async fn load_referenced_catalog(
        &self,
        subscription_id: i64,
        deliveries: &[DeliverySelection],
    ) -> Result<(HashMap<i64, MealEntity>, HashMap<i64, ItemEntity>), OrderGenerationError> {
        let mut meal_ids: Vec<i64> = deliveries
            .iter()
            .flat_map(|d| d.meals.iter().map(|l| l.catalog_id))
            .collect();
        meal_ids.sort_unstable();
        meal_ids.dedup();

        let mut item_ids: Vec<i64> = deliveries
            .iter()
            .flat_map(|d| d.items.iter().map(|l| l.catalog_id))
            .collect();
        item_ids.sort_unstable();
        item_ids.dedup();

        let meals = self
            .catalog_repo
            .find_meals_by_ids(meal_ids.clone())
            .await
            .map_err(map_store_error)?;
        let items = self
            .catalog_repo
            .find_items_by_ids(item_ids.clone())
            .await
            .map_err(map_store_error)?;

        let meals_by_id: HashMap<i64, MealEntity> = meals.into_iter().map(|m| (m.id, m)).collect();
        let items_by_id: HashMap<i64, ItemEntity> = items.into_iter().map(|i| (i.id, i)).collect();

        if let Some(missing) = meal_ids.iter().find(|id| !meals_by_id.contains_key(id)) {
            return Err(
                self.validation(subscription_id, format!("unknown meal id {}", missing))
            );
        }
        if let Some(missing) = item_ids.iter().find(|id| !items_by_id.contains_key(id)) {
            return Err(
                self.validation(subscription_id, format!("unknown item id {}", missing))
            );
        }

        Ok((meals_by_id, items_by_id))
    }

    fn validation(&self, subscription_id: i64, message: String) -> OrderGenerationError {
        let err = OrderGenerationError::Validation(message);
        warn!(
            subscription_id,
            status = err.status_code().as_u16(),
            error = %err,
            "order_generation: payload rejected"
        );
        err
    }
}

fn snapshot_meal_line(
    line: &SelectionLine,
    meals_by_id: &HashMap<i64, MealEntity>,
) -> InsertOrderMealLine {
    // Referenced ids are validated before snapshotting.
    let meal = &meals_by_id[&line.catalog_id];
    InsertOrderMealLine {
        meal_id: Some(meal.id),
        name: meal.name.clone(),
        quantity: line.quantity,
        unit_price_minor: meal.price_minor,
        total_price_minor: meal.price_minor * line.quantity,
    }
}

fn snapshot_item_line(
    line: &SelectionLine,
    items_by_id: &HashMap<i64, ItemEntity>,
) -> InsertOrderItemLine {
    let item = &items_by_id[&line.catalog_id];
    InsertOrderItemLine {
        item_id: Some(item.id),
        name: item.name.clone(),
        quantity: line.quantity,
        unit_price_minor: item.price_minor,
        total_price_minor: item.price_minor * line.quantity,
    }
}

fn map_store_error(err: anyhow::Error) -> OrderGenerationError {
    if err.downcast_ref::<StoreUnavailable>().is_some() {
        error!(db_error = ?err, "order_generation: storage unavailable");
        return OrderGenerationError::StoreUnavailable;
    }
    OrderGenerationError::Internal(err)
}
