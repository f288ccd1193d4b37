use std::sync::Arc;

use chrono::{NaiveTime, Utc};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    entities::subscriptions::InsertSubscriptionEntity,
    repositories::{
        catalog::CatalogRepository, orders::OrderRepository, subscriptions::SubscriptionRepository,
    },
    value_objects::{
        enums::subscription_statuses::SubscriptionStatus,
        orders::{ActivateOrderModel, OrderDto},
        store_errors::{DuplicateOpenSubscription, StoreUnavailable},
        subscriptions::{
            CreateSubscriptionModel, PlanPayload, SubscriptionDto, SubscriptionProgressDto,
        },
    },
};

use super::{
    order_activation::{OrderActivationError, OrderActivationUseCase},
    order_generation::{OrderGenerationError, OrderGenerationUseCase},
};

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("an active subscription already exists for this user")]
    ActiveSubscriptionExists,
    #[error("plan not found")]
    PlanNotFound,
    #[error("subscription not found")]
    SubscriptionNotFound,
    #[error("subscription cannot move from {from} to {to}")]
    InvalidStatusChange {
        from: SubscriptionStatus,
        to: SubscriptionStatus,
    },
    #[error("invalid subscription data: {0}")]
    Validation(String),
    #[error("subscription created but order generation failed: {0}")]
    OrderGeneration(#[source] OrderGenerationError),
    #[error("storage is unavailable, retry later")]
    StoreUnavailable,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SubscriptionError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            SubscriptionError::ActiveSubscriptionExists => StatusCode::CONFLICT,
            SubscriptionError::PlanNotFound => StatusCode::NOT_FOUND,
            SubscriptionError::SubscriptionNotFound => StatusCode::NOT_FOUND,
            SubscriptionError::InvalidStatusChange { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SubscriptionError::Validation(_) => StatusCode::BAD_REQUEST,
            SubscriptionError::OrderGeneration(inner) => inner.status_code(),
            SubscriptionError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            SubscriptionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct SubscriptionUseCase<S, O, C>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    order_repo: Arc<O>,
    catalog_repo: Arc<C>,
    order_generation: Arc<OrderGenerationUseCase<S, O, C>>,
    order_activation: Arc<OrderActivationUseCase<S, O>>,
}

impl<S, O, C> SubscriptionUseCase<S, O, C>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
    C: CatalogRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>, order_repo: Arc<O>, catalog_repo: Arc<C>) -> Self {
        let order_generation = Arc::new(OrderGenerationUseCase::new(
            Arc::clone(&subscription_repo),
            Arc::clone(&order_repo),
            Arc::clone(&catalog_repo),
        ));
        let order_activation = Arc::new(OrderActivationUseCase::new(
            Arc::clone(&subscription_repo),
            Arc::clone(&order_repo),
        ));
        Self {
            subscription_repo,
            order_repo,
            catalog_repo,
            order_generation,
            order_activation,
        }
    }

    /// Creates the user's subscription, generates its full order sequence,
    /// and — for an `active` initial status — eagerly activates the first
    /// order. The one-open-subscription rule is checked optimistically here
    /// and enforced for real by the storage-level partial unique index; a
    /// unique violation on insert is re-signalled as
    /// `ActiveSubscriptionExists`, never as a generic failure.
    pub async fn create_subscription(
        &self,
        user_id: Uuid,
        model: CreateSubscriptionModel,
    ) -> Result<SubscriptionDto, SubscriptionError> {
        info!(
            %user_id,
            plan_id = model.plan_id,
            total_meals = model.total_meals,
            "subscriptions: create requested"
        );

        let initial_status = self.validate_create(user_id, &model)?;

        self.catalog_repo
            .find_active_plan_by_id(model.plan_id)
            .await
            .map_err(|err| self.store_error(user_id, err))?
            .ok_or_else(|| {
                let err = SubscriptionError::PlanNotFound;
                warn!(
                    %user_id,
                    plan_id = model.plan_id,
                    status = err.status_code().as_u16(),
                    "subscriptions: plan missing or inactive"
                );
                err
            })?;

        // Fast-path check for good UX; the partial unique index is the
        // arbiter when two creations race past this point.
        if let Some(existing) = self
            .subscription_repo
            .find_non_terminal_by_user(user_id)
            .await
            .map_err(|err| self.store_error(user_id, err))?
        {
            let err = SubscriptionError::ActiveSubscriptionExists;
            warn!(
                %user_id,
                existing_subscription_id = existing.id,
                existing_status = %existing.status,
                status = err.status_code().as_u16(),
                "subscriptions: user already has an open subscription"
            );
            return Err(err);
        }

        let now = Utc::now();
        let subscription = self
            .subscription_repo
            .create(InsertSubscriptionEntity {
                user_id,
                plan_id: model.plan_id,
                status: initial_status.to_string(),
                total_meals: model.total_meals,
                consumed_meals: 0,
                preferred_delivery_time: model.preferred_delivery_time.clone(),
                delivery_address_id: model.delivery_address_id,
                auto_renewal: model.auto_renewal,
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(|err| {
                if err.downcast_ref::<DuplicateOpenSubscription>().is_some() {
                    let err = SubscriptionError::ActiveSubscriptionExists;
                    warn!(
                        %user_id,
                        status = err.status_code().as_u16(),
                        "subscriptions: insert lost the exclusivity race, unique index held"
                    );
                    return err;
                }
                self.store_error(user_id, err)
            })?;

        info!(
            %user_id,
            subscription_id = subscription.id,
            status = %subscription.status,
            "subscriptions: subscription created"
        );

        let orders = self
            .order_generation
            .create_subscription_orders(
                subscription.id,
                PlanPayload {
                    total_meals: model.total_meals,
                    deliveries: model.deliveries,
                },
            )
            .await
            .map_err(|err| {
                // The subscription row exists without orders at this point;
                // the caller must compensate (cancel or retry generation).
                error!(
                    %user_id,
                    subscription_id = subscription.id,
                    error = %err,
                    "subscriptions: order generation failed after subscription insert"
                );
                SubscriptionError::OrderGeneration(err)
            })?;

        info!(
            %user_id,
            subscription_id = subscription.id,
            order_count = orders.len(),
            "subscriptions: delivery sequence generated"
        );

        if initial_status == SubscriptionStatus::Active {
            match self
                .order_activation
                .activate_next_subscription_order(subscription.id, ActivateOrderModel::default())
                .await
            {
                Ok(order) => info!(
                    subscription_id = subscription.id,
                    order_id = order.id,
                    "subscriptions: first order activated"
                ),
                Err(
                    err @ (OrderActivationError::OrderInProgress
                    | OrderActivationError::NoPendingOrders),
                ) => warn!(
                    subscription_id = subscription.id,
                    error = %err,
                    "subscriptions: eager activation skipped"
                ),
                Err(err) => error!(
                    subscription_id = subscription.id,
                    error = %err,
                    "subscriptions: eager activation failed, orders remain pending"
                ),
            }
        }

        Ok(SubscriptionDto::from(subscription))
    }

    pub async fn pause_subscription(
        &self,
        subscription_id: i64,
        reason: Option<String>,
    ) -> Result<SubscriptionDto, SubscriptionError> {
        info!(subscription_id, reason = ?reason, "subscriptions: pause requested");
        // Pausing leaves in-flight orders alone: meals already in
        // preparation are still delivered.
        self.change_status(subscription_id, SubscriptionStatus::Paused, &[SubscriptionStatus::Active])
            .await
    }

    pub async fn resume_subscription(
        &self,
        subscription_id: i64,
    ) -> Result<SubscriptionDto, SubscriptionError> {
        info!(subscription_id, "subscriptions: resume requested");
        self.change_status(subscription_id, SubscriptionStatus::Active, &[SubscriptionStatus::Paused])
            .await
    }

    /// Cancels the subscription. Remaining pending orders are deliberately
    /// left untouched so refund workflows can run first; callers pair this
    /// with `cancel_remaining_pending_orders`.
    pub async fn cancel_subscription(
        &self,
        subscription_id: i64,
        reason: Option<String>,
    ) -> Result<SubscriptionDto, SubscriptionError> {
        info!(subscription_id, reason = ?reason, "subscriptions: cancel requested");

        let subscription = self.load(subscription_id).await?;
        let current = parse_status(&subscription.status)?;
        if current.is_terminal() {
            let err = SubscriptionError::InvalidStatusChange {
                from: current,
                to: SubscriptionStatus::Cancelled,
            };
            warn!(
                subscription_id,
                from = %current,
                status = err.status_code().as_u16(),
                "subscriptions: cancel rejected, already terminal"
            );
            return Err(err);
        }

        let cancelled = self
            .subscription_repo
            .cancel(subscription_id, reason)
            .await
            .map_err(|err| {
                error!(
                    subscription_id,
                    db_error = ?err,
                    "subscriptions: failed to cancel subscription"
                );
                map_store_error(err)
            })?;

        info!(subscription_id, "subscriptions: subscription cancelled");
        Ok(SubscriptionDto::from(cancelled))
    }

    /// Bulk-cancels the subscription's remaining pending orders. The
    /// explicit companion to `cancel_subscription`; returns how many orders
    /// were cancelled.
    pub async fn cancel_remaining_pending_orders(
        &self,
        subscription_id: i64,
        reason: Option<String>,
    ) -> Result<usize, SubscriptionError> {
        self.load(subscription_id).await?;

        let cancelled = self
            .order_repo
            .cancel_pending_by_subscription(subscription_id, reason)
            .await
            .map_err(|err| {
                error!(
                    subscription_id,
                    db_error = ?err,
                    "subscriptions: failed to bulk-cancel pending orders"
                );
                map_store_error(err)
            })?;

        info!(
            subscription_id,
            cancelled_orders = cancelled,
            "subscriptions: pending orders cancelled"
        );
        Ok(cancelled)
    }

    pub async fn list_subscription_orders(
        &self,
        subscription_id: i64,
    ) -> Result<Vec<OrderDto>, SubscriptionError> {
        self.load(subscription_id).await?;

        let orders = self
            .order_repo
            .list_by_subscription(subscription_id)
            .await
            .map_err(|err| {
                error!(
                    subscription_id,
                    db_error = ?err,
                    "subscriptions: failed to list orders"
                );
                map_store_error(err)
            })?;

        Ok(orders.into_iter().map(OrderDto::from).collect())
    }

    pub async fn get_subscription_progress(
        &self,
        subscription_id: i64,
    ) -> Result<SubscriptionProgressDto, SubscriptionError> {
        let subscription = self.load(subscription_id).await?;
        let tally = self
            .order_repo
            .status_tally(subscription_id)
            .await
            .map_err(|err| {
                error!(
                    subscription_id,
                    db_error = ?err,
                    "subscriptions: failed to tally orders"
                );
                map_store_error(err)
            })?;

        let remaining_meals = subscription.total_meals - subscription.consumed_meals;
        Ok(SubscriptionProgressDto {
            subscription: SubscriptionDto::from(subscription),
            total_orders: tally.total,
            pending_orders: tally.pending,
            in_flight_orders: tally.in_flight,
            delivered_orders: tally.delivered,
            cancelled_orders: tally.cancelled,
            remaining_meals,
        })
    }

    fn validate_create(
        &self,
        user_id: Uuid,
        model: &CreateSubscriptionModel,
    ) -> Result<SubscriptionStatus, SubscriptionError> {
        if model.total_meals < 1 {
            return Err(self.validation(
                user_id,
                format!("total_meals must be at least 1, got {}", model.total_meals),
            ));
        }
        if let Some(time) = model.preferred_delivery_time.as_deref() {
            if NaiveTime::parse_from_str(time, "%H:%M").is_err() {
                return Err(self.validation(
                    user_id,
                    format!("preferred_delivery_time {:?} is not HH:MM", time),
                ));
            }
        }

        let initial_status = model.initial_status.unwrap_or(SubscriptionStatus::Pending);
        match initial_status {
            SubscriptionStatus::Pending | SubscriptionStatus::Active => Ok(initial_status),
            other => Err(self.validation(
                user_id,
                format!("initial status {} is not allowed at creation", other),
            )),
        }
    }

    async fn change_status(
        &self,
        subscription_id: i64,
        to: SubscriptionStatus,
        allowed_from: &[SubscriptionStatus],
    ) -> Result<SubscriptionDto, SubscriptionError> {
        let subscription = self.load(subscription_id).await?;
        let current = parse_status(&subscription.status)?;

        if !allowed_from.contains(&current) {
            let err = SubscriptionError::InvalidStatusChange { from: current, to };
            warn!(
                subscription_id,
                from = %current,
                to = %to,
                status = err.status_code().as_u16(),
                "subscriptions: status change rejected"
            );
            return Err(err);
        }

        let updated = self
            .subscription_repo
            .update_status(subscription_id, to)
            .await
            .map_err(|err| {
                error!(
                    subscription_id,
                    to = %to,
                    db_error = ?err,
                    "subscriptions: failed to update status"
                );
                map_store_error(err)
            })?;

        info!(subscription_id, from = %current, to = %to, "subscriptions: status updated");
        Ok(SubscriptionDto::from(updated))
    }

    async fn load(
        &self,
        subscription_id: i64,
    ) -> Result<crate::domain::entities::subscriptions::SubscriptionEntity, SubscriptionError> {
        self.subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| {
                let err = SubscriptionError::SubscriptionNotFound;
                warn!(
                    subscription_id,
                    status = err.status_code().as_u16(),
                    "subscriptions: unknown subscription"
                );
                err
            })
    }

    fn validation(&self, user_id: Uuid, message: String) -> SubscriptionError {
        let err = SubscriptionError::Validation(message);
        warn!(
            %user_id,
            status = err.status_code().as_u16(),
            error = %err,
            "subscriptions: request rejected"
        );
        err
    }

    fn store_error(&self, user_id: Uuid, err: anyhow::Error) -> SubscriptionError {
        if err.downcast_ref::<StoreUnavailable>().is_some() {
            error!(%user_id, db_error = ?err, "subscriptions: storage unavailable");
            return SubscriptionError::StoreUnavailable;
        }
        error!(%user_id, db_error = ?err, "subscriptions: storage failure");
        SubscriptionError::Internal(err)
    }
}

fn parse_status(value: &str) -> Result<SubscriptionStatus, SubscriptionError> {
    SubscriptionStatus::from_str(value)
        .ok_or_else(|| anyhow::anyhow!("subscription has unknown status {:?}", value).into())
}

fn map_store_error(err: anyhow::Error) -> SubscriptionError {
    if err.downcast_ref::<StoreUnavailable>().is_some() {
        return SubscriptionError::StoreUnavailable;
    }
    SubscriptionError::Internal(err)
}
