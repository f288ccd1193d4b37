use std::sync::Arc;

use chrono::{DateTime, Days, NaiveTime, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::{
    entities::orders::OrderEntity,
    repositories::{orders::OrderRepository, subscriptions::SubscriptionRepository},
    value_objects::{
        enums::subscription_statuses::SubscriptionStatus, orders::ActivateOrderModel,
        store_errors::StoreUnavailable,
    },
};

/// Fallback delivery slot when the subscription records no preferred time.
const DEFAULT_DELIVERY_TIME: (u32, u32) = (12, 0);

#[derive(Debug, Error)]
pub enum OrderActivationError {
    #[error("subscription not found")]
    SubscriptionNotFound,
    #[error("subscription is not active")]
    SubscriptionNotActive,
    #[error("an order is already in progress for this subscription")]
    OrderInProgress,
    #[error("no pending orders remain for this subscription")]
    NoPendingOrders,
    #[error("storage is unavailable, retry later")]
    StoreUnavailable,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl OrderActivationError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            OrderActivationError::SubscriptionNotFound => StatusCode::NOT_FOUND,
            OrderActivationError::SubscriptionNotActive => StatusCode::CONFLICT,
            OrderActivationError::OrderInProgress => StatusCode::CONFLICT,
            OrderActivationError::NoPendingOrders => StatusCode::NOT_FOUND,
            OrderActivationError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            OrderActivationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct OrderActivationUseCase<S, O>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
{
    subscription_repo: Arc<S>,
    order_repo: Arc<O>,
}

impl<S, O> OrderActivationUseCase<S, O>
where
    S: SubscriptionRepository + Send + Sync + 'static,
    O: OrderRepository + Send + Sync + 'static,
{
    pub fn new(subscription_repo: Arc<S>, order_repo: Arc<O>) -> Self {
        Self {
            subscription_repo,
            order_repo,
        }
    }

    /// Promotes the oldest pending order of an active subscription to
    /// `confirmed`, assigning its delivery slot. At most one order may be in
    /// flight; a second call while one is in flight fails with
    /// `OrderInProgress` and mutates nothing, which also makes retries safe.
    pub async fn activate_next_subscription_order(
        &self,
        subscription_id: i64,
        model: ActivateOrderModel,
    ) -> Result<OrderEntity, OrderActivationError> {
        info!(
            subscription_id,
            explicit_date = ?model.scheduled_delivery_date,
            "order_activation: activation requested"
        );

        let subscription = self
            .subscription_repo
            .find_by_id(subscription_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| {
                let err = OrderActivationError::SubscriptionNotFound;
                warn!(
                    subscription_id,
                    status = err.status_code().as_u16(),
                    "order_activation: unknown subscription"
                );
                err
            })?;

        if SubscriptionStatus::from_str(&subscription.status) != Some(SubscriptionStatus::Active) {
            let err = OrderActivationError::SubscriptionNotActive;
            warn!(
                subscription_id,
                subscription_status = %subscription.status,
                status = err.status_code().as_u16(),
                "order_activation: subscription is not active"
            );
            return Err(err);
        }

        let in_flight = self
            .order_repo
            .count_in_flight(subscription_id)
            .await
            .map_err(map_store_error)?;
        if in_flight > 0 {
            let err = OrderActivationError::OrderInProgress;
            warn!(
                subscription_id,
                in_flight,
                status = err.status_code().as_u16(),
                "order_activation: an order is already in flight"
            );
            return Err(err);
        }

        let next_order = self
            .order_repo
            .find_oldest_pending(subscription_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| {
                let err = OrderActivationError::NoPendingOrders;
                info!(
                    subscription_id,
                    status = err.status_code().as_u16(),
                    "order_activation: no pending orders remain"
                );
                err
            })?;

        let scheduled = model
            .scheduled_delivery_date
            .unwrap_or_else(|| derive_delivery_slot(subscription.preferred_delivery_time.as_deref()));

        // The promotion is conditional on the row still being pending; a
        // racing activation that won in between leaves nothing to update.
        let confirmed = self
            .order_repo
            .confirm_pending_order(next_order.id, scheduled)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| {
                let err = OrderActivationError::OrderInProgress;
                warn!(
                    subscription_id,
                    order_id = next_order.id,
                    status = err.status_code().as_u16(),
                    "order_activation: order was promoted concurrently"
                );
                err
            })?;

        info!(
            subscription_id,
            order_id = confirmed.id,
            order_number = %confirmed.order_number,
            scheduled_delivery_date = %scheduled,
            "order_activation: order confirmed"
        );

        Ok(confirmed)
    }
}

/// Tomorrow at the subscription's preferred delivery time (noon when none or
/// unparsable).
fn derive_delivery_slot(preferred_delivery_time: Option<&str>) -> DateTime<Utc> {
    let time = preferred_delivery_time
        .and_then(|value| NaiveTime::parse_from_str(value, "%H:%M").ok())
        .unwrap_or_else(|| {
            NaiveTime::from_hms_opt(DEFAULT_DELIVERY_TIME.0, DEFAULT_DELIVERY_TIME.1, 0)
                .expect("default delivery time is valid")
        });

    let tomorrow = Utc::now()
        .date_naive()
        .checked_add_days(Days::new(1))
        .expect("tomorrow is representable");

    tomorrow.and_time(time).and_utc()
}

fn map_store_error(err: anyhow::Error) -> OrderActivationError {
    if err.downcast_ref::<StoreUnavailable>().is_some() {
        error!(db_error = ?err, "order_activation: storage unavailable");
        return OrderActivationError::StoreUnavailable;
    }
    OrderActivationError::Internal(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application::usecases::test_support::{sample_order, sample_subscription},
        domain::{
            repositories::{
                orders::MockOrderRepository, subscriptions::MockSubscriptionRepository,
            },
            value_objects::enums::order_statuses::OrderStatus,
        },
    };
    use chrono::Timelike;
    use mockall::predicate::eq;

    fn subscription_repo_returning(
        subscription: crate::domain::entities::subscriptions::SubscriptionEntity,
    ) -> MockSubscriptionRepository {
        let mut repo = MockSubscriptionRepository::new();
        repo.expect_find_by_id().returning(move |_| {
            let sub = subscription.clone();
            Box::pin(async move { Ok(Some(sub)) })
        });
        repo
    }

    #[tokio::test]
    async fn fails_with_order_in_progress_when_one_is_in_flight() {
        let subscription_repo = subscription_repo_returning(sample_subscription(5));

        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_count_in_flight()
            .with(eq(5i64))
            .returning(|_| Box::pin(async { Ok(1) }));
        // No other order_repo expectations: the gate must stop everything.

        let usecase = OrderActivationUseCase::new(Arc::new(subscription_repo), Arc::new(order_repo));
        let err = usecase
            .activate_next_subscription_order(5, ActivateOrderModel::default())
            .await
            .unwrap_err();

        assert!(matches!(err, OrderActivationError::OrderInProgress));
    }

    #[tokio::test]
    async fn signals_no_pending_orders_when_sequence_is_exhausted() {
        let subscription_repo = subscription_repo_returning(sample_subscription(5));

        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_count_in_flight()
            .returning(|_| Box::pin(async { Ok(0) }));
        order_repo
            .expect_find_oldest_pending()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = OrderActivationUseCase::new(Arc::new(subscription_repo), Arc::new(order_repo));
        let err = usecase
            .activate_next_subscription_order(5, ActivateOrderModel::default())
            .await
            .unwrap_err();

        assert!(matches!(err, OrderActivationError::NoPendingOrders));
    }

    #[tokio::test]
    async fn paused_subscription_blocks_activation() {
        let mut subscription = sample_subscription(5);
        subscription.status = SubscriptionStatus::Paused.to_string();
        let subscription_repo = subscription_repo_returning(subscription);

        let usecase = OrderActivationUseCase::new(
            Arc::new(subscription_repo),
            Arc::new(MockOrderRepository::new()),
        );
        let err = usecase
            .activate_next_subscription_order(5, ActivateOrderModel::default())
            .await
            .unwrap_err();

        assert!(matches!(err, OrderActivationError::SubscriptionNotActive));
    }

    #[tokio::test]
    async fn promotes_oldest_pending_at_the_preferred_time() {
        // sample_subscription prefers 11:30.
        let subscription_repo = subscription_repo_returning(sample_subscription(5));

        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_count_in_flight()
            .returning(|_| Box::pin(async { Ok(0) }));
        order_repo.expect_find_oldest_pending().returning(|_| {
            Box::pin(async { Ok(Some(sample_order(31, Some(5), OrderStatus::Pending))) })
        });
        order_repo
            .expect_confirm_pending_order()
            .withf(|order_id, scheduled| {
                *order_id == 31 && scheduled.hour() == 11 && scheduled.minute() == 30
            })
            .returning(|order_id, scheduled| {
                Box::pin(async move {
                    let mut order = sample_order(order_id, Some(5), OrderStatus::Confirmed);
                    order.scheduled_delivery_date = Some(scheduled);
                    Ok(Some(order))
                })
            });

        let usecase = OrderActivationUseCase::new(Arc::new(subscription_repo), Arc::new(order_repo));
        let order = usecase
            .activate_next_subscription_order(5, ActivateOrderModel::default())
            .await
            .unwrap();

        assert_eq!(order.id, 31);
        assert_eq!(order.status, OrderStatus::Confirmed.to_string());
        assert!(order.scheduled_delivery_date.is_some());
    }

    #[tokio::test]
    async fn explicit_delivery_date_wins_over_derivation() {
        let subscription_repo = subscription_repo_returning(sample_subscription(5));
        let explicit = Utc::now() + chrono::Duration::days(3);

        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_count_in_flight()
            .returning(|_| Box::pin(async { Ok(0) }));
        order_repo.expect_find_oldest_pending().returning(|_| {
            Box::pin(async { Ok(Some(sample_order(31, Some(5), OrderStatus::Pending))) })
        });
        order_repo
            .expect_confirm_pending_order()
            .with(eq(31i64), eq(explicit))
            .returning(|order_id, _| {
                Box::pin(async move {
                    Ok(Some(sample_order(order_id, Some(5), OrderStatus::Confirmed)))
                })
            });

        let usecase = OrderActivationUseCase::new(Arc::new(subscription_repo), Arc::new(order_repo));
        usecase
            .activate_next_subscription_order(
                5,
                ActivateOrderModel {
                    scheduled_delivery_date: Some(explicit),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn lost_promotion_race_reports_order_in_progress() {
        let subscription_repo = subscription_repo_returning(sample_subscription(5));

        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_count_in_flight()
            .returning(|_| Box::pin(async { Ok(0) }));
        order_repo.expect_find_oldest_pending().returning(|_| {
            Box::pin(async { Ok(Some(sample_order(31, Some(5), OrderStatus::Pending))) })
        });
        // The row was already promoted by the concurrent caller.
        order_repo
            .expect_confirm_pending_order()
            .returning(|_, _| Box::pin(async { Ok(None) }));

        let usecase = OrderActivationUseCase::new(Arc::new(subscription_repo), Arc::new(order_repo));
        let err = usecase
            .activate_next_subscription_order(5, ActivateOrderModel::default())
            .await
            .unwrap_err();

        assert!(matches!(err, OrderActivationError::OrderInProgress));
    }
}
