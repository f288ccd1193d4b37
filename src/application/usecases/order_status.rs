use std::sync::Arc;

use anyhow::anyhow;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::domain::{
    entities::orders::OrderEntity,
    repositories::orders::OrderRepository,
    value_objects::{
        enums::{order_statuses::OrderStatus, payment_statuses::PaymentStatus},
        orders::UpdateOrderStatusModel,
        store_errors::StoreUnavailable,
    },
};

#[derive(Debug, Error)]
pub enum OrderStatusError {
    #[error("order not found")]
    OrderNotFound,
    #[error("order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("storage is unavailable, retry later")]
    StoreUnavailable,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl OrderStatusError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            OrderStatusError::OrderNotFound => StatusCode::NOT_FOUND,
            OrderStatusError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            OrderStatusError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            OrderStatusError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct OrderStatusUseCase<O>
where
    O: OrderRepository + Send + Sync + 'static,
{
    order_repo: Arc<O>,
}

impl<O> OrderStatusUseCase<O>
where
    O: OrderRepository + Send + Sync + 'static,
{
    pub fn new(order_repo: Arc<O>) -> Self {
        Self { order_repo }
    }

    /// Validates and applies one status transition. The delivered transition
    /// goes through `mark_delivered` so the actual delivery date and the
    /// parent subscription's progress counter move in the same transaction.
    pub async fn update_order_status(
        &self,
        order_id: i64,
        model: UpdateOrderStatusModel,
    ) -> Result<OrderEntity, OrderStatusError> {
        let order = self
            .order_repo
            .find_by_id(order_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| {
                let err = OrderStatusError::OrderNotFound;
                warn!(
                    order_id,
                    status = err.status_code().as_u16(),
                    "order_status: unknown order"
                );
                err
            })?;

        let current = OrderStatus::from_str(&order.status)
            .ok_or_else(|| anyhow!("order {} has unknown status {:?}", order_id, order.status))?;
        let payment = PaymentStatus::from_str(&order.payment_status).ok_or_else(|| {
            anyhow!(
                "order {} has unknown payment status {:?}",
                order_id,
                order.payment_status
            )
        })?;

        if !current.can_transition_to(model.status, payment) {
            let err = OrderStatusError::InvalidTransition {
                from: current,
                to: model.status,
            };
            warn!(
                order_id,
                from = %current,
                to = %model.status,
                payment_status = %payment,
                status = err.status_code().as_u16(),
                "order_status: transition rejected"
            );
            return Err(err);
        }

        let updated = if model.status == OrderStatus::Delivered {
            self.order_repo
                .mark_delivered(order_id, model.notes)
                .await
                .map_err(|err| {
                    error!(
                        order_id,
                        db_error = ?err,
                        "order_status: delivered transition failed"
                    );
                    map_store_error(err)
                })?
        } else {
            self.order_repo
                .update_status(order_id, model.status, model.notes)
                .await
                .map_err(|err| {
                    error!(
                        order_id,
                        to = %model.status,
                        db_error = ?err,
                        "order_status: status update failed"
                    );
                    map_store_error(err)
                })?
        };

        info!(
            order_id,
            from = %current,
            to = %model.status,
            "order_status: transition applied"
        );

        Ok(updated)
    }
}

fn map_store_error(err: anyhow::Error) -> OrderStatusError {
    if err.downcast_ref::<StoreUnavailable>().is_some() {
        return OrderStatusError::StoreUnavailable;
    }
    OrderStatusError::Internal(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application::usecases::test_support::sample_order,
        domain::repositories::orders::MockOrderRepository,
    };
    use chrono::Utc;
    use mockall::predicate::eq;

    #[tokio::test]
    async fn forward_transition_updates_the_order() {
        let mut order_repo = MockOrderRepository::new();
        order_repo.expect_find_by_id().with(eq(9i64)).returning(|_| {
            Box::pin(async { Ok(Some(sample_order(9, Some(1), OrderStatus::Confirmed))) })
        });
        order_repo
            .expect_update_status()
            .with(eq(9i64), eq(OrderStatus::Preparing), eq(None))
            .returning(|order_id, status, _| {
                Box::pin(async move { Ok(sample_order(order_id, Some(1), status)) })
            });

        let usecase = OrderStatusUseCase::new(Arc::new(order_repo));
        let order = usecase
            .update_order_status(
                9,
                UpdateOrderStatusModel {
                    status: OrderStatus::Preparing,
                    notes: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Preparing.to_string());
    }

    #[tokio::test]
    async fn delivered_goes_through_the_coupled_path() {
        let mut order_repo = MockOrderRepository::new();
        order_repo.expect_find_by_id().returning(|_| {
            Box::pin(async { Ok(Some(sample_order(9, Some(1), OrderStatus::OutForDelivery))) })
        });
        // update_status must not be called for delivered; only mark_delivered
        // couples the progress counter.
        order_repo
            .expect_mark_delivered()
            .with(eq(9i64), eq(Some("left at door".to_string())))
            .returning(|order_id, notes| {
                Box::pin(async move {
                    let mut order = sample_order(order_id, Some(1), OrderStatus::Delivered);
                    order.actual_delivery_date = Some(Utc::now());
                    order.notes = notes;
                    Ok(order)
                })
            });

        let usecase = OrderStatusUseCase::new(Arc::new(order_repo));
        let order = usecase
            .update_order_status(
                9,
                UpdateOrderStatusModel {
                    status: OrderStatus::Delivered,
                    notes: Some("left at door".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Delivered.to_string());
        assert!(order.actual_delivery_date.is_some());
    }

    #[tokio::test]
    async fn backward_transition_is_rejected_without_touching_the_store() {
        let mut order_repo = MockOrderRepository::new();
        order_repo.expect_find_by_id().returning(|_| {
            Box::pin(async { Ok(Some(sample_order(9, Some(1), OrderStatus::Delivered))) })
        });

        let usecase = OrderStatusUseCase::new(Arc::new(order_repo));
        let err = usecase
            .update_order_status(
                9,
                UpdateOrderStatusModel {
                    status: OrderStatus::Preparing,
                    notes: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrderStatusError::InvalidTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Preparing,
            }
        ));
    }

    #[tokio::test]
    async fn refund_of_an_unpaid_order_is_rejected() {
        let mut order_repo = MockOrderRepository::new();
        order_repo.expect_find_by_id().returning(|_| {
            // sample_order carries payment_status=pending.
            Box::pin(async { Ok(Some(sample_order(9, Some(1), OrderStatus::Delivered))) })
        });

        let usecase = OrderStatusUseCase::new(Arc::new(order_repo));
        let err = usecase
            .update_order_status(
                9,
                UpdateOrderStatusModel {
                    status: OrderStatus::Refunded,
                    notes: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, OrderStatusError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = OrderStatusUseCase::new(Arc::new(order_repo));
        let err = usecase
            .update_order_status(
                404,
                UpdateOrderStatusModel {
                    status: OrderStatus::Confirmed,
                    notes: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, OrderStatusError::OrderNotFound));
    }
}
