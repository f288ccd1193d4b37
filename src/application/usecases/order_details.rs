use std::sync::Arc;

use thiserror::Error;
use tracing::{error, warn};

use crate::domain::{
    repositories::orders::OrderRepository,
    value_objects::{
        orders::{OrderDetailDto, OrderDto, OrderLineDto},
        store_errors::StoreUnavailable,
    },
};

#[derive(Debug, Error)]
pub enum OrderDetailError {
    #[error("order not found")]
    OrderNotFound,
    #[error("storage is unavailable, retry later")]
    StoreUnavailable,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl OrderDetailError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            OrderDetailError::OrderNotFound => StatusCode::NOT_FOUND,
            OrderDetailError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            OrderDetailError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct OrderDetailUseCase<O>
where
    O: OrderRepository + Send + Sync + 'static,
{
    order_repo: Arc<O>,
}

impl<O> OrderDetailUseCase<O>
where
    O: OrderRepository + Send + Sync + 'static,
{
    pub fn new(order_repo: Arc<O>) -> Self {
        Self { order_repo }
    }

    /// One order with its snapshot lines. Lines are copies taken at
    /// generation time, so this view is stable against later catalog edits.
    pub async fn get_order(&self, order_id: i64) -> Result<OrderDetailDto, OrderDetailError> {
        let order = self
            .order_repo
            .find_by_id(order_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| {
                let err = OrderDetailError::OrderNotFound;
                warn!(
                    order_id,
                    status = err.status_code().as_u16(),
                    "order_details: unknown order"
                );
                err
            })?;

        let meal_lines = self
            .order_repo
            .find_meal_lines(order_id)
            .await
            .map_err(|err| {
                error!(order_id, db_error = ?err, "order_details: failed to load meal lines");
                map_store_error(err)
            })?;
        let item_lines = self
            .order_repo
            .find_item_lines(order_id)
            .await
            .map_err(|err| {
                error!(order_id, db_error = ?err, "order_details: failed to load item lines");
                map_store_error(err)
            })?;

        Ok(OrderDetailDto {
            order: OrderDto::from(order),
            meals: meal_lines.into_iter().map(OrderLineDto::from).collect(),
            items: item_lines.into_iter().map(OrderLineDto::from).collect(),
        })
    }
}

fn map_store_error(err: anyhow::Error) -> OrderDetailError {
    if err.downcast_ref::<StoreUnavailable>().is_some() {
        return OrderDetailError::StoreUnavailable;
    }
    OrderDetailError::Internal(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application::usecases::test_support::sample_order,
        domain::{
            entities::orders::{OrderItemEntity, OrderMealEntity},
            repositories::orders::MockOrderRepository,
            value_objects::enums::order_statuses::OrderStatus,
        },
    };

    #[tokio::test]
    async fn returns_order_with_expanded_snapshot_lines() {
        let mut order_repo = MockOrderRepository::new();
        order_repo.expect_find_by_id().returning(|id| {
            Box::pin(async move { Ok(Some(sample_order(id, Some(7), OrderStatus::Pending))) })
        });
        order_repo.expect_find_meal_lines().returning(|order_id| {
            Box::pin(async move {
                Ok(vec![OrderMealEntity {
                    id: 1,
                    order_id,
                    meal_id: Some(3),
                    name: "Meal 3".to_string(),
                    quantity: 2,
                    unit_price_minor: 1250,
                    total_price_minor: 2500,
                }])
            })
        });
        order_repo.expect_find_item_lines().returning(|order_id| {
            Box::pin(async move {
                Ok(vec![OrderItemEntity {
                    id: 1,
                    order_id,
                    item_id: Some(9),
                    name: "Item 9".to_string(),
                    quantity: 1,
                    unit_price_minor: 450,
                    total_price_minor: 450,
                }])
            })
        });

        let usecase = OrderDetailUseCase::new(Arc::new(order_repo));
        let detail = usecase.get_order(42).await.unwrap();

        assert_eq!(detail.order.id, 42);
        assert_eq!(detail.meals.len(), 1);
        assert_eq!(detail.meals[0].total_price_minor, 2500);
        assert_eq!(detail.items[0].catalog_id, Some(9));
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let mut order_repo = MockOrderRepository::new();
        order_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = OrderDetailUseCase::new(Arc::new(order_repo));
        let err = usecase.get_order(42).await.unwrap_err();
        assert!(matches!(err, OrderDetailError::OrderNotFound));
    }
}
