use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};

use crate::{
    application::usecases::{order_details::OrderDetailUseCase, order_status::OrderStatusUseCase},
    domain::{
        repositories::orders::OrderRepository,
        value_objects::orders::{OrderDto, UpdateOrderStatusModel},
    },
    infrastructure::{
        axum_http::error_responses::error_response,
        postgres::{postgres_connection::PgPoolSquad, repositories::orders::OrderPostgres},
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let order_repo = Arc::new(OrderPostgres::new(Arc::clone(&db_pool)));
    let order_status_usecase = OrderStatusUseCase::new(Arc::clone(&order_repo));
    let order_detail_usecase = OrderDetailUseCase::new(order_repo);

    Router::new()
        .route("/:id/status", patch(update_status))
        .with_state(Arc::new(order_status_usecase))
        .merge(
            Router::new()
                .route("/:id", get(get_order))
                .with_state(Arc::new(order_detail_usecase)),
        )
}

pub async fn get_order<O>(
    State(order_detail_usecase): State<Arc<OrderDetailUseCase<O>>>,
    Path(order_id): Path<i64>,
) -> impl IntoResponse
where
    O: OrderRepository + Send + Sync,
{
    match order_detail_usecase.get_order(order_id).await {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}

pub async fn update_status<O>(
    State(order_status_usecase): State<Arc<OrderStatusUseCase<O>>>,
    Path(order_id): Path<i64>,
    Json(update_order_status_model): Json<UpdateOrderStatusModel>,
) -> impl IntoResponse
where
    O: OrderRepository + Send + Sync,
{
    match order_status_usecase
        .update_order_status(order_id, update_order_status_model)
        .await
    {
        Ok(order) => (StatusCode::OK, Json(OrderDto::from(order))).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}
