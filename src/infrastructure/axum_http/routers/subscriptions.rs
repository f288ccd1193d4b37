use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;

use crate::{
    application::usecases::{
        order_activation::OrderActivationUseCase, subscriptions::SubscriptionUseCase,
    },
    domain::{
        repositories::{
            catalog::CatalogRepository, orders::OrderRepository,
            subscriptions::SubscriptionRepository,
        },
        value_objects::{
            orders::{ActivateOrderModel, OrderDto},
            subscriptions::{CancelSubscriptionModel, CreateSubscriptionModel},
        },
    },
    infrastructure::{
        axum_http::{error_responses::error_response, user_identity::UserIdentity},
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{
                catalog::CatalogPostgres, orders::OrderPostgres,
                subscriptions::SubscriptionPostgres,
            },
        },
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let subscription_repo = Arc::new(SubscriptionPostgres::new(Arc::clone(&db_pool)));
    let order_repo = Arc::new(OrderPostgres::new(Arc::clone(&db_pool)));
    let catalog_repo = Arc::new(CatalogPostgres::new(Arc::clone(&db_pool)));

    let subscription_usecase = SubscriptionUseCase::new(
        Arc::clone(&subscription_repo),
        Arc::clone(&order_repo),
        catalog_repo,
    );
    let activation_usecase = OrderActivationUseCase::new(subscription_repo, order_repo);

    Router::new()
        .route("/", post(create))
        .route("/:id/pause", post(pause))
        .route("/:id/resume", post(resume))
        .route("/:id/cancel", post(cancel))
        .route("/:id/cancel-pending-orders", post(cancel_pending_orders))
        .route("/:id/orders", get(list_orders))
        .route("/:id/progress", get(progress))
        .with_state(Arc::new(subscription_usecase))
        .merge(
            Router::new()
                .route("/:id/activate-next-order", post(activate_next_order))
                .with_state(Arc::new(activation_usecase)),
        )
}

pub async fn create<S, O, C>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<S, O, C>>>,
    identity: UserIdentity,
    Json(create_subscription_model): Json<CreateSubscriptionModel>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync,
    O: OrderRepository + Send + Sync,
    C: CatalogRepository + Send + Sync,
{
    match subscription_usecase
        .create_subscription(identity.user_id, create_subscription_model)
        .await
    {
        Ok(subscription) => (StatusCode::CREATED, Json(subscription)).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}

pub async fn pause<S, O, C>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<S, O, C>>>,
    Path(subscription_id): Path<i64>,
    Json(model): Json<CancelSubscriptionModel>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync,
    O: OrderRepository + Send + Sync,
    C: CatalogRepository + Send + Sync,
{
    match subscription_usecase
        .pause_subscription(subscription_id, model.reason)
        .await
    {
        Ok(subscription) => (StatusCode::OK, Json(subscription)).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}

pub async fn resume<S, O, C>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<S, O, C>>>,
    Path(subscription_id): Path<i64>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync,
    O: OrderRepository + Send + Sync,
    C: CatalogRepository + Send + Sync,
{
    match subscription_usecase.resume_subscription(subscription_id).await {
        Ok(subscription) => (StatusCode::OK, Json(subscription)).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}

pub async fn cancel<S, O, C>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<S, O, C>>>,
    Path(subscription_id): Path<i64>,
    Json(model): Json<CancelSubscriptionModel>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync,
    O: OrderRepository + Send + Sync,
    C: CatalogRepository + Send + Sync,
{
    match subscription_usecase
        .cancel_subscription(subscription_id, model.reason)
        .await
    {
        Ok(subscription) => (StatusCode::OK, Json(subscription)).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}

pub async fn cancel_pending_orders<S, O, C>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<S, O, C>>>,
    Path(subscription_id): Path<i64>,
    Json(model): Json<CancelSubscriptionModel>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync,
    O: OrderRepository + Send + Sync,
    C: CatalogRepository + Send + Sync,
{
    match subscription_usecase
        .cancel_remaining_pending_orders(subscription_id, model.reason)
        .await
    {
        Ok(cancelled) => {
            (StatusCode::OK, Json(json!({ "cancelled_orders": cancelled }))).into_response()
        }
        Err(err) => error_response(err.status_code(), &err),
    }
}

pub async fn list_orders<S, O, C>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<S, O, C>>>,
    Path(subscription_id): Path<i64>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync,
    O: OrderRepository + Send + Sync,
    C: CatalogRepository + Send + Sync,
{
    match subscription_usecase
        .list_subscription_orders(subscription_id)
        .await
    {
        Ok(orders) => (StatusCode::OK, Json(orders)).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}

pub async fn progress<S, O, C>(
    State(subscription_usecase): State<Arc<SubscriptionUseCase<S, O, C>>>,
    Path(subscription_id): Path<i64>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync,
    O: OrderRepository + Send + Sync,
    C: CatalogRepository + Send + Sync,
{
    match subscription_usecase
        .get_subscription_progress(subscription_id)
        .await
    {
        Ok(progress) => (StatusCode::OK, Json(progress)).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}

pub async fn activate_next_order<S, O>(
    State(activation_usecase): State<Arc<OrderActivationUseCase<S, O>>>,
    Path(subscription_id): Path<i64>,
    Json(activate_order_model): Json<ActivateOrderModel>,
) -> impl IntoResponse
where
    S: SubscriptionRepository + Send + Sync,
    O: OrderRepository + Send + Sync,
{
    match activation_usecase
        .activate_next_subscription_order(subscription_id, activate_order_model)
        .await
    {
        Ok(order) => (StatusCode::OK, Json(OrderDto::from(order))).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}
