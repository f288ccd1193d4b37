use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use crate::{
    application::usecases::menu_filter::MenuFilterUseCase,
    domain::{
        repositories::{catalog::CatalogRepository, dietary_profiles::DietaryProfileRepository},
        value_objects::menus::MenuFilters,
    },
    infrastructure::{
        axum_http::{error_responses::error_response, user_identity::UserIdentity},
        postgres::{
            postgres_connection::PgPoolSquad,
            repositories::{catalog::CatalogPostgres, dietary_profiles::DietaryProfilePostgres},
        },
    },
};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let catalog_repo = Arc::new(CatalogPostgres::new(Arc::clone(&db_pool)));
    let dietary_profile_repo = Arc::new(DietaryProfilePostgres::new(Arc::clone(&db_pool)));
    let menu_filter_usecase = MenuFilterUseCase::new(catalog_repo, dietary_profile_repo);

    Router::new()
        .route("/safe-meals", get(safe_meals))
        .route("/safe-items", get(safe_items))
        .route("/filtered", get(filtered))
        .with_state(Arc::new(menu_filter_usecase))
}

pub async fn safe_meals<C, D>(
    State(menu_filter_usecase): State<Arc<MenuFilterUseCase<C, D>>>,
    identity: UserIdentity,
) -> impl IntoResponse
where
    C: CatalogRepository + Send + Sync,
    D: DietaryProfileRepository + Send + Sync,
{
    match menu_filter_usecase
        .get_user_safe_meals(identity.user_id)
        .await
    {
        Ok(meals) => (StatusCode::OK, Json(meals)).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}

pub async fn safe_items<C, D>(
    State(menu_filter_usecase): State<Arc<MenuFilterUseCase<C, D>>>,
    identity: UserIdentity,
) -> impl IntoResponse
where
    C: CatalogRepository + Send + Sync,
    D: DietaryProfileRepository + Send + Sync,
{
    match menu_filter_usecase
        .get_user_safe_items(identity.user_id)
        .await
    {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}

pub async fn filtered<C, D>(
    State(menu_filter_usecase): State<Arc<MenuFilterUseCase<C, D>>>,
    identity: UserIdentity,
    Query(filters): Query<MenuFilters>,
) -> impl IntoResponse
where
    C: CatalogRepository + Send + Sync,
    D: DietaryProfileRepository + Send + Sync,
{
    match menu_filter_usecase
        .get_filtered_menu_for_user(identity.user_id, filters)
        .await
    {
        Ok(menu) => (StatusCode::OK, Json(menu)).into_response(),
        Err(err) => error_response(err.status_code(), &err),
    }
}
