use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    entities::catalog::{ItemEntity, MealEntity},
    repositories::{catalog::CatalogRepository, dietary_profiles::DietaryProfileRepository},
    value_objects::{
        enums::preference_keys::DietaryPreferenceKey,
        menus::{FilteredMenuDto, ItemDto, MealDto, MenuFilters},
        store_errors::StoreUnavailable,
    },
};

#[derive(Debug, Error)]
pub enum MenuFilterError {
    #[error("storage is unavailable, retry later")]
    StoreUnavailable,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl MenuFilterError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            MenuFilterError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            MenuFilterError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct MenuFilterUseCase<C, D>
where
    C: CatalogRepository + Send + Sync + 'static,
    D: DietaryProfileRepository + Send + Sync + 'static,
{
    catalog_repo: Arc<C>,
    dietary_profile_repo: Arc<D>,
}

impl<C, D> MenuFilterUseCase<C, D>
where
    C: CatalogRepository + Send + Sync + 'static,
    D: DietaryProfileRepository + Send + Sync + 'static,
{
    pub fn new(catalog_repo: Arc<C>, dietary_profile_repo: Arc<D>) -> Self {
        Self {
            catalog_repo,
            dietary_profile_repo,
        }
    }

    /// Available meals minus every meal linked to any of the user's
    /// allergies. A user with no recorded allergies sees the whole available
    /// catalog.
    pub async fn get_user_safe_meals(&self, user_id: Uuid) -> Result<Vec<MealDto>, MenuFilterError> {
        let allergy_ids = self.allergy_ids(user_id).await?;
        let meals = self.safe_meals(user_id, allergy_ids).await?;
        info!(%user_id, meal_count = meals.len(), "menu_filter: safe meals resolved");
        Ok(meals.into_iter().map(MealDto::from).collect())
    }

    pub async fn get_user_safe_items(&self, user_id: Uuid) -> Result<Vec<ItemDto>, MenuFilterError> {
        let allergy_ids = self.allergy_ids(user_id).await?;
        let items = self.safe_items(user_id, allergy_ids).await?;
        info!(%user_id, item_count = items.len(), "menu_filter: safe items resolved");
        Ok(items.into_iter().map(ItemDto::from).collect())
    }

    /// The full personalised menu: allergy-safe entries narrowed by the
    /// user's recorded dietary preferences, then by the caller's filters.
    /// Every stage is conjunctive.
    pub async fn get_filtered_menu_for_user(
        &self,
        user_id: Uuid,
        filters: MenuFilters,
    ) -> Result<FilteredMenuDto, MenuFilterError> {
        let allergy_ids = self.allergy_ids(user_id).await?;
        let (meals, items) = tokio::try_join!(
            self.safe_meals(user_id, allergy_ids.clone()),
            self.safe_items(user_id, allergy_ids)
        )?;

        let preference_keys = self
            .dietary_profile_repo
            .preference_keys_for_user(user_id)
            .await
            .map_err(|err| self.store_error(user_id, err))?;
        let preferences = resolve_preferences(user_id, &preference_keys);

        let meals: Vec<MealDto> = meals
            .into_iter()
            .filter(|meal| preferences.iter().all(|pref| pref.meal_satisfies(meal)))
            .filter(|meal| meal_passes_filters(meal, &filters))
            .map(MealDto::from)
            .collect();
        let items: Vec<ItemDto> = items
            .into_iter()
            .filter(|item| preferences.iter().all(|pref| pref.item_satisfies(item)))
            .filter(|item| item_passes_filters(item, &filters))
            .map(ItemDto::from)
            .collect();

        info!(
            %user_id,
            meal_count = meals.len(),
            item_count = items.len(),
            preference_count = preferences.len(),
            "menu_filter: personalised menu resolved"
        );
        Ok(FilteredMenuDto { meals, items })
    }

    async fn allergy_ids(&self, user_id: Uuid) -> Result<Vec<i64>, MenuFilterError> {
        self.dietary_profile_repo
            .allergy_ids_for_user(user_id)
            .await
            .map_err(|err| self.store_error(user_id, err))
    }

    async fn safe_meals(
        &self,
        user_id: Uuid,
        allergy_ids: Vec<i64>,
    ) -> Result<Vec<MealEntity>, MenuFilterError> {
        let meals = self
            .catalog_repo
            .list_available_meals()
            .await
            .map_err(|err| self.store_error(user_id, err))?;

        if allergy_ids.is_empty() {
            return Ok(meals);
        }

        let unsafe_ids: HashSet<i64> = self
            .catalog_repo
            .unsafe_meal_ids(allergy_ids)
            .await
            .map_err(|err| self.store_error(user_id, err))?
            .into_iter()
            .collect();

        Ok(meals
            .into_iter()
            .filter(|meal| !unsafe_ids.contains(&meal.id))
            .collect())
    }

    async fn safe_items(
        &self,
        user_id: Uuid,
        allergy_ids: Vec<i64>,
    ) -> Result<Vec<ItemEntity>, MenuFilterError> {
        let items = self
            .catalog_repo
            .list_available_items()
            .await
            .map_err(|err| self.store_error(user_id, err))?;

        if allergy_ids.is_empty() {
            return Ok(items);
        }

        let unsafe_ids: HashSet<i64> = self
            .catalog_repo
            .unsafe_item_ids(allergy_ids)
            .await
            .map_err(|err| self.store_error(user_id, err))?
            .into_iter()
            .collect();

        Ok(items
            .into_iter()
            .filter(|item| !unsafe_ids.contains(&item.id))
            .collect())
    }

    fn store_error(&self, user_id: Uuid, err: anyhow::Error) -> MenuFilterError {
        if err.downcast_ref::<StoreUnavailable>().is_some() {
            error!(%user_id, db_error = ?err, "menu_filter: storage unavailable");
            return MenuFilterError::StoreUnavailable;
        }
        error!(%user_id, db_error = ?err, "menu_filter: storage failure");
        MenuFilterError::Internal(err)
    }
}

/// Unknown keys are skipped with a warning rather than failing the request:
/// a preference the code cannot interpret must never widen the menu, and
/// skipping it keeps the remaining preferences enforced.
fn resolve_preferences(user_id: Uuid, keys: &[String]) -> Vec<DietaryPreferenceKey> {
    keys.iter()
        .filter_map(|key| match DietaryPreferenceKey::from_str(key) {
            Some(preference) => Some(preference),
            None => {
                warn!(%user_id, preference_key = %key, "menu_filter: unknown preference key skipped");
                None
            }
        })
        .collect()
}

fn meal_passes_filters(meal: &MealEntity, filters: &MenuFilters) -> bool {
    if let Some(max_price) = filters.max_price_minor {
        if meal.price_minor > max_price {
            return false;
        }
    }
    if let Some(max_calories) = filters.max_calories {
        // Entries without calorie data are kept: the filter bounds known
        // values, it is not a data-completeness requirement.
        if meal.calories.is_some_and(|calories| calories > max_calories) {
            return false;
        }
    }
    if let Some(max_spice) = filters.max_spice_level {
        if meal.spice_level.is_some_and(|spice| spice > max_spice) {
            return false;
        }
    }
    if let Some(category) = filters.category.as_deref() {
        if meal.category.as_deref() != Some(category) {
            return false;
        }
    }
    true
}

fn item_passes_filters(item: &ItemEntity, filters: &MenuFilters) -> bool {
    if let Some(max_price) = filters.max_price_minor {
        if item.price_minor > max_price {
            return false;
        }
    }
    if let Some(category) = filters.category.as_deref() {
        if item.category.as_deref() != Some(category) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application::usecases::test_support::{sample_item, sample_meal},
        domain::repositories::{
            catalog::MockCatalogRepository, dietary_profiles::MockDietaryProfileRepository,
        },
    };
    use mockall::predicate::eq;

    fn profile_with(
        allergy_ids: Vec<i64>,
        preference_keys: Vec<&str>,
    ) -> MockDietaryProfileRepository {
        let mut dietary_profile_repo = MockDietaryProfileRepository::new();
        dietary_profile_repo
            .expect_allergy_ids_for_user()
            .returning(move |_| {
                let ids = allergy_ids.clone();
                Box::pin(async move { Ok(ids) })
            });
        let keys: Vec<String> = preference_keys.into_iter().map(str::to_string).collect();
        dietary_profile_repo
            .expect_preference_keys_for_user()
            .returning(move |_| {
                let keys = keys.clone();
                Box::pin(async move { Ok(keys) })
            });
        dietary_profile_repo
    }

    #[tokio::test]
    async fn allergy_linked_meals_are_excluded() {
        // Meals 1..=3 are available; meal 2 contains the user's allergen.
        let mut catalog_repo = MockCatalogRepository::new();
        catalog_repo.expect_list_available_meals().returning(|| {
            Box::pin(async { Ok(vec![sample_meal(1), sample_meal(2), sample_meal(3)]) })
        });
        catalog_repo
            .expect_unsafe_meal_ids()
            .with(eq(vec![5i64]))
            .returning(|_| Box::pin(async { Ok(vec![2]) }));

        let usecase = MenuFilterUseCase::new(
            Arc::new(catalog_repo),
            Arc::new(profile_with(vec![5], vec![])),
        );

        let meals = usecase.get_user_safe_meals(Uuid::new_v4()).await.unwrap();
        let ids: Vec<i64> = meals.iter().map(|meal| meal.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn no_recorded_allergies_returns_the_whole_available_catalog() {
        let mut catalog_repo = MockCatalogRepository::new();
        catalog_repo
            .expect_list_available_meals()
            .returning(|| Box::pin(async { Ok(vec![sample_meal(1), sample_meal(2)]) }));
        // No expect_unsafe_meal_ids: the unsafe-set query must be skipped.

        let usecase =
            MenuFilterUseCase::new(Arc::new(catalog_repo), Arc::new(profile_with(vec![], vec![])));

        let meals = usecase.get_user_safe_meals(Uuid::new_v4()).await.unwrap();
        assert_eq!(meals.len(), 2);
    }

    #[tokio::test]
    async fn safe_items_use_the_item_allergen_join() {
        let mut catalog_repo = MockCatalogRepository::new();
        catalog_repo
            .expect_list_available_items()
            .returning(|| Box::pin(async { Ok(vec![sample_item(10), sample_item(11)]) }));
        catalog_repo
            .expect_unsafe_item_ids()
            .with(eq(vec![5i64]))
            .returning(|_| Box::pin(async { Ok(vec![11]) }));

        let usecase = MenuFilterUseCase::new(
            Arc::new(catalog_repo),
            Arc::new(profile_with(vec![5], vec![])),
        );

        let items = usecase.get_user_safe_items(Uuid::new_v4()).await.unwrap();
        let ids: Vec<i64> = items.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![10]);
    }

    #[tokio::test]
    async fn preferences_only_ever_narrow_the_safe_menu() {
        let mut vegan_meal = sample_meal(1);
        vegan_meal.is_vegetarian = true;
        vegan_meal.is_vegan = true;
        let mut vegetarian_meal = sample_meal(2);
        vegetarian_meal.is_vegetarian = true;
        let plain_meal = sample_meal(3);

        let mut catalog_repo = MockCatalogRepository::new();
        catalog_repo.expect_list_available_meals().returning(move || {
            let meals = vec![vegan_meal.clone(), vegetarian_meal.clone(), plain_meal.clone()];
            Box::pin(async move { Ok(meals) })
        });
        catalog_repo
            .expect_list_available_items()
            .returning(|| Box::pin(async { Ok(vec![]) }));

        let usecase = MenuFilterUseCase::new(
            Arc::new(catalog_repo),
            Arc::new(profile_with(vec![], vec!["vegan"])),
        );

        let menu = usecase
            .get_filtered_menu_for_user(Uuid::new_v4(), MenuFilters::default())
            .await
            .unwrap();

        let ids: Vec<i64> = menu.meals.iter().map(|meal| meal.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn unknown_preference_keys_are_skipped_not_fatal() {
        let mut vegetarian_meal = sample_meal(1);
        vegetarian_meal.is_vegetarian = true;
        let plain_meal = sample_meal(2);

        let mut catalog_repo = MockCatalogRepository::new();
        catalog_repo.expect_list_available_meals().returning(move || {
            let meals = vec![vegetarian_meal.clone(), plain_meal.clone()];
            Box::pin(async move { Ok(meals) })
        });
        catalog_repo
            .expect_list_available_items()
            .returning(|| Box::pin(async { Ok(vec![]) }));

        let usecase = MenuFilterUseCase::new(
            Arc::new(catalog_repo),
            Arc::new(profile_with(vec![], vec!["keto", "vegetarian"])),
        );

        let menu = usecase
            .get_filtered_menu_for_user(Uuid::new_v4(), MenuFilters::default())
            .await
            .unwrap();

        // "keto" is ignored, "vegetarian" still narrows.
        let ids: Vec<i64> = menu.meals.iter().map(|meal| meal.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn caller_filters_are_conjunctive_with_the_allergy_exclusion() {
        let cheap_meal = sample_meal(1); // 1250 minor units
        let mut pricey_meal = sample_meal(2);
        pricey_meal.price_minor = 2200;
        let allergen_meal = sample_meal(3);

        let mut catalog_repo = MockCatalogRepository::new();
        catalog_repo.expect_list_available_meals().returning(move || {
            let meals = vec![cheap_meal.clone(), pricey_meal.clone(), allergen_meal.clone()];
            Box::pin(async move { Ok(meals) })
        });
        catalog_repo
            .expect_list_available_items()
            .returning(|| Box::pin(async { Ok(vec![]) }));
        catalog_repo
            .expect_unsafe_meal_ids()
            .returning(|_| Box::pin(async { Ok(vec![3]) }));
        catalog_repo
            .expect_unsafe_item_ids()
            .returning(|_| Box::pin(async { Ok(vec![]) }));

        let usecase = MenuFilterUseCase::new(
            Arc::new(catalog_repo),
            Arc::new(profile_with(vec![5], vec![])),
        );

        let menu = usecase
            .get_filtered_menu_for_user(
                Uuid::new_v4(),
                MenuFilters {
                    max_price_minor: Some(2000),
                    ..MenuFilters::default()
                },
            )
            .await
            .unwrap();

        // Meal 2 fails the price cap, meal 3 fails the allergy exclusion.
        let ids: Vec<i64> = menu.meals.iter().map(|meal| meal.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn missing_calorie_data_is_not_filtered_out() {
        let mut unannotated_meal = sample_meal(1);
        unannotated_meal.calories = None;
        let mut heavy_meal = sample_meal(2);
        heavy_meal.calories = Some(900);

        let mut catalog_repo = MockCatalogRepository::new();
        catalog_repo.expect_list_available_meals().returning(move || {
            let meals = vec![unannotated_meal.clone(), heavy_meal.clone()];
            Box::pin(async move { Ok(meals) })
        });
        catalog_repo
            .expect_list_available_items()
            .returning(|| Box::pin(async { Ok(vec![]) }));

        let usecase = MenuFilterUseCase::new(
            Arc::new(catalog_repo),
            Arc::new(profile_with(vec![], vec![])),
        );

        let menu = usecase
            .get_filtered_menu_for_user(
                Uuid::new_v4(),
                MenuFilters {
                    max_calories: Some(700),
                    ..MenuFilters::default()
                },
            )
            .await
            .unwrap();

        let ids: Vec<i64> = menu.meals.iter().map(|meal| meal.id).collect();
        assert_eq!(ids, vec![1]);
    }
}
