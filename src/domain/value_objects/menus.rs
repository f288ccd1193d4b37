use serde::{Deserialize, Serialize};

use crate::domain::entities::catalog::{ItemEntity, MealEntity};

/// Optional caller-side menu filters. All of them are conjunctive with the
/// allergy exclusion and the user's recorded preferences.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuFilters {
    pub max_price_minor: Option<i32>,
    pub max_calories: Option<i32>,
    pub max_spice_level: Option<i32>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MealDto {
    pub id: i64,
    pub name: String,
    pub price_minor: i32,
    pub calories: Option<i32>,
    pub spice_level: Option<i32>,
    pub category: Option<String>,
    pub is_vegetarian: bool,
    pub is_vegan: bool,
    pub is_gluten_free: bool,
    pub is_dairy_free: bool,
}

impl From<MealEntity> for MealDto {
    fn from(meal: MealEntity) -> Self {
        Self {
            id: meal.id,
            name: meal.name,
            price_minor: meal.price_minor,
            calories: meal.calories,
            spice_level: meal.spice_level,
            category: meal.category,
            is_vegetarian: meal.is_vegetarian,
            is_vegan: meal.is_vegan,
            is_gluten_free: meal.is_gluten_free,
            is_dairy_free: meal.is_dairy_free,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemDto {
    pub id: i64,
    pub name: String,
    pub price_minor: i32,
    pub category: Option<String>,
    pub is_vegetarian: bool,
    pub is_vegan: bool,
    pub is_gluten_free: bool,
    pub is_dairy_free: bool,
}

impl From<ItemEntity> for ItemDto {
    fn from(item: ItemEntity) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price_minor: item.price_minor,
            category: item.category,
            is_vegetarian: item.is_vegetarian,
            is_vegan: item.is_vegan,
            is_gluten_free: item.is_gluten_free,
            is_dairy_free: item.is_dairy_free,
        }
    }
}

/// Independent meal and item lists; a meal dropping out of one list says
/// nothing about the other.
#[derive(Debug, Clone, Serialize)]
pub struct FilteredMenuDto {
    pub meals: Vec<MealDto>,
    pub items: Vec<ItemDto>,
}
