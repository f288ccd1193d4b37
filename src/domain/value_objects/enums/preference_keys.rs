use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::domain::entities::catalog::{ItemEntity, MealEntity};

/// Declarative mapping from a dietary-preference catalog row (its `key`
/// column) to the predicate it imposes on a catalog entry. New preferences
/// are catalog data plus one arm here, never scattered id conditionals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DietaryPreferenceKey {
    Vegetarian,
    Vegan,
    GlutenFree,
    DairyFree,
}

impl Display for DietaryPreferenceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = match self {
            DietaryPreferenceKey::Vegetarian => "vegetarian",
            DietaryPreferenceKey::Vegan => "vegan",
            DietaryPreferenceKey::GlutenFree => "gluten_free",
            DietaryPreferenceKey::DairyFree => "dairy_free",
        };
        write!(f, "{}", key)
    }
}

impl DietaryPreferenceKey {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "vegetarian" => Some(DietaryPreferenceKey::Vegetarian),
            "vegan" => Some(DietaryPreferenceKey::Vegan),
            "gluten_free" => Some(DietaryPreferenceKey::GlutenFree),
            "dairy_free" => Some(DietaryPreferenceKey::DairyFree),
            _ => None,
        }
    }

    pub fn meal_satisfies(&self, meal: &MealEntity) -> bool {
        match self {
            DietaryPreferenceKey::Vegetarian => meal.is_vegetarian,
            DietaryPreferenceKey::Vegan => meal.is_vegan,
            DietaryPreferenceKey::GlutenFree => meal.is_gluten_free,
            DietaryPreferenceKey::DairyFree => meal.is_dairy_free,
        }
    }

    pub fn item_satisfies(&self, item: &ItemEntity) -> bool {
        match self {
            DietaryPreferenceKey::Vegetarian => item.is_vegetarian,
            DietaryPreferenceKey::Vegan => item.is_vegan,
            DietaryPreferenceKey::GlutenFree => item.is_gluten_free,
            DietaryPreferenceKey::DairyFree => item.is_dairy_free,
        }
    }
}
