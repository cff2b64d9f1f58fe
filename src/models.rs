use std::collections::BTreeMap;

use diesel::prelude::*;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;

use crate::schema::recipes;

/// Ingredient as classified by the search API: one the user already has
/// ("used") or one still needed ("missed").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientRef {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub original: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(deserialize_with = "whole_number")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub used_ingredients: Vec<IngredientRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub missed_ingredients: Vec<IngredientRef>,
    #[serde(
        default,
        deserialize_with = "optional_whole_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<i32>,
}

impl Recipe {
    /// Used then missed ingredient names, in listing order.
    pub fn ingredient_names(&self) -> impl Iterator<Item = &str> {
        self.used_ingredients
            .iter()
            .chain(self.missed_ingredients.iter())
            .map(|ingredient| ingredient.name.as_str())
    }
}

/// Integer value of a JSON number, accepting floats with no fractional part
/// (`8.0` is 8).
pub fn whole_number_value(number: &Number) -> Option<i64> {
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|value| value.fract() == 0.0 && value.abs() < i64::MAX as f64)
            .map(|value| value as i64)
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn whole_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Number::deserialize(deserializer)?;
    whole_number_value(&number)
        .ok_or_else(|| D::Error::custom(format!("expected a whole number, got {number}")))
}

fn optional_whole_number<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Number>::deserialize(deserializer)?
        .map(|number| {
            whole_number_value(&number)
                .and_then(|value| i32::try_from(value).ok())
                .ok_or_else(|| D::Error::custom(format!("expected a whole number, got {number}")))
        })
        .transpose()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroceryItem {
    pub name: String,
}

// row shape of the recipes table; ingredient lists are stored as json text
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = recipes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub(crate) struct RecipeRow {
    pub id: i64,
    pub title: String,
    pub image: String,
    pub used_ingredients: String,
    pub missed_ingredients: String,
    pub rating: Option<i32>,
}

impl RecipeRow {
    pub(crate) fn from_recipe(recipe: &Recipe) -> Result<Self, serde_json::Error> {
        Ok(RecipeRow {
            id: recipe.id,
            title: recipe.title.clone(),
            image: recipe.image.clone(),
            used_ingredients: serde_json::to_string(&recipe.used_ingredients)?,
            missed_ingredients: serde_json::to_string(&recipe.missed_ingredients)?,
            rating: recipe.rating,
        })
    }

    pub(crate) fn into_recipe(self) -> Result<Recipe, serde_json::Error> {
        Ok(Recipe {
            id: self.id,
            title: self.title,
            image: self.image,
            used_ingredients: serde_json::from_str(&self.used_ingredients)?,
            missed_ingredients: serde_json::from_str(&self.missed_ingredients)?,
            rating: self.rating,
        })
    }
}

// wire bodies shared by the http handlers and the client

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub recipes: Vec<Recipe>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub success: bool,
    pub saved_recipes: Vec<Recipe>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateResponse {
    pub success: bool,
    pub recipe_ratings: BTreeMap<i64, i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroceryResponse {
    pub grocery_list: Vec<GroceryItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
