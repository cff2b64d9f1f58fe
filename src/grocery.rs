use std::collections::HashSet;

use serde_json::Value;

use crate::models::{GroceryItem, Recipe};

/// Builds a grocery list from raw ingredient values.
///
/// Only strings with non-blank content survive; they keep their original
/// text and order. Duplicates are kept, callers dedup beforehand.
pub fn generate(ingredients: &[Value]) -> Vec<GroceryItem> {
    ingredients
        .iter()
        .filter_map(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .map(|name| GroceryItem {
            name: name.to_string(),
        })
        .collect()
}

/// Every used and missed ingredient name across `recipes`, first occurrence
/// wins.
pub fn unique_ingredient_names(recipes: &[Recipe]) -> Vec<String> {
    let mut seen = HashSet::new();
    recipes
        .iter()
        .flat_map(Recipe::ingredient_names)
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}
