//! Checks on request bodies, applied before any side effect.

use serde_json::Value;

use crate::error::ApiError;
use crate::models::{whole_number_value, Recipe};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Ingredient names for a suggestion request: `ingredients` must be an array
/// of strings.
pub fn suggestion_ingredients(body: &Value) -> Result<Vec<String>, ApiError> {
    let ingredients = match body.get("ingredients") {
        None | Some(Value::Null) => {
            log::warn!("suggest request without ingredients");
            return Err(ApiError::validation("Ingredients are required."));
        }
        Some(ingredients) => ingredients,
    };
    let not_strings = || {
        log::warn!("suggest request with malformed ingredients: {ingredients}");
        ApiError::validation("Ingredients must be an array of strings.")
    };

    ingredients
        .as_array()
        .ok_or_else(not_strings)?
        .iter()
        .map(|value| value.as_str().map(str::to_string).ok_or_else(not_strings))
        .collect()
}

/// Recipe to save: `recipe` must be an object with a positive whole-number
/// `id`. Every other field is optional and `null` reads as its default.
pub fn recipe_to_save(body: &Value) -> Result<Recipe, ApiError> {
    let invalid = || {
        log::warn!("save request with invalid recipe data");
        ApiError::validation("Invalid recipe data")
    };

    let payload = body.get("recipe").filter(|recipe| recipe.is_object()).ok_or_else(invalid)?;
    positive_id(payload.get("id")).ok_or_else(invalid)?;

    let recipe: Recipe = serde_json::from_value(payload.clone()).map_err(|_| invalid())?;
    if let Some(rating) = recipe.rating {
        if !(MIN_RATING..=MAX_RATING).contains(&i64::from(rating)) {
            return Err(invalid());
        }
    }
    Ok(recipe)
}

/// `(recipeId, rating)` for a rating request. The id must be a positive
/// integer and the rating a whole number between 1 and 5.
pub fn rating_request(body: &Value) -> Result<(i64, i32), ApiError> {
    let invalid = || {
        log::warn!("rate request with invalid rating data: {body}");
        ApiError::validation("Invalid rating data")
    };

    let recipe_id = positive_id(body.get("recipeId")).ok_or_else(invalid)?;
    let rating = whole_number(body.get("rating"))
        .filter(|rating| (MIN_RATING..=MAX_RATING).contains(rating))
        .ok_or_else(invalid)?;

    Ok((recipe_id, rating as i32))
}

/// Ingredient values for grocery generation; only the array shape is
/// checked here.
pub fn grocery_ingredients(body: &Value) -> Result<&[Value], ApiError> {
    body.get("ingredients")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| {
            log::warn!("grocery request without an ingredients array");
            ApiError::validation("ingredients must be an array")
        })
}

fn whole_number(value: Option<&Value>) -> Option<i64> {
    match value {
        Some(Value::Number(number)) => whole_number_value(number),
        _ => None,
    }
}

fn positive_id(value: Option<&Value>) -> Option<i64> {
    whole_number(value).filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(err: ApiError) -> String {
        match err {
            ApiError::Validation(message) => message,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn missing_and_non_array_ingredients_are_distinguished() {
        assert_eq!(
            message(suggestion_ingredients(&json!({})).unwrap_err()),
            "Ingredients are required."
        );
        assert_eq!(
            message(suggestion_ingredients(&json!({"ingredients": "egg"})).unwrap_err()),
            "Ingredients must be an array of strings."
        );
        assert_eq!(
            message(suggestion_ingredients(&json!({"ingredients": ["egg", 3]})).unwrap_err()),
            "Ingredients must be an array of strings."
        );
    }

    #[test]
    fn empty_ingredient_array_is_accepted() {
        assert!(suggestion_ingredients(&json!({"ingredients": []})).unwrap().is_empty());
    }

    #[test]
    fn falsy_recipe_ids_are_rejected() {
        for id in [json!(0), json!(null), json!(false), json!(-4), json!("12")] {
            let body = json!({"recipe": {"id": id, "title": "Toast"}});
            assert!(recipe_to_save(&body).is_err(), "id {id} should be rejected");
        }
        assert!(recipe_to_save(&json!({"recipe": {"title": "Toast"}})).is_err());
        assert!(recipe_to_save(&json!({})).is_err());
    }

    #[test]
    fn recipe_with_only_an_id_is_accepted() {
        let recipe = recipe_to_save(&json!({"recipe": {"id": 12}})).unwrap();
        assert_eq!(recipe.id, 12);
        assert!(recipe.used_ingredients.is_empty());
        assert_eq!(recipe.rating, None);
    }

    #[test]
    fn loosely_shaped_recipes_are_accepted() {
        let recipe = recipe_to_save(&json!({"recipe": {"id": 5, "title": null, "image": null}})).unwrap();
        assert_eq!((recipe.id, recipe.title.as_str(), recipe.image.as_str()), (5, "", ""));

        let recipe = recipe_to_save(&json!({
            "recipe": {"id": 6, "title": "Eggs", "usedIngredients": [{"name": "egg"}]}
        }))
        .unwrap();
        assert_eq!(recipe.used_ingredients[0].name, "egg");

        let recipe = recipe_to_save(&json!({"recipe": {"id": 7, "title": "Toast", "rating": 4.0}})).unwrap();
        assert_eq!(recipe.rating, Some(4));

        let recipe = recipe_to_save(&json!({"recipe": {"id": 8.0, "title": "Soup"}})).unwrap();
        assert_eq!(recipe.id, 8);
    }

    #[test]
    fn saved_rating_out_of_range_is_rejected() {
        for rating in [json!(0), json!(6), json!(4.5), json!("4")] {
            let body = json!({"recipe": {"id": 3, "rating": rating}});
            assert!(recipe_to_save(&body).is_err(), "rating {rating} should be rejected");
        }
    }

    #[test]
    fn rating_must_be_a_whole_number_in_range() {
        assert_eq!(rating_request(&json!({"recipeId": 7, "rating": 4})).unwrap(), (7, 4));
        assert_eq!(rating_request(&json!({"recipeId": 7, "rating": 5.0})).unwrap(), (7, 5));

        for rating in [json!("4"), json!(0), json!(6), json!(2.5), json!(null)] {
            let body = json!({"recipeId": 7, "rating": rating});
            assert!(rating_request(&body).is_err(), "rating {rating} should be rejected");
        }
        assert!(rating_request(&json!({"recipeId": 0, "rating": 3})).is_err());
        assert_eq!(rating_request(&json!({"recipeId": 7.0, "rating": 3})).unwrap(), (7, 3));
    }

    #[test]
    fn grocery_input_must_be_an_array() {
        assert!(grocery_ingredients(&json!({"ingredients": "milk"})).is_err());
        assert_eq!(grocery_ingredients(&json!({"ingredients": ["milk"]})).unwrap().len(), 1);
    }
}
