use actix_web::{get, post, web, HttpResponse};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::models::{GroceryResponse, RateResponse, SaveResponse, SuggestResponse};
use crate::spoonacular::RecipeSearchClient;
use crate::store::{self, RecipeStore};
use crate::{grocery, validation};

#[get("/")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": "Backend is running!" }))
}

#[post("/api/recipes/suggest")]
async fn suggest_recipes(
    search: web::Data<RecipeSearchClient>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let ingredients = validation::suggestion_ingredients(&body)?;
    if ingredients.is_empty() {
        log::warn!("empty ingredient list, no recipes will be suggested");
    }

    let recipes = search.suggest(&ingredients).await?;
    Ok(HttpResponse::Ok().json(SuggestResponse { recipes }))
}

#[post("/api/recipes/save")]
async fn save_recipe(
    recipe_store: web::Data<dyn RecipeStore>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let recipe = validation::recipe_to_save(&body)?;

    let saved_recipes = web::block(move || store::save_recipe(recipe_store.get_ref(), &recipe))
        .await
        .map_err(|err| {
            log::error!("save was not run: {err}");
            ApiError::Storage
        })??;

    Ok(HttpResponse::Ok().json(SaveResponse {
        success: true,
        saved_recipes,
    }))
}

#[post("/api/recipes/rate")]
async fn rate_recipe(
    recipe_store: web::Data<dyn RecipeStore>,
    body: web::Json<Value>,
) -> Result<HttpResponse, ApiError> {
    let (recipe_id, rating) = validation::rating_request(&body)?;

    let recipe_ratings =
        web::block(move || store::rate_recipe(recipe_store.get_ref(), recipe_id, rating))
            .await
            .map_err(|err| {
                log::error!("rating was not run: {err}");
                ApiError::Storage
            })??;

    Ok(HttpResponse::Ok().json(RateResponse {
        success: true,
        recipe_ratings,
    }))
}

#[post("/api/grocery/generate")]
async fn generate_grocery_list(body: web::Json<Value>) -> Result<HttpResponse, ApiError> {
    let ingredients = validation::grocery_ingredients(&body)?;
    Ok(HttpResponse::Ok().json(GroceryResponse {
        grocery_list: grocery::generate(ingredients),
    }))
}

/// Rejects bodies that are not JSON with the same `{error}` shape as other
/// validation failures.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("rejected request body: {err}");
        ApiError::validation("Request body must be valid JSON.").into()
    })
}
