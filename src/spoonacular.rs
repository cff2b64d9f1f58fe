//! Client for the Spoonacular `findByIngredients` search.
//!
//! Turns a list of ingredient names into at most [`MAX_SUGGESTIONS`] recipe
//! suggestions, normalized to [`Recipe`]. Upstream outcomes feed a circuit
//! breaker; while it is open, suggestions fail fast as unavailable. Results
//! are cached in redis when a cache is configured.

use actix_web::web;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::cache::SuggestionCache;
use crate::config::UpstreamConfig;
use crate::error::ApiError;
use crate::models::{IngredientRef, Recipe};
use crate::{new_circuit_breaker, CircuitBreakerType};

pub const MAX_SUGGESTIONS: u32 = 5;
const SEARCH_PATH: &str = "recipes/findByIngredients";
const RECIPE_PAGE_BASE: &str = "https://spoonacular.com/recipes";

/// The subset of an upstream search result this service keeps. Unknown
/// fields are dropped on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamRecipe {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub used_ingredients: Vec<IngredientRef>,
    #[serde(default)]
    pub missed_ingredients: Vec<IngredientRef>,
}

impl From<UpstreamRecipe> for Recipe {
    fn from(upstream: UpstreamRecipe) -> Self {
        Recipe {
            id: upstream.id,
            title: upstream.title,
            image: upstream.image,
            used_ingredients: upstream.used_ingredients,
            missed_ingredients: upstream.missed_ingredients,
            rating: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    message: Option<String>,
}

/// Public page of a recipe on spoonacular.com.
pub fn recipe_page_url(recipe: &Recipe) -> String {
    format!(
        "{RECIPE_PAGE_BASE}/{}-{}",
        recipe.title.replace(' ', "-"),
        recipe.id
    )
}

pub struct RecipeSearchClient {
    http_client: reqwest::Client,
    config: UpstreamConfig,
    circuit_breaker: CircuitBreakerType,
    cache: SuggestionCache,
}

impl RecipeSearchClient {
    pub fn new(config: UpstreamConfig, cache: SuggestionCache) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(RecipeSearchClient {
            http_client,
            config,
            circuit_breaker: new_circuit_breaker(),
            cache,
        })
    }

    /// Suggests recipes for the given ingredient names, in upstream order.
    ///
    /// An empty list returns no recipes without calling out.
    pub async fn suggest(&self, ingredients: &[String]) -> Result<Vec<Recipe>, ApiError> {
        if ingredients.is_empty() {
            return Ok(Vec::new());
        }
        let api_key = match &self.config.api_key {
            Some(key) => key.clone(),
            None => {
                log::error!("recipe API key is not set, cannot fetch recipes");
                return Err(ApiError::Configuration);
            }
        };

        let query = ingredients.join(",");
        let cache_key = format!("suggest:{query}");
        if let Some(cached) = self.cached(&cache_key).await {
            log::debug!("suggestions for {query:?} served from cache");
            return Ok(cached.into_iter().map(Recipe::from).collect());
        }

        let found = self.search(&query, &api_key).await?;
        self.store_in_cache(cache_key, found.clone()).await;
        Ok(found.into_iter().map(Recipe::from).collect())
    }

    async fn search(&self, query: &str, api_key: &str) -> Result<Vec<UpstreamRecipe>, ApiError> {
        let url = self.search_url()?;

        if !self.circuit_breaker.is_call_permitted() {
            log::warn!("recipe API circuit breaker is open, rejecting search");
            return Err(ApiError::UpstreamUnavailable);
        }

        let number = MAX_SUGGESTIONS.to_string();
        let response = self
            .http_client
            .get(url)
            .query(&[
                ("ingredients", query),
                ("number", number.as_str()),
                ("apiKey", api_key),
            ])
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) if err.is_builder() => {
                log::error!("error setting up recipe API request: {err}");
                return Err(ApiError::RequestSetup);
            }
            Err(err) => {
                self.circuit_breaker.on_error();
                log::error!("no response received from recipe API: {err}");
                return Err(ApiError::UpstreamUnavailable);
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(err) => {
                self.circuit_breaker.on_error();
                log::error!("recipe API response body could not be read: {err}");
                return Err(ApiError::UpstreamUnavailable);
            }
        };

        if !status.is_success() {
            if status.is_server_error() {
                self.circuit_breaker.on_error();
            } else {
                self.circuit_breaker.on_success();
            }
            return Err(upstream_failure(status, &body));
        }
        self.circuit_breaker.on_success();

        serde_json::from_slice(&body).map_err(|err| {
            log::error!("recipe API returned an unexpected body: {err}");
            ApiError::Upstream {
                status: StatusCode::BAD_GATEWAY.as_u16(),
                message: "Unexpected response from recipe API.".to_string(),
            }
        })
    }

    fn search_url(&self) -> Result<Url, ApiError> {
        let base = format!("{}/", self.config.base_url.trim_end_matches('/'));
        Url::parse(&base)
            .and_then(|base| base.join(SEARCH_PATH))
            .map_err(|err| {
                log::error!(
                    "invalid recipe API base url {:?}: {err}",
                    self.config.base_url
                );
                ApiError::RequestSetup
            })
    }

    async fn cached(&self, key: &str) -> Option<Vec<UpstreamRecipe>> {
        if !self.cache.is_enabled() {
            return None;
        }
        let cache = self.cache.clone();
        let key = key.to_string();
        match web::block(move || cache.get::<Vec<UpstreamRecipe>>(&key)).await {
            Ok(Ok(found)) => found,
            Ok(Err(err)) => {
                log::warn!("suggestion cache lookup failed: {err}");
                None
            }
            Err(err) => {
                log::warn!("suggestion cache lookup was not run: {err}");
                None
            }
        }
    }

    async fn store_in_cache(&self, key: String, recipes: Vec<UpstreamRecipe>) {
        if !self.cache.is_enabled() {
            return;
        }
        let cache = self.cache.clone();
        match web::block(move || cache.put(&key, &recipes)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => log::warn!("suggestion cache write failed: {err}"),
            Err(err) => log::warn!("suggestion cache write was not run: {err}"),
        }
    }
}

fn upstream_failure(status: StatusCode, body: &[u8]) -> ApiError {
    let message = serde_json::from_slice::<UpstreamErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| format!("Spoonacular API error: {}", status.as_u16()));
    log::error!(
        "recipe API responded with {status}: {}",
        String::from_utf8_lossy(body)
    );
    ApiError::Upstream {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upstream_result_drops_unknown_fields() {
        let upstream: UpstreamRecipe = serde_json::from_value(json!({
            "id": 716429,
            "title": "Pasta with Garlic",
            "image": "https://img.spoonacular.com/recipes/716429-312x231.jpg",
            "imageType": "jpg",
            "likes": 209,
            "usedIngredientCount": 1,
            "usedIngredients": [
                {"id": 11215, "name": "garlic", "original": "2 cloves garlic", "amount": 2.0}
            ],
            "missedIngredients": [
                {"id": 20420, "name": "pasta", "original": "8 oz pasta", "unit": "oz"}
            ]
        }))
        .unwrap();

        let recipe = Recipe::from(upstream);
        let value = serde_json::to_value(&recipe).unwrap();
        assert_eq!(
            value.as_object().unwrap().keys().collect::<Vec<_>>(),
            vec!["id", "image", "missedIngredients", "title", "usedIngredients"]
        );
        assert_eq!(value["usedIngredients"][0], json!({"id": 11215, "name": "garlic", "original": "2 cloves garlic"}));
    }

    #[test]
    fn recipe_page_url_dashes_title() {
        let recipe = Recipe {
            id: 716429,
            title: "Pasta with Garlic".to_string(),
            image: String::new(),
            used_ingredients: vec![],
            missed_ingredients: vec![],
            rating: None,
        };
        assert_eq!(
            recipe_page_url(&recipe),
            "https://spoonacular.com/recipes/Pasta-with-Garlic-716429"
        );
    }

    #[test]
    fn upstream_failure_prefers_upstream_message() {
        let err = upstream_failure(
            StatusCode::UNAUTHORIZED,
            br#"{"status":"failure","code":401,"message":"You are not authorized."}"#,
        );
        match err {
            ApiError::Upstream { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "You are not authorized.");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn upstream_failure_without_message_names_status() {
        let err = upstream_failure(StatusCode::SERVICE_UNAVAILABLE, b"<html>down</html>");
        assert_eq!(err.to_string(), "Spoonacular API error: 503");
    }

    #[test]
    fn malformed_base_url_is_a_setup_error() {
        let config = UpstreamConfig {
            base_url: "not a url".to_string(),
            api_key: Some("key".to_string()),
            ..UpstreamConfig::default()
        };
        let client = RecipeSearchClient::new(config, SuggestionCache::disabled()).unwrap();
        assert!(matches!(client.search_url(), Err(ApiError::RequestSetup)));
    }
}
