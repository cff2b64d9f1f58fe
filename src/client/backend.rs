use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::models::{
    ErrorBody, GroceryItem, GroceryResponse, RateResponse, Recipe, SaveResponse, SuggestResponse,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request to backend failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend rejected request with {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// HTTP client for the recipe backend endpoints.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(BackendClient {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn suggest(&self, ingredients: &[String]) -> Result<Vec<Recipe>, ClientError> {
        let response: SuggestResponse = self
            .post("/api/recipes/suggest", &json!({ "ingredients": ingredients }))
            .await?;
        Ok(response.recipes)
    }

    pub async fn save(&self, recipe: &Recipe) -> Result<Vec<Recipe>, ClientError> {
        let response: SaveResponse = self
            .post("/api/recipes/save", &json!({ "recipe": recipe }))
            .await?;
        Ok(response.saved_recipes)
    }

    pub async fn rate(&self, recipe_id: i64, rating: i32) -> Result<BTreeMap<i64, i32>, ClientError> {
        let response: RateResponse = self
            .post(
                "/api/recipes/rate",
                &json!({ "recipeId": recipe_id, "rating": rating }),
            )
            .await?;
        Ok(response.recipe_ratings)
    }

    pub async fn generate_grocery_list(
        &self,
        ingredients: &[String],
    ) -> Result<Vec<GroceryItem>, ClientError> {
        let response: GroceryResponse = self
            .post("/api/grocery/generate", &json!({ "ingredients": ingredients }))
            .await?;
        Ok(response.grocery_list)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http_client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| status.to_string());
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}
