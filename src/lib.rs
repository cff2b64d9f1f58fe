//! Ingredient-driven recipe suggestions, saved recipes with ratings, and
//! grocery lists derived from suggested recipes.
//!
//! The HTTP surface lives in [`handlers`] and is mounted with [`configure`].
//! The [`client`] module is the UI-side state and orchestration that talks
//! to that surface.

use actix_web::web;
use failsafe::backoff::EqualJittered;
use failsafe::failure_policy::{ConsecutiveFailures, OrElse, SuccessRateOverTimeWindow};
use failsafe::{Config, StateMachine};

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod grocery;
pub mod handlers;
pub mod models;
mod query;
mod schema;
pub mod spoonacular;
pub mod store;
pub mod validation;

pub type CircuitBreakerType = StateMachine<
    OrElse<SuccessRateOverTimeWindow<EqualJittered>, ConsecutiveFailures<EqualJittered>>,
    (),
>;

pub fn new_circuit_breaker() -> CircuitBreakerType {
    Config::new().build()
}

/// Registers every route. The caller provides `web::Data<RecipeSearchClient>`
/// and `web::Data<dyn RecipeStore>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(handlers::json_config())
        .service(handlers::health)
        .service(handlers::suggest_recipes)
        .service(handlers::save_recipe)
        .service(handlers::rate_recipe)
        .service(handlers::generate_grocery_list);
}
