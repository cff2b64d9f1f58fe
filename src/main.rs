use std::io;
use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};

use recipe_finder::cache::SuggestionCache;
use recipe_finder::config::Settings;
use recipe_finder::spoonacular::RecipeSearchClient;
use recipe_finder::store::{RecipeStore, SqliteRecipeStore};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let settings = Settings::from_env().map_err(io::Error::other)?;

    match &settings.upstream.api_key {
        Some(key) => log::info!(
            "recipe API key loaded ({}...)",
            key.chars().take(5).collect::<String>()
        ),
        None => log::warn!("SPOONACULAR_API_KEY is not set, suggestions will fail"),
    }

    // set up the recipe store
    let recipe_store: Arc<dyn RecipeStore> = Arc::new(
        SqliteRecipeStore::open(&settings.database_url, settings.database_pool_size)
            .map_err(io::Error::other)?,
    );
    log::info!("recipe store ready at {}", settings.database_url);

    let cache = match &settings.redis_url {
        Some(url) => SuggestionCache::connect(url, settings.cache_ttl_secs),
        None => SuggestionCache::disabled(),
    };
    let search = web::Data::new(
        RecipeSearchClient::new(settings.upstream.clone(), cache).map_err(io::Error::other)?,
    );
    let recipe_store = web::Data::from(recipe_store);

    log::info!(
        "starting HTTP server at http://{}:{}",
        settings.host,
        settings.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(search.clone())
            .app_data(recipe_store.clone())
            .wrap(middleware::Logger::default())
            .configure(recipe_finder::configure)
    })
    .bind((settings.host.as_str(), settings.port))?
    .run()
    .await
}
