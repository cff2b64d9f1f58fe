//! Persistent store for saved recipes and their ratings.
//!
//! Writes are single statements keyed by the external recipe id, so a save
//! or a rating either applies completely or not at all. Saving an id that is
//! already stored leaves the stored record untouched, and rating an id that
//! was never saved changes nothing.

use std::collections::BTreeMap;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::{Connection, SqliteConnection};
use failsafe::CircuitBreaker;

use crate::models::Recipe;
use crate::{new_circuit_breaker, query, CircuitBreakerType};

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::PoolError),
    #[error("query failed: {0}")]
    Query(#[from] diesel::result::Error),
    #[error("stored ingredient list could not be encoded: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("storage circuit breaker is open")]
    Rejected,
}

/// Storage interface for saved recipes. Both writes are idempotent by id.
pub trait RecipeStore: Send + Sync {
    /// Inserts the recipe when no record with its id exists. Returns whether
    /// a record was inserted.
    fn upsert_if_absent(&self, recipe: &Recipe) -> Result<bool, StoreError>;

    /// Sets the rating of an existing record. Returns the number of records
    /// updated, which is zero when the id is unknown.
    fn update_rating_if_exists(&self, recipe_id: i64, rating: i32) -> Result<usize, StoreError>;

    fn all_recipes(&self) -> Result<Vec<Recipe>, StoreError>;

    fn ratings(&self) -> Result<BTreeMap<i64, i32>, StoreError>;

    /// [`RecipeStore::upsert_if_absent`] followed by a listing of every
    /// stored recipe. Stores that can should run both as one unit, so a
    /// failed listing leaves nothing inserted.
    fn upsert_and_list(&self, recipe: &Recipe) -> Result<(bool, Vec<Recipe>), StoreError> {
        let inserted = self.upsert_if_absent(recipe)?;
        Ok((inserted, self.all_recipes()?))
    }

    /// [`RecipeStore::update_rating_if_exists`] followed by every stored
    /// rating, with the same all-or-nothing expectation.
    fn rate_and_list(&self, recipe_id: i64, rating: i32) -> Result<(usize, BTreeMap<i64, i32>), StoreError> {
        let updated = self.update_rating_if_exists(recipe_id, rating)?;
        Ok((updated, self.ratings()?))
    }
}

#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute("PRAGMA busy_timeout = 5000; PRAGMA journal_mode = WAL;")
            .map_err(r2d2::Error::QueryError)
    }
}

pub struct SqliteRecipeStore {
    pool: DbPool,
    circuit_breaker: CircuitBreakerType,
}

impl SqliteRecipeStore {
    /// Opens (creating if needed) the SQLite database at `database_url`.
    pub fn open(database_url: &str, pool_size: u32) -> Result<Self, StoreError> {
        Self::with_pool(database_url, r2d2::Pool::builder().max_size(pool_size.max(1)))
    }

    /// A private in-memory database. Uses a single connection that is never
    /// recycled, since every `:memory:` connection is its own database.
    pub fn in_memory() -> Result<Self, StoreError> {
        let builder = r2d2::Pool::builder()
            .max_size(1)
            .max_lifetime(None)
            .idle_timeout(None);
        Self::with_pool(":memory:", builder)
    }

    fn with_pool(
        database_url: &str,
        builder: r2d2::Builder<ConnectionManager<SqliteConnection>>,
    ) -> Result<Self, StoreError> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let pool = builder
            .connection_customizer(Box::new(SqlitePragmas))
            .build(manager)?;

        let mut conn = pool.get()?;
        query::ensure_schema(&mut conn)?;

        Ok(SqliteRecipeStore {
            pool,
            circuit_breaker: new_circuit_breaker(),
        })
    }

    fn with_connection<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, StoreError>,
    {
        let result = self.circuit_breaker.call(|| {
            let mut conn = self.pool.get()?;
            op(&mut *conn)
        });
        match result {
            Ok(value) => Ok(value),
            Err(failsafe::Error::Inner(err)) => Err(err),
            Err(failsafe::Error::Rejected) => Err(StoreError::Rejected),
        }
    }
}

impl RecipeStore for SqliteRecipeStore {
    fn upsert_if_absent(&self, recipe: &Recipe) -> Result<bool, StoreError> {
        self.with_connection(|conn| query::insert_recipe_if_absent(recipe, conn))
            .map(|inserted| inserted > 0)
    }

    fn update_rating_if_exists(&self, recipe_id: i64, rating: i32) -> Result<usize, StoreError> {
        self.with_connection(|conn| query::update_rating(recipe_id, rating, conn))
    }

    fn all_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        self.with_connection(query::find_all_recipes)
    }

    fn ratings(&self) -> Result<BTreeMap<i64, i32>, StoreError> {
        self.with_connection(query::find_ratings)
    }

    fn upsert_and_list(&self, recipe: &Recipe) -> Result<(bool, Vec<Recipe>), StoreError> {
        self.with_connection(|conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let inserted = query::insert_recipe_if_absent(recipe, conn)?;
                Ok((inserted > 0, query::find_all_recipes(conn)?))
            })
        })
    }

    fn rate_and_list(&self, recipe_id: i64, rating: i32) -> Result<(usize, BTreeMap<i64, i32>), StoreError> {
        self.with_connection(|conn| {
            conn.transaction::<_, StoreError, _>(|conn| {
                let updated = query::update_rating(recipe_id, rating, conn)?;
                Ok((updated, query::find_ratings(conn)?))
            })
        })
    }
}

/// Saves `recipe` unless its id is already stored and returns every stored
/// recipe afterwards.
pub fn save_recipe<S>(store: &S, recipe: &Recipe) -> Result<Vec<Recipe>, StoreError>
where
    S: RecipeStore + ?Sized,
{
    let (inserted, saved) = store.upsert_and_list(recipe)?;
    if !inserted {
        log::debug!("recipe {} already saved, keeping stored copy", recipe.id);
    }
    Ok(saved)
}

/// Rates a saved recipe and returns the rating of every rated recipe.
pub fn rate_recipe<S>(store: &S, recipe_id: i64, rating: i32) -> Result<BTreeMap<i64, i32>, StoreError>
where
    S: RecipeStore + ?Sized,
{
    let (updated, ratings) = store.rate_and_list(recipe_id, rating)?;
    if updated == 0 {
        log::info!("rating ignored, recipe {recipe_id} is not saved");
    }
    Ok(ratings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IngredientRef;

    fn recipe(id: i64, title: &str) -> Recipe {
        Recipe {
            id,
            title: title.to_string(),
            image: format!("https://img.example/{id}.jpg"),
            used_ingredients: vec![IngredientRef {
                id: 1,
                name: "egg".to_string(),
                original: "2 eggs".to_string(),
            }],
            missed_ingredients: vec![],
            rating: None,
        }
    }

    #[test]
    fn saving_same_id_twice_keeps_first_record() {
        let store = SqliteRecipeStore::in_memory().unwrap();

        save_recipe(&store, &recipe(1, "Omelette")).unwrap();
        let saved = save_recipe(&store, &recipe(1, "Renamed omelette")).unwrap();

        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].title, "Omelette");
        assert_eq!(saved[0].used_ingredients[0].original, "2 eggs");
    }

    #[test]
    fn saved_recipes_are_listed_by_id() {
        let store = SqliteRecipeStore::in_memory().unwrap();

        save_recipe(&store, &recipe(20, "Pancakes")).unwrap();
        let saved = save_recipe(&store, &recipe(3, "Frittata")).unwrap();

        let ids: Vec<i64> = saved.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 20]);
    }

    #[test]
    fn rating_unknown_id_inserts_nothing() {
        let store = SqliteRecipeStore::in_memory().unwrap();
        save_recipe(&store, &recipe(1, "Omelette")).unwrap();

        let ratings = rate_recipe(&store, 99, 4).unwrap();

        assert!(!ratings.contains_key(&99));
        assert_eq!(store.all_recipes().unwrap().len(), 1);
    }

    #[test]
    fn rating_is_updated_in_place() {
        let store = SqliteRecipeStore::in_memory().unwrap();
        save_recipe(&store, &recipe(1, "Omelette")).unwrap();
        save_recipe(&store, &recipe(2, "Frittata")).unwrap();

        rate_recipe(&store, 1, 3).unwrap();
        let ratings = rate_recipe(&store, 1, 5).unwrap();

        assert_eq!(ratings, BTreeMap::from([(1, 5)]));
        assert_eq!(store.all_recipes().unwrap()[0].rating, Some(5));
    }

    #[test]
    fn failed_listing_rolls_back_the_insert() {
        let store = SqliteRecipeStore::in_memory().unwrap();
        {
            let mut conn = store.pool.get().unwrap();
            conn.batch_execute(
                "INSERT INTO recipes (id, title, image, used_ingredients, missed_ingredients) \
                 VALUES (1, 'Broken', '', 'not json', '[]')",
            )
            .unwrap();
        }

        let err = save_recipe(&store, &recipe(2, "Frittata")).unwrap_err();
        assert!(matches!(err, StoreError::Encoding(_)));

        {
            let mut conn = store.pool.get().unwrap();
            conn.batch_execute("DELETE FROM recipes WHERE id = 1").unwrap();
        }
        assert!(store.all_recipes().unwrap().is_empty());
    }

    #[test]
    fn in_memory_connection_is_never_recycled() {
        let store = SqliteRecipeStore::in_memory().unwrap();

        assert_eq!(store.pool.max_size(), 1);
        assert_eq!(store.pool.max_lifetime(), None);
        assert_eq!(store.pool.idle_timeout(), None);
    }

    #[test]
    fn saved_recipes_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipes.db");
        let url = path.to_str().unwrap();

        {
            let store = SqliteRecipeStore::open(url, 2).unwrap();
            save_recipe(&store, &recipe(42, "Shakshuka")).unwrap();
            rate_recipe(&store, 42, 4).unwrap();
        }

        let reopened = SqliteRecipeStore::open(url, 2).unwrap();
        let saved = reopened.all_recipes().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].title, "Shakshuka");
        assert_eq!(saved[0].rating, Some(4));
    }
}
