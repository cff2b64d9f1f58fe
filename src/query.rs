use std::collections::BTreeMap;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;

use crate::models::{Recipe, RecipeRow};
use crate::store::StoreError;

const CREATE_RECIPES_TABLE: &str = "
CREATE TABLE IF NOT EXISTS recipes (
    id BIGINT PRIMARY KEY NOT NULL,
    title TEXT NOT NULL,
    image TEXT NOT NULL,
    used_ingredients TEXT NOT NULL,
    missed_ingredients TEXT NOT NULL,
    rating INTEGER
);";

pub(crate) fn ensure_schema(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    conn.batch_execute(CREATE_RECIPES_TABLE)?;
    Ok(())
}

/// Inserts the recipe unless its id is already stored. Returns the number
/// of inserted rows (0 or 1).
pub(crate) fn insert_recipe_if_absent(
    recipe: &Recipe,
    conn: &mut SqliteConnection,
) -> Result<usize, StoreError> {
    use crate::schema::recipes::dsl::*;

    let row = RecipeRow::from_recipe(recipe)?;
    let inserted = diesel::insert_or_ignore_into(recipes)
        .values(&row)
        .execute(conn)?;
    Ok(inserted)
}

pub(crate) fn update_rating(
    recipe_id: i64,
    new_rating: i32,
    conn: &mut SqliteConnection,
) -> Result<usize, StoreError> {
    use crate::schema::recipes::dsl::*;

    let updated = diesel::update(recipes.filter(id.eq(recipe_id)))
        .set(rating.eq(Some(new_rating)))
        .execute(conn)?;
    Ok(updated)
}

pub(crate) fn find_all_recipes(conn: &mut SqliteConnection) -> Result<Vec<Recipe>, StoreError> {
    use crate::schema::recipes::dsl::*;

    let rows = recipes
        .order(id.asc())
        .select(RecipeRow::as_select())
        .load(conn)?;
    rows.into_iter()
        .map(|row| row.into_recipe().map_err(StoreError::from))
        .collect()
}

pub(crate) fn find_ratings(conn: &mut SqliteConnection) -> Result<BTreeMap<i64, i32>, StoreError> {
    use crate::schema::recipes::dsl::*;

    let rated = recipes
        .filter(rating.is_not_null())
        .select((id, rating))
        .load::<(i64, Option<i32>)>(conn)?;
    Ok(rated
        .into_iter()
        .filter_map(|(recipe_id, value)| value.map(|value| (recipe_id, value)))
        .collect())
}
