use std::collections::BTreeMap;

use crate::grocery;
use crate::models::{GroceryItem, Recipe};

pub const SAVED: &str = "Saved!";
pub const SAVE_FAILED: &str = "Error saving";
pub const RATED: &str = "Rated!";
pub const RATE_FAILED: &str = "Error rating";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddIngredient(String),
    SuggestStarted,
    /// Result of a suggestion request; a failed request arrives as an empty
    /// list.
    SuggestFinished(Vec<Recipe>),
    GroceryListReceived(Vec<GroceryItem>),
    SaveFinished { recipe_id: i64, outcome: Outcome },
    RatingSelected { recipe_id: i64, rating: i32 },
    RateFinished { recipe_id: i64, outcome: Outcome },
    ToggleDarkMode,
}

/// Everything the UI shows. Transitions go through [`ClientState::reduce`]
/// and never perform I/O.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientState {
    pub ingredients: Vec<String>,
    pub recipes: Vec<Recipe>,
    pub grocery_list: Vec<GroceryItem>,
    pub loading: bool,
    pub save_status: BTreeMap<i64, String>,
    pub rate_status: BTreeMap<i64, String>,
    pub selected_ratings: BTreeMap<i64, i32>,
    pub dark_mode: bool,
}

impl ClientState {
    pub fn reduce(mut self, action: Action) -> Self {
        match action {
            Action::AddIngredient(name) => {
                let name = name.trim();
                if !name.is_empty() {
                    self.ingredients.push(name.to_string());
                }
            }
            Action::SuggestStarted => self.loading = true,
            Action::SuggestFinished(recipes) => {
                self.recipes = recipes;
                self.loading = false;
            }
            Action::GroceryListReceived(items) => self.grocery_list = items,
            Action::SaveFinished { recipe_id, outcome } => {
                let status = match outcome {
                    Outcome::Succeeded => SAVED,
                    Outcome::Failed => SAVE_FAILED,
                };
                self.save_status.insert(recipe_id, status.to_string());
            }
            Action::RatingSelected { recipe_id, rating } => {
                self.selected_ratings.insert(recipe_id, rating);
            }
            Action::RateFinished { recipe_id, outcome } => {
                let status = match outcome {
                    Outcome::Succeeded => RATED,
                    Outcome::Failed => RATE_FAILED,
                };
                self.rate_status.insert(recipe_id, status.to_string());
            }
            Action::ToggleDarkMode => self.dark_mode = !self.dark_mode,
        }
        self
    }

    pub fn can_suggest(&self) -> bool {
        !self.ingredients.is_empty() && !self.loading
    }

    pub fn can_generate_grocery_list(&self) -> bool {
        !self.recipes.is_empty()
    }

    /// Deduplicated ingredient names of the displayed recipes, as sent for
    /// grocery list generation.
    pub fn grocery_request(&self) -> Vec<String> {
        grocery::unique_ingredient_names(&self.recipes)
    }

    pub fn recipe(&self, recipe_id: i64) -> Option<&Recipe> {
        self.recipes.iter().find(|recipe| recipe.id == recipe_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IngredientRef;

    fn refs(names: &[&str]) -> Vec<IngredientRef> {
        names
            .iter()
            .map(|name| IngredientRef {
                id: 0,
                name: name.to_string(),
                original: name.to_string(),
            })
            .collect()
    }

    fn recipe(id: i64, used: &[&str], missed: &[&str]) -> Recipe {
        Recipe {
            id,
            title: format!("recipe {id}"),
            image: String::new(),
            used_ingredients: refs(used),
            missed_ingredients: refs(missed),
            rating: None,
        }
    }

    #[test]
    fn ingredients_are_trimmed_and_blank_ones_ignored() {
        let state = ClientState::default()
            .reduce(Action::AddIngredient("  egg ".to_string()))
            .reduce(Action::AddIngredient("   ".to_string()))
            .reduce(Action::AddIngredient("egg".to_string()));

        assert_eq!(state.ingredients, vec!["egg", "egg"]);
    }

    #[test]
    fn suggest_cycle_toggles_busy_flag() {
        let state = ClientState::default().reduce(Action::AddIngredient("egg".to_string()));
        assert!(state.can_suggest());

        let busy = state.reduce(Action::SuggestStarted);
        assert!(busy.loading);
        assert!(!busy.can_suggest());

        let done = busy.reduce(Action::SuggestFinished(vec![recipe(1, &["egg"], &[])]));
        assert!(!done.loading);
        assert_eq!(done.recipes.len(), 1);
        assert!(done.can_generate_grocery_list());
    }

    #[test]
    fn failed_suggestion_clears_recipes() {
        let state = ClientState::default()
            .reduce(Action::SuggestFinished(vec![recipe(1, &["egg"], &[])]))
            .reduce(Action::SuggestStarted)
            .reduce(Action::SuggestFinished(Vec::new()));

        assert!(state.recipes.is_empty());
        assert!(!state.can_generate_grocery_list());
    }

    #[test]
    fn grocery_request_has_one_entry_per_name() {
        let state = ClientState::default().reduce(Action::SuggestFinished(vec![
            recipe(1, &["garlic"], &["lemon"]),
            recipe(2, &["pasta"], &["garlic"]),
        ]));

        assert_eq!(state.grocery_request(), vec!["garlic", "lemon", "pasta"]);
    }

    #[test]
    fn save_and_rate_statuses_are_tracked_per_recipe() {
        let state = ClientState::default()
            .reduce(Action::SaveFinished {
                recipe_id: 1,
                outcome: Outcome::Succeeded,
            })
            .reduce(Action::SaveFinished {
                recipe_id: 2,
                outcome: Outcome::Failed,
            })
            .reduce(Action::RatingSelected {
                recipe_id: 1,
                rating: 4,
            })
            .reduce(Action::RateFinished {
                recipe_id: 1,
                outcome: Outcome::Failed,
            });

        assert_eq!(state.save_status[&1], SAVED);
        assert_eq!(state.save_status[&2], SAVE_FAILED);
        assert_eq!(state.selected_ratings[&1], 4);
        assert_eq!(state.rate_status[&1], RATE_FAILED);
    }

    #[test]
    fn dark_mode_toggles() {
        let state = ClientState::default().reduce(Action::ToggleDarkMode);
        assert!(state.dark_mode);
        assert!(!state.reduce(Action::ToggleDarkMode).dark_mode);
    }
}
