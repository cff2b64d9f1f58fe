//! Client side of the recipe finder: the state a UI renders and the session
//! that turns user actions into backend calls.
//!
//! Request failures never escape a [`Session`]; they show up in the state as
//! an empty recipe or grocery list, or as a per-recipe status message.

mod backend;
mod state;

pub use backend::{BackendClient, ClientError};
pub use state::{Action, ClientState, Outcome, RATED, RATE_FAILED, SAVED, SAVE_FAILED};

pub struct Session {
    backend: BackendClient,
    state: ClientState,
}

impl Session {
    pub fn new(backend: BackendClient) -> Self {
        Session {
            backend,
            state: ClientState::default(),
        }
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    fn dispatch(&mut self, action: Action) {
        self.state = std::mem::take(&mut self.state).reduce(action);
    }

    pub fn add_ingredient(&mut self, name: &str) {
        self.dispatch(Action::AddIngredient(name.to_string()));
    }

    pub fn toggle_dark_mode(&mut self) {
        self.dispatch(Action::ToggleDarkMode);
    }

    pub async fn request_suggestions(&mut self) {
        self.dispatch(Action::SuggestStarted);
        let recipes = match self.backend.suggest(&self.state.ingredients).await {
            Ok(recipes) => recipes,
            Err(err) => {
                log::warn!("recipe suggestions failed: {err}");
                Vec::new()
            }
        };
        self.dispatch(Action::SuggestFinished(recipes));
    }

    pub async fn request_grocery_list(&mut self) {
        let names = self.state.grocery_request();
        log::debug!("requesting grocery list for {names:?}");
        let items = match self.backend.generate_grocery_list(&names).await {
            Ok(items) => items,
            Err(err) => {
                log::warn!("grocery list generation failed: {err}");
                Vec::new()
            }
        };
        self.dispatch(Action::GroceryListReceived(items));
    }

    /// Saves one of the displayed recipes.
    pub async fn save_recipe(&mut self, recipe_id: i64) {
        let outcome = match self.state.recipe(recipe_id) {
            Some(recipe) => match self.backend.save(recipe).await {
                Ok(_) => Outcome::Succeeded,
                Err(err) => {
                    log::warn!("saving recipe {recipe_id} failed: {err}");
                    Outcome::Failed
                }
            },
            None => {
                log::warn!("recipe {recipe_id} is not displayed, nothing to save");
                Outcome::Failed
            }
        };
        self.dispatch(Action::SaveFinished { recipe_id, outcome });
    }

    /// Records the selected rating locally, then sends it.
    pub async fn rate_recipe(&mut self, recipe_id: i64, rating: i32) {
        self.dispatch(Action::RatingSelected { recipe_id, rating });
        let outcome = match self.backend.rate(recipe_id, rating).await {
            Ok(_) => Outcome::Succeeded,
            Err(err) => {
                log::warn!("rating recipe {recipe_id} failed: {err}");
                Outcome::Failed
            }
        };
        self.dispatch(Action::RateFinished { recipe_id, outcome });
    }
}
