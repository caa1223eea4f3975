use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::*;

use crate::catalog;
use crate::config::Config;
use crate::error::ScoreError;
use crate::keys::StringKey;
use crate::leaderboard::Leaderboard;
use crate::store::{
    GameCatalog, MemoryDatabase, ScoreStore, SqlDatabase, StoreResult, UserDirectory,
};
use crate::submission::{GameRegistration, SubmissionGate};

mod request_error;
pub mod requests;

pub use request_error::*;

/// Everything the request handlers share.
pub struct AppState {
    pub scores: Arc<dyn ScoreStore>,
    pub users: Arc<dyn UserDirectory>,
    pub games: Arc<dyn GameCatalog>,
    pub admin_key: StringKey,
    pub game_registration: GameRegistration,
}

impl AppState {
    /// Opens the backend named by `config` and seeds it if asked to.
    pub async fn connect(config: &Config) -> Result<Self, ScoreError> {
        let state = match &config.database_url {
            Some(url) => Self::with_backend(Arc::new(SqlDatabase::connect(url).await?), config),
            None => Self::with_backend(Arc::new(MemoryDatabase::new()), config),
        };

        if config.seed_catalog {
            catalog::seed(state.games.as_ref()).await?;
        }
        if config.seed_sample_data {
            catalog::seed_sample_data(&state.gate()).await?;
        }
        Ok(state)
    }

    fn with_backend<B>(backend: Arc<B>, config: &Config) -> Self
    where
        B: ScoreStore + UserDirectory + GameCatalog + 'static,
    {
        Self {
            scores: backend.clone(),
            users: backend.clone(),
            games: backend,
            admin_key: config.admin_key.clone(),
            game_registration: config.game_registration,
        }
    }

    pub fn gate(&self) -> SubmissionGate<'_> {
        SubmissionGate {
            scores: self.scores.as_ref(),
            users: self.users.as_ref(),
            games: self.games.as_ref(),
            registration: self.game_registration,
        }
    }

    /// Current snapshot of the score store.
    pub async fn leaderboard(&self) -> StoreResult<Leaderboard> {
        Ok(Leaderboard::new(self.scores.all().await?))
    }
}
