use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::warn;

use super::*;
use crate::keys::StringKey;

/// Process-local backend. Data is lost when the server stops.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    scores: RwLock<Vec<ScoreRecord>>,
    users: RwLock<HashMap<String, User>>,
    games: RwLock<Vec<Game>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[rocket::async_trait]
impl ScoreStore for MemoryDatabase {
    async fn append(&self, record: &ScoreRecord) -> StoreResult<()> {
        self.scores.write().await.push(record.clone());
        Ok(())
    }

    async fn all(&self) -> StoreResult<Vec<ScoreRecord>> {
        Ok(self.scores.read().await.clone())
    }

    async fn len(&self) -> StoreResult<u64> {
        Ok(self.scores.read().await.len() as u64)
    }

    async fn clear(&self) -> StoreResult<u64> {
        let mut scores = self.scores.write().await;
        let removed = scores.len() as u64;
        scores.clear();
        warn!(removed, "Cleared scores in memory");
        Ok(removed)
    }
}

#[rocket::async_trait]
impl UserDirectory for MemoryDatabase {
    async fn find_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn register_user(&self, username: &str, avatar: Option<&str>) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let user = User {
            id: StringKey::generate_user_id().into_inner(),
            username: username.to_owned(),
            avatar: avatar.map(str::to_owned),
        };
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }
}

#[rocket::async_trait]
impl GameCatalog for MemoryDatabase {
    async fn find_game(&self, game_key: &str) -> StoreResult<Option<Game>> {
        let games = self.games.read().await;
        Ok(games.iter().find(|game| game.key == game_key).cloned())
    }

    async fn register_game(&self, game: Game) -> StoreResult<Game> {
        let mut games = self.games.write().await;
        if let Some(existing) = games.iter().find(|g| g.key == game.key) {
            return Ok(existing.clone());
        }
        games.push(game.clone());
        Ok(game)
    }

    async fn list_games(&self) -> StoreResult<Vec<Game>> {
        Ok(self.games.read().await.clone())
    }
}
