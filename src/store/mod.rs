use thiserror::Error;

use crate::score::{Game, ScoreRecord, User};

mod memory;
mod sql;

pub use memory::MemoryDatabase;
pub use sql::SqlDatabase;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("cannot encode record: {0}")]
    Encode(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Append-only collection of score records.
#[rocket::async_trait]
pub trait ScoreStore: Send + Sync {
    /// Appends one record. Either the whole record becomes visible to
    /// subsequent reads or nothing does.
    async fn append(&self, record: &ScoreRecord) -> StoreResult<()>;

    /// Every record, in insertion order.
    async fn all(&self) -> StoreResult<Vec<ScoreRecord>>;

    async fn len(&self) -> StoreResult<u64>;

    /// Removes every record and returns how many were removed.
    async fn clear(&self) -> StoreResult<u64>;
}

#[rocket::async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: &str) -> StoreResult<Option<User>>;

    /// Registers a new user under a freshly generated id.
    async fn register_user(&self, username: &str, avatar: Option<&str>) -> StoreResult<User>;
}

#[rocket::async_trait]
pub trait GameCatalog: Send + Sync {
    async fn find_game(&self, game_key: &str) -> StoreResult<Option<Game>>;

    /// Inserts `game` unless its key is taken. Returns the stored entry,
    /// which is the pre-existing one in the latter case.
    async fn register_game(&self, game: Game) -> StoreResult<Game>;

    async fn list_games(&self) -> StoreResult<Vec<Game>>;
}
