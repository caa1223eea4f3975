use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rocket::serde::{json::Value, Deserialize, Serialize};

// Types allowed in the database:
// i64
// f64
// bool
// String
// Scores are stored as i64 and widened back on read.

pub type GameScore = u32;

/// Auxiliary fields attached to a play result (`moves`, `time`, `winner`, ...).
/// Never interpreted by the ranking code.
pub type Metadata = BTreeMap<String, Value>;

/// Opaque identifier of a score record.
pub type ScoreId = String;

/// One completed play result.
///
/// `username`, `avatar` and `game_display_name` are copied from the user
/// and game at submission time. Renaming the user or the game later does not
/// touch records that already exist.
#[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct ScoreRecord {
    pub id: ScoreId,
    pub user_id: String,
    pub game_key: String,
    pub value: GameScore,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub username: String,
    pub avatar: Option<String>,
    pub game_display_name: String,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(crate = "rocket::serde")]
pub struct User {
    pub id: String,
    pub username: String,
    pub avatar: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct Game {
    pub key: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Game {
    pub fn new(key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            description: None,
            category: None,
            difficulty: None,
            active: true,
        }
    }
}

impl ScoreRecord {
    /// Assembles a record from its parts, snapshotting the display fields
    /// of `user` and `game`.
    pub fn new(
        id: ScoreId,
        user: &User,
        game: &Game,
        value: GameScore,
        metadata: Metadata,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id: user.id.clone(),
            game_key: game.key.clone(),
            value,
            metadata,
            created_at,
            username: user.username.clone(),
            avatar: user.avatar.clone(),
            game_display_name: game.display_name.clone(),
        }
    }
}
