use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rocket::serde::json::serde_json;
use sqlx::{any::AnyPoolOptions, any::AnyRow, AnyPool, Row};
use tracing::{debug, info, warn};

use super::*;
use crate::keys::StringKey;
use crate::score::{GameScore, Metadata};

pub type DatabasePool = AnyPool;

// Placeholders use the `$N` form, which both sqlite and postgres accept.
//
// The Any driver cannot decode NULL into `Option<String>` on sqlite and narrows
// integer binds to 32 bits, so optional text is stored as '' and score values
// and timestamps travel as text. Only `seq` and `active` stay integers; both
// are small.
const CREATE_TABLES: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS games (
        game_key TEXT PRIMARY KEY,
        display_name TEXT NOT NULL,
        description TEXT NOT NULL,
        category TEXT NOT NULL,
        difficulty TEXT NOT NULL,
        active BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS users (
        user_id TEXT PRIMARY KEY,
        username TEXT NOT NULL,
        avatar TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS scores (
        seq BIGINT PRIMARY KEY,
        score_id TEXT NOT NULL UNIQUE,
        user_id TEXT NOT NULL,
        game_key TEXT NOT NULL,
        value TEXT NOT NULL,
        metadata TEXT NOT NULL,
        created_at TEXT NOT NULL,
        username TEXT NOT NULL,
        avatar TEXT NOT NULL,
        game_display_name TEXT NOT NULL
    )",
];

const SCORE_COLUMNS: &str = "score_id, user_id, game_key, value, metadata, created_at, \
                             username, avatar, game_display_name";

const GAME_COLUMNS: &str = "game_key, display_name, description, category, difficulty, active";

/// Backend over any database sqlx can reach through [`AnyPool`].
pub struct SqlDatabase {
    pool: DatabasePool,
}

impl SqlDatabase {
    /// Connects to `database_url` and creates the tables if they are missing.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        sqlx::any::install_default_drivers();

        let mut options = AnyPoolOptions::new();
        if database_url.contains(":memory:") {
            // Every connection to an in-memory sqlite database sees its own data.
            options = options
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        }
        let pool = options.connect(database_url).await?;

        let database = Self { pool };
        database.create_tables().await?;
        info!("Connected to the score database");
        Ok(database)
    }

    async fn create_tables(&self) -> StoreResult<()> {
        for statement in CREATE_TABLES {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn optional(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn or_empty(text: &Option<String>) -> &str {
    text.as_deref().unwrap_or_default()
}

fn score_from_row(row: &AnyRow) -> StoreResult<ScoreRecord> {
    let value = row.try_get::<String, _>("value")?;
    let value = value
        .parse::<GameScore>()
        .map_err(|_| StoreError::Corrupt(format!("score value {:?} out of range", value)))?;

    let metadata = row.try_get::<String, _>("metadata")?;
    let metadata = serde_json::from_str::<Metadata>(&metadata)
        .map_err(|err| StoreError::Corrupt(format!("metadata: {}", err)))?;

    let created_at = row.try_get::<String, _>("created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|err| StoreError::Corrupt(format!("timestamp {:?}: {}", created_at, err)))?
        .with_timezone(&Utc);

    Ok(ScoreRecord {
        id: row.try_get("score_id")?,
        user_id: row.try_get("user_id")?,
        game_key: row.try_get("game_key")?,
        value,
        metadata,
        created_at,
        username: row.try_get("username")?,
        avatar: optional(row.try_get("avatar")?),
        game_display_name: row.try_get("game_display_name")?,
    })
}

fn game_from_row(row: &AnyRow) -> StoreResult<Game> {
    Ok(Game {
        key: row.try_get("game_key")?,
        display_name: row.try_get("display_name")?,
        description: optional(row.try_get("description")?),
        category: optional(row.try_get("category")?),
        difficulty: optional(row.try_get("difficulty")?),
        active: row.try_get::<i64, _>("active")? != 0,
    })
}

#[rocket::async_trait]
impl ScoreStore for SqlDatabase {
    async fn append(&self, record: &ScoreRecord) -> StoreResult<()> {
        let metadata = serde_json::to_string(&record.metadata)
            .map_err(|err| StoreError::Encode(format!("metadata: {}", err)))?;

        let mut transaction = self.pool.begin().await?;

        let next_seq = sqlx::query("SELECT COALESCE(MAX(seq), 0) + 1 AS next_seq FROM scores")
            .fetch_one(&mut *transaction)
            .await?
            .try_get::<i64, _>("next_seq")?;

        sqlx::query(&format!(
            "INSERT INTO scores (seq, {}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            SCORE_COLUMNS
        ))
        .bind(next_seq)
        .bind(record.id.as_str())
        .bind(record.user_id.as_str())
        .bind(record.game_key.as_str())
        .bind(record.value.to_string())
        .bind(metadata)
        .bind(record.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true))
        .bind(record.username.as_str())
        .bind(or_empty(&record.avatar))
        .bind(record.game_display_name.as_str())
        .execute(&mut *transaction)
        .await?;

        transaction.commit().await?;
        debug!(score_id = %record.id, seq = next_seq, "Inserted score");
        Ok(())
    }

    async fn all(&self) -> StoreResult<Vec<ScoreRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM scores ORDER BY seq ASC",
            SCORE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(score_from_row).collect()
    }

    async fn len(&self) -> StoreResult<u64> {
        let count = sqlx::query("SELECT COUNT(*) AS total FROM scores")
            .fetch_one(&self.pool)
            .await?
            .try_get::<i64, _>("total")?;
        Ok(count.max(0) as u64)
    }

    async fn clear(&self) -> StoreResult<u64> {
        let response = sqlx::query("DELETE FROM scores")
            .execute(&self.pool)
            .await?;

        let rows_affected = response.rows_affected();
        warn!(rows_affected, "Cleared the scores table");
        Ok(rows_affected)
    }
}

#[rocket::async_trait]
impl UserDirectory for SqlDatabase {
    async fn find_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT user_id, username, avatar FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| -> StoreResult<User> {
            Ok(User {
                id: row.try_get("user_id")?,
                username: row.try_get("username")?,
                avatar: optional(row.try_get("avatar")?),
            })
        })
        .transpose()
    }

    async fn register_user(&self, username: &str, avatar: Option<&str>) -> StoreResult<User> {
        let user = User {
            id: StringKey::generate_user_id().into_inner(),
            username: username.to_owned(),
            avatar: avatar.map(str::to_owned),
        };

        sqlx::query("INSERT INTO users (user_id, username, avatar) VALUES ($1, $2, $3)")
            .bind(user.id.as_str())
            .bind(user.username.as_str())
            .bind(or_empty(&user.avatar))
            .execute(&self.pool)
            .await?;

        Ok(user)
    }
}

#[rocket::async_trait]
impl GameCatalog for SqlDatabase {
    async fn find_game(&self, game_key: &str) -> StoreResult<Option<Game>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM games WHERE game_key = $1",
            GAME_COLUMNS
        ))
        .bind(game_key)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(game_from_row).transpose()
    }

    async fn register_game(&self, game: Game) -> StoreResult<Game> {
        let mut transaction = self.pool.begin().await?;

        let existing = sqlx::query(&format!(
            "SELECT {} FROM games WHERE game_key = $1",
            GAME_COLUMNS
        ))
        .bind(game.key.as_str())
        .fetch_optional(&mut *transaction)
        .await?;

        if let Some(row) = existing {
            return game_from_row(&row);
        }

        sqlx::query(&format!(
            "INSERT INTO games ({}) VALUES ($1, $2, $3, $4, $5, $6)",
            GAME_COLUMNS
        ))
        .bind(game.key.as_str())
        .bind(game.display_name.as_str())
        .bind(or_empty(&game.description))
        .bind(or_empty(&game.category))
        .bind(or_empty(&game.difficulty))
        .bind(i64::from(game.active))
        .execute(&mut *transaction)
        .await?;

        transaction.commit().await?;
        Ok(game)
    }

    async fn list_games(&self) -> StoreResult<Vec<Game>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM games ORDER BY game_key ASC",
            GAME_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(game_from_row).collect()
    }
}
