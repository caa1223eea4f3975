use chrono::{SubsecRound, Utc};
use rocket::serde::{json::Value, Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::catalog;
use crate::error::ScoreError;
use crate::keys::StringKey;
use crate::score::{Game, GameScore, Metadata, ScoreRecord};
use crate::store::{GameCatalog, ScoreStore, UserDirectory};

/// A raw play result as sent by a client.
#[derive(Clone, Serialize, Deserialize, Debug)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub game_key: String,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Kept untyped so that malformed or missing values are reported as
    /// invalid scores.
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// What to do with a submission for a game the catalog does not know.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameRegistration {
    /// Register the game on the fly.
    Lazy,
    /// Reject with [`ScoreError::UnknownGame`].
    KnownOnly,
}

/// Validates submissions and appends the resulting records.
pub struct SubmissionGate<'a> {
    pub scores: &'a dyn ScoreStore,
    pub users: &'a dyn UserDirectory,
    pub games: &'a dyn GameCatalog,
    pub registration: GameRegistration,
}

impl<'a> SubmissionGate<'a> {
    #[instrument(skip(self, submission), fields(game_key = %submission.game_key))]
    pub async fn submit(&self, submission: ScoreSubmission) -> Result<ScoreRecord, ScoreError> {
        let user_id = match submission.user_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => {
                warn!("Rejected a submission without a user");
                return Err(ScoreError::Unauthenticated);
            }
        };
        let user = match self.users.find_user(user_id).await? {
            Some(user) => user,
            None => {
                warn!(user_id, "Rejected a submission from an unknown user");
                return Err(ScoreError::Unauthenticated);
            }
        };

        let value = validate_value(&submission.value).map_err(|err| {
            warn!(user_id, value = %submission.value, "Rejected an invalid score");
            err
        })?;

        let game = self.resolve_game(&submission.game_key).await?;

        let record = ScoreRecord::new(
            StringKey::generate_score_id().into_inner(),
            &user,
            &game,
            value,
            submission.metadata.unwrap_or_default(),
            // Millisecond precision, so every backend stores it exactly.
            Utc::now().trunc_subsecs(3),
        );
        self.scores.append(&record).await?;

        info!(score_id = %record.id, user_id, value, "Score submitted");
        Ok(record)
    }

    async fn resolve_game(&self, game_key: &str) -> Result<Game, ScoreError> {
        if game_key.is_empty() {
            return Err(ScoreError::UnknownGame {
                game_key: game_key.to_owned(),
            });
        }

        if let Some(game) = self.games.find_game(game_key).await? {
            return Ok(game);
        }

        match self.registration {
            GameRegistration::Lazy => {
                info!(game_key, "Registering a game on first submission");
                Ok(self.games.register_game(catalog::lazy_game(game_key)).await?)
            }
            GameRegistration::KnownOnly => Err(ScoreError::UnknownGame {
                game_key: game_key.to_owned(),
            }),
        }
    }
}

/// Accepts finite non-negative integers that fit [`GameScore`].
/// Integral floats such as `150.0` count as integers.
pub fn validate_value(value: &Value) -> Result<GameScore, ScoreError> {
    let number = match value {
        Value::Number(number) => number,
        other => return Err(ScoreError::invalid(format!("{} is not a number", other))),
    };

    if let Some(value) = number.as_u64() {
        return GameScore::try_from(value)
            .map_err(|_| ScoreError::invalid(format!("{} is too large", value)));
    }
    if number.as_i64().is_some() {
        return Err(ScoreError::invalid(format!("{} is negative", number)));
    }

    match number.as_f64() {
        Some(float) if !float.is_finite() => {
            Err(ScoreError::invalid(format!("{} is not finite", number)))
        }
        Some(float) if float.fract() != 0.0 => {
            Err(ScoreError::invalid(format!("{} is not an integer", number)))
        }
        Some(float) if float < 0.0 => Err(ScoreError::invalid(format!("{} is negative", number))),
        Some(float) if float > f64::from(GameScore::MAX) => {
            Err(ScoreError::invalid(format!("{} is too large", number)))
        }
        Some(float) => Ok(float as GameScore),
        None => Err(ScoreError::invalid(format!("{} is not a number", number))),
    }
}
