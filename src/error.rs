use thiserror::Error;

use crate::store::StoreError;

/// Reasons a score submission can be refused.
///
/// All of them leave the score store untouched.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("no authenticated user for this submission")]
    Unauthenticated,

    #[error("invalid score: {reason}")]
    InvalidScore { reason: String },

    #[error("no game with the key {game_key} is registered")]
    UnknownGame { game_key: String },

    #[error("score store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl ScoreError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidScore {
            reason: reason.into(),
        }
    }
}
