use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::json;
use thiserror::Error;
use tracing::error;

use super::*;
use crate::error::ScoreError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("unauthorized request")]
    Unauthorized,

    #[error("invalid game key: {game_key:?}")]
    InvalidGameKey { game_key: String },

    #[error("a game with the key {game_key} already exists")]
    GameAlreadyExists { game_key: String },

    #[error(transparent)]
    Score(#[from] ScoreError),
}

impl RequestError {
    pub fn status(&self) -> Status {
        match self {
            Self::Unauthorized => Status::Unauthorized,
            Self::InvalidGameKey { .. } => Status::BadRequest,
            Self::GameAlreadyExists { .. } => Status::Conflict,
            Self::Score(ScoreError::Unauthenticated) => Status::Unauthorized,
            Self::Score(ScoreError::InvalidScore { .. }) => Status::UnprocessableEntity,
            Self::Score(ScoreError::UnknownGame { .. }) => Status::NotFound,
            Self::Score(ScoreError::StoreUnavailable(_)) => Status::ServiceUnavailable,
        }
    }
}

impl From<StoreError> for RequestError {
    fn from(err: StoreError) -> Self {
        Self::Score(ScoreError::StoreUnavailable(err))
    }
}

impl<'r> Responder<'r, 'static> for RequestError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status.class().is_server_error() {
            error!(error = %self, uri = %request.uri(), "Request failed");
        }

        let body = json!({ "error": self.to_string() });
        (status, Json(body)).respond_to(request)
    }
}

pub type RequestResult<T, E = RequestError> = std::result::Result<T, E>;
