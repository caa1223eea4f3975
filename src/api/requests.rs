use chrono::{DateTime, Utc};
use rocket::http::Status;
use rocket::serde::json::{json, Value};
use rocket::serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::keys::ApiKey;
use crate::leaderboard::{Leaderboard, UserStats};
use crate::score::{Game, ScoreRecord, User};
use crate::submission::ScoreSubmission;

use super::*;

pub const DEFAULT_LIMIT: i64 = 10;

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum AuthorityLevel {
    Unauthorized,
    Admin,
}

#[derive(Serialize, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(crate = "rocket::serde")]
pub struct UserRank {
    pub rank: Option<usize>,
}

#[derive(Serialize, Deserialize)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct ScoreExport {
    pub export_date: DateTime<Utc>,
    pub total_scores: usize,
    pub scores: Leaderboard,
}

fn authority_level(api_key: &ApiKey<'_>, state: &AppState) -> AuthorityLevel {
    if api_key.0 == state.admin_key.inner() {
        AuthorityLevel::Admin
    } else {
        AuthorityLevel::Unauthorized
    }
}

fn require_admin(api_key: &ApiKey<'_>, state: &AppState) -> RequestResult<()> {
    if authority_level(api_key, state) < AuthorityLevel::Admin {
        return Err(RequestError::Unauthorized);
    }
    Ok(())
}

/// Missing limits fall back to [`DEFAULT_LIMIT`], non-positive ones select nothing.
pub fn clamp_limit(limit: Option<i64>) -> usize {
    match limit.unwrap_or(DEFAULT_LIMIT) {
        limit if limit <= 0 => 0,
        limit => usize::try_from(limit).unwrap_or(usize::MAX),
    }
}

/// Answers requests that never reach a handler (failed guards, malformed
/// bodies, unknown routes) with the same `{"error"}` body handlers use.
#[catch(default)]
pub fn default_catcher(status: Status, request: &Request<'_>) -> (Status, Json<Value>) {
    debug!(%status, uri = %request.uri(), "Request was caught");
    let reason = status.reason().unwrap_or("Request failed");
    (status, Json(json!({ "error": reason })))
}

#[get("/")]
pub fn index() -> &'static str {
    "This is the Retro Games leaderboard server!"
}

#[get("/games")]
pub async fn list_games(state: &State<AppState>) -> RequestResult<Json<Vec<Game>>> {
    Ok(Json(state.games.list_games().await?))
}

/// Registers a new game. Returns an error if the key is empty or taken.
#[post("/games", format = "json", data = "<game>")]
pub async fn create_game(
    game: Json<Game>,
    api_key: ApiKey<'_>,
    state: &State<AppState>,
) -> RequestResult<Json<Game>> {
    require_admin(&api_key, state)?;
    let game = game.0;

    if game.key.trim().is_empty() {
        return Err(RequestError::InvalidGameKey { game_key: game.key });
    }

    if state.games.find_game(&game.key).await?.is_some() {
        return Err(RequestError::GameAlreadyExists { game_key: game.key });
    }

    let game = state.games.register_game(game).await?;
    info!(game_key = %game.key, "Registered game");
    Ok(Json(game))
}

/// Ranked scores of one game, or of all games when `game` is absent.
#[get("/scores?<game>&<limit>")]
pub async fn get_scores(
    game: Option<&str>,
    limit: Option<i64>,
    state: &State<AppState>,
) -> RequestResult<Json<Vec<ScoreRecord>>> {
    let limit = clamp_limit(limit);
    let leaderboard = state.leaderboard().await?;

    let scores = match game {
        Some(game_key) => leaderboard.game_scores(game_key, limit),
        None => leaderboard.top_scores(limit),
    };
    debug!(game = ?game, limit, returned = scores.len(), "Fetched scores");
    Ok(Json(scores))
}

#[get("/scores/top?<limit>")]
pub async fn get_top_scores(
    limit: Option<i64>,
    state: &State<AppState>,
) -> RequestResult<Json<Vec<ScoreRecord>>> {
    let leaderboard = state.leaderboard().await?;
    Ok(Json(leaderboard.top_scores(clamp_limit(limit))))
}

/// Validates and stores a play result, returning the created record.
#[post("/scores", format = "json", data = "<submission>")]
pub async fn add_score(
    submission: Json<ScoreSubmission>,
    state: &State<AppState>,
) -> RequestResult<Json<ScoreRecord>> {
    let record = state.gate().submit(submission.0).await?;
    Ok(Json(record))
}

#[get("/scores/export")]
pub async fn export_scores(state: &State<AppState>) -> RequestResult<Json<ScoreExport>> {
    let leaderboard = state.leaderboard().await?;
    Ok(Json(ScoreExport {
        export_date: Utc::now(),
        total_scores: leaderboard.len(),
        scores: leaderboard,
    }))
}

/// Removes every score and returns how many were removed.
#[delete("/scores")]
pub async fn clear_scores(
    api_key: ApiKey<'_>,
    state: &State<AppState>,
) -> RequestResult<Json<u64>> {
    require_admin(&api_key, state)?;
    let removed = state.scores.clear().await?;
    info!(removed, "Cleared all scores");
    Ok(Json(removed))
}

#[post("/users", format = "json", data = "<user>")]
pub async fn create_user(
    user: Json<NewUser>,
    api_key: ApiKey<'_>,
    state: &State<AppState>,
) -> RequestResult<Json<User>> {
    require_admin(&api_key, state)?;
    let user = state
        .users
        .register_user(&user.username, user.avatar.as_deref())
        .await?;
    info!(user_id = %user.id, username = %user.username, "Registered user");
    Ok(Json(user))
}

#[get("/users/<user_id>/stats")]
pub async fn get_user_stats(
    user_id: &str,
    state: &State<AppState>,
) -> RequestResult<Json<UserStats>> {
    let leaderboard = state.leaderboard().await?;
    Ok(Json(leaderboard.user_stats(user_id)))
}

/// Position of the user's best score, overall or within `game`.
#[get("/users/<user_id>/rank?<game>")]
pub async fn get_user_rank(
    user_id: &str,
    game: Option<&str>,
    state: &State<AppState>,
) -> RequestResult<Json<UserRank>> {
    let leaderboard = state.leaderboard().await?;
    Ok(Json(UserRank {
        rank: leaderboard.user_rank(user_id, game),
    }))
}

#[get("/users/<user_id>/best")]
pub async fn get_user_best_scores(
    user_id: &str,
    state: &State<AppState>,
) -> RequestResult<Json<Vec<ScoreRecord>>> {
    let leaderboard = state.leaderboard().await?;
    Ok(Json(leaderboard.user_best_scores(user_id)))
}
