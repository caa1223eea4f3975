use std::sync::Arc;

use rocket::{
    http::{ContentType, Header, Status},
    local::asynchronous::{Client, LocalResponse},
    serde::json::{json, Value},
};

use crate::{
    api::{requests::ScoreExport, requests::UserRank, AppState},
    config::Config,
    keys::API_KEY_HEADER,
    leaderboard::UserStats,
    score::{Game, ScoreRecord, User},
    store::{tests::FailingStore, MemoryDatabase, UserDirectory},
    submission::GameRegistration,
};

const ADMIN_KEY: &str = "testadminkey";
const TEST_GAME_KEY: &str = "tic-tac-toe";

async fn spawn_client() -> Client {
    let state = AppState::connect(&Config::in_memory(ADMIN_KEY))
        .await
        .expect("in-memory state");
    Client::tracked(super::build(state))
        .await
        .expect("valid rocket instance")
}

async fn spawn_sql_client() -> Client {
    let config = Config {
        database_url: Some("sqlite::memory:".to_owned()),
        ..Config::in_memory(ADMIN_KEY)
    };
    let state = AppState::connect(&config).await.expect("sqlite state");
    Client::tracked(super::build(state))
        .await
        .expect("valid rocket instance")
}

async fn deserialize_response<'a, T: rocket::serde::DeserializeOwned>(
    response: LocalResponse<'a>,
) -> rocket::serde::json::serde_json::Result<T> {
    let string = response.into_string().await.unwrap();
    rocket::serde::json::serde_json::from_str(&string)
}

/// Registers a user called `username` and returns it.
async fn create_user<'a>(
    client: &'a Client,
    username: &str,
    api_key: &str,
) -> Result<User, LocalResponse<'a>> {
    let response = client
        .post("/users")
        .header(Header::new(API_KEY_HEADER, api_key.to_owned()))
        .json(&json!({ "username": username }))
        .dispatch()
        .await;
    if response.status() != Status::Ok {
        return Err(response);
    }

    Ok(deserialize_response::<User>(response).await.unwrap())
}

/// Submits a score and returns the stored record.
async fn add_score<'a>(
    client: &'a Client,
    submission: &Value,
) -> Result<ScoreRecord, LocalResponse<'a>> {
    let response = client.post("/scores").json(submission).dispatch().await;
    if response.status() != Status::Ok {
        return Err(response);
    }

    Ok(deserialize_response::<ScoreRecord>(response).await.unwrap())
}

async fn submit(client: &Client, user: &User, game_key: &str, value: u32) -> ScoreRecord {
    let submission = json!({ "gameKey": game_key, "userId": user.id, "value": value });
    add_score(client, &submission).await.unwrap()
}

/// Fetches a JSON document from `uri`, expecting a successful response.
async fn get_json<T: rocket::serde::DeserializeOwned>(client: &Client, uri: &str) -> T {
    let response = client.get(uri).dispatch().await;
    assert_eq!(response.status(), Status::Ok, "GET {}", uri);
    deserialize_response::<T>(response).await.unwrap()
}

fn ids(records: &[ScoreRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

/// Registering users requires the admin key
#[rocket::async_test]
async fn create_user_requires_admin_key() {
    let client = spawn_client().await;

    let response = create_user(&client, "ProGamer", "thatisarandomkey").await;
    assert_eq!(response.unwrap_err().status(), Status::Unauthorized);

    let response = client
        .post("/users")
        .json(&json!({ "username": "ProGamer" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    let user = create_user(&client, "ProGamer", ADMIN_KEY).await.unwrap();
    assert_eq!(user.username, "ProGamer");
}

/// Equal scores rank in submission order
#[rocket::async_test]
async fn tied_scores_rank_by_submission_order() {
    let client = spawn_client().await;
    let a = create_user(&client, "A", ADMIN_KEY).await.unwrap();
    let b = create_user(&client, "B", ADMIN_KEY).await.unwrap();

    let a100 = submit(&client, &a, TEST_GAME_KEY, 100).await;
    let b150 = submit(&client, &b, TEST_GAME_KEY, 150).await;
    let a150 = submit(&client, &a, TEST_GAME_KEY, 150).await;

    let scores: Vec<ScoreRecord> =
        get_json(&client, "/scores?game=tic-tac-toe&limit=10").await;
    assert_eq!(ids(&scores), [b150.id.as_str(), a150.id.as_str(), a100.id.as_str()]);

    let rank: UserRank = get_json(
        &client,
        &format!("/users/{}/rank?game={}", a.id, TEST_GAME_KEY),
    )
    .await;
    assert_eq!(rank, UserRank { rank: Some(2) });

    let rank: UserRank = get_json(&client, &format!("/users/{}/rank", b.id)).await;
    assert_eq!(rank, UserRank { rank: Some(1) });
}

/// Limits select nothing, everything or a prefix
#[rocket::async_test]
async fn top_scores_respect_limits() {
    let client = spawn_client().await;
    let user = create_user(&client, "RetroFan", ADMIN_KEY).await.unwrap();
    for value in [10, 30, 20] {
        submit(&client, &user, TEST_GAME_KEY, value).await;
    }

    let none: Vec<ScoreRecord> = get_json(&client, "/scores/top?limit=0").await;
    assert!(none.is_empty());

    let negative: Vec<ScoreRecord> = get_json(&client, "/scores?limit=-4").await;
    assert!(negative.is_empty());

    let all: Vec<ScoreRecord> = get_json(&client, "/scores/top?limit=1000").await;
    let values: Vec<u32> = all.iter().map(|r| r.value).collect();
    assert_eq!(values, [30, 20, 10]);

    let unknown: Vec<ScoreRecord> = get_json(&client, "/scores?game=no-such-game").await;
    assert!(unknown.is_empty());
}

/// Rejected submissions leave the store as it was
#[rocket::async_test]
async fn invalid_submissions_are_rejected() {
    let client = spawn_client().await;
    let user = create_user(&client, "PixelHero", ADMIN_KEY).await.unwrap();

    let negative = json!({ "gameKey": TEST_GAME_KEY, "userId": user.id, "value": -5 });
    let response = add_score(&client, &negative).await.unwrap_err();
    assert_eq!(response.status(), Status::UnprocessableEntity);

    let text = json!({ "gameKey": TEST_GAME_KEY, "userId": user.id, "value": "lots" });
    let response = add_score(&client, &text).await.unwrap_err();
    assert_eq!(response.status(), Status::UnprocessableEntity);

    let anonymous = json!({ "gameKey": TEST_GAME_KEY, "value": 50 });
    let response = add_score(&client, &anonymous).await.unwrap_err();
    assert_eq!(response.status(), Status::Unauthorized);

    let stranger = json!({ "gameKey": TEST_GAME_KEY, "userId": "ghost", "value": 50 });
    let response = add_score(&client, &stranger).await.unwrap_err();
    assert_eq!(response.status(), Status::Unauthorized);

    let export: ScoreExport = get_json(&client, "/scores/export").await;
    assert_eq!(export.total_scores, 0);
}

/// Stats aggregate a user's submissions and default to zero
#[rocket::async_test]
async fn user_stats_and_best_scores() {
    let client = spawn_client().await;
    let user = create_user(&client, "ArcadeKing", ADMIN_KEY).await.unwrap();
    let rival = create_user(&client, "GameMaster", ADMIN_KEY).await.unwrap();

    submit(&client, &rival, "snake", 500).await;
    submit(&client, &user, TEST_GAME_KEY, 100).await;
    let best_snake = submit(&client, &user, "snake", 301).await;
    let best_ttt = submit(&client, &user, TEST_GAME_KEY, 200).await;

    let stats: UserStats = get_json(&client, &format!("/users/{}/stats", user.id)).await;
    assert_eq!(
        stats,
        UserStats {
            total_submissions: 3,
            total_score: 601,
            average_score: 200,
            best_score: 301,
            games_played: 2,
            overall_rank: Some(2),
        }
    );

    let best: Vec<ScoreRecord> = get_json(&client, &format!("/users/{}/best", user.id)).await;
    assert_eq!(ids(&best), [best_snake.id.as_str(), best_ttt.id.as_str()]);

    let response = client.get("/users/nobody/stats").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let empty: Value = deserialize_response(response).await.unwrap();
    assert_eq!(
        empty,
        json!({
            "totalSubmissions": 0,
            "totalScore": 0,
            "averageScore": 0,
            "bestScore": 0,
            "gamesPlayed": 0,
            "overallRank": null,
        })
    );
}

/// Games are seeded, registered by admins and lazily on first submission
#[rocket::async_test]
async fn game_catalog() {
    let client = spawn_client().await;

    let games: Vec<Game> = get_json(&client, "/games").await;
    assert!(games.iter().any(|game| game.key == TEST_GAME_KEY && game.active));

    let new_game = Game::new("minesweeper", "Minesweeper");
    let response = client
        .post("/games")
        .header(Header::new(API_KEY_HEADER, ADMIN_KEY))
        .json(&new_game)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = client
        .post("/games")
        .header(Header::new(API_KEY_HEADER, ADMIN_KEY))
        .json(&new_game)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);

    let user = create_user(&client, "Explorer", ADMIN_KEY).await.unwrap();
    let record = submit(&client, &user, "maze-runner-deluxe", 5).await;
    assert_eq!(record.game_display_name, "Maze Runner Deluxe");

    let games: Vec<Game> = get_json(&client, "/games").await;
    assert!(games.iter().any(|game| game.key == "minesweeper"));
    assert!(games.iter().any(|game| game.key == "maze-runner-deluxe"));
}

/// Exports every score and clears them with the admin key
#[rocket::async_test]
async fn export_and_clear_scores() {
    let client = spawn_client().await;
    let user = create_user(&client, "Collector", ADMIN_KEY).await.unwrap();
    submit(&client, &user, TEST_GAME_KEY, 40).await;
    submit(&client, &user, TEST_GAME_KEY, 60).await;

    let export: ScoreExport = get_json(&client, "/scores/export").await;
    assert_eq!(export.total_scores, 2);

    let response = client
        .delete("/scores")
        .header(Header::new(API_KEY_HEADER, "thatisarandomkey"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);

    let response = client
        .delete("/scores")
        .header(Header::new(API_KEY_HEADER, ADMIN_KEY))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    assert_eq!(deserialize_response::<u64>(response).await.unwrap(), 2);

    let scores: Vec<ScoreRecord> = get_json(&client, "/scores").await;
    assert!(scores.is_empty());
}

/// Failures outside the handlers still answer with a JSON error
#[rocket::async_test]
async fn caught_errors_are_json() {
    let client = spawn_client().await;

    let response = client
        .post("/users")
        .json(&json!({ "username": "ProGamer" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    assert_eq!(response.content_type(), Some(ContentType::JSON));
    let body: Value = deserialize_response(response).await.unwrap();
    assert_eq!(body, json!({ "error": "Bad Request" }));

    let response = client
        .post("/scores")
        .header(ContentType::JSON)
        .body(r#"{"gameKey": "#)
        .dispatch()
        .await;
    assert!(response.status().class().is_client_error());
    let body: Value = deserialize_response(response).await.unwrap();
    assert!(body["error"].is_string());

    let response = client.get("/no/such/route").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
    let body: Value = deserialize_response(response).await.unwrap();
    assert_eq!(body, json!({ "error": "Not Found" }));
}

/// A submission without a value is judged by the gate
#[rocket::async_test]
async fn missing_value_goes_through_the_gate() {
    let client = spawn_client().await;
    let user = create_user(&client, "NoValue", ADMIN_KEY).await.unwrap();

    let anonymous = json!({ "gameKey": TEST_GAME_KEY });
    let response = add_score(&client, &anonymous).await.unwrap_err();
    assert_eq!(response.status(), Status::Unauthorized);
    let body: Value = deserialize_response(response).await.unwrap();
    assert!(body["error"].is_string());

    let known = json!({ "gameKey": TEST_GAME_KEY, "userId": user.id });
    let response = add_score(&client, &known).await.unwrap_err();
    assert_eq!(response.status(), Status::UnprocessableEntity);
}

/// An unreachable score store is reported as 503
#[rocket::async_test]
async fn unavailable_store_is_503() {
    let users = Arc::new(MemoryDatabase::new());
    let user = users.register_user("Stranded", None).await.unwrap();
    let state = AppState {
        scores: Arc::new(FailingStore {
            inner: MemoryDatabase::new(),
            fail_reads: true,
        }),
        users: users.clone(),
        games: users,
        admin_key: crate::keys::StringKey::new(ADMIN_KEY),
        game_registration: GameRegistration::Lazy,
    };
    let client = Client::tracked(super::build(state))
        .await
        .expect("valid rocket instance");

    let response = client.get("/scores").dispatch().await;
    assert_eq!(response.status(), Status::ServiceUnavailable);
    let body: Value = deserialize_response(response).await.unwrap();
    assert!(body["error"].is_string());

    let submission = json!({ "gameKey": TEST_GAME_KEY, "userId": user.id, "value": 10 });
    let response = add_score(&client, &submission).await.unwrap_err();
    assert_eq!(response.status(), Status::ServiceUnavailable);
}

/// The SQL backend serves back exactly what was submitted
#[rocket::async_test]
async fn sql_backend_end_to_end() {
    let client = spawn_sql_client().await;
    let user = create_user(&client, "SqlFan", ADMIN_KEY).await.unwrap();
    assert_eq!(user.avatar, None);

    let low = submit(&client, &user, TEST_GAME_KEY, 100).await;
    let high = submit(&client, &user, "snake", u32::MAX).await;

    let scores: Vec<ScoreRecord> = get_json(&client, "/scores").await;
    assert_eq!(scores, vec![high.clone(), low]);

    let rank: UserRank = get_json(&client, &format!("/users/{}/rank", user.id)).await;
    assert_eq!(rank, UserRank { rank: Some(1) });

    let best: Vec<ScoreRecord> = get_json(&client, &format!("/users/{}/best", user.id)).await;
    assert_eq!(best[0], high);
}
