use rocket::serde::json::json;
use tracing::{debug, info};

use crate::error::ScoreError;
use crate::score::Game;
use crate::store::{GameCatalog, StoreResult};
use crate::submission::{ScoreSubmission, SubmissionGate};

/// (key, display name, description, category, difficulty, active)
const DEFAULT_GAMES: [(&str, &str, &str, &str, &str, bool); 12] = [
    ("tic-tac-toe", "Tic Tac Toe 3D", "Classic 3x3 grid game with stunning 3D visual effects", "Strategy", "easy", true),
    ("snake", "Snake 3D", "Guide the snake to eat food and grow longer", "Arcade", "medium", false),
    ("tetris", "Tetris 3D", "Stack falling blocks to clear lines", "Puzzle", "medium", false),
    ("breakout", "Breakout 3D", "Break all bricks with the bouncing ball", "Arcade", "medium", false),
    ("pong", "Pong 3D", "Classic paddle game in stunning 3D", "Sports", "easy", false),
    ("space-invaders", "Space Invaders", "Defend Earth from alien invasion", "Shooter", "hard", false),
    ("pacman", "Pac-Man 3D", "Navigate mazes and eat dots", "Arcade", "medium", false),
    ("frogger", "Frogger 3D", "Cross busy roads and rivers", "Action", "hard", false),
    ("asteroids", "Asteroids 3D", "Destroy asteroids in space", "Shooter", "hard", false),
    ("memory", "Memory Match", "Find matching pairs of cards", "Puzzle", "easy", false),
    ("simon", "Simon Says", "Repeat color and sound sequences", "Memory", "medium", false),
    ("maze", "Maze Runner", "Navigate through complex 3D mazes", "Adventure", "medium", false),
];

const SAMPLE_USERS: [&str; 3] = ["GameMaster", "RetroGamer", "PixelHero"];

/// (index into [`SAMPLE_USERS`], game key, value)
const SAMPLE_SCORES: [(usize, &str, u32); 6] = [
    (0, "tic-tac-toe", 1500),
    (1, "tic-tac-toe", 1200),
    (2, "tic-tac-toe", 900),
    (0, "snake", 2500),
    (1, "snake", 2100),
    (2, "tetris", 3200),
];

pub fn default_games() -> Vec<Game> {
    DEFAULT_GAMES
        .iter()
        .map(
            |&(key, display_name, description, category, difficulty, active)| Game {
                key: key.to_owned(),
                display_name: display_name.to_owned(),
                description: Some(description.to_owned()),
                category: Some(category.to_owned()),
                difficulty: Some(difficulty.to_owned()),
                active,
            },
        )
        .collect()
}

/// Registers the default games. Games already in the catalog are left alone.
pub async fn seed(catalog: &dyn GameCatalog) -> StoreResult<()> {
    for game in default_games() {
        catalog.register_game(game).await?;
    }
    debug!(games = DEFAULT_GAMES.len(), "Seeded the game catalog");
    Ok(())
}

/// Registers demo users and submits their scores through `gate`.
/// Does nothing unless the score store is empty. Returns how many scores were added.
pub async fn seed_sample_data(gate: &SubmissionGate<'_>) -> Result<usize, ScoreError> {
    if gate.scores.len().await? > 0 {
        debug!("Score store is not empty, skipping sample data");
        return Ok(0);
    }
    seed(gate.games).await?;

    let mut users = Vec::with_capacity(SAMPLE_USERS.len());
    for username in SAMPLE_USERS {
        users.push(gate.users.register_user(username, None).await?);
    }

    for (user, game_key, value) in SAMPLE_SCORES {
        gate.submit(ScoreSubmission {
            game_key: game_key.to_owned(),
            user_id: Some(users[user].id.clone()),
            value: json!(value),
            metadata: None,
        })
        .await?;
    }

    info!(users = users.len(), scores = SAMPLE_SCORES.len(), "Seeded sample data");
    Ok(SAMPLE_SCORES.len())
}

/// Turns a game key like `space-invaders` into `Space Invaders`.
pub fn display_name_for(game_key: &str) -> String {
    game_key
        .split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Entry for a game seen for the first time in a submission.
pub fn lazy_game(game_key: &str) -> Game {
    let mut game = Game::new(game_key, display_name_for(game_key));
    game.category = Some("Classic".to_owned());
    game.difficulty = Some("medium".to_owned());
    game
}
