use rocket::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api::{requests, AppState};
use config::Config;

mod api;
mod catalog;
mod config;
mod error;
mod keys;
mod leaderboard;
mod score;
mod store;
mod submission;
#[cfg(test)]
mod tests;

#[launch]
async fn rocket() -> _ {
    init_tracing();

    let config = Config::from_env().expect("invalid configuration");
    if config.admin_key_generated {
        info!(admin_key = %config.admin_key, "ADMIN_KEY is not set, generated a key for this run");
    }

    let state = AppState::connect(&config)
        .await
        .expect("failed to connect to a database");

    build(state)
}

/// Mounts every route on a rocket that serves `state`.
pub fn build(state: AppState) -> Rocket<Build> {
    rocket::build()
        .mount(
            "/",
            routes![
                requests::index,
                requests::list_games,
                requests::create_game,
                requests::get_scores,
                requests::get_top_scores,
                requests::add_score,
                requests::export_scores,
                requests::clear_scores,
                requests::create_user,
                requests::get_user_stats,
                requests::get_user_rank,
                requests::get_user_best_scores,
            ],
        )
        .register("/", catchers![requests::default_catcher])
        .manage::<AppState>(state)
}

fn init_tracing() {
    // A subscriber may already be set, e.g. by a test harness.
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retro_leaderboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
