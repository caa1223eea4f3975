use std::collections::{BTreeSet, HashSet};

use rocket::serde::{Deserialize, Serialize};

use crate::score::{GameScore, ScoreRecord};

/// A read-only snapshot of the score store, kept in insertion order.
///
/// Every view sorts by value descending with a stable sort, so records with
/// equal values keep the order in which they were submitted.
#[derive(Clone, Debug, Default)]
pub struct Leaderboard {
    collection: Vec<ScoreRecord>,
}

/// Aggregate over every record a user has submitted.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug, Default)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct UserStats {
    pub total_submissions: u64,
    pub total_score: u64,
    pub average_score: u64,
    pub best_score: GameScore,
    pub games_played: u64,
    pub overall_rank: Option<usize>,
}

impl Leaderboard {
    /// `collection` must be in insertion order.
    pub fn new(collection: Vec<ScoreRecord>) -> Self {
        Self { collection }
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    /// Highest scores across all games.
    pub fn top_scores(&self, limit: usize) -> Vec<ScoreRecord> {
        let mut ranked = self.ranked(None);
        ranked.truncate(limit);
        ranked.into_iter().cloned().collect()
    }

    /// Highest scores of a single game. An unknown game yields an empty list.
    pub fn game_scores(&self, game_key: &str, limit: usize) -> Vec<ScoreRecord> {
        let mut ranked = self.ranked(Some(game_key));
        ranked.truncate(limit);
        ranked.into_iter().cloned().collect()
    }

    /// 1-based position of the user's best record in the ranked view of
    /// `game_key`, or of all games when `None`.
    ///
    /// This is the index of the first matching entry, so a user tied with
    /// an earlier submission ranks below it.
    pub fn user_rank(&self, user_id: &str, game_key: Option<&str>) -> Option<usize> {
        self.ranked(game_key)
            .iter()
            .position(|record| record.user_id == user_id)
            .map(|index| index + 1)
    }

    pub fn user_stats(&self, user_id: &str) -> UserStats {
        let mut stats = UserStats::default();
        let mut games = BTreeSet::new();

        for record in self.collection.iter().filter(|r| r.user_id == user_id) {
            stats.total_submissions += 1;
            stats.total_score += u64::from(record.value);
            stats.best_score = stats.best_score.max(record.value);
            games.insert(record.game_key.as_str());
        }

        if stats.total_submissions == 0 {
            return stats;
        }

        stats.average_score = rounded_mean(stats.total_score, stats.total_submissions);
        stats.games_played = games.len() as u64;
        stats.overall_rank = self.user_rank(user_id, None);
        stats
    }

    /// The user's best record for each game they played, best first.
    pub fn user_best_scores(&self, user_id: &str) -> Vec<ScoreRecord> {
        let mut seen = HashSet::new();
        self.ranked(None)
            .into_iter()
            .filter(|record| record.user_id == user_id)
            .filter(|record| seen.insert(record.game_key.as_str()))
            .cloned()
            .collect()
    }

    fn ranked(&self, game_key: Option<&str>) -> Vec<&ScoreRecord> {
        let mut ranked: Vec<&ScoreRecord> = self
            .collection
            .iter()
            .filter(|record| game_key.map_or(true, |key| record.game_key == key))
            .collect();
        // `sort_by` is stable.
        ranked.sort_by(|a, b| b.value.cmp(&a.value));
        ranked
    }
}

/// Arithmetic mean rounded half up.
fn rounded_mean(sum: u64, count: u64) -> u64 {
    let sum = u128::from(sum);
    let count = u128::from(count);
    ((2 * sum + count) / (2 * count)) as u64
}

impl Serialize for Leaderboard {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: rocket::serde::Serializer,
    {
        self.collection.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Leaderboard {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: rocket::serde::Deserializer<'de>,
    {
        Ok(Self::new(Vec::deserialize(deserializer)?))
    }
}
