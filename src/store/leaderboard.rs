//! Leaderboard storage and the match result sink

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// One player's final score for a finished match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub player_name: String,
    pub score: u32,
    pub match_date: DateTime<Utc>,
}

/// Receives final per-player scores at match end. The session calls this
/// best-effort and never blocks or rolls back on sink behavior.
pub trait ResultSink: Send + Sync {
    fn record(&self, results: &[MatchResult]);
}

/// A saved leaderboard row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: u64,
    pub player_name: String,
    pub score: u32,
    pub match_date: DateTime<Utc>,
}

/// How many entries the leaderboard endpoint returns
pub const LEADERBOARD_TOP_N: usize = 10;

/// In-memory leaderboard store
#[derive(Debug, Default)]
pub struct LeaderboardStore {
    entries: RwLock<Vec<LeaderboardEntry>>,
    next_id: AtomicU64,
}

impl LeaderboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save one score row and return it with its assigned id
    pub fn insert(&self, result: &MatchResult) -> LeaderboardEntry {
        let entry = LeaderboardEntry {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            player_name: result.player_name.clone(),
            score: result.score,
            match_date: result.match_date,
        };
        self.entries.write().push(entry.clone());
        entry
    }

    /// Top entries ordered by score descending
    pub fn top_scores(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let entries = self.entries.read();
        let mut sorted: Vec<LeaderboardEntry> = entries.clone();
        sorted.sort_by(|a, b| b.score.cmp(&a.score));
        sorted.truncate(limit);
        sorted
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl ResultSink for LeaderboardStore {
    fn record(&self, results: &[MatchResult]) {
        for result in results {
            self.insert(result);
        }
        info!(count = results.len(), "Match results saved to leaderboard");
    }
}
