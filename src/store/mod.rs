//! Persistence boundary

pub mod leaderboard;

pub use leaderboard::{LeaderboardEntry, LeaderboardStore, MatchResult, ResultSink};
