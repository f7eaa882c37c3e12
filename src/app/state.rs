//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::SessionHandle;
use crate::store::LeaderboardStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub leaderboard: Arc<LeaderboardStore>,
    pub session: SessionHandle,
}

impl AppState {
    pub fn new(config: Config, leaderboard: Arc<LeaderboardStore>, session: SessionHandle) -> Self {
        Self {
            config: Arc::new(config),
            leaderboard,
            session,
        }
    }
}
