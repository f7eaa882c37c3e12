//! Time utilities for game simulation

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Simulation tick period (~60 Hz)
pub const TICK_PERIOD_MS: u64 = 16;

/// Fixed match duration
pub const MATCH_DURATION_MS: u64 = 60_000;

/// Delay before the first power-up spawns
pub const SPAWN_INITIAL_DELAY_MS: u64 = 5_000;

/// Fixed period between power-up spawns
pub const SPAWN_PERIOD_MS: u64 = 10_000;

/// Power-up effect duration range in milliseconds (half-open)
pub const POWER_UP_DURATION_MIN_MS: u64 = 5_000;
pub const POWER_UP_DURATION_MAX_MS: u64 = 10_000;
