//! Per-player ledger of active power-up effects

use std::collections::HashMap;

use super::entities::PowerUpKind;

/// Tracks which power-up effects are active on a player and when each one
/// expires. All expiry decisions go through this type so effect timing stays
/// deterministic: the simulation step is the only caller of `expire_all`.
#[derive(Debug, Clone, Default)]
pub struct EffectLedger {
    /// Effect kind -> expiry instant (unix millis)
    active: HashMap<PowerUpKind, u64>,
}

impl EffectLedger {
    /// Activate an effect until `now + duration_ms`. Re-applying an already
    /// active kind resets its expiry rather than stacking duration.
    pub fn apply(&mut self, kind: PowerUpKind, now: u64, duration_ms: u64) {
        self.active.insert(kind, now + duration_ms);
    }

    /// True while `now` is strictly before the effect's expiry
    pub fn is_active(&self, kind: PowerUpKind, now: u64) -> bool {
        self.active.get(&kind).is_some_and(|&expiry| expiry > now)
    }

    /// Drop every effect whose expiry is at or before `now`
    pub fn expire_all(&mut self, now: u64) {
        self.active.retain(|_, &mut expiry| expiry > now);
    }

    /// Drop all effects, used on match reset
    pub fn clear_all(&mut self) {
        self.active.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
