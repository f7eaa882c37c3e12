//! One fixed-rate simulation step
//!
//! Step order is fixed for determinism: projectile advance, player
//! collisions, power-up pickups, effect expiry, removal commit, match
//! clock. Collision
//! ties are resolved by container insertion order and every projectile and
//! power-up is consumed at most once per tick.

use super::arena::{overlaps, ARENA_WIDTH};
use super::entities::{PowerUpKind, World};
use crate::util::time::MATCH_DURATION_MS;

/// Result of a single simulation step
#[derive(Debug, Clone, Copy, Default)]
pub struct TickOutcome {
    /// The match clock ran out this tick; the session must transition to
    /// Over and stop ticking until reset.
    pub match_ended: bool,
}

/// Advance the world by one tick. `now` is wall-clock unix millis used for
/// effect expiry; `match_elapsed_ms` is time since match start.
pub fn advance(world: &mut World, now: u64, match_elapsed_ms: u64) -> TickOutcome {
    let mut removed = vec![false; world.projectiles.len()];

    // Projectile advance and player collisions. A projectile that leaves the
    // arena is skipped for the rest of the tick; one that hits an opponent
    // scores once and is consumed.
    let mut scorers: Vec<String> = Vec::new();
    for (idx, projectile) in world.projectiles.iter_mut().enumerate() {
        projectile.x += projectile.velocity;

        if projectile.x < 0.0 || projectile.x > ARENA_WIDTH {
            removed[idx] = true;
            continue;
        }

        for player in &world.players {
            if player.name == projectile.owner {
                continue;
            }
            if overlaps(projectile.rect(), player.rect()) {
                scorers.push(projectile.owner.clone());
                removed[idx] = true;
                break;
            }
        }
    }

    for owner in scorers {
        if let Some(shooter) = world.player_mut(&owner) {
            let increment = if shooter.effects.is_active(PowerUpKind::ScoreMultiplier, now) {
                2
            } else {
                1
            };
            shooter.score += increment;
        }
    }

    // Power-up pickups by surviving projectiles. First projectile in
    // insertion order wins; both the power-up and the projectile are
    // consumed.
    let mut power_up_removed = vec![false; world.power_ups.len()];
    let mut pickups: Vec<(usize, usize)> = Vec::new();
    for (pu_idx, power_up) in world.power_ups.iter().enumerate() {
        for (pr_idx, projectile) in world.projectiles.iter().enumerate() {
            if removed[pr_idx] {
                continue;
            }
            if overlaps(projectile.rect(), power_up.rect()) {
                power_up_removed[pu_idx] = true;
                removed[pr_idx] = true;
                pickups.push((pu_idx, pr_idx));
                break;
            }
        }
    }

    for (pu_idx, pr_idx) in pickups {
        let owner = world.projectiles[pr_idx].owner.clone();
        let (kind, duration_ms) = {
            let power_up = &world.power_ups[pu_idx];
            (power_up.kind, power_up.duration_ms)
        };
        if let Some(collector) = world.player_mut(&owner) {
            collector.effects.apply(kind, now, duration_ms);
        }
    }

    // Effect expiry, once per tick
    for player in &mut world.players {
        player.effects.expire_all(now);
    }

    // Removal commit
    let mut idx = 0;
    world.projectiles.retain(|_| {
        let keep = !removed[idx];
        idx += 1;
        keep
    });
    let mut idx = 0;
    world.power_ups.retain(|_| {
        let keep = !power_up_removed[idx];
        idx += 1;
        keep
    });

    TickOutcome {
        match_ended: match_elapsed_ms > MATCH_DURATION_MS,
    }
}
