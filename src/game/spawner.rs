//! Power-up generation for the periodic spawner

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::arena::{ARENA_HEIGHT, ARENA_WIDTH, POWER_UP_SIZE};
use super::entities::{PowerUp, PowerUpKind};
use crate::util::time::{POWER_UP_DURATION_MAX_MS, POWER_UP_DURATION_MIN_MS};

/// Generate one random power-up: uniform kind, x in the middle half of the
/// arena (clear of both spawn columns), y anywhere that keeps the square
/// inside the field, duration uniform in [5000, 10000) ms.
pub fn random_power_up(rng: &mut ChaCha8Rng) -> PowerUp {
    let kind = PowerUpKind::ALL[rng.gen_range(0..PowerUpKind::ALL.len())];
    let x = ARENA_WIDTH / 4.0 + rng.gen::<f32>() * (ARENA_WIDTH / 2.0);
    let y = rng.gen::<f32>() * (ARENA_HEIGHT - POWER_UP_SIZE);
    let duration_ms = rng.gen_range(POWER_UP_DURATION_MIN_MS..POWER_UP_DURATION_MAX_MS);

    PowerUp::new(kind, x, y, duration_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn generated_power_ups_stay_in_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..500 {
            let power_up = random_power_up(&mut rng);
            assert!(power_up.x >= ARENA_WIDTH / 4.0);
            assert!(power_up.x < ARENA_WIDTH * 3.0 / 4.0);
            assert!(power_up.y >= 0.0);
            assert!(power_up.y < ARENA_HEIGHT - POWER_UP_SIZE);
            assert!(power_up.duration_ms >= POWER_UP_DURATION_MIN_MS);
            assert!(power_up.duration_ms < POWER_UP_DURATION_MAX_MS);
        }
    }

    #[test]
    fn all_kinds_eventually_spawn() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut seen = [false; 3];
        for _ in 0..100 {
            let power_up = random_power_up(&mut rng);
            let idx = PowerUpKind::ALL
                .iter()
                .position(|&k| k == power_up.kind)
                .unwrap();
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
