//! Game entity model (authoritative, owned by the session task)

use serde::{Deserialize, Serialize};

use super::arena::{Rect, BULLET_HEIGHT, PLAYER_HEIGHT, PLAYER_WIDTH, POWER_UP_SIZE};
use super::effects::EffectLedger;

/// Power-up kinds available in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerUpKind {
    /// Wider bullets
    SizeBoost,
    /// Faster vertical movement
    SpeedBoost,
    /// Double score per hit
    ScoreMultiplier,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::SizeBoost,
        PowerUpKind::SpeedBoost,
        PowerUpKind::ScoreMultiplier,
    ];
}

/// Which horizontal edge a jet fires from. Assigned by join order at match
/// start and never re-derived from the jet's current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    /// First-joined player, left edge, fires rightward
    Right,
    /// Second-joined player, right edge, fires leftward
    Left,
}

/// A player's jet
#[derive(Debug, Clone)]
pub struct Player {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub score: u32,
    pub facing: Facing,
    pub effects: EffectLedger,
}

impl Player {
    pub fn new(name: impl Into<String>, x: f32, y: f32, facing: Facing) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            width: PLAYER_WIDTH,
            height: PLAYER_HEIGHT,
            score: 0,
            facing,
            effects: EffectLedger::default(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// A bullet in flight
#[derive(Debug, Clone)]
pub struct Projectile {
    pub x: f32,
    pub y: f32,
    /// Per-tick horizontal displacement; positive flies rightward
    pub velocity: f32,
    pub width: f32,
    pub height: f32,
    /// Name of the firing player; excludes self-hits and credits the scorer
    pub owner: String,
}

impl Projectile {
    pub fn new(x: f32, y: f32, velocity: f32, width: f32, owner: impl Into<String>) -> Self {
        Self {
            x,
            y,
            velocity,
            width,
            height: BULLET_HEIGHT,
            owner: owner.into(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// A collectible power-up on the field. The duration applies to the
/// collecting player's effect, not to the object itself; uncollected
/// power-ups persist until the match resets.
#[derive(Debug, Clone)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub x: f32,
    pub y: f32,
    /// Effect duration granted on pickup, in milliseconds
    pub duration_ms: u64,
}

impl PowerUp {
    pub fn new(kind: PowerUpKind, x: f32, y: f32, duration_ms: u64) -> Self {
        Self {
            kind,
            x,
            y,
            duration_ms,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, POWER_UP_SIZE, POWER_UP_SIZE)
    }
}

/// The aggregate match state. Exactly one exists per match and it is only
/// ever mutated by the session task; everything outward sees snapshots.
#[derive(Debug, Clone, Default)]
pub struct World {
    pub players: Vec<Player>,
    pub projectiles: Vec<Projectile>,
    pub power_ups: Vec<PowerUp>,
}

impl World {
    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn player_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.name == name)
    }
}
