//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};

use crate::game::entities::{Player, PowerUp, PowerUpKind, Projectile, World};

/// Raw action strings accepted from clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Up,
    Down,
    Shoot,
}

/// Messages sent from client to server. Anything that fails to parse —
/// including unrecognized action values — is dropped as a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Declare intent to play under the given name
    Join { player: String },
    /// A move or shoot intent for an already-joined player
    Action { player: String, action: ActionKind },
}

/// Messages broadcast from server to clients. Adjacently tagged so the wire
/// shape is `{"type": "...", "payload": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMsg {
    /// One player registered; payload is that player's name
    WaitingForPlayer(String),
    /// Both players registered; match clock started
    GameStart(WorldSnapshot),
    /// Per-tick state broadcast during an active match
    ScoreUpdate(WorldSnapshot),
    /// Match clock expired; final state
    GameOver(WorldSnapshot),
}

/// Immutable copy of the world for broadcasting. External components only
/// ever see these, never the session's own `World`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub players: Vec<PlayerSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub power_ups: Vec<PowerUpSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub x: f32,
    pub y: f32,
    pub velocity: f32,
    pub width: f32,
    pub height: f32,
    pub owner: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUpSnapshot {
    pub kind: PowerUpKind,
    pub x: f32,
    pub y: f32,
}

impl From<&World> for WorldSnapshot {
    fn from(world: &World) -> Self {
        Self {
            players: world.players.iter().map(PlayerSnapshot::from).collect(),
            projectiles: world
                .projectiles
                .iter()
                .map(ProjectileSnapshot::from)
                .collect(),
            power_ups: world.power_ups.iter().map(PowerUpSnapshot::from).collect(),
        }
    }
}

impl From<&Player> for PlayerSnapshot {
    fn from(player: &Player) -> Self {
        Self {
            name: player.name.clone(),
            x: player.x,
            y: player.y,
            width: player.width,
            height: player.height,
            score: player.score,
        }
    }
}

impl From<&Projectile> for ProjectileSnapshot {
    fn from(projectile: &Projectile) -> Self {
        Self {
            x: projectile.x,
            y: projectile.y,
            velocity: projectile.velocity,
            width: projectile.width,
            height: projectile.height,
            owner: projectile.owner.clone(),
        }
    }
}

impl From<&PowerUp> for PowerUpSnapshot {
    fn from(power_up: &PowerUp) -> Self {
        Self {
            kind: power_up.kind,
            x: power_up.x,
            y: power_up.y,
        }
    }
}
