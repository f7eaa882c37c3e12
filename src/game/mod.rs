//! Game simulation modules

pub mod arena;
pub mod effects;
pub mod entities;
pub mod session;
pub mod simulation;
pub mod spawner;

pub use session::{Command, Direction, GameSession, MatchPhase, SessionHandle};
