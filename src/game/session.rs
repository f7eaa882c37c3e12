//! Match lifecycle and the serialized command dispatcher
//!
//! One `GameSession` task exclusively owns the `World`. Every mutation —
//! player intents from WebSocket readers, ticks from the tick driver,
//! spawns from the power-up spawner, resets — arrives as a `Command` on one
//! mpsc queue and is executed strictly serially. Nothing outside this module
//! ever holds a reference to the `World`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::store::{MatchResult, ResultSink};
use crate::util::time::{unix_millis, SPAWN_INITIAL_DELAY_MS, SPAWN_PERIOD_MS, TICK_PERIOD_MS};
use crate::ws::protocol::{ServerMsg, WorldSnapshot};

use super::arena::{
    ARENA_HEIGHT, ARENA_WIDTH, BASE_BULLET_WIDTH, BASE_MOVE_SPEED, BOOSTED_BULLET_WIDTH,
    BOOSTED_MOVE_SPEED, BULLET_HEIGHT, BULLET_SPEED, PLAYER_HEIGHT, PLAYER_WIDTH,
};
use super::entities::{Facing, Player, PowerUp, PowerUpKind, Projectile, World};
use super::{simulation, spawner};

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Zero or one player registered
    Waiting,
    /// Exactly two players, clock running
    Active,
    /// Clock expired; results emitted, awaiting the next join
    Over,
}

/// Vertical movement intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// A serialized mutation of the match. Driver-originated commands carry the
/// epoch they were started under so a stopped-but-still-flushing driver can
/// never touch a newer world.
#[derive(Debug, Clone)]
pub enum Command {
    Join { name: String },
    Move { name: String, direction: Direction },
    Shoot { name: String },
    Tick { epoch: u64, now: u64 },
    SpawnPowerUp { epoch: u64, power_up: PowerUp },
    Reset,
}

/// Handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub command_tx: mpsc::Sender<Command>,
    pub events: broadcast::Sender<ServerMsg>,
}

impl SessionHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMsg> {
        self.events.subscribe()
    }
}

/// The authoritative game session actor
pub struct GameSession {
    state: SessionState,
    command_rx: mpsc::Receiver<Command>,
}

impl GameSession {
    /// Create a new session plus the handle producers use to reach it
    pub fn new(seed: u64, sink: Arc<dyn ResultSink>) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(256);
        let (events_tx, _) = broadcast::channel(64);

        let handle = SessionHandle {
            command_tx: command_tx.clone(),
            events: events_tx.clone(),
        };

        let session = Self {
            state: SessionState::new(seed, sink, command_tx, events_tx),
            command_rx,
        };

        (session, handle)
    }

    /// Drain the command queue until every sender is gone. This loop is the
    /// single-writer critical section for the whole match.
    pub async fn run(mut self) {
        info!("Game session started");

        while let Some(command) = self.command_rx.recv().await {
            self.state.execute(command);
        }

        self.state.stop_drivers();
        info!("Game session stopped");
    }
}

/// State owned by the session task
struct SessionState {
    world: World,
    /// Names that declared intent to play, in join order
    pending: Vec<String>,
    phase: MatchPhase,
    /// Unix millis at match start
    started_at: Option<u64>,
    /// Bumped whenever drivers stop; stale driver commands are dropped
    epoch: u64,
    drivers: Vec<JoinHandle<()>>,
    rng: ChaCha8Rng,
    command_tx: mpsc::Sender<Command>,
    events: broadcast::Sender<ServerMsg>,
    sink: Arc<dyn ResultSink>,
}

impl SessionState {
    fn new(
        seed: u64,
        sink: Arc<dyn ResultSink>,
        command_tx: mpsc::Sender<Command>,
        events: broadcast::Sender<ServerMsg>,
    ) -> Self {
        Self {
            world: World::default(),
            pending: Vec::new(),
            phase: MatchPhase::Waiting,
            started_at: None,
            epoch: 0,
            drivers: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            command_tx,
            events,
            sink,
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Join { name } => self.join(name, unix_millis()),
            Command::Move { name, direction } => {
                self.move_player(&name, direction, unix_millis())
            }
            Command::Shoot { name } => self.shoot(&name, unix_millis()),
            Command::Tick { epoch, now } => {
                if epoch == self.epoch {
                    self.tick(now);
                } else {
                    debug!(epoch, current = self.epoch, "Dropping stale tick");
                }
            }
            Command::SpawnPowerUp { epoch, power_up } => {
                if epoch == self.epoch {
                    self.spawn_power_up(power_up);
                } else {
                    debug!(epoch, current = self.epoch, "Dropping stale power-up spawn");
                }
            }
            Command::Reset => self.reset(),
        }
    }

    /// Register a player. The second distinct name starts the match.
    fn join(&mut self, name: String, now: u64) {
        // A join after game over, or into a completely empty session, starts
        // from a clean slate.
        if self.phase == MatchPhase::Over
            || (self.world.players.is_empty() && self.pending.is_empty())
        {
            self.reset();
        }

        if !self.pending.iter().any(|n| n == &name) {
            self.pending.push(name.clone());
        }

        if self.pending.len() == 2 && self.world.players.is_empty() {
            let spawn_y = ARENA_HEIGHT / 2.0 - PLAYER_HEIGHT / 2.0;
            let left = Player::new(self.pending[0].clone(), 50.0, spawn_y, Facing::Right);
            let right = Player::new(
                self.pending[1].clone(),
                ARENA_WIDTH - 50.0 - PLAYER_WIDTH,
                spawn_y,
                Facing::Left,
            );
            self.world.players.push(left);
            self.world.players.push(right);

            self.started_at = Some(now);
            self.phase = MatchPhase::Active;
            self.start_drivers();

            info!(
                left = %self.pending[0],
                right = %self.pending[1],
                "Match started"
            );
            self.broadcast(ServerMsg::GameStart(WorldSnapshot::from(&self.world)));
        } else if self.pending.len() == 1 {
            info!(player = %name, "Waiting for opponent");
            self.broadcast(ServerMsg::WaitingForPlayer(name));
        }
    }

    /// Move a jet vertically, clamped to the arena
    fn move_player(&mut self, name: &str, direction: Direction, now: u64) {
        if self.phase != MatchPhase::Active {
            return;
        }
        let Some(player) = self.world.player_mut(name) else {
            return;
        };

        let speed = if player.effects.is_active(PowerUpKind::SpeedBoost, now) {
            BOOSTED_MOVE_SPEED
        } else {
            BASE_MOVE_SPEED
        };

        match direction {
            Direction::Up => player.y = (player.y - speed).max(0.0),
            Direction::Down => player.y = (player.y + speed).min(ARENA_HEIGHT - PLAYER_HEIGHT),
        }
    }

    /// Fire a bullet from the shooter's leading edge. Direction follows the
    /// side assigned at join time, not the jet's current position.
    fn shoot(&mut self, name: &str, now: u64) {
        if self.phase != MatchPhase::Active {
            return;
        }

        let projectile = {
            let Some(player) = self.world.player(name) else {
                return;
            };

            let width = if player.effects.is_active(PowerUpKind::SizeBoost, now) {
                BOOSTED_BULLET_WIDTH
            } else {
                BASE_BULLET_WIDTH
            };
            let y = player.y + player.height / 2.0 - BULLET_HEIGHT / 2.0;

            match player.facing {
                Facing::Right => {
                    Projectile::new(player.x + player.width, y, BULLET_SPEED, width, name)
                }
                Facing::Left => Projectile::new(player.x - width, y, -BULLET_SPEED, width, name),
            }
        };

        self.world.projectiles.push(projectile);
    }

    /// Run one simulation step and broadcast the resulting snapshot
    fn tick(&mut self, now: u64) {
        if self.phase != MatchPhase::Active {
            return;
        }
        let Some(started_at) = self.started_at else {
            return;
        };

        let elapsed = now.saturating_sub(started_at);
        let outcome = simulation::advance(&mut self.world, now, elapsed);

        if outcome.match_ended {
            self.phase = MatchPhase::Over;
            self.stop_drivers();

            let match_date = Utc::now();
            let results: Vec<MatchResult> = self
                .world
                .players
                .iter()
                .map(|p| MatchResult {
                    player_name: p.name.clone(),
                    score: p.score,
                    match_date,
                })
                .collect();
            self.sink.record(&results);

            info!(
                scores = ?results
                    .iter()
                    .map(|r| (r.player_name.as_str(), r.score))
                    .collect::<Vec<_>>(),
                "Match over"
            );
            self.broadcast(ServerMsg::GameOver(WorldSnapshot::from(&self.world)));
        } else {
            self.broadcast(ServerMsg::ScoreUpdate(WorldSnapshot::from(&self.world)));
        }
    }

    /// Add a spawner-generated power-up to the field
    fn spawn_power_up(&mut self, power_up: PowerUp) {
        if self.phase != MatchPhase::Active || self.world.players.len() < 2 {
            return;
        }
        debug!(kind = ?power_up.kind, x = power_up.x, y = power_up.y, "Power-up spawned");
        self.world.power_ups.push(power_up);
    }

    /// Return to a pristine Waiting state
    fn reset(&mut self) {
        self.stop_drivers();
        self.world = World::default();
        self.pending.clear();
        self.phase = MatchPhase::Waiting;
        self.started_at = None;
        debug!("Session reset");
    }

    /// Start the tick driver and the power-up spawner for a new match. Any
    /// previous drivers are stopped first so two tick loops can never
    /// advance one world.
    fn start_drivers(&mut self) {
        self.stop_drivers();
        let epoch = self.epoch;

        let tick_tx = self.command_tx.clone();
        self.drivers.push(tokio::spawn(async move {
            let mut ticker = interval(Duration::from_millis(TICK_PERIOD_MS));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let command = Command::Tick {
                    epoch,
                    now: unix_millis(),
                };
                if tick_tx.send(command).await.is_err() {
                    break;
                }
            }
        }));

        let spawn_tx = self.command_tx.clone();
        let mut spawn_rng = ChaCha8Rng::seed_from_u64(self.rng.gen());
        self.drivers.push(tokio::spawn(async move {
            let first = Instant::now() + Duration::from_millis(SPAWN_INITIAL_DELAY_MS);
            let mut ticker = interval_at(first, Duration::from_millis(SPAWN_PERIOD_MS));
            loop {
                ticker.tick().await;
                let command = Command::SpawnPowerUp {
                    epoch,
                    power_up: spawner::random_power_up(&mut spawn_rng),
                };
                if spawn_tx.send(command).await.is_err() {
                    break;
                }
            }
        }));
    }

    /// Abort the drivers and invalidate anything they already queued. Task
    /// abort is asynchronous; the epoch bump is what makes stopping
    /// observable as synchronous from the dispatcher's side.
    fn stop_drivers(&mut self) {
        for driver in self.drivers.drain(..) {
            driver.abort();
        }
        self.epoch += 1;
    }

    /// Best-effort emission; delivery is the transport's concern
    fn broadcast(&self, msg: ServerMsg) {
        let _ = self.events.send(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    const NOW: u64 = 1_700_000_000_000;

    #[derive(Default)]
    struct TestSink {
        records: Mutex<Vec<MatchResult>>,
    }

    impl ResultSink for TestSink {
        fn record(&self, results: &[MatchResult]) {
            self.records.lock().extend_from_slice(results);
        }
    }

    fn session_with_sink() -> (GameSession, SessionHandle, Arc<TestSink>) {
        let sink = Arc::new(TestSink::default());
        let (session, handle) = GameSession::new(1, sink.clone());
        (session, handle, sink)
    }

    fn started_session() -> (GameSession, SessionHandle, Arc<TestSink>) {
        let (mut session, handle, sink) = session_with_sink();
        session.state.join("alice".into(), NOW);
        session.state.join("bob".into(), NOW);
        (session, handle, sink)
    }

    fn drain(rx: &mut broadcast::Receiver<ServerMsg>) -> Vec<ServerMsg> {
        let mut msgs = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            msgs.push(msg);
        }
        msgs
    }

    #[tokio::test]
    async fn first_join_broadcasts_waiting() {
        let (mut session, handle, _) = session_with_sink();
        let mut rx = handle.subscribe();

        session.state.join("alice".into(), NOW);

        assert_eq!(session.state.phase, MatchPhase::Waiting);
        match rx.try_recv() {
            Ok(ServerMsg::WaitingForPlayer(name)) => assert_eq!(name, "alice"),
            other => panic!("expected waiting broadcast, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_join_starts_match_at_opposite_edges() {
        let (mut session, handle, _) = session_with_sink();
        let mut rx = handle.subscribe();

        session.state.join("alice".into(), NOW);
        session.state.join("bob".into(), NOW);

        assert_eq!(session.state.phase, MatchPhase::Active);
        assert_eq!(session.state.started_at, Some(NOW));

        let alice = session.state.world.player("alice").unwrap();
        assert_eq!((alice.x, alice.y), (50.0, 285.0));
        assert_eq!(alice.facing, Facing::Right);
        let bob = session.state.world.player("bob").unwrap();
        assert_eq!((bob.x, bob.y), (700.0, 285.0));
        assert_eq!(bob.facing, Facing::Left);

        let msgs = drain(&mut rx);
        assert!(matches!(msgs.last(), Some(ServerMsg::GameStart(snapshot)) if snapshot.players.len() == 2));
    }

    #[tokio::test]
    async fn double_join_of_same_name_does_not_start_a_match() {
        let (mut session, _, _) = session_with_sink();

        session.state.join("alice".into(), NOW);
        session.state.join("alice".into(), NOW);

        assert_eq!(session.state.pending.len(), 1);
        assert_eq!(session.state.phase, MatchPhase::Waiting);
        assert!(session.state.world.players.is_empty());
    }

    #[tokio::test]
    async fn move_is_clamped_to_arena_bounds() {
        let (mut session, _, _) = started_session();

        for _ in 0..100 {
            session.state.move_player("alice", Direction::Up, NOW);
        }
        assert_eq!(session.state.world.player("alice").unwrap().y, 0.0);

        for _ in 0..100 {
            session.state.move_player("alice", Direction::Down, NOW);
        }
        assert_eq!(
            session.state.world.player("alice").unwrap().y,
            ARENA_HEIGHT - PLAYER_HEIGHT
        );
    }

    #[tokio::test]
    async fn speed_boost_doubles_movement() {
        let (mut session, _, _) = started_session();

        session.state.move_player("alice", Direction::Up, NOW);
        assert_eq!(session.state.world.player("alice").unwrap().y, 275.0);

        session
            .state
            .world
            .player_mut("alice")
            .unwrap()
            .effects
            .apply(PowerUpKind::SpeedBoost, NOW, 5_000);
        session.state.move_player("alice", Direction::Up, NOW);
        assert_eq!(session.state.world.player("alice").unwrap().y, 255.0);
    }

    #[tokio::test]
    async fn shoot_spawns_at_the_leading_edge_with_join_order_direction() {
        let (mut session, _, _) = started_session();

        session.state.shoot("alice", NOW);
        session.state.shoot("bob", NOW);

        let alice_shot = &session.state.world.projectiles[0];
        assert_eq!(alice_shot.x, 100.0);
        assert_eq!(alice_shot.y, 297.5);
        assert_eq!(alice_shot.velocity, BULLET_SPEED);
        assert_eq!(alice_shot.width, BASE_BULLET_WIDTH);

        let bob_shot = &session.state.world.projectiles[1];
        assert_eq!(bob_shot.x, 690.0);
        assert_eq!(bob_shot.velocity, -BULLET_SPEED);
    }

    #[tokio::test]
    async fn size_boost_widens_the_bullet() {
        let (mut session, _, _) = started_session();

        session
            .state
            .world
            .player_mut("bob")
            .unwrap()
            .effects
            .apply(PowerUpKind::SizeBoost, NOW, 5_000);
        session.state.shoot("bob", NOW);

        let shot = &session.state.world.projectiles[0];
        assert_eq!(shot.width, BOOSTED_BULLET_WIDTH);
        // Spawned at the left edge minus its own width
        assert_eq!(shot.x, 700.0 - BOOSTED_BULLET_WIDTH);
    }

    #[tokio::test]
    async fn intents_for_unknown_players_are_ignored() {
        let (mut session, _, _) = started_session();

        session.state.move_player("mallory", Direction::Up, NOW);
        session.state.shoot("mallory", NOW);

        assert!(session.state.world.projectiles.is_empty());
    }

    #[tokio::test]
    async fn intents_outside_active_phase_are_ignored() {
        let (mut session, _, _) = session_with_sink();
        session.state.join("alice".into(), NOW);

        session.state.move_player("alice", Direction::Up, NOW);
        session.state.shoot("alice", NOW);
        session.state.tick(NOW);

        assert!(session.state.world.projectiles.is_empty());
        assert_eq!(session.state.phase, MatchPhase::Waiting);
    }

    #[tokio::test]
    async fn power_up_spawn_requires_an_active_match() {
        let (mut session, _, _) = session_with_sink();
        let power_up = PowerUp::new(PowerUpKind::SpeedBoost, 400.0, 100.0, 6_000);

        session.state.spawn_power_up(power_up.clone());
        assert!(session.state.world.power_ups.is_empty());

        session.state.join("alice".into(), NOW);
        session.state.join("bob".into(), NOW);
        session.state.spawn_power_up(power_up);
        assert_eq!(session.state.world.power_ups.len(), 1);
    }

    #[tokio::test]
    async fn tick_broadcasts_a_score_update() {
        let (mut session, handle, _) = started_session();
        let mut rx = handle.subscribe();

        session.state.tick(NOW + 16);

        match rx.try_recv() {
            Ok(ServerMsg::ScoreUpdate(snapshot)) => assert_eq!(snapshot.players.len(), 2),
            other => panic!("expected score update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn clock_expiry_emits_game_over_and_one_result_per_player() {
        let (mut session, handle, sink) = started_session();
        session.state.world.player_mut("alice").unwrap().score = 3;
        let mut rx = handle.subscribe();

        session.state.tick(NOW + 60_001);

        assert_eq!(session.state.phase, MatchPhase::Over);
        match rx.try_recv() {
            Ok(ServerMsg::GameOver(_)) => {}
            other => panic!("expected game over, got {other:?}"),
        }

        let records = sink.records.lock().clone();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].player_name, "alice");
        assert_eq!(records[0].score, 3);
        assert_eq!(records[1].player_name, "bob");
        assert_eq!(records[1].score, 0);

        // Further ticks are no-ops and record nothing more
        session.state.tick(NOW + 60_100);
        assert_eq!(sink.records.lock().len(), 2);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stale_epoch_commands_are_dropped() {
        let (mut session, handle, _) = started_session();
        let old_epoch = session.state.epoch;
        session.state.tick(NOW + 60_001); // ends the match, bumps the epoch
        let mut rx = handle.subscribe();

        session.state.execute(Command::Tick {
            epoch: old_epoch,
            now: NOW + 60_050,
        });
        session.state.execute(Command::SpawnPowerUp {
            epoch: old_epoch,
            power_up: PowerUp::new(PowerUpKind::SizeBoost, 400.0, 100.0, 6_000),
        });

        assert!(rx.try_recv().is_err());
        assert!(session.state.world.power_ups.is_empty());
    }

    #[tokio::test]
    async fn reset_clears_world_and_pending_joins() {
        let (mut session, handle, _) = started_session();
        session.state.shoot("alice", NOW);
        session
            .state
            .spawn_power_up(PowerUp::new(PowerUpKind::SizeBoost, 400.0, 100.0, 6_000));

        session.state.reset();

        assert_eq!(session.state.phase, MatchPhase::Waiting);
        assert!(session.state.world.players.is_empty());
        assert!(session.state.world.projectiles.is_empty());
        assert!(session.state.world.power_ups.is_empty());
        assert!(session.state.pending.is_empty());

        // A single join after reset waits instead of starting
        let mut rx = handle.subscribe();
        session.state.join("carol".into(), NOW);
        assert!(matches!(
            rx.try_recv(),
            Ok(ServerMsg::WaitingForPlayer(name)) if name == "carol"
        ));
        assert_eq!(session.state.phase, MatchPhase::Waiting);
    }

    #[tokio::test]
    async fn join_after_game_over_starts_a_fresh_session() {
        let (mut session, handle, _) = started_session();
        session.state.tick(NOW + 60_001);
        assert_eq!(session.state.phase, MatchPhase::Over);

        let mut rx = handle.subscribe();
        session.state.join("carol".into(), NOW + 61_000);

        assert_eq!(session.state.phase, MatchPhase::Waiting);
        assert_eq!(session.state.pending, vec!["carol".to_string()]);
        assert!(session.state.world.players.is_empty());
        assert!(matches!(rx.try_recv(), Ok(ServerMsg::WaitingForPlayer(_))));
    }
}
