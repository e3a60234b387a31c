use crate::config::ServerConfig;
use crate::game::Game;
use crate::gateway::{Outbound, SessionGateway};
use pong_shared::config::GameConfig;
use pong_shared::protocol::{ClientMsg, ConnectionId};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Commands from client connections to the game loop
#[derive(Debug)]
pub enum GameCommand {
    Connect {
        response: oneshot::Sender<ConnectionId>,
    },
    Client {
        id: ConnectionId,
        msg: ClientMsg,
    },
    Disconnect {
        id: ConnectionId,
    },
}

/// Broadcasts from game loop to all clients. Each connection drops the ones
/// not addressed to it.
pub type GameBroadcast = Outbound;

/// Repeating simulation timer. Only fires while started; stopping drops the
/// underlying interval so no stale tick is delivered afterwards.
pub struct TickTimer {
    period: Duration,
    interval: Option<Interval>,
}

impl TickTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    pub fn start(&mut self) {
        if self.interval.is_some() {
            return;
        }
        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        // Late ticks are not replayed.
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.interval = Some(interval);
    }

    pub fn stop(&mut self) {
        self.interval = None;
    }

    pub fn set_running(&mut self, running: bool) {
        match (running, self.is_running()) {
            (true, false) => {
                self.start();
                tracing::debug!("Tick timer started");
            }
            (false, true) => {
                self.stop();
                tracing::debug!("Tick timer stopped");
            }
            _ => {}
        }
    }

    /// Wait for the next tick. Never resolves while stopped.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

fn build_rng(server_config: &ServerConfig) -> ChaCha8Rng {
    match server_config.rng_seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn publish(broadcast_tx: &broadcast::Sender<GameBroadcast>, outbound: Vec<Outbound>) {
    for out in outbound {
        // No subscribers is fine.
        let _ = broadcast_tx.send(out);
    }
}

/// Run the main game loop. Owns the room; every command and tick is handled
/// to completion before the next one is looked at.
pub async fn run_game_loop(
    mut cmd_rx: mpsc::Receiver<GameCommand>,
    broadcast_tx: broadcast::Sender<GameBroadcast>,
    game_config: GameConfig,
    server_config: ServerConfig,
) {
    let game = Game::new(game_config, build_rng(&server_config));
    let mut gateway = SessionGateway::new(game);
    let mut timer = TickTimer::new(game_config.tick_period());

    loop {
        tokio::select! {
            _ = timer.tick() => {
                publish(&broadcast_tx, gateway.tick());
            }

            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break };
                match cmd {
                    GameCommand::Connect { response } => {
                        let id = gateway.connect();
                        if response.send(id).is_err() {
                            // Socket went away before it learned its id.
                            publish(&broadcast_tx, gateway.disconnect(id));
                        } else {
                            tracing::info!(
                                "Connection {} opened ({} connected)",
                                id,
                                gateway.connection_count()
                            );
                        }
                    }
                    GameCommand::Client { id, msg } => {
                        tracing::trace!("Connection {} sent {:?}", id, msg);
                        publish(&broadcast_tx, gateway.handle(id, msg));
                    }
                    GameCommand::Disconnect { id } => {
                        publish(&broadcast_tx, gateway.disconnect(id));
                        tracing::info!(
                            "Connection {} closed ({} connected)",
                            id,
                            gateway.connection_count()
                        );
                    }
                }
            }
        }

        timer.set_running(gateway.is_playing());
    }

    tracing::info!("Game loop ended");
}
