//! Async driver for the lockstep controller.
//!
//! Each client gets an outbound channel of encoded [`ServerMessage`]s and
//! shares one inbound channel of encoded [`ClientMessage`]s. The session
//! only ever waits on acknowledgements; the battle itself is resolved by the
//! caller between broadcasts.

use crate::battle::engine::Battle;
use crate::battle::state::TurnLog;
use crate::config::BattleConfig;
use crate::errors::{BattleResult, SyncError};
use crate::sync::controller::{AckOutcome, LockstepController, Redelivery};
use crate::sync::wire::{ClientMessage, ServerMessage};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

/// The client half of a session's channels.
pub struct ClientEndpoint {
    pub client: usize,
    incoming: mpsc::UnboundedReceiver<Vec<u8>>,
    outgoing: mpsc::UnboundedSender<(usize, Vec<u8>)>,
}

impl ClientEndpoint {
    /// Next message from the server. `None` once the session is gone.
    pub async fn recv(&mut self) -> Option<Result<ServerMessage, SyncError>> {
        let bytes = self.incoming.recv().await?;
        Some(ServerMessage::decode(&bytes))
    }

    pub fn send(&self, message: ClientMessage) -> Result<(), SyncError> {
        let bytes = message.encode()?;
        self.outgoing
            .send((self.client, bytes))
            .map_err(|_| SyncError::Aborted("session closed".to_string()))
    }

    pub fn ack(&self, seq: u64) -> Result<(), SyncError> {
        self.send(ClientMessage::Ack { seq })
    }
}

pub struct SyncSession {
    controller: LockstepController,
    outbound: Vec<mpsc::UnboundedSender<Vec<u8>>>,
    inbound: mpsc::UnboundedReceiver<(usize, Vec<u8>)>,
    ack_timeout: Duration,
}

impl SyncSession {
    /// A session for `config.max_clients` clients, with their endpoints.
    pub fn new(config: &BattleConfig) -> BattleResult<(Self, Vec<ClientEndpoint>)> {
        let controller = LockstepController::from_config(config)?;
        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        let mut outbound = Vec::new();
        let mut endpoints = Vec::new();
        for client in 0..controller.client_count() {
            let (tx, rx) = mpsc::unbounded_channel();
            outbound.push(tx);
            endpoints.push(ClientEndpoint {
                client,
                incoming: rx,
                outgoing: inbound_tx.clone(),
            });
        }
        let session = Self {
            controller,
            outbound,
            inbound,
            ack_timeout: Duration::from_millis(config.ack_timeout_ms),
        };
        Ok((session, endpoints))
    }

    pub fn controller(&self) -> &LockstepController {
        &self.controller
    }

    /// Stream `log` to every client and wait until all connected clients
    /// have acknowledged it.
    pub async fn broadcast(&mut self, log: &TurnLog) -> Result<(), SyncError> {
        for (client, messages) in self.controller.publish(log) {
            self.deliver(client, &messages)?;
        }
        self.await_acks().await
    }

    /// Broadcast a committed turn. If the session cannot continue, the
    /// battle is aborted with the reason.
    pub async fn publish_turn(&mut self, battle: &mut Battle, log: &TurnLog) -> BattleResult<()> {
        if let Err(err) = self.broadcast(log).await {
            battle.abort(err.to_string());
            return Err(err.into());
        }
        Ok(())
    }

    async fn await_acks(&mut self) -> Result<(), SyncError> {
        let mut deadline = Instant::now() + self.ack_timeout;
        while !self.controller.all_acknowledged() {
            if self.controller.connected_clients().is_empty() {
                return Err(SyncError::Aborted("no clients connected".to_string()));
            }
            match timeout_at(deadline, self.inbound.recv()).await {
                Ok(Some((client, bytes))) => {
                    if self.handle(client, &bytes)? {
                        deadline = Instant::now() + self.ack_timeout;
                    }
                }
                Ok(None) => {
                    return Err(SyncError::Aborted("all clients hung up".to_string()));
                }
                Err(_) => {
                    self.redeliver()?;
                    deadline = Instant::now() + self.ack_timeout;
                }
            }
        }
        debug!(last_seq = self.controller.last_seq(), "all clients acknowledged");
        Ok(())
    }

    /// Apply one client message. Returns true if some client made progress.
    fn handle(&mut self, client: usize, bytes: &[u8]) -> Result<bool, SyncError> {
        let message = match ClientMessage::decode(bytes) {
            Ok(message) => message,
            Err(err) => {
                warn!(client, error = %err, "undecodable client message dropped");
                return Ok(false);
            }
        };
        match message {
            ClientMessage::Ack { seq } => match self.controller.acknowledge(client, seq) {
                Ok(outcome) => Ok(outcome == AckOutcome::Advanced),
                Err(SyncError::Disconnected(_)) => {
                    warn!(client, seq, "ack from a disconnected client ignored");
                    Ok(false)
                }
                Err(err) => {
                    warn!(client, error = %err, "ack rejected");
                    Ok(false)
                }
            },
            ClientMessage::Hello { resume_from } => {
                let replay = match self.controller.reconnect(client, resume_from) {
                    Ok(replay) => replay,
                    Err(err) => {
                        warn!(client, error = %err, "hello rejected");
                        return Ok(false);
                    }
                };
                info!(client, resume_from, count = replay.len(), "client resumed");
                self.deliver(client, &replay)?;
                Ok(true)
            }
        }
    }

    fn redeliver(&mut self) -> Result<(), SyncError> {
        for (client, from) in self.controller.lagging() {
            match self.controller.on_timeout(client)? {
                Redelivery::Resend(messages) => {
                    debug!(client, from, count = messages.len(), "ack timed out");
                    self.deliver(client, &messages)?;
                }
                Redelivery::Disconnected => {
                    warn!(client, from, "client dropped after repeated timeouts");
                }
                Redelivery::NotNeeded => {}
            }
        }
        Ok(())
    }

    fn deliver(&mut self, client: usize, messages: &[ServerMessage]) -> Result<(), SyncError> {
        let sender = self
            .outbound
            .get(client)
            .ok_or(SyncError::UnknownClient(client))?;
        for message in messages {
            let bytes = message.encode()?;
            if sender.send(bytes).is_err() {
                // the receiving half is gone; keep the client frozen
                self.controller.disconnect(client)?;
                return Ok(());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::state::BattleEvent;
    use pretty_assertions::assert_eq;
    use tokio::task::JoinHandle;

    fn fast_config(clients: usize) -> BattleConfig {
        BattleConfig {
            ack_timeout_ms: 20,
            max_redeliveries: 3,
            max_clients: clients,
            ..BattleConfig::default()
        }
    }

    fn log(turn: u32, events: usize) -> TurnLog {
        TurnLog {
            turn,
            events: (0..events).map(|_| BattleEvent::TurnStarted { turn }).collect(),
        }
    }

    /// Acks every step in order. Returns the sequence numbers it received.
    fn spawn_client(mut endpoint: ClientEndpoint, until: u64) -> JoinHandle<Vec<u64>> {
        tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(Ok(message)) = endpoint.recv().await {
                if let ServerMessage::Step { seq, .. } = message {
                    seen.push(seq);
                    endpoint.ack(seq).unwrap();
                }
                if message == (ServerMessage::TurnComplete { turn: 1, last_seq: until }) {
                    break;
                }
            }
            seen
        })
    }

    /// Drops its first ack for `lost`, then behaves.
    fn spawn_lossy_client(mut endpoint: ClientEndpoint, lost: u64) -> JoinHandle<Vec<u64>> {
        tokio::spawn(async move {
            let mut seen = Vec::new();
            let mut dropped = false;
            while let Some(Ok(message)) = endpoint.recv().await {
                if let ServerMessage::Step { seq, .. } = message {
                    seen.push(seq);
                    if seq == lost && !dropped {
                        dropped = true;
                        continue;
                    }
                    let _ = endpoint.ack(seq);
                }
            }
            seen
        })
    }

    #[tokio::test]
    async fn test_broadcast_waits_for_every_client() {
        let (mut session, endpoints) = SyncSession::new(&fast_config(2)).unwrap();
        let handles: Vec<_> = endpoints.into_iter().map(|e| spawn_client(e, 3)).collect();

        session.broadcast(&log(1, 3)).await.unwrap();
        assert!(session.controller().all_acknowledged());
        for handle in handles {
            assert_eq!(handle.await.unwrap(), vec![1, 2, 3]);
        }
    }

    #[tokio::test]
    async fn test_lost_ack_is_resent_to_that_client_only() {
        let (mut session, mut endpoints) = SyncSession::new(&fast_config(3)).unwrap();
        let lossy = spawn_lossy_client(endpoints.pop().unwrap(), 2);
        let healthy: Vec<_> = endpoints.into_iter().map(|e| spawn_client(e, 4)).collect();

        session.broadcast(&log(1, 4)).await.unwrap();
        assert_eq!(session.controller().acked(2).unwrap(), 4);
        for handle in healthy {
            assert_eq!(handle.await.unwrap(), vec![1, 2, 3, 4]);
        }
        drop(session);
        assert_eq!(lossy.await.unwrap(), vec![1, 2, 3, 4, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_silent_clients_abort_the_battle() {
        use crate::battle::tests::common::{battle_with, TestBattlerBuilder};
        use crate::config::BattleFormat;
        use crate::data_store::{moves, species};

        let mut battle = battle_with(
            BattleFormat::Single,
            vec![TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::TACKLE])],
            vec![TestBattlerBuilder::new(species::JOLTEON, 50).with_moves(vec![moves::TACKLE])],
            1,
        );
        let (mut session, _endpoints) = SyncSession::new(&fast_config(1)).unwrap();
        let result = session.publish_turn(&mut battle, &log(1, 2)).await;
        assert!(result.is_err());
        assert!(battle.is_over());
        assert!(!session.controller().is_connected(0));
    }
}
