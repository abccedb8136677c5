//! Per-client lockstep bookkeeping over the immutable event log.
//!
//! Every committed turn log is appended to one authoritative sequence.
//! Each client moves through `Idle -> Sent(seq) -> Acked(seq) -> Idle` and
//! only advances when it acknowledges the next sequence number it owes.
//! Anything else it acknowledges is ignored. A client that misses an ack
//! is sent the log again from the first missing sequence number; the log is
//! never recomputed.

use crate::battle::state::{BattleEvent, TurnLog};
use crate::config::{BattleConfig, MAX_CLIENTS};
use crate::errors::{SetupError, SyncError};
use crate::sync::wire::{Seq, ServerMessage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientPhase {
    /// Up to date with the log.
    Idle,
    /// Delivered through `seq`, nothing acknowledged since.
    Sent(Seq),
    /// Acknowledged through `seq`, more is outstanding.
    Acked(Seq),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The ack moved the client forward.
    Advanced,
    /// Already acknowledged, or not the next sequence number.
    Ignored,
}

/// What to do about a client that has gone quiet.
#[derive(Debug, Clone, PartialEq)]
pub enum Redelivery {
    Resend(Vec<ServerMessage>),
    /// Out of attempts. The client is frozen at its last ack.
    Disconnected,
    /// The client has nothing outstanding.
    NotNeeded,
}

#[derive(Debug, Clone)]
struct LoggedEvent {
    turn: u32,
    event: BattleEvent,
}

#[derive(Debug, Clone)]
struct ClientLink {
    /// Highest sequence number acknowledged in order. 0 before the first.
    acked: Seq,
    phase: ClientPhase,
    redeliveries: u32,
    connected: bool,
}

impl ClientLink {
    fn new() -> Self {
        Self {
            acked: 0,
            phase: ClientPhase::Idle,
            redeliveries: 0,
            connected: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LockstepController {
    log: Vec<LoggedEvent>,
    /// `(turn, last_seq)` for every published turn, oldest first.
    turn_ends: Vec<(u32, Seq)>,
    clients: Vec<ClientLink>,
    max_redeliveries: u32,
}

impl LockstepController {
    pub fn new(clients: usize, max_redeliveries: u32) -> Result<Self, SetupError> {
        if clients > MAX_CLIENTS {
            return Err(SetupError::TooManyClients {
                max: MAX_CLIENTS,
                actual: clients,
            });
        }
        Ok(Self {
            log: Vec::new(),
            turn_ends: Vec::new(),
            clients: (0..clients).map(|_| ClientLink::new()).collect(),
            max_redeliveries,
        })
    }

    pub fn from_config(config: &BattleConfig) -> Result<Self, SetupError> {
        Self::new(config.max_clients, config.max_redeliveries)
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Sequence number of the newest event, 0 when the log is empty.
    pub fn last_seq(&self) -> Seq {
        self.log.len() as Seq
    }

    pub fn phase(&self, client: usize) -> Result<ClientPhase, SyncError> {
        Ok(self.link(client)?.phase)
    }

    pub fn acked(&self, client: usize) -> Result<Seq, SyncError> {
        Ok(self.link(client)?.acked)
    }

    pub fn is_connected(&self, client: usize) -> bool {
        self.clients.get(client).is_some_and(|c| c.connected)
    }

    pub fn connected_clients(&self) -> Vec<usize> {
        (0..self.clients.len())
            .filter(|c| self.clients[*c].connected)
            .collect()
    }

    /// True when every connected client has acknowledged the whole log.
    /// Disconnected clients do not hold the battle back.
    pub fn all_acknowledged(&self) -> bool {
        let last = self.last_seq();
        self.clients
            .iter()
            .filter(|c| c.connected)
            .all(|c| c.acked >= last)
    }

    /// Clients still owing an ack, with the first sequence number they owe.
    pub fn lagging(&self) -> Vec<(usize, Seq)> {
        let last = self.last_seq();
        self.clients
            .iter()
            .enumerate()
            .filter(|(_, c)| c.connected && c.acked < last)
            .map(|(i, c)| (i, c.acked + 1))
            .collect()
    }

    /// Append a committed turn and return what each connected client must
    /// be sent.
    pub fn publish(&mut self, log: &TurnLog) -> Vec<(usize, Vec<ServerMessage>)> {
        let first = self.last_seq() + 1;
        self.log.extend(log.events.iter().cloned().map(|event| LoggedEvent {
            turn: log.turn,
            event,
        }));
        let last = self.last_seq();
        self.turn_ends.push((log.turn, last));
        debug!(turn = log.turn, first, last, "turn published");

        let mut messages: Vec<ServerMessage> = self
            .log
            .iter()
            .enumerate()
            .skip(first as usize - 1)
            .map(|(index, logged)| ServerMessage::Step {
                seq: index as Seq + 1,
                turn: logged.turn,
                event: logged.event.clone(),
            })
            .collect();
        messages.push(ServerMessage::TurnComplete {
            turn: log.turn,
            last_seq: last,
        });

        let mut outbound = Vec::new();
        for (client, link) in self.clients.iter_mut().enumerate() {
            if !link.connected {
                continue;
            }
            if last >= first {
                link.phase = ClientPhase::Sent(last);
            }
            link.redeliveries = 0;
            outbound.push((client, messages.clone()));
        }
        outbound
    }

    /// Record an ack from `client`.
    pub fn acknowledge(&mut self, client: usize, seq: Seq) -> Result<AckOutcome, SyncError> {
        let last = self.last_seq();
        let link = self.link_mut(client)?;
        if !link.connected {
            return Err(SyncError::Disconnected(client));
        }
        if seq != link.acked + 1 || seq > last {
            warn!(client, seq, acked = link.acked, "stale or out-of-order ack ignored");
            return Ok(AckOutcome::Ignored);
        }
        link.acked = seq;
        link.redeliveries = 0;
        link.phase = if seq == last {
            ClientPhase::Idle
        } else {
            ClientPhase::Acked(seq)
        };
        Ok(AckOutcome::Advanced)
    }

    /// The ack deadline for `client` passed without progress.
    pub fn on_timeout(&mut self, client: usize) -> Result<Redelivery, SyncError> {
        let last = self.last_seq();
        let max_redeliveries = self.max_redeliveries;
        let link = self.link_mut(client)?;
        if !link.connected {
            return Err(SyncError::Disconnected(client));
        }
        if link.acked >= last {
            return Ok(Redelivery::NotNeeded);
        }
        if link.redeliveries >= max_redeliveries {
            link.connected = false;
            warn!(
                client,
                seq = link.acked + 1,
                attempts = link.redeliveries + 1,
                "client stopped acknowledging, treating as disconnected"
            );
            return Ok(Redelivery::Disconnected);
        }
        link.redeliveries += 1;
        link.phase = ClientPhase::Sent(last);
        let from = link.acked + 1;
        debug!(client, from, attempt = link.redeliveries, "re-delivering");
        Ok(Redelivery::Resend(self.messages_from(from)))
    }

    /// Mark a client as gone. It stays frozen at its last ack.
    pub fn disconnect(&mut self, client: usize) -> Result<(), SyncError> {
        let link = self.link_mut(client)?;
        if link.connected {
            warn!(client, acked = link.acked, "client disconnected");
        }
        link.connected = false;
        Ok(())
    }

    /// A client says hello, possibly after losing its connection. Replay
    /// starts from whichever is earlier: its own `resume_from` or the
    /// first sequence number it has not acknowledged.
    pub fn reconnect(
        &mut self,
        client: usize,
        resume_from: Seq,
    ) -> Result<Vec<ServerMessage>, SyncError> {
        let last = self.last_seq();
        let link = self.link_mut(client)?;
        let from = resume_from.max(1).min(link.acked + 1);
        link.acked = from - 1;
        link.connected = true;
        link.redeliveries = 0;
        link.phase = if link.acked >= last {
            ClientPhase::Idle
        } else {
            ClientPhase::Sent(last)
        };
        debug!(client, from, "client resumed");
        Ok(self.messages_from(from))
    }

    /// Steps from `from` to the end of the log, each turn closed with a
    /// `TurnComplete`. Empty turns that ended before `from` are not repeated.
    fn messages_from(&self, from: Seq) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        let mut turn_ends = self
            .turn_ends
            .iter()
            .filter(|(_, last_seq)| *last_seq >= from)
            .peekable();
        for (index, logged) in self.log.iter().enumerate().skip(from.saturating_sub(1) as usize) {
            let seq = index as Seq + 1;
            while let Some((turn, last_seq)) = turn_ends.next_if(|(_, l)| *l < seq) {
                messages.push(ServerMessage::TurnComplete {
                    turn: *turn,
                    last_seq: *last_seq,
                });
            }
            messages.push(ServerMessage::Step {
                seq,
                turn: logged.turn,
                event: logged.event.clone(),
            });
        }
        for (turn, last_seq) in turn_ends {
            messages.push(ServerMessage::TurnComplete {
                turn: *turn,
                last_seq: *last_seq,
            });
        }
        messages
    }

    fn link(&self, client: usize) -> Result<&ClientLink, SyncError> {
        self.clients
            .get(client)
            .ok_or(SyncError::UnknownClient(client))
    }

    fn link_mut(&mut self, client: usize) -> Result<&mut ClientLink, SyncError> {
        self.clients
            .get_mut(client)
            .ok_or(SyncError::UnknownClient(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn turn(turn: u32, events: usize) -> TurnLog {
        TurnLog {
            turn,
            events: (0..events).map(|_| BattleEvent::TurnStarted { turn }).collect(),
        }
    }

    fn step_seqs(messages: &[ServerMessage]) -> Vec<Seq> {
        messages
            .iter()
            .filter_map(|m| match m {
                ServerMessage::Step { seq, .. } => Some(*seq),
                ServerMessage::TurnComplete { .. } => None,
            })
            .collect()
    }

    fn ack_through(controller: &mut LockstepController, client: usize, last: Seq) {
        for seq in 1..=last {
            controller.acknowledge(client, seq).unwrap();
        }
    }

    #[test]
    fn test_publish_sends_every_step_then_turn_complete() {
        let mut controller = LockstepController::new(2, 3).unwrap();
        let outbound = controller.publish(&turn(1, 3));
        assert_eq!(outbound.len(), 2);
        for (_, messages) in &outbound {
            assert_eq!(step_seqs(messages), vec![1, 2, 3]);
            assert_eq!(
                messages.last(),
                Some(&ServerMessage::TurnComplete { turn: 1, last_seq: 3 })
            );
        }
        assert_eq!(controller.phase(0).unwrap(), ClientPhase::Sent(3));
        assert!(!controller.all_acknowledged());
    }

    #[test]
    fn test_client_phases_follow_acks() {
        let mut controller = LockstepController::new(1, 3).unwrap();
        assert_eq!(controller.phase(0).unwrap(), ClientPhase::Idle);
        controller.publish(&turn(1, 2));
        assert_eq!(controller.acknowledge(0, 1).unwrap(), AckOutcome::Advanced);
        assert_eq!(controller.phase(0).unwrap(), ClientPhase::Acked(1));
        assert_eq!(controller.acknowledge(0, 2).unwrap(), AckOutcome::Advanced);
        assert_eq!(controller.phase(0).unwrap(), ClientPhase::Idle);
        assert!(controller.all_acknowledged());
    }

    #[test]
    fn test_duplicate_and_early_acks_are_no_ops() {
        let mut controller = LockstepController::new(1, 3).unwrap();
        controller.publish(&turn(1, 4));
        controller.acknowledge(0, 1).unwrap();
        assert_eq!(controller.acknowledge(0, 1).unwrap(), AckOutcome::Ignored);
        assert_eq!(controller.acknowledge(0, 3).unwrap(), AckOutcome::Ignored);
        assert_eq!(controller.acknowledge(0, 99).unwrap(), AckOutcome::Ignored);
        assert_eq!(controller.acked(0).unwrap(), 1);
    }

    #[test]
    fn test_lost_ack_resends_only_to_that_client() {
        let mut controller = LockstepController::new(3, 3).unwrap();
        controller.publish(&turn(1, 4));
        ack_through(&mut controller, 0, 4);
        ack_through(&mut controller, 1, 4);
        // client 2 got through 1, its ack for 2 was lost, 3 arrives early
        controller.acknowledge(2, 1).unwrap();
        controller.acknowledge(2, 3).unwrap();

        assert_eq!(controller.lagging(), vec![(2, 2)]);
        assert_eq!(controller.on_timeout(0).unwrap(), Redelivery::NotNeeded);
        let Redelivery::Resend(messages) = controller.on_timeout(2).unwrap() else {
            panic!("client 2 should get a re-delivery");
        };
        assert_eq!(step_seqs(&messages), vec![2, 3, 4]);
        assert_eq!(controller.acked(0).unwrap(), 4);
        assert_eq!(controller.acked(1).unwrap(), 4);
    }

    #[test]
    fn test_silent_client_is_eventually_disconnected() {
        let mut controller = LockstepController::new(2, 2).unwrap();
        controller.publish(&turn(1, 2));
        ack_through(&mut controller, 0, 2);

        assert!(matches!(controller.on_timeout(1).unwrap(), Redelivery::Resend(_)));
        assert!(matches!(controller.on_timeout(1).unwrap(), Redelivery::Resend(_)));
        assert_eq!(controller.on_timeout(1).unwrap(), Redelivery::Disconnected);
        assert!(!controller.is_connected(1));
        assert!(controller.all_acknowledged());
        assert_eq!(controller.acked(1).unwrap(), 0);
    }

    #[test]
    fn test_reconnect_replays_from_last_ack() {
        let mut controller = LockstepController::new(1, 0).unwrap();
        controller.publish(&turn(1, 3));
        controller.acknowledge(0, 1).unwrap();
        controller.disconnect(0).unwrap();
        controller.publish(&turn(2, 2));

        let replay = controller.reconnect(0, 5).unwrap();
        assert_eq!(step_seqs(&replay), vec![2, 3, 4, 5]);
        assert!(replay.contains(&ServerMessage::TurnComplete { turn: 1, last_seq: 3 }));
        assert_eq!(
            replay.last(),
            Some(&ServerMessage::TurnComplete { turn: 2, last_seq: 5 })
        );
    }

    #[test]
    fn test_unknown_client_is_an_error() {
        let mut controller = LockstepController::new(2, 1).unwrap();
        assert_eq!(
            controller.acknowledge(7, 1),
            Err(SyncError::UnknownClient(7))
        );
        assert!(matches!(
            LockstepController::new(5, 1),
            Err(SetupError::TooManyClients { max: 4, actual: 5 })
        ));
    }
}
