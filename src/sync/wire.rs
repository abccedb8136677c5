//! Lockstep wire messages. Framing is left to the transport; each message
//! is one postcard-encoded buffer.

use crate::battle::state::BattleEvent;
use crate::errors::SyncError;
use serde::{Deserialize, Serialize};

/// Position of an event in the authoritative log. The first event is 1.
pub type Seq = u64;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// One event of the log. The client must acknowledge `seq`.
    Step {
        seq: Seq,
        turn: u32,
        event: BattleEvent,
    },
    /// A batch of `turn` has been sent, the last event being `last_seq`. A turn
    /// followed by replacements completes in several batches, so `last_seq`
    /// is what identifies the batch.
    TurnComplete { turn: u32, last_seq: Seq },
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    Ack { seq: Seq },
    /// Sent after (re)connecting. `resume_from` is the first sequence number
    /// the client has not applied.
    Hello { resume_from: Seq },
}

impl ServerMessage {
    pub fn seq(&self) -> Seq {
        match self {
            ServerMessage::Step { seq, .. } => *seq,
            ServerMessage::TurnComplete { last_seq, .. } => *last_seq,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, SyncError> {
        postcard::to_allocvec(self).map_err(|e| SyncError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SyncError> {
        postcard::from_bytes(bytes).map_err(|e| SyncError::Decode(e.to_string()))
    }
}

impl ClientMessage {
    pub fn encode(&self) -> Result<Vec<u8>, SyncError> {
        postcard::to_allocvec(self).map_err(|e| SyncError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SyncError> {
        postcard::from_bytes(bytes).map_err(|e| SyncError::Decode(e.to_string()))
    }
}
