//! Lockstep delivery of committed turn logs to up to four display clients.

pub mod controller;
pub mod session;
pub mod wire;

pub use controller::{AckOutcome, ClientPhase, LockstepController, Redelivery};
pub use session::{ClientEndpoint, SyncSession};
pub use wire::{ClientMessage, Seq, ServerMessage};
