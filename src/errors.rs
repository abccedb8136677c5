use crate::battle::state::BattlerId;
use schema::{MoveId, SpeciesId};
use thiserror::Error;

/// Main error type for the battle turn engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleEngineError {
    #[error("reference data error: {0}")]
    Data(#[from] DataError),
    #[error("battle setup error: {0}")]
    Setup(#[from] SetupError),
    #[error("command execution error: {0}")]
    Execution(#[from] ExecutionError),
    #[error("battle is not accepting turns: {0}")]
    NotResolvable(String),
    #[error("lockstep sync error: {0}")]
    Sync(#[from] SyncError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by the reference data store. Any of these during a turn
/// marks the battle as corrupted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("unknown move id {0}")]
    UnknownMove(MoveId),
    #[error("unknown species id {0}")]
    UnknownSpecies(SpeciesId),
    #[error("duplicate {kind} id {id} in reference table")]
    DuplicateId { kind: &'static str, id: u16 },
    #[error("malformed {table} table: {details}")]
    Malformed { table: &'static str, details: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("battle needs {expected} active battlers, got {actual}")]
    WrongBattlerCount { expected: usize, actual: usize },
    #[error("at most {max} battlers can take part, got {actual}")]
    TooManyBattlers { max: usize, actual: usize },
    #[error("at most {max} clients can be connected, got {actual}")]
    TooManyClients { max: usize, actual: usize },
    #[error("battler {0} has no usable moves")]
    NoMoves(BattlerId),
    #[error("battler {0} starts the battle fainted")]
    StartsFainted(BattlerId),
}

/// Error types for command execution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("no battler in slot {0}")]
    NoBattler(BattlerId),
    #[error("bench index {index} is out of range for side {side}")]
    InvalidBenchIndex { side: usize, index: usize },
    #[error("move slot {slot} is empty for battler {battler}")]
    InvalidMoveSlot { battler: BattlerId, slot: usize },
    #[error("inconsistent battle state: {0}")]
    StateValidation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("unknown client {0}")]
    UnknownClient(usize),
    #[error("client {0} has disconnected")]
    Disconnected(usize),
    #[error("failed to decode wire message: {0}")]
    Decode(String),
    #[error("failed to encode wire message: {0}")]
    Encode(String),
    #[error("client {client} did not acknowledge sequence {seq} after {attempts} deliveries")]
    AckTimeout { client: usize, seq: u64, attempts: u32 },
    #[error("session aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("failed to parse battle config: {0}")]
    Parse(String),
    #[error("invalid battle config: {0}")]
    Invalid(String),
}

/// Convenience type alias for Results using BattleEngineError
pub type BattleResult<T> = Result<T, BattleEngineError>;

/// Convenience type alias for reference data lookups
pub type DataResult<T> = Result<T, DataError>;
