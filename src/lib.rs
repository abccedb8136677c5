//! Battle Turn Engine
//!
//! Deterministic turn resolution for creature battles of up to four active
//! battlers, and lockstep delivery of each turn's event log to up to four
//! display clients.
//!
//! A [`Battle`] collects one action per live battler, resolves the turn into
//! an ordered [`TurnLog`], and a [`SyncSession`] streams that log to every
//! client before the next turn's actions are collected.

pub mod battle;
pub mod battler;
pub mod config;
pub mod data_store;
pub mod errors;
pub mod sync;

pub use schema::{
    Ability, BagItem, HeldItem, MoveCategory, MoveData, MoveId, PokemonType, SpeciesData,
    SpeciesId, StatType, StatusType, Weather,
};

pub use battle::action_stack::BattleAction;
pub use battle::engine::{Battle, RejectReason, Submission};
pub use battle::state::{BattleEvent, BattleOutcome, BattleState, BattlerId, GameState, TurnLog};
pub use battler::Battler;
pub use config::{BattleConfig, BattleFormat};
pub use data_store::ReferenceData;
pub use errors::{BattleEngineError, BattleResult};
pub use sync::{ClientEndpoint, ClientMessage, LockstepController, ServerMessage, SyncSession};
