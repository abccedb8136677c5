pub mod abilities;
pub mod action_stack;
pub mod calculators;
pub mod commands;
pub mod conditions;
pub mod end_of_turn;
pub mod engine;
pub mod field;
pub mod flags;
pub mod items;
pub mod move_effects;
pub mod pipeline;
pub mod rng;
pub mod state;
pub mod stats;
pub mod status;

#[cfg(test)]
pub(crate) mod tests;
