// Battle Schema - Shared reference data definitions
// Types here describe the immutable move/species tables and the enums that
// state and events refer to. Table content lives with the engine crate.

pub use abilities::*;
pub use battle_data::*;
pub use move_types::*;
pub use pokemon_types::*;
pub use species_data::*;

pub mod abilities;
pub mod battle_data;
pub mod move_types;
pub mod pokemon_types;
pub mod species_data;
