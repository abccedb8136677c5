use serde::{Deserialize, Serialize};
use std::fmt;
use strum::EnumIter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash, EnumIter)]
pub enum PokemonType {
    Normal,
    Fighting,
    Flying,
    Poison,
    Ground,
    Rock,
    Bug,
    Ghost,
    Steel,
    Fire,
    Water,
    Grass,
    Electric,
    Psychic,
    Ice,
    Dragon,
    Dark,
    Typeless,
}

impl fmt::Display for PokemonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Effectiveness of one attacking type against one defending type, in percent.
///
/// Percentages keep the damage formula in integer arithmetic; combining two
/// defending types multiplies the percentages and divides by 100.
pub const IMMUNE: u16 = 0;
pub const RESISTED: u16 = 50;
pub const NEUTRAL: u16 = 100;
pub const SUPER_EFFECTIVE: u16 = 200;

impl PokemonType {
    /// Effectiveness percentage for attacking type vs a single defending type.
    pub fn effectiveness_against(self, defending: PokemonType) -> u16 {
        use PokemonType::*;

        match (self, defending) {
            (Typeless, _) | (_, Typeless) => NEUTRAL,

            (Normal, Ghost) => IMMUNE,
            (Normal, Rock) | (Normal, Steel) => RESISTED,
            (Normal, _) => NEUTRAL,

            (Fire, Fire) | (Fire, Water) | (Fire, Rock) | (Fire, Dragon) => RESISTED,
            (Fire, Grass) | (Fire, Ice) | (Fire, Bug) | (Fire, Steel) => SUPER_EFFECTIVE,
            (Fire, _) => NEUTRAL,

            (Water, Water) | (Water, Grass) | (Water, Dragon) => RESISTED,
            (Water, Fire) | (Water, Ground) | (Water, Rock) => SUPER_EFFECTIVE,
            (Water, _) => NEUTRAL,

            (Electric, Ground) => IMMUNE,
            (Electric, Electric) | (Electric, Grass) | (Electric, Dragon) => RESISTED,
            (Electric, Water) | (Electric, Flying) => SUPER_EFFECTIVE,
            (Electric, _) => NEUTRAL,

            (Grass, Fire)
            | (Grass, Grass)
            | (Grass, Poison)
            | (Grass, Flying)
            | (Grass, Bug)
            | (Grass, Dragon)
            | (Grass, Steel) => RESISTED,
            (Grass, Water) | (Grass, Ground) | (Grass, Rock) => SUPER_EFFECTIVE,
            (Grass, _) => NEUTRAL,

            (Ice, Fire) | (Ice, Water) | (Ice, Ice) | (Ice, Steel) => RESISTED,
            (Ice, Grass) | (Ice, Ground) | (Ice, Flying) | (Ice, Dragon) => SUPER_EFFECTIVE,
            (Ice, _) => NEUTRAL,

            (Fighting, Ghost) => IMMUNE,
            (Fighting, Poison) | (Fighting, Flying) | (Fighting, Psychic) | (Fighting, Bug) => {
                RESISTED
            }
            (Fighting, Normal)
            | (Fighting, Ice)
            | (Fighting, Rock)
            | (Fighting, Dark)
            | (Fighting, Steel) => SUPER_EFFECTIVE,
            (Fighting, _) => NEUTRAL,

            (Poison, Steel) => IMMUNE,
            (Poison, Poison) | (Poison, Ground) | (Poison, Rock) | (Poison, Ghost) => RESISTED,
            (Poison, Grass) => SUPER_EFFECTIVE,
            (Poison, _) => NEUTRAL,

            (Ground, Flying) => IMMUNE,
            (Ground, Grass) | (Ground, Bug) => RESISTED,
            (Ground, Fire)
            | (Ground, Electric)
            | (Ground, Poison)
            | (Ground, Rock)
            | (Ground, Steel) => SUPER_EFFECTIVE,
            (Ground, _) => NEUTRAL,

            (Flying, Electric) | (Flying, Rock) | (Flying, Steel) => RESISTED,
            (Flying, Grass) | (Flying, Fighting) | (Flying, Bug) => SUPER_EFFECTIVE,
            (Flying, _) => NEUTRAL,

            (Psychic, Dark) => IMMUNE,
            (Psychic, Psychic) | (Psychic, Steel) => RESISTED,
            (Psychic, Fighting) | (Psychic, Poison) => SUPER_EFFECTIVE,
            (Psychic, _) => NEUTRAL,

            (Bug, Fire)
            | (Bug, Fighting)
            | (Bug, Poison)
            | (Bug, Flying)
            | (Bug, Ghost)
            | (Bug, Steel) => RESISTED,
            (Bug, Grass) | (Bug, Psychic) | (Bug, Dark) => SUPER_EFFECTIVE,
            (Bug, _) => NEUTRAL,

            (Rock, Fighting) | (Rock, Ground) | (Rock, Steel) => RESISTED,
            (Rock, Fire) | (Rock, Ice) | (Rock, Flying) | (Rock, Bug) => SUPER_EFFECTIVE,
            (Rock, _) => NEUTRAL,

            (Ghost, Normal) => IMMUNE,
            (Ghost, Dark) | (Ghost, Steel) => RESISTED,
            (Ghost, Psychic) | (Ghost, Ghost) => SUPER_EFFECTIVE,
            (Ghost, _) => NEUTRAL,

            (Dragon, Steel) => RESISTED,
            (Dragon, Dragon) => SUPER_EFFECTIVE,
            (Dragon, _) => NEUTRAL,

            (Dark, Fighting) | (Dark, Dark) | (Dark, Steel) => RESISTED,
            (Dark, Psychic) | (Dark, Ghost) => SUPER_EFFECTIVE,
            (Dark, _) => NEUTRAL,

            (Steel, Fire) | (Steel, Water) | (Steel, Electric) | (Steel, Steel) => RESISTED,
            (Steel, Ice) | (Steel, Rock) => SUPER_EFFECTIVE,
            (Steel, _) => NEUTRAL,
        }
    }

    /// Combined effectiveness percentage against a one- or two-typed defender.
    /// Possible results: 0, 25, 50, 100, 200, 400.
    pub fn effectiveness_against_all(self, defending: &[PokemonType]) -> u16 {
        defending
            .iter()
            .fold(NEUTRAL as u32, |acc, &ty| {
                acc * self.effectiveness_against(ty) as u32 / NEUTRAL as u32
            }) as u16
    }
}
