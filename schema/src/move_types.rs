use crate::{FieldEffectKind, PokemonType, SideCondition, StatType, Weather};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric move identifier, stable across the reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveId(pub u16);

impl fmt::Display for MoveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

impl fmt::Display for MoveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveCategory::Physical => write!(f, "Physical"),
            MoveCategory::Special => write!(f, "Special"),
            MoveCategory::Status => write!(f, "Status"),
        }
    }
}

/// Who an effect clause applies to, relative to the move user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    User,
    Target,
}

/// Which battlers a move may be aimed at when it is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveTarget {
    /// One adjacent battler chosen at submission.
    Selected,
    User,
    AllOpponents,
    AllOthers,
    UserSide,
    OpponentSide,
    Field,
    RandomOpponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveFlag {
    Contact,
    Protectable,
    Sound,
    Punch,
    HighCrit,
    HitsAirborne,
    HitsUnderground,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MoveEffect {
    // Chance-based secondary effects, chance in percent
    Flinch(u8),
    Burn(u8),
    Freeze(u8),
    Paralyze(u8),
    Poison(u8),
    BadPoison(u8),
    Sedate(u8),
    Confuse(u8),
    StatChange(Target, StatType, i8, u8),

    // Damage modifiers
    Recoil(u8),
    Drain(u8),
    SetDamage(u16),
    LevelDamage,
    MultiHit(u8, u8),
    OHKO,
    Explode,
    Revenge,
    FakeOut,
    FuryCutter,
    Rollout,
    Counter,
    MirrorCoat,

    // Multi-turn behaviour
    Rampage,
    ChargeUp { skip_in: Option<Weather> },
    InAir,
    Underground,
    Exhaust,
    Uproar,

    // Protection
    Protect,
    Endure,

    // Volatile and persistent conditions on a battler
    Infatuate,
    Substitute,
    Encore,
    Taunt,
    Disable,
    Seed,
    FocusEnergy,
    PerishSong,
    Charge,
    LockOn,
    MagnetRise,

    // Field
    SetWeather(Weather),
    SetSideCondition(SideCondition),
    SetFieldEffect(FieldEffectKind),
    Haze,

    // Recovery
    Heal(u8),
    Rest,

    // Turn order manipulation
    MoveLast,
    MoveNext,
}

impl MoveEffect {
    /// Primary status effects that are the whole point of a status move.
    pub fn inflicted_status(&self) -> Option<crate::StatusType> {
        use crate::StatusType;
        match self {
            MoveEffect::Burn(_) => Some(StatusType::Burn),
            MoveEffect::Freeze(_) => Some(StatusType::Freeze),
            MoveEffect::Paralyze(_) => Some(StatusType::Paralysis),
            MoveEffect::Poison(_) => Some(StatusType::Poison),
            MoveEffect::BadPoison(_) => Some(StatusType::BadPoison),
            MoveEffect::Sedate(_) => Some(StatusType::Sleep),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveData {
    pub id: MoveId,
    pub name: String,
    pub move_type: PokemonType,
    pub category: MoveCategory,
    pub power: Option<u8>,
    /// `None` never misses.
    pub accuracy: Option<u8>,
    pub max_pp: u8,
    #[serde(default)]
    pub priority: i8,
    pub target: MoveTarget,
    #[serde(default)]
    pub flags: Vec<MoveFlag>,
    #[serde(default)]
    pub effects: Vec<MoveEffect>,
}

impl MoveData {
    pub fn has_flag(&self, flag: MoveFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn is_damaging(&self) -> bool {
        self.category != MoveCategory::Status
    }

    pub fn makes_contact(&self) -> bool {
        self.has_flag(MoveFlag::Contact)
    }
}
