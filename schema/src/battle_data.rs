use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{EnumIter, IntoEnumIterator};

/// Stats that can carry a stage modifier in battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter)]
pub enum StatType {
    Attack,
    Defense,
    SpecialAttack,
    SpecialDefense,
    Speed,
    Accuracy,
    Evasion,
}

impl StatType {
    pub fn all() -> impl Iterator<Item = StatType> {
        StatType::iter()
    }
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatType::Attack => "Attack",
            StatType::Defense => "Defense",
            StatType::SpecialAttack => "Sp. Atk",
            StatType::SpecialDefense => "Sp. Def",
            StatType::Speed => "Speed",
            StatType::Accuracy => "accuracy",
            StatType::Evasion => "evasiveness",
        };
        write!(f, "{}", name)
    }
}

/// Primary (non-volatile) status kinds referenced by move data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatusType {
    Sleep,
    Poison,
    BadPoison,
    Burn,
    Freeze,
    Paralysis,
}

impl fmt::Display for StatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusType::Sleep => "asleep",
            StatusType::Poison => "poisoned",
            StatusType::BadPoison => "badly poisoned",
            StatusType::Burn => "burned",
            StatusType::Freeze => "frozen",
            StatusType::Paralysis => "paralyzed",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weather {
    Rain,
    Sun,
    Sandstorm,
    Hail,
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Weather::Rain => "rain",
            Weather::Sun => "harsh sunlight",
            Weather::Sandstorm => "sandstorm",
            Weather::Hail => "hail",
        };
        write!(f, "{}", name)
    }
}

/// Conditions that belong to one side of the field.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
pub enum SideCondition {
    Reflect,
    LightScreen,
    Mist,
    Safeguard,
    Tailwind,
    Spikes,
    ToxicSpikes,
    StealthRock,
}

impl SideCondition {
    /// Entry hazards are placed on the opposing side and stack in layers.
    pub fn is_hazard(self) -> bool {
        matches!(
            self,
            SideCondition::Spikes | SideCondition::ToxicSpikes | SideCondition::StealthRock
        )
    }

    pub fn max_layers(self) -> u8 {
        match self {
            SideCondition::Spikes => 3,
            SideCondition::ToxicSpikes => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for SideCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_name = match self {
            SideCondition::Reflect => "Reflect",
            SideCondition::LightScreen => "Light Screen",
            SideCondition::Mist => "Mist",
            SideCondition::Safeguard => "Safeguard",
            SideCondition::Tailwind => "Tailwind",
            SideCondition::Spikes => "Spikes",
            SideCondition::ToxicSpikes => "Toxic Spikes",
            SideCondition::StealthRock => "Stealth Rock",
        };
        write!(f, "{}", display_name)
    }
}

/// Effects that apply to the whole field.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
pub enum FieldEffectKind {
    Gravity,
    TrickRoom,
    Uproar,
    Fog,
}

impl fmt::Display for FieldEffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_name = match self {
            FieldEffectKind::Gravity => "Gravity",
            FieldEffectKind::TrickRoom => "Trick Room",
            FieldEffectKind::Uproar => "Uproar",
            FieldEffectKind::Fog => "Fog",
        };
        write!(f, "{}", display_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Genderless,
}

/// Items used from the bag as a turn action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BagItem {
    Potion,
    SuperPotion,
    HyperPotion,
    FullHeal,
    XAttack,
    XSpeed,
}

impl fmt::Display for BagItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BagItem::Potion => "Potion",
            BagItem::SuperPotion => "Super Potion",
            BagItem::HyperPotion => "Hyper Potion",
            BagItem::FullHeal => "Full Heal",
            BagItem::XAttack => "X Attack",
            BagItem::XSpeed => "X Speed",
        };
        write!(f, "{}", name)
    }
}
