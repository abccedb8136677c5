use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ability {
    Intimidate,
    Drizzle,
    Drought,
    SandStream,
    SnowWarning,
    Levitate,
    VoltAbsorb,
    WaterAbsorb,
    FlashFire,
    Static,
    FlameBody,
    PoisonPoint,
    RoughSkin,
    Limber,
    Insomnia,
    VitalSpirit,
    Immunity,
    WaterVeil,
    MagmaArmor,
    OwnTempo,
    SwiftSwim,
    Chlorophyll,
    Guts,
    HugePower,
    Hustle,
    CompoundEyes,
    SandVeil,
    SuperLuck,
    BattleArmor,
    ShellArmor,
    Blaze,
    Torrent,
    Overgrow,
    ThickFat,
    SpeedBoost,
    Technician,
    NoGuard,
    InnerFocus,
    KeenEye,
    Pressure,
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Ability::SandStream => "Sand Stream",
            Ability::SnowWarning => "Snow Warning",
            Ability::VoltAbsorb => "Volt Absorb",
            Ability::WaterAbsorb => "Water Absorb",
            Ability::FlashFire => "Flash Fire",
            Ability::FlameBody => "Flame Body",
            Ability::PoisonPoint => "Poison Point",
            Ability::RoughSkin => "Rough Skin",
            Ability::VitalSpirit => "Vital Spirit",
            Ability::WaterVeil => "Water Veil",
            Ability::MagmaArmor => "Magma Armor",
            Ability::OwnTempo => "Own Tempo",
            Ability::SwiftSwim => "Swift Swim",
            Ability::HugePower => "Huge Power",
            Ability::CompoundEyes => "Compound Eyes",
            Ability::SandVeil => "Sand Veil",
            Ability::SuperLuck => "Super Luck",
            Ability::BattleArmor => "Battle Armor",
            Ability::ShellArmor => "Shell Armor",
            Ability::ThickFat => "Thick Fat",
            Ability::SpeedBoost => "Speed Boost",
            Ability::NoGuard => "No Guard",
            Ability::InnerFocus => "Inner Focus",
            Ability::KeenEye => "Keen Eye",
            other => return write!(f, "{:?}", other),
        };
        write!(f, "{}", name)
    }
}

/// Items a battler holds into battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeldItem {
    Leftovers,
    BlackSludge,
    LifeOrb,
    ChoiceBand,
    ChoiceSpecs,
    ChoiceScarf,
    FocusSash,
    SitrusBerry,
    LumBerry,
    ScopeLens,
    WideLens,
    ExpertBelt,
    MuscleBand,
    WiseGlasses,
    IronBall,
    ShellBell,
    Charcoal,
    MysticWater,
    MiracleSeed,
    Magnet,
}

impl HeldItem {
    /// Berries and one-shot items are removed once they activate.
    pub fn is_consumable(self) -> bool {
        matches!(
            self,
            HeldItem::FocusSash | HeldItem::SitrusBerry | HeldItem::LumBerry
        )
    }

    pub fn is_choice_item(self) -> bool {
        matches!(
            self,
            HeldItem::ChoiceBand | HeldItem::ChoiceSpecs | HeldItem::ChoiceScarf
        )
    }
}

impl fmt::Display for HeldItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HeldItem::BlackSludge => "Black Sludge",
            HeldItem::LifeOrb => "Life Orb",
            HeldItem::ChoiceBand => "Choice Band",
            HeldItem::ChoiceSpecs => "Choice Specs",
            HeldItem::ChoiceScarf => "Choice Scarf",
            HeldItem::FocusSash => "Focus Sash",
            HeldItem::SitrusBerry => "Sitrus Berry",
            HeldItem::LumBerry => "Lum Berry",
            HeldItem::ScopeLens => "Scope Lens",
            HeldItem::WideLens => "Wide Lens",
            HeldItem::ExpertBelt => "Expert Belt",
            HeldItem::MuscleBand => "Muscle Band",
            HeldItem::WiseGlasses => "Wise Glasses",
            HeldItem::IronBall => "Iron Ball",
            HeldItem::ShellBell => "Shell Bell",
            HeldItem::MysticWater => "Mystic Water",
            HeldItem::MiracleSeed => "Miracle Seed",
            other => return write!(f, "{:?}", other),
        };
        write!(f, "{}", name)
    }
}
