//! Ability capability registry.
//!
//! Every ability maps to a static implementation of [`AbilityEffect`]. Hooks
//! default to "does nothing", so an implementation only overrides the points
//! it cares about. Hooks never mutate state; they return commands that the
//! caller executes in place.

use crate::battle::commands::BattleCommand;
use crate::battle::conditions::{EffectData, EffectRecord, PrimaryStatus, VolatileKind};
use crate::battle::field::EffectDuration;
use crate::battle::rng::TurnRng;
use crate::battle::state::{BattleEvent, BattleState, BattlerId, DamageSource, HealSource};
use crate::battle::stats::Modifier;
use crate::battle::status::status_block_reason;
use crate::battler::Battler;
use schema::{Ability, MoveCategory, MoveData, PokemonType, StatType, StatusType, Weather};

/// What an on-hit hook needs to know about the hit that triggered it.
#[derive(Debug, Clone, Copy)]
pub struct HitContext<'a> {
    pub user: BattlerId,
    pub target: BattlerId,
    pub move_data: &'a MoveData,
    /// Damage dealt to `target`, or the move's total for user-side hooks.
    pub damage: u16,
}

pub trait AbilityEffect: Sync {
    fn on_switch_in(&self, _owner: BattlerId, _state: &BattleState) -> Vec<BattleCommand> {
        Vec::new()
    }

    /// False blocks the status.
    fn on_status_apply_attempt(&self, _status: StatusType) -> bool {
        true
    }

    fn blocks_confusion(&self) -> bool {
        false
    }

    /// `Some` when the owner absorbs a move aimed at it. The commands replace
    /// the move's effect on the owner.
    fn type_immunity(
        &self,
        _owner: BattlerId,
        _state: &BattleState,
        _move_data: &MoveData,
    ) -> Option<Vec<BattleCommand>> {
        None
    }

    fn power_modifier(&self, _owner: &Battler, _move_data: &MoveData, _power: u16) -> Modifier {
        Modifier::NONE
    }

    fn attack_modifier(&self, _owner: &Battler, _move_data: &MoveData) -> Modifier {
        Modifier::NONE
    }

    /// Applied to the attacker's stat when the owner is the target.
    fn incoming_attack_modifier(&self, _move_data: &MoveData) -> Modifier {
        Modifier::NONE
    }

    fn ignores_burn_penalty(&self) -> bool {
        false
    }

    fn speed_modifier(&self, _owner: &Battler, _weather: Option<Weather>) -> Modifier {
        Modifier::NONE
    }

    fn accuracy_modifier(&self, _move_data: &MoveData) -> Modifier {
        Modifier::NONE
    }

    /// Applied to the accuracy of moves aimed at the owner.
    fn evasion_modifier(&self, _weather: Option<Weather>) -> Modifier {
        Modifier::NONE
    }

    fn ignores_accuracy(&self) -> bool {
        false
    }

    fn crit_stage_bonus(&self) -> u8 {
        0
    }

    fn blocks_critical(&self) -> bool {
        false
    }

    fn prevents_flinch(&self) -> bool {
        false
    }

    fn blocks_stat_drop(&self, _stat: StatType) -> bool {
        false
    }

    fn weather_immunity(&self, _weather: Weather) -> bool {
        false
    }

    /// Extra PP an opponent spends when targeting the owner.
    fn extra_pp_cost(&self) -> u8 {
        0
    }

    fn on_hit_as_target(
        &self,
        _ctx: &HitContext,
        _state: &BattleState,
        _rng: &mut TurnRng,
    ) -> Vec<BattleCommand> {
        Vec::new()
    }

    fn on_hit_as_user(
        &self,
        _ctx: &HitContext,
        _state: &BattleState,
        _rng: &mut TurnRng,
    ) -> Vec<BattleCommand> {
        Vec::new()
    }

    fn end_of_turn(&self, _owner: BattlerId, _state: &BattleState) -> Vec<BattleCommand> {
        Vec::new()
    }
}

fn activated(battler: BattlerId, ability: Ability) -> BattleCommand {
    BattleCommand::EmitEvent(BattleEvent::AbilityActivated { battler, ability })
}

struct NoAbility;
impl AbilityEffect for NoAbility {}

struct Intimidate;
impl AbilityEffect for Intimidate {
    fn on_switch_in(&self, owner: BattlerId, state: &BattleState) -> Vec<BattleCommand> {
        let mut commands = vec![activated(owner, Ability::Intimidate)];
        for foe in state.live_opponents(owner) {
            commands.push(BattleCommand::ChangeStatStage {
                target: foe,
                stat: StatType::Attack,
                delta: -1,
            });
        }
        commands
    }
}

struct WeatherOnEntry {
    ability: Ability,
    weather: Weather,
}
impl AbilityEffect for WeatherOnEntry {
    fn on_switch_in(&self, owner: BattlerId, state: &BattleState) -> Vec<BattleCommand> {
        if state.field.weather() == Some(self.weather) {
            return Vec::new();
        }
        vec![
            activated(owner, self.ability),
            BattleCommand::SetWeather {
                weather: self.weather,
                duration: EffectDuration::UntilReplaced,
            },
        ]
    }
}

enum AbsorbResponse {
    HealQuarter,
    FlashFire,
}

struct TypeAbsorb {
    ability: Ability,
    absorbs: PokemonType,
    response: AbsorbResponse,
}
impl AbilityEffect for TypeAbsorb {
    fn type_immunity(
        &self,
        owner: BattlerId,
        state: &BattleState,
        move_data: &MoveData,
    ) -> Option<Vec<BattleCommand>> {
        if move_data.move_type != self.absorbs {
            return None;
        }
        let mut commands = vec![activated(owner, self.ability)];
        match self.response {
            AbsorbResponse::HealQuarter => {
                if let Ok(battler) = state.battler(owner) {
                    commands.push(BattleCommand::Heal {
                        target: owner,
                        amount: battler.fraction_of_max_hp(1, 4),
                        source: HealSource::Ability(self.ability),
                    });
                }
            }
            AbsorbResponse::FlashFire => commands.push(BattleCommand::AddVolatile {
                target: owner,
                kind: VolatileKind::FlashFire,
                record: EffectRecord::lasting(EffectData::None),
            }),
        }
        Some(commands)
    }
}

/// Levitate's ground immunity is part of the grounded check; the hook here
/// only keeps the ability visible in the registry.
struct Levitate;
impl AbilityEffect for Levitate {}

struct ContactStatus {
    ability: Ability,
    status: StatusType,
}
impl AbilityEffect for ContactStatus {
    fn on_hit_as_target(
        &self,
        ctx: &HitContext,
        state: &BattleState,
        rng: &mut TurnRng,
    ) -> Vec<BattleCommand> {
        if ctx.damage == 0 || !ctx.move_data.makes_contact() || !state.is_alive(ctx.user) {
            return Vec::new();
        }
        if !rng.percent(30, "contact ability") {
            return Vec::new();
        }
        if status_block_reason(state, ctx.user, self.status, Some(ctx.target)).is_some() {
            return Vec::new();
        }
        vec![
            activated(ctx.target, self.ability),
            BattleCommand::SetStatus {
                target: ctx.user,
                status: PrimaryStatus::from_kind(self.status, 0),
            },
        ]
    }
}

struct RoughSkin;
impl AbilityEffect for RoughSkin {
    fn on_hit_as_target(
        &self,
        ctx: &HitContext,
        state: &BattleState,
        _rng: &mut TurnRng,
    ) -> Vec<BattleCommand> {
        if ctx.damage == 0 || !ctx.move_data.makes_contact() {
            return Vec::new();
        }
        let Ok(user) = state.battler(ctx.user) else {
            return Vec::new();
        };
        if user.is_fainted() {
            return Vec::new();
        }
        vec![
            activated(ctx.target, Ability::RoughSkin),
            BattleCommand::Damage {
                target: ctx.user,
                amount: user.fraction_of_max_hp(1, 8),
                source: DamageSource::Ability(Ability::RoughSkin),
            },
        ]
    }
}

struct StatusImmunity {
    blocks: &'static [StatusType],
}
impl AbilityEffect for StatusImmunity {
    fn on_status_apply_attempt(&self, status: StatusType) -> bool {
        !self.blocks.contains(&status)
    }
}

struct OwnTempo;
impl AbilityEffect for OwnTempo {
    fn blocks_confusion(&self) -> bool {
        true
    }
}

struct WeatherSpeed {
    weather: Weather,
}
impl AbilityEffect for WeatherSpeed {
    fn speed_modifier(&self, _owner: &Battler, weather: Option<Weather>) -> Modifier {
        if weather == Some(self.weather) {
            Modifier::DOUBLE
        } else {
            Modifier::NONE
        }
    }
}

struct Guts;
impl AbilityEffect for Guts {
    fn attack_modifier(&self, owner: &Battler, move_data: &MoveData) -> Modifier {
        if owner.status.is_some() && move_data.category == MoveCategory::Physical {
            Modifier::ONE_AND_HALF
        } else {
            Modifier::NONE
        }
    }

    fn ignores_burn_penalty(&self) -> bool {
        true
    }
}

struct HugePower;
impl AbilityEffect for HugePower {
    fn attack_modifier(&self, _owner: &Battler, move_data: &MoveData) -> Modifier {
        if move_data.category == MoveCategory::Physical {
            Modifier::DOUBLE
        } else {
            Modifier::NONE
        }
    }
}

struct Hustle;
impl AbilityEffect for Hustle {
    fn attack_modifier(&self, _owner: &Battler, move_data: &MoveData) -> Modifier {
        if move_data.category == MoveCategory::Physical {
            Modifier::ONE_AND_HALF
        } else {
            Modifier::NONE
        }
    }

    fn accuracy_modifier(&self, move_data: &MoveData) -> Modifier {
        if move_data.category == MoveCategory::Physical {
            Modifier::new(4, 5)
        } else {
            Modifier::NONE
        }
    }
}

struct CompoundEyes;
impl AbilityEffect for CompoundEyes {
    fn accuracy_modifier(&self, _move_data: &MoveData) -> Modifier {
        Modifier::new(13, 10)
    }
}

struct SandVeil;
impl AbilityEffect for SandVeil {
    fn evasion_modifier(&self, weather: Option<Weather>) -> Modifier {
        if weather == Some(Weather::Sandstorm) {
            Modifier::new(4, 5)
        } else {
            Modifier::NONE
        }
    }

    fn weather_immunity(&self, weather: Weather) -> bool {
        weather == Weather::Sandstorm
    }
}

struct SuperLuck;
impl AbilityEffect for SuperLuck {
    fn crit_stage_bonus(&self) -> u8 {
        1
    }
}

struct CritImmunity;
impl AbilityEffect for CritImmunity {
    fn blocks_critical(&self) -> bool {
        true
    }
}

/// Blaze, Torrent and Overgrow.
struct PinchBoost {
    move_type: PokemonType,
}
impl AbilityEffect for PinchBoost {
    fn power_modifier(&self, owner: &Battler, move_data: &MoveData, _power: u16) -> Modifier {
        if move_data.move_type == self.move_type && owner.current_hp() <= owner.max_hp() / 3 {
            Modifier::ONE_AND_HALF
        } else {
            Modifier::NONE
        }
    }
}

struct ThickFat;
impl AbilityEffect for ThickFat {
    fn incoming_attack_modifier(&self, move_data: &MoveData) -> Modifier {
        match move_data.move_type {
            PokemonType::Fire | PokemonType::Ice => Modifier::HALF,
            _ => Modifier::NONE,
        }
    }
}

struct SpeedBoost;
impl AbilityEffect for SpeedBoost {
    fn end_of_turn(&self, owner: BattlerId, state: &BattleState) -> Vec<BattleCommand> {
        match state.battler(owner) {
            Ok(battler) if battler.turns_active > 0 && battler.stat_stage(StatType::Speed) < 6 => {
                vec![
                    activated(owner, Ability::SpeedBoost),
                    BattleCommand::ChangeStatStage {
                        target: owner,
                        stat: StatType::Speed,
                        delta: 1,
                    },
                ]
            }
            _ => Vec::new(),
        }
    }
}

struct Technician;
impl AbilityEffect for Technician {
    fn power_modifier(&self, _owner: &Battler, _move_data: &MoveData, power: u16) -> Modifier {
        if power <= 60 {
            Modifier::ONE_AND_HALF
        } else {
            Modifier::NONE
        }
    }
}

struct NoGuard;
impl AbilityEffect for NoGuard {
    fn ignores_accuracy(&self) -> bool {
        true
    }
}

struct InnerFocus;
impl AbilityEffect for InnerFocus {
    fn prevents_flinch(&self) -> bool {
        true
    }
}

struct KeenEye;
impl AbilityEffect for KeenEye {
    fn blocks_stat_drop(&self, stat: StatType) -> bool {
        stat == StatType::Accuracy
    }
}

struct Pressure;
impl AbilityEffect for Pressure {
    fn extra_pp_cost(&self) -> u8 {
        1
    }
}

static NO_ABILITY: NoAbility = NoAbility;
static INTIMIDATE: Intimidate = Intimidate;
static DRIZZLE: WeatherOnEntry = WeatherOnEntry {
    ability: Ability::Drizzle,
    weather: Weather::Rain,
};
static DROUGHT: WeatherOnEntry = WeatherOnEntry {
    ability: Ability::Drought,
    weather: Weather::Sun,
};
static SAND_STREAM: WeatherOnEntry = WeatherOnEntry {
    ability: Ability::SandStream,
    weather: Weather::Sandstorm,
};
static SNOW_WARNING: WeatherOnEntry = WeatherOnEntry {
    ability: Ability::SnowWarning,
    weather: Weather::Hail,
};
static LEVITATE: Levitate = Levitate;
static VOLT_ABSORB: TypeAbsorb = TypeAbsorb {
    ability: Ability::VoltAbsorb,
    absorbs: PokemonType::Electric,
    response: AbsorbResponse::HealQuarter,
};
static WATER_ABSORB: TypeAbsorb = TypeAbsorb {
    ability: Ability::WaterAbsorb,
    absorbs: PokemonType::Water,
    response: AbsorbResponse::HealQuarter,
};
static FLASH_FIRE: TypeAbsorb = TypeAbsorb {
    ability: Ability::FlashFire,
    absorbs: PokemonType::Fire,
    response: AbsorbResponse::FlashFire,
};
static STATIC: ContactStatus = ContactStatus {
    ability: Ability::Static,
    status: StatusType::Paralysis,
};
static FLAME_BODY: ContactStatus = ContactStatus {
    ability: Ability::FlameBody,
    status: StatusType::Burn,
};
static POISON_POINT: ContactStatus = ContactStatus {
    ability: Ability::PoisonPoint,
    status: StatusType::Poison,
};
static ROUGH_SKIN: RoughSkin = RoughSkin;
static LIMBER: StatusImmunity = StatusImmunity {
    blocks: &[StatusType::Paralysis],
};
static INSOMNIA: StatusImmunity = StatusImmunity {
    blocks: &[StatusType::Sleep],
};
static IMMUNITY: StatusImmunity = StatusImmunity {
    blocks: &[StatusType::Poison, StatusType::BadPoison],
};
static WATER_VEIL: StatusImmunity = StatusImmunity {
    blocks: &[StatusType::Burn],
};
static MAGMA_ARMOR: StatusImmunity = StatusImmunity {
    blocks: &[StatusType::Freeze],
};
static OWN_TEMPO: OwnTempo = OwnTempo;
static SWIFT_SWIM: WeatherSpeed = WeatherSpeed {
    weather: Weather::Rain,
};
static CHLOROPHYLL: WeatherSpeed = WeatherSpeed {
    weather: Weather::Sun,
};
static GUTS: Guts = Guts;
static HUGE_POWER: HugePower = HugePower;
static HUSTLE: Hustle = Hustle;
static COMPOUND_EYES: CompoundEyes = CompoundEyes;
static SAND_VEIL: SandVeil = SandVeil;
static SUPER_LUCK: SuperLuck = SuperLuck;
static CRIT_IMMUNITY: CritImmunity = CritImmunity;
static BLAZE: PinchBoost = PinchBoost {
    move_type: PokemonType::Fire,
};
static TORRENT: PinchBoost = PinchBoost {
    move_type: PokemonType::Water,
};
static OVERGROW: PinchBoost = PinchBoost {
    move_type: PokemonType::Grass,
};
static THICK_FAT: ThickFat = ThickFat;
static SPEED_BOOST: SpeedBoost = SpeedBoost;
static TECHNICIAN: Technician = Technician;
static NO_GUARD: NoGuard = NoGuard;
static INNER_FOCUS: InnerFocus = InnerFocus;
static KEEN_EYE: KeenEye = KeenEye;
static PRESSURE: Pressure = Pressure;

/// Look up the implementation for an ability. Battlers without one get the
/// no-op implementation.
pub fn ability_effect(ability: Option<Ability>) -> &'static dyn AbilityEffect {
    let Some(ability) = ability else {
        return &NO_ABILITY;
    };
    match ability {
        Ability::Intimidate => &INTIMIDATE,
        Ability::Drizzle => &DRIZZLE,
        Ability::Drought => &DROUGHT,
        Ability::SandStream => &SAND_STREAM,
        Ability::SnowWarning => &SNOW_WARNING,
        Ability::Levitate => &LEVITATE,
        Ability::VoltAbsorb => &VOLT_ABSORB,
        Ability::WaterAbsorb => &WATER_ABSORB,
        Ability::FlashFire => &FLASH_FIRE,
        Ability::Static => &STATIC,
        Ability::FlameBody => &FLAME_BODY,
        Ability::PoisonPoint => &POISON_POINT,
        Ability::RoughSkin => &ROUGH_SKIN,
        Ability::Limber => &LIMBER,
        Ability::Insomnia | Ability::VitalSpirit => &INSOMNIA,
        Ability::Immunity => &IMMUNITY,
        Ability::WaterVeil => &WATER_VEIL,
        Ability::MagmaArmor => &MAGMA_ARMOR,
        Ability::OwnTempo => &OWN_TEMPO,
        Ability::SwiftSwim => &SWIFT_SWIM,
        Ability::Chlorophyll => &CHLOROPHYLL,
        Ability::Guts => &GUTS,
        Ability::HugePower => &HUGE_POWER,
        Ability::Hustle => &HUSTLE,
        Ability::CompoundEyes => &COMPOUND_EYES,
        Ability::SandVeil => &SAND_VEIL,
        Ability::SuperLuck => &SUPER_LUCK,
        Ability::BattleArmor | Ability::ShellArmor => &CRIT_IMMUNITY,
        Ability::Blaze => &BLAZE,
        Ability::Torrent => &TORRENT,
        Ability::Overgrow => &OVERGROW,
        Ability::ThickFat => &THICK_FAT,
        Ability::SpeedBoost => &SPEED_BOOST,
        Ability::Technician => &TECHNICIAN,
        Ability::NoGuard => &NO_GUARD,
        Ability::InnerFocus => &INNER_FOCUS,
        Ability::KeenEye => &KEEN_EYE,
        Ability::Pressure => &PRESSURE,
    }
}
