use crate::battle::abilities::ability_effect;
use crate::battle::conditions::{PersistentKind, PrimaryStatus};
use crate::battle::items::item_effect;
use crate::battle::rng::TurnRng;
use crate::battle::state::{BattleState, BattlerId};
use crate::battle::stats::{
    apply_stat_stage_multiplier, effective_attack, effective_defense, is_grounded, Modifier,
};
use crate::battler::Battler;
use crate::config::{BattleConfig, BattleFormat};
use schema::{
    MoveCategory, MoveData, MoveEffect, PokemonType, SideCondition, StatType, Weather, IMMUNE,
    NEUTRAL,
};

/// Power of the typeless hit a confused battler deals itself.
const CONFUSION_POWER: u32 = 40;
const FURY_CUTTER_MAX_POWER: u16 = 160;

/// Inclusive bounds of the damage random factor, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageRoll {
    pub min: u8,
    pub max: u8,
}

impl Default for DamageRoll {
    fn default() -> Self {
        Self { min: 85, max: 100 }
    }
}

impl From<&BattleConfig> for DamageRoll {
    fn from(config: &BattleConfig) -> Self {
        Self {
            min: config.damage_roll_min,
            max: config.damage_roll_max,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    pub damage: u16,
    /// Type effectiveness in percent.
    pub effectiveness: u16,
}

/// Type effectiveness of `move_data` against `target_id`, in percent. Status
/// moves and typeless moves are neutral. Ground moves miss anything airborne
/// and hit Flying types once they are grounded.
pub fn type_effectiveness(state: &BattleState, target_id: BattlerId, move_data: &MoveData) -> u16 {
    let Ok(target) = state.battler(target_id) else {
        return NEUTRAL;
    };
    if move_data.category == MoveCategory::Status {
        return NEUTRAL;
    }
    if move_data.move_type == PokemonType::Ground {
        if !is_grounded(state, target_id) {
            return IMMUNE;
        }
        let grounded_types: Vec<PokemonType> = target
            .types
            .iter()
            .copied()
            .filter(|t| *t != PokemonType::Flying)
            .collect();
        return move_data.move_type.effectiveness_against_all(&grounded_types);
    }
    move_data.move_type.effectiveness_against_all(&target.types)
}

/// The level/power/attack/defense core of the damage formula.
pub fn base_damage(level: u8, power: u16, attack: u32, defense: u32) -> u32 {
    let level_factor = 2 * level as u32 / 5 + 2;
    level_factor * power as u32 * attack / defense.max(1) / 50 + 2
}

/// Base power after move-specific scaling and power modifiers.
pub fn move_power(
    state: &BattleState,
    user_id: BattlerId,
    target_id: BattlerId,
    move_data: &MoveData,
) -> u16 {
    let Ok(user) = state.battler(user_id) else {
        return 0;
    };
    let mut power = move_data.power.unwrap_or(0) as u16;

    for effect in &move_data.effects {
        match effect {
            MoveEffect::Revenge => {
                if state.flags.was_damaged_by(user_id, target_id) {
                    power *= 2;
                }
            }
            MoveEffect::FuryCutter => {
                let chain = user
                    .persistent
                    .get(PersistentKind::FuryCutter)
                    .map(|r| r.count())
                    .unwrap_or(0)
                    .min(4);
                power = (power << chain).min(FURY_CUTTER_MAX_POWER);
            }
            MoveEffect::Rollout => {
                let chain = user
                    .persistent
                    .get(PersistentKind::Rollout)
                    .map(|r| r.count())
                    .unwrap_or(0)
                    .min(4);
                power <<= chain;
            }
            _ => {}
        }
    }

    if move_data.move_type == PokemonType::Electric
        && user.persistent.contains(PersistentKind::Charge)
    {
        power *= 2;
    }

    let mut power = power as u32;
    power = ability_effect(user.ability)
        .power_modifier(user, move_data, power as u16)
        .apply(power);
    power = item_effect(user.item).power_modifier(move_data).apply(power);
    power.min(u16::MAX as u32) as u16
}

/// Full damage for one hit of a physical or special move with variable
/// power. Draws the random factor only when the target is not immune.
#[allow(clippy::too_many_arguments)]
pub fn calculate_damage(
    state: &BattleState,
    user_id: BattlerId,
    target_id: BattlerId,
    move_data: &MoveData,
    critical: bool,
    spread: bool,
    roll: DamageRoll,
    rng: &mut TurnRng,
) -> DamageOutcome {
    let effectiveness = type_effectiveness(state, target_id, move_data);
    let (Ok(user), Ok(target)) = (state.battler(user_id), state.battler(target_id)) else {
        return DamageOutcome {
            damage: 0,
            effectiveness,
        };
    };
    if effectiveness == IMMUNE || move_data.category == MoveCategory::Status {
        return DamageOutcome {
            damage: 0,
            effectiveness,
        };
    }

    let power = move_power(state, user_id, target_id, move_data);
    let mut attack = effective_attack(user, target, move_data, critical);
    if move_data.category == MoveCategory::Physical
        && matches!(user.status, Some(PrimaryStatus::Burn))
        && !ability_effect(user.ability).ignores_burn_penalty()
    {
        attack /= 2;
    }
    let mut defense = effective_defense(state, target, move_data, critical);
    if move_data.effects.contains(&MoveEffect::Explode) {
        defense = (defense / 2).max(1);
    }

    let mut damage = base_damage(user.level, power, attack.max(1), defense);

    if !critical {
        let screen = match move_data.category {
            MoveCategory::Physical => SideCondition::Reflect,
            _ => SideCondition::LightScreen,
        };
        if state.field.sides[target_id.side()].has(screen) {
            damage = match state.format {
                BattleFormat::Single => Modifier::HALF.apply(damage),
                BattleFormat::Double => Modifier::new(2, 3).apply(damage),
            };
        }
    }

    if spread && state.format == BattleFormat::Double {
        damage = Modifier::new(3, 4).apply(damage);
    }

    damage = weather_modifier(state.field.weather(), move_data.move_type).apply(damage);

    if critical {
        damage = Modifier::DOUBLE.apply(damage);
    }

    let roll_value = rng.next_in_range(roll.min as u32, roll.max as u32, "damage roll");
    damage = damage * roll_value / 100;

    if user.has_type(move_data.move_type) && move_data.move_type != PokemonType::Typeless {
        damage = Modifier::ONE_AND_HALF.apply(damage);
    }

    damage = damage * effectiveness as u32 / 100;
    damage = item_effect(user.item)
        .final_damage_modifier(effectiveness)
        .apply(damage);

    DamageOutcome {
        damage: damage.clamp(1, u16::MAX as u32) as u16,
        effectiveness,
    }
}

pub fn weather_modifier(weather: Option<Weather>, move_type: PokemonType) -> Modifier {
    match (weather, move_type) {
        (Some(Weather::Rain), PokemonType::Water) | (Some(Weather::Sun), PokemonType::Fire) => {
            Modifier::ONE_AND_HALF
        }
        (Some(Weather::Rain), PokemonType::Fire) | (Some(Weather::Sun), PokemonType::Water) => {
            Modifier::HALF
        }
        _ => Modifier::NONE,
    }
}

/// Damage a confused battler deals to itself: a 40 power typeless physical
/// hit using its own attack and defense stages, with no random factor.
pub fn confusion_damage(battler: &Battler) -> u16 {
    let attack = apply_stat_stage_multiplier(battler.stats.attack, battler.stat_stage(StatType::Attack));
    let defense =
        apply_stat_stage_multiplier(battler.stats.defense, battler.stat_stage(StatType::Defense));
    let damage = base_damage(
        battler.level,
        CONFUSION_POWER as u16,
        attack as u32,
        defense as u32,
    );
    damage.clamp(1, u16::MAX as u32) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::field::EffectDuration;
    use crate::battle::tests::common::{single_battle, TestBattlerBuilder};
    use crate::data_store::{moves, species, ReferenceData};
    use pretty_assertions::assert_eq;

    fn pikachu_vs(opponent: schema::SpeciesId) -> BattleState {
        single_battle(
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::THUNDERBOLT]),
            TestBattlerBuilder::new(opponent, 50).with_moves(vec![moves::TACKLE]),
        )
    }

    #[test]
    fn test_base_damage_formula() {
        // (2*50/5 + 2) * 95 * 70 / 60 / 50 + 2
        assert_eq!(base_damage(50, 95, 70, 60), 53);
    }

    #[test]
    fn test_ground_immunity_and_gravity() {
        let mut state = pikachu_vs(species::CHARIZARD);
        let data = ReferenceData::builtin().unwrap();
        let earthquake = data.move_data(moves::EARTHQUAKE).unwrap();
        assert_eq!(type_effectiveness(&state, BattlerId(1), earthquake), 0);

        state
            .field
            .set_effect(schema::FieldEffectKind::Gravity, EffectDuration::Turns(5));
        // grounded Charizard takes Ground damage against its Fire typing alone
        assert_eq!(type_effectiveness(&state, BattlerId(1), earthquake), 200);
    }

    #[test]
    fn test_immune_target_takes_no_damage_and_draws_nothing() {
        let state = pikachu_vs(species::GARCHOMP);
        let data = ReferenceData::builtin().unwrap();
        let thunderbolt = data.move_data(moves::THUNDERBOLT).unwrap();
        let mut rng = TurnRng::new_for_test(vec![]);
        let outcome = calculate_damage(
            &state,
            BattlerId(0),
            BattlerId(1),
            thunderbolt,
            false,
            false,
            DamageRoll::default(),
            &mut rng,
        );
        assert_eq!(outcome, DamageOutcome { damage: 0, effectiveness: 0 });
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_critical_hit_ignores_reflect() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::MACHAMP, 50).with_moves(vec![moves::KARATE_CHOP]),
            TestBattlerBuilder::new(species::SNORLAX, 50).with_moves(vec![moves::TACKLE]),
        );
        let data = ReferenceData::builtin().unwrap();
        let chop = data.move_data(moves::KARATE_CHOP).unwrap();
        let hit = |state: &BattleState, critical: bool| {
            let mut rng = TurnRng::new_for_test(vec![100]);
            calculate_damage(
                state,
                BattlerId(0),
                BattlerId(1),
                chop,
                critical,
                false,
                DamageRoll::default(),
                &mut rng,
            )
            .damage
        };

        let plain = hit(&state, false);
        let crit = hit(&state, true);
        state
            .field
            .add_side_condition(1, SideCondition::Reflect, EffectDuration::Turns(5));
        assert!(hit(&state, false) < plain);
        assert_eq!(hit(&state, true), crit);
    }

    #[test]
    fn test_rain_boosts_water() {
        assert_eq!(
            weather_modifier(Some(Weather::Rain), PokemonType::Water),
            Modifier::ONE_AND_HALF
        );
        assert_eq!(weather_modifier(Some(Weather::Sun), PokemonType::Water), Modifier::HALF);
        assert_eq!(weather_modifier(None, PokemonType::Fire), Modifier::NONE);
    }

    #[test]
    fn test_confusion_damage_is_positive() {
        let state = pikachu_vs(species::SNORLAX);
        assert!(confusion_damage(&state.battlers[0]) >= 1);
    }
}
