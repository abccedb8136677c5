use crate::battle::abilities::ability_effect;
use crate::battle::conditions::{PersistentKind, PrimaryStatus, VolatileKind};
use crate::battle::items::item_effect;
use crate::battle::state::{BattleState, BattlerId};
use crate::battler::Battler;
use schema::{
    Ability, FieldEffectKind, HeldItem, MoveCategory, MoveData, MoveEffect, MoveFlag, PokemonType,
    SideCondition, StatType, Weather,
};

/// Integer multiplier applied as `value * numerator / denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifier {
    pub numerator: u32,
    pub denominator: u32,
}

impl Modifier {
    pub const NONE: Modifier = Modifier::new(1, 1);
    pub const HALF: Modifier = Modifier::new(1, 2);
    pub const DOUBLE: Modifier = Modifier::new(2, 1);
    pub const ONE_AND_HALF: Modifier = Modifier::new(3, 2);

    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn apply(self, value: u32) -> u32 {
        value * self.numerator / self.denominator
    }

    pub fn then(self, other: Modifier) -> Modifier {
        Modifier::new(
            self.numerator * other.numerator,
            self.denominator * other.denominator,
        )
    }
}

/// Critical-hit odds by stage, as denominators of `1/n`.
const CRIT_DENOMINATORS: [u32; 5] = [16, 8, 4, 3, 2];

/// Stat stage multipliers
/// Negative stages: (2 / (2 + |stage|))
/// Positive stages: ((2 + stage) / 2)
pub fn stat_stage_modifier(stage: i8) -> Modifier {
    let stage = stage.clamp(-6, 6);
    if stage < 0 {
        Modifier::new(2, (2 - stage) as u32)
    } else {
        Modifier::new((2 + stage) as u32, 2)
    }
}

/// Accuracy/evasion stage multipliers run from 3/9 to 9/3.
pub fn accuracy_stage_modifier(stage: i8) -> Modifier {
    let stage = stage.clamp(-6, 6);
    if stage < 0 {
        Modifier::new(3, (3 - stage) as u32)
    } else {
        Modifier::new((3 + stage) as u32, 3)
    }
}

pub fn apply_stat_stage_multiplier(base_stat: u16, stage: i8) -> u16 {
    stat_stage_modifier(stage).apply(base_stat as u32).min(u16::MAX as u32) as u16
}

/// Calculate effective speed including stat stages, paralysis, abilities,
/// held items and Tailwind.
pub fn effective_speed(state: &BattleState, id: BattlerId) -> u16 {
    let Ok(battler) = state.battler(id) else {
        return 0;
    };
    let mut speed = apply_stat_stage_multiplier(battler.stats.speed, battler.stat_stage(StatType::Speed)) as u32;

    speed = ability_effect(battler.ability)
        .speed_modifier(battler, state.field.weather())
        .apply(speed);
    speed = item_effect(battler.item).speed_modifier(battler).apply(speed);

    if matches!(battler.status, Some(PrimaryStatus::Paralysis)) {
        speed /= 2;
    }
    if state.field.sides[id.side()].has(SideCondition::Tailwind) {
        speed *= 2;
    }

    speed.min(u16::MAX as u32) as u16
}

/// Attack stat used against `target`. Critical hits ignore the user's
/// negative stages.
pub fn effective_attack(
    user: &Battler,
    target: &Battler,
    move_data: &MoveData,
    critical: bool,
) -> u32 {
    let (base, stat) = match move_data.category {
        MoveCategory::Physical => (user.stats.attack, StatType::Attack),
        MoveCategory::Special => (user.stats.sp_attack, StatType::SpecialAttack),
        MoveCategory::Status => return 0,
    };

    let mut stage = user.stat_stage(stat);
    if critical && stage < 0 {
        stage = 0;
    }
    let mut attack = apply_stat_stage_multiplier(base, stage) as u32;

    attack = ability_effect(user.ability)
        .attack_modifier(user, move_data)
        .apply(attack);
    attack = item_effect(user.item).attack_modifier(move_data).apply(attack);
    attack = ability_effect(target.ability)
        .incoming_attack_modifier(move_data)
        .apply(attack);

    if move_data.move_type == PokemonType::Fire && user.volatiles.contains(VolatileKind::FlashFire)
    {
        attack = Modifier::ONE_AND_HALF.apply(attack);
    }

    attack.max(1)
}

/// Defense stat used against `move_data`. Critical hits ignore the target's
/// positive stages. Sandstorm raises Rock types' special defense.
pub fn effective_defense(
    state: &BattleState,
    target: &Battler,
    move_data: &MoveData,
    critical: bool,
) -> u32 {
    let (base, stat) = match move_data.category {
        MoveCategory::Physical => (target.stats.defense, StatType::Defense),
        MoveCategory::Special => (target.stats.sp_defense, StatType::SpecialDefense),
        MoveCategory::Status => return 1,
    };

    let mut stage = target.stat_stage(stat);
    if critical && stage > 0 {
        stage = 0;
    }
    let mut defense = apply_stat_stage_multiplier(base, stage) as u32;

    if move_data.category == MoveCategory::Special
        && state.field.weather() == Some(Weather::Sandstorm)
        && target.has_type(PokemonType::Rock)
    {
        defense = Modifier::ONE_AND_HALF.apply(defense);
    }

    defense.max(1)
}

/// Hit chance in percent, or `None` when the move skips the accuracy check.
pub fn hit_chance(
    state: &BattleState,
    user_id: BattlerId,
    target_id: BattlerId,
    move_data: &MoveData,
) -> Option<u8> {
    let user = state.battler(user_id).ok()?;
    let target = state.battler(target_id).ok()?;

    let base_accuracy = move_data.accuracy?;

    if ability_effect(user.ability).ignores_accuracy()
        || ability_effect(target.ability).ignores_accuracy()
    {
        return None;
    }
    if user
        .persistent
        .get(PersistentKind::LockOn)
        .and_then(|r| r.source())
        == Some(target_id)
    {
        return None;
    }

    if move_data.effects.contains(&MoveEffect::OHKO) {
        let bonus = user.level.saturating_sub(target.level);
        return Some(base_accuracy.saturating_add(bonus).min(100));
    }

    let stage = (user.stat_stage(StatType::Accuracy) - target.stat_stage(StatType::Evasion))
        .clamp(-6, 6);
    let mut accuracy = accuracy_stage_modifier(stage).apply(base_accuracy as u32);

    accuracy = ability_effect(user.ability)
        .accuracy_modifier(move_data)
        .apply(accuracy);
    accuracy = item_effect(user.item).accuracy_modifier().apply(accuracy);
    accuracy = ability_effect(target.ability)
        .evasion_modifier(state.field.weather())
        .apply(accuracy);

    if state.field.has_effect(FieldEffectKind::Gravity) {
        accuracy = Modifier::new(5, 3).apply(accuracy);
    }
    if state.field.has_effect(FieldEffectKind::Fog) {
        accuracy = Modifier::new(3, 5).apply(accuracy);
    }

    Some(accuracy.clamp(1, 100) as u8)
}

/// Critical-hit stage from the move, Focus Energy, ability and item.
pub fn crit_stage(user: &Battler, move_data: &MoveData) -> u8 {
    let mut stage = 0;
    if move_data.has_flag(MoveFlag::HighCrit) {
        stage += 1;
    }
    if user.volatiles.contains(VolatileKind::FocusEnergy) {
        stage += 2;
    }
    stage += ability_effect(user.ability).crit_stage_bonus();
    stage += item_effect(user.item).crit_stage_bonus();
    stage
}

pub fn crit_denominator(stage: u8) -> u32 {
    CRIT_DENOMINATORS[(stage as usize).min(CRIT_DENOMINATORS.len() - 1)]
}

/// Grounded battlers are hit by Ground moves and entry hazards.
pub fn is_grounded(state: &BattleState, id: BattlerId) -> bool {
    let Ok(battler) = state.battler(id) else {
        return false;
    };
    if state.field.has_effect(FieldEffectKind::Gravity) {
        return true;
    }
    if battler.has_item(HeldItem::IronBall) {
        return true;
    }
    !(battler.has_type(PokemonType::Flying)
        || battler.has_ability(Ability::Levitate)
        || battler.persistent.contains(PersistentKind::MagnetRise))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::field::EffectDuration;
    use crate::battle::tests::common::{single_battle, TestBattlerBuilder};
    use crate::data_store::{moves, species};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0, 100)]
    #[case(1, 150)]
    #[case(2, 200)]
    #[case(-1, 66)]
    #[case(-2, 50)]
    #[case(6, 400)]
    #[case(-6, 25)]
    fn test_stat_stage_multipliers(#[case] stage: i8, #[case] expected: u16) {
        assert_eq!(apply_stat_stage_multiplier(100, stage), expected);
    }

    #[test]
    fn test_accuracy_stage_table_is_not_linear() {
        assert_eq!(accuracy_stage_modifier(0).apply(90), 90);
        assert_eq!(accuracy_stage_modifier(1).apply(90), 120);
        assert_eq!(accuracy_stage_modifier(-1).apply(90), 67);
        assert_eq!(accuracy_stage_modifier(6).apply(90), 270);
        assert_eq!(accuracy_stage_modifier(-6).apply(90), 30);
    }

    #[test]
    fn test_accuracy_capped_at_maximum() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::THUNDER]),
            TestBattlerBuilder::new(species::GYARADOS, 50).with_moves(vec![moves::TACKLE]),
        );
        state.battlers[0].modify_stat_stage(StatType::Accuracy, 6);
        state.battlers[1].modify_stat_stage(StatType::Evasion, -6);
        state
            .field
            .set_effect(FieldEffectKind::Gravity, EffectDuration::Turns(5));
        let data = crate::data_store::ReferenceData::builtin().unwrap();
        let thunder = data.move_data(moves::THUNDER).unwrap();

        assert_eq!(hit_chance(&state, BattlerId(0), BattlerId(1), thunder), Some(100));
    }

    #[test]
    fn test_never_miss_moves_skip_check() {
        let state = single_battle(
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::TACKLE]),
            TestBattlerBuilder::new(species::GYARADOS, 50).with_moves(vec![moves::TACKLE]),
        );
        let data = crate::data_store::ReferenceData::builtin().unwrap();
        let struggle = data.move_data(moves::STRUGGLE).unwrap();
        assert_eq!(hit_chance(&state, BattlerId(0), BattlerId(1), struggle), None);
    }

    #[test]
    fn test_effective_speed_paralysis_halves() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::TACKLE]),
            TestBattlerBuilder::new(species::GYARADOS, 50).with_moves(vec![moves::TACKLE]),
        );
        let base = effective_speed(&state, BattlerId(0));
        state.battlers[0].status = Some(PrimaryStatus::Paralysis);
        assert_eq!(effective_speed(&state, BattlerId(0)), base / 2);
    }

    #[test]
    fn test_swift_swim_doubles_speed_in_rain() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::MAGIKARP, 50).with_moves(vec![moves::TACKLE]),
            TestBattlerBuilder::new(species::GYARADOS, 50).with_moves(vec![moves::TACKLE]),
        );
        let base = effective_speed(&state, BattlerId(0));
        state
            .field
            .set_weather(Weather::Rain, EffectDuration::Turns(5));
        assert_eq!(effective_speed(&state, BattlerId(0)), base * 2);
    }

    #[rstest]
    #[case(0, 16)]
    #[case(1, 8)]
    #[case(2, 4)]
    #[case(3, 3)]
    #[case(4, 2)]
    #[case(9, 2)]
    fn test_crit_table(#[case] stage: u8, #[case] denominator: u32) {
        assert_eq!(crit_denominator(stage), denominator);
    }
}
