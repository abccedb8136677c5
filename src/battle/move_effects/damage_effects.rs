use super::EffectContext;
use crate::battle::commands::BattleCommand;
use crate::battle::flags::DamageRecord;
use crate::battle::rng::TurnRng;
use crate::battle::state::{BattleState, BattlerId, DamageSource, FailureReason, HealSource};
use schema::{MoveData, MoveEffect};

/// Damage for moves that bypass the damage formula.
pub(super) fn fixed_damage_for(
    effect: &MoveEffect,
    ctx: &EffectContext,
    state: &BattleState,
) -> Option<u16> {
    match effect {
        MoveEffect::SetDamage(amount) => Some(*amount),
        MoveEffect::LevelDamage => state.battler(ctx.user).ok().map(|b| b.level as u16),
        MoveEffect::OHKO => state.battler(ctx.target).ok().map(|b| b.current_hp()),
        MoveEffect::Counter | MoveEffect::MirrorCoat => counter_damage(effect, ctx, state),
        _ => None,
    }
}

fn countered_record(effect: &MoveEffect, user: BattlerId, state: &BattleState) -> Option<DamageRecord> {
    let flags = state.flags.turn(user);
    let record = match effect {
        MoveEffect::Counter => flags.physical_damage,
        MoveEffect::MirrorCoat => flags.special_damage,
        _ => None,
    }?;
    (record.amount > 0 && !record.source.is_ally_of(user)).then_some(record)
}

/// Twice the last hit of the matching category taken from an opponent this
/// turn.
pub(super) fn counter_damage(
    effect: &MoveEffect,
    ctx: &EffectContext,
    state: &BattleState,
) -> Option<u16> {
    countered_record(effect, ctx.user, state).map(|r| r.amount.saturating_mul(2))
}

/// The battler a Counter style move hits back at, if anyone hit the user.
pub fn counter_target(move_data: &MoveData, user: BattlerId, state: &BattleState) -> Option<BattlerId> {
    move_data.effects.iter().find_map(|effect| {
        countered_record(effect, user, state)
            .map(|r| r.source)
            .filter(|source| state.is_alive(*source))
    })
}

pub(super) fn ohko_failure(ctx: &EffectContext, state: &BattleState) -> Option<FailureReason> {
    let (Ok(user), Ok(target)) = (state.battler(ctx.user), state.battler(ctx.target)) else {
        return Some(FailureReason::NoTarget);
    };
    (target.level > user.level).then_some(FailureReason::Immune)
}

/// Fixed counts need no draw. Two to five hits land 2 and 3 times with
/// 3/8 chance each and 4 and 5 times with 1/8 each.
pub(super) fn roll_hit_count(min: u8, max: u8, rng: &mut TurnRng) -> u8 {
    if min >= max {
        return min;
    }
    if (min, max) == (2, 5) {
        return match rng.next_in_range(1, 8, "multi-hit count") {
            1..=3 => 2,
            4..=6 => 3,
            7 => 4,
            _ => 5,
        };
    }
    rng.next_in_range(min as u32, max as u32, "multi-hit count") as u8
}

pub(super) fn apply_recoil_effect(
    percentage: u8,
    ctx: &EffectContext,
    state: &BattleState,
    damage_dealt: u16,
) -> Vec<BattleCommand> {
    if !state.is_alive(ctx.user) {
        return Vec::new();
    }
    let amount = ((damage_dealt as u32 * percentage as u32 / 100) as u16).max(1);
    vec![BattleCommand::Damage {
        target: ctx.user,
        amount,
        source: DamageSource::Recoil,
    }]
}

pub(super) fn apply_drain_effect(
    percentage: u8,
    ctx: &EffectContext,
    state: &BattleState,
    damage_dealt: u16,
) -> Vec<BattleCommand> {
    match state.battler(ctx.user) {
        Ok(user) if !user.is_fainted() && user.current_hp() < user.max_hp() => {
            let amount = ((damage_dealt as u32 * percentage as u32 / 100) as u16).max(1);
            vec![BattleCommand::Heal {
                target: ctx.user,
                amount,
                source: HealSource::Drain,
            }]
        }
        _ => Vec::new(),
    }
}
