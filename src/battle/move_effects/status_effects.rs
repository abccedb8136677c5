use super::{EffectContext, EffectResult};
use crate::battle::abilities::ability_effect;
use crate::battle::commands::{BattleCommand, TurnFlag};
use crate::battle::conditions::{EffectData, EffectRecord, VolatileKind};
use crate::battle::rng::TurnRng;
use crate::battle::state::{BattleState, FailureReason};
use crate::battle::status::{
    confusion_block_reason, inflict_confusion, inflict_status, status_block_reason,
};
use schema::{Gender, PokemonType, StatusType};

pub(super) fn apply_status_effect(
    status: StatusType,
    chance: u8,
    ctx: &EffectContext,
    state: &BattleState,
    rng: &mut TurnRng,
) -> EffectResult {
    if let Some(reason) = status_block_reason(state, ctx.target, status, Some(ctx.user)) {
        return EffectResult::Failed(reason);
    }
    if !rng.percent(chance, "secondary status") {
        return EffectResult::Continue(Vec::new());
    }
    EffectResult::Continue(inflict_status(ctx.target, status, rng))
}

pub(super) fn apply_confuse_effect(
    chance: u8,
    ctx: &EffectContext,
    state: &BattleState,
    rng: &mut TurnRng,
) -> EffectResult {
    if let Some(reason) = confusion_block_reason(state, ctx.target, ctx.user) {
        return EffectResult::Failed(reason);
    }
    if !state.is_alive(ctx.target) {
        return EffectResult::Failed(FailureReason::NoTarget);
    }
    if !rng.percent(chance, "confusion chance") {
        return EffectResult::Continue(Vec::new());
    }
    EffectResult::Continue(vec![inflict_confusion(ctx.target, rng)])
}

pub(super) fn apply_flinch_effect(
    chance: u8,
    ctx: &EffectContext,
    state: &BattleState,
    rng: &mut TurnRng,
) -> EffectResult {
    let Ok(target) = state.battler(ctx.target) else {
        return EffectResult::Continue(Vec::new());
    };
    if target.is_fainted() || ability_effect(target.ability).prevents_flinch() {
        return EffectResult::Continue(Vec::new());
    }
    if !rng.percent(chance, "flinch chance") {
        return EffectResult::Continue(Vec::new());
    }
    EffectResult::Continue(vec![BattleCommand::SetTurnFlag {
        target: ctx.target,
        flag: TurnFlag::Flinched,
    }])
}

pub(super) fn apply_infatuate_effect(ctx: &EffectContext, state: &BattleState) -> EffectResult {
    let (Ok(user), Ok(target)) = (state.battler(ctx.user), state.battler(ctx.target)) else {
        return EffectResult::Failed(FailureReason::NoTarget);
    };
    let opposite = matches!(
        (user.gender, target.gender),
        (Gender::Male, Gender::Female) | (Gender::Female, Gender::Male)
    );
    if !opposite {
        return EffectResult::Failed(FailureReason::Immune);
    }
    if target.volatiles.contains(VolatileKind::Infatuation) {
        return EffectResult::Failed(FailureReason::AlreadyAffected);
    }
    EffectResult::Continue(vec![BattleCommand::AddVolatile {
        target: ctx.target,
        kind: VolatileKind::Infatuation,
        record: EffectRecord::lasting(EffectData::Source(ctx.user)),
    }])
}

pub(super) fn apply_seed_effect(ctx: &EffectContext, state: &BattleState) -> EffectResult {
    let Ok(target) = state.battler(ctx.target) else {
        return EffectResult::Failed(FailureReason::NoTarget);
    };
    if target.has_type(PokemonType::Grass) {
        return EffectResult::Failed(FailureReason::Immune);
    }
    if target.volatiles.contains(VolatileKind::LeechSeed) {
        return EffectResult::Failed(FailureReason::AlreadyAffected);
    }
    EffectResult::Continue(vec![BattleCommand::AddVolatile {
        target: ctx.target,
        kind: VolatileKind::LeechSeed,
        record: EffectRecord::lasting(EffectData::Source(ctx.user)),
    }])
}
