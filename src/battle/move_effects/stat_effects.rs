use super::{EffectContext, EffectResult};
use crate::battle::abilities::ability_effect;
use crate::battle::commands::BattleCommand;
use crate::battle::rng::TurnRng;
use crate::battle::state::{BattleState, FailureReason};
use schema::{SideCondition, StatType, Target};

pub(super) fn apply_stat_change_effect(
    target: &Target,
    stat: StatType,
    stages: i8,
    chance: u8,
    ctx: &EffectContext,
    state: &BattleState,
    rng: &mut TurnRng,
) -> EffectResult {
    let target_id = ctx.target_id(target);
    let Ok(battler) = state.battler(target_id) else {
        return EffectResult::Failed(FailureReason::NoTarget);
    };
    if battler.is_fainted() {
        return EffectResult::Failed(FailureReason::NoTarget);
    }
    if !rng.percent(chance, "stat change chance") {
        return EffectResult::Continue(Vec::new());
    }

    let from_opponent = target_id != ctx.user && stages < 0;
    if from_opponent && state.field.sides[target_id.side()].has(SideCondition::Mist) {
        return EffectResult::Failed(FailureReason::MistBlocked);
    }
    if from_opponent && ability_effect(battler.ability).blocks_stat_drop(stat) {
        return EffectResult::Failed(FailureReason::Immune);
    }

    // a secondary change that cannot move the stage is dropped quietly
    let current = battler.stat_stage(stat);
    if !ctx.is_primary() && (current + stages).clamp(-6, 6) == current {
        return EffectResult::Continue(Vec::new());
    }

    EffectResult::Continue(vec![BattleCommand::ChangeStatStage {
        target: target_id,
        stat,
        delta: stages,
    }])
}

pub(super) fn apply_haze_effect() -> EffectResult {
    EffectResult::Continue(vec![BattleCommand::ResetAllStatStages])
}
