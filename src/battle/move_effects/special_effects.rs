use super::{EffectContext, EffectResult};
use crate::battle::abilities::ability_effect;
use crate::battle::commands::{BattleCommand, TurnFlag};
use crate::battle::conditions::{
    EffectData, EffectRecord, PersistentKind, PrimaryStatus, SemiInvulnerablePosition, VolatileKind,
};
use crate::battle::field::EffectDuration;
use crate::battle::rng::TurnRng;
use crate::battle::state::{
    BattleEvent, BattleState, BattlerId, DamageSource, FailureReason, HealSource, OrderShift,
};
use crate::battle::status::{confusion_block_reason, inflict_confusion};
use schema::{
    FieldEffectKind, MoveCategory, MoveData, MoveEffect, PokemonType, SideCondition, StatusType,
    Weather,
};

const ENCORE_TURNS: u8 = 3;
const TAUNT_TURNS: u8 = 3;
const DISABLE_TURNS: u8 = 4;
const PERISH_TURNS: u8 = 4;
const LOCK_ON_TURNS: u8 = 2;
const MAGNET_RISE_TURNS: u8 = 5;
const UPROAR_TURNS: u8 = 3;
const ROLLOUT_HITS: u8 = 5;
const SCREEN_TURNS: u8 = 5;
const TAILWIND_TURNS: u8 = 3;
const WEATHER_TURNS: u8 = 5;
const FIELD_EFFECT_TURNS: u8 = 5;
const REST_SLEEP_TURNS: u8 = 2;
/// Protect's odds stop halving after this many consecutive successes.
const MAX_PROTECT_CHAIN: u8 = 6;

fn started(target: BattlerId, kind: PersistentKind) -> BattleCommand {
    BattleCommand::EmitEvent(BattleEvent::EffectStarted { target, kind })
}

fn set_persistent(target: BattlerId, kind: PersistentKind, record: EffectRecord) -> BattleCommand {
    BattleCommand::SetPersistent {
        target,
        kind,
        record,
    }
}

fn remove_persistent(target: BattlerId, kind: PersistentKind) -> BattleCommand {
    BattleCommand::RemovePersistent {
        target,
        kind,
        announce: false,
    }
}

pub(super) fn apply_protect_special(
    endure: bool,
    ctx: &EffectContext,
    state: &BattleState,
    rng: &mut TurnRng,
) -> EffectResult {
    let Ok(user) = state.battler(ctx.user) else {
        return EffectResult::Failed(FailureReason::NoTarget);
    };
    let chain = user
        .persistent
        .get(PersistentKind::ProtectChain)
        .map(|r| r.count())
        .unwrap_or(0)
        .min(MAX_PROTECT_CHAIN);
    if !rng.chance(1, 1 << chain, "protect chain") {
        return EffectResult::Failed(FailureReason::Generic);
    }
    let flag = if endure {
        TurnFlag::Enduring
    } else {
        TurnFlag::Protected
    };
    EffectResult::Continue(vec![
        BattleCommand::SetTurnFlag {
            target: ctx.user,
            flag,
        },
        set_persistent(
            ctx.user,
            PersistentKind::ProtectChain,
            EffectRecord::lasting(EffectData::Count(chain + 1)),
        ),
        BattleCommand::EmitEvent(BattleEvent::Protecting {
            battler: ctx.user,
            endure,
        }),
    ])
}

pub(super) fn apply_substitute_special(ctx: &EffectContext, state: &BattleState) -> EffectResult {
    let Ok(user) = state.battler(ctx.user) else {
        return EffectResult::Failed(FailureReason::NoTarget);
    };
    if user.volatiles.contains(VolatileKind::Substitute) {
        return EffectResult::Failed(FailureReason::AlreadyAffected);
    }
    let cost = user.fraction_of_max_hp(1, 4);
    if user.current_hp() <= cost {
        return EffectResult::Failed(FailureReason::Generic);
    }
    EffectResult::Continue(vec![
        BattleCommand::Damage {
            target: ctx.user,
            amount: cost,
            source: DamageSource::Substitute,
        },
        BattleCommand::AddVolatile {
            target: ctx.user,
            kind: VolatileKind::Substitute,
            record: EffectRecord::lasting(EffectData::Hp(cost)),
        },
    ])
}

pub(super) fn apply_encore_special(ctx: &EffectContext, state: &BattleState) -> EffectResult {
    let Ok(target) = state.battler(ctx.target) else {
        return EffectResult::Failed(FailureReason::NoTarget);
    };
    if target.persistent.contains(PersistentKind::Encore) {
        return EffectResult::Failed(FailureReason::AlreadyAffected);
    }
    let Some(last) = target.last_move else {
        return EffectResult::Failed(FailureReason::Generic);
    };
    if !target.move_slot(last).is_some_and(|slot| slot.pp > 0) {
        return EffectResult::Failed(FailureReason::Generic);
    }
    EffectResult::Continue(vec![
        set_persistent(
            ctx.target,
            PersistentKind::Encore,
            EffectRecord::for_turns(ENCORE_TURNS, EffectData::Move(last)),
        ),
        started(ctx.target, PersistentKind::Encore),
    ])
}

pub(super) fn apply_taunt_special(ctx: &EffectContext, state: &BattleState) -> EffectResult {
    let Ok(target) = state.battler(ctx.target) else {
        return EffectResult::Failed(FailureReason::NoTarget);
    };
    if target.persistent.contains(PersistentKind::Taunt) {
        return EffectResult::Failed(FailureReason::AlreadyAffected);
    }
    EffectResult::Continue(vec![
        set_persistent(
            ctx.target,
            PersistentKind::Taunt,
            EffectRecord::for_turns(TAUNT_TURNS, EffectData::None),
        ),
        started(ctx.target, PersistentKind::Taunt),
    ])
}

pub(super) fn apply_disable_special(ctx: &EffectContext, state: &BattleState) -> EffectResult {
    let Ok(target) = state.battler(ctx.target) else {
        return EffectResult::Failed(FailureReason::NoTarget);
    };
    if target.persistent.contains(PersistentKind::Disable) {
        return EffectResult::Failed(FailureReason::AlreadyAffected);
    }
    let Some(last) = target.last_move else {
        return EffectResult::Failed(FailureReason::Generic);
    };
    EffectResult::Continue(vec![
        set_persistent(
            ctx.target,
            PersistentKind::Disable,
            EffectRecord::for_turns(DISABLE_TURNS, EffectData::Move(last)),
        ),
        started(ctx.target, PersistentKind::Disable),
    ])
}

pub(super) fn apply_focus_energy_special(ctx: &EffectContext, state: &BattleState) -> EffectResult {
    match state.battler(ctx.user) {
        Ok(user) if user.volatiles.contains(VolatileKind::FocusEnergy) => {
            EffectResult::Failed(FailureReason::AlreadyAffected)
        }
        Ok(_) => EffectResult::Continue(vec![BattleCommand::AddVolatile {
            target: ctx.user,
            kind: VolatileKind::FocusEnergy,
            record: EffectRecord::lasting(EffectData::None),
        }]),
        Err(_) => EffectResult::Failed(FailureReason::NoTarget),
    }
}

/// Everyone on the field without a perish count gets one.
pub(super) fn apply_perish_song_special(state: &BattleState) -> EffectResult {
    let mut commands = Vec::new();
    for id in state.live_ids() {
        let Ok(battler) = state.battler(id) else {
            continue;
        };
        if battler.persistent.contains(PersistentKind::PerishSong) {
            continue;
        }
        commands.push(set_persistent(
            id,
            PersistentKind::PerishSong,
            EffectRecord::for_turns(PERISH_TURNS, EffectData::None),
        ));
        commands.push(started(id, PersistentKind::PerishSong));
    }
    if commands.is_empty() {
        return EffectResult::Failed(FailureReason::Generic);
    }
    EffectResult::Continue(commands)
}

pub(super) fn apply_charge_special(ctx: &EffectContext) -> EffectResult {
    EffectResult::Continue(vec![
        set_persistent(
            ctx.user,
            PersistentKind::Charge,
            EffectRecord::lasting(EffectData::None),
        ),
        started(ctx.user, PersistentKind::Charge),
    ])
}

pub(super) fn apply_lock_on_special(ctx: &EffectContext, state: &BattleState) -> EffectResult {
    if !state.is_alive(ctx.target) || ctx.target == ctx.user {
        return EffectResult::Failed(FailureReason::NoTarget);
    }
    EffectResult::Continue(vec![
        set_persistent(
            ctx.user,
            PersistentKind::LockOn,
            EffectRecord::for_turns(LOCK_ON_TURNS, EffectData::Source(ctx.target)),
        ),
        started(ctx.user, PersistentKind::LockOn),
    ])
}

pub(super) fn apply_magnet_rise_special(ctx: &EffectContext, state: &BattleState) -> EffectResult {
    let Ok(user) = state.battler(ctx.user) else {
        return EffectResult::Failed(FailureReason::NoTarget);
    };
    if user.persistent.contains(PersistentKind::MagnetRise) {
        return EffectResult::Failed(FailureReason::AlreadyAffected);
    }
    if state.field.has_effect(FieldEffectKind::Gravity) {
        return EffectResult::Failed(FailureReason::Generic);
    }
    EffectResult::Continue(vec![
        set_persistent(
            ctx.user,
            PersistentKind::MagnetRise,
            EffectRecord::for_turns(MAGNET_RISE_TURNS, EffectData::None),
        ),
        started(ctx.user, PersistentKind::MagnetRise),
    ])
}

pub(super) fn apply_weather_special(weather: Weather, state: &BattleState) -> EffectResult {
    if state.field.weather() == Some(weather) {
        return EffectResult::Failed(FailureReason::Generic);
    }
    EffectResult::Continue(vec![BattleCommand::SetWeather {
        weather,
        duration: EffectDuration::Turns(WEATHER_TURNS),
    }])
}

/// Screens and guards go on the user's side, hazards on the opposing side.
pub(super) fn apply_side_condition_special(
    condition: SideCondition,
    ctx: &EffectContext,
    state: &BattleState,
) -> EffectResult {
    let side = if condition.is_hazard() {
        1 - ctx.user.side()
    } else {
        ctx.user.side()
    };
    let side_state = &state.field.sides[side];
    let full = if condition.is_hazard() {
        side_state.layers(condition) >= condition.max_layers()
    } else {
        side_state.has(condition)
    };
    if full {
        return EffectResult::Failed(FailureReason::Generic);
    }
    let duration = match condition {
        SideCondition::Tailwind => EffectDuration::Turns(TAILWIND_TURNS),
        c if c.is_hazard() => EffectDuration::UntilReplaced,
        _ => EffectDuration::Turns(SCREEN_TURNS),
    };
    EffectResult::Continue(vec![BattleCommand::AddSideCondition {
        side,
        condition,
        duration,
    }])
}

pub(super) fn apply_field_effect_special(effect: FieldEffectKind, state: &BattleState) -> EffectResult {
    let active = state.field.has_effect(effect);
    match effect {
        // a second Trick Room restores normal order
        FieldEffectKind::TrickRoom if active => {
            EffectResult::Continue(vec![BattleCommand::RemoveFieldEffect { effect }])
        }
        _ if active => EffectResult::Failed(FailureReason::Generic),
        FieldEffectKind::Gravity => {
            let mut commands = vec![BattleCommand::SetFieldEffect {
                effect,
                duration: EffectDuration::Turns(FIELD_EFFECT_TURNS),
            }];
            for id in state.live_ids() {
                if state
                    .battler(id)
                    .is_ok_and(|b| b.persistent.contains(PersistentKind::MagnetRise))
                {
                    commands.push(BattleCommand::RemovePersistent {
                        target: id,
                        kind: PersistentKind::MagnetRise,
                        announce: true,
                    });
                }
            }
            EffectResult::Continue(commands)
        }
        FieldEffectKind::TrickRoom => EffectResult::Continue(vec![BattleCommand::SetFieldEffect {
            effect,
            duration: EffectDuration::Turns(FIELD_EFFECT_TURNS),
        }]),
        FieldEffectKind::Uproar | FieldEffectKind::Fog => {
            EffectResult::Continue(vec![BattleCommand::SetFieldEffect {
                effect,
                duration: EffectDuration::UntilReplaced,
            }])
        }
    }
}

pub(super) fn apply_heal_special(
    percentage: u8,
    ctx: &EffectContext,
    state: &BattleState,
) -> EffectResult {
    match state.battler(ctx.user) {
        Ok(user) if user.current_hp() < user.max_hp() => {
            EffectResult::Continue(vec![BattleCommand::Heal {
                target: ctx.user,
                amount: user.fraction_of_max_hp(percentage as u16, 100),
                source: HealSource::Move(ctx.move_data.id),
            }])
        }
        _ => EffectResult::Failed(FailureReason::Generic),
    }
}

pub(super) fn apply_rest_special(ctx: &EffectContext, state: &BattleState) -> EffectResult {
    let Ok(user) = state.battler(ctx.user) else {
        return EffectResult::Failed(FailureReason::NoTarget);
    };
    if user.current_hp() == user.max_hp() || matches!(user.status, Some(PrimaryStatus::Sleep { .. }))
    {
        return EffectResult::Failed(FailureReason::Generic);
    }
    if !ability_effect(user.ability).on_status_apply_attempt(StatusType::Sleep) {
        return EffectResult::Failed(FailureReason::Immune);
    }
    if state.field.has_effect(FieldEffectKind::Uproar) {
        return EffectResult::Failed(FailureReason::Uproar);
    }
    EffectResult::Continue(vec![
        BattleCommand::CureStatus { target: ctx.user },
        BattleCommand::SetStatus {
            target: ctx.user,
            status: PrimaryStatus::Sleep {
                turns_remaining: REST_SLEEP_TURNS,
            },
        },
        BattleCommand::Heal {
            target: ctx.user,
            amount: user.max_hp(),
            source: HealSource::Move(ctx.move_data.id),
        },
    ])
}

pub(super) fn apply_reorder_special(shift: OrderShift, ctx: &EffectContext) -> EffectResult {
    if ctx.target == ctx.user {
        return EffectResult::Failed(FailureReason::Generic);
    }
    EffectResult::Continue(vec![BattleCommand::Reorder {
        user: ctx.user,
        target: ctx.target,
        shift,
    }])
}

/// First turn of a charging move, unless the weather lets it fire at once.
pub(super) fn apply_charge_up_special(
    skip_in: Option<Weather>,
    user: BattlerId,
    move_data: &MoveData,
    state: &BattleState,
) -> Option<EffectResult> {
    if skip_in.is_some() && state.field.weather() == skip_in {
        return None;
    }
    Some(EffectResult::Skip(vec![
        set_persistent(
            user,
            PersistentKind::Charging,
            EffectRecord::lasting(EffectData::Move(move_data.id)),
        ),
        BattleCommand::EmitEvent(BattleEvent::MoveCharging {
            user,
            move_id: move_data.id,
        }),
    ]))
}

pub(super) fn apply_semi_invulnerable_special(
    position: SemiInvulnerablePosition,
    user: BattlerId,
    move_data: &MoveData,
    state: &BattleState,
) -> Option<EffectResult> {
    if position == SemiInvulnerablePosition::InAir && state.field.has_effect(FieldEffectKind::Gravity)
    {
        return Some(EffectResult::Failed(FailureReason::Generic));
    }
    Some(EffectResult::Skip(vec![
        set_persistent(
            user,
            PersistentKind::SemiInvulnerable,
            EffectRecord::lasting(EffectData::Position(position, move_data.id)),
        ),
        BattleCommand::EmitEvent(BattleEvent::MoveCharging {
            user,
            move_id: move_data.id,
        }),
    ]))
}

pub(super) fn fake_out_failure(ctx: &EffectContext, state: &BattleState) -> Option<FailureReason> {
    match state.battler(ctx.user) {
        Ok(user) if user.turns_active > 0 => Some(FailureReason::NotFirstTurn),
        _ => None,
    }
}

pub(super) fn apply_explode_special(user: BattlerId, state: &BattleState) -> Vec<BattleCommand> {
    match state.battler(user) {
        Ok(battler) if !battler.is_fainted() => vec![BattleCommand::Damage {
            target: user,
            amount: battler.current_hp(),
            source: DamageSource::Explosion,
        }],
        _ => Vec::new(),
    }
}

pub(super) fn apply_exhaust_special(user: BattlerId) -> Vec<BattleCommand> {
    vec![set_persistent(
        user,
        PersistentKind::Recharge,
        EffectRecord::lasting(EffectData::None),
    )]
}

/// Starts a two to three turn lock on first use and counts it down on each
/// later use. The lock ends in confusion.
pub(super) fn apply_rampage_special(
    user: BattlerId,
    move_data: &MoveData,
    state: &BattleState,
    rng: &mut TurnRng,
) -> Vec<BattleCommand> {
    let Ok(battler) = state.battler(user) else {
        return Vec::new();
    };
    if battler.is_fainted() {
        return Vec::new();
    }
    let remaining = match battler.persistent.get(PersistentKind::Rampage) {
        Some(record) => record.remaining.unwrap_or(1).saturating_sub(1),
        None => rng.next_in_range(2, 3, "rampage length") as u8 - 1,
    };
    if remaining > 0 {
        return vec![set_persistent(
            user,
            PersistentKind::Rampage,
            EffectRecord::for_turns(remaining, EffectData::Move(move_data.id)),
        )];
    }
    let mut commands = vec![BattleCommand::RemovePersistent {
        target: user,
        kind: PersistentKind::Rampage,
        announce: true,
    }];
    if confusion_block_reason(state, user, user).is_none() {
        commands.push(inflict_confusion(user, rng));
    }
    commands
}

pub(super) fn apply_uproar_special(
    user: BattlerId,
    move_data: &MoveData,
    state: &BattleState,
) -> Vec<BattleCommand> {
    let Ok(battler) = state.battler(user) else {
        return Vec::new();
    };
    if battler.persistent.contains(PersistentKind::UproarLock) || battler.is_fainted() {
        return Vec::new();
    }
    let mut commands = vec![
        set_persistent(
            user,
            PersistentKind::UproarLock,
            EffectRecord::for_turns(UPROAR_TURNS, EffectData::Move(move_data.id)),
        ),
        started(user, PersistentKind::UproarLock),
    ];
    if !state.field.has_effect(FieldEffectKind::Uproar) {
        commands.push(BattleCommand::SetFieldEffect {
            effect: FieldEffectKind::Uproar,
            duration: EffectDuration::UntilReplaced,
        });
    }
    for id in state.live_ids() {
        if state
            .battler(id)
            .is_ok_and(|b| matches!(b.status, Some(PrimaryStatus::Sleep { .. })))
        {
            commands.push(BattleCommand::CureStatus { target: id });
        }
    }
    commands
}

pub(super) fn apply_rollout_chain(
    user: BattlerId,
    state: &BattleState,
    connected: bool,
) -> Vec<BattleCommand> {
    let Ok(battler) = state.battler(user) else {
        return Vec::new();
    };
    let hits = battler
        .persistent
        .get(PersistentKind::Rollout)
        .map(|r| r.count())
        .unwrap_or(0)
        + 1;
    if !connected || hits >= ROLLOUT_HITS || battler.is_fainted() {
        if battler.persistent.contains(PersistentKind::Rollout) {
            return vec![remove_persistent(user, PersistentKind::Rollout)];
        }
        return Vec::new();
    }
    vec![set_persistent(
        user,
        PersistentKind::Rollout,
        EffectRecord::lasting(EffectData::Count(hits)),
    )]
}

pub(super) fn apply_fury_cutter_chain(
    user: BattlerId,
    state: &BattleState,
    connected: bool,
) -> Vec<BattleCommand> {
    let Ok(battler) = state.battler(user) else {
        return Vec::new();
    };
    if !connected {
        if battler.persistent.contains(PersistentKind::FuryCutter) {
            return vec![remove_persistent(user, PersistentKind::FuryCutter)];
        }
        return Vec::new();
    }
    let chain = battler
        .persistent
        .get(PersistentKind::FuryCutter)
        .map(|r| r.count())
        .unwrap_or(0);
    vec![set_persistent(
        user,
        PersistentKind::FuryCutter,
        EffectRecord::lasting(EffectData::Count((chain + 1).min(4))),
    )]
}

/// Chains that only last while the same move keeps being used, plus the
/// Charge boost spent by an Electric attack.
pub(super) fn reset_broken_chains(
    user: BattlerId,
    move_data: &MoveData,
    state: &BattleState,
) -> Vec<BattleCommand> {
    let Ok(battler) = state.battler(user) else {
        return Vec::new();
    };
    let uses = |effect: &MoveEffect| move_data.effects.contains(effect);
    let mut commands = Vec::new();

    if !uses(&MoveEffect::FuryCutter) && battler.persistent.contains(PersistentKind::FuryCutter) {
        commands.push(remove_persistent(user, PersistentKind::FuryCutter));
    }
    if !uses(&MoveEffect::Rollout) && battler.persistent.contains(PersistentKind::Rollout) {
        commands.push(remove_persistent(user, PersistentKind::Rollout));
    }
    if !uses(&MoveEffect::Rampage) && battler.persistent.contains(PersistentKind::Rampage) {
        commands.push(remove_persistent(user, PersistentKind::Rampage));
    }

    let protecting = uses(&MoveEffect::Protect) || uses(&MoveEffect::Endure);
    let flags = state.flags.turn(user);
    let protected = flags.protected || flags.enduring;
    if (!protecting || !protected) && battler.persistent.contains(PersistentKind::ProtectChain) {
        commands.push(remove_persistent(user, PersistentKind::ProtectChain));
    }

    if move_data.move_type == PokemonType::Electric
        && move_data.category != MoveCategory::Status
        && battler.persistent.contains(PersistentKind::Charge)
    {
        commands.push(remove_persistent(user, PersistentKind::Charge));
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::{single_battle, TestBattlerBuilder};
    use crate::data_store::{moves, species, ReferenceData};
    use pretty_assertions::assert_eq;

    fn state() -> BattleState {
        single_battle(
            TestBattlerBuilder::new(species::SNORLAX, 50).with_moves(vec![moves::PROTECT]),
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::TACKLE]),
        )
    }

    #[test]
    fn test_protect_chain_halves_odds() {
        let mut state = state();
        let data = ReferenceData::builtin().unwrap();
        let protect = data.move_data(moves::PROTECT).unwrap();
        let ctx = EffectContext::new(BattlerId(0), BattlerId(0), protect);

        // first use never draws
        let mut rng = TurnRng::new_for_test(vec![]);
        assert!(matches!(
            apply_protect_special(false, &ctx, &state, &mut rng),
            EffectResult::Continue(_)
        ));

        state.battlers[0].persistent.insert(
            PersistentKind::ProtectChain,
            EffectRecord::lasting(EffectData::Count(1)),
        );
        let mut rng = TurnRng::new_for_test(vec![2]);
        assert_eq!(
            apply_protect_special(false, &ctx, &state, &mut rng),
            EffectResult::Failed(FailureReason::Generic)
        );
    }

    #[test]
    fn test_substitute_needs_more_than_a_quarter() {
        let mut state = state();
        let data = ReferenceData::builtin().unwrap();
        let substitute = data.move_data(moves::SUBSTITUTE).unwrap();
        let ctx = EffectContext::new(BattlerId(0), BattlerId(0), substitute);
        let quarter = state.battlers[0].fraction_of_max_hp(1, 4);
        state.battlers[0].set_hp(quarter);
        assert_eq!(
            apply_substitute_special(&ctx, &state),
            EffectResult::Failed(FailureReason::Generic)
        );
    }

    #[test]
    fn test_trick_room_toggles_off() {
        let mut state = state();
        state
            .field
            .set_effect(FieldEffectKind::TrickRoom, EffectDuration::Turns(3));
        assert_eq!(
            apply_field_effect_special(FieldEffectKind::TrickRoom, &state),
            EffectResult::Continue(vec![BattleCommand::RemoveFieldEffect {
                effect: FieldEffectKind::TrickRoom
            }])
        );
    }

    #[test]
    fn test_rampage_ends_in_confusion() {
        let mut state = state();
        let data = ReferenceData::builtin().unwrap();
        let outrage = data.move_data(moves::OUTRAGE).unwrap();
        state.battlers[0].persistent.insert(
            PersistentKind::Rampage,
            EffectRecord::for_turns(1, EffectData::Move(moves::OUTRAGE)),
        );
        let mut rng = TurnRng::new_for_test(vec![3]);
        let commands = apply_rampage_special(BattlerId(0), outrage, &state, &mut rng);
        assert_eq!(commands.len(), 2);
        assert!(matches!(
            commands[1],
            BattleCommand::AddVolatile {
                kind: VolatileKind::Confusion,
                ..
            }
        ));
    }

    #[test]
    fn test_rest_fails_at_full_hp() {
        let state = state();
        let data = ReferenceData::builtin().unwrap();
        let rest = data.move_data(moves::REST).unwrap();
        let ctx = EffectContext::new(BattlerId(0), BattlerId(0), rest);
        assert_eq!(
            apply_rest_special(&ctx, &state),
            EffectResult::Failed(FailureReason::Generic)
        );
    }
}
