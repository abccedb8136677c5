//! The move execution pipeline.
//!
//! One call to [`execute_move`] carries a single battler's move from the
//! legality checks through targeting, accuracy, critical hits, damage,
//! secondary effects, reactive hooks, faint checks and bookkeeping. Every
//! stage reads the state, builds commands and executes them before the next
//! stage looks at the state again, so later stages always see the effects of
//! earlier ones.

use crate::battle::abilities::{ability_effect, HitContext};
use crate::battle::action_stack::ActionQueue;
use crate::battle::calculators::{calculate_damage, type_effectiveness, DamageRoll};
use crate::battle::commands::{execute_command_batch, BattleCommand, TurnFlag};
use crate::battle::conditions::{
    EffectData, EffectRecord, PersistentKind, SemiInvulnerablePosition, VolatileKind,
};
use crate::battle::flags::DamageRecord;
use crate::battle::items::item_effect;
use crate::battle::move_effects::{
    counter_target, BattleMoveDataExt, BattleMoveEffectExt, EffectContext, EffectResult,
};
use crate::battle::rng::TurnRng;
use crate::battle::state::{
    BattleEvent, BattleState, BattlerId, Effectiveness, EventBus, FailureReason,
};
use crate::battle::stats::{crit_denominator, crit_stage, hit_chance};
use crate::battle::status::pre_action_checks;
use crate::battler::Battler;
use crate::data_store::{moves, ReferenceData};
use crate::errors::{BattleResult, ExecutionError};
use schema::{MoveData, MoveFlag, MoveId, MoveTarget, IMMUNE, NEUTRAL};
use tracing::debug;

/// Everything a move needs while it resolves.
pub struct TurnEnv<'a> {
    pub state: &'a mut BattleState,
    pub data: &'a ReferenceData,
    pub rng: &'a mut TurnRng,
    pub bus: &'a mut EventBus,
    pub queue: &'a mut ActionQueue,
    pub roll: DamageRoll,
}

impl TurnEnv<'_> {
    pub fn run(&mut self, commands: Vec<BattleCommand>) -> Result<(), ExecutionError> {
        execute_command_batch(commands, self.state, self.bus, self.queue)
    }

    pub fn emit(&mut self, event: BattleEvent) {
        self.bus.push(event);
    }

    /// Mark every battler that has reached 0 HP as fainted. A battler is
    /// only ever announced once.
    pub fn check_faints(&mut self) -> Result<(), ExecutionError> {
        let newly_fainted: Vec<BattleCommand> = self
            .state
            .ids()
            .filter(|id| {
                self.state
                    .battler(*id)
                    .is_ok_and(|b| b.is_fainted() && !b.fainted)
            })
            .map(|target| BattleCommand::Faint { target })
            .collect();
        self.run(newly_fainted)
    }
}

/// A move the battler is bound to by an ongoing effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockedMove {
    pub move_id: MoveId,
    /// The lock this use of the move releases, for the second turn of
    /// charging and semi-invulnerable moves.
    pub releases: Option<PersistentKind>,
}

pub fn locked_move(battler: &Battler) -> Option<LockedMove> {
    for kind in [PersistentKind::Charging, PersistentKind::SemiInvulnerable] {
        if let Some(move_id) = battler.persistent.get(kind).and_then(|r| r.move_id()) {
            return Some(LockedMove {
                move_id,
                releases: Some(kind),
            });
        }
    }
    for kind in [PersistentKind::Rampage, PersistentKind::UproarLock] {
        if let Some(move_id) = battler.persistent.get(kind).and_then(|r| r.move_id()) {
            return Some(LockedMove {
                move_id,
                releases: None,
            });
        }
    }
    if battler.persistent.contains(PersistentKind::Rollout)
        || battler.persistent.contains(PersistentKind::Recharge)
    {
        return Some(LockedMove {
            move_id: battler.last_move.unwrap_or(moves::STRUGGLE),
            releases: None,
        });
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MovePlan {
    move_id: MoveId,
    /// Locked moves and Struggle skip the choice checks and cost no PP.
    forced: bool,
    releases: Option<PersistentKind>,
}

impl MovePlan {
    fn chosen(move_id: MoveId) -> Self {
        Self {
            move_id,
            forced: false,
            releases: None,
        }
    }

    fn struggle() -> Self {
        Self {
            move_id: moves::STRUGGLE,
            forced: true,
            releases: None,
        }
    }
}

fn plan_move(battler: &Battler, requested: MoveId) -> MovePlan {
    if let Some(locked) = locked_move(battler) {
        return MovePlan {
            move_id: locked.move_id,
            forced: true,
            releases: locked.releases,
        };
    }
    if requested == moves::STRUGGLE || !battler.has_usable_move() {
        return MovePlan::struggle();
    }
    if let Some(encored) = battler
        .persistent
        .get(PersistentKind::Encore)
        .and_then(|r| r.move_id())
    {
        return match battler.move_slot(encored) {
            Some(slot) if slot.pp > 0 => MovePlan::chosen(encored),
            _ => MovePlan::struggle(),
        };
    }
    MovePlan::chosen(requested)
}

/// Expand the move's target kind into live battlers.
pub fn resolve_targets(
    state: &BattleState,
    user: BattlerId,
    move_data: &MoveData,
    chosen: Option<BattlerId>,
    rng: &mut TurnRng,
) -> Vec<BattlerId> {
    match move_data.target {
        MoveTarget::User | MoveTarget::UserSide | MoveTarget::OpponentSide | MoveTarget::Field => {
            vec![user]
        }
        MoveTarget::AllOpponents => state.live_opponents(user),
        MoveTarget::AllOthers => state
            .live_ids()
            .into_iter()
            .filter(|id| *id != user)
            .collect(),
        MoveTarget::RandomOpponent => {
            let foes = state.live_opponents(user);
            if foes.len() > 1 {
                let pick = rng.next_in_range(0, foes.len() as u32 - 1, "random target");
                vec![foes[pick as usize]]
            } else {
                foes
            }
        }
        MoveTarget::Selected => {
            if let Some(source) = counter_target(move_data, user, state) {
                return vec![source];
            }
            match chosen.filter(|t| *t != user && state.is_alive(*t)) {
                Some(target) => vec![target],
                // the chosen target is gone; retarget the first foe still standing
                None => state.live_opponents(user).into_iter().take(1).collect(),
            }
        }
    }
}

fn failed(battler: BattlerId, reason: FailureReason) -> BattleCommand {
    BattleCommand::EmitEvent(BattleEvent::Failed { battler, reason })
}

fn move_failed(user: BattlerId) -> BattleCommand {
    BattleCommand::SetTurnFlag {
        target: user,
        flag: TurnFlag::MoveFailed,
    }
}

/// Execute one battler's move. A fainted user is skipped without events.
pub fn execute_move(
    env: &mut TurnEnv,
    user: BattlerId,
    requested: MoveId,
    chosen_target: Option<BattlerId>,
) -> BattleResult<()> {
    if !env.state.is_alive(user) {
        debug!(battler = %user, "skipping fainted battler");
        return Ok(());
    }
    env.state.flags.begin_self_turn(user);
    env.run(vec![BattleCommand::SetTurnFlag {
        target: user,
        flag: TurnFlag::Acted,
    }])?;

    let plan = plan_move(env.state.battler(user)?, requested);
    let data = env.data;
    let move_data = data.move_data(plan.move_id)?;
    debug!(battler = %user, move_id = %move_data.id, forced = plan.forced, "executing move");

    let mut setup = Vec::new();
    if let Some(kind) = plan.releases {
        setup.push(BattleCommand::RemovePersistent {
            target: user,
            kind,
            announce: false,
        });
    }
    if plan.move_id == moves::STRUGGLE {
        setup.push(BattleCommand::SetTurnFlag {
            target: user,
            flag: TurnFlag::Struggling,
        });
    }
    env.run(setup)?;

    // Stage 1: legality
    let checks = pre_action_checks(env.state, user, move_data, plan.forced, env.rng);
    env.run(checks.commands)?;
    if !checks.proceed {
        debug!(battler = %user, "move prevented");
        let released = broken_locks(env.state, user);
        env.run(released)?;
        env.check_faints()?;
        return Ok(());
    }

    env.emit(BattleEvent::MoveUsed {
        user,
        move_id: move_data.id,
    });

    if plan.releases.is_none() {
        match move_data.charge_turn(user, env.state) {
            Some(EffectResult::Skip(commands)) => {
                env.run(commands)?;
                spend_pp(env, user, move_data, &[], plan)?;
                return finish_move(env, user, move_data, true);
            }
            Some(EffectResult::Failed(reason)) => {
                env.run(vec![failed(user, reason), move_failed(user)])?;
                spend_pp(env, user, move_data, &[], plan)?;
                return finish_move(env, user, move_data, false);
            }
            Some(EffectResult::Continue(commands)) => env.run(commands)?,
            None => {}
        }
    }

    // Stage 2: targets
    let targets = resolve_targets(env.state, user, move_data, chosen_target, env.rng);
    spend_pp(env, user, move_data, &targets, plan)?;
    if targets.is_empty() {
        env.run(vec![failed(user, FailureReason::NoTarget), move_failed(user)])?;
        return finish_move(env, user, move_data, false);
    }

    let hits = if move_data.is_damaging() {
        move_data.hit_count(env.rng)
    } else {
        1
    };
    let spread = targets.len() > 1;

    // Stages 3 to 8, target by target
    let mut connected = false;
    let mut total_damage: u16 = 0;
    let mut last_target = targets[0];
    for target in targets {
        if !env.state.is_alive(target) {
            continue;
        }
        last_target = target;
        let ctx = EffectContext::new(user, target, move_data);
        if let Some(dealt) = resolve_target(env, &ctx, hits, spread)? {
            connected = true;
            total_damage = total_damage.saturating_add(dealt);
        }
    }

    // user side reactive hooks run once per move
    if total_damage > 0 && env.state.is_alive(user) {
        let hit = HitContext {
            user,
            target: last_target,
            move_data,
            damage: total_damage,
        };
        let battler = env.state.battler(user)?;
        let (ability, item) = (battler.ability, battler.item);
        let commands = ability_effect(ability).on_hit_as_user(&hit, env.state, env.rng);
        env.run(commands)?;
        let commands = item_effect(item).on_hit_as_user(&hit, env.state);
        env.run(commands)?;
    }

    // Stage 9: faints
    env.check_faints()?;
    let end = move_data.apply_move_end_effects(user, env.state, env.rng, connected);
    env.run(end)?;
    env.check_faints()?;

    // Stage 10: bookkeeping
    finish_move(env, user, move_data, connected)
}

/// Accuracy through reactive hooks for one target. Returns the damage dealt
/// if the move connected, `None` if it missed or failed against the target.
fn resolve_target(
    env: &mut TurnEnv,
    ctx: &EffectContext,
    hits: u8,
    spread: bool,
) -> BattleResult<Option<u16>> {
    let (user, target, move_data) = (ctx.user, ctx.target, ctx.move_data);
    // a spread move stops once an earlier target's reaction knocks the user out
    if !env.state.is_alive(user) {
        return Ok(None);
    }
    let aimed_elsewhere = target != user;

    if aimed_elsewhere
        && move_data.has_flag(MoveFlag::Protectable)
        && env.state.flags.turn(target).protected
    {
        env.run(vec![failed(target, FailureReason::Protected)])?;
        return Ok(None);
    }
    if aimed_elsewhere && out_of_reach(env.state, ctx) {
        env.emit(BattleEvent::Miss {
            user,
            target,
            move_id: move_data.id,
        });
        return Ok(None);
    }
    if aimed_elsewhere {
        let absorb = ability_effect(env.state.battler(target)?.ability).type_immunity(
            target,
            env.state,
            move_data,
        );
        if let Some(commands) = absorb {
            env.run(commands)?;
            return Ok(None);
        }
    }
    if move_data.is_damaging() && type_effectiveness(env.state, target, move_data) == IMMUNE {
        env.emit(BattleEvent::NoEffect {
            user,
            target,
            move_id: move_data.id,
        });
        return Ok(None);
    }
    if let Some(reason) = move_data.pre_hit_failure(ctx, env.state) {
        let battler = if reason == FailureReason::Immune {
            target
        } else {
            user
        };
        env.run(vec![failed(battler, reason)])?;
        return Ok(None);
    }

    // Stage 3: accuracy
    if aimed_elsewhere {
        if let Some(chance) = hit_chance(env.state, user, target, move_data) {
            if !env.rng.percent(chance, "accuracy") {
                env.emit(BattleEvent::Miss {
                    user,
                    target,
                    move_id: move_data.id,
                });
                return Ok(None);
            }
        }
    }

    if !move_data.is_damaging() {
        let landed = apply_primary_effects(env, ctx)?;
        return Ok(landed.then_some(0));
    }

    // Stages 4 to 7, hit by hit
    let mut dealt_total: u16 = 0;
    let mut struck_battler = false;
    let mut landed = 0u8;
    for _ in 0..hits {
        if !env.state.is_alive(target) || !env.state.is_alive(user) {
            break;
        }
        let outcome = strike(env, ctx, spread)?;
        landed += 1;
        dealt_total = dealt_total.saturating_add(outcome.dealt);
        struck_battler |= outcome.struck_battler;
        apply_secondary_effects(env, ctx)?;
    }
    if hits > 1 {
        env.emit(BattleEvent::HitCount { user, hits: landed });
    }

    let follow_up = move_data.apply_damage_based_effects(ctx, env.state, dealt_total);
    env.run(follow_up)?;

    // Stage 8: target side reactive hooks, ability before item
    if struck_battler && dealt_total > 0 {
        let hit = HitContext {
            user,
            target,
            move_data,
            damage: dealt_total,
        };
        let defender = env.state.battler(target)?;
        let (ability, item) = (defender.ability, defender.item);
        let commands = ability_effect(ability).on_hit_as_target(&hit, env.state, env.rng);
        env.run(commands)?;
        let commands = item_effect(item).on_hit_as_target(&hit, env.state);
        env.run(commands)?;
    }

    Ok(Some(dealt_total))
}

/// The target is flying or underground and the move cannot reach it.
fn out_of_reach(state: &BattleState, ctx: &EffectContext) -> bool {
    let (Ok(user), Ok(target)) = (state.battler(ctx.user), state.battler(ctx.target)) else {
        return false;
    };
    let Some(EffectData::Position(position, _)) = target
        .persistent
        .get(PersistentKind::SemiInvulnerable)
        .map(|r| r.data)
    else {
        return false;
    };
    let reaches = match position {
        SemiInvulnerablePosition::InAir => ctx.move_data.has_flag(MoveFlag::HitsAirborne),
        SemiInvulnerablePosition::Underground => {
            ctx.move_data.has_flag(MoveFlag::HitsUnderground)
        }
    };
    let sure_hit = ability_effect(user.ability).ignores_accuracy()
        || ability_effect(target.ability).ignores_accuracy()
        || user
            .persistent
            .get(PersistentKind::LockOn)
            .and_then(|r| r.source())
            == Some(ctx.target);
    !(reaches || sure_hit)
}

struct StrikeOutcome {
    dealt: u16,
    /// False when a substitute took the hit.
    struck_battler: bool,
}

/// One hit: critical roll, damage, and the damage landing.
fn strike(env: &mut TurnEnv, ctx: &EffectContext, spread: bool) -> BattleResult<StrikeOutcome> {
    let move_data = ctx.move_data;
    let fixed = move_data.fixed_damage(ctx, env.state);

    // Stage 4: critical hit
    let critical = {
        let user = env.state.battler(ctx.user)?;
        let target = env.state.battler(ctx.target)?;
        fixed.is_none()
            && !ability_effect(target.ability).blocks_critical()
            && env.rng.chance(
                1,
                crit_denominator(crit_stage(user, move_data)),
                "critical hit",
            )
    };

    // Stage 5: damage
    let (damage, effectiveness) = match fixed {
        Some(amount) => (amount, NEUTRAL),
        None => {
            let outcome = calculate_damage(
                env.state,
                ctx.user,
                ctx.target,
                move_data,
                critical,
                spread,
                env.roll,
                env.rng,
            );
            (outcome.damage, outcome.effectiveness)
        }
    };

    // Stage 6: apply
    land_hit(env, ctx, damage, critical, Effectiveness::from_percent(effectiveness))
}

fn land_hit(
    env: &mut TurnEnv,
    ctx: &EffectContext,
    damage: u16,
    critical: bool,
    effectiveness: Effectiveness,
) -> BattleResult<StrikeOutcome> {
    let (user, target_id, move_data) = (ctx.user, ctx.target, ctx.move_data);
    let target = env.state.battler(target_id)?;

    let substitute_hp = match target.volatiles.get(VolatileKind::Substitute).map(|r| r.data) {
        Some(EffectData::Hp(hp)) if target_id != user && !move_data.has_flag(MoveFlag::Sound) => {
            Some(hp)
        }
        _ => None,
    };
    if let Some(sub_hp) = substitute_hp {
        let absorbed = damage.min(sub_hp);
        let mut commands = vec![BattleCommand::EmitEvent(BattleEvent::Hit {
            user,
            target: target_id,
            move_id: move_data.id,
            damage: absorbed,
            critical,
            effectiveness,
            remaining_hp: target.current_hp(),
        })];
        if absorbed >= sub_hp {
            commands.push(BattleCommand::RemoveVolatile {
                target: target_id,
                kind: VolatileKind::Substitute,
            });
        } else {
            commands.push(BattleCommand::UpdateVolatile {
                target: target_id,
                kind: VolatileKind::Substitute,
                record: EffectRecord::lasting(EffectData::Hp(sub_hp - absorbed)),
            });
        }
        env.run(commands)?;
        return Ok(StrikeOutcome {
            dealt: absorbed,
            struck_battler: false,
        });
    }

    let current = target.current_hp();
    let mut amount = damage.min(current);
    let mut survived = Vec::new();
    if amount == current && current > 0 {
        if env.state.flags.turn(target_id).enduring {
            amount = current - 1;
            survived.push(BattleCommand::EmitEvent(BattleEvent::Endured {
                battler: target_id,
            }));
        } else if let Some(item) = target
            .item
            .filter(|_| item_effect(target.item).survives_lethal_hit(target))
        {
            amount = current - 1;
            survived.push(BattleCommand::EmitEvent(BattleEvent::ItemActivated {
                battler: target_id,
                item,
            }));
            survived.push(BattleCommand::ConsumeItem { target: target_id });
        }
    }

    let mut commands = vec![
        BattleCommand::DealDamage {
            target: target_id,
            amount,
        },
        BattleCommand::EmitEvent(BattleEvent::Hit {
            user,
            target: target_id,
            move_id: move_data.id,
            damage: amount,
            critical,
            effectiveness,
            remaining_hp: current - amount,
        }),
    ];
    if amount > 0 {
        commands.push(BattleCommand::RecordHit {
            target: target_id,
            record: DamageRecord {
                source: user,
                amount,
                category: move_data.category,
            },
        });
    }
    if move_data.makes_contact() {
        commands.push(BattleCommand::RecordContact { user });
    }
    commands.extend(survived);
    env.run(commands)?;
    Ok(StrikeOutcome {
        dealt: amount,
        struck_battler: true,
    })
}

/// Stage 7. Secondary effects of a damaging move fail silently.
fn apply_secondary_effects(env: &mut TurnEnv, ctx: &EffectContext) -> BattleResult<()> {
    for effect in &ctx.move_data.effects {
        match effect.apply(ctx, env.state, env.rng) {
            EffectResult::Continue(commands) | EffectResult::Skip(commands) => env.run(commands)?,
            EffectResult::Failed(_) => {}
        }
    }
    Ok(())
}

/// A status move's effects in order. The first failure is reported and
/// ends the move.
fn apply_primary_effects(env: &mut TurnEnv, ctx: &EffectContext) -> BattleResult<bool> {
    for effect in &ctx.move_data.effects {
        match effect.apply(ctx, env.state, env.rng) {
            EffectResult::Continue(commands) => env.run(commands)?,
            EffectResult::Skip(commands) => {
                env.run(commands)?;
                break;
            }
            EffectResult::Failed(reason) => {
                env.run(vec![failed(ctx.target, reason), move_failed(ctx.user)])?;
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// PP for one use: one, plus one for each targeted foe with Pressure.
fn spend_pp(
    env: &mut TurnEnv,
    user: BattlerId,
    move_data: &MoveData,
    targets: &[BattlerId],
    plan: MovePlan,
) -> Result<(), ExecutionError> {
    if plan.forced {
        return Ok(());
    }
    let extra: u8 = targets
        .iter()
        .filter(|t| !t.is_ally_of(user))
        .filter_map(|t| env.state.battler(*t).ok())
        .map(|b| ability_effect(b.ability).extra_pp_cost())
        .sum();
    env.run(vec![
        BattleCommand::DeductPp {
            target: user,
            move_id: move_data.id,
            amount: 1 + extra,
        },
        BattleCommand::SetTurnFlag {
            target: user,
            flag: TurnFlag::PpDeducted,
        },
    ])
}

/// Locks a prevented battler loses: a rampage, rollout, uproar or a
/// half-finished two-turn move does not survive a skipped action.
fn broken_locks(state: &BattleState, user: BattlerId) -> Vec<BattleCommand> {
    let Ok(battler) = state.battler(user) else {
        return Vec::new();
    };
    [
        PersistentKind::Rampage,
        PersistentKind::Rollout,
        PersistentKind::FuryCutter,
        PersistentKind::UproarLock,
        PersistentKind::Charging,
        PersistentKind::SemiInvulnerable,
    ]
    .into_iter()
    .filter(|kind| battler.persistent.contains(*kind))
    .map(|kind| BattleCommand::RemovePersistent {
        target: user,
        kind,
        announce: false,
    })
    .collect()
}

fn finish_move(
    env: &mut TurnEnv,
    user: BattlerId,
    move_data: &MoveData,
    connected: bool,
) -> BattleResult<()> {
    let battler = env.state.battler(user)?;
    let mut commands = vec![BattleCommand::SetLastMove {
        target: user,
        move_id: move_data.id,
    }];
    if item_effect(battler.item).locks_choice()
        && !battler.persistent.contains(PersistentKind::ChoiceLock)
        && move_data.id != moves::STRUGGLE
    {
        commands.push(BattleCommand::SetPersistent {
            target: user,
            kind: PersistentKind::ChoiceLock,
            record: EffectRecord::lasting(EffectData::Move(move_data.id)),
        });
    }
    if !connected {
        commands.push(move_failed(user));
    }
    env.run(commands)?;
    env.state.flags.self_turn_mut(user).move_used = Some(move_data.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::conditions::PrimaryStatus;
    use crate::battle::tests::common::{
        double_battle, run_move, run_phase, single_battle, TestBattlerBuilder,
    };
    use crate::data_store::species;
    use pretty_assertions::assert_eq;
    use schema::{Ability, HeldItem};

    fn hits(events: &[BattleEvent]) -> Vec<u16> {
        events
            .iter()
            .filter_map(|e| match e {
                BattleEvent::Hit { damage, .. } => Some(*damage),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_fainted_user_is_skipped_silently() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::TACKLE]),
            TestBattlerBuilder::new(species::SNORLAX, 50).with_moves(vec![moves::TACKLE]),
        );
        state.battlers[0].set_hp(0);
        let mut rng = TurnRng::new_for_test(vec![]);
        let events = run_move(&mut state, BattlerId(0), moves::TACKLE, None, &mut rng);
        assert!(events.is_empty());
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_draw_order_for_a_plain_hit() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::TACKLE]),
            TestBattlerBuilder::new(species::SNORLAX, 50).with_moves(vec![moves::TACKLE]),
        );
        // full accuracy never draws: critical hit, then damage roll
        let mut rng = TurnRng::new_for_test(vec![16, 100]);
        let events = run_move(&mut state, BattlerId(0), moves::TACKLE, Some(BattlerId(1)), &mut rng);
        assert_eq!(rng.draws(), 2);
        assert!(matches!(events[0], BattleEvent::MoveUsed { user: BattlerId(0), .. }));
        assert!(matches!(
            events[1],
            BattleEvent::Hit {
                critical: false,
                ..
            }
        ));
        assert_eq!(state.battlers[0].move_slot(moves::TACKLE).map(|s| s.pp), Some(34));
    }

    #[test]
    fn test_immune_target_gets_no_effect_and_no_draws() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::THUNDERBOLT]),
            TestBattlerBuilder::new(species::GARCHOMP, 50).with_moves(vec![moves::TACKLE]),
        );
        let mut rng = TurnRng::new_for_test(vec![]);
        let events = run_move(&mut state, BattlerId(0), moves::THUNDERBOLT, None, &mut rng);
        assert!(events.contains(&BattleEvent::NoEffect {
            user: BattlerId(0),
            target: BattlerId(1),
            move_id: moves::THUNDERBOLT,
        }));
        assert!(hits(&events).is_empty());
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_protect_blocks_the_hit() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::TACKLE]),
            TestBattlerBuilder::new(species::SNORLAX, 50).with_moves(vec![moves::PROTECT]),
        );
        let mut rng = TurnRng::new_for_test(vec![]);
        let events = run_move(&mut state, BattlerId(1), moves::PROTECT, None, &mut rng);
        assert!(events.contains(&BattleEvent::Protecting {
            battler: BattlerId(1),
            endure: false
        }));

        let events = run_move(&mut state, BattlerId(0), moves::TACKLE, Some(BattlerId(1)), &mut rng);
        assert!(events.contains(&BattleEvent::Failed {
            battler: BattlerId(1),
            reason: FailureReason::Protected,
        }));
        assert_eq!(rng.draws(), 0);
        assert!(state.flags.turn(BattlerId(0)).move_failed);
    }

    #[test]
    fn test_focus_sash_leaves_one_hp() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::MACHAMP, 100).with_moves(vec![moves::KARATE_CHOP]),
            TestBattlerBuilder::new(species::MAGIKARP, 5)
                .with_moves(vec![moves::TACKLE])
                .with_item(HeldItem::FocusSash),
        );
        let mut rng = TurnRng::new_for_test(vec![8, 100]);
        let events = run_move(&mut state, BattlerId(0), moves::KARATE_CHOP, None, &mut rng);
        assert_eq!(state.battlers[1].current_hp(), 1);
        assert!(events.contains(&BattleEvent::ItemConsumed {
            battler: BattlerId(1),
            item: HeldItem::FocusSash,
        }));
        assert!(!events
            .iter()
            .any(|e| matches!(e, BattleEvent::Fainted { .. })));
    }

    #[test]
    fn test_multi_hit_stops_when_target_faints() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::MACHAMP, 100).with_moves(vec![moves::DOUBLE_KICK]),
            TestBattlerBuilder::new(species::MAGIKARP, 5).with_moves(vec![moves::TACKLE]),
        );
        let mut rng = TurnRng::new_for_test(vec![16, 100, 16, 100]);
        let events = run_move(&mut state, BattlerId(0), moves::DOUBLE_KICK, None, &mut rng);
        assert_eq!(hits(&events).len(), 1);
        assert!(events.contains(&BattleEvent::HitCount {
            user: BattlerId(0),
            hits: 1
        }));
        let faints = events
            .iter()
            .filter(|e| matches!(e, BattleEvent::Fainted { battler: BattlerId(1) }))
            .count();
        assert_eq!(faints, 1);
    }

    #[test]
    fn test_solar_beam_charges_then_fires() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::VENUSAUR, 50).with_moves(vec![moves::SOLAR_BEAM]),
            TestBattlerBuilder::new(species::SNORLAX, 50).with_moves(vec![moves::TACKLE]),
        );
        let mut rng = TurnRng::new_for_test(vec![16, 100]);
        let events = run_move(&mut state, BattlerId(0), moves::SOLAR_BEAM, None, &mut rng);
        assert!(events.contains(&BattleEvent::MoveCharging {
            user: BattlerId(0),
            move_id: moves::SOLAR_BEAM,
        }));
        assert_eq!(rng.draws(), 0);
        assert!(locked_move(&state.battlers[0]).is_some());

        let events = run_move(&mut state, BattlerId(0), moves::TACKLE, None, &mut rng);
        assert_eq!(hits(&events).len(), 1);
        assert!(locked_move(&state.battlers[0]).is_none());
        // the second turn costs no PP
        assert_eq!(state.battlers[0].move_slot(moves::SOLAR_BEAM).map(|s| s.pp), Some(9));
    }

    #[test]
    fn test_volt_absorb_heals_instead() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::THUNDERBOLT]),
            TestBattlerBuilder::new(species::LAPRAS, 50)
                .with_moves(vec![moves::TACKLE])
                .with_ability(Ability::VoltAbsorb)
                .with_hp(50),
        );
        let mut rng = TurnRng::new_for_test(vec![]);
        let events = run_move(&mut state, BattlerId(0), moves::THUNDERBOLT, None, &mut rng);
        assert!(hits(&events).is_empty());
        assert!(state.battlers[1].current_hp() > 50);
    }

    #[test]
    fn test_recharge_turn_is_lost() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::SNORLAX, 50).with_moves(vec![moves::HYPER_BEAM]),
            TestBattlerBuilder::new(species::SNORLAX, 50).with_moves(vec![moves::TACKLE]),
        );
        let mut rng = TurnRng::new_for_test(vec![1, 16, 100]);
        run_move(&mut state, BattlerId(0), moves::HYPER_BEAM, None, &mut rng);
        assert!(state.battlers[0].persistent.contains(PersistentKind::Recharge));

        let events = run_move(&mut state, BattlerId(0), moves::HYPER_BEAM, None, &mut rng);
        assert!(events.contains(&BattleEvent::Failed {
            battler: BattlerId(0),
            reason: FailureReason::MustRecharge,
        }));
        assert!(!state.battlers[0].persistent.contains(PersistentKind::Recharge));
    }

    #[test]
    fn test_struggle_when_out_of_pp() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::SNORLAX, 50).with_moves(vec![moves::TACKLE]),
            TestBattlerBuilder::new(species::SNORLAX, 50).with_moves(vec![moves::TACKLE]),
        );
        state.battlers[0].deduct_pp(moves::TACKLE, 35);
        let mut rng = TurnRng::new_for_test(vec![16, 100]);
        let events = run_move(&mut state, BattlerId(0), moves::TACKLE, None, &mut rng);
        assert!(events.contains(&BattleEvent::MoveUsed {
            user: BattlerId(0),
            move_id: moves::STRUGGLE,
        }));
        assert!(events.iter().any(|e| matches!(
            e,
            BattleEvent::Damaged {
                target: BattlerId(0),
                ..
            }
        )));
        assert!(state.flags.turn(BattlerId(0)).struggling);
    }

    #[test]
    fn test_sleeping_user_cannot_move() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::SNORLAX, 50)
                .with_moves(vec![moves::TACKLE])
                .with_status(PrimaryStatus::Sleep { turns_remaining: 2 }),
            TestBattlerBuilder::new(species::SNORLAX, 50).with_moves(vec![moves::TACKLE]),
        );
        let mut rng = TurnRng::new_for_test(vec![]);
        let events = run_move(&mut state, BattlerId(0), moves::TACKLE, None, &mut rng);
        assert_eq!(
            events,
            vec![BattleEvent::Failed {
                battler: BattlerId(0),
                reason: FailureReason::Asleep,
            }]
        );
    }

    #[test]
    fn test_secondary_stat_drop_skips_a_knocked_out_target() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::MACHAMP, 100).with_moves(vec![moves::CRUNCH]),
            TestBattlerBuilder::new(species::MAGIKARP, 5).with_moves(vec![moves::TACKLE]),
        );
        // critical hit, damage roll; a knocked out target never rolls the drop
        let mut rng = TurnRng::new_for_test(vec![16, 100]);
        let events = run_move(&mut state, BattlerId(0), moves::CRUNCH, None, &mut rng);

        assert_eq!(state.battlers[1].current_hp(), 0);
        assert_eq!(rng.draws(), 2);
        assert!(!events
            .iter()
            .any(|e| matches!(e, BattleEvent::StatChanged { .. })));
        assert_eq!(state.battlers[1].stat_stage(schema::StatType::Defense), 0);
    }

    #[test]
    fn test_knocked_out_user_reaches_no_further_targets() {
        let builder = TestBattlerBuilder::new(species::SNORLAX, 50)
            .with_moves(vec![moves::EARTHQUAKE])
            .without_ability();
        let mut state = double_battle(
            vec![builder.clone(), builder.clone()],
            vec![builder.clone(), builder],
        );
        let data = ReferenceData::builtin().unwrap();
        let quake = data.move_data(moves::EARTHQUAKE).unwrap().clone();
        // the first target's reaction already took the user's last HP
        state.battlers[0].set_hp(0);
        let foe_hp = state.battlers[3].current_hp();

        let mut reached = Some(1);
        let mut rng = TurnRng::new_for_test(vec![]);
        let events = run_phase(&mut state, &mut rng, |env| {
            let ctx = EffectContext::new(BattlerId(0), BattlerId(3), &quake);
            reached = resolve_target(env, &ctx, 1, true)?;
            Ok(())
        });

        assert_eq!(reached, None);
        assert!(events.is_empty());
        assert_eq!(rng.draws(), 0);
        assert_eq!(state.battlers[3].current_hp(), foe_hp);
    }
}
