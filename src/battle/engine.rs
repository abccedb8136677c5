//! The turn driver.
//!
//! A [`Battle`] owns the authoritative state. Actions are collected with
//! [`Battle::submit_action`] and, once every live battler has one, the whole
//! turn is resolved by [`Battle::resolve_turn`] into an immutable
//! [`TurnLog`]. A turn commits completely or not at all: a fatal error puts
//! the pre-turn state back and marks the battle corrupted.

use crate::battle::abilities::ability_effect;
use crate::battle::action_stack::{order_actions, ActionQueue, BattleAction, QueuedAction};
use crate::battle::calculators::DamageRoll;
use crate::battle::commands::BattleCommand;
use crate::battle::conditions::{PersistentKind, VolatileKind};
use crate::battle::end_of_turn::{run_end_of_turn, speed_order};
use crate::battle::field::EffectDuration;
use crate::battle::pipeline::{execute_move, locked_move, TurnEnv};
use crate::battle::rng::TurnRng;
use crate::battle::state::{
    BattleEvent, BattleOutcome, BattleState, BattlerId, DamageSource, EventBus, FailureReason,
    GameState, HealSource, TurnLog,
};
use crate::battle::stats::{effective_speed, is_grounded};
use crate::battle::status::{inflict_status, status_block_reason};
use crate::battler::Battler;
use crate::config::BattleConfig;
use crate::data_store::{moves, ReferenceData};
use crate::errors::{BattleEngineError, BattleResult, ExecutionError};
use schema::{BagItem, FieldEffectKind, PokemonType, SideCondition, StatType, StatusType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Why a submission was turned down. The battler may submit again.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NotAcceptingActions,
    UnknownBattler,
    Fainted,
    AlreadySubmitted,
    /// The battler's action this turn is decided by an ongoing effect.
    LockedIntoMove,
    UnknownMove,
    NoPp,
    Disabled,
    Encored,
    ChoiceLocked,
    InvalidTarget,
    InvalidSwitch,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Accepted,
    Rejected(RejectReason),
}

impl Submission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Submission::Accepted)
    }
}

pub struct Battle {
    state: BattleState,
    data: Arc<ReferenceData>,
    rng: TurnRng,
    config: BattleConfig,
    pending: BTreeMap<BattlerId, QueuedAction>,
    replacements: BTreeMap<BattlerId, usize>,
    submissions: u32,
    history: Vec<TurnLog>,
    started: bool,
}

impl Battle {
    pub fn new(config: BattleConfig, parties: [Vec<Battler>; 2]) -> BattleResult<Self> {
        let data = ReferenceData::builtin()?;
        Self::with_data(config, data, parties)
    }

    pub fn with_data(
        config: BattleConfig,
        data: Arc<ReferenceData>,
        parties: [Vec<Battler>; 2],
    ) -> BattleResult<Self> {
        config.validate()?;
        let state = BattleState::new(config.format, parties)?;
        info!(format = ?config.format, seed = config.seed, "battle created");
        Ok(Self {
            state,
            data,
            rng: TurnRng::from_seed(config.seed),
            config,
            pending: BTreeMap::new(),
            replacements: BTreeMap::new(),
            submissions: 0,
            history: Vec::new(),
            started: false,
        })
    }

    /// Cover the field in fog for the whole battle.
    pub fn with_fog(mut self) -> Self {
        self.state
            .field
            .set_effect(FieldEffectKind::Fog, EffectDuration::UntilReplaced);
        self
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn data(&self) -> &ReferenceData {
        &self.data
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Every committed log, oldest first.
    pub fn history(&self) -> &[TurnLog] {
        &self.history
    }

    pub fn is_over(&self) -> bool {
        self.state.game_state.is_over()
    }

    /// Values drawn from the battle RNG so far.
    pub fn rng_draws(&self) -> u64 {
        self.rng.draws()
    }

    /// Switch-in effects of the opening lineup, committed as turn 0.
    pub fn start(&mut self) -> BattleResult<TurnLog> {
        if self.started {
            return Err(BattleEngineError::NotResolvable(
                "battle has already started".to_string(),
            ));
        }
        self.started = true;
        let lineup = speed_order(&self.state);
        self.commit(0, move |env| {
            for slot in lineup {
                on_entry(env, slot)?;
            }
            check_outcome(env)?;
            Ok(())
        })
    }

    /// Live battlers that still owe an action this turn. Battlers locked
    /// into a move are filled in automatically.
    pub fn awaiting_actions(&self) -> Vec<BattlerId> {
        if self.state.game_state != GameState::WaitingForActions {
            return Vec::new();
        }
        self.state
            .live_ids()
            .into_iter()
            .filter(|id| !self.pending.contains_key(id))
            .filter(|id| self.state.battler(*id).ok().and_then(locked_move).is_none())
            .collect()
    }

    pub fn submit_action(&mut self, battler: BattlerId, action: BattleAction) -> Submission {
        match self.validate_action(battler, &action) {
            Ok(()) => {
                let uid = self.state.battler(battler).map(|b| b.uid).unwrap_or_default();
                let submission = self.next_submission();
                debug!(battler = %battler, ?action, "action accepted");
                self.pending.insert(
                    battler,
                    QueuedAction {
                        battler,
                        uid,
                        action,
                        submission,
                    },
                );
                Submission::Accepted
            }
            Err(reason) => {
                match reason {
                    RejectReason::UnknownBattler | RejectReason::AlreadySubmitted => {
                        warn!(battler = %battler, ?reason, "submission ignored");
                    }
                    _ => debug!(battler = %battler, ?reason, "submission rejected"),
                }
                Submission::Rejected(reason)
            }
        }
    }

    fn validate_action(&self, id: BattlerId, action: &BattleAction) -> Result<(), RejectReason> {
        if self.state.game_state != GameState::WaitingForActions || !self.started {
            return Err(RejectReason::NotAcceptingActions);
        }
        let battler = self
            .state
            .battler(id)
            .map_err(|_| RejectReason::UnknownBattler)?;
        if battler.is_fainted() {
            return Err(RejectReason::Fainted);
        }
        if self.pending.contains_key(&id) {
            return Err(RejectReason::AlreadySubmitted);
        }
        if locked_move(battler).is_some() {
            return Err(RejectReason::LockedIntoMove);
        }

        match *action {
            BattleAction::UseMove { move_id, target } => {
                if let Some(target) = target {
                    self.state
                        .battler(target)
                        .map_err(|_| RejectReason::InvalidTarget)?;
                }
                if move_id == moves::STRUGGLE && !battler.has_usable_move() {
                    return Ok(());
                }
                let slot = battler
                    .move_slot(move_id)
                    .ok_or(RejectReason::UnknownMove)?;
                if slot.pp == 0 {
                    return Err(RejectReason::NoPp);
                }
                let bound_to = |kind: PersistentKind| {
                    battler
                        .persistent
                        .get(kind)
                        .and_then(|r| r.move_id())
                };
                if bound_to(PersistentKind::Disable) == Some(move_id) {
                    return Err(RejectReason::Disabled);
                }
                if bound_to(PersistentKind::Encore).is_some_and(|m| m != move_id) {
                    return Err(RejectReason::Encored);
                }
                if bound_to(PersistentKind::ChoiceLock).is_some_and(|m| m != move_id) {
                    return Err(RejectReason::ChoiceLocked);
                }
                Ok(())
            }
            BattleAction::UseItem { target, .. } => {
                if !target.is_ally_of(id) || !self.state.is_alive(target) {
                    return Err(RejectReason::InvalidTarget);
                }
                Ok(())
            }
            BattleAction::Switch { bench_index } => {
                let taken = self.pending.values().any(|queued| {
                    queued.battler.is_ally_of(id)
                        && queued.action == BattleAction::Switch { bench_index }
                });
                if taken || !self.state.available_replacements(id.side()).contains(&bench_index) {
                    return Err(RejectReason::InvalidSwitch);
                }
                Ok(())
            }
            BattleAction::Flee | BattleAction::Forfeit => Ok(()),
        }
    }

    fn next_submission(&mut self) -> u32 {
        self.submissions += 1;
        self.submissions
    }

    /// Resolve the turn from the collected actions.
    pub fn resolve_turn(&mut self) -> BattleResult<TurnLog> {
        if !self.started {
            return Err(BattleEngineError::NotResolvable(
                "battle has not started".to_string(),
            ));
        }
        if self.state.game_state != GameState::WaitingForActions {
            return Err(BattleEngineError::NotResolvable(format!(
                "battle is {:?}",
                self.state.game_state
            )));
        }
        let waiting = self.awaiting_actions();
        if !waiting.is_empty() {
            return Err(BattleEngineError::NotResolvable(format!(
                "waiting for actions from {:?}",
                waiting
            )));
        }

        let actions = self.take_actions();
        let turn = self.state.turn_number;
        debug!(turn, actions = actions.len(), "resolving turn");
        self.commit(turn, move |env| run_turn(env, actions, turn))
    }

    fn take_actions(&mut self) -> Vec<QueuedAction> {
        let mut actions: Vec<QueuedAction> =
            std::mem::take(&mut self.pending).into_values().collect();
        for id in self.state.live_ids() {
            let Ok(battler) = self.state.battler(id) else {
                continue;
            };
            if let Some(locked) = locked_move(battler) {
                debug!(battler = %id, move_id = %locked.move_id, "forced action");
                let uid = battler.uid;
                let submission = self.next_submission();
                actions.push(QueuedAction {
                    battler: id,
                    uid,
                    action: BattleAction::UseMove {
                        move_id: locked.move_id,
                        target: None,
                    },
                    submission,
                });
            }
        }
        actions
    }

    /// Choose the bench member that refills a fainted slot.
    pub fn submit_replacement(&mut self, slot: BattlerId, bench_index: usize) -> Submission {
        let GameState::WaitingForReplacements(slots) = &self.state.game_state else {
            return Submission::Rejected(RejectReason::NotAcceptingActions);
        };
        if !slots.contains(&slot) {
            warn!(battler = %slot, "replacement for a slot that needs none");
            return Submission::Rejected(RejectReason::UnknownBattler);
        }
        if self.replacements.contains_key(&slot) {
            return Submission::Rejected(RejectReason::AlreadySubmitted);
        }
        let taken = self
            .replacements
            .iter()
            .any(|(other, index)| other.is_ally_of(slot) && *index == bench_index);
        if taken
            || !self
                .state
                .available_replacements(slot.side())
                .contains(&bench_index)
        {
            return Submission::Rejected(RejectReason::InvalidSwitch);
        }
        self.replacements.insert(slot, bench_index);
        Submission::Accepted
    }

    /// Send in every chosen replacement. Entry hazards may knock one out
    /// again, in which case another replacement phase follows.
    pub fn resolve_replacements(&mut self) -> BattleResult<TurnLog> {
        let GameState::WaitingForReplacements(slots) = self.state.game_state.clone() else {
            return Err(BattleEngineError::NotResolvable(format!(
                "battle is {:?}",
                self.state.game_state
            )));
        };
        if let Some(missing) = slots.iter().find(|s| !self.replacements.contains_key(s)) {
            return Err(BattleEngineError::NotResolvable(format!(
                "no replacement chosen for {}",
                missing
            )));
        }
        let chosen: Vec<(BattlerId, usize)> =
            std::mem::take(&mut self.replacements).into_iter().collect();
        // the faints being answered happened in the turn that just ended
        let turn = self.state.turn_number.saturating_sub(1);
        self.commit(turn, move |env| {
            for (slot, bench_index) in chosen {
                switch_in(env, slot, bench_index)?;
            }
            check_outcome(env)?;
            if !env.state.game_state.is_over() {
                set_next_phase(env)?;
            }
            Ok(())
        })
    }

    /// Stop the battle at a suspension point. Nothing in flight is applied.
    pub fn abort(&mut self, reason: impl Into<String>) {
        if self.state.game_state.is_over() {
            return;
        }
        let reason = reason.into();
        warn!(%reason, "battle aborted");
        self.pending.clear();
        self.replacements.clear();
        self.state.game_state = GameState::Aborted(reason);
    }

    /// Run one phase against the state. On error the state and RNG are put
    /// back to where they were and the battle is marked corrupted.
    fn commit<F>(&mut self, turn: u32, phase: F) -> BattleResult<TurnLog>
    where
        F: FnOnce(&mut TurnEnv) -> BattleResult<()>,
    {
        let snapshot = (self.state.clone(), self.rng.clone());
        let mut bus = EventBus::new();
        let mut queue = ActionQueue::new();
        let result = {
            let mut env = TurnEnv {
                state: &mut self.state,
                data: self.data.as_ref(),
                rng: &mut self.rng,
                bus: &mut bus,
                queue: &mut queue,
                roll: DamageRoll::from(&self.config),
            };
            phase(&mut env)
        };

        match result {
            Ok(()) => {
                let log = TurnLog {
                    turn,
                    events: bus.into_events(),
                };
                self.history.push(log.clone());
                Ok(log)
            }
            Err(err) => {
                let (state, rng) = snapshot;
                self.state = state;
                self.rng = rng;
                self.pending.clear();
                error!(turn, error = %err, "turn aborted, battle marked corrupted");
                self.state.game_state = GameState::Corrupted(err.to_string());
                Err(err)
            }
        }
    }
}

fn run_turn(env: &mut TurnEnv, actions: Vec<QueuedAction>, turn: u32) -> BattleResult<()> {
    env.run(vec![BattleCommand::SetGameState(GameState::TurnInProgress)])?;
    env.state.flags.begin_turn();
    env.emit(BattleEvent::TurnStarted { turn });

    *env.queue = order_actions(actions, env.state, env.data, env.rng)?;
    while let Some(queued) = env.queue.pop_front() {
        let occupant = env.state.battler(queued.battler)?;
        if occupant.uid != queued.uid || occupant.is_fainted() {
            debug!(battler = %queued.battler, "actor left the field, action skipped");
            continue;
        }
        execute_action(env, queued)?;
        check_outcome(env)?;
        if env.state.game_state.is_over() {
            break;
        }
    }

    if !env.state.game_state.is_over() {
        run_end_of_turn(env)?;
        check_outcome(env)?;
    }
    if !env.state.game_state.is_over() {
        for battler in env.state.battlers.iter_mut().filter(|b| !b.is_fainted()) {
            battler.turns_active = battler.turns_active.saturating_add(1);
        }
        set_next_phase(env)?;
        env.state.turn_number += 1;
    }
    env.emit(BattleEvent::TurnEnded { turn });
    Ok(())
}

fn execute_action(env: &mut TurnEnv, queued: QueuedAction) -> BattleResult<()> {
    let battler = queued.battler;
    match queued.action {
        BattleAction::UseMove { move_id, target } => execute_move(env, battler, move_id, target),
        BattleAction::UseItem { item, target } => {
            use_bag_item(env, battler, item, target)?;
            Ok(())
        }
        BattleAction::Switch { bench_index } => switch_in(env, battler, bench_index),
        BattleAction::Flee => attempt_flee(env, battler),
        BattleAction::Forfeit => {
            let outcome = BattleOutcome::Forfeit(battler.side());
            info!(battler = %battler, "forfeit");
            env.run(vec![
                BattleCommand::SetGameState(GameState::Finished(outcome)),
                BattleCommand::EmitEvent(BattleEvent::BattleEnded { outcome }),
            ])?;
            Ok(())
        }
    }
}

fn potion_strength(item: BagItem) -> Option<u16> {
    match item {
        BagItem::Potion => Some(20),
        BagItem::SuperPotion => Some(50),
        BagItem::HyperPotion => Some(200),
        _ => None,
    }
}

fn use_bag_item(
    env: &mut TurnEnv,
    user: BattlerId,
    item: BagItem,
    target: BattlerId,
) -> Result<(), ExecutionError> {
    let battler = env.state.battler(target)?;
    let useful = match item {
        BagItem::Potion | BagItem::SuperPotion | BagItem::HyperPotion => {
            battler.current_hp() < battler.max_hp()
        }
        BagItem::FullHeal => {
            battler.status.is_some() || battler.volatiles.contains(VolatileKind::Confusion)
        }
        BagItem::XAttack => battler.stat_stage(StatType::Attack) < 6,
        BagItem::XSpeed => battler.stat_stage(StatType::Speed) < 6,
    };

    let mut commands = vec![BattleCommand::EmitEvent(BattleEvent::BagItemUsed {
        battler: user,
        item,
        target,
    })];
    if battler.is_fainted() || !useful {
        commands.push(BattleCommand::EmitEvent(BattleEvent::Failed {
            battler: target,
            reason: FailureReason::Generic,
        }));
        return env.run(commands);
    }

    match item {
        BagItem::FullHeal => {
            commands.push(BattleCommand::CureStatus { target });
            commands.push(BattleCommand::RemoveVolatile {
                target,
                kind: VolatileKind::Confusion,
            });
        }
        BagItem::XAttack | BagItem::XSpeed => {
            let stat = if item == BagItem::XAttack {
                StatType::Attack
            } else {
                StatType::Speed
            };
            commands.push(BattleCommand::ChangeStatStage {
                target,
                stat,
                delta: 1,
            });
        }
        _ => {
            if let Some(amount) = potion_strength(item) {
                commands.push(BattleCommand::Heal {
                    target,
                    amount,
                    source: HealSource::Bag(item),
                });
            }
        }
    }
    env.run(commands)
}

/// Escape odds grow with each failed attempt by the same side. A battler at
/// least as fast as every foe always gets away.
fn attempt_flee(env: &mut TurnEnv, battler: BattlerId) -> BattleResult<()> {
    let side = battler.side();
    let attempts = env.state.escape_attempts[side].saturating_add(1);
    env.state.escape_attempts[side] = attempts;

    let speed = effective_speed(env.state, battler) as u32;
    let foe_speed = env
        .state
        .live_opponents(battler)
        .into_iter()
        .map(|id| effective_speed(env.state, id) as u32)
        .max()
        .unwrap_or(0);
    let success = if speed >= foe_speed {
        true
    } else {
        let odds = (speed * 128 / foe_speed.max(1) + 30 * attempts as u32) % 256;
        env.rng.next_in_range(0, 255, "escape") < odds
    };
    debug!(battler = %battler, speed, foe_speed, attempts, success, "flee attempt");

    let mut commands = vec![BattleCommand::EmitEvent(BattleEvent::FleeAttempted {
        battler,
        success,
    })];
    if success {
        let outcome = BattleOutcome::Fled(side);
        commands.push(BattleCommand::SetGameState(GameState::Finished(outcome)));
        commands.push(BattleCommand::EmitEvent(BattleEvent::BattleEnded { outcome }));
    }
    env.run(commands)?;
    Ok(())
}

/// Bring a bench member into `slot`.
pub fn switch_in(env: &mut TurnEnv, slot: BattlerId, bench_index: usize) -> BattleResult<()> {
    env.run(vec![BattleCommand::SwitchIn { slot, bench_index }])?;
    on_entry(env, slot)
}

/// Entry hazards, then the newcomer's switch-in ability.
fn on_entry(env: &mut TurnEnv, slot: BattlerId) -> BattleResult<()> {
    let hazards = entry_hazards(env.state, slot, env.rng);
    env.run(hazards)?;
    if env.state.is_alive(slot) {
        let ability = env.state.battler(slot)?.ability;
        let commands = ability_effect(ability).on_switch_in(slot, env.state);
        env.run(commands)?;
    }
    env.check_faints()?;
    Ok(())
}

fn entry_hazards(state: &BattleState, slot: BattlerId, rng: &mut TurnRng) -> Vec<BattleCommand> {
    let Ok(battler) = state.battler(slot) else {
        return Vec::new();
    };
    let side = &state.field.sides[slot.side()];
    let grounded = is_grounded(state, slot);
    let mut commands = Vec::new();

    if side.has(SideCondition::StealthRock) {
        let effectiveness = battler.types.iter().fold(100u32, |acc, defending| {
            acc * PokemonType::Rock.effectiveness_against(*defending) as u32 / 100
        });
        if effectiveness > 0 {
            commands.push(BattleCommand::Damage {
                target: slot,
                amount: battler.fraction_of_max_hp(effectiveness as u16, 800),
                source: DamageSource::Hazard(SideCondition::StealthRock),
            });
        }
    }

    let spikes = side.layers(SideCondition::Spikes);
    if grounded && spikes > 0 {
        let denominator = match spikes {
            1 => 8,
            2 => 6,
            _ => 4,
        };
        commands.push(BattleCommand::Damage {
            target: slot,
            amount: battler.fraction_of_max_hp(1, denominator),
            source: DamageSource::Hazard(SideCondition::Spikes),
        });
    }

    let toxic_spikes = side.layers(SideCondition::ToxicSpikes);
    if grounded && toxic_spikes > 0 {
        let status = if toxic_spikes >= 2 {
            StatusType::BadPoison
        } else {
            StatusType::Poison
        };
        if status_block_reason(state, slot, status, None).is_none() {
            commands.extend(inflict_status(slot, status, rng));
        }
    }
    commands
}

/// End the battle if a side has nobody left who can fight.
fn check_outcome(env: &mut TurnEnv) -> Result<(), ExecutionError> {
    if env.state.game_state.is_over() {
        return Ok(());
    }
    let outcome = match (env.state.side_can_fight(0), env.state.side_can_fight(1)) {
        (true, true) => return Ok(()),
        (false, false) => BattleOutcome::Draw,
        (false, true) => BattleOutcome::Winner(1),
        (true, false) => BattleOutcome::Winner(0),
    };
    info!(?outcome, "battle over");
    env.run(vec![
        BattleCommand::SetGameState(GameState::Finished(outcome)),
        BattleCommand::EmitEvent(BattleEvent::BattleEnded { outcome }),
    ])
}

/// Fainted slots that have someone on the bench to refill them.
fn replacement_slots(state: &BattleState) -> Vec<BattlerId> {
    let mut bench = [
        state.available_replacements(0).len(),
        state.available_replacements(1).len(),
    ];
    state
        .ids()
        .filter(|id| !state.is_alive(*id))
        .filter(|id| {
            let available = &mut bench[id.side()];
            if *available == 0 {
                return false;
            }
            *available -= 1;
            true
        })
        .collect()
}

fn set_next_phase(env: &mut TurnEnv) -> Result<(), ExecutionError> {
    let slots = replacement_slots(env.state);
    let next = if slots.is_empty() {
        GameState::WaitingForActions
    } else {
        debug!(?slots, "waiting for replacements");
        GameState::WaitingForReplacements(slots)
    };
    env.run(vec![BattleCommand::SetGameState(next)])
}
