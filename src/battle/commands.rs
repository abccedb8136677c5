use crate::battle::action_stack::ActionQueue;
use crate::battle::conditions::{EffectRecord, PersistentKind, PrimaryStatus, VolatileKind};
use crate::battle::field::EffectDuration;
use crate::battle::flags::DamageRecord;
use crate::battle::state::{
    BattleEvent, BattleState, BattlerId, DamageSource, FailureReason, GameState, HealSource,
    OrderShift,
};
use crate::errors::ExecutionError;
use schema::{FieldEffectKind, MoveId, SideCondition, StatType, Weather};
use tracing::trace;

/// Turn-scoped flags that commands can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnFlag {
    Acted,
    Protected,
    Enduring,
    Flinched,
    PpDeducted,
    Struggling,
    MoveFailed,
}

/// Atomic commands representing final state changes
#[derive(Debug, Clone, PartialEq)]
pub enum BattleCommand {
    SetGameState(GameState),

    // Battler modifications
    /// Move damage. The caller emits the matching Hit event.
    DealDamage {
        target: BattlerId,
        amount: u16,
    },
    /// Indirect damage, announced with a Damaged event.
    Damage {
        target: BattlerId,
        amount: u16,
        source: DamageSource,
    },
    Heal {
        target: BattlerId,
        amount: u16,
        source: HealSource,
    },
    SetStatus {
        target: BattlerId,
        status: PrimaryStatus,
    },
    /// Replace the status in place without an event, e.g. a sleep counter.
    UpdateStatus {
        target: BattlerId,
        status: PrimaryStatus,
    },
    CureStatus {
        target: BattlerId,
    },
    ChangeStatStage {
        target: BattlerId,
        stat: StatType,
        delta: i8,
    },
    ResetAllStatStages,
    AddVolatile {
        target: BattlerId,
        kind: VolatileKind,
        record: EffectRecord,
    },
    UpdateVolatile {
        target: BattlerId,
        kind: VolatileKind,
        record: EffectRecord,
    },
    RemoveVolatile {
        target: BattlerId,
        kind: VolatileKind,
    },
    SetPersistent {
        target: BattlerId,
        kind: PersistentKind,
        record: EffectRecord,
    },
    RemovePersistent {
        target: BattlerId,
        kind: PersistentKind,
        announce: bool,
    },
    DeductPp {
        target: BattlerId,
        move_id: MoveId,
        amount: u8,
    },
    SetLastMove {
        target: BattlerId,
        move_id: MoveId,
    },
    ConsumeItem {
        target: BattlerId,
    },
    SwitchIn {
        slot: BattlerId,
        bench_index: usize,
    },
    Faint {
        target: BattlerId,
    },

    // Per-turn bookkeeping
    SetTurnFlag {
        target: BattlerId,
        flag: TurnFlag,
    },
    RecordHit {
        target: BattlerId,
        record: DamageRecord,
    },
    RecordContact {
        user: BattlerId,
    },

    // Field
    SetWeather {
        weather: Weather,
        duration: EffectDuration,
    },
    AddSideCondition {
        side: usize,
        condition: SideCondition,
        duration: EffectDuration,
    },
    SetFieldEffect {
        effect: FieldEffectKind,
        duration: EffectDuration,
    },
    RemoveFieldEffect {
        effect: FieldEffectKind,
    },

    // Battle flow
    EmitEvent(BattleEvent),
    Reorder {
        user: BattlerId,
        target: BattlerId,
        shift: OrderShift,
    },
}

/// Execute a batch of commands atomically
pub fn execute_command_batch(
    commands: Vec<BattleCommand>,
    state: &mut BattleState,
    bus: &mut crate::battle::state::EventBus,
    queue: &mut ActionQueue,
) -> Result<(), ExecutionError> {
    for command in commands {
        execute_command(command, state, bus, queue)?;
    }
    Ok(())
}

/// Apply one command and emit the events it implies.
pub fn execute_command(
    command: BattleCommand,
    state: &mut BattleState,
    bus: &mut crate::battle::state::EventBus,
    queue: &mut ActionQueue,
) -> Result<(), ExecutionError> {
    trace!(?command, "execute");
    match command {
        BattleCommand::SetGameState(game_state) => {
            state.game_state = game_state;
        }
        BattleCommand::DealDamage { target, amount } => {
            state.battler_mut(target)?.take_damage(amount);
        }
        BattleCommand::Damage {
            target,
            amount,
            source,
        } => {
            let battler = state.battler_mut(target)?;
            let lost = battler.take_damage(amount);
            if lost > 0 {
                bus.push(BattleEvent::Damaged {
                    target,
                    source,
                    amount: lost,
                    remaining_hp: battler.current_hp(),
                });
            }
        }
        BattleCommand::Heal {
            target,
            amount,
            source,
        } => {
            let battler = state.battler_mut(target)?;
            let gained = battler.heal(amount);
            if gained > 0 {
                bus.push(BattleEvent::Healed {
                    target,
                    source,
                    amount: gained,
                    new_hp: battler.current_hp(),
                });
            }
        }
        BattleCommand::SetStatus { target, status } => {
            if state.battler_mut(target)?.set_status(status) {
                bus.push(BattleEvent::StatusApplied {
                    target,
                    status: status.kind(),
                });
            }
        }
        BattleCommand::UpdateStatus { target, status } => {
            state.battler_mut(target)?.status = Some(status);
        }
        BattleCommand::CureStatus { target } => {
            if let Some(status) = state.battler_mut(target)?.cure_status() {
                bus.push(BattleEvent::StatusCured {
                    target,
                    status: status.kind(),
                });
            }
        }
        BattleCommand::ChangeStatStage { target, stat, delta } => {
            let battler = state.battler_mut(target)?;
            let applied = battler.modify_stat_stage(stat, delta);
            if applied == 0 {
                bus.push(BattleEvent::Failed {
                    battler: target,
                    reason: FailureReason::StatCapped,
                });
            } else {
                bus.push(BattleEvent::StatChanged {
                    target,
                    stat,
                    delta: applied,
                    new_stage: battler.stat_stage(stat),
                });
            }
        }
        BattleCommand::ResetAllStatStages => {
            for battler in state.battlers.iter_mut() {
                battler.clear_stat_stages();
            }
            bus.push(BattleEvent::StatStagesReset);
        }
        BattleCommand::AddVolatile {
            target,
            kind,
            record,
        } => {
            if state.battler_mut(target)?.add_volatile(kind, record) {
                bus.push(BattleEvent::VolatileStarted { target, kind });
            }
        }
        BattleCommand::UpdateVolatile {
            target,
            kind,
            record,
        } => {
            state.battler_mut(target)?.volatiles.insert(kind, record);
        }
        BattleCommand::RemoveVolatile { target, kind } => {
            if state.battler_mut(target)?.volatiles.remove(kind).is_some() {
                bus.push(BattleEvent::VolatileEnded { target, kind });
            }
        }
        BattleCommand::SetPersistent {
            target,
            kind,
            record,
        } => {
            state.battler_mut(target)?.persistent.insert(kind, record);
        }
        BattleCommand::RemovePersistent {
            target,
            kind,
            announce,
        } => {
            let removed = state.battler_mut(target)?.persistent.remove(kind).is_some();
            if removed && announce {
                bus.push(BattleEvent::EffectEnded { target, kind });
            }
        }
        BattleCommand::DeductPp {
            target,
            move_id,
            amount,
        } => {
            state.battler_mut(target)?.deduct_pp(move_id, amount);
        }
        BattleCommand::SetLastMove { target, move_id } => {
            state.battler_mut(target)?.last_move = Some(move_id);
        }
        BattleCommand::ConsumeItem { target } => {
            if let Some(item) = state.battler_mut(target)?.item.take() {
                bus.push(BattleEvent::ItemConsumed {
                    battler: target,
                    item,
                });
            }
        }
        BattleCommand::SwitchIn { slot, bench_index } => {
            let side = slot.side();
            if bench_index >= state.benches[side].len() {
                return Err(ExecutionError::InvalidBenchIndex {
                    side,
                    index: bench_index,
                });
            }
            let mut incoming = state.benches[side].remove(bench_index);
            incoming.turns_active = 0;
            incoming.fainted = false;
            let mut outgoing = std::mem::replace(state.battler_mut(slot)?, incoming);
            outgoing.reset_on_switch_out();
            let outgoing_name = outgoing.name.clone();
            state.benches[side].insert(bench_index, outgoing);
            state.flags.clear_slot(slot);
            bus.push(BattleEvent::Switched {
                battler: slot,
                outgoing: outgoing_name,
                incoming: state.battler(slot)?.name.clone(),
            });
        }
        BattleCommand::Faint { target } => {
            let battler = state.battler_mut(target)?;
            if !battler.fainted {
                battler.fainted = true;
                battler.set_hp(0);
                bus.push(BattleEvent::Fainted { battler: target });
            }
        }
        BattleCommand::SetTurnFlag { target, flag } => {
            let flags = state.flags.turn_mut(target);
            match flag {
                TurnFlag::Acted => flags.acted = true,
                TurnFlag::Protected => flags.protected = true,
                TurnFlag::Enduring => flags.enduring = true,
                TurnFlag::Flinched => flags.flinched = true,
                TurnFlag::PpDeducted => flags.pp_deducted = true,
                TurnFlag::Struggling => flags.struggling = true,
                TurnFlag::MoveFailed => flags.move_failed = true,
            }
        }
        BattleCommand::RecordHit { target, record } => {
            state.flags.record_hit(target, record);
        }
        BattleCommand::RecordContact { user } => {
            state.flags.self_turn_mut(user).made_contact = true;
        }
        BattleCommand::SetWeather { weather, duration } => {
            if state.field.set_weather(weather, duration) {
                bus.push(BattleEvent::WeatherChanged {
                    weather: Some(weather),
                    duration: Some(duration),
                });
            }
        }
        BattleCommand::AddSideCondition {
            side,
            condition,
            duration,
        } => {
            if state.field.add_side_condition(side, condition, duration) {
                bus.push(BattleEvent::SideConditionStarted { side, condition });
            }
        }
        BattleCommand::SetFieldEffect { effect, duration } => {
            state.field.set_effect(effect, duration);
            bus.push(BattleEvent::FieldEffectStarted { effect });
        }
        BattleCommand::RemoveFieldEffect { effect } => {
            if state.field.remove_effect(effect) {
                bus.push(BattleEvent::FieldEffectExpired { effect });
            }
        }
        BattleCommand::EmitEvent(event) => {
            bus.push(event);
        }
        BattleCommand::Reorder {
            user,
            target,
            shift,
        } => {
            if queue.reposition(target, shift) {
                bus.push(BattleEvent::OrderChanged {
                    battler: target,
                    shift,
                });
            } else {
                // the target has already acted this turn
                bus.push(BattleEvent::Failed {
                    battler: user,
                    reason: FailureReason::Generic,
                });
            }
        }
    }
    Ok(())
}
