//! Primary status and volatile condition rules: who can receive what, the
//! checks run before a battler acts, and per-turn residual damage.

use crate::battle::abilities::ability_effect;
use crate::battle::calculators::confusion_damage;
use crate::battle::commands::{BattleCommand, TurnFlag};
use crate::battle::conditions::{
    EffectData, EffectRecord, PersistentKind, PrimaryStatus, VolatileKind,
};
use crate::battle::rng::TurnRng;
use crate::battle::state::{
    BattleEvent, BattleState, BattlerId, DamageSource, FailureReason, HealSource,
};
use schema::{
    FieldEffectKind, MoveCategory, MoveData, PokemonType, SideCondition, StatusType, Weather,
};
use tracing::debug;

/// Badly poisoned damage stops growing at 15/16.
const MAX_TOXIC_COUNTER: u8 = 15;

/// Why `status` cannot be given to `target`, if anything prevents it.
/// `source` is the battler responsible, `None` for field sources such as
/// entry hazards.
pub fn status_block_reason(
    state: &BattleState,
    target: BattlerId,
    status: StatusType,
    source: Option<BattlerId>,
) -> Option<FailureReason> {
    let Ok(battler) = state.battler(target) else {
        return Some(FailureReason::NoTarget);
    };
    if battler.is_fainted() {
        return Some(FailureReason::NoTarget);
    }
    if battler.status.is_some() {
        return Some(FailureReason::AlreadyAffected);
    }

    let type_immune = match status {
        StatusType::Burn => battler.has_type(PokemonType::Fire),
        StatusType::Freeze => {
            battler.has_type(PokemonType::Ice) || state.field.weather() == Some(Weather::Sun)
        }
        StatusType::Poison | StatusType::BadPoison => {
            battler.has_type(PokemonType::Poison) || battler.has_type(PokemonType::Steel)
        }
        StatusType::Sleep | StatusType::Paralysis => false,
    };
    if type_immune || !ability_effect(battler.ability).on_status_apply_attempt(status) {
        return Some(FailureReason::Immune);
    }

    if source != Some(target) && state.field.sides[target.side()].has(SideCondition::Safeguard) {
        return Some(FailureReason::Safeguarded);
    }
    if status == StatusType::Sleep && state.field.has_effect(FieldEffectKind::Uproar) {
        return Some(FailureReason::Uproar);
    }
    None
}

pub fn confusion_block_reason(
    state: &BattleState,
    target: BattlerId,
    source: BattlerId,
) -> Option<FailureReason> {
    let Ok(battler) = state.battler(target) else {
        return Some(FailureReason::NoTarget);
    };
    if battler.volatiles.contains(VolatileKind::Confusion) {
        return Some(FailureReason::AlreadyAffected);
    }
    if ability_effect(battler.ability).blocks_confusion() {
        return Some(FailureReason::Immune);
    }
    if source != target && state.field.sides[target.side()].has(SideCondition::Safeguard) {
        return Some(FailureReason::Safeguarded);
    }
    None
}

/// Commands that give `status` to `target`. Sleep draws its duration here;
/// bad poison restarts its counter. Callers check `status_block_reason`
/// first.
pub fn inflict_status(target: BattlerId, status: StatusType, rng: &mut TurnRng) -> Vec<BattleCommand> {
    let sleep_turns = if status == StatusType::Sleep {
        rng.next_in_range(1, 4, "sleep duration") as u8
    } else {
        0
    };
    let mut commands = vec![BattleCommand::SetStatus {
        target,
        status: PrimaryStatus::from_kind(status, sleep_turns),
    }];
    if status == StatusType::BadPoison {
        commands.push(BattleCommand::SetPersistent {
            target,
            kind: PersistentKind::ToxicCounter,
            record: EffectRecord::lasting(EffectData::Count(0)),
        });
    }
    commands
}

/// Confusion lasting 2 to 5 of the battler's own actions.
pub fn inflict_confusion(target: BattlerId, rng: &mut TurnRng) -> BattleCommand {
    let turns = rng.next_in_range(2, 5, "confusion duration") as u8;
    BattleCommand::AddVolatile {
        target,
        kind: VolatileKind::Confusion,
        record: EffectRecord::for_turns(turns, EffectData::None),
    }
}

/// Result of the checks a battler goes through before its move.
#[derive(Debug, Clone, PartialEq)]
pub struct PreActionOutcome {
    pub commands: Vec<BattleCommand>,
    pub proceed: bool,
}

impl PreActionOutcome {
    fn proceed(commands: Vec<BattleCommand>) -> Self {
        Self {
            commands,
            proceed: true,
        }
    }

    fn stop(mut commands: Vec<BattleCommand>, battler: BattlerId, reason: FailureReason) -> Self {
        commands.push(BattleCommand::EmitEvent(BattleEvent::Failed { battler, reason }));
        commands.push(BattleCommand::SetTurnFlag {
            target: battler,
            flag: TurnFlag::MoveFailed,
        });
        Self {
            commands,
            proceed: false,
        }
    }
}

/// Legality checks in fixed order: recharge, sleep, freeze, flinch,
/// confusion, infatuation, paralysis, taunt, disable, PP. `forced` actions
/// (locked moves and Struggle) skip the choice checks at the end.
pub fn pre_action_checks(
    state: &BattleState,
    user: BattlerId,
    move_data: &MoveData,
    forced: bool,
    rng: &mut TurnRng,
) -> PreActionOutcome {
    let Ok(battler) = state.battler(user) else {
        return PreActionOutcome {
            commands: Vec::new(),
            proceed: false,
        };
    };
    let mut commands = Vec::new();

    if battler.persistent.contains(PersistentKind::Recharge) {
        commands.push(BattleCommand::RemovePersistent {
            target: user,
            kind: PersistentKind::Recharge,
            announce: false,
        });
        return PreActionOutcome::stop(commands, user, FailureReason::MustRecharge);
    }

    match battler.status {
        Some(PrimaryStatus::Sleep { turns_remaining }) => {
            if turns_remaining == 0 {
                commands.push(BattleCommand::CureStatus { target: user });
            } else {
                commands.push(BattleCommand::UpdateStatus {
                    target: user,
                    status: PrimaryStatus::Sleep {
                        turns_remaining: turns_remaining - 1,
                    },
                });
                return PreActionOutcome::stop(commands, user, FailureReason::Asleep);
            }
        }
        Some(PrimaryStatus::Freeze) => {
            if rng.percent(20, "thaw") {
                commands.push(BattleCommand::CureStatus { target: user });
            } else {
                return PreActionOutcome::stop(commands, user, FailureReason::Frozen);
            }
        }
        _ => {}
    }

    if state.flags.turn(user).flinched {
        return PreActionOutcome::stop(commands, user, FailureReason::Flinched);
    }

    if let Some(record) = battler.volatiles.get(VolatileKind::Confusion) {
        let remaining = record.remaining.unwrap_or(1).saturating_sub(1);
        if remaining == 0 {
            commands.push(BattleCommand::RemoveVolatile {
                target: user,
                kind: VolatileKind::Confusion,
            });
        } else {
            commands.push(BattleCommand::UpdateVolatile {
                target: user,
                kind: VolatileKind::Confusion,
                record: EffectRecord::for_turns(remaining, record.data),
            });
            if rng.percent(50, "confusion self hit") {
                commands.push(BattleCommand::Damage {
                    target: user,
                    amount: confusion_damage(battler),
                    source: DamageSource::Confusion,
                });
                commands.push(BattleCommand::SetTurnFlag {
                    target: user,
                    flag: TurnFlag::MoveFailed,
                });
                return PreActionOutcome {
                    commands,
                    proceed: false,
                };
            }
        }
    }

    if let Some(source) = battler
        .volatiles
        .get(VolatileKind::Infatuation)
        .and_then(|r| r.source())
    {
        if state.is_alive(source) && rng.percent(50, "infatuation") {
            return PreActionOutcome::stop(commands, user, FailureReason::Infatuated);
        }
    }

    if matches!(battler.status, Some(PrimaryStatus::Paralysis))
        && rng.percent(25, "full paralysis")
    {
        return PreActionOutcome::stop(commands, user, FailureReason::FullyParalyzed);
    }

    if forced {
        return PreActionOutcome::proceed(commands);
    }

    if move_data.category == MoveCategory::Status && battler.persistent.contains(PersistentKind::Taunt)
    {
        return PreActionOutcome::stop(commands, user, FailureReason::Taunted);
    }
    if battler
        .persistent
        .get(PersistentKind::Disable)
        .and_then(|r| r.move_id())
        == Some(move_data.id)
    {
        return PreActionOutcome::stop(commands, user, FailureReason::Disabled);
    }
    if !battler.move_slot(move_data.id).is_some_and(|slot| slot.pp > 0) {
        return PreActionOutcome::stop(commands, user, FailureReason::NoPp);
    }

    PreActionOutcome::proceed(commands)
}

/// End-of-turn damage from poison, bad poison and burn.
pub fn residual_damage(state: &BattleState, id: BattlerId) -> Vec<BattleCommand> {
    let Ok(battler) = state.battler(id) else {
        return Vec::new();
    };
    if battler.is_fainted() {
        return Vec::new();
    }
    match battler.status {
        Some(PrimaryStatus::Poison) => vec![BattleCommand::Damage {
            target: id,
            amount: battler.fraction_of_max_hp(1, 8),
            source: DamageSource::Status(StatusType::Poison),
        }],
        Some(PrimaryStatus::Burn) => vec![BattleCommand::Damage {
            target: id,
            amount: battler.fraction_of_max_hp(1, 8),
            source: DamageSource::Status(StatusType::Burn),
        }],
        Some(PrimaryStatus::BadPoison) => {
            let counter = battler
                .persistent
                .get(PersistentKind::ToxicCounter)
                .map(|r| r.count())
                .unwrap_or(0)
                .saturating_add(1)
                .min(MAX_TOXIC_COUNTER);
            debug!(battler = %id, counter, "toxic damage");
            vec![
                BattleCommand::SetPersistent {
                    target: id,
                    kind: PersistentKind::ToxicCounter,
                    record: EffectRecord::lasting(EffectData::Count(counter)),
                },
                BattleCommand::Damage {
                    target: id,
                    amount: battler.fraction_of_max_hp(counter as u16, 16),
                    source: DamageSource::Status(StatusType::BadPoison),
                },
            ]
        }
        _ => Vec::new(),
    }
}

/// Leech seed drains 1/8 of the seeded battler's max HP into whoever holds
/// the seeding slot.
pub fn leech_seed_drain(state: &BattleState, id: BattlerId) -> Vec<BattleCommand> {
    let Ok(battler) = state.battler(id) else {
        return Vec::new();
    };
    let Some(seeder) = battler
        .volatiles
        .get(VolatileKind::LeechSeed)
        .and_then(|r| r.source())
    else {
        return Vec::new();
    };
    if battler.is_fainted() {
        return Vec::new();
    }
    let amount = battler.fraction_of_max_hp(1, 8).min(battler.current_hp());
    let mut commands = vec![BattleCommand::Damage {
        target: id,
        amount,
        source: DamageSource::LeechSeed,
    }];
    if state.is_alive(seeder) {
        commands.push(BattleCommand::Heal {
            target: seeder,
            amount,
            source: HealSource::LeechSeed,
        });
    }
    commands
}
