//! End of turn: residual damage, perish counts, effect timers and the field.
//!
//! Order: weather chip, then each battler in speed order (held item, status,
//! leech seed, ability), perish counts, battler effect timers, side
//! conditions, global field effects, weather, faint checks.

use crate::battle::abilities::ability_effect;
use crate::battle::commands::BattleCommand;
use crate::battle::conditions::{PersistentKind, TickPoint};
use crate::battle::field::FieldExpiry;
use crate::battle::items::item_effect;
use crate::battle::pipeline::TurnEnv;
use crate::battle::state::{BattleEvent, BattleState, BattlerId, DamageSource};
use crate::battle::stats::effective_speed;
use crate::battle::status::{leech_seed_drain, residual_damage};
use crate::errors::BattleResult;
use schema::{FieldEffectKind, PokemonType, Weather};
use tracing::debug;

pub fn run_end_of_turn(env: &mut TurnEnv) -> BattleResult<()> {
    weather_damage(env)?;
    for id in speed_order(env.state) {
        battler_residuals(env, id)?;
    }
    perish_counts(env)?;
    tick_battler_effects(env)?;
    tick_field(env)?;
    env.check_faints()?;
    Ok(())
}

/// Live battlers, fastest first. Equal speeds keep slot order.
pub fn speed_order(state: &BattleState) -> Vec<BattlerId> {
    let mut ids = state.live_ids();
    ids.sort_by_key(|id| std::cmp::Reverse(effective_speed(state, *id)));
    ids
}

fn weather_damage(env: &mut TurnEnv) -> BattleResult<()> {
    let Some(weather) = env.state.field.weather() else {
        return Ok(());
    };
    let immune_types: &[PokemonType] = match weather {
        Weather::Sandstorm => &[PokemonType::Rock, PokemonType::Ground, PokemonType::Steel],
        Weather::Hail => &[PokemonType::Ice],
        Weather::Rain | Weather::Sun => return Ok(()),
    };

    let mut commands = Vec::new();
    for id in speed_order(env.state) {
        let battler = env.state.battler(id)?;
        if immune_types.iter().any(|t| battler.has_type(*t))
            || ability_effect(battler.ability).weather_immunity(weather)
        {
            continue;
        }
        commands.push(BattleCommand::Damage {
            target: id,
            amount: battler.fraction_of_max_hp(1, 16),
            source: DamageSource::Weather(weather),
        });
    }
    env.run(commands)?;
    env.check_faints()?;
    Ok(())
}

fn battler_residuals(env: &mut TurnEnv, id: BattlerId) -> BattleResult<()> {
    if !env.state.is_alive(id) {
        return Ok(());
    }
    let battler = env.state.battler(id)?;
    let (item, ability) = (battler.item, battler.ability);

    let commands = item_effect(item).end_of_turn(id, env.state);
    env.run(commands)?;
    let commands = residual_damage(env.state, id);
    env.run(commands)?;
    let commands = leech_seed_drain(env.state, id);
    env.run(commands)?;
    if env.state.is_alive(id) {
        let commands = ability_effect(ability).end_of_turn(id, env.state);
        env.run(commands)?;
    }
    env.check_faints()?;
    Ok(())
}

/// Perish Song counts down separately from the other timers: reaching zero
/// knocks the battler out instead of just ending the effect.
fn perish_counts(env: &mut TurnEnv) -> BattleResult<()> {
    for id in env.state.live_ids() {
        let battler = env.state.battler_mut(id)?;
        let Some(record) = battler.persistent.get_mut(PersistentKind::PerishSong) else {
            continue;
        };
        let remaining = record.remaining.unwrap_or(1).saturating_sub(1);
        record.remaining = Some(remaining);
        env.emit(BattleEvent::PerishCount {
            battler: id,
            remaining,
        });
        if remaining == 0 {
            let hp = env.state.battler(id)?.current_hp();
            env.run(vec![
                BattleCommand::RemovePersistent {
                    target: id,
                    kind: PersistentKind::PerishSong,
                    announce: false,
                },
                BattleCommand::Damage {
                    target: id,
                    amount: hp,
                    source: DamageSource::PerishSong,
                },
            ])?;
        }
    }
    env.check_faints()?;
    Ok(())
}

fn tick_battler_effects(env: &mut TurnEnv) -> BattleResult<()> {
    for id in env.state.live_ids() {
        let battler = env.state.battler_mut(id)?;
        let ended_volatiles = battler
            .volatiles
            .tick(|kind| kind.tick_point() == TickPoint::EndOfTurn);
        let ended = battler.persistent.tick(|kind| {
            kind != PersistentKind::PerishSong && kind.tick_point() == TickPoint::EndOfTurn
        });
        for kind in ended_volatiles {
            env.emit(BattleEvent::VolatileEnded { target: id, kind });
        }
        for kind in ended {
            debug!(battler = %id, ?kind, "effect expired");
            env.emit(BattleEvent::EffectEnded { target: id, kind });
        }
    }

    let uproar_continues = env
        .state
        .battlers
        .iter()
        .any(|b| !b.is_fainted() && b.persistent.contains(PersistentKind::UproarLock));
    if env.state.field.has_effect(FieldEffectKind::Uproar) && !uproar_continues {
        env.run(vec![BattleCommand::RemoveFieldEffect {
            effect: FieldEffectKind::Uproar,
        }])?;
    }
    Ok(())
}

fn tick_field(env: &mut TurnEnv) -> BattleResult<()> {
    for expiry in env.state.field.tick() {
        let event = match expiry {
            FieldExpiry::Side(side, condition) => {
                BattleEvent::SideConditionEnded { side, condition }
            }
            FieldExpiry::Global(effect) => BattleEvent::FieldEffectExpired { effect },
            FieldExpiry::Weather(_) => BattleEvent::WeatherChanged {
                weather: None,
                duration: None,
            },
        };
        env.emit(event);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::action_stack::ActionQueue;
    use crate::battle::calculators::DamageRoll;
    use crate::battle::conditions::{EffectData, EffectRecord, PrimaryStatus};
    use crate::battle::field::EffectDuration;
    use crate::battle::rng::TurnRng;
    use crate::battle::state::EventBus;
    use crate::battle::tests::common::{single_battle, TestBattlerBuilder};
    use crate::data_store::{moves, species, ReferenceData};
    use pretty_assertions::assert_eq;
    use schema::HeldItem;

    fn end_turn(state: &mut BattleState) -> Vec<BattleEvent> {
        let data = ReferenceData::builtin().unwrap();
        let mut rng = TurnRng::new_for_test(vec![]);
        let mut bus = EventBus::new();
        let mut queue = ActionQueue::new();
        let mut env = TurnEnv {
            state,
            data: &data,
            rng: &mut rng,
            bus: &mut bus,
            queue: &mut queue,
            roll: DamageRoll::default(),
        };
        run_end_of_turn(&mut env).unwrap();
        bus.into_events()
    }

    #[test]
    fn test_sandstorm_spares_rock_types() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::TYRANITAR, 50).with_moves(vec![moves::TACKLE]),
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::TACKLE]),
        );
        state
            .field
            .set_weather(Weather::Sandstorm, EffectDuration::Turns(5));
        let events = end_turn(&mut state);
        let chipped: Vec<BattlerId> = events
            .iter()
            .filter_map(|e| match e {
                BattleEvent::Damaged {
                    target,
                    source: DamageSource::Weather(Weather::Sandstorm),
                    ..
                } => Some(*target),
                _ => None,
            })
            .collect();
        assert_eq!(chipped, vec![BattlerId(1)]);
    }

    #[test]
    fn test_leftovers_heal_before_poison() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::SNORLAX, 50)
                .with_moves(vec![moves::TACKLE])
                .with_item(HeldItem::Leftovers)
                .with_status(PrimaryStatus::Poison)
                .with_hp(100),
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::TACKLE]),
        );
        let events = end_turn(&mut state);
        let first_heal = events
            .iter()
            .position(|e| matches!(e, BattleEvent::Healed { target: BattlerId(0), .. }));
        let first_poison = events.iter().position(|e| {
            matches!(
                e,
                BattleEvent::Damaged {
                    target: BattlerId(0),
                    ..
                }
            )
        });
        assert!(first_heal.is_some());
        assert!(first_heal < first_poison);
    }

    #[test]
    fn test_perish_count_knocks_out_at_zero() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::SNORLAX, 50).with_moves(vec![moves::TACKLE]),
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::TACKLE]),
        );
        state.battlers[1].persistent.insert(
            PersistentKind::PerishSong,
            EffectRecord::for_turns(2, EffectData::None),
        );

        let events = end_turn(&mut state);
        assert!(events.contains(&BattleEvent::PerishCount {
            battler: BattlerId(1),
            remaining: 1,
        }));
        assert!(state.is_alive(BattlerId(1)));

        let events = end_turn(&mut state);
        assert!(events.contains(&BattleEvent::Fainted {
            battler: BattlerId(1)
        }));
        assert!(!state.battlers[1].persistent.contains(PersistentKind::PerishSong));
    }

    #[test]
    fn test_two_turn_lock_clears_on_second_boundary() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::SNORLAX, 50).with_moves(vec![moves::TACKLE]),
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::TACKLE]),
        );
        state.battlers[0].persistent.insert(
            PersistentKind::Taunt,
            EffectRecord::for_turns(2, EffectData::None),
        );

        end_turn(&mut state);
        assert!(state.battlers[0].persistent.contains(PersistentKind::Taunt));

        let events = end_turn(&mut state);
        assert!(!state.battlers[0].persistent.contains(PersistentKind::Taunt));
        assert!(events.contains(&BattleEvent::EffectEnded {
            target: BattlerId(0),
            kind: PersistentKind::Taunt,
        }));
    }

    #[test]
    fn test_uproar_field_effect_ends_with_last_lock() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::SNORLAX, 50).with_moves(vec![moves::UPROAR]),
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::TACKLE]),
        );
        state
            .field
            .set_effect(FieldEffectKind::Uproar, EffectDuration::UntilReplaced);
        state.battlers[0].persistent.insert(
            PersistentKind::UproarLock,
            EffectRecord::for_turns(1, EffectData::Move(moves::UPROAR)),
        );
        let events = end_turn(&mut state);
        assert!(!state.field.has_effect(FieldEffectKind::Uproar));
        assert!(events.contains(&BattleEvent::FieldEffectExpired {
            effect: FieldEffectKind::Uproar
        }));
    }
}
