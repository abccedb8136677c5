#[cfg(test)]
mod tests {
    use crate::battle::conditions::{
        EffectData, EffectRecord, PersistentKind, PrimaryStatus, VolatileKind,
    };
    use crate::battle::engine::switch_in;
    use crate::battle::field::EffectDuration;
    use crate::battle::rng::TurnRng;
    use crate::battle::state::{BattleEvent, BattleState, BattlerId, DamageSource};
    use crate::battle::tests::common::{run_phase, TestBattlerBuilder};
    use crate::config::BattleFormat;
    use crate::data_store::{moves, species};
    use pretty_assertions::assert_eq;
    use schema::{SideCondition, StatType};

    fn with_bench(active: TestBattlerBuilder, bench: TestBattlerBuilder) -> BattleState {
        let foe = TestBattlerBuilder::new(species::SNORLAX, 50).with_moves(vec![moves::TACKLE]);
        BattleState::new(
            BattleFormat::Single,
            [vec![active.build(1), bench.build(2)], vec![foe.build(3)]],
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip_keeps_status_but_clears_volatiles() {
        // Arrange: a badly poisoned, confused, boosted Pikachu
        let mut state = with_bench(
            TestBattlerBuilder::new(species::PIKACHU, 50)
                .with_moves(vec![moves::THUNDERBOLT])
                .with_status(PrimaryStatus::BadPoison),
            TestBattlerBuilder::new(species::JOLTEON, 50).with_moves(vec![moves::THUNDERBOLT]),
        );
        let pikachu = &mut state.battlers[0];
        pikachu
            .persistent
            .insert(PersistentKind::ToxicCounter, EffectRecord::lasting(EffectData::Count(3)));
        pikachu.add_volatile(
            VolatileKind::Confusion,
            EffectRecord::for_turns(3, EffectData::None),
        );
        pikachu.modify_stat_stage(StatType::Attack, 2);

        // Act: switch out to Jolteon, then back
        let mut rng = TurnRng::new_for_test(vec![]);
        let events = run_phase(&mut state, &mut rng, |env| {
            switch_in(env, BattlerId(0), 0)?;
            switch_in(env, BattlerId(0), 0)
        });

        // Assert
        let pikachu = &state.battlers[0];
        assert_eq!(pikachu.uid, 1);
        assert_eq!(pikachu.status, Some(PrimaryStatus::BadPoison));
        assert_eq!(
            pikachu
                .persistent
                .get(PersistentKind::ToxicCounter)
                .map(|r| r.data),
            Some(EffectData::Count(3))
        );
        assert!(!pikachu.volatiles.contains(VolatileKind::Confusion));
        assert_eq!(pikachu.stat_stage(StatType::Attack), 0);
        assert_eq!(state.benches[0][0].uid, 2);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, BattleEvent::Switched { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_stealth_rock_scales_with_rock_weakness() {
        let mut state = with_bench(
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::THUNDERBOLT]),
            TestBattlerBuilder::new(species::CHARIZARD, 50).with_moves(vec![moves::FLAMETHROWER]),
        );
        state
            .field
            .add_side_condition(0, SideCondition::StealthRock, EffectDuration::UntilReplaced);
        let max_hp = state.benches[0][0].max_hp();

        let mut rng = TurnRng::new_for_test(vec![]);
        let events = run_phase(&mut state, &mut rng, |env| switch_in(env, BattlerId(0), 0));

        // Fire/Flying takes four times the base eighth
        assert!(events.contains(&BattleEvent::Damaged {
            target: BattlerId(0),
            source: DamageSource::Hazard(SideCondition::StealthRock),
            amount: max_hp / 2,
            remaining_hp: max_hp - max_hp / 2,
        }));
    }

    #[test]
    fn test_spikes_miss_levitating_battlers() {
        let mut state = with_bench(
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::THUNDERBOLT]),
            TestBattlerBuilder::new(species::GENGAR, 50).with_moves(vec![moves::SHADOW_BALL]),
        );
        state
            .field
            .add_side_condition(0, SideCondition::Spikes, EffectDuration::UntilReplaced);

        let mut rng = TurnRng::new_for_test(vec![]);
        let events = run_phase(&mut state, &mut rng, |env| switch_in(env, BattlerId(0), 0));

        assert!(!events
            .iter()
            .any(|e| matches!(e, BattleEvent::Damaged { .. })));
        assert_eq!(state.battlers[0].species, species::GENGAR);
    }

    #[test]
    fn test_toxic_spikes_poison_grounded_switch_ins() {
        let mut state = with_bench(
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::THUNDERBOLT]),
            TestBattlerBuilder::new(species::SNORLAX, 50)
                .with_moves(vec![moves::TACKLE])
                .without_ability(),
        );
        for _ in 0..2 {
            state
                .field
                .add_side_condition(0, SideCondition::ToxicSpikes, EffectDuration::UntilReplaced);
        }

        let mut rng = TurnRng::new_for_test(vec![]);
        run_phase(&mut state, &mut rng, |env| switch_in(env, BattlerId(0), 0));

        assert_eq!(state.battlers[0].status, Some(PrimaryStatus::BadPoison));
    }
}
