#[cfg(test)]
mod tests {
    use crate::battle::action_stack::BattleAction;
    use crate::battle::engine::{Battle, RejectReason, Submission};
    use crate::battle::state::{BattleEvent, BattleOutcome, BattlerId, GameState};
    use crate::battle::tests::common::{battle_with, TestBattlerBuilder};
    use crate::config::BattleFormat;
    use crate::data_store::{moves, species};
    use pretty_assertions::assert_eq;

    fn machamp_vs_magikarps(magikarps: usize) -> Battle {
        battle_with(
            BattleFormat::Single,
            vec![TestBattlerBuilder::new(species::MACHAMP, 100)
                .with_moves(vec![moves::KARATE_CHOP])],
            (0..magikarps)
                .map(|_| TestBattlerBuilder::new(species::MAGIKARP, 5).with_moves(vec![moves::TACKLE]))
                .collect(),
            99,
        )
    }

    fn chop_and_tackle(battle: &mut Battle) {
        battle.submit_action(
            BattlerId(0),
            BattleAction::UseMove {
                move_id: moves::KARATE_CHOP,
                target: None,
            },
        );
        battle.submit_action(
            BattlerId(1),
            BattleAction::UseMove {
                move_id: moves::TACKLE,
                target: None,
            },
        );
    }

    fn fainted_count(events: &[BattleEvent], battler: BattlerId) -> usize {
        events
            .iter()
            .filter(|e| **e == BattleEvent::Fainted { battler })
            .count()
    }

    #[test]
    fn test_overkill_stops_at_zero_and_faints_once() {
        // Arrange
        let mut battle = machamp_vs_magikarps(2);
        chop_and_tackle(&mut battle);

        // Act
        let log = battle.resolve_turn().unwrap();

        // Assert
        assert_eq!(battle.state().battlers[1].current_hp(), 0);
        assert_eq!(fainted_count(&log.events, BattlerId(1)), 1);
        let remaining: Vec<u16> = log
            .events
            .iter()
            .filter_map(|e| match e {
                BattleEvent::Hit { remaining_hp, .. } => Some(*remaining_hp),
                _ => None,
            })
            .collect();
        assert_eq!(remaining, vec![0]);
    }

    #[test]
    fn test_fainted_battler_loses_its_action() {
        let mut battle = machamp_vs_magikarps(2);
        chop_and_tackle(&mut battle);
        let log = battle.resolve_turn().unwrap();

        assert!(!log
            .events
            .iter()
            .any(|e| matches!(e, BattleEvent::MoveUsed { user: BattlerId(1), .. })));
        assert_eq!(
            battle.state().battlers[0].current_hp(),
            battle.state().battlers[0].max_hp()
        );
    }

    #[test]
    fn test_fainted_slot_waits_for_a_replacement() {
        let mut battle = machamp_vs_magikarps(2);
        chop_and_tackle(&mut battle);
        battle.resolve_turn().unwrap();

        assert_eq!(
            battle.state().game_state,
            GameState::WaitingForReplacements(vec![BattlerId(1)])
        );
        assert_eq!(
            battle.submit_replacement(BattlerId(1), 5),
            Submission::Rejected(RejectReason::InvalidSwitch)
        );
        assert_eq!(battle.submit_replacement(BattlerId(1), 0), Submission::Accepted);

        let log = battle.resolve_replacements().unwrap();
        assert!(log
            .events
            .iter()
            .any(|e| matches!(e, BattleEvent::Switched { battler: BattlerId(1), .. })));
        assert_eq!(battle.state().game_state, GameState::WaitingForActions);
        assert!(battle.state().is_alive(BattlerId(1)));
        // the fainted Magikarp stays fainted on the bench
        assert!(battle.state().benches[1][0].is_fainted());
        assert!(battle.state().available_replacements(1).is_empty());
    }

    #[test]
    fn test_last_faint_ends_the_battle() {
        let mut battle = machamp_vs_magikarps(1);
        chop_and_tackle(&mut battle);
        let log = battle.resolve_turn().unwrap();

        assert_eq!(
            battle.state().game_state,
            GameState::Finished(BattleOutcome::Winner(0))
        );
        assert!(log.events.contains(&BattleEvent::BattleEnded {
            outcome: BattleOutcome::Winner(0)
        }));
        assert_eq!(log.events.last(), Some(&BattleEvent::TurnEnded { turn: 1 }));
        assert!(battle.is_over());
    }
}
