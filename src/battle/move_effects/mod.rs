//! Move effect handlers.
//!
//! Handlers read the state and return commands; the pipeline executes them.
//! Effects fall in three groups: those applied to each target a move
//! connects with (`BattleMoveEffectExt::apply`), those that shape the hit
//! itself (fixed damage, hit counts, charge turns), and those resolved once
//! after every target has been handled (`BattleMoveDataExt`).

mod damage_effects;
mod special_effects;
mod stat_effects;
mod status_effects;

pub use self::damage_effects::counter_target;

use crate::battle::commands::BattleCommand;
use crate::battle::conditions::{SemiInvulnerablePosition, VolatileKind};
use crate::battle::rng::TurnRng;
use crate::battle::state::{BattleState, BattlerId, FailureReason};
use schema::{MoveCategory, MoveData, MoveEffect, MoveFlag, StatusType, Target};

use self::{damage_effects::*, special_effects::*, stat_effects::*, status_effects::*};

#[derive(Debug, Clone, Copy)]
pub struct EffectContext<'a> {
    pub user: BattlerId,
    pub target: BattlerId,
    pub move_data: &'a MoveData,
}

impl<'a> EffectContext<'a> {
    pub fn new(user: BattlerId, target: BattlerId, move_data: &'a MoveData) -> Self {
        Self {
            user,
            target,
            move_data,
        }
    }

    pub fn target_id(&self, target: &Target) -> BattlerId {
        match target {
            Target::User => self.user,
            Target::Target => self.target,
        }
    }

    /// Status moves report why they failed; secondary effects of damaging
    /// moves fail silently.
    pub fn is_primary(&self) -> bool {
        self.move_data.category == MoveCategory::Status
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EffectResult {
    Continue(Vec<BattleCommand>),
    /// The commands run and the rest of the move is skipped this turn.
    Skip(Vec<BattleCommand>),
    Failed(FailureReason),
}

impl EffectResult {
    /// Fold a failure into nothing for effects whose failure is silent.
    fn or_silent(self, ctx: &EffectContext) -> EffectResult {
        match self {
            EffectResult::Failed(_) if !ctx.is_primary() => EffectResult::Continue(Vec::new()),
            other => other,
        }
    }
}

pub trait BattleMoveEffectExt {
    /// The effect on one target the move connected with.
    fn apply(&self, ctx: &EffectContext, state: &BattleState, rng: &mut TurnRng) -> EffectResult;
}

pub trait BattleMoveDataExt {
    /// The commands for the first turn of a two-turn move, or `None` when
    /// the move resolves this turn.
    fn charge_turn(&self, user: BattlerId, state: &BattleState) -> Option<EffectResult>;

    /// A reason the move fails against `ctx.target` before any roll.
    fn pre_hit_failure(&self, ctx: &EffectContext, state: &BattleState) -> Option<FailureReason>;

    /// Damage that ignores the usual formula, if the move deals any.
    fn fixed_damage(&self, ctx: &EffectContext, state: &BattleState) -> Option<u16>;

    /// How many times the move strikes each target.
    fn hit_count(&self, rng: &mut TurnRng) -> u8;

    fn apply_damage_based_effects(
        &self,
        ctx: &EffectContext,
        state: &BattleState,
        damage_dealt: u16,
    ) -> Vec<BattleCommand>;

    /// Effects resolved once per use after every target. `connected` is
    /// true if the move hit at least one target.
    fn apply_move_end_effects(
        &self,
        user: BattlerId,
        state: &BattleState,
        rng: &mut TurnRng,
        connected: bool,
    ) -> Vec<BattleCommand>;
}

impl BattleMoveEffectExt for MoveEffect {
    fn apply(&self, ctx: &EffectContext, state: &BattleState, rng: &mut TurnRng) -> EffectResult {
        let shielded = ctx.target != ctx.user
            && !ctx.move_data.has_flag(MoveFlag::Sound)
            && state
                .battler(ctx.target)
                .is_ok_and(|b| b.volatiles.contains(VolatileKind::Substitute));
        if shielded && is_blocked_by_substitute(self) {
            return EffectResult::Failed(FailureReason::SubstituteBlocks).or_silent(ctx);
        }

        let result = match self {
            Self::Burn(chance) => apply_status_effect(StatusType::Burn, *chance, ctx, state, rng),
            Self::Freeze(chance) => {
                apply_status_effect(StatusType::Freeze, *chance, ctx, state, rng)
            }
            Self::Paralyze(chance) => {
                apply_status_effect(StatusType::Paralysis, *chance, ctx, state, rng)
            }
            Self::Poison(chance) => {
                apply_status_effect(StatusType::Poison, *chance, ctx, state, rng)
            }
            Self::BadPoison(chance) => {
                apply_status_effect(StatusType::BadPoison, *chance, ctx, state, rng)
            }
            Self::Sedate(chance) => apply_status_effect(StatusType::Sleep, *chance, ctx, state, rng),
            Self::Confuse(chance) => apply_confuse_effect(*chance, ctx, state, rng),
            Self::Flinch(chance) => apply_flinch_effect(*chance, ctx, state, rng),
            Self::FakeOut => apply_flinch_effect(100, ctx, state, rng),
            Self::Infatuate => apply_infatuate_effect(ctx, state),
            Self::Seed => apply_seed_effect(ctx, state),
            Self::StatChange(target, stat, stages, chance) => {
                apply_stat_change_effect(target, *stat, *stages, *chance, ctx, state, rng)
            }
            Self::Haze => apply_haze_effect(),
            Self::Protect => apply_protect_special(false, ctx, state, rng),
            Self::Endure => apply_protect_special(true, ctx, state, rng),
            Self::Substitute => apply_substitute_special(ctx, state),
            Self::Encore => apply_encore_special(ctx, state),
            Self::Taunt => apply_taunt_special(ctx, state),
            Self::Disable => apply_disable_special(ctx, state),
            Self::FocusEnergy => apply_focus_energy_special(ctx, state),
            Self::PerishSong => apply_perish_song_special(state),
            Self::Charge => apply_charge_special(ctx),
            Self::LockOn => apply_lock_on_special(ctx, state),
            Self::MagnetRise => apply_magnet_rise_special(ctx, state),
            Self::SetWeather(weather) => apply_weather_special(*weather, state),
            Self::SetSideCondition(condition) => apply_side_condition_special(*condition, ctx, state),
            Self::SetFieldEffect(effect) => apply_field_effect_special(*effect, state),
            Self::Heal(percentage) => apply_heal_special(*percentage, ctx, state),
            Self::Rest => apply_rest_special(ctx, state),
            Self::MoveNext => apply_reorder_special(crate::battle::state::OrderShift::Next, ctx),
            Self::MoveLast => apply_reorder_special(crate::battle::state::OrderShift::Last, ctx),
            _ => EffectResult::Continue(Vec::new()),
        };
        result.or_silent(ctx)
    }
}

/// Effects a substitute keeps away from the battler behind it.
fn is_blocked_by_substitute(effect: &MoveEffect) -> bool {
    match effect {
        MoveEffect::Burn(_)
        | MoveEffect::Freeze(_)
        | MoveEffect::Paralyze(_)
        | MoveEffect::Poison(_)
        | MoveEffect::BadPoison(_)
        | MoveEffect::Sedate(_)
        | MoveEffect::Confuse(_)
        | MoveEffect::Flinch(_)
        | MoveEffect::FakeOut
        | MoveEffect::Infatuate
        | MoveEffect::Seed
        | MoveEffect::Encore
        | MoveEffect::Taunt
        | MoveEffect::Disable
        | MoveEffect::LockOn
        | MoveEffect::MoveLast => true,
        MoveEffect::StatChange(target, ..) => matches!(target, Target::Target),
        _ => false,
    }
}

impl BattleMoveDataExt for MoveData {
    fn charge_turn(&self, user: BattlerId, state: &BattleState) -> Option<EffectResult> {
        self.effects.iter().find_map(|effect| match effect {
            MoveEffect::ChargeUp { skip_in } => apply_charge_up_special(*skip_in, user, self, state),
            MoveEffect::InAir => apply_semi_invulnerable_special(
                SemiInvulnerablePosition::InAir,
                user,
                self,
                state,
            ),
            MoveEffect::Underground => apply_semi_invulnerable_special(
                SemiInvulnerablePosition::Underground,
                user,
                self,
                state,
            ),
            _ => None,
        })
    }

    fn pre_hit_failure(&self, ctx: &EffectContext, state: &BattleState) -> Option<FailureReason> {
        self.effects.iter().find_map(|effect| match effect {
            MoveEffect::FakeOut => fake_out_failure(ctx, state),
            MoveEffect::OHKO => ohko_failure(ctx, state),
            MoveEffect::Counter | MoveEffect::MirrorCoat => {
                if counter_damage(effect, ctx, state).is_none() {
                    Some(FailureReason::NothingToCounter)
                } else {
                    None
                }
            }
            _ => None,
        })
    }

    fn fixed_damage(&self, ctx: &EffectContext, state: &BattleState) -> Option<u16> {
        self.effects
            .iter()
            .find_map(|effect| fixed_damage_for(effect, ctx, state))
    }

    fn hit_count(&self, rng: &mut TurnRng) -> u8 {
        self.effects
            .iter()
            .find_map(|effect| match effect {
                MoveEffect::MultiHit(min, max) => Some(roll_hit_count(*min, *max, rng)),
                _ => None,
            })
            .unwrap_or(1)
    }

    fn apply_damage_based_effects(
        &self,
        ctx: &EffectContext,
        state: &BattleState,
        damage_dealt: u16,
    ) -> Vec<BattleCommand> {
        let mut all_commands = Vec::new();
        if damage_dealt == 0 {
            return all_commands;
        }
        for effect in &self.effects {
            match effect {
                MoveEffect::Recoil(percentage) => {
                    all_commands.extend(apply_recoil_effect(*percentage, ctx, state, damage_dealt));
                }
                MoveEffect::Drain(percentage) => {
                    all_commands.extend(apply_drain_effect(*percentage, ctx, state, damage_dealt));
                }
                _ => {}
            }
        }
        all_commands
    }

    fn apply_move_end_effects(
        &self,
        user: BattlerId,
        state: &BattleState,
        rng: &mut TurnRng,
        connected: bool,
    ) -> Vec<BattleCommand> {
        let mut all_commands = Vec::new();
        for effect in &self.effects {
            match effect {
                MoveEffect::Explode => all_commands.extend(apply_explode_special(user, state)),
                MoveEffect::Exhaust if connected => {
                    all_commands.extend(apply_exhaust_special(user));
                }
                MoveEffect::Rampage => {
                    all_commands.extend(apply_rampage_special(user, self, state, rng));
                }
                MoveEffect::Uproar => all_commands.extend(apply_uproar_special(user, self, state)),
                MoveEffect::Rollout => {
                    all_commands.extend(apply_rollout_chain(user, state, connected));
                }
                MoveEffect::FuryCutter => {
                    all_commands.extend(apply_fury_cutter_chain(user, state, connected));
                }
                _ => {}
            }
        }
        all_commands.extend(reset_broken_chains(user, self, state));
        all_commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::conditions::{EffectData, EffectRecord, PrimaryStatus};
    use crate::battle::tests::common::{single_battle, TestBattlerBuilder};
    use crate::data_store::{moves, species, ReferenceData};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use schema::{Gender, SideCondition, StatType};

    fn state() -> BattleState {
        single_battle(
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::THUNDER_WAVE]),
            TestBattlerBuilder::new(species::SNORLAX, 50).with_moves(vec![moves::TACKLE]),
        )
    }

    #[test]
    fn test_status_move_reports_existing_status() {
        let mut state = state();
        state.battlers[1].set_status(PrimaryStatus::Burn);
        let data = ReferenceData::builtin().unwrap();
        let wave = data.move_data(moves::THUNDER_WAVE).unwrap();
        let ctx = EffectContext::new(BattlerId(0), BattlerId(1), wave);
        let mut rng = TurnRng::new_for_test(vec![]);
        assert_eq!(
            wave.effects[0].apply(&ctx, &state, &mut rng),
            EffectResult::Failed(FailureReason::AlreadyAffected)
        );
    }

    #[test]
    fn test_secondary_effect_failure_is_silent() {
        let mut state = state();
        state.battlers[1].set_status(PrimaryStatus::Burn);
        let data = ReferenceData::builtin().unwrap();
        let thunderbolt = data.move_data(moves::THUNDERBOLT).unwrap();
        let ctx = EffectContext::new(BattlerId(0), BattlerId(1), thunderbolt);
        let mut rng = TurnRng::new_for_test(vec![]);
        assert_eq!(
            thunderbolt.effects[0].apply(&ctx, &state, &mut rng),
            EffectResult::Continue(vec![])
        );
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_substitute_blocks_status_moves() {
        let mut state = state();
        state.battlers[1].add_volatile(
            VolatileKind::Substitute,
            EffectRecord::lasting(EffectData::Hp(40)),
        );
        let data = ReferenceData::builtin().unwrap();
        let wave = data.move_data(moves::THUNDER_WAVE).unwrap();
        let growl = data.move_data(moves::GROWL).unwrap();
        let mut rng = TurnRng::new_for_test(vec![]);

        let ctx = EffectContext::new(BattlerId(0), BattlerId(1), wave);
        assert_eq!(
            wave.effects[0].apply(&ctx, &state, &mut rng),
            EffectResult::Failed(FailureReason::SubstituteBlocks)
        );

        // sound moves go through
        let ctx = EffectContext::new(BattlerId(0), BattlerId(1), growl);
        assert_eq!(
            growl.effects[0].apply(&ctx, &state, &mut rng),
            EffectResult::Continue(vec![BattleCommand::ChangeStatStage {
                target: BattlerId(1),
                stat: StatType::Attack,
                delta: -1,
            }])
        );
    }

    #[test]
    fn test_hazards_land_on_the_opposing_side() {
        let state = state();
        let data = ReferenceData::builtin().unwrap();
        let spikes = data.move_data(moves::SPIKES).unwrap();
        let ctx = EffectContext::new(BattlerId(0), BattlerId(0), spikes);
        let mut rng = TurnRng::new_for_test(vec![]);
        let EffectResult::Continue(commands) = spikes.effects[0].apply(&ctx, &state, &mut rng)
        else {
            panic!("spikes should succeed");
        };
        assert!(matches!(
            commands[0],
            BattleCommand::AddSideCondition {
                side: 1,
                condition: SideCondition::Spikes,
                ..
            }
        ));
    }

    #[test]
    fn test_multi_hit_distribution_bounds() {
        let data = ReferenceData::builtin().unwrap();
        let bullet_seed = data.move_data(moves::BULLET_SEED).unwrap();
        let double_kick = data.move_data(moves::DOUBLE_KICK).unwrap();

        assert_eq!(bullet_seed.hit_count(&mut TurnRng::new_for_test(vec![1])), 2);
        assert_eq!(bullet_seed.hit_count(&mut TurnRng::new_for_test(vec![6])), 3);
        assert_eq!(bullet_seed.hit_count(&mut TurnRng::new_for_test(vec![7])), 4);
        assert_eq!(bullet_seed.hit_count(&mut TurnRng::new_for_test(vec![8])), 5);

        let mut rng = TurnRng::new_for_test(vec![]);
        assert_eq!(double_kick.hit_count(&mut rng), 2);
        assert_eq!(rng.draws(), 0);
    }

    #[rstest]
    #[case(Gender::Male, Gender::Female, true)]
    #[case(Gender::Female, Gender::Male, true)]
    #[case(Gender::Male, Gender::Male, false)]
    #[case(Gender::Genderless, Gender::Female, false)]
    fn test_attract_needs_opposite_genders(
        #[case] user: Gender,
        #[case] target: Gender,
        #[case] lands: bool,
    ) {
        let state = single_battle(
            TestBattlerBuilder::new(species::PIKACHU, 50)
                .with_moves(vec![moves::ATTRACT])
                .with_gender(user),
            TestBattlerBuilder::new(species::JOLTEON, 50)
                .with_moves(vec![moves::TACKLE])
                .with_gender(target),
        );
        let data = ReferenceData::builtin().unwrap();
        let attract = data.move_data(moves::ATTRACT).unwrap();
        let ctx = EffectContext::new(BattlerId(0), BattlerId(1), attract);

        let result = attract.effects[0].apply(&ctx, &state, &mut TurnRng::new_for_test(vec![]));

        if lands {
            assert!(matches!(result, EffectResult::Continue(ref commands) if commands.len() == 1));
        } else {
            assert_eq!(result, EffectResult::Failed(FailureReason::Immune));
        }
    }
}
