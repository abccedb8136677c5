//! Held item capability registry, dispatched the same way as abilities.

use crate::battle::abilities::HitContext;
use crate::battle::commands::BattleCommand;
use crate::battle::state::{BattleEvent, BattleState, BattlerId, DamageSource, HealSource};
use crate::battle::stats::Modifier;
use crate::battler::Battler;
use schema::{HeldItem, MoveCategory, MoveData, PokemonType};

pub trait ItemEffect: Sync {
    fn power_modifier(&self, _move_data: &MoveData) -> Modifier {
        Modifier::NONE
    }

    fn attack_modifier(&self, _move_data: &MoveData) -> Modifier {
        Modifier::NONE
    }

    fn speed_modifier(&self, _owner: &Battler) -> Modifier {
        Modifier::NONE
    }

    fn accuracy_modifier(&self) -> Modifier {
        Modifier::NONE
    }

    fn crit_stage_bonus(&self) -> u8 {
        0
    }

    /// Applied after type effectiveness. `effectiveness` is in percent.
    fn final_damage_modifier(&self, _effectiveness: u16) -> Modifier {
        Modifier::NONE
    }

    /// True when the holder would be left at 1 HP by an otherwise lethal hit.
    fn survives_lethal_hit(&self, _owner: &Battler) -> bool {
        false
    }

    fn locks_choice(&self) -> bool {
        false
    }

    fn on_hit_as_target(&self, _ctx: &HitContext, _state: &BattleState) -> Vec<BattleCommand> {
        Vec::new()
    }

    fn on_hit_as_user(&self, _ctx: &HitContext, _state: &BattleState) -> Vec<BattleCommand> {
        Vec::new()
    }

    fn end_of_turn(&self, _owner: BattlerId, _state: &BattleState) -> Vec<BattleCommand> {
        Vec::new()
    }
}

fn activated(battler: BattlerId, item: HeldItem) -> BattleCommand {
    BattleCommand::EmitEvent(BattleEvent::ItemActivated { battler, item })
}

struct NoItem;
impl ItemEffect for NoItem {}

struct Leftovers;
impl ItemEffect for Leftovers {
    fn end_of_turn(&self, owner: BattlerId, state: &BattleState) -> Vec<BattleCommand> {
        match state.battler(owner) {
            Ok(battler) if !battler.is_fainted() && battler.current_hp() < battler.max_hp() => {
                vec![
                    activated(owner, HeldItem::Leftovers),
                    BattleCommand::Heal {
                        target: owner,
                        amount: battler.fraction_of_max_hp(1, 16),
                        source: HealSource::Item(HeldItem::Leftovers),
                    },
                ]
            }
            _ => Vec::new(),
        }
    }
}

struct BlackSludge;
impl ItemEffect for BlackSludge {
    fn end_of_turn(&self, owner: BattlerId, state: &BattleState) -> Vec<BattleCommand> {
        let Ok(battler) = state.battler(owner) else {
            return Vec::new();
        };
        if battler.is_fainted() {
            return Vec::new();
        }
        if battler.has_type(PokemonType::Poison) {
            if battler.current_hp() == battler.max_hp() {
                return Vec::new();
            }
            vec![
                activated(owner, HeldItem::BlackSludge),
                BattleCommand::Heal {
                    target: owner,
                    amount: battler.fraction_of_max_hp(1, 16),
                    source: HealSource::Item(HeldItem::BlackSludge),
                },
            ]
        } else {
            vec![BattleCommand::Damage {
                target: owner,
                amount: battler.fraction_of_max_hp(1, 8),
                source: DamageSource::Item(HeldItem::BlackSludge),
            }]
        }
    }
}

struct LifeOrb;
impl ItemEffect for LifeOrb {
    fn final_damage_modifier(&self, _effectiveness: u16) -> Modifier {
        Modifier::new(13, 10)
    }

    fn on_hit_as_user(&self, ctx: &HitContext, state: &BattleState) -> Vec<BattleCommand> {
        match state.battler(ctx.user) {
            Ok(user) if ctx.damage > 0 && !user.is_fainted() => vec![BattleCommand::Damage {
                target: ctx.user,
                amount: user.fraction_of_max_hp(1, 10),
                source: DamageSource::Item(HeldItem::LifeOrb),
            }],
            _ => Vec::new(),
        }
    }
}

struct ChoiceItem {
    category: Option<MoveCategory>,
}
impl ItemEffect for ChoiceItem {
    fn attack_modifier(&self, move_data: &MoveData) -> Modifier {
        if self.category == Some(move_data.category) {
            Modifier::ONE_AND_HALF
        } else {
            Modifier::NONE
        }
    }

    fn speed_modifier(&self, _owner: &Battler) -> Modifier {
        if self.category.is_none() {
            Modifier::ONE_AND_HALF
        } else {
            Modifier::NONE
        }
    }

    fn locks_choice(&self) -> bool {
        true
    }
}

struct FocusSash;
impl ItemEffect for FocusSash {
    fn survives_lethal_hit(&self, owner: &Battler) -> bool {
        owner.current_hp() == owner.max_hp() && owner.max_hp() > 1
    }
}

struct SitrusBerry;
impl SitrusBerry {
    fn try_eat(&self, owner: BattlerId, state: &BattleState) -> Vec<BattleCommand> {
        match state.battler(owner) {
            Ok(battler) if !battler.is_fainted() && battler.current_hp() <= battler.max_hp() / 2 => {
                vec![
                    activated(owner, HeldItem::SitrusBerry),
                    BattleCommand::Heal {
                        target: owner,
                        amount: battler.fraction_of_max_hp(1, 4),
                        source: HealSource::Item(HeldItem::SitrusBerry),
                    },
                    BattleCommand::ConsumeItem { target: owner },
                ]
            }
            _ => Vec::new(),
        }
    }
}
impl ItemEffect for SitrusBerry {
    fn on_hit_as_target(&self, ctx: &HitContext, state: &BattleState) -> Vec<BattleCommand> {
        self.try_eat(ctx.target, state)
    }

    fn end_of_turn(&self, owner: BattlerId, state: &BattleState) -> Vec<BattleCommand> {
        self.try_eat(owner, state)
    }
}

struct LumBerry;
impl LumBerry {
    fn try_eat(&self, owner: BattlerId, state: &BattleState) -> Vec<BattleCommand> {
        match state.battler(owner) {
            Ok(battler) if !battler.is_fainted() && battler.status.is_some() => vec![
                activated(owner, HeldItem::LumBerry),
                BattleCommand::CureStatus { target: owner },
                BattleCommand::ConsumeItem { target: owner },
            ],
            _ => Vec::new(),
        }
    }
}
impl ItemEffect for LumBerry {
    fn on_hit_as_target(&self, ctx: &HitContext, state: &BattleState) -> Vec<BattleCommand> {
        self.try_eat(ctx.target, state)
    }

    fn end_of_turn(&self, owner: BattlerId, state: &BattleState) -> Vec<BattleCommand> {
        self.try_eat(owner, state)
    }
}

struct ScopeLens;
impl ItemEffect for ScopeLens {
    fn crit_stage_bonus(&self) -> u8 {
        1
    }
}

struct WideLens;
impl ItemEffect for WideLens {
    fn accuracy_modifier(&self) -> Modifier {
        Modifier::new(11, 10)
    }
}

struct ExpertBelt;
impl ItemEffect for ExpertBelt {
    fn final_damage_modifier(&self, effectiveness: u16) -> Modifier {
        if effectiveness > 100 {
            Modifier::new(6, 5)
        } else {
            Modifier::NONE
        }
    }
}

struct CategoryBoost {
    category: MoveCategory,
}
impl ItemEffect for CategoryBoost {
    fn power_modifier(&self, move_data: &MoveData) -> Modifier {
        if move_data.category == self.category {
            Modifier::new(11, 10)
        } else {
            Modifier::NONE
        }
    }
}

struct IronBall;
impl ItemEffect for IronBall {
    fn speed_modifier(&self, _owner: &Battler) -> Modifier {
        Modifier::HALF
    }
}

struct ShellBell;
impl ItemEffect for ShellBell {
    fn on_hit_as_user(&self, ctx: &HitContext, state: &BattleState) -> Vec<BattleCommand> {
        match state.battler(ctx.user) {
            Ok(user) if ctx.damage >= 8 && !user.is_fainted() && user.current_hp() < user.max_hp() => {
                vec![
                    activated(ctx.user, HeldItem::ShellBell),
                    BattleCommand::Heal {
                        target: ctx.user,
                        amount: ctx.damage / 8,
                        source: HealSource::Item(HeldItem::ShellBell),
                    },
                ]
            }
            _ => Vec::new(),
        }
    }
}

struct TypeBoost {
    move_type: PokemonType,
}
impl ItemEffect for TypeBoost {
    fn power_modifier(&self, move_data: &MoveData) -> Modifier {
        if move_data.move_type == self.move_type {
            Modifier::new(6, 5)
        } else {
            Modifier::NONE
        }
    }
}

static NO_ITEM: NoItem = NoItem;
static LEFTOVERS: Leftovers = Leftovers;
static BLACK_SLUDGE: BlackSludge = BlackSludge;
static LIFE_ORB: LifeOrb = LifeOrb;
static CHOICE_BAND: ChoiceItem = ChoiceItem {
    category: Some(MoveCategory::Physical),
};
static CHOICE_SPECS: ChoiceItem = ChoiceItem {
    category: Some(MoveCategory::Special),
};
static CHOICE_SCARF: ChoiceItem = ChoiceItem { category: None };
static FOCUS_SASH: FocusSash = FocusSash;
static SITRUS_BERRY: SitrusBerry = SitrusBerry;
static LUM_BERRY: LumBerry = LumBerry;
static SCOPE_LENS: ScopeLens = ScopeLens;
static WIDE_LENS: WideLens = WideLens;
static EXPERT_BELT: ExpertBelt = ExpertBelt;
static MUSCLE_BAND: CategoryBoost = CategoryBoost {
    category: MoveCategory::Physical,
};
static WISE_GLASSES: CategoryBoost = CategoryBoost {
    category: MoveCategory::Special,
};
static IRON_BALL: IronBall = IronBall;
static SHELL_BELL: ShellBell = ShellBell;
static CHARCOAL: TypeBoost = TypeBoost {
    move_type: PokemonType::Fire,
};
static MYSTIC_WATER: TypeBoost = TypeBoost {
    move_type: PokemonType::Water,
};
static MIRACLE_SEED: TypeBoost = TypeBoost {
    move_type: PokemonType::Grass,
};
static MAGNET: TypeBoost = TypeBoost {
    move_type: PokemonType::Electric,
};

pub fn item_effect(item: Option<HeldItem>) -> &'static dyn ItemEffect {
    let Some(item) = item else {
        return &NO_ITEM;
    };
    match item {
        HeldItem::Leftovers => &LEFTOVERS,
        HeldItem::BlackSludge => &BLACK_SLUDGE,
        HeldItem::LifeOrb => &LIFE_ORB,
        HeldItem::ChoiceBand => &CHOICE_BAND,
        HeldItem::ChoiceSpecs => &CHOICE_SPECS,
        HeldItem::ChoiceScarf => &CHOICE_SCARF,
        HeldItem::FocusSash => &FOCUS_SASH,
        HeldItem::SitrusBerry => &SITRUS_BERRY,
        HeldItem::LumBerry => &LUM_BERRY,
        HeldItem::ScopeLens => &SCOPE_LENS,
        HeldItem::WideLens => &WIDE_LENS,
        HeldItem::ExpertBelt => &EXPERT_BELT,
        HeldItem::MuscleBand => &MUSCLE_BAND,
        HeldItem::WiseGlasses => &WISE_GLASSES,
        HeldItem::IronBall => &IRON_BALL,
        HeldItem::ShellBell => &SHELL_BELL,
        HeldItem::Charcoal => &CHARCOAL,
        HeldItem::MysticWater => &MYSTIC_WATER,
        HeldItem::MiracleSeed => &MIRACLE_SEED,
        HeldItem::Magnet => &MAGNET,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::conditions::PrimaryStatus;
    use crate::battle::tests::common::{single_battle, TestBattlerBuilder};
    use crate::data_store::{moves, species};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_leftovers_heals_sixteenth_when_hurt() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::SNORLAX, 50)
                .with_moves(vec![moves::TACKLE])
                .with_item(HeldItem::Leftovers),
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::TACKLE]),
        );
        let effect = item_effect(Some(HeldItem::Leftovers));
        assert!(effect.end_of_turn(BattlerId(0), &state).is_empty());

        state.battlers[0].take_damage(50);
        let amount = state.battlers[0].fraction_of_max_hp(1, 16);
        assert_eq!(
            effect.end_of_turn(BattlerId(0), &state),
            vec![
                activated(BattlerId(0), HeldItem::Leftovers),
                BattleCommand::Heal {
                    target: BattlerId(0),
                    amount,
                    source: HealSource::Item(HeldItem::Leftovers),
                },
            ]
        );
    }

    #[test]
    fn test_lum_berry_cures_and_is_consumed() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::SNORLAX, 50)
                .with_moves(vec![moves::TACKLE])
                .with_item(HeldItem::LumBerry),
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::TACKLE]),
        );
        state.battlers[0].set_status(PrimaryStatus::Burn);
        let commands = item_effect(Some(HeldItem::LumBerry)).end_of_turn(BattlerId(0), &state);
        assert_eq!(commands.len(), 3);
        assert_eq!(commands[2], BattleCommand::ConsumeItem { target: BattlerId(0) });
    }

    #[test]
    fn test_focus_sash_needs_full_hp() {
        let mut state = single_battle(
            TestBattlerBuilder::new(species::PIKACHU, 50)
                .with_moves(vec![moves::TACKLE])
                .with_item(HeldItem::FocusSash),
            TestBattlerBuilder::new(species::PIKACHU, 50).with_moves(vec![moves::TACKLE]),
        );
        let sash = item_effect(Some(HeldItem::FocusSash));
        assert!(sash.survives_lethal_hit(&state.battlers[0]));
        state.battlers[0].take_damage(1);
        assert!(!sash.survives_lethal_hit(&state.battlers[0]));
    }

    #[test]
    fn test_choice_items_lock() {
        assert!(item_effect(Some(HeldItem::ChoiceScarf)).locks_choice());
        assert!(!item_effect(Some(HeldItem::LifeOrb)).locks_choice());
        assert!(!item_effect(None).locks_choice());
    }
}
