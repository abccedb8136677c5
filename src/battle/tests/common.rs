use crate::battle::action_stack::ActionQueue;
use crate::battle::calculators::DamageRoll;
use crate::battle::conditions::PrimaryStatus;
use crate::battle::engine::Battle;
use crate::battle::pipeline::{execute_move, TurnEnv};
use crate::battle::rng::TurnRng;
use crate::battle::state::{BattleEvent, BattleState, BattlerId, EventBus};
use crate::battler::Battler;
use crate::config::{BattleConfig, BattleFormat};
use crate::data_store::ReferenceData;
use crate::errors::BattleResult;
use schema::{Ability, Gender, HeldItem, MoveId, SpeciesId};

/// Builds battlers from the built-in tables with test-friendly overrides.
///
/// ```ignore
/// let snorlax = TestBattlerBuilder::new(species::SNORLAX, 50)
///     .with_moves(vec![moves::TACKLE])
///     .with_status(PrimaryStatus::Paralysis)
///     .build(1);
/// ```
#[derive(Debug, Clone)]
pub struct TestBattlerBuilder {
    species: SpeciesId,
    level: u8,
    moves: Vec<MoveId>,
    ability: Option<Option<Ability>>,
    item: Option<HeldItem>,
    gender: Option<Gender>,
    status: Option<PrimaryStatus>,
    current_hp: Option<u16>,
}

impl TestBattlerBuilder {
    pub fn new(species: SpeciesId, level: u8) -> Self {
        Self {
            species,
            level,
            moves: Vec::new(),
            ability: None,
            item: None,
            gender: None,
            status: None,
            current_hp: None,
        }
    }

    pub fn with_moves(mut self, moves: Vec<MoveId>) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_ability(mut self, ability: Ability) -> Self {
        self.ability = Some(Some(ability));
        self
    }

    /// Strip the species' default ability.
    pub fn without_ability(mut self) -> Self {
        self.ability = Some(None);
        self
    }

    pub fn with_item(mut self, item: HeldItem) -> Self {
        self.item = Some(item);
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn with_status(mut self, status: PrimaryStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Current HP. Defaults to full.
    pub fn with_hp(mut self, hp: u16) -> Self {
        self.current_hp = Some(hp);
        self
    }

    pub fn build(self, uid: u32) -> Battler {
        let data = ReferenceData::builtin().expect("built-in tables parse");
        let mut battler = Battler::from_data(&data, uid, self.species, self.level, &self.moves)
            .unwrap_or_else(|e| panic!("test battler {:?}: {}", self.species, e));
        if let Some(ability) = self.ability {
            battler.ability = ability;
        }
        battler.item = self.item;
        if let Some(gender) = self.gender {
            battler.gender = gender;
        }
        battler.status = self.status;
        if let Some(hp) = self.current_hp {
            battler.set_hp(hp);
        }
        battler
    }
}

fn parties(side_a: Vec<TestBattlerBuilder>, side_b: Vec<TestBattlerBuilder>) -> [Vec<Battler>; 2] {
    let mut uid = 0;
    let mut build = |builders: Vec<TestBattlerBuilder>| -> Vec<Battler> {
        builders
            .into_iter()
            .map(|b| {
                uid += 1;
                b.build(uid)
            })
            .collect()
    };
    let a = build(side_a);
    let b = build(side_b);
    [a, b]
}

/// One battler a side. The first gets uid 1 and slot 0, the second uid 2
/// and slot 1.
pub fn single_battle(a: TestBattlerBuilder, b: TestBattlerBuilder) -> BattleState {
    BattleState::new(BattleFormat::Single, [vec![a.build(1)], vec![b.build(2)]])
        .expect("valid singles setup")
}

/// Two battlers a side, plus whatever follows on each bench.
pub fn double_battle(
    side_a: Vec<TestBattlerBuilder>,
    side_b: Vec<TestBattlerBuilder>,
) -> BattleState {
    BattleState::new(BattleFormat::Double, parties(side_a, side_b)).expect("valid doubles setup")
}

/// A started battle with the given seed. Entry effects of the opening
/// lineup have already run.
pub fn battle_with(
    format: BattleFormat,
    side_a: Vec<TestBattlerBuilder>,
    side_b: Vec<TestBattlerBuilder>,
    seed: u64,
) -> Battle {
    let config = BattleConfig::default().with_format(format).with_seed(seed);
    let mut battle = Battle::new(config, parties(side_a, side_b)).expect("valid battle setup");
    battle.start().expect("opening switch-ins");
    battle
}

/// Run `phase` against `state` with the built-in tables and return what it
/// announced.
pub fn run_phase<F>(state: &mut BattleState, rng: &mut TurnRng, phase: F) -> Vec<BattleEvent>
where
    F: FnOnce(&mut TurnEnv) -> BattleResult<()>,
{
    let data = ReferenceData::builtin().expect("built-in tables parse");
    let mut bus = EventBus::new();
    let mut queue = ActionQueue::new();
    let mut env = TurnEnv {
        state,
        data: &data,
        rng,
        bus: &mut bus,
        queue: &mut queue,
        roll: DamageRoll::default(),
    };
    phase(&mut env).expect("phase resolves");
    bus.into_events()
}

/// Run a single move through the pipeline and return what it announced.
pub fn run_move(
    state: &mut BattleState,
    user: BattlerId,
    move_id: MoveId,
    target: Option<BattlerId>,
    rng: &mut TurnRng,
) -> Vec<BattleEvent> {
    run_phase(state, rng, |env| execute_move(env, user, move_id, target))
}
