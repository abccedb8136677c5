use crate::battle::conditions::{PersistentKind, VolatileKind};
use crate::battle::field::{EffectDuration, FieldState};
use crate::battle::flags::EffectFlagTracker;
use crate::battler::Battler;
use crate::config::{BattleFormat, MAX_BATTLERS};
use crate::errors::{ExecutionError, SetupError};
use schema::{
    Ability, BagItem, FieldEffectKind, HeldItem, MoveId, SideCondition, StatType, StatusType,
    Weather,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Active slot on the field. Even ids belong to side 0, odd ids to side 1,
/// so singles use 0 and 1 and doubles add 2 and 3.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BattlerId(pub u8);

impl BattlerId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn side(self) -> usize {
        self.index() % 2
    }

    pub fn position(self) -> usize {
        self.index() / 2
    }

    pub fn from_side_position(side: usize, position: usize) -> Self {
        BattlerId((position * 2 + side) as u8)
    }

    pub fn is_ally_of(self, other: BattlerId) -> bool {
        self.side() == other.side()
    }
}

impl fmt::Display for BattlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    Winner(usize),
    Draw,
    Fled(usize),
    Forfeit(usize),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum GameState {
    WaitingForActions,
    TurnInProgress,
    /// Fainted slots that must be refilled before the next turn.
    WaitingForReplacements(Vec<BattlerId>),
    Finished(BattleOutcome),
    Aborted(String),
    /// A fatal error interrupted a turn. The state is the last committed one.
    Corrupted(String),
}

impl GameState {
    pub fn is_over(&self) -> bool {
        matches!(
            self,
            GameState::Finished(_) | GameState::Aborted(_) | GameState::Corrupted(_)
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    Asleep,
    Frozen,
    FullyParalyzed,
    Flinched,
    Infatuated,
    MustRecharge,
    Taunted,
    Disabled,
    NoPp,
    NoTarget,
    Protected,
    SubstituteBlocks,
    AlreadyAffected,
    Immune,
    Safeguarded,
    MistBlocked,
    StatCapped,
    Uproar,
    NotFirstTurn,
    NothingToCounter,
    Generic,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureReason::Asleep => "is fast asleep",
            FailureReason::Frozen => "is frozen solid",
            FailureReason::FullyParalyzed => "is paralyzed! It can't move",
            FailureReason::Flinched => "flinched",
            FailureReason::Infatuated => "is immobilized by love",
            FailureReason::MustRecharge => "must recharge",
            FailureReason::Taunted => "can't use that move after the taunt",
            FailureReason::Disabled => "can't use a disabled move",
            FailureReason::NoPp => "has no PP left for that move",
            FailureReason::NoTarget => "has no target",
            FailureReason::Protected => "protected itself",
            FailureReason::SubstituteBlocks => "is shielded by its substitute",
            FailureReason::AlreadyAffected => "is already affected",
            FailureReason::Immune => "is unaffected",
            FailureReason::Safeguarded => "is protected by Safeguard",
            FailureReason::MistBlocked => "is protected by the mist",
            FailureReason::StatCapped => "won't go any further",
            FailureReason::Uproar => "can't sleep in an uproar",
            FailureReason::NotFirstTurn => "but it failed",
            FailureReason::NothingToCounter => "but it failed",
            FailureReason::Generic => "but it failed",
        };
        write!(f, "{}", text)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    Recoil,
    Confusion,
    Weather(Weather),
    Status(StatusType),
    LeechSeed,
    Hazard(SideCondition),
    Item(HeldItem),
    Ability(Ability),
    Substitute,
    PerishSong,
    Explosion,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealSource {
    Drain,
    Move(MoveId),
    LeechSeed,
    Item(HeldItem),
    Ability(Ability),
    Bag(BagItem),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effectiveness {
    Normal,
    SuperEffective,
    NotVeryEffective,
}

impl Effectiveness {
    pub fn from_percent(percent: u16) -> Self {
        match percent {
            p if p > 100 => Effectiveness::SuperEffective,
            p if p < 100 => Effectiveness::NotVeryEffective,
            _ => Effectiveness::Normal,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderShift {
    Next,
    Last,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Turn Management
    TurnStarted {
        turn: u32,
    },
    TurnEnded {
        turn: u32,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },

    // Non-move actions
    Switched {
        battler: BattlerId,
        outgoing: String,
        incoming: String,
    },
    BagItemUsed {
        battler: BattlerId,
        item: BagItem,
        target: BattlerId,
    },
    FleeAttempted {
        battler: BattlerId,
        success: bool,
    },

    // Move Events
    MoveUsed {
        user: BattlerId,
        move_id: MoveId,
    },
    MoveCharging {
        user: BattlerId,
        move_id: MoveId,
    },
    Hit {
        user: BattlerId,
        target: BattlerId,
        move_id: MoveId,
        damage: u16,
        critical: bool,
        effectiveness: Effectiveness,
        remaining_hp: u16,
    },
    HitCount {
        user: BattlerId,
        hits: u8,
    },
    Miss {
        user: BattlerId,
        target: BattlerId,
        move_id: MoveId,
    },
    NoEffect {
        user: BattlerId,
        target: BattlerId,
        move_id: MoveId,
    },
    Failed {
        battler: BattlerId,
        reason: FailureReason,
    },
    Endured {
        battler: BattlerId,
    },
    Protecting {
        battler: BattlerId,
        endure: bool,
    },
    OrderChanged {
        battler: BattlerId,
        shift: OrderShift,
    },

    // Damage and Healing
    Damaged {
        target: BattlerId,
        source: DamageSource,
        amount: u16,
        remaining_hp: u16,
    },
    Healed {
        target: BattlerId,
        source: HealSource,
        amount: u16,
        new_hp: u16,
    },
    Fainted {
        battler: BattlerId,
    },

    // Conditions
    StatusApplied {
        target: BattlerId,
        status: StatusType,
    },
    StatusCured {
        target: BattlerId,
        status: StatusType,
    },
    VolatileStarted {
        target: BattlerId,
        kind: VolatileKind,
    },
    VolatileEnded {
        target: BattlerId,
        kind: VolatileKind,
    },
    EffectStarted {
        target: BattlerId,
        kind: PersistentKind,
    },
    EffectEnded {
        target: BattlerId,
        kind: PersistentKind,
    },
    PerishCount {
        battler: BattlerId,
        remaining: u8,
    },
    StatChanged {
        target: BattlerId,
        stat: StatType,
        delta: i8,
        new_stage: i8,
    },
    StatStagesReset,

    // Abilities and held items
    AbilityActivated {
        battler: BattlerId,
        ability: Ability,
    },
    ItemActivated {
        battler: BattlerId,
        item: HeldItem,
    },
    ItemConsumed {
        battler: BattlerId,
        item: HeldItem,
    },

    // Field
    WeatherChanged {
        weather: Option<Weather>,
        duration: Option<EffectDuration>,
    },
    SideConditionStarted {
        side: usize,
        condition: SideCondition,
    },
    SideConditionEnded {
        side: usize,
        condition: SideCondition,
    },
    FieldEffectStarted {
        effect: FieldEffectKind,
    },
    FieldEffectExpired {
        effect: FieldEffectKind,
    },
}

impl BattleEvent {
    /// Human-readable line for this event, or `None` for silent events.
    pub fn format(&self, state: &BattleState) -> Option<String> {
        let name = |id: &BattlerId| state.display_name(*id);
        match self {
            BattleEvent::TurnStarted { turn } => Some(format!("=== Turn {} ===", turn)),
            BattleEvent::TurnEnded { .. } => None,
            BattleEvent::BattleEnded { outcome } => Some(match outcome {
                BattleOutcome::Winner(side) => format!("Side {} wins the battle!", side + 1),
                BattleOutcome::Draw => "The battle ended in a draw!".to_string(),
                BattleOutcome::Fled(side) => format!("Side {} got away safely!", side + 1),
                BattleOutcome::Forfeit(side) => format!("Side {} forfeited the battle!", side + 1),
            }),
            BattleEvent::Switched {
                outgoing, incoming, ..
            } => Some(format!("{} was withdrawn! Go, {}!", outgoing, incoming)),
            BattleEvent::BagItemUsed { item, target, .. } => {
                Some(format!("{} was used on {}.", item, name(target)))
            }
            BattleEvent::FleeAttempted { battler, success } => Some(if *success {
                format!("{} got away safely!", name(battler))
            } else {
                format!("{} couldn't get away!", name(battler))
            }),
            BattleEvent::MoveUsed { user, move_id } => {
                Some(format!("{} used move {}!", name(user), move_id))
            }
            BattleEvent::MoveCharging { user, .. } => {
                Some(format!("{} is gathering power!", name(user)))
            }
            BattleEvent::Hit {
                target,
                damage,
                critical,
                effectiveness,
                ..
            } => {
                let mut line = format!("{} took {} damage!", name(target), damage);
                if *critical {
                    line.push_str(" A critical hit!");
                }
                match effectiveness {
                    Effectiveness::SuperEffective => line.push_str(" It's super effective!"),
                    Effectiveness::NotVeryEffective => {
                        line.push_str(" It's not very effective...")
                    }
                    Effectiveness::Normal => {}
                }
                Some(line)
            }
            BattleEvent::HitCount { hits, .. } => Some(format!("Hit {} time(s)!", hits)),
            BattleEvent::Miss { user, .. } => Some(format!("{}'s attack missed!", name(user))),
            BattleEvent::NoEffect { target, .. } => {
                Some(format!("It doesn't affect {}...", name(target)))
            }
            BattleEvent::Failed { battler, reason } => {
                Some(format!("{} {}!", name(battler), reason))
            }
            BattleEvent::Endured { battler } => Some(format!("{} endured the hit!", name(battler))),
            BattleEvent::Protecting { battler, endure } => Some(if *endure {
                format!("{} braced itself!", name(battler))
            } else {
                format!("{} protected itself!", name(battler))
            }),
            BattleEvent::OrderChanged { battler, shift } => Some(match shift {
                OrderShift::Next => format!("{} will move next!", name(battler)),
                OrderShift::Last => format!("{}'s move was postponed!", name(battler)),
            }),
            BattleEvent::Damaged {
                target,
                source,
                amount,
                ..
            } => Some(format!(
                "{} lost {} HP ({:?}).",
                name(target),
                amount,
                source
            )),
            BattleEvent::Healed { target, amount, .. } => {
                Some(format!("{} recovered {} HP!", name(target), amount))
            }
            BattleEvent::Fainted { battler } => Some(format!("{} fainted!", name(battler))),
            BattleEvent::StatusApplied { target, status } => {
                Some(format!("{} is {}!", name(target), status))
            }
            BattleEvent::StatusCured { target, status } => {
                Some(format!("{} is no longer {}.", name(target), status))
            }
            BattleEvent::VolatileStarted { target, kind } => {
                Some(format!("{} is affected by {}!", name(target), kind))
            }
            BattleEvent::VolatileEnded { target, kind } => {
                Some(format!("{}'s {} wore off.", name(target), kind))
            }
            BattleEvent::EffectStarted { target, kind } => {
                Some(format!("{} is affected by {}!", name(target), kind))
            }
            BattleEvent::EffectEnded { target, kind } => {
                Some(format!("{}'s {} ended.", name(target), kind))
            }
            BattleEvent::PerishCount { battler, remaining } => Some(format!(
                "{}'s perish count fell to {}.",
                name(battler),
                remaining
            )),
            BattleEvent::StatChanged {
                target,
                stat,
                delta,
                ..
            } => {
                let text = match delta {
                    d if *d >= 2 => "sharply rose",
                    1 => "rose",
                    -1 => "fell",
                    d if *d <= -2 => "harshly fell",
                    _ => return None,
                };
                Some(format!("{}'s {} {}!", name(target), stat, text))
            }
            BattleEvent::StatStagesReset => Some("All stat changes were eliminated!".to_string()),
            BattleEvent::AbilityActivated { battler, ability } => {
                Some(format!("[{}'s {}]", name(battler), ability))
            }
            BattleEvent::ItemActivated { battler, item } => {
                Some(format!("{}'s {} activated!", name(battler), item))
            }
            BattleEvent::ItemConsumed { battler, item } => {
                Some(format!("{} used up its {}!", name(battler), item))
            }
            BattleEvent::WeatherChanged { weather, .. } => Some(match weather {
                Some(kind) => format!("The weather became {}!", kind),
                None => "The weather returned to normal.".to_string(),
            }),
            BattleEvent::SideConditionStarted { side, condition } => {
                Some(format!("{} took effect on side {}!", condition, side + 1))
            }
            BattleEvent::SideConditionEnded { side, condition } => {
                Some(format!("Side {}'s {} wore off!", side + 1, condition))
            }
            BattleEvent::FieldEffectStarted { effect } => Some(format!("{} took effect!", effect)),
            BattleEvent::FieldEffectExpired { effect } => Some(format!("{} wore off!", effect)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_events(self) -> Vec<BattleEvent> {
        self.events
    }

    /// Formatted lines for every non-silent event.
    pub fn format_lines(&self, state: &BattleState) -> Vec<String> {
        self.events.iter().filter_map(|e| e.format(state)).collect()
    }
}

/// The committed outcome of one turn: its number and the ordered events.
///
/// A turn that ends in faints is followed by one or more replacement logs
/// carrying the same number. Turn 0 is the opening lineup.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TurnLog {
    pub turn: u32,
    pub events: Vec<BattleEvent>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BattleState {
    pub format: BattleFormat,
    /// Indexed by `BattlerId`.
    pub battlers: Vec<Battler>,
    pub benches: [Vec<Battler>; 2],
    pub field: FieldState,
    pub flags: EffectFlagTracker,
    pub turn_number: u32,
    pub game_state: GameState,
    pub escape_attempts: [u8; 2],
}

impl BattleState {
    /// Lay out two parties. The first `slots_per_side` members of each party
    /// start on the field, the rest wait on the bench.
    pub fn new(format: BattleFormat, parties: [Vec<Battler>; 2]) -> Result<Self, SetupError> {
        let per_side = format.slots_per_side();
        let expected = format.active_battlers();
        if expected > MAX_BATTLERS {
            return Err(SetupError::TooManyBattlers {
                max: MAX_BATTLERS,
                actual: expected,
            });
        }

        let [mut side_a, mut side_b] = parties;
        let actual = side_a.len().min(per_side) + side_b.len().min(per_side);
        if side_a.len() < per_side || side_b.len() < per_side {
            return Err(SetupError::WrongBattlerCount { expected, actual });
        }

        let bench_a = side_a.split_off(per_side);
        let bench_b = side_b.split_off(per_side);
        let mut active_a = side_a.into_iter();
        let mut active_b = side_b.into_iter();

        let mut battlers = Vec::with_capacity(expected);
        for slot in 0..expected {
            let next = if slot % 2 == 0 {
                active_a.next()
            } else {
                active_b.next()
            };
            match next {
                Some(battler) => battlers.push(battler),
                None => return Err(SetupError::WrongBattlerCount { expected, actual }),
            }
        }

        for (index, battler) in battlers.iter().enumerate() {
            let id = BattlerId(index as u8);
            if battler.moves.is_empty() {
                return Err(SetupError::NoMoves(id));
            }
            if battler.is_fainted() {
                return Err(SetupError::StartsFainted(id));
            }
        }

        Ok(Self {
            format,
            flags: EffectFlagTracker::new(battlers.len()),
            battlers,
            benches: [bench_a, bench_b],
            field: FieldState::default(),
            turn_number: 1,
            game_state: GameState::WaitingForActions,
            escape_attempts: [0, 0],
        })
    }

    pub fn battler(&self, id: BattlerId) -> Result<&Battler, ExecutionError> {
        self.battlers
            .get(id.index())
            .ok_or(ExecutionError::NoBattler(id))
    }

    pub fn battler_mut(&mut self, id: BattlerId) -> Result<&mut Battler, ExecutionError> {
        self.battlers
            .get_mut(id.index())
            .ok_or(ExecutionError::NoBattler(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = BattlerId> + '_ {
        (0..self.battlers.len()).map(|i| BattlerId(i as u8))
    }

    /// Active slots whose occupant has not fainted.
    pub fn live_ids(&self) -> Vec<BattlerId> {
        self.ids().filter(|id| self.is_alive(*id)).collect()
    }

    pub fn is_alive(&self, id: BattlerId) -> bool {
        self.battlers
            .get(id.index())
            .is_some_and(|b| !b.is_fainted())
    }

    pub fn live_opponents(&self, id: BattlerId) -> Vec<BattlerId> {
        self.live_ids()
            .into_iter()
            .filter(|other| !other.is_ally_of(id))
            .collect()
    }

    pub fn live_allies(&self, id: BattlerId) -> Vec<BattlerId> {
        self.live_ids()
            .into_iter()
            .filter(|other| *other != id && other.is_ally_of(id))
            .collect()
    }

    /// Bench members of `side` that can still fight.
    pub fn available_replacements(&self, side: usize) -> Vec<usize> {
        self.benches[side]
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.is_fainted())
            .map(|(i, _)| i)
            .collect()
    }

    /// True while the side still has someone who can fight.
    pub fn side_can_fight(&self, side: usize) -> bool {
        self.ids()
            .any(|id| id.side() == side && self.is_alive(id))
            || !self.available_replacements(side).is_empty()
    }

    pub fn display_name(&self, id: BattlerId) -> String {
        match self.battlers.get(id.index()) {
            Some(battler) => format!("{} [{}]", battler.name, id),
            None => format!("<empty {}>", id),
        }
    }
}
