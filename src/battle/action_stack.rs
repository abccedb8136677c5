use crate::battle::rng::TurnRng;
use crate::battle::state::{BattleState, BattlerId, OrderShift};
use crate::battle::stats::effective_speed;
use crate::data_store::ReferenceData;
use crate::errors::DataResult;
use schema::{BagItem, FieldEffectKind, MoveId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// What a battler intends to do this turn.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleAction {
    UseMove {
        move_id: MoveId,
        target: Option<BattlerId>,
    },
    UseItem {
        item: BagItem,
        target: BattlerId,
    },
    Switch {
        bench_index: usize,
    },
    Flee,
    Forfeit,
}

impl BattleAction {
    /// Item use, switching and leaving the battle all resolve before moves.
    pub fn resolves_before_moves(&self) -> bool {
        !matches!(self, BattleAction::UseMove { .. })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedAction {
    pub battler: BattlerId,
    /// Occupant of the slot when the action was queued.
    pub uid: u32,
    pub action: BattleAction,
    /// Position in submission order.
    pub submission: u32,
}

/// The remaining actions of a turn, front first. Moves that change turn
/// order splice entries within the queue rather than re-sorting it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionQueue {
    queue: VecDeque<QueuedAction>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    pub fn push_back(&mut self, action: QueuedAction) {
        self.queue.push_back(action);
    }

    pub fn push_front(&mut self, action: QueuedAction) {
        self.queue.push_front(action);
    }

    pub fn pop_front(&mut self) -> Option<QueuedAction> {
        self.queue.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Battlers in the order they will act.
    pub fn battlers(&self) -> Vec<BattlerId> {
        self.queue.iter().map(|a| a.battler).collect()
    }

    /// Move the pending action of `battler` to the front or back. Returns
    /// false if it has no pending action.
    pub fn reposition(&mut self, battler: BattlerId, shift: OrderShift) -> bool {
        let Some(index) = self.queue.iter().position(|a| a.battler == battler) else {
            return false;
        };
        let Some(action) = self.queue.remove(index) else {
            return false;
        };
        match shift {
            OrderShift::Next => self.queue.push_front(action),
            OrderShift::Last => self.queue.push_back(action),
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MoveOrderKey {
    priority: i8,
    speed: u16,
}

/// Sort a turn's actions into execution order.
///
/// Non-move actions go first in submission order. Moves follow by priority
/// tier, then effective speed (slowest first under Trick Room). Each group of
/// exactly tied moves is shuffled with the battle RNG, groups taken front to
/// back.
pub fn order_actions(
    mut actions: Vec<QueuedAction>,
    state: &BattleState,
    data: &ReferenceData,
    rng: &mut TurnRng,
) -> DataResult<ActionQueue> {
    actions.sort_by_key(|a| a.submission);
    let (early, moves): (Vec<_>, Vec<_>) = actions
        .into_iter()
        .partition(|a| a.action.resolves_before_moves());

    let trick_room = state.field.has_effect(FieldEffectKind::TrickRoom);
    let mut keyed = Vec::with_capacity(moves.len());
    for action in moves {
        let priority = match action.action {
            BattleAction::UseMove { move_id, .. } => data.move_data(move_id)?.priority,
            _ => 0,
        };
        let speed = effective_speed(state, action.battler);
        keyed.push((MoveOrderKey { priority, speed }, action));
    }

    keyed.sort_by(|(a, _), (b, _)| {
        b.priority.cmp(&a.priority).then_with(|| {
            if trick_room {
                a.speed.cmp(&b.speed)
            } else {
                b.speed.cmp(&a.speed)
            }
        })
    });

    let mut queue = ActionQueue::new();
    for action in early {
        queue.push_back(action);
    }

    let mut start = 0;
    while start < keyed.len() {
        let key = keyed[start].0;
        let end = keyed[start..]
            .iter()
            .position(|(k, _)| *k != key)
            .map(|offset| start + offset)
            .unwrap_or(keyed.len());
        let group = &mut keyed[start..end];
        if group.len() > 1 {
            rng.shuffle(group, "speed tie");
        }
        for (_, action) in group.iter() {
            queue.push_back(*action);
        }
        start = end;
    }

    debug!(order = ?queue.battlers(), trick_room, "turn order resolved");
    Ok(queue)
}
