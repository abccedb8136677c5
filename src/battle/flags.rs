//! Transient per-turn bookkeeping.
//!
//! Two scopes are tracked for every battler slot. Turn flags are wiped when
//! a new turn begins. Self-turn flags are wiped when the battler itself
//! starts acting, so they describe what happened to it since its previous
//! action. Multi-turn counters do not live here; see `conditions`.

use crate::battle::state::BattlerId;
use schema::{MoveCategory, MoveId};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageRecord {
    pub source: BattlerId,
    pub amount: u16,
    pub category: MoveCategory,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnFlags {
    pub acted: bool,
    pub protected: bool,
    pub enduring: bool,
    pub flinched: bool,
    pub pp_deducted: bool,
    pub struggling: bool,
    pub move_failed: bool,
    /// Last physical hit taken this turn.
    pub physical_damage: Option<DamageRecord>,
    /// Last special hit taken this turn.
    pub special_damage: Option<DamageRecord>,
    /// Every battler that damaged this one this turn.
    pub damaged_by: Vec<BattlerId>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SelfTurnFlags {
    pub damage_taken: u16,
    pub last_damage: Option<DamageRecord>,
    /// Damage dealt during the current action, for Shell Bell style healing.
    pub damage_dealt: u16,
    pub made_contact: bool,
    pub move_used: Option<MoveId>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectFlagTracker {
    turn: Vec<TurnFlags>,
    self_turn: Vec<SelfTurnFlags>,
}

impl EffectFlagTracker {
    pub fn new(slots: usize) -> Self {
        Self {
            turn: vec![TurnFlags::default(); slots],
            self_turn: vec![SelfTurnFlags::default(); slots],
        }
    }

    /// Called when a new turn starts.
    pub fn begin_turn(&mut self) {
        for flags in &mut self.turn {
            *flags = TurnFlags::default();
        }
    }

    /// Called when `battler` starts its own action.
    pub fn begin_self_turn(&mut self, battler: BattlerId) {
        if let Some(flags) = self.self_turn.get_mut(battler.index()) {
            *flags = SelfTurnFlags::default();
        }
    }

    /// A switch replaces everything the slot knew about its occupant.
    pub fn clear_slot(&mut self, battler: BattlerId) {
        if let Some(flags) = self.turn.get_mut(battler.index()) {
            let acted = flags.acted;
            *flags = TurnFlags {
                acted,
                ..TurnFlags::default()
            };
        }
        if let Some(flags) = self.self_turn.get_mut(battler.index()) {
            *flags = SelfTurnFlags::default();
        }
    }

    pub fn turn(&self, battler: BattlerId) -> &TurnFlags {
        &self.turn[battler.index()]
    }

    pub fn turn_mut(&mut self, battler: BattlerId) -> &mut TurnFlags {
        &mut self.turn[battler.index()]
    }

    pub fn self_turn(&self, battler: BattlerId) -> &SelfTurnFlags {
        &self.self_turn[battler.index()]
    }

    pub fn self_turn_mut(&mut self, battler: BattlerId) -> &mut SelfTurnFlags {
        &mut self.self_turn[battler.index()]
    }

    /// Record a damaging hit on `target`.
    pub fn record_hit(&mut self, target: BattlerId, record: DamageRecord) {
        let flags = &mut self.turn[target.index()];
        match record.category {
            MoveCategory::Physical => flags.physical_damage = Some(record),
            MoveCategory::Special => flags.special_damage = Some(record),
            MoveCategory::Status => {}
        }
        if !flags.damaged_by.contains(&record.source) {
            flags.damaged_by.push(record.source);
        }

        let target_self = &mut self.self_turn[target.index()];
        target_self.damage_taken = target_self.damage_taken.saturating_add(record.amount);
        target_self.last_damage = Some(record);

        let source_self = &mut self.self_turn[record.source.index()];
        source_self.damage_dealt = source_self.damage_dealt.saturating_add(record.amount);
    }

    pub fn was_damaged_by(&self, target: BattlerId, source: BattlerId) -> bool {
        self.turn[target.index()].damaged_by.contains(&source)
    }
}
