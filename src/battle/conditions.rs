use schema::{MoveId, StatusType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::battle::state::BattlerId;

/// Primary status. A battler holds at most one.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryStatus {
    Sleep { turns_remaining: u8 },
    Poison,
    BadPoison,
    Burn,
    Freeze,
    Paralysis,
}

impl PrimaryStatus {
    pub fn kind(&self) -> StatusType {
        match self {
            PrimaryStatus::Sleep { .. } => StatusType::Sleep,
            PrimaryStatus::Poison => StatusType::Poison,
            PrimaryStatus::BadPoison => StatusType::BadPoison,
            PrimaryStatus::Burn => StatusType::Burn,
            PrimaryStatus::Freeze => StatusType::Freeze,
            PrimaryStatus::Paralysis => StatusType::Paralysis,
        }
    }

    /// Build the status for a kind; sleep needs its duration supplied.
    pub fn from_kind(kind: StatusType, sleep_turns: u8) -> Self {
        match kind {
            StatusType::Sleep => PrimaryStatus::Sleep {
                turns_remaining: sleep_turns,
            },
            StatusType::Poison => PrimaryStatus::Poison,
            StatusType::BadPoison => PrimaryStatus::BadPoison,
            StatusType::Burn => PrimaryStatus::Burn,
            StatusType::Freeze => PrimaryStatus::Freeze,
            StatusType::Paralysis => PrimaryStatus::Paralysis,
        }
    }
}

/// When a duration counter on an effect is decremented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPoint {
    EndOfTurn,
    OwnAction,
    Never,
}

/// Volatile conditions. All of them end when the battler leaves the field.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VolatileKind {
    Confusion,
    Infatuation,
    Substitute,
    LeechSeed,
    FocusEnergy,
    FlashFire,
}

impl VolatileKind {
    pub fn tick_point(self) -> TickPoint {
        match self {
            VolatileKind::Confusion => TickPoint::OwnAction,
            _ => TickPoint::Never,
        }
    }
}

impl fmt::Display for VolatileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VolatileKind::Confusion => "confusion",
            VolatileKind::Infatuation => "infatuation",
            VolatileKind::Substitute => "substitute",
            VolatileKind::LeechSeed => "leech seed",
            VolatileKind::FocusEnergy => "focus energy",
            VolatileKind::FlashFire => "flash fire",
        };
        write!(f, "{}", name)
    }
}

/// Multi-turn counters owned by the battler. Per-turn cleanup never touches
/// them; only some of them end on switch-out.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PersistentKind {
    Encore,
    Taunt,
    Disable,
    Rampage,
    ToxicCounter,
    Rollout,
    FuryCutter,
    PerishSong,
    Charge,
    LockOn,
    MagnetRise,
    Recharge,
    Charging,
    SemiInvulnerable,
    UproarLock,
    ProtectChain,
    ChoiceLock,
}

impl PersistentKind {
    pub fn tick_point(self) -> TickPoint {
        match self {
            PersistentKind::Encore
            | PersistentKind::Taunt
            | PersistentKind::Disable
            | PersistentKind::PerishSong
            | PersistentKind::MagnetRise
            | PersistentKind::LockOn
            | PersistentKind::UproarLock => TickPoint::EndOfTurn,
            PersistentKind::Rampage | PersistentKind::Rollout => TickPoint::OwnAction,
            _ => TickPoint::Never,
        }
    }

    /// Effects tied to the battler being on the field rather than to the
    /// battler itself.
    pub fn ends_on_switch(self) -> bool {
        !matches!(
            self,
            PersistentKind::Encore
                | PersistentKind::Taunt
                | PersistentKind::Disable
                | PersistentKind::ToxicCounter
                | PersistentKind::MagnetRise
                | PersistentKind::Charge
        )
    }

    /// Effects that force the battler's next action.
    pub fn locks_action(self) -> bool {
        matches!(
            self,
            PersistentKind::Rampage
                | PersistentKind::Rollout
                | PersistentKind::Recharge
                | PersistentKind::Charging
                | PersistentKind::SemiInvulnerable
                | PersistentKind::UproarLock
        )
    }
}

impl fmt::Display for PersistentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PersistentKind::ToxicCounter => "toxic",
            PersistentKind::FuryCutter => "fury cutter",
            PersistentKind::PerishSong => "perish count",
            PersistentKind::LockOn => "lock-on",
            PersistentKind::MagnetRise => "magnet rise",
            PersistentKind::SemiInvulnerable => "semi-invulnerability",
            PersistentKind::UproarLock => "uproar",
            PersistentKind::ProtectChain => "protect chain",
            PersistentKind::ChoiceLock => "choice lock",
            other => return write!(f, "{}", format!("{:?}", other).to_lowercase()),
        };
        write!(f, "{}", name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SemiInvulnerablePosition {
    InAir,
    Underground,
}

/// Payload carried by an effect record.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectData {
    None,
    Move(MoveId),
    Source(BattlerId),
    Count(u8),
    Hp(u16),
    Position(SemiInvulnerablePosition, MoveId),
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectRecord {
    /// `None` lasts until something removes it.
    pub remaining: Option<u8>,
    pub data: EffectData,
}

impl EffectRecord {
    pub fn lasting(data: EffectData) -> Self {
        Self {
            remaining: None,
            data,
        }
    }

    pub fn for_turns(turns: u8, data: EffectData) -> Self {
        Self {
            remaining: Some(turns),
            data,
        }
    }

    pub fn count(&self) -> u8 {
        match self.data {
            EffectData::Count(n) => n,
            _ => 0,
        }
    }

    pub fn move_id(&self) -> Option<MoveId> {
        match self.data {
            EffectData::Move(id) | EffectData::Position(_, id) => Some(id),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<BattlerId> {
        match self.data {
            EffectData::Source(id) => Some(id),
            _ => None,
        }
    }
}

/// Effect kind -> record. Iteration order is the kind's declaration order,
/// which keeps every sweep over the map deterministic.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EffectMap<K: Ord> {
    records: BTreeMap<K, EffectRecord>,
}

impl<K: Ord> Default for EffectMap<K> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy> EffectMap<K> {
    pub fn insert(&mut self, kind: K, record: EffectRecord) -> Option<EffectRecord> {
        self.records.insert(kind, record)
    }

    pub fn remove(&mut self, kind: K) -> Option<EffectRecord> {
        self.records.remove(&kind)
    }

    pub fn get(&self, kind: K) -> Option<&EffectRecord> {
        self.records.get(&kind)
    }

    pub fn get_mut(&mut self, kind: K) -> Option<&mut EffectRecord> {
        self.records.get_mut(&kind)
    }

    pub fn contains(&self, kind: K) -> bool {
        self.records.contains_key(&kind)
    }

    pub fn kinds(&self) -> Vec<K> {
        self.records.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn retain(&mut self, mut keep: impl FnMut(K, &EffectRecord) -> bool) {
        self.records.retain(|kind, record| keep(*kind, record));
    }

    /// Decrement every timed record selected by `ticks`, returning the kinds
    /// whose counter reached zero. Expired records are removed.
    pub fn tick(&mut self, ticks: impl Fn(K) -> bool) -> Vec<K> {
        let mut expired = Vec::new();
        for (kind, record) in self.records.iter_mut() {
            if !ticks(*kind) {
                continue;
            }
            if let Some(remaining) = record.remaining.as_mut() {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    expired.push(*kind);
                }
            }
        }
        for kind in &expired {
            self.records.remove(kind);
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_two_turn_record_expires_on_second_tick() {
        let mut map: EffectMap<PersistentKind> = EffectMap::default();
        map.insert(PersistentKind::Taunt, EffectRecord::for_turns(2, EffectData::None));
        map.insert(PersistentKind::ToxicCounter, EffectRecord::lasting(EffectData::Count(1)));

        let end_of_turn = |k: PersistentKind| k.tick_point() == TickPoint::EndOfTurn;
        assert_eq!(map.tick(end_of_turn), vec![]);
        assert!(map.contains(PersistentKind::Taunt));
        assert_eq!(map.tick(end_of_turn), vec![PersistentKind::Taunt]);
        assert!(!map.contains(PersistentKind::Taunt));
        assert!(map.contains(PersistentKind::ToxicCounter));
    }

    #[test]
    fn test_toxic_counter_survives_switch() {
        assert!(!PersistentKind::ToxicCounter.ends_on_switch());
        assert!(PersistentKind::SemiInvulnerable.ends_on_switch());
    }
}
