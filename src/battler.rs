use crate::battle::conditions::{
    EffectMap, EffectRecord, PersistentKind, PrimaryStatus, VolatileKind,
};
use crate::data_store::ReferenceData;
use crate::errors::DataResult;
use schema::{
    Ability, BaseStats, Gender, HeldItem, MoveId, PokemonType, SpeciesData, SpeciesId, StatType,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default individual value used when stats are derived from a species.
const DEFAULT_IV: u16 = 31;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSlot {
    pub move_id: MoveId,
    pub pp: u8,
    pub max_pp: u8,
}

impl MoveSlot {
    pub fn new(move_id: MoveId, max_pp: u8) -> Self {
        Self {
            move_id,
            pp: max_pp,
            max_pp,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub sp_attack: u16,
    pub sp_defense: u16,
    pub speed: u16,
}

impl Stats {
    /// Level-scaled stats with fixed IVs and no EVs.
    pub fn from_base(base: &BaseStats, level: u8) -> Self {
        let level = level as u16;
        let other = |b: u8| (2 * b as u16 + DEFAULT_IV) * level / 100 + 5;
        Self {
            hp: (2 * base.hp as u16 + DEFAULT_IV) * level / 100 + level + 10,
            attack: other(base.attack),
            defense: other(base.defense),
            sp_attack: other(base.sp_attack),
            sp_defense: other(base.sp_defense),
            speed: other(base.speed),
        }
    }

    /// Raw value for a stat that has one. Accuracy and evasion have none.
    pub fn get(&self, stat: StatType) -> u16 {
        match stat {
            StatType::Attack => self.attack,
            StatType::Defense => self.defense,
            StatType::SpecialAttack => self.sp_attack,
            StatType::SpecialDefense => self.sp_defense,
            StatType::Speed => self.speed,
            StatType::Accuracy | StatType::Evasion => 0,
        }
    }
}

/// One combatant, on the field or on the bench.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Battler {
    /// Identity across switches; an action queued by this battler is only
    /// carried out while the same `uid` occupies the slot.
    pub uid: u32,
    pub name: String,
    pub species: SpeciesId,
    pub types: Vec<PokemonType>,
    pub level: u8,
    pub gender: Gender,
    pub stats: Stats,
    current_hp: u16,
    pub status: Option<PrimaryStatus>,
    pub volatiles: EffectMap<VolatileKind>,
    pub persistent: EffectMap<PersistentKind>,
    stat_stages: BTreeMap<StatType, i8>,
    pub ability: Option<Ability>,
    pub item: Option<HeldItem>,
    pub moves: Vec<MoveSlot>,
    /// Set once the Fainted event has been emitted.
    pub fainted: bool,
    /// Turns since this battler last entered the field.
    pub turns_active: u8,
    pub last_move: Option<MoveId>,
}

impl Battler {
    pub fn new(uid: u32, species: &SpeciesData, level: u8, moves: Vec<MoveSlot>) -> Self {
        let stats = Stats::from_base(&species.base_stats, level);
        Self {
            uid,
            name: species.name.clone(),
            species: species.id,
            types: species.types.clone(),
            level,
            gender: Gender::Genderless,
            stats,
            current_hp: stats.hp,
            status: None,
            volatiles: EffectMap::default(),
            persistent: EffectMap::default(),
            stat_stages: BTreeMap::new(),
            ability: species.abilities.first().copied(),
            item: None,
            moves,
            fainted: false,
            turns_active: 0,
            last_move: None,
        }
    }

    /// Build a battler from the reference tables. Unknown ids are errors.
    pub fn from_data(
        data: &ReferenceData,
        uid: u32,
        species: SpeciesId,
        level: u8,
        move_ids: &[MoveId],
    ) -> DataResult<Self> {
        let species_data = data.species_data(species)?;
        let mut moves = Vec::with_capacity(move_ids.len().min(4));
        for &id in move_ids.iter().take(4) {
            let move_data = data.move_data(id)?;
            moves.push(MoveSlot::new(id, move_data.max_pp));
        }
        Ok(Self::new(uid, species_data, level, moves))
    }

    pub fn with_item(mut self, item: HeldItem) -> Self {
        self.item = Some(item);
        self
    }

    pub fn with_ability(mut self, ability: Ability) -> Self {
        self.ability = Some(ability);
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn current_hp(&self) -> u16 {
        self.current_hp
    }

    pub fn max_hp(&self) -> u16 {
        self.stats.hp
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }

    /// Set HP directly, clamped to `0..=max_hp`.
    pub fn set_hp(&mut self, hp: u16) {
        self.current_hp = hp.min(self.stats.hp);
    }

    /// Apply damage, returning the HP actually lost.
    pub fn take_damage(&mut self, amount: u16) -> u16 {
        let lost = amount.min(self.current_hp);
        self.current_hp -= lost;
        lost
    }

    /// Restore HP, returning the HP actually gained. Fainted battlers cannot be healed.
    pub fn heal(&mut self, amount: u16) -> u16 {
        if self.is_fainted() {
            return 0;
        }
        let gained = amount.min(self.stats.hp - self.current_hp);
        self.current_hp += gained;
        gained
    }

    /// Fraction of max HP, rounded down but never below 1.
    pub fn fraction_of_max_hp(&self, numerator: u16, denominator: u16) -> u16 {
        ((self.stats.hp as u32 * numerator as u32 / denominator as u32) as u16).max(1)
    }

    pub fn has_type(&self, pokemon_type: PokemonType) -> bool {
        self.types.contains(&pokemon_type)
    }

    pub fn has_ability(&self, ability: Ability) -> bool {
        self.ability == Some(ability)
    }

    pub fn has_item(&self, item: HeldItem) -> bool {
        self.item == Some(item)
    }

    pub fn stat_stage(&self, stat: StatType) -> i8 {
        self.stat_stages.get(&stat).copied().unwrap_or(0)
    }

    /// Shift a stage by `delta`, clamped to -6..=6. Returns the change that
    /// actually happened.
    pub fn modify_stat_stage(&mut self, stat: StatType, delta: i8) -> i8 {
        let current = self.stat_stage(stat);
        let new_stage = (current + delta).clamp(-6, 6);
        if new_stage == 0 {
            self.stat_stages.remove(&stat);
        } else {
            self.stat_stages.insert(stat, new_stage);
        }
        new_stage - current
    }

    pub fn clear_stat_stages(&mut self) {
        self.stat_stages.clear();
    }

    pub fn stat_stages(&self) -> &BTreeMap<StatType, i8> {
        &self.stat_stages
    }

    /// Primary status is exclusive: a second one is refused.
    pub fn set_status(&mut self, status: PrimaryStatus) -> bool {
        if self.status.is_some() || self.is_fainted() {
            return false;
        }
        self.status = Some(status);
        true
    }

    pub fn cure_status(&mut self) -> Option<PrimaryStatus> {
        self.status.take()
    }

    pub fn move_slot(&self, move_id: MoveId) -> Option<&MoveSlot> {
        self.moves.iter().find(|slot| slot.move_id == move_id)
    }

    pub fn deduct_pp(&mut self, move_id: MoveId, amount: u8) {
        if let Some(slot) = self.moves.iter_mut().find(|slot| slot.move_id == move_id) {
            slot.pp = slot.pp.saturating_sub(amount);
        }
    }

    pub fn has_usable_move(&self) -> bool {
        self.moves.iter().any(|slot| slot.pp > 0)
    }

    pub fn add_volatile(&mut self, kind: VolatileKind, record: EffectRecord) -> bool {
        if self.volatiles.contains(kind) {
            return false;
        }
        self.volatiles.insert(kind, record);
        true
    }

    /// Leaving the field: volatiles and stages go, primary status and
    /// battler-owned counters stay.
    pub fn reset_on_switch_out(&mut self) {
        self.volatiles.clear();
        self.clear_stat_stages();
        self.persistent.retain(|kind, _| !kind.ends_on_switch());
        self.turns_active = 0;
        self.last_move = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::conditions::EffectData;
    use crate::data_store::{moves, species};
    use pretty_assertions::assert_eq;

    fn pikachu() -> Battler {
        let data = ReferenceData::builtin().unwrap();
        Battler::from_data(&data, 1, species::PIKACHU, 50, &[moves::THUNDERBOLT]).unwrap()
    }

    #[test]
    fn test_stats_from_base() {
        let battler = pikachu();
        // (2*35 + 31) * 50 / 100 + 50 + 10
        assert_eq!(battler.max_hp(), 110);
        // (2*90 + 31) * 50 / 100 + 5
        assert_eq!(battler.stats.speed, 110);
        assert_eq!(battler.current_hp(), battler.max_hp());
    }

    #[test]
    fn test_hp_never_leaves_bounds() {
        let mut battler = pikachu();
        assert_eq!(battler.take_damage(500), 110);
        assert_eq!(battler.current_hp(), 0);
        assert!(battler.is_fainted());
        assert_eq!(battler.heal(50), 0);

        let mut battler = pikachu();
        battler.take_damage(10);
        assert_eq!(battler.heal(500), 10);
        assert_eq!(battler.current_hp(), battler.max_hp());
    }

    #[test]
    fn test_stat_stages_clamp() {
        let mut battler = pikachu();
        assert_eq!(battler.modify_stat_stage(StatType::Attack, 4), 4);
        assert_eq!(battler.modify_stat_stage(StatType::Attack, 4), 2);
        assert_eq!(battler.stat_stage(StatType::Attack), 6);
        assert_eq!(battler.modify_stat_stage(StatType::Speed, -8), -6);
    }

    #[test]
    fn test_primary_status_is_exclusive() {
        let mut battler = pikachu();
        assert!(battler.set_status(PrimaryStatus::Burn));
        assert!(!battler.set_status(PrimaryStatus::Paralysis));
        assert_eq!(battler.status, Some(PrimaryStatus::Burn));
    }

    #[test]
    fn test_switch_out_keeps_status_and_toxic_counter() {
        let mut battler = pikachu();
        battler.set_status(PrimaryStatus::BadPoison);
        battler
            .persistent
            .insert(PersistentKind::ToxicCounter, EffectRecord::lasting(EffectData::Count(3)));
        battler.add_volatile(
            VolatileKind::Confusion,
            EffectRecord::for_turns(3, EffectData::None),
        );
        battler.modify_stat_stage(StatType::Defense, 2);

        battler.reset_on_switch_out();

        assert!(battler.volatiles.is_empty());
        assert_eq!(battler.stat_stage(StatType::Defense), 0);
        assert_eq!(battler.status, Some(PrimaryStatus::BadPoison));
        assert_eq!(
            battler.persistent.get(PersistentKind::ToxicCounter).map(|r| r.count()),
            Some(3)
        );
    }
}
