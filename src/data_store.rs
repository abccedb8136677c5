//! Immutable reference tables for moves and species.
//!
//! The tables are embedded RON documents parsed once into a [`ReferenceData`]
//! value. A battle holds the store behind an `Arc`, so every lookup during the
//! battle sees the same values. Lookups of ids that are not in the table are
//! errors; the engine treats them as fatal for the turn in progress.

use crate::errors::{DataError, DataResult};
use schema::{MoveData, MoveId, SpeciesData, SpeciesId};
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};
use tracing::debug;

const MOVES_RON: &str = include_str!("../data/moves.ron");
const SPECIES_RON: &str = include_str!("../data/species.ron");

static BUILTIN: LazyLock<Result<Arc<ReferenceData>, DataError>> =
    LazyLock::new(|| ReferenceData::from_ron(MOVES_RON, SPECIES_RON).map(Arc::new));

/// Ids of moves in the builtin table, for callers that build rosters in code.
pub mod moves {
    use schema::MoveId;

    pub const KARATE_CHOP: MoveId = MoveId(2);
    pub const FIRE_PUNCH: MoveId = MoveId(7);
    pub const ICE_PUNCH: MoveId = MoveId(8);
    pub const THUNDER_PUNCH: MoveId = MoveId(9);
    pub const GUILLOTINE: MoveId = MoveId(12);
    pub const SWORDS_DANCE: MoveId = MoveId(14);
    pub const GUST: MoveId = MoveId(16);
    pub const FLY: MoveId = MoveId(19);
    pub const DOUBLE_KICK: MoveId = MoveId(24);
    pub const TACKLE: MoveId = MoveId(33);
    pub const DOUBLE_EDGE: MoveId = MoveId(38);
    pub const BITE: MoveId = MoveId(44);
    pub const GROWL: MoveId = MoveId(45);
    pub const DISABLE: MoveId = MoveId(50);
    pub const EMBER: MoveId = MoveId(52);
    pub const FLAMETHROWER: MoveId = MoveId(53);
    pub const MIST: MoveId = MoveId(54);
    pub const WATER_GUN: MoveId = MoveId(55);
    pub const HYDRO_PUMP: MoveId = MoveId(56);
    pub const SURF: MoveId = MoveId(57);
    pub const ICE_BEAM: MoveId = MoveId(58);
    pub const BLIZZARD: MoveId = MoveId(59);
    pub const HYPER_BEAM: MoveId = MoveId(63);
    pub const COUNTER: MoveId = MoveId(68);
    pub const SEISMIC_TOSS: MoveId = MoveId(69);
    pub const LEECH_SEED: MoveId = MoveId(73);
    pub const SOLAR_BEAM: MoveId = MoveId(76);
    pub const SLEEP_POWDER: MoveId = MoveId(79);
    pub const DRAGON_RAGE: MoveId = MoveId(82);
    pub const THUNDERBOLT: MoveId = MoveId(85);
    pub const THUNDER_WAVE: MoveId = MoveId(86);
    pub const THUNDER: MoveId = MoveId(87);
    pub const EARTHQUAKE: MoveId = MoveId(89);
    pub const DIG: MoveId = MoveId(91);
    pub const TOXIC: MoveId = MoveId(92);
    pub const PSYCHIC: MoveId = MoveId(94);
    pub const HYPNOSIS: MoveId = MoveId(95);
    pub const QUICK_ATTACK: MoveId = MoveId(98);
    pub const NIGHT_SHADE: MoveId = MoveId(101);
    pub const DOUBLE_TEAM: MoveId = MoveId(104);
    pub const RECOVER: MoveId = MoveId(105);
    pub const SMOKESCREEN: MoveId = MoveId(108);
    pub const CONFUSE_RAY: MoveId = MoveId(109);
    pub const LIGHT_SCREEN: MoveId = MoveId(113);
    pub const HAZE: MoveId = MoveId(114);
    pub const REFLECT: MoveId = MoveId(115);
    pub const FOCUS_ENERGY: MoveId = MoveId(116);
    pub const EXPLOSION: MoveId = MoveId(153);
    pub const REST: MoveId = MoveId(156);
    pub const SLASH: MoveId = MoveId(163);
    pub const SUBSTITUTE: MoveId = MoveId(164);
    pub const STRUGGLE: MoveId = MoveId(165);
    pub const PROTECT: MoveId = MoveId(182);
    pub const SLUDGE_BOMB: MoveId = MoveId(188);
    pub const SPIKES: MoveId = MoveId(191);
    pub const PERISH_SONG: MoveId = MoveId(195);
    pub const LOCK_ON: MoveId = MoveId(199);
    pub const OUTRAGE: MoveId = MoveId(200);
    pub const SANDSTORM: MoveId = MoveId(201);
    pub const GIGA_DRAIN: MoveId = MoveId(202);
    pub const ENDURE: MoveId = MoveId(203);
    pub const ROLLOUT: MoveId = MoveId(205);
    pub const FURY_CUTTER: MoveId = MoveId(210);
    pub const ATTRACT: MoveId = MoveId(213);
    pub const SAFEGUARD: MoveId = MoveId(219);
    pub const ENCORE: MoveId = MoveId(227);
    pub const METAL_CLAW: MoveId = MoveId(232);
    pub const RAIN_DANCE: MoveId = MoveId(240);
    pub const SUNNY_DAY: MoveId = MoveId(241);
    pub const CRUNCH: MoveId = MoveId(242);
    pub const MIRROR_COAT: MoveId = MoveId(243);
    pub const SHADOW_BALL: MoveId = MoveId(247);
    pub const FAKE_OUT: MoveId = MoveId(252);
    pub const UPROAR: MoveId = MoveId(253);
    pub const HAIL: MoveId = MoveId(258);
    pub const WILL_O_WISP: MoveId = MoveId(261);
    pub const CHARGE: MoveId = MoveId(268);
    pub const TAUNT: MoveId = MoveId(269);
    pub const REVENGE: MoveId = MoveId(279);
    pub const BULLET_SEED: MoveId = MoveId(331);
    pub const DRAGON_DANCE: MoveId = MoveId(349);
    pub const GRAVITY: MoveId = MoveId(356);
    pub const TAILWIND: MoveId = MoveId(366);
    pub const TOXIC_SPIKES: MoveId = MoveId(390);
    pub const MAGNET_RISE: MoveId = MoveId(393);
    pub const DARK_PULSE: MoveId = MoveId(399);
    pub const DRAGON_PULSE: MoveId = MoveId(406);
    pub const ICE_SHARD: MoveId = MoveId(420);
    pub const FLASH_CANNON: MoveId = MoveId(430);
    pub const TRICK_ROOM: MoveId = MoveId(433);
    pub const STEALTH_ROCK: MoveId = MoveId(446);
    pub const AFTER_YOU: MoveId = MoveId(495);
    pub const QUASH: MoveId = MoveId(511);
}

/// Ids of species in the builtin table.
pub mod species {
    use schema::SpeciesId;

    pub const VENUSAUR: SpeciesId = SpeciesId(3);
    pub const CHARIZARD: SpeciesId = SpeciesId(6);
    pub const BLASTOISE: SpeciesId = SpeciesId(9);
    pub const BUTTERFREE: SpeciesId = SpeciesId(12);
    pub const PIKACHU: SpeciesId = SpeciesId(25);
    pub const NINETALES: SpeciesId = SpeciesId(38);
    pub const MACHAMP: SpeciesId = SpeciesId(68);
    pub const GENGAR: SpeciesId = SpeciesId(94);
    pub const MAGIKARP: SpeciesId = SpeciesId(129);
    pub const GYARADOS: SpeciesId = SpeciesId(130);
    pub const LAPRAS: SpeciesId = SpeciesId(131);
    pub const JOLTEON: SpeciesId = SpeciesId(135);
    pub const SNORLAX: SpeciesId = SpeciesId(143);
    pub const AZUMARILL: SpeciesId = SpeciesId(184);
    pub const POLITOED: SpeciesId = SpeciesId(186);
    pub const SCIZOR: SpeciesId = SpeciesId(212);
    pub const TYRANITAR: SpeciesId = SpeciesId(248);
    pub const NINJASK: SpeciesId = SpeciesId(291);
    pub const GROUDON: SpeciesId = SpeciesId(383);
    pub const GARCHOMP: SpeciesId = SpeciesId(445);
    pub const ABOMASNOW: SpeciesId = SpeciesId(460);
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    moves: BTreeMap<MoveId, MoveData>,
    species: BTreeMap<SpeciesId, SpeciesData>,
}

impl ReferenceData {
    /// The tables compiled into the crate, parsed on first use.
    pub fn builtin() -> DataResult<Arc<ReferenceData>> {
        BUILTIN.clone()
    }

    /// Parse move and species tables from RON documents.
    pub fn from_ron(moves_ron: &str, species_ron: &str) -> DataResult<Self> {
        let move_list: Vec<MoveData> =
            ron::from_str(moves_ron).map_err(|e| DataError::Malformed {
                table: "move",
                details: e.to_string(),
            })?;
        let species_list: Vec<SpeciesData> =
            ron::from_str(species_ron).map_err(|e| DataError::Malformed {
                table: "species",
                details: e.to_string(),
            })?;

        let mut data = ReferenceData::default();
        for move_data in move_list {
            let id = move_data.id;
            if data.moves.insert(id, move_data).is_some() {
                return Err(DataError::DuplicateId { kind: "move", id: id.0 });
            }
        }
        for species_data in species_list {
            let id = species_data.id;
            if data.species.insert(id, species_data).is_some() {
                return Err(DataError::DuplicateId { kind: "species", id: id.0 });
            }
        }

        debug!(
            moves = data.moves.len(),
            species = data.species.len(),
            "loaded reference tables"
        );
        Ok(data)
    }

    pub fn move_data(&self, id: MoveId) -> DataResult<&MoveData> {
        self.moves.get(&id).ok_or(DataError::UnknownMove(id))
    }

    pub fn species_data(&self, id: SpeciesId) -> DataResult<&SpeciesData> {
        self.species.get(&id).ok_or(DataError::UnknownSpecies(id))
    }

    /// Case-insensitive lookup by display name.
    pub fn move_by_name(&self, name: &str) -> Option<&MoveData> {
        self.moves
            .values()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }

    pub fn species_count(&self) -> usize {
        self.species.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schema::{MoveCategory, MoveEffect, PokemonType, Weather};

    #[test]
    fn test_builtin_tables_load() {
        let data = ReferenceData::builtin().expect("builtin tables should parse");
        assert!(data.move_count() > 80);
        assert!(data.species_count() >= 20);
    }

    #[test]
    fn test_move_lookup_returns_stable_values() {
        let data = ReferenceData::builtin().unwrap();
        let first = data.move_data(moves::THUNDERBOLT).unwrap().clone();
        let second = data.move_data(moves::THUNDERBOLT).unwrap();
        assert_eq!(&first, second);
        assert_eq!(first.move_type, PokemonType::Electric);
        assert_eq!(first.category, MoveCategory::Special);
        assert_eq!(first.power, Some(95));
    }

    #[test]
    fn test_unknown_ids_are_errors() {
        let data = ReferenceData::builtin().unwrap();
        assert_eq!(
            data.move_data(MoveId(9999)).unwrap_err(),
            DataError::UnknownMove(MoveId(9999))
        );
        assert_eq!(
            data.species_data(SpeciesId(0)).unwrap_err(),
            DataError::UnknownSpecies(SpeciesId(0))
        );
    }

    #[test]
    fn test_struct_variant_effects_parse() {
        let data = ReferenceData::builtin().unwrap();
        let solar_beam = data.move_data(moves::SOLAR_BEAM).unwrap();
        assert_eq!(
            solar_beam.effects,
            vec![MoveEffect::ChargeUp {
                skip_in: Some(Weather::Sun)
            }]
        );
        assert_eq!(
            data.move_by_name("solar beam").map(|m| m.id),
            Some(moves::SOLAR_BEAM)
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let moves = r#"[
            (id: 1, name: "A", move_type: Normal, category: Physical, power: Some(10), accuracy: None, max_pp: 5, target: Selected),
            (id: 1, name: "B", move_type: Normal, category: Physical, power: Some(10), accuracy: None, max_pp: 5, target: Selected),
        ]"#;
        let err = ReferenceData::from_ron(moves, "[]").unwrap_err();
        assert_eq!(err, DataError::DuplicateId { kind: "move", id: 1 });
    }
}
