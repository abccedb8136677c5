use schema::{FieldEffectKind, SideCondition, Weather};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How long a field-level effect lasts.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectDuration {
    Turns(u8),
    /// Lasts until another effect of the same family replaces it.
    UntilReplaced,
}

impl EffectDuration {
    /// Count down one turn boundary. Returns true when the effect ends.
    fn tick(&mut self) -> bool {
        match self {
            EffectDuration::Turns(n) => {
                *n = n.saturating_sub(1);
                *n == 0
            }
            EffectDuration::UntilReplaced => false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeatherState {
    pub kind: Weather,
    pub duration: EffectDuration,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideConditionState {
    pub layers: u8,
    pub duration: EffectDuration,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SideState {
    pub conditions: BTreeMap<SideCondition, SideConditionState>,
}

impl SideState {
    pub fn has(&self, condition: SideCondition) -> bool {
        self.conditions.contains_key(&condition)
    }

    pub fn layers(&self, condition: SideCondition) -> u8 {
        self.conditions.get(&condition).map(|c| c.layers).unwrap_or(0)
    }
}

/// Expiry produced by ticking the field at end of turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldExpiry {
    Weather(Weather),
    Side(usize, SideCondition),
    Global(FieldEffectKind),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    pub weather: Option<WeatherState>,
    pub sides: [SideState; 2],
    pub effects: BTreeMap<FieldEffectKind, EffectDuration>,
}

impl FieldState {
    pub fn weather(&self) -> Option<Weather> {
        self.weather.map(|w| w.kind)
    }

    pub fn has_effect(&self, kind: FieldEffectKind) -> bool {
        self.effects.contains_key(&kind)
    }

    /// Replace the weather. Returns false if the same weather is already up.
    pub fn set_weather(&mut self, kind: Weather, duration: EffectDuration) -> bool {
        if self.weather() == Some(kind) {
            return false;
        }
        self.weather = Some(WeatherState { kind, duration });
        true
    }

    /// Add a side condition or another hazard layer. Returns false when the
    /// condition is already at its cap.
    pub fn add_side_condition(
        &mut self,
        side: usize,
        condition: SideCondition,
        duration: EffectDuration,
    ) -> bool {
        let conditions = &mut self.sides[side].conditions;
        match conditions.get_mut(&condition) {
            Some(existing) if existing.layers < condition.max_layers() => {
                existing.layers += 1;
                true
            }
            Some(_) => false,
            None => {
                conditions.insert(condition, SideConditionState { layers: 1, duration });
                true
            }
        }
    }

    pub fn set_effect(&mut self, kind: FieldEffectKind, duration: EffectDuration) {
        self.effects.insert(kind, duration);
    }

    pub fn remove_effect(&mut self, kind: FieldEffectKind) -> bool {
        self.effects.remove(&kind).is_some()
    }

    /// One end-of-turn boundary for every timed field effect. Order of the
    /// returned expiries: sides, then global effects, then weather.
    pub fn tick(&mut self) -> Vec<FieldExpiry> {
        let mut expired = Vec::new();

        for (side_index, side) in self.sides.iter_mut().enumerate() {
            let mut ended = Vec::new();
            for (condition, state) in side.conditions.iter_mut() {
                if state.duration.tick() {
                    ended.push(*condition);
                }
            }
            for condition in ended {
                side.conditions.remove(&condition);
                expired.push(FieldExpiry::Side(side_index, condition));
            }
        }

        let mut ended = Vec::new();
        for (kind, duration) in self.effects.iter_mut() {
            if duration.tick() {
                ended.push(*kind);
            }
        }
        for kind in ended {
            self.effects.remove(&kind);
            expired.push(FieldExpiry::Global(kind));
        }

        if let Some(weather) = self.weather.as_mut() {
            if weather.duration.tick() {
                expired.push(FieldExpiry::Weather(weather.kind));
                self.weather = None;
            }
        }

        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_permanent_weather_never_expires() {
        let mut field = FieldState::default();
        field.set_weather(Weather::Rain, EffectDuration::UntilReplaced);
        for _ in 0..20 {
            assert_eq!(field.tick(), vec![]);
        }
        assert_eq!(field.weather(), Some(Weather::Rain));
        assert!(field.set_weather(Weather::Sun, EffectDuration::Turns(5)));
        assert_eq!(field.weather(), Some(Weather::Sun));
    }

    #[test]
    fn test_timed_effects_expire_in_order() {
        let mut field = FieldState::default();
        field.set_weather(Weather::Hail, EffectDuration::Turns(1));
        field.set_effect(FieldEffectKind::TrickRoom, EffectDuration::Turns(1));
        field.add_side_condition(1, SideCondition::Reflect, EffectDuration::Turns(1));
        assert_eq!(
            field.tick(),
            vec![
                FieldExpiry::Side(1, SideCondition::Reflect),
                FieldExpiry::Global(FieldEffectKind::TrickRoom),
                FieldExpiry::Weather(Weather::Hail),
            ]
        );
        assert_eq!(field.weather(), None);
    }

    #[test]
    fn test_hazard_layers_cap() {
        let mut field = FieldState::default();
        for _ in 0..3 {
            assert!(field.add_side_condition(0, SideCondition::Spikes, EffectDuration::UntilReplaced));
        }
        assert!(!field.add_side_condition(0, SideCondition::Spikes, EffectDuration::UntilReplaced));
        assert_eq!(field.sides[0].layers(SideCondition::Spikes), 3);
    }
}
