use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Hard ceiling on participants, shared by battlers and connected clients.
pub const MAX_BATTLERS: usize = 4;
pub const MAX_CLIENTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleFormat {
    Single,
    Double,
}

impl BattleFormat {
    /// Active slots per side.
    pub fn slots_per_side(self) -> usize {
        match self {
            BattleFormat::Single => 1,
            BattleFormat::Double => 2,
        }
    }

    pub fn active_battlers(self) -> usize {
        self.slots_per_side() * 2
    }
}

/// Tunables for one battle. Parsed from RON the same way the reference
/// tables are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    pub format: BattleFormat,
    pub seed: u64,
    /// Inclusive bounds of the damage random factor, in percent.
    pub damage_roll_min: u8,
    pub damage_roll_max: u8,
    /// How long the lockstep session waits for an ack before re-delivering.
    pub ack_timeout_ms: u64,
    /// Re-deliveries of the same sequence number before a client is treated
    /// as disconnected.
    pub max_redeliveries: u32,
    pub max_clients: usize,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            format: BattleFormat::Single,
            seed: 0,
            damage_roll_min: 85,
            damage_roll_max: 100,
            ack_timeout_ms: 2_000,
            max_redeliveries: 5,
            max_clients: MAX_CLIENTS,
        }
    }
}

impl BattleConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: BattleConfig =
            ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_format(mut self, format: BattleFormat) -> Self {
        self.format = format;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.damage_roll_min == 0 || self.damage_roll_min > self.damage_roll_max {
            return Err(ConfigError::Invalid(format!(
                "damage roll range {}..={} is empty",
                self.damage_roll_min, self.damage_roll_max
            )));
        }
        if self.damage_roll_max > 100 {
            return Err(ConfigError::Invalid(
                "damage roll cannot exceed 100 percent".to_string(),
            ));
        }
        if self.max_clients == 0 || self.max_clients > MAX_CLIENTS {
            return Err(ConfigError::Invalid(format!(
                "max_clients must be between 1 and {}",
                MAX_CLIENTS
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = BattleConfig::from_ron_str("(format: Double, seed: 42)").unwrap();
        assert_eq!(config.format, BattleFormat::Double);
        assert_eq!(config.seed, 42);
        assert_eq!(config.damage_roll_min, 85);
        assert_eq!(config.max_clients, MAX_CLIENTS);
    }

    #[test]
    fn test_invalid_roll_range_rejected() {
        let err = BattleConfig::from_ron_str("(damage_roll_min: 90, damage_roll_max: 80)")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_client_capacity_is_bounded() {
        let err = BattleConfig::from_ron_str("(max_clients: 5)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
