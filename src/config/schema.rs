//! Configuration schema and defaults.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::render::Material;

/// Parses duration fields written as humantime strings (`"30s"`, `"5m"`).
mod duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, de};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(de::Error::custom)
    }
}

/// Root siege configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct SiegeConfig {
    /// Global rules and limits.
    pub rules: RulesConfig,
    /// War flag shape and timing.
    pub flag: FlagConfig,
    /// Beacon shape and placement.
    pub beacon: BeaconConfig,
    /// Floating countdown display.
    pub countdown: CountdownConfig,
    /// Monetary amounts at stake.
    pub economy: EconomyConfig,
}

impl SiegeConfig {
    /// Loads and validates a configuration from a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed YAML and
    /// [`ConfigError::Invalid`] for structurally invalid settings.
    pub fn from_yaml(doc: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(doc)?;
        super::validate(&config)?;
        Ok(config)
    }

    /// Number of phases the flag steps through: one per phase material.
    #[must_use]
    pub fn phase_count(&self) -> usize {
        self.flag.phase_materials.len()
    }

    /// Interval between phase transitions: total waiting time divided by the
    /// phase count, truncated at millisecond precision. The truncated
    /// remainder means the final phase may run slightly longer than the
    /// others; that is accepted behavior.
    #[must_use]
    pub fn phase_interval(&self) -> Duration {
        let phases = self.phase_count().max(1) as u64;
        let millis = u64::try_from(self.flag.waiting_time.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(millis / phases)
    }
}

/// Global rules and limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RulesConfig {
    /// Master switch: when false every registration is rejected.
    pub allow_attacks: bool,
    /// Maximum simultaneous attacks per actor.
    pub max_active_flags_per_actor: usize,
    /// Side length of one region cell, in blocks.
    pub cell_size: u32,
    /// How long a group stays on cooldown after an attack against it
    /// resolves. Exposed to collaborators; not consumed internally.
    #[serde(deserialize_with = "duration_str::deserialize")]
    pub cooldown_after_resolution: Duration,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            allow_attacks: true,
            max_active_flags_per_actor: 1,
            cell_size: 16,
            cooldown_after_resolution: Duration::from_secs(600),
        }
    }
}

/// War flag shape and timing.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct FlagConfig {
    /// Material of the flag pole.
    pub base_material: Material,
    /// Material of the light on top.
    pub light_material: Material,
    /// One material per phase, painted onto the indicator and beacon body
    /// as the countdown advances.
    pub phase_materials: Vec<Material>,
    /// Total attack window duration.
    #[serde(deserialize_with = "duration_str::deserialize")]
    pub waiting_time: Duration,
}

impl Default for FlagConfig {
    fn default() -> Self {
        Self {
            base_material: Material::named("OAK_FENCE"),
            light_material: Material::named("TORCH"),
            phase_materials: [
                "LIME_WOOL",
                "GREEN_WOOL",
                "BLUE_WOOL",
                "CYAN_WOOL",
                "LIGHT_BLUE_WOOL",
                "GRAY_WOOL",
                "WHITE_WOOL",
                "PINK_WOOL",
                "ORANGE_WOOL",
                "RED_WOOL",
            ]
            .into_iter()
            .map(Material::from)
            .collect(),
            waiting_time: Duration::from_secs(300),
        }
    }
}

/// Beacon shape and placement.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BeaconConfig {
    /// Whether the beacon is drawn at all.
    pub draw: bool,
    /// Cube radius; side length is `2r - 1` and must fit within the cell.
    pub radius: u32,
    /// Minimum clearance between the flag light and the beacon floor.
    pub min_height_above_flag: i32,
    /// Preferred height of the beacon floor above the flag light.
    pub max_height_above_flag: i32,
    /// Wireframe material for edges and corners.
    pub wireframe_material: Material,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            draw: true,
            radius: 3,
            min_height_above_flag: 3,
            max_height_above_flag: 64,
            wireframe_material: Material::named("GLOWSTONE"),
        }
    }
}

/// Floating countdown display.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CountdownConfig {
    /// Whether the countdown is shown.
    pub enabled: bool,
    /// Text template with `{h}`, `{m}`, `{s}` placeholders; at least one
    /// placeholder is required when enabled.
    pub timer_template: Option<String>,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timer_template: Some("{m}m {s}s".to_owned()),
        }
    }
}

/// Monetary amounts at stake. Rewards may be negative, meaning a cost.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct EconomyConfig {
    /// Flat cost to place a war flag.
    pub flag_cost: f64,
    /// Paid to the defender (by the attacker) when an attack is defended.
    pub defended_reward: f64,
    /// Paid to the attacker per captured ordinary region; negative values
    /// are rebuilding fines.
    pub captured_region_reward: f64,
    /// Paid to the attacker for capturing a home region; negative values
    /// are rebuilding fines.
    pub captured_home_region_reward: f64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            flag_cost: 10.0,
            defended_reward: 10.0,
            captured_region_reward: 10.0,
            captured_home_region_reward: 50.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SiegeConfig::default();
        assert!(crate::config::validate(&config).is_ok());
        assert_eq!(config.phase_count(), 10);
        assert_eq!(config.phase_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_phase_interval_truncates() {
        let mut config = SiegeConfig::default();
        config.flag.waiting_time = Duration::from_secs(100);
        config.flag.phase_materials.truncate(3);
        // 100s / 3 = 33.333s, truncated at millisecond precision.
        assert_eq!(config.phase_interval(), Duration::from_millis(33_333));
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let doc = r"
rules:
  max_active_flags_per_actor: 3
  cooldown_after_resolution: 1h
flag:
  waiting_time: 100s
economy:
  flag_cost: 20.0
";
        let config = SiegeConfig::from_yaml(doc).unwrap();
        assert_eq!(config.rules.max_active_flags_per_actor, 3);
        assert_eq!(
            config.rules.cooldown_after_resolution,
            Duration::from_secs(3600)
        );
        assert_eq!(config.flag.waiting_time, Duration::from_secs(100));
        assert!((config.economy.flag_cost - 20.0).abs() < f64::EPSILON);
        // Untouched sections keep their defaults.
        assert_eq!(config.beacon.radius, 3);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(SiegeConfig::from_yaml("flag:\n  colour: RED\n").is_err());
    }

    #[test]
    fn test_bad_duration_rejected() {
        assert!(SiegeConfig::from_yaml("flag:\n  waiting_time: eleventy\n").is_err());
    }
}
