//! Structural validation of a loaded configuration.
//!
//! Parsing accepts any well-formed document; validation enforces the rules
//! that keep the engine sane: at least one phase material, a positive
//! attack window, a usable quota, and a countdown template that actually
//! contains a time placeholder.

use crate::error::ConfigError;

use super::SiegeConfig;

/// Placeholders a countdown template may carry; at least one is required.
const TIMER_PLACEHOLDERS: [&str; 3] = ["{h}", "{m}", "{s}"];

/// Validates a parsed configuration.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] describing the first violated rule.
pub fn validate(config: &SiegeConfig) -> Result<(), ConfigError> {
    if config.flag.phase_materials.is_empty() {
        return Err(invalid("flag.phase_materials must not be empty"));
    }
    if config
        .flag
        .phase_materials
        .iter()
        .any(|m| m.name().is_empty())
    {
        return Err(invalid("flag.phase_materials must not contain empty names"));
    }
    if config.flag.waiting_time.as_millis() < 1000 {
        return Err(invalid("flag.waiting_time must be at least one second"));
    }
    if config.rules.max_active_flags_per_actor == 0 {
        return Err(invalid("rules.max_active_flags_per_actor must be at least 1"));
    }
    if config.rules.cell_size == 0 {
        return Err(invalid("rules.cell_size must be at least 1"));
    }
    if config.beacon.radius == 0 {
        return Err(invalid("beacon.radius must be at least 1"));
    }
    if config.countdown.enabled {
        match &config.countdown.timer_template {
            Some(template) if TIMER_PLACEHOLDERS.iter().any(|p| template.contains(p)) => {}
            Some(_) => {
                return Err(invalid(
                    "countdown.timer_template must contain a {h}, {m}, or {s} placeholder",
                ));
            }
            // Countdown enabled without a template just means no timer line.
            None => {}
        }
    }
    Ok(())
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_owned())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_empty_phase_materials_rejected() {
        let mut config = SiegeConfig::default();
        config.flag.phase_materials.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_subsecond_waiting_time_rejected() {
        let mut config = SiegeConfig::default();
        config.flag.waiting_time = Duration::from_millis(500);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_quota_rejected() {
        let mut config = SiegeConfig::default();
        config.rules.max_active_flags_per_actor = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let mut config = SiegeConfig::default();
        config.countdown.timer_template = Some("time left".to_owned());
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("placeholder"));
    }

    #[test]
    fn test_enabled_countdown_without_template_allowed() {
        let mut config = SiegeConfig::default();
        config.countdown.timer_template = None;
        assert!(validate(&config).is_ok());
    }
}
