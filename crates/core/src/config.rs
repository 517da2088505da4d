use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::week::{local_date, DateRange};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Engine-wide settings. Everything has a sensible default so an empty
/// config file is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Civil timezone the household keeps its calendar in. Week boundaries
    /// are evaluated on this clock, not the server's.
    pub timezone: Tz,
    /// Fixed start of the balance analysis window. When unset, the window
    /// reaches back `lookback_days` from "now".
    pub analysis_start: Option<NaiveDate>,
    pub lookback_days: i64,
    /// Minimum gap between manual re-polls of the transaction source.
    pub refresh_cooldown_minutes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Pacific::Auckland,
            analysis_start: None,
            lookback_days: 180,
            refresh_cooldown_minutes: 15,
        }
    }
}

impl EngineConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_content)?)
    }

    /// The default obligation window ending today on the household clock.
    pub fn analysis_window(&self, now: DateTime<Utc>) -> DateRange {
        let today = local_date(now, self.timezone);
        let start = self
            .analysis_start
            .unwrap_or(today - Duration::days(self.lookback_days));
        DateRange::new(start, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn empty_config_uses_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config.timezone, chrono_tz::Pacific::Auckland);
        assert_eq!(config.lookback_days, 180);
        assert_eq!(config.analysis_start, None);
    }

    #[test]
    fn parses_explicit_settings() {
        let config = EngineConfig::from_toml(
            r#"
            timezone = "Australia/Sydney"
            analysis_start = "2025-01-01"
            refresh_cooldown_minutes = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.timezone, chrono_tz::Australia::Sydney);
        assert_eq!(
            config.analysis_start,
            Some(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
        );
        assert_eq!(config.refresh_cooldown_minutes, 5);
    }

    #[test]
    fn invalid_timezone_is_an_error() {
        assert!(EngineConfig::from_toml(r#"timezone = "Mars/Olympus""#).is_err());
    }

    #[test]
    fn window_defaults_to_lookback_from_now() {
        let config = EngineConfig::default();
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        let window = config.analysis_window(now);
        assert_eq!(window.end - window.start, Duration::days(180));
    }

    #[test]
    fn window_uses_fixed_start_when_set() {
        let config = EngineConfig {
            analysis_start: Some(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            ..EngineConfig::default()
        };
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        let window = config.analysis_window(now);
        assert_eq!(window.start, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }
}
