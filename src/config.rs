//! Engine configuration
//!
//! JSON file; every field is optional and falls back to the knob default.
//! `EngineConfig::load` parses then validates, so a loaded config is always
//! inside every knob range.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bins::DataRange;
use crate::core::constants::{
    BASE_GROUP_RULEKIT, SECS_PER_TRIGGER_DEFAULT, SNAPSHOT_SIZE, STATISTICS_DEPTH_MAX,
    TRIGGERS_PER_CYCLE_MAX, TRIGGER_LAPS_DEFAULT,
};
use crate::knob::{
    tracking_half_band, tracking_warn, SHEWHART_TRIP_FREE_MARGIN, SHEWHART_Z_PASS,
    TRACKING_APPS_BETWEEN_RESETS, TRACKING_LAG_FRAC, TRACKING_STALE_FRAC,
};
use crate::sequence::Sequence;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_secs_per_trigger")]
    pub secs_per_trigger: i64,

    /// Cap on scheduler laps per tick
    #[serde(default = "default_max_trigger_laps")]
    pub max_trigger_laps: u32,

    /// Log every completed tick, not only lifecycle events
    #[serde(default)]
    pub log_ticks: bool,

    #[serde(default)]
    pub shewhart: ShewhartConfig,

    #[serde(default)]
    pub tracking: TrackingConfig,

    #[serde(default)]
    pub rule_kit: RuleKitConfig,

    /// Monitored channels for the replay harness
    #[serde(default)]
    pub points: Vec<PointConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShewhartConfig {
    #[serde(default = "default_z_pass")]
    pub z_pass: f64,
    #[serde(default = "default_trip_free_margin")]
    pub trip_free_margin: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: i64,
}

/// `half_band` and `warn` are in the units of each point's range; when absent
/// the range's own default applies (0.5 and 5.0 for 0..120).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub half_band: Option<f64>,
    #[serde(default)]
    pub warn: Option<f64>,
    #[serde(default = "default_lag_frac")]
    pub lag_frac: f64,
    #[serde(default = "default_stale_frac")]
    pub stale_frac: f64,
    #[serde(default = "default_apps_between_resets")]
    pub apps_between_resets: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleKitConfig {
    #[serde(default = "default_trap_secs")]
    pub trap_secs: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointConfig {
    pub name: String,
    pub range: DataRange,
    #[serde(default = "default_triggers_per_cycle")]
    pub triggers_per_cycle: u32,
}

fn default_secs_per_trigger() -> i64 {
    SECS_PER_TRIGGER_DEFAULT
}
fn default_max_trigger_laps() -> u32 {
    TRIGGER_LAPS_DEFAULT
}
fn default_z_pass() -> f64 {
    SHEWHART_Z_PASS.default
}
fn default_trip_free_margin() -> u32 {
    SHEWHART_TRIP_FREE_MARGIN.default as u32
}
fn default_window_secs() -> i64 {
    180
}
fn default_lag_frac() -> f64 {
    TRACKING_LAG_FRAC.default
}
fn default_stale_frac() -> f64 {
    TRACKING_STALE_FRAC.default
}
fn default_apps_between_resets() -> u32 {
    TRACKING_APPS_BETWEEN_RESETS.default as u32
}
fn default_trap_secs() -> i64 {
    3600
}
fn default_triggers_per_cycle() -> u32 {
    1
}

impl Default for ShewhartConfig {
    fn default() -> Self {
        Self {
            z_pass: default_z_pass(),
            trip_free_margin: default_trip_free_margin(),
            window_secs: default_window_secs(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            half_band: None,
            warn: None,
            lag_frac: default_lag_frac(),
            stale_frac: default_stale_frac(),
            apps_between_resets: default_apps_between_resets(),
        }
    }
}

impl Default for RuleKitConfig {
    fn default() -> Self {
        Self {
            trap_secs: default_trap_secs(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            secs_per_trigger: default_secs_per_trigger(),
            max_trigger_laps: default_max_trigger_laps(),
            log_ticks: false,
            shewhart: ShewhartConfig::default(),
            tracking: TrackingConfig::default(),
            rule_kit: RuleKitConfig::default(),
            points: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.secs_per_trigger <= 0 {
            return Err(invalid("secs_per_trigger must be > 0"));
        }
        if !(1..BASE_GROUP_RULEKIT).contains(&self.max_trigger_laps) {
            return Err(invalid(format!(
                "max_trigger_laps must be in 1..{}",
                BASE_GROUP_RULEKIT
            )));
        }

        vet("shewhart.z_pass", SHEWHART_Z_PASS.vet(self.shewhart.z_pass))?;
        vet(
            "shewhart.trip_free_margin",
            SHEWHART_TRIP_FREE_MARGIN.vet(self.shewhart.trip_free_margin as f64),
        )?;
        vet("tracking.lag_frac", TRACKING_LAG_FRAC.vet(self.tracking.lag_frac))?;
        vet("tracking.stale_frac", TRACKING_STALE_FRAC.vet(self.tracking.stale_frac))?;
        vet(
            "tracking.apps_between_resets",
            TRACKING_APPS_BETWEEN_RESETS.vet(self.tracking.apps_between_resets as f64),
        )?;

        let trap = self.rule_kit.trap_secs / self.secs_per_trigger;
        if !(SNAPSHOT_SIZE as i64..=STATISTICS_DEPTH_MAX as i64).contains(&trap) {
            return Err(invalid(format!(
                "rule_kit.trap_secs must span {}..={} ticks",
                SNAPSHOT_SIZE, STATISTICS_DEPTH_MAX
            )));
        }

        let mut names: Vec<&str> = Vec::with_capacity(self.points.len());
        for point in &self.points {
            if point.name.trim().is_empty() {
                return Err(invalid("point name must not be empty"));
            }
            if names.contains(&point.name.as_str()) {
                return Err(invalid(format!("duplicate point '{}'", point.name)));
            }
            names.push(&point.name);

            if !(1..=TRIGGERS_PER_CYCLE_MAX).contains(&point.triggers_per_cycle) {
                return Err(invalid(format!(
                    "point '{}': triggers_per_cycle must be in 1..={}",
                    point.name, TRIGGERS_PER_CYCLE_MAX
                )));
            }

            let spc = point.triggers_per_cycle as i64 * self.secs_per_trigger;
            let window = self.shewhart.window_secs;
            if window < spc || window >= STATISTICS_DEPTH_MAX as i64 * spc {
                return Err(invalid(format!(
                    "point '{}': shewhart.window_secs must be in {}..{}",
                    point.name,
                    spc,
                    STATISTICS_DEPTH_MAX as i64 * spc
                )));
            }
            if let Some(v) = self.tracking.half_band {
                vet("tracking.half_band", tracking_half_band(point.range).vet(v))?;
            }
            if let Some(v) = self.tracking.warn {
                vet("tracking.warn", tracking_warn(point.range).vet(v))?;
            }
        }
        Ok(())
    }

    /// Empty sequence at this config's tick period and lap cap.
    pub fn sequence(&self) -> Sequence {
        Sequence::with_limits(self.secs_per_trigger, self.max_trigger_laps, self.log_ticks)
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

fn vet<T>(field: &str, result: crate::core::CoreResult<T>) -> ConfigResult<()> {
    result
        .map(|_| ())
        .map_err(|e| invalid(format!("{}: {}", field, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_object_takes_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.secs_per_trigger, 60);
        assert_eq!(config.max_trigger_laps, 32);
        assert_eq!(config.shewhart.z_pass, 3.0);
        assert_eq!(config.tracking.apps_between_resets, 5);
        assert_eq!(config.rule_kit.trap_secs, 3600);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"secs_per_trigger": 30, "points": [{{"name": "sat", "range": "zero_to_120"}}]}}"#
        )
        .unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.secs_per_trigger, 30);
        assert_eq!(config.points[0].range, DataRange::ZeroTo120);
        assert_eq!(config.points[0].triggers_per_cycle, 1);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn test_knob_out_of_range_rejected() {
        let err = EngineConfig::from_json(r#"{"shewhart": {"z_pass": 7.5}}"#).unwrap_err();
        assert!(err.to_string().contains("shewhart.z_pass"));
    }

    #[test]
    fn test_half_band_vetted_per_range() {
        let json = r#"{"tracking": {"half_band": 0.5},
            "points": [{"name": "flow", "range": "zero_to_3k"}]}"#;
        assert!(matches!(
            EngineConfig::from_json(json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_duplicate_point_rejected() {
        let json = r#"{"points": [{"name": "a", "range": "percent"},
            {"name": "a", "range": "percent"}]}"#;
        let err = EngineConfig::from_json(json).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_trap_span_checked_against_tick_period() {
        let json = r#"{"rule_kit": {"trap_secs": 600}}"#;
        assert!(EngineConfig::from_json(json).is_err());
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            EngineConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
