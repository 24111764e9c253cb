//! Reads/writes `~/.waynav/config.toml`.
//!
//! Every field has a default, so a missing file or a partial one is fine.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use waynav_control::ControllerConfig;
use waynav_control::motion::{
    DEFAULT_ANGULAR_SPEED, DEFAULT_ARRIVAL_THRESHOLD, DEFAULT_BEARING_DEADBAND_DEG,
    DEFAULT_LINEAR_SPEED,
};
use waynav_perception::Transform2D;
use waynav_runtime::RuntimeSettings;
use waynav_runtime::mission::DEFAULT_SIM_RATE_HZ;
use waynav_runtime::nav_loop::DEFAULT_CONTROL_RATE_HZ;
use waynav_types::NavError;

/// Persisted navigation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_control_rate_hz")]
    pub control_rate_hz: f64,

    #[serde(default = "default_bearing_deadband_deg")]
    pub bearing_deadband_deg: f64,

    #[serde(default = "default_arrival_threshold")]
    pub arrival_threshold: f64,

    /// rad/s
    #[serde(default = "default_angular_speed")]
    pub angular_speed: f64,

    #[serde(default = "default_linear_speed")]
    pub linear_speed: f64,

    /// Poses older than this are ignored; `0` disables the check.
    #[serde(default = "default_max_pose_age_ms")]
    pub max_pose_age_ms: u64,

    #[serde(default = "default_sim_rate_hz")]
    pub sim_rate_hz: f64,

    /// Static `world` → `odom` offset.
    #[serde(default)]
    pub odom_offset_x: f64,
    #[serde(default)]
    pub odom_offset_y: f64,
    #[serde(default)]
    pub odom_offset_theta: f64,
}

fn default_control_rate_hz() -> f64 {
    DEFAULT_CONTROL_RATE_HZ
}
fn default_bearing_deadband_deg() -> f64 {
    DEFAULT_BEARING_DEADBAND_DEG
}
fn default_arrival_threshold() -> f64 {
    DEFAULT_ARRIVAL_THRESHOLD
}
fn default_angular_speed() -> f64 {
    DEFAULT_ANGULAR_SPEED
}
fn default_linear_speed() -> f64 {
    DEFAULT_LINEAR_SPEED
}
fn default_max_pose_age_ms() -> u64 {
    500
}
fn default_sim_rate_hz() -> f64 {
    DEFAULT_SIM_RATE_HZ
}

impl Default for Config {
    fn default() -> Self {
        Self {
            control_rate_hz: default_control_rate_hz(),
            bearing_deadband_deg: default_bearing_deadband_deg(),
            arrival_threshold: default_arrival_threshold(),
            angular_speed: default_angular_speed(),
            linear_speed: default_linear_speed(),
            max_pose_age_ms: default_max_pose_age_ms(),
            sim_rate_hz: default_sim_rate_hz(),
            odom_offset_x: 0.0,
            odom_offset_y: 0.0,
            odom_offset_theta: 0.0,
        }
    }
}

impl Config {
    pub fn controller(&self) -> ControllerConfig {
        ControllerConfig {
            bearing_deadband_deg: self.bearing_deadband_deg,
            arrival_threshold: self.arrival_threshold,
            angular_speed: self.angular_speed,
            linear_speed: self.linear_speed,
        }
    }

    /// Runtime settings for a simulated run.  Values are checked when the
    /// run starts.
    pub fn runtime_settings(&self) -> RuntimeSettings {
        RuntimeSettings {
            controller: self.controller(),
            control_rate_hz: self.control_rate_hz,
            sim_rate_hz: self.sim_rate_hz,
            max_pose_age: (self.max_pose_age_ms > 0)
                .then(|| Duration::from_millis(self.max_pose_age_ms)),
            odom_offset: Transform2D::new(
                self.odom_offset_x,
                self.odom_offset_y,
                self.odom_offset_theta,
            ),
            ..RuntimeSettings::default()
        }
    }
}

/// Return the path to `~/.waynav/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".waynav").join("config.toml")
}

/// Load `~/.waynav/config.toml`, falling back to defaults when it does not
/// exist.  Environment overrides apply either way.
pub fn load() -> Result<Config, NavError> {
    let mut cfg = load_from(&config_path())?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Load the file at `path`.  Returns `None` if it does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, NavError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| NavError::Config(format!("failed to read {}: {e}", path.display())))?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| NavError::Config(format!("failed to parse {}: {e}", path.display())))?;
    Ok(Some(cfg))
}

/// Apply `WAYNAV_*` environment overrides.  Unparsable values are ignored.
///
/// | Variable | Config field |
/// |---|---|
/// | `WAYNAV_CONTROL_RATE_HZ` | `control_rate_hz` |
/// | `WAYNAV_ARRIVAL_THRESHOLD` | `arrival_threshold` |
/// | `WAYNAV_LINEAR_SPEED` | `linear_speed` |
/// | `WAYNAV_ANGULAR_SPEED` | `angular_speed` |
pub fn apply_env_overrides(cfg: &mut Config) {
    let overrides: [(&str, &mut f64); 4] = [
        ("WAYNAV_CONTROL_RATE_HZ", &mut cfg.control_rate_hz),
        ("WAYNAV_ARRIVAL_THRESHOLD", &mut cfg.arrival_threshold),
        ("WAYNAV_LINEAR_SPEED", &mut cfg.linear_speed),
        ("WAYNAV_ANGULAR_SPEED", &mut cfg.angular_speed),
    ];
    for (var, field) in overrides {
        if let Ok(v) = std::env::var(var)
            && let Ok(value) = v.trim().parse::<f64>()
        {
            *field = value;
        }
    }
}

/// Save `cfg` to `~/.waynav/config.toml`.
pub fn save(cfg: &Config) -> Result<(), NavError> {
    save_to(cfg, &config_path())
}

/// Write `cfg` to `path`, creating the parent directory if needed.
pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), NavError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| NavError::Config(format!("failed to create config directory: {e}")))?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| NavError::Config(format!("failed to serialize config: {e}")))?;
    fs::write(path, raw)
        .map_err(|e| NavError::Config(format!("failed to write {}: {e}", path.display())))
}
