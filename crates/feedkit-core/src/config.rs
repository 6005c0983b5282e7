//! Configuration file loading with precedence handling.
//!
//! Precedence, lowest to highest: built-in defaults, the TOML config file,
//! environment variables, explicit [`ConfigOverrides`].
//!
//! ```toml
//! log_file_path = "/tmp/feedkit.log"
//!
//! [viewport]
//! debounce_ms = 150
//! trigger_threshold_px = 10.0
//! compact_max_width_em = 39.9375
//! root_font_size_px = 16.0
//! root_id = "posts_list"
//!
//! [ads]
//! enabled = true
//!
//! [ads.slots.in_feed_1]
//! every = 5
//!
//! [display]
//! nsfw_pref = "warn"
//! ```

use crate::ads::{AdKind, AdSlot, AdsSettings, IN_FEED_SLOT};
use crate::compose::NsfwPref;
use crate::layout::Breakpoint;
use crate::monitor::MonitorConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const ENV_CONFIG: &str = "FEEDKIT_CONFIG";
/// Environment variable switching ads on or off.
pub const ENV_ADS_ENABLED: &str = "FEEDKIT_ADS_ENABLED";
/// Environment variable overriding the log file path.
pub const ENV_LOG_FILE: &str = "FEEDKIT_LOG_FILE";

const DEFAULT_AD_CADENCE: usize = 5;

/// Errors that can occur while loading or resolving configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    /// Config file contains invalid TOML or unknown keys.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    /// An ad slot was configured with a cadence of zero.
    #[error("Ad slot `{slot}` must have `every` of at least 1")]
    InvalidCadence { slot: String },

    /// A numeric setting is out of range.
    #[error("Invalid value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    /// An environment variable holds something unparseable.
    #[error("Invalid value {value:?} in environment variable {var}")]
    InvalidEnv { var: &'static str, value: String },
}

/// TOML configuration file structure. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
    #[serde(default)]
    pub viewport: Option<ViewportSection>,
    #[serde(default)]
    pub ads: Option<AdsSection>,
    #[serde(default)]
    pub display: Option<DisplaySection>,
}

/// `[viewport]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ViewportSection {
    #[serde(default)]
    pub debounce_ms: Option<u64>,
    #[serde(default)]
    pub trigger_threshold_px: Option<f64>,
    #[serde(default)]
    pub compact_max_width_em: Option<f64>,
    #[serde(default)]
    pub root_font_size_px: Option<f64>,
    #[serde(default)]
    pub root_id: Option<String>,
}

/// `[ads]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AdsSection {
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Named slots, e.g. `[ads.slots.in_feed_1]`.
    #[serde(default)]
    pub slots: HashMap<String, SlotSection>,
}

/// One `[ads.slots.<name>]` table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SlotSection {
    /// Cadence in items. Zero is rejected during merge.
    pub every: usize,
    #[serde(default)]
    pub kind: Option<AdKind>,
    #[serde(default)]
    pub zone_id: Option<String>,
}

/// `[display]` section.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DisplaySection {
    #[serde(default)]
    pub nsfw_pref: Option<NsfwPref>,
}

/// Configuration after applying precedence rules.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub monitor: MonitorConfig,
    pub ads: AdsSettings,
    /// Preference used when the viewer has not chosen one.
    pub nsfw_pref: NsfwPref,
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        let mut slots = HashMap::new();
        slots.insert(
            IN_FEED_SLOT.to_string(),
            AdSlot::every(NonZeroUsize::new(DEFAULT_AD_CADENCE).unwrap_or(NonZeroUsize::MIN)),
        );
        Self {
            monitor: MonitorConfig::default(),
            ads: AdsSettings {
                enabled: false,
                slots,
            },
            nsfw_pref: NsfwPref::default(),
            log_file_path: default_log_path(),
        }
    }
}

/// Explicit overrides, typically from command-line flags. Highest
/// precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub ads_enabled: Option<bool>,
    pub nsfw_pref: Option<NsfwPref>,
    pub log_file_path: Option<PathBuf>,
}

/// `~/.local/state/feedkit/feedkit.log` or the platform equivalent, falling
/// back to the working directory.
pub fn default_log_path() -> PathBuf {
    match dirs::state_dir() {
        Some(state_dir) => state_dir.join("feedkit").join("feedkit.log"),
        None => PathBuf::from("feedkit.log"),
    }
}

/// `~/.config/feedkit/config.toml` or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("feedkit").join("config.toml"))
}

/// Load a config file.
///
/// Returns `Ok(None)` if the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    parse_config(&contents)
        .map(Some)
        .map_err(|reason| ConfigError::ParseError { path, reason })
}

fn parse_config(contents: &str) -> Result<ConfigFile, String> {
    toml::from_str(contents).map_err(|e| e.to_string())
}

/// Locate and load the config file.
///
/// Tries `config_path`, then [`ENV_CONFIG`], then [`default_config_path`].
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }
    if let Ok(env_path) = std::env::var(ENV_CONFIG) {
        return load_config_file(PathBuf::from(env_path));
    }
    match default_config_path() {
        Some(path) => load_config_file(path),
        None => Ok(None),
    }
}

/// Merge a config file over the defaults.
///
/// # Errors
///
/// Rejects a zero ad cadence and non-positive geometry settings.
pub fn merge_config(config_file: Option<ConfigFile>) -> Result<ResolvedConfig, ConfigError> {
    let mut resolved = ResolvedConfig::default();
    let Some(config) = config_file else {
        return Ok(resolved);
    };

    if let Some(path) = config.log_file_path {
        resolved.log_file_path = path;
    }

    if let Some(viewport) = config.viewport {
        let monitor = &mut resolved.monitor;
        if let Some(ms) = viewport.debounce_ms {
            monitor.debounce = Duration::from_millis(ms);
        }
        if let Some(px) = viewport.trigger_threshold_px {
            monitor.trigger_threshold_px = positive("viewport.trigger_threshold_px", px)?;
        }
        if let Some(em) = viewport.compact_max_width_em {
            monitor.breakpoint = Breakpoint {
                max_width_em: positive("viewport.compact_max_width_em", em)?,
            };
        }
        if let Some(px) = viewport.root_font_size_px {
            monitor.root_font_px = positive("viewport.root_font_size_px", px)?;
        }
        if let Some(id) = viewport.root_id {
            monitor.root_id = id;
        }
    }

    if let Some(ads) = config.ads {
        if let Some(enabled) = ads.enabled {
            resolved.ads.enabled = enabled;
        }
        for (name, slot) in ads.slots {
            let every =
                NonZeroUsize::new(slot.every).ok_or_else(|| ConfigError::InvalidCadence {
                    slot: name.clone(),
                })?;
            resolved.ads.slots.insert(
                name,
                AdSlot {
                    every,
                    kind: slot.kind.unwrap_or_default(),
                    zone_id: slot.zone_id,
                },
            );
        }
    }

    if let Some(pref) = config.display.and_then(|d| d.nsfw_pref) {
        resolved.nsfw_pref = pref;
    }

    Ok(resolved)
}

fn finite(key: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            key,
            reason: format!("{value} is not a finite number"),
        })
    }
}

fn positive(key: &'static str, value: f64) -> Result<f64, ConfigError> {
    if finite(key, value)? > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            key,
            reason: format!("{value} must be greater than zero"),
        })
    }
}

/// Apply [`ENV_ADS_ENABLED`] and [`ENV_LOG_FILE`] from the process
/// environment.
pub fn apply_env_overrides(config: ResolvedConfig) -> Result<ResolvedConfig, ConfigError> {
    apply_env_overrides_from(config, |var| std::env::var(var).ok())
}

/// Apply environment overrides read through `lookup`.
pub fn apply_env_overrides_from(
    mut config: ResolvedConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig, ConfigError> {
    if let Some(value) = lookup(ENV_ADS_ENABLED) {
        config.ads.enabled = parse_flag(&value).ok_or(ConfigError::InvalidEnv {
            var: ENV_ADS_ENABLED,
            value,
        })?;
    }
    if let Some(path) = lookup(ENV_LOG_FILE) {
        config.log_file_path = PathBuf::from(path);
    }
    Ok(config)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Apply explicit overrides. Only fields that are set take effect.
pub fn apply_overrides(mut config: ResolvedConfig, overrides: ConfigOverrides) -> ResolvedConfig {
    if let Some(enabled) = overrides.ads_enabled {
        config.ads.enabled = enabled;
    }
    if let Some(pref) = overrides.nsfw_pref {
        config.nsfw_pref = pref;
    }
    if let Some(path) = overrides.log_file_path {
        config.log_file_path = path;
    }
    config
}

/// Run the whole chain: locate and load the file, merge, apply the
/// environment, apply `overrides`.
pub fn load_config(
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
) -> Result<ResolvedConfig, ConfigError> {
    let file = load_config_with_precedence(config_path)?;
    let resolved = apply_env_overrides(merge_config(file)?)?;
    Ok(apply_overrides(resolved, overrides))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parse(toml: &str) -> ConfigFile {
        parse_config(toml).unwrap()
    }

    #[test]
    fn missing_file_is_not_an_error() {
        assert_eq!(load_config_file("/nonexistent/feedkit/config.toml"), Ok(None));
    }

    #[test]
    fn loads_file_from_disk() {
        let path = std::env::temp_dir().join(format!("feedkit_test_config_{}.toml", std::process::id()));
        fs::write(&path, "[ads]\nenabled = true\n").unwrap();

        let loaded = load_config_file(&path).unwrap().unwrap();

        assert_eq!(loaded.ads.unwrap().enabled, Some(true));
        fs::remove_file(path).ok();
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let path = std::env::temp_dir().join(format!("feedkit_test_invalid_{}.toml", std::process::id()));
        fs::write(&path, "[viewport\ndebounce_ms = ").unwrap();

        let result = load_config_file(&path);

        assert!(matches!(result, Err(ConfigError::ParseError { .. })), "{result:?}");
        fs::remove_file(path).ok();
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(parse_config("[viewport]\nscroll_speed = 3\n").is_err());
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = merge_config(None).unwrap();
        assert_eq!(config.monitor.debounce, Duration::from_millis(150));
        assert_eq!(config.monitor.trigger_threshold_px, 10.0);
        assert_eq!(config.monitor.breakpoint.max_width_em, 39.9375);
        assert_eq!(config.monitor.root_id, "posts_list");
        assert_eq!(config.nsfw_pref, NsfwPref::Warn);
        assert!(!config.ads.enabled);
        assert_eq!(config.ads.slots[IN_FEED_SLOT].every.get(), 5);
        assert!(config.log_file_path.to_string_lossy().ends_with("feedkit.log"));
    }

    #[test]
    fn file_values_override_defaults() {
        let file = parse(
            r#"
log_file_path = "/var/log/feed.log"

[viewport]
debounce_ms = 250
trigger_threshold_px = 40.0
root_id = "feed"

[ads]
enabled = true

[ads.slots.in_feed_1]
every = 3
zone_id = "zone-9"

[display]
nsfw_pref = "hide"
"#,
        );

        let config = merge_config(Some(file)).unwrap();

        assert_eq!(config.log_file_path, PathBuf::from("/var/log/feed.log"));
        assert_eq!(config.monitor.debounce, Duration::from_millis(250));
        assert_eq!(config.monitor.trigger_threshold_px, 40.0);
        assert_eq!(config.monitor.root_id, "feed");
        assert!(config.ads.enabled);
        let placement = config.ads.placement(IN_FEED_SLOT);
        assert_eq!(placement.cadence.get(), 3);
        assert_eq!(placement.zone_id, "zone-9");
        assert_eq!(config.nsfw_pref, NsfwPref::Hide);
    }

    #[test]
    fn zero_cadence_is_rejected() {
        let file = parse("[ads.slots.in_feed_1]\nevery = 0\n");
        assert_eq!(
            merge_config(Some(file)),
            Err(ConfigError::InvalidCadence {
                slot: "in_feed_1".to_string()
            })
        );
    }

    #[test]
    fn non_positive_font_size_is_rejected() {
        let file = parse("[viewport]\nroot_font_size_px = 0.0\n");
        assert!(matches!(
            merge_config(Some(file)),
            Err(ConfigError::InvalidValue {
                key: "viewport.root_font_size_px",
                ..
            })
        ));
    }

    #[test]
    fn non_positive_threshold_is_rejected() {
        for value in ["0.0", "-5.0"] {
            let file = parse(&format!("[viewport]\ntrigger_threshold_px = {value}\n"));
            assert!(
                matches!(
                    merge_config(Some(file)),
                    Err(ConfigError::InvalidValue {
                        key: "viewport.trigger_threshold_px",
                        ..
                    })
                ),
                "threshold {value} accepted"
            );
        }
    }

    #[test]
    fn env_overrides_file() {
        let file = parse("[ads]\nenabled = true\n");
        let merged = merge_config(Some(file)).unwrap();

        let config = apply_env_overrides_from(merged, |var| match var {
            ENV_ADS_ENABLED => Some("false".to_string()),
            ENV_LOG_FILE => Some("/tmp/env.log".to_string()),
            _ => None,
        })
        .unwrap();

        assert!(!config.ads.enabled);
        assert_eq!(config.log_file_path, PathBuf::from("/tmp/env.log"));
    }

    #[test]
    fn unparseable_env_flag_is_an_error() {
        let result = apply_env_overrides_from(ResolvedConfig::default(), |var| {
            (var == ENV_ADS_ENABLED).then(|| "maybe".to_string())
        });
        assert_eq!(
            result,
            Err(ConfigError::InvalidEnv {
                var: ENV_ADS_ENABLED,
                value: "maybe".to_string()
            })
        );
    }

    #[test]
    fn explicit_overrides_win_over_env() {
        let from_env = apply_env_overrides_from(ResolvedConfig::default(), |var| {
            (var == ENV_ADS_ENABLED).then(|| "1".to_string())
        })
        .unwrap();

        let config = apply_overrides(
            from_env,
            ConfigOverrides {
                ads_enabled: Some(false),
                nsfw_pref: Some(NsfwPref::Show),
                log_file_path: None,
            },
        );

        assert!(!config.ads.enabled);
        assert_eq!(config.nsfw_pref, NsfwPref::Show);
    }
}
