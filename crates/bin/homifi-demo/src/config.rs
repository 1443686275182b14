//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `homifi.toml` in the working directory. Every field has a
//! default so the file is optional. Environment variables take precedence
//! over file values.

use std::time::Duration;

use serde::Deserialize;

use homifi_adapter_virtual::ShowcaseOptions;
use homifi_domain::descriptor::Timing;
use homifi_domain::time::millis;
use homifi_domain::viewport::VisibilityOptions;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    /// When a section counts as "entered".
    pub visibility: VisibilityConfig,
    /// Step and revert durations.
    pub timing: TimingConfig,
    /// The scripted walk through the page.
    pub demo: DemoConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Visible fraction of a section that fires its auto-trigger.
    pub threshold: f64,
    /// Pixels shaved off the bottom of the viewport.
    pub root_margin_px: f64,
    pub settle_delay_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub lock_unlock_ms: u64,
    pub lock_relock_ms: u64,
    pub security_alert_ms: u64,
    pub security_auto_clear_ms: u64,
    pub curtain_clip_ms: u64,
    pub climate_step_ms: u64,
    pub media_grace_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub viewport_height: f64,
    pub scroll_step_px: f64,
    pub scroll_interval_ms: u64,
    /// Rapid taps per section after the auto-triggers settle.
    pub taps: u32,
}

impl Config {
    /// Load configuration from `homifi.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting values are out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("homifi.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HOMIFI_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("HOMIFI_SETTLE_DELAY_MS") {
            if let Ok(ms) = val.parse() {
                self.visibility.settle_delay_ms = ms;
            }
        }
        if let Ok(val) = std::env::var("HOMIFI_THRESHOLD") {
            if let Ok(threshold) = val.parse() {
                self.visibility.threshold = threshold;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.visibility.threshold;
        if threshold.is_nan() || threshold <= 0.0 || threshold > 1.0 {
            return Err(ConfigError::Validation(format!(
                "visibility threshold must be in (0, 1], got {threshold}"
            )));
        }
        if !is_positive(self.demo.viewport_height) {
            return Err(ConfigError::Validation(
                "viewport height must be positive".to_string(),
            ));
        }
        if !is_positive(self.demo.scroll_step_px) {
            return Err(ConfigError::Validation(
                "scroll step must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Step durations for the shared descriptor table.
    #[must_use]
    pub fn timing(&self) -> Timing {
        let t = &self.timing;
        Timing {
            lock_unlock: millis(t.lock_unlock_ms),
            lock_relock: millis(t.lock_relock_ms),
            security_alert: millis(t.security_alert_ms),
            security_auto_clear: millis(t.security_auto_clear_ms),
            curtain_clip: millis(t.curtain_clip_ms),
            climate_step: millis(t.climate_step_ms),
            media_grace: millis(t.media_grace_ms),
        }
    }

    #[must_use]
    pub fn visibility(&self) -> VisibilityOptions {
        VisibilityOptions {
            threshold: self.visibility.threshold,
            root_margin_bottom: self.visibility.root_margin_px,
            settle_delay: millis(self.visibility.settle_delay_ms),
        }
    }

    #[must_use]
    pub fn scroll_interval(&self) -> Duration {
        millis(self.demo.scroll_interval_ms)
    }

    /// Page layout and timings for the simulated showcase.
    #[must_use]
    pub fn showcase_options(&self) -> ShowcaseOptions {
        let timing = self.timing();
        let mut options = ShowcaseOptions {
            timing,
            visibility: self.visibility(),
            viewport_height: self.demo.viewport_height,
            ..ShowcaseOptions::default()
        };
        options.media.clip_length = timing.curtain_clip;
        options
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "homifi_demo=info,homifi_app=info,homifi_adapter_virtual=info".to_string(),
        }
    }
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        let options = VisibilityOptions::default();
        Self {
            threshold: options.threshold,
            root_margin_px: options.root_margin_bottom,
            settle_delay_ms: duration_ms(options.settle_delay),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        let t = Timing::default();
        Self {
            lock_unlock_ms: duration_ms(t.lock_unlock),
            lock_relock_ms: duration_ms(t.lock_relock),
            security_alert_ms: duration_ms(t.security_alert),
            security_auto_clear_ms: duration_ms(t.security_auto_clear),
            curtain_clip_ms: duration_ms(t.curtain_clip),
            climate_step_ms: duration_ms(t.climate_step),
            media_grace_ms: duration_ms(t.media_grace),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            viewport_height: 800.0,
            scroll_step_px: 240.0,
            scroll_interval_ms: 120,
            taps: 3,
        }
    }
}

/// Also false for NaN.
fn is_positive(value: f64) -> bool {
    value > 0.0
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
