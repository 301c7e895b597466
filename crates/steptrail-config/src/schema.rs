//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub observer: ObserverConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub envelope: EnvelopeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Page observer timing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Dedupe window for critical-path events.
    #[serde(default = "default_critical_window_ms")]
    pub critical_window_ms: u64,

    /// Per-element window for repeated Enter presses.
    #[serde(default = "default_enter_window_ms")]
    pub enter_window_ms: u64,

    /// Cool-down during which a second Enter is not processed at all.
    #[serde(default = "default_enter_cooldown_ms")]
    pub enter_cooldown_ms: u64,

    /// A submit within this long after an Enter is attributed to that Enter.
    #[serde(default = "default_submit_after_enter_ms")]
    pub submit_after_enter_ms: u64,

    /// Staggered delays of the critical multi-attempt send.
    #[serde(default = "default_delivery_delays_ms")]
    pub delivery_delays_ms: Vec<u64>,

    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_rescan_delay_ms")]
    pub rescan_delay_ms: u64,

    #[serde(default = "default_pointer_debounce_ms")]
    pub pointer_debounce_ms: u64,

    #[serde(default = "default_action_history_limit")]
    pub action_history_limit: usize,

    #[serde(default = "default_same_center_tolerance_px")]
    pub same_center_tolerance_px: f64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            critical_window_ms: default_critical_window_ms(),
            enter_window_ms: default_enter_window_ms(),
            enter_cooldown_ms: default_enter_cooldown_ms(),
            submit_after_enter_ms: default_submit_after_enter_ms(),
            delivery_delays_ms: default_delivery_delays_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            rescan_delay_ms: default_rescan_delay_ms(),
            pointer_debounce_ms: default_pointer_debounce_ms(),
            action_history_limit: default_action_history_limit(),
            same_center_tolerance_px: default_same_center_tolerance_px(),
        }
    }
}

impl ObserverConfig {
    pub fn critical_window(&self) -> Duration {
        Duration::from_millis(self.critical_window_ms)
    }

    pub fn enter_window(&self) -> Duration {
        Duration::from_millis(self.enter_window_ms)
    }

    pub fn enter_cooldown(&self) -> Duration {
        Duration::from_millis(self.enter_cooldown_ms)
    }

    pub fn submit_after_enter(&self) -> Duration {
        Duration::from_millis(self.submit_after_enter_ms)
    }

    pub fn delivery_delays(&self) -> Vec<Duration> {
        self.delivery_delays_ms
            .iter()
            .copied()
            .map(Duration::from_millis)
            .collect()
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn rescan_delay(&self) -> Duration {
        Duration::from_millis(self.rescan_delay_ms)
    }

    pub fn pointer_debounce(&self) -> Duration {
        Duration::from_millis(self.pointer_debounce_ms)
    }
}

fn default_critical_window_ms() -> u64 {
    400
}

fn default_enter_window_ms() -> u64 {
    500
}

fn default_enter_cooldown_ms() -> u64 {
    100
}

fn default_submit_after_enter_ms() -> u64 {
    100
}

fn default_delivery_delays_ms() -> Vec<u64> {
    vec![0, 1, 5]
}

fn default_settle_delay_ms() -> u64 {
    200
}

fn default_rescan_delay_ms() -> u64 {
    50
}

fn default_pointer_debounce_ms() -> u64 {
    300
}

fn default_action_history_limit() -> usize {
    50
}

fn default_same_center_tolerance_px() -> f64 {
    2.0
}

/// Remote session service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_save_path")]
    pub save_path: String,

    #[serde(default = "default_image_path")]
    pub image_path: String,

    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,

    /// Sent in the refresh request body.
    #[serde(default = "default_device_type")]
    pub device_type: String,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            save_path: default_save_path(),
            image_path: default_image_path(),
            refresh_path: default_refresh_path(),
            device_type: default_device_type(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_save_path() -> String {
    "/save-chrome-session".to_string()
}

fn default_image_path() -> String {
    "/save-image".to_string()
}

fn default_refresh_path() -> String {
    "/refresh".to_string()
}

fn default_device_type() -> String {
    "chrome_extension".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Key derivation parameters for the session envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    #[serde(default = "default_salt")]
    pub salt: String,

    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            salt: default_salt(),
            iterations: default_iterations(),
        }
    }
}

fn default_salt() -> String {
    "g5!>L$A->0y6VV?l%`n&B3E9jyC4!:".to_string()
}

fn default_iterations() -> u32 {
    98434
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// When set, logs are also written to daily-rolling files here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
