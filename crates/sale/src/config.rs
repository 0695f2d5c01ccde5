//! # Sale Configuration
//!
//! [`SaleConfig`] is read from TOML and then overlaid with `MINTSALE_*`
//! environment variables. Every field has a default, so an empty file is a
//! valid configuration for the mock sale.
//!
//! ```toml
//! mode = "zones"
//! gateway_url = "http://127.0.0.1:4000"
//! sale_process_id = "..."
//! payment_token_process_id = "..."
//! token_decimals = 12
//!
//! [poll]
//! base_interval = 10
//! slow_interval = 30
//!
//! [schedule.og]
//! start = "2025-02-09T01:00:00Z"
//! end = "2025-02-11T01:00:00Z"
//! ```
//!
//! ## Environment
//!
//! | Variable | Field |
//! |----------|-------|
//! | `MINTSALE_GATEWAY_URL` | `gateway_url` |
//! | `MINTSALE_SALE_PROCESS` | `sale_process_id` |
//! | `MINTSALE_TOKEN_PROCESS` | `payment_token_process_id` |
//! | `MINTSALE_WALLET_ADDRESS` | `wallet_address` |
//! | `MINTSALE_TOKEN_DECIMALS` | `token_decimals` |
//! | `MINTSALE_POLL_BASE_SECS` | `poll.base_interval` |
//! | `MINTSALE_POLL_SLOW_SECS` | `poll.slow_interval` |

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_TOKEN_DECIMALS, LUCKY_DRAW_PROBABILITY, OPEN_ZONE, SUCCESS_INDICATOR, TOTAL_SUPPLY,
};
use crate::phase::{PhaseSchedule, ScheduleError};
use crate::poll::PollConfig;
use crate::zone::ZoneRules;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{name} invalid: '{value}'")]
    InvalidEnv { name: &'static str, value: String },

    #[error("invalid schedule: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("{0}")]
    Invalid(String),
}

/// Where the current phase comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleMode {
    /// Polled zone data decides eligibility and limits.
    #[default]
    Zones,
    /// Fixed UTC windows decide the phase.
    Schedule,
}

/// Purchase flow tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurchaseConfig {
    /// A lucky draw proceeds when the drawn value is at most this.
    pub lucky_draw_probability: f64,
    #[serde(with = "duration_millis")]
    pub success_indicator: Duration,
}

impl Default for PurchaseConfig {
    fn default() -> Self {
        Self {
            lucky_draw_probability: LUCKY_DRAW_PROBABILITY,
            success_indicator: SUCCESS_INDICATOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaleConfig {
    pub mode: SaleMode,
    pub gateway_url: String,
    pub sale_process_id: String,
    pub payment_token_process_id: String,
    /// Address used when no wallet extension supplies one.
    pub wallet_address: Option<String>,
    pub token_decimals: u32,
    pub total_supply: u64,
    pub open_zone: u32,
    /// Timeout for info and count queries. Purchases are never timed out.
    #[serde(with = "crate::poll::duration_secs")]
    pub query_timeout: Duration,
    pub poll: PollConfig,
    pub purchase: PurchaseConfig,
    pub schedule: PhaseSchedule,
}

impl Default for SaleConfig {
    fn default() -> Self {
        Self {
            mode: SaleMode::default(),
            gateway_url: "http://127.0.0.1:4000".to_string(),
            sale_process_id: String::new(),
            payment_token_process_id: String::new(),
            wallet_address: None,
            token_decimals: DEFAULT_TOKEN_DECIMALS,
            total_supply: TOTAL_SUPPLY,
            open_zone: OPEN_ZONE,
            query_timeout: Duration::from_secs(10),
            poll: PollConfig::default(),
            purchase: PurchaseConfig::default(),
            schedule: PhaseSchedule::default(),
        }
    }
}

impl SaleConfig {
    /// Loads and validates a TOML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path.as_ref())?;
        let cfg: Self = toml::from_str(&raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        cfg.apply_env()?;
        Ok(cfg)
    }

    /// Overlays `MINTSALE_*` variables onto this config.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = var("MINTSALE_GATEWAY_URL") {
            self.gateway_url = v;
        }
        if let Some(v) = var("MINTSALE_SALE_PROCESS") {
            self.sale_process_id = v;
        }
        if let Some(v) = var("MINTSALE_TOKEN_PROCESS") {
            self.payment_token_process_id = v;
        }
        if let Some(v) = var("MINTSALE_WALLET_ADDRESS") {
            self.wallet_address = Some(v);
        }
        if let Some(v) = var("MINTSALE_TOKEN_DECIMALS") {
            self.token_decimals = parse_env("MINTSALE_TOKEN_DECIMALS", &v)?;
        }
        if let Some(v) = var("MINTSALE_POLL_BASE_SECS") {
            self.poll.base_interval = Duration::from_secs(parse_env("MINTSALE_POLL_BASE_SECS", &v)?);
        }
        if let Some(v) = var("MINTSALE_POLL_SLOW_SECS") {
            self.poll.slow_interval = Duration::from_secs(parse_env("MINTSALE_POLL_SLOW_SECS", &v)?);
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schedule.validate()?;
        if self.token_decimals > 38 {
            return Err(ConfigError::Invalid(format!(
                "token_decimals {} exceeds 38",
                self.token_decimals
            )));
        }
        if self.open_zone == 0 {
            return Err(ConfigError::Invalid("open_zone must be at least 1".to_string()));
        }
        if self.poll.base_interval.is_zero() || self.poll.slow_interval.is_zero() {
            return Err(ConfigError::Invalid("poll intervals must be non-zero".to_string()));
        }
        if self.poll.failure_threshold == 0 {
            return Err(ConfigError::Invalid("failure_threshold must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.purchase.lucky_draw_probability) {
            return Err(ConfigError::Invalid(format!(
                "lucky_draw_probability {} outside [0, 1]",
                self.purchase.lucky_draw_probability
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn zone_rules(&self) -> ZoneRules {
        ZoneRules {
            open_zone: self.open_zone,
            token_decimals: self.token_decimals,
            total_supply: self.total_supply,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { name, value: value.to_string() })
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let cfg = SaleConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.mode, SaleMode::Zones);
        assert_eq!(cfg.token_decimals, 12);
        assert_eq!(cfg.total_supply, 3333);
        assert_eq!(cfg.open_zone, 3);
        assert_eq!(cfg.purchase.success_indicator, Duration::from_millis(3000));
        assert!((cfg.purchase.lucky_draw_probability - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn load_from_file_overrides_selected_fields() {
        let mut tmp = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            tmp,
            r#"
            mode = "schedule"
            sale_process_id = "sale-pid"
            token_decimals = 9

            [poll]
            slow_interval = 45

            [purchase]
            success_indicator = 1500
            "#
        )
        .expect("write");

        let cfg = SaleConfig::load_from_file(tmp.path()).expect("load");
        assert_eq!(cfg.mode, SaleMode::Schedule);
        assert_eq!(cfg.sale_process_id, "sale-pid");
        assert_eq!(cfg.token_decimals, 9);
        assert_eq!(cfg.poll.slow_interval, Duration::from_secs(45));
        assert_eq!(cfg.poll.base_interval, Duration::from_secs(10));
        assert_eq!(cfg.purchase.success_indicator, Duration::from_millis(1500));
        assert_eq!(cfg.schedule, PhaseSchedule::default());
    }

    #[test]
    fn partial_schedule_keeps_default_windows() {
        let mut tmp = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            tmp,
            r#"
            mode = "zones"

            [poll]
            base_interval = 10
            slow_interval = 30

            [schedule.og]
            start = "2025-02-09T00:00:00Z"
            end = "2025-02-10T00:00:00Z"
            "#
        )
        .expect("write");

        let cfg = SaleConfig::load_from_file(tmp.path()).expect("load");
        let defaults = PhaseSchedule::default();
        assert_eq!(cfg.schedule.og.start.to_rfc3339(), "2025-02-09T00:00:00+00:00");
        assert_eq!(cfg.schedule.og.end.map(|e| e.to_rfc3339()).as_deref(), Some("2025-02-10T00:00:00+00:00"));
        assert_eq!(cfg.schedule.fcfs, defaults.fcfs);
        assert_eq!(cfg.schedule.public, defaults.public);
    }

    #[test]
    fn load_rejects_bad_probability() {
        let mut tmp = tempfile::NamedTempFile::new().expect("temp file");
        write!(tmp, "[purchase]\nlucky_draw_probability = 1.5\n").expect("write");
        assert!(matches!(SaleConfig::load_from_file(tmp.path()), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = SaleConfig::load_from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn env_overlay() {
        let vars: HashMap<&str, &str> = [
            ("MINTSALE_SALE_PROCESS", "from-env"),
            ("MINTSALE_WALLET_ADDRESS", "addr-env"),
            ("MINTSALE_POLL_BASE_SECS", "5"),
        ]
        .into_iter()
        .collect();

        let mut cfg = SaleConfig::default();
        cfg.apply_vars(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.sale_process_id, "from-env");
        assert_eq!(cfg.wallet_address.as_deref(), Some("addr-env"));
        assert_eq!(cfg.poll.base_interval, Duration::from_secs(5));
        assert_eq!(cfg.gateway_url, "http://127.0.0.1:4000");
    }

    #[test]
    fn env_overlay_rejects_garbage() {
        let mut cfg = SaleConfig::default();
        let err = cfg
            .apply_vars(|k| (k == "MINTSALE_TOKEN_DECIMALS").then(|| "twelve".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: "MINTSALE_TOKEN_DECIMALS", .. }));
    }
}
