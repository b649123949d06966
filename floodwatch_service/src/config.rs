//! Service configuration.
//!
//! Settings come from an optional TOML file, then `.env`/environment
//! overrides for anything secret or deployment-specific:
//!
//! | Variable                    | Overrides              |
//! |-----------------------------|------------------------|
//! | `FLOODWATCH_API_URL`        | `api.base_url`         |
//! | `FLOODWATCH_SESSION_COOKIE` | `api.session_cookie`   |
//! | `FLOODWATCH_API_TOKEN`      | `api.api_token`        |
//!
//! Every field has a default, so an empty file (or no file) is valid.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::alert::proximity::DEFAULT_PROXIMITY_THRESHOLD_KM;
use crate::analysis::proximity::DEFAULT_TOP_N;
use crate::location::staleness::DEFAULT_MAX_FIX_AGE_SECS;
use crate::model::{Coordinate, CoordinateError};

pub const ENV_API_URL: &str = "FLOODWATCH_API_URL";
pub const ENV_SESSION_COOKIE: &str = "FLOODWATCH_SESSION_COOKIE";
pub const ENV_API_TOKEN: &str = "FLOODWATCH_API_TOKEN";

/// Upper bound on `proximity.alert_ttl_secs` (one day).
pub const MAX_ALERT_TTL_SECS: u64 = 86_400;
/// Upper bound on `location.max_fix_age_secs` (one hour).
pub const MAX_FIX_AGE_SECS: i64 = 3_600;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Cannot read configuration: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Invalid configuration syntax: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub api: ApiConfig,
    pub proximity: ProximityConfig,
    pub location: LocationConfig,
    pub regions: RegionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub fetch_timeout_secs: u64,
    pub poll_interval_secs: u64,
    pub session_cookie: Option<String>,
    pub api_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            fetch_timeout_secs: 15,
            poll_interval_secs: 5 * 60,
            session_cookie: None,
            api_token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProximityConfig {
    pub threshold_km: f64,
    pub top_n: usize,
    /// Seconds an alert stays on screen before it is cleared automatically.
    pub alert_ttl_secs: u64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            threshold_km: DEFAULT_PROXIMITY_THRESHOLD_KM,
            top_n: DEFAULT_TOP_N,
            alert_ttl_secs: 8,
        }
    }
}

impl ProximityConfig {
    pub fn alert_ttl(&self) -> Result<Duration, ConfigError> {
        checked_seconds("proximity.alert_ttl_secs", self.alert_ttl_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    Fixed,
    Replay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub source: LocationSource,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: Option<f64>,
    pub track_path: Option<PathBuf>,
    pub interval_secs: u64,
    pub max_fix_age_secs: i64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        // Pune city centre, the same fallback the dashboard map opens on.
        Self {
            source: LocationSource::Fixed,
            latitude: 18.5204,
            longitude: 73.8567,
            accuracy_m: None,
            track_path: None,
            interval_secs: 5,
            max_fix_age_secs: DEFAULT_MAX_FIX_AGE_SECS,
        }
    }
}

impl LocationConfig {
    pub fn coordinate(&self) -> Result<Coordinate, CoordinateError> {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn max_fix_age(&self) -> Result<Duration, ConfigError> {
        checked_seconds("location.max_fix_age_secs", self.max_fix_age_secs)
    }
}

/// Converts a seconds setting without overflowing `chrono::Duration`.
fn checked_seconds<T>(key: &str, secs: T) -> Result<Duration, ConfigError>
where
    T: TryInto<i64> + Copy + fmt::Display,
{
    secs.try_into()
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| ConfigError::Invalid(format!("{} is out of range: {}", key, secs)))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Region assigned to stations the backend does not tag.
    pub default_region: String,
    /// Station id or name → region, for untagged stations outside the default.
    pub stations: BTreeMap<String, String>,
    /// Subscriptions used when the backend store is unavailable (and in dev mode).
    pub subscribed: Vec<String>,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            default_region: "pune".to_string(),
            stations: BTreeMap::new(),
            subscribed: Vec::new(),
        }
    }
}

impl RegionConfig {
    /// Region for a station without a backend `region` tag: the explicit
    /// mapping by id, then by name, else the default region.
    pub fn region_for(&self, station_id: &str, station_name: &str) -> String {
        self.stations
            .get(station_id)
            .or_else(|| self.stations.get(station_name))
            .cloned()
            .unwrap_or_else(|| self.default_region.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            timestamps: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl ServiceConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Loads the file (or defaults), applies `.env` and process environment
    /// overrides, and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from `lookup`. Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_API_URL) {
            self.api.base_url = url;
        }
        if let Some(cookie) = non_empty(ENV_SESSION_COOKIE) {
            self.api.session_cookie = Some(cookie);
        }
        if let Some(token) = non_empty(ENV_API_TOKEN) {
            self.api.api_token = Some(token);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.proximity.threshold_km.is_finite() && self.proximity.threshold_km > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "proximity.threshold_km must be a positive number, got {}",
                self.proximity.threshold_km
            )));
        }
        if self.proximity.top_n == 0 {
            return Err(ConfigError::Invalid("proximity.top_n must be at least 1".to_string()));
        }
        if self.api.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid("api.poll_interval_secs must be at least 1".to_string()));
        }
        if self.api.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.fetch_timeout_secs must be at least 1".to_string()));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url must not be empty".to_string()));
        }
        if self.proximity.alert_ttl_secs == 0 || self.proximity.alert_ttl_secs > MAX_ALERT_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "proximity.alert_ttl_secs must be between 1 and {}, got {}",
                MAX_ALERT_TTL_SECS, self.proximity.alert_ttl_secs
            )));
        }
        if self.location.max_fix_age_secs <= 0 || self.location.max_fix_age_secs > MAX_FIX_AGE_SECS {
            return Err(ConfigError::Invalid(format!(
                "location.max_fix_age_secs must be between 1 and {}, got {}",
                MAX_FIX_AGE_SECS, self.location.max_fix_age_secs
            )));
        }
        if self.location.source == LocationSource::Fixed {
            self.location
                .coordinate()
                .map_err(|e| ConfigError::Invalid(format!("location: {}", e)))?;
        }
        if self.location.source == LocationSource::Replay && self.location.track_path.is_none() {
            return Err(ConfigError::Invalid(
                "location.track_path is required when source = \"replay\"".to_string(),
            ));
        }
        if self.regions.default_region.trim().is_empty() {
            return Err(ConfigError::Invalid("regions.default_region must not be empty".to_string()));
        }
        Ok(())
    }
}
