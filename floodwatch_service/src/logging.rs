/// Structured logging for the flood proximity service
///
/// Provides context-rich logging with component tags, optional station
/// identifiers, timestamps, and severity levels. Supports both console
/// output and file-based logging for daemon operations.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::{FetchError, LocationError};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl LogLevel {
    /// Parses a level name as written in the config file.
    pub fn parse(name: &str) -> Option<LogLevel> {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Location,
    Stations,
    Alerts,
    Subscriptions,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Location => write!(f, "LOC"),
            Component::Stations => write!(f, "STN"),
            Component::Alerts => write!(f, "ALERT"),
            Component::Subscriptions => write!(f, "SUB"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - user declined location access, replay finished
    Expected,
    /// Unexpected failure - indicates backend degradation or configuration issue
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, component: &Component, station_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = format_entry(level, component, station_id, message);
        let station_part = station_id.map(|s| format!(" [{}]", s)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error => eprintln!("{}", log_entry),
                LogLevel::Warning => eprintln!("   {}", log_entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, station_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, station_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

fn format_entry(level: LogLevel, component: &Component, station_id: Option<&str>, message: &str) -> String {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let station_part = station_id.map(|s| format!(" [{}]", s)).unwrap_or_default();
    format!("{} {} {}{}: {}", timestamp, level, component, station_part, message)
}

fn dispatch(level: LogLevel, component: Component, station_id: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &component, station_id, message);
        }
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

/// Log a general informational message
pub fn info(component: Component, station_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, component, station_id, message);
}

/// Log a warning message
pub fn warn(component: Component, station_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, component, station_id, message);
}

/// Log an error message
pub fn error(component: Component, station_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, component, station_id, message);
}

/// Log a debug message
pub fn debug(component: Component, station_id: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, component, station_id, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a station-list fetch failure
pub fn classify_fetch_failure(err: &FetchError) -> FailureType {
    match err {
        // 401/403 means the session expired, which the user fixes by logging in again
        FetchError::Http(401) | FetchError::Http(403) => FailureType::Expected,
        FetchError::Http(code) if *code >= 500 => FailureType::Unexpected,
        FetchError::Http(_) => FailureType::Unknown,
        // Parse errors suggest API changes
        FetchError::Parse(_) => FailureType::Unexpected,
        FetchError::Transport(_) | FetchError::Timeout => FailureType::Unknown,
    }
}

/// Classify a location provider failure
pub fn classify_location_failure(err: &LocationError) -> FailureType {
    match err {
        LocationError::PermissionDenied => FailureType::Expected,
        LocationError::Timeout => FailureType::Unknown,
        LocationError::Unavailable(_) => FailureType::Unexpected,
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a station fetch failure with automatic classification
pub fn log_fetch_failure(operation: &str, err: &FetchError) {
    let failure_type = classify_fetch_failure(err);
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Expected => debug(Component::Stations, None, &message),
        FailureType::Unexpected => error(Component::Stations, None, &message),
        FailureType::Unknown => warn(Component::Stations, None, &message),
    }
}

/// Log a location failure with classification
pub fn log_location_failure(err: &LocationError) {
    let failure_type = classify_location_failure(err);
    let message = format!("Tracking stopped [{}]: {}", failure_type, err);

    match failure_type {
        FailureType::Expected => info(Component::Location, None, &message),
        FailureType::Unexpected => error(Component::Location, None, &message),
        FailureType::Unknown => warn(Component::Location, None, &message),
    }
}

// ---------------------------------------------------------------------------
// Refresh Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one station-list refresh
pub fn log_refresh_summary(total: usize, usable: usize, excluded: usize) {
    let message = format!(
        "Refresh complete: {}/{} stations usable, {} excluded",
        usable, total, excluded
    );

    if excluded == 0 {
        info(Component::Stations, None, &message);
    } else if usable == 0 {
        error(Component::Stations, None, &message);
    } else {
        warn(Component::Stations, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("WARN"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse(" debug "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("verbose"), None);
    }

    #[test]
    fn test_fetch_failure_classification() {
        assert_eq!(classify_fetch_failure(&FetchError::Http(500)), FailureType::Unexpected);
        assert_eq!(classify_fetch_failure(&FetchError::Http(401)), FailureType::Expected);
        assert_eq!(classify_fetch_failure(&FetchError::Http(404)), FailureType::Unknown);
        assert_eq!(
            classify_fetch_failure(&FetchError::Parse("not an array".into())),
            FailureType::Unexpected
        );
        assert_eq!(classify_fetch_failure(&FetchError::Timeout), FailureType::Unknown);
    }

    #[test]
    fn test_location_failure_classification() {
        assert_eq!(
            classify_location_failure(&LocationError::PermissionDenied),
            FailureType::Expected
        );
        assert_eq!(
            classify_location_failure(&LocationError::Unavailable("gps off".into())),
            FailureType::Unexpected
        );
    }

    #[test]
    fn test_entry_format_includes_component_and_station() {
        let entry = format_entry(LogLevel::Warning, &Component::Alerts, Some("mulshi"), "entered radius");
        assert!(entry.contains("WARN ALERT [mulshi]: entered radius"), "got {}", entry);
    }

    #[test]
    fn test_file_logging_appends_entries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("floodwatch.log");
        let path_str = path.to_str().expect("utf-8 path");

        Logger::append_to_file(path_str, "first").expect("append");
        Logger::append_to_file(path_str, "second").expect("append");

        let contents = std::fs::read_to_string(&path).expect("read log");
        assert_eq!(contents, "first\nsecond\n");
    }
}
