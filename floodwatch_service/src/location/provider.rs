//! Location providers.
//!
//! The tracker never talks to a platform location API directly; it pulls
//! fixes from a `LocationProvider`. A daemon has no GPS of its own, so the
//! shipped providers either report one configured position or replay a
//! recorded track (dev mode).

use std::collections::VecDeque;
use std::path::Path;

use chrono::Utc;
use serde::Deserialize;

use crate::config::ConfigError;
use crate::model::{Coordinate, Fix, LocationError};

/// Source of location fixes.
///
/// `next_fix` must return promptly; the tracker handles pacing between
/// fixes. `Ok(None)` means the provider has nothing more to report and the
/// tracker should end quietly. `Err` is terminal.
pub trait LocationProvider: Send {
    fn next_fix(&mut self) -> Result<Option<Fix>, LocationError>;
}

// ---------------------------------------------------------------------------
// Fixed position
// ---------------------------------------------------------------------------

/// Reports the same configured position on every call, freshly stamped.
pub struct FixedLocationProvider {
    coordinate: Coordinate,
    accuracy_m: Option<f64>,
}

impl FixedLocationProvider {
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            accuracy_m: None,
        }
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }
}

impl LocationProvider for FixedLocationProvider {
    fn next_fix(&mut self) -> Result<Option<Fix>, LocationError> {
        Ok(Some(Fix {
            coordinate: self.coordinate,
            accuracy_m: self.accuracy_m,
            timestamp: Utc::now(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Replayed track
// ---------------------------------------------------------------------------

/// One recorded position of a replay track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub coordinate: Coordinate,
    pub accuracy_m: Option<f64>,
}

/// Replays a recorded track one point per call, stamping each fix with the
/// replay time. After the last point it either finishes (`Ok(None)`) or
/// reports the configured terminal error, which is how a permission
/// revocation is simulated.
pub struct ReplayLocationProvider {
    points: VecDeque<TrackPoint>,
    terminal_error: Option<LocationError>,
}

#[derive(Debug, Deserialize)]
struct TrackFile {
    /// "permission_denied", "timeout", or any other text for "unavailable".
    #[serde(default)]
    end: Option<String>,
    #[serde(default, rename = "fix")]
    fixes: Vec<RawTrackPoint>,
}

#[derive(Debug, Deserialize)]
struct RawTrackPoint {
    lat: f64,
    lng: f64,
    #[serde(default)]
    accuracy_m: Option<f64>,
}

impl ReplayLocationProvider {
    pub fn new(points: Vec<TrackPoint>) -> Self {
        Self {
            points: points.into(),
            terminal_error: None,
        }
    }

    pub fn ending_with(mut self, error: LocationError) -> Self {
        self.terminal_error = Some(error);
        self
    }

    /// Parses a TOML track:
    ///
    /// ```toml
    /// end = "permission_denied"   # optional
    ///
    /// [[fix]]
    /// lat = 18.5204
    /// lng = 73.8567
    /// accuracy_m = 15.0
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: TrackFile =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let mut points = Vec::with_capacity(file.fixes.len());
        for (i, raw) in file.fixes.into_iter().enumerate() {
            let coordinate = Coordinate::new(raw.lat, raw.lng)
                .map_err(|e| ConfigError::Invalid(format!("track fix #{}: {}", i + 1, e)))?;
            points.push(TrackPoint {
                coordinate,
                accuracy_m: raw.accuracy_m,
            });
        }

        let provider = Self::new(points);
        Ok(match file.end.as_deref().map(str::trim) {
            None | Some("") | Some("finish") => provider,
            Some("permission_denied") => provider.ending_with(LocationError::PermissionDenied),
            Some("timeout") => provider.ending_with(LocationError::Timeout),
            Some(other) => provider.ending_with(LocationError::Unavailable(other.to_string())),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    pub fn remaining(&self) -> usize {
        self.points.len()
    }
}

impl LocationProvider for ReplayLocationProvider {
    fn next_fix(&mut self) -> Result<Option<Fix>, LocationError> {
        match self.points.pop_front() {
            Some(point) => Ok(Some(Fix {
                coordinate: point.coordinate,
                accuracy_m: point.accuracy_m,
                timestamp: Utc::now(),
            })),
            None => match self.terminal_error.take() {
                Some(err) => Err(err),
                None => Ok(None),
            },
        }
    }
}
