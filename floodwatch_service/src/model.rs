//! Core data types for the flood proximity service.
//!
//! This module defines the shared domain model imported by all other modules:
//! coordinates, station records as delivered by the prediction backend,
//! location fixes, the distance-annotated ranking, alert events, and the
//! error types raised at the I/O boundaries. It holds no I/O.

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A WGS84 point in signed decimal degrees.
///
/// Construction through [`Coordinate::new`] guarantees
/// latitude ∈ [-90, 90] and longitude ∈ [-180, 180], both finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinateError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateError {
    NotFinite,
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
}

impl std::fmt::Display for CoordinateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinateError::NotFinite => write!(f, "coordinate is not a finite number"),
            CoordinateError::LatitudeOutOfRange(lat) => {
                write!(f, "latitude {} outside [-90, 90]", lat)
            }
            CoordinateError::LongitudeOutOfRange(lng) => {
                write!(f, "longitude {} outside [-180, 180]", lng)
            }
        }
    }
}

impl std::error::Error for CoordinateError {}

// ---------------------------------------------------------------------------
// Station types
// ---------------------------------------------------------------------------

/// One day of a station's flood forecast.
///
/// Passed through to the presentation layer untouched; every field is
/// optional because the backend omits them freely.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ForecastEntry {
    pub date: Option<String>,
    pub rainfall_mm: Option<f64>,
    pub discharge: Option<f64>,
    pub risk_level: Option<String>,
    pub release_probability: Option<f64>,
}

/// A monitored location (typically a dam) as delivered by one refresh of
/// the prediction endpoint.
///
/// `id` is a display identifier; uniqueness is not enforced upstream.
/// `risk_level` is `None` when the backend sent no forecast, which makes
/// the station non-alerting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationRecord {
    pub id: String,
    pub name: String,
    pub region: String,
    pub coordinate: Coordinate,
    pub risk_level: Option<String>,
    pub forecast: Vec<ForecastEntry>,
}

/// A station annotated with its great-circle distance from the user.
/// Always produced fresh by `analysis::proximity::rank`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedStation {
    pub station: StationRecord,
    pub distance_km: f64,
}

impl RankedStation {
    pub fn risk_level(&self) -> Option<&str> {
        self.station.risk_level.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Location types
// ---------------------------------------------------------------------------

/// A single reported location sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    pub coordinate: Coordinate,
    pub accuracy_m: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Alert types
// ---------------------------------------------------------------------------

/// A transient proximity notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub title: String,
    pub message: String,
    pub station_id: String,
    pub region: String,
    pub distance_km: f64,
    pub risk_level: String,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors reported by a location provider. All of them are terminal for the
/// tracker and leave the view in a "position unknown" state.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationError {
    PermissionDenied,
    Unavailable(String),
    Timeout,
}

impl std::fmt::Display for LocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationError::PermissionDenied => write!(f, "Location permission denied"),
            LocationError::Unavailable(msg) => write!(f, "Location unavailable: {}", msg),
            LocationError::Timeout => write!(f, "Location request timed out"),
        }
    }
}

impl std::error::Error for LocationError {}

/// Errors that can arise when fetching the station list.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// Non-2xx HTTP response from the backend.
    Http(u16),
    /// The request never produced a response.
    Transport(String),
    /// The request exceeded the configured fetch timeout.
    Timeout,
    /// The response body was not a usable station payload.
    Parse(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Http(code) => write!(f, "HTTP error: {}", code),
            FetchError::Transport(msg) => write!(f, "Request failed: {}", msg),
            FetchError::Timeout => write!(f, "Request timeout"),
            FetchError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_accepts_boundaries() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(Coordinate::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_coordinate_rejects_out_of_range() {
        assert_eq!(
            Coordinate::new(90.5, 0.0),
            Err(CoordinateError::LatitudeOutOfRange(90.5))
        );
        assert_eq!(
            Coordinate::new(0.0, -181.0),
            Err(CoordinateError::LongitudeOutOfRange(-181.0))
        );
    }

    #[test]
    fn test_coordinate_rejects_nan_and_infinity() {
        assert_eq!(Coordinate::new(f64::NAN, 0.0), Err(CoordinateError::NotFinite));
        assert_eq!(
            Coordinate::new(0.0, f64::INFINITY),
            Err(CoordinateError::NotFinite)
        );
    }

    #[test]
    fn test_fetch_error_display_is_classifiable() {
        // The logging failure classifier keys off these prefixes.
        assert!(FetchError::Http(503).to_string().starts_with("HTTP error"));
        assert!(FetchError::Parse("x".into()).to_string().starts_with("Parse error"));
        assert_eq!(FetchError::Timeout.to_string(), "Request timeout");
    }
}
