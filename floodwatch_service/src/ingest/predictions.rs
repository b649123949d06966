/// Prediction endpoint client.
///
/// `GET /api/predict-flood` returns the monitored stations with their
/// coordinates and a per-day flood forecast. The payload is loosely shaped:
/// the array may sit at the top level or under `data`, coordinates come in
/// several layouts, and numbers sometimes arrive as strings. Parsing is
/// lenient per record: one malformed station is excluded and reported,
/// the rest of the batch still loads. Only a payload with no station array
/// at all fails the refresh.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::{ApiConfig, RegionConfig};
use crate::ingest::http::BackendClient;
use crate::model::{Coordinate, FetchError, ForecastEntry, StationRecord};

pub const PREDICTIONS_PATH: &str = "/api/predict-flood";

// ---------------------------------------------------------------------------
// Parse results
// ---------------------------------------------------------------------------

/// Why a single station record was excluded from a refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RecordRejection {
    NotAnObject,
    MissingCoordinate,
    InvalidCoordinate(String),
}

impl std::fmt::Display for RecordRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordRejection::NotAnObject => write!(f, "record is not a JSON object"),
            RecordRejection::MissingCoordinate => write!(f, "no usable coordinates"),
            RecordRejection::InvalidCoordinate(msg) => write!(f, "invalid coordinates: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRecord {
    /// Position in the payload array, zero-based.
    pub index: usize,
    pub name: String,
    pub reason: RecordRejection,
}

/// Outcome of one refresh: usable stations plus what was dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedStations {
    pub stations: Vec<StationRecord>,
    pub rejected: Vec<RejectedRecord>,
}

impl ParsedStations {
    pub fn total(&self) -> usize {
        self.stations.len() + self.rejected.len()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parses a prediction endpoint response body.
pub fn parse_predictions(body: &str, regions: &RegionConfig) -> Result<ParsedStations, FetchError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;
    parse_prediction_value(&value, regions)
}

pub fn parse_prediction_value(value: &Value, regions: &RegionConfig) -> Result<ParsedStations, FetchError> {
    let items = station_array(value).ok_or_else(|| {
        FetchError::Parse("response contains no station array".to_string())
    })?;

    let mut parsed = ParsedStations::default();
    for (index, item) in items.iter().enumerate() {
        match parse_station(index, item, regions) {
            Ok(station) => parsed.stations.push(station),
            Err(rejected) => parsed.rejected.push(rejected),
        }
    }
    Ok(parsed)
}

/// The station list is either the top-level array or the `data` field.
fn station_array(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(obj) => obj.get("data").and_then(Value::as_array),
        _ => None,
    }
}

fn parse_station(index: usize, item: &Value, regions: &RegionConfig) -> Result<StationRecord, RejectedRecord> {
    let fallback_name = format!("Station {}", index + 1);

    let Some(obj) = item.as_object() else {
        return Err(RejectedRecord {
            index,
            name: fallback_name,
            reason: RecordRejection::NotAnObject,
        });
    };

    let name = text(obj.get("location"))
        .or_else(|| text(obj.get("name")))
        .or_else(|| text(obj.get("id")))
        .unwrap_or(fallback_name);
    let id = text(obj.get("id")).unwrap_or_else(|| name.clone());

    let coordinate = extract_coordinate(obj).map_err(|reason| RejectedRecord {
        index,
        name: name.clone(),
        reason,
    })?;

    let forecast: Vec<ForecastEntry> = obj
        .get("floodForecast")
        .and_then(Value::as_array)
        .map(|days| days.iter().filter_map(parse_forecast_entry).collect())
        .unwrap_or_default();

    let risk_level = forecast
        .first()
        .and_then(|today| today.risk_level.clone())
        .or_else(|| text(obj.get("riskLevel")));

    let region = text(obj.get("region")).unwrap_or_else(|| regions.region_for(&id, &name));

    Ok(StationRecord {
        id,
        name,
        region,
        coordinate,
        risk_level,
        forecast,
    })
}

fn parse_forecast_entry(value: &Value) -> Option<ForecastEntry> {
    let obj = value.as_object()?;
    Some(ForecastEntry {
        date: text(obj.get("date")),
        rainfall_mm: number(obj.get("rainfall")),
        discharge: number(obj.get("estimatedDischarge")),
        risk_level: text(obj.get("riskLevel")),
        release_probability: number(obj.get("releaseProbability")),
    })
}

/// Tries, in order: `coordinates: {lat, lng}`, top-level `lat`/`lng`,
/// GeoJSON `geometry.coordinates: [lng, lat]`, `coordinates: [lat, lng]`.
fn extract_coordinate(obj: &Map<String, Value>) -> Result<Coordinate, RecordRejection> {
    let coords = obj.get("coordinates");

    let from_object = coords
        .and_then(Value::as_object)
        .and_then(|c| pair(c.get("lat"), c.get("lng")));
    let from_top_level = || pair(obj.get("lat"), obj.get("lng"));
    let from_geojson = || {
        obj.get("geometry")
            .and_then(|g| g.get("coordinates"))
            .and_then(Value::as_array)
            .and_then(|c| pair(c.get(1), c.first()))
    };
    let from_array = || {
        coords
            .and_then(Value::as_array)
            .and_then(|c| pair(c.first(), c.get(1)))
    };

    let (lat, lng) = from_object
        .or_else(from_top_level)
        .or_else(from_geojson)
        .or_else(from_array)
        .ok_or(RecordRejection::MissingCoordinate)?;

    Coordinate::new(lat, lng).map_err(|e| RecordRejection::InvalidCoordinate(e.to_string()))
}

fn pair(lat: Option<&Value>, lng: Option<&Value>) -> Option<(f64, f64)> {
    Some((number(lat)?, number(lng)?))
}

/// A finite number, given either as a JSON number or a numeric string.
fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// A non-blank string.
fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

/// Source of the station list.
pub trait StationRepository: Send + Sync {
    fn fetch_stations(&self) -> Result<ParsedStations, FetchError>;
}

/// Reads stations from the live prediction endpoint.
pub struct HttpStationRepository {
    client: BackendClient,
    regions: RegionConfig,
}

impl HttpStationRepository {
    pub fn new(api: &ApiConfig, regions: RegionConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: BackendClient::new(api)?,
            regions,
        })
    }

    pub fn with_client(client: BackendClient, regions: RegionConfig) -> Self {
        Self { client, regions }
    }

    pub fn endpoint(&self) -> String {
        self.client.url(PREDICTIONS_PATH)
    }
}

impl StationRepository for HttpStationRepository {
    fn fetch_stations(&self) -> Result<ParsedStations, FetchError> {
        let body = self.client.get_text(PREDICTIONS_PATH)?;
        parse_predictions(&body, &self.regions)
    }
}

/// Serves a fixed station list. Used by dev mode and tests.
pub struct StaticStationRepository {
    stations: Vec<StationRecord>,
}

impl StaticStationRepository {
    pub fn new(stations: Vec<StationRecord>) -> Self {
        Self { stations }
    }
}

impl StationRepository for StaticStationRepository {
    fn fetch_stations(&self) -> Result<ParsedStations, FetchError> {
        Ok(ParsedStations {
            stations: self.stations.clone(),
            rejected: Vec::new(),
        })
    }
}
