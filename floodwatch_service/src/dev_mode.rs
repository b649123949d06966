/// Development mode utilities for running without a backend or a GPS.
///
/// Serves a fixed set of demo dams around Pune and replays a drive from
/// the city centre south to Khadakwasla, so the whole ranking and alert
/// pipeline can be exercised offline.

use std::time::Duration;

use crate::ingest::predictions::StaticStationRepository;
use crate::location::{ReplayLocationProvider, TrackPoint};
use crate::model::{Coordinate, ForecastEntry, StationRecord};
use crate::subscriptions::SubscriptionSet;

pub const DEMO_REGION: &str = "pune";

/// Pune city centre, where the demo track starts.
pub const DEMO_START: (f64, f64) = (18.5204, 73.8567);

/// Where the demo track ends, about 0.2 km from Khadakwasla Dam.
pub const DEMO_END: (f64, f64) = (18.3552, 73.8350);

const DEMO_TRACK_STEPS: usize = 8;

struct DemoDam {
    id: &'static str,
    name: &'static str,
    latitude: f64,
    longitude: f64,
    /// (rainfall mm, discharge, release probability, risk) per forecast day.
    forecast: &'static [(f64, f64, f64, &'static str)],
}

static DEMO_DAMS: &[DemoDam] = &[
    DemoDam {
        id: "mulshi",
        name: "Mulshi Dam",
        latitude: 18.7298,
        longitude: 73.6462,
        forecast: &[
            (18.2, 168.7, 0.82, "Warning"),
            (24.1, 195.2, 0.78, "Warning"),
            (15.3, 172.5, 0.65, "Watch"),
        ],
    },
    DemoDam {
        id: "khadakwasla",
        name: "Khadakwasla Dam",
        latitude: 18.3534,
        longitude: 73.8341,
        forecast: &[
            (14.1, 142.3, 0.64, "Watch"),
            (21.5, 175.8, 0.65, "Warning"),
            (18.9, 165.2, 0.58, "Watch"),
        ],
    },
    DemoDam {
        id: "panshet",
        name: "Panshet Dam",
        latitude: 18.2245,
        longitude: 74.0267,
        forecast: &[
            (10.5, 115.3, 0.22, "Safe"),
            (19.2, 152.6, 0.41, "Safe"),
        ],
    },
];

/// Configuration for a dev-mode session.
pub struct DevMode {
    /// Pause between replayed fixes.
    pub step_interval: Duration,
}

impl DevMode {
    pub fn new(step_interval: Duration) -> Self {
        Self { step_interval }
    }

    pub fn repository(&self) -> StaticStationRepository {
        StaticStationRepository::new(demo_stations())
    }

    pub fn location_provider(&self) -> ReplayLocationProvider {
        ReplayLocationProvider::new(demo_track())
    }

    /// Demo sessions subscribe to the demo region so alerts can fire.
    pub fn subscriptions(&self) -> SubscriptionSet {
        SubscriptionSet::from_regions([DEMO_REGION])
    }
}

impl Default for DevMode {
    fn default() -> Self {
        Self::new(Duration::from_secs(2))
    }
}

pub fn demo_stations() -> Vec<StationRecord> {
    DEMO_DAMS
        .iter()
        .filter_map(|dam| {
            let coordinate = Coordinate::new(dam.latitude, dam.longitude).ok()?;
            let forecast: Vec<ForecastEntry> = dam
                .forecast
                .iter()
                .enumerate()
                .map(|(day, &(rainfall, discharge, probability, risk))| ForecastEntry {
                    date: Some(format!("day {}", day + 1)),
                    rainfall_mm: Some(rainfall),
                    discharge: Some(discharge),
                    risk_level: Some(risk.to_string()),
                    release_probability: Some(probability),
                })
                .collect();
            Some(StationRecord {
                id: dam.id.to_string(),
                name: dam.name.to_string(),
                region: DEMO_REGION.to_string(),
                coordinate,
                risk_level: forecast.first().and_then(|f| f.risk_level.clone()),
                forecast,
            })
        })
        .collect()
}

/// Evenly spaced points from `DEMO_START` to `DEMO_END`, inclusive.
pub fn demo_track() -> Vec<TrackPoint> {
    let (lat0, lng0) = DEMO_START;
    let (lat1, lng1) = DEMO_END;
    let last = (DEMO_TRACK_STEPS - 1) as f64;

    (0..DEMO_TRACK_STEPS)
        .filter_map(|i| {
            let t = i as f64 / last;
            Coordinate::new(lat0 + (lat1 - lat0) * t, lng0 + (lng1 - lng0) * t)
                .ok()
                .map(|coordinate| TrackPoint {
                    coordinate,
                    accuracy_m: Some(15.0),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::proximity::{DEFAULT_PROXIMITY_THRESHOLD_KM, EdgeTrigger};
    use crate::analysis::proximity::rank;

    #[test]
    fn test_dev_mode_creation() {
        let dev = DevMode::default();
        assert_eq!(dev.step_interval, Duration::from_secs(2));
        assert!(dev.subscriptions().contains("pune"));
    }

    #[test]
    fn test_demo_stations_carry_first_day_risk() {
        let stations = demo_stations();
        assert_eq!(stations.len(), 3);
        let risks: Vec<Option<&str>> = stations.iter().map(|s| s.risk_level.as_deref()).collect();
        assert_eq!(risks, vec![Some("Warning"), Some("Watch"), Some("Safe")]);
        assert!(stations.iter().all(|s| s.region == DEMO_REGION));
    }

    #[test]
    fn test_demo_track_endpoints() {
        let track = demo_track();
        assert_eq!(track.len(), DEMO_TRACK_STEPS);
        assert_eq!(track[0].coordinate.latitude(), DEMO_START.0);
        let end = track[track.len() - 1].coordinate;
        assert!((end.latitude() - DEMO_END.0).abs() < 1e-9);
        assert!((end.longitude() - DEMO_END.1).abs() < 1e-9);
    }

    #[test]
    fn test_demo_track_alerts_only_at_the_end() {
        let stations = demo_stations();
        let subs = DevMode::default().subscriptions();
        let mut trigger = EdgeTrigger::new();

        let mut fired = Vec::new();
        for (i, point) in demo_track().iter().enumerate() {
            let ranked = rank(Some(&point.coordinate), &stations);
            for alert in trigger.observe(&ranked, &subs, DEFAULT_PROXIMITY_THRESHOLD_KM) {
                fired.push((i, alert.station_id));
            }
        }
        assert_eq!(fired, vec![(DEMO_TRACK_STEPS - 1, "khadakwasla".to_string())]);
    }
}
