//! Station Endpoint Verification Module
//!
//! Fetches the prediction endpoint once and reports how much of the payload
//! is usable: how many records arrived, how many made it into the station
//! list, and why the rest were excluded. Run this against a new backend
//! before pointing the daemon at it.

use chrono::Utc;
use serde::Serialize;

use crate::alert::forecast::{ForecastAlert, forecast_alerts};
use crate::ingest::predictions::{RejectedRecord, StationRepository};

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub endpoint: String,
    pub status: VerificationStatus,
    pub total_records: usize,
    pub usable_records: usize,
    pub excluded: Vec<RejectedRecord>,
    /// Stations with no forecast, which will never alert.
    pub unknown_risk: Vec<String>,
    /// Newest-first forecast alerts feed built from this fetch.
    pub recent_alerts: Vec<ForecastAlert>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum VerificationStatus {
    Success,
    PartialSuccess,
    Failed,
}

// ============================================================================
// Verification Runner
// ============================================================================

/// Fetches once from `repository` and classifies the result.
///
/// `Success` when every record is usable, `PartialSuccess` when some were
/// excluded or the payload was empty, `Failed` when the fetch itself failed.
pub fn run_verification(repository: &dyn StationRepository, endpoint: &str) -> VerificationReport {
    let mut report = VerificationReport {
        timestamp: Utc::now().to_rfc3339(),
        endpoint: endpoint.to_string(),
        status: VerificationStatus::Failed,
        total_records: 0,
        usable_records: 0,
        excluded: Vec::new(),
        unknown_risk: Vec::new(),
        recent_alerts: Vec::new(),
        error_message: None,
    };

    match repository.fetch_stations() {
        Ok(parsed) => {
            report.total_records = parsed.total();
            report.usable_records = parsed.stations.len();
            report.unknown_risk = parsed
                .stations
                .iter()
                .filter(|s| s.risk_level.is_none())
                .map(|s| s.id.clone())
                .collect();
            report.recent_alerts = forecast_alerts(&parsed.stations);
            report.excluded = parsed.rejected;

            report.status = if report.excluded.is_empty() && report.usable_records > 0 {
                VerificationStatus::Success
            } else {
                VerificationStatus::PartialSuccess
            };
        }
        Err(e) => {
            report.error_message = Some(e.to_string());
        }
    }

    report
}

pub fn print_summary(report: &VerificationReport) {
    println!("\n═══════════════════════════════════════════════════════════");
    println!("📊 VERIFICATION SUMMARY");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!("Endpoint:   {}", report.endpoint);
    println!("Status:     {:?}", report.status);

    if let Some(err) = &report.error_message {
        println!("✗ FAILED: {}", err);
    } else {
        println!(
            "Records:    {}/{} usable  ({} excluded)",
            report.usable_records,
            report.total_records,
            report.excluded.len()
        );
        for rejected in &report.excluded {
            println!("  ⚠ #{} {}: {}", rejected.index, rejected.name, rejected.reason);
        }
        if !report.unknown_risk.is_empty() {
            println!("No forecast (never alerts): {}", report.unknown_risk.join(", "));
        }
        if !report.recent_alerts.is_empty() {
            println!("Recent alerts:");
            for alert in &report.recent_alerts {
                println!(
                    "  {} {}: {}",
                    alert.location,
                    alert.date.as_deref().unwrap_or("-"),
                    alert.risk_level
                );
            }
        }
    }
    println!("═══════════════════════════════════════════════════════════");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::predictions::{ParsedStations, RecordRejection, StaticStationRepository};
    use crate::model::{Coordinate, FetchError, ForecastEntry, StationRecord};

    struct Failing;

    impl StationRepository for Failing {
        fn fetch_stations(&self) -> Result<ParsedStations, FetchError> {
            Err(FetchError::Http(503))
        }
    }

    struct WithRejects;

    impl StationRepository for WithRejects {
        fn fetch_stations(&self) -> Result<ParsedStations, FetchError> {
            Ok(ParsedStations {
                stations: vec![station("a", None)],
                rejected: vec![RejectedRecord {
                    index: 1,
                    name: "Station 2".to_string(),
                    reason: RecordRejection::MissingCoordinate,
                }],
            })
        }
    }

    fn station(id: &str, risk: Option<&str>) -> StationRecord {
        StationRecord {
            id: id.to_string(),
            name: id.to_string(),
            region: "pune".to_string(),
            coordinate: Coordinate::new(18.5, 73.8).unwrap(),
            risk_level: risk.map(str::to_string),
            forecast: Vec::new(),
        }
    }

    #[test]
    fn test_clean_payload_is_success() {
        let repo = StaticStationRepository::new(vec![station("a", Some("Safe"))]);
        let report = run_verification(&repo, "static");
        assert_eq!(report.status, VerificationStatus::Success);
        assert_eq!(report.usable_records, 1);
        assert!(report.unknown_risk.is_empty());
    }

    #[test]
    fn test_excluded_records_make_partial_success() {
        let report = run_verification(&WithRejects, "static");
        assert_eq!(report.status, VerificationStatus::PartialSuccess);
        assert_eq!(report.total_records, 2);
        assert_eq!(report.excluded.len(), 1);
        assert_eq!(report.unknown_risk, vec!["a".to_string()]);
    }

    #[test]
    fn test_fetch_failure_is_failed() {
        let report = run_verification(&Failing, "http://localhost:5000/api/predict-flood");
        assert_eq!(report.status, VerificationStatus::Failed);
        assert_eq!(report.error_message.as_deref(), Some("HTTP error: 503"));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = run_verification(&WithRejects, "static");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "PartialSuccess");
        assert_eq!(json["excluded"][0]["index"], 1);
    }

    #[test]
    fn test_report_carries_recent_alerts() {
        let mut mulshi = station("Mulshi Dam", Some("Warning"));
        mulshi.forecast = ["Watch", "Warning", "Red Alert"]
            .iter()
            .enumerate()
            .map(|(i, risk)| ForecastEntry {
                date: Some(format!("2025-11-1{}", i + 1)),
                risk_level: Some(risk.to_string()),
                ..ForecastEntry::default()
            })
            .collect();
        let repo = StaticStationRepository::new(vec![mulshi]);

        let report = run_verification(&repo, "static");
        let ids: Vec<&str> = report.recent_alerts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["Mulshi Dam-2025-11-13", "Mulshi Dam-2025-11-12"]);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["recent_alerts"][0]["risk_level"], "Red Alert");
    }
}
