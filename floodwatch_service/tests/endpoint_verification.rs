//! Endpoint Verification Integration Tests
//!
//! The offline tests load configuration and track files from disk the way
//! the daemon does. The live test checks a running backend and is ignored
//! by default:
//!
//!   FLOODWATCH_API_URL=http://localhost:5000 cargo test --test endpoint_verification -- --ignored

use std::io::Write;

use floodwatch_service::config::{LocationSource, ServiceConfig};
use floodwatch_service::ingest::predictions::HttpStationRepository;
use floodwatch_service::location::{LocationProvider, ReplayLocationProvider};
use floodwatch_service::model::LocationError;
use floodwatch_service::verify::{self, VerificationStatus};

#[test]
fn test_config_file_round_trip() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[api]
base_url = "http://flood.example:5000"
poll_interval_secs = 60

[proximity]
threshold_km = 1.5

[location]
source = "replay"
track_path = "/tmp/track.toml"

[regions]
subscribed = ["pune", "satara"]

[regions.stations]
"Koyna Dam" = "satara"
"#
    )
    .unwrap();

    let config = ServiceConfig::from_file(file.path()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.api.base_url, "http://flood.example:5000");
    assert_eq!(config.api.poll_interval_secs, 60);
    assert_eq!(config.api.fetch_timeout_secs, 15);
    assert_eq!(config.proximity.threshold_km, 1.5);
    assert_eq!(config.proximity.top_n, 6);
    assert_eq!(config.location.source, LocationSource::Replay);
    assert_eq!(config.regions.region_for("koyna", "Koyna Dam"), "satara");
    assert_eq!(config.regions.region_for("mulshi", "Mulshi Dam"), "pune");
}

#[test]
fn test_shipped_sample_config_matches_defaults() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("floodwatch.toml");
    let config = ServiceConfig::from_file(&path).unwrap();

    let mut expected = ServiceConfig::default();
    expected.regions.subscribed = vec!["pune".to_string()];
    assert_eq!(config, expected);
}

#[test]
fn test_replay_track_file_ends_with_permission_loss() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
end = "permission_denied"

[[fix]]
lat = 18.5204
lng = 73.8567

[[fix]]
lat = 18.4
lng = 73.84
accuracy_m = 20.0
"#
    )
    .unwrap();

    let mut provider = ReplayLocationProvider::load(file.path()).unwrap();
    assert_eq!(provider.remaining(), 2);

    let first = provider.next_fix().unwrap().unwrap();
    assert_eq!(first.coordinate.latitude(), 18.5204);
    let second = provider.next_fix().unwrap().unwrap();
    assert_eq!(second.accuracy_m, Some(20.0));
    assert_eq!(provider.next_fix(), Err(LocationError::PermissionDenied));
}

#[test]
fn test_unreachable_backend_reports_failure() {
    let mut config = ServiceConfig::default();
    // Reserved port on loopback; nothing listens there.
    config.api.base_url = "http://127.0.0.1:9".to_string();
    config.api.fetch_timeout_secs = 2;

    let repository = HttpStationRepository::new(&config.api, config.regions.clone()).unwrap();
    let report = verify::run_verification(&repository, &repository.endpoint());

    assert_eq!(report.status, VerificationStatus::Failed);
    assert!(report.error_message.is_some());
    assert_eq!(report.total_records, 0);
}

#[test]
#[ignore]
fn test_live_prediction_endpoint() {
    let config = ServiceConfig::load(None).expect("configuration loads");
    let repository = HttpStationRepository::new(&config.api, config.regions.clone()).unwrap();
    let report = verify::run_verification(&repository, &repository.endpoint());
    verify::print_summary(&report);

    assert_ne!(
        report.status,
        VerificationStatus::Failed,
        "endpoint {} failed: {:?}",
        report.endpoint,
        report.error_message
    );
    assert!(report.usable_records > 0, "no usable stations returned");
}
