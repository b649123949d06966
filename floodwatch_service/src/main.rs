//! floodwatch - nearest-station ranking and proximity alerts.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};

use floodwatch_service::alert::forecast::ForecastAlert;
use floodwatch_service::alert::proximity::evaluate;
use floodwatch_service::alert::severity::marker_color;
use floodwatch_service::analysis::proximity::{rank, top_n};
use floodwatch_service::config::{LocationSource, ServiceConfig};
use floodwatch_service::dashboard::{ProximityView, RefreshOutcome, ViewSettings};
use floodwatch_service::dev_mode::DevMode;
use floodwatch_service::ingest::http::BackendClient;
use floodwatch_service::ingest::predictions::{HttpStationRepository, StationRepository};
use floodwatch_service::ingest::subscriptions::{HttpSubscriptionStore, SubscriptionStore};
use floodwatch_service::location::{
    FixedLocationProvider, LocationProvider, ReplayLocationProvider, TrackerSettings,
    TrackingHandle, start_tracking,
};
use floodwatch_service::logging::{self, Component, LogLevel};
use floodwatch_service::model::{AlertEvent, Coordinate, RankedStation};
use floodwatch_service::poller::{DashboardEvent, StationPoller};
use floodwatch_service::subscriptions::SubscriptionSet;
use floodwatch_service::verify;

#[derive(Debug, Parser)]
#[command(name = "floodwatch", version, about = "Nearest flood stations and proximity alerts")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Track location, poll stations and raise proximity alerts until Ctrl+C
    Run {
        /// Use built-in demo stations and a replayed track instead of the backend
        #[arg(long)]
        dev: bool,
    },
    /// Fetch the station endpoint once and print a verification report
    Check {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rank stations once from the given position
    Rank {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        #[arg(long)]
        dev: bool,
    },
    /// Replace the user's alert regions on the backend
    Subscribe {
        /// Region to subscribe to (repeatable)
        #[arg(long = "region", required = true)]
        regions: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = ServiceConfig::load(cli.config.as_deref())?;
    init_logging(&config);

    match cli.command {
        Command::Run { dev } => run_daemon(&config, dev),
        Command::Check { json } => run_check(&config, json),
        Command::Rank { lat, lng, dev } => run_rank(&config, lat, lng, dev),
        Command::Subscribe { regions } => run_subscribe(&config, regions),
    }
}

fn init_logging(config: &ServiceConfig) {
    let level = LogLevel::parse(&config.logging.level).unwrap_or(LogLevel::Info);
    logging::init_logger(level, config.logging.file.as_deref(), config.logging.timestamps);
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

fn run_daemon(config: &ServiceConfig, dev: bool) -> Result<(), Box<dyn Error>> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        shutdown_flag.store(true, Ordering::SeqCst);
    })?;

    let (tx, rx) = mpsc::channel::<DashboardEvent>();
    let tracker_settings = TrackerSettings {
        interval: StdDuration::from_secs(config.location.interval_secs.max(1)),
        max_fix_age: config.location.max_fix_age()?,
    };

    let (repository, subscriptions, _tracker): (Arc<dyn StationRepository>, SubscriptionSet, TrackingHandle) =
        if dev {
            let dev_mode = DevMode::new(tracker_settings.interval);
            logging::info(Component::System, None, "Dev mode: demo stations and replayed track");
            let repository: Arc<dyn StationRepository> = Arc::new(dev_mode.repository());
            (
                repository,
                dev_mode.subscriptions(),
                spawn_tracker(dev_mode.location_provider(), tracker_settings, tx.clone())?,
            )
        } else {
            let repository = HttpStationRepository::new(&config.api, config.regions.clone())?;
            logging::info(
                Component::System,
                None,
                &format!("Polling {} every {}s", repository.endpoint(), config.api.poll_interval_secs),
            );
            let tracker = match config.location.source {
                LocationSource::Fixed => {
                    let mut provider = FixedLocationProvider::new(config.location.coordinate()?);
                    if let Some(accuracy) = config.location.accuracy_m {
                        provider = provider.with_accuracy(accuracy);
                    }
                    spawn_tracker(provider, tracker_settings, tx.clone())?
                }
                LocationSource::Replay => {
                    let path = config
                        .location
                        .track_path
                        .as_deref()
                        .ok_or("location.track_path is required for replay")?;
                    spawn_tracker(ReplayLocationProvider::load(path)?, tracker_settings, tx.clone())?
                }
            };
            let repository: Arc<dyn StationRepository> = Arc::new(repository);
            (repository, load_subscriptions(config)?, tracker)
        };

    let _poller = StationPoller::new(
        repository,
        StdDuration::from_secs(config.api.poll_interval_secs),
    )
    .start(tx)?;

    let mut view = ProximityView::new(ViewSettings::try_from(&config.proximity)?, subscriptions);
    let mut shown_alert: Option<AlertEvent> = None;

    logging::info(Component::System, None, "Started; press Ctrl+C to stop");

    while !shutdown.load(Ordering::SeqCst) {
        match rx.recv_timeout(StdDuration::from_millis(250)) {
            Ok(event) => apply_event(&mut view, event),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if view.expire_alert(Utc::now()) {
            logging::debug(Component::Alerts, None, "Alert display time elapsed");
        }
        for notice in view.take_notices() {
            println!("⚠ {}", notice.message);
        }

        let current = view.active_alert().cloned();
        if let Some(alert) = &current {
            if shown_alert.as_ref() != Some(alert) {
                print_alert(alert);
            }
        }
        shown_alert = current;
    }

    logging::info(Component::System, None, "Shutting down");
    Ok(())
}

fn spawn_tracker<P: LocationProvider + 'static>(
    provider: P,
    settings: TrackerSettings,
    tx: Sender<DashboardEvent>,
) -> std::io::Result<TrackingHandle> {
    let err_tx = tx.clone();
    start_tracking(
        provider,
        settings,
        move |fix| {
            let _ = tx.send(DashboardEvent::LocationFix(fix));
        },
        move |err| {
            let _ = err_tx.send(DashboardEvent::LocationLost(err));
        },
    )
}

fn apply_event(view: &mut ProximityView, event: DashboardEvent) {
    let now = Utc::now();
    match event {
        DashboardEvent::LocationFix(fix) => {
            let outcome = view.on_fix(fix, now);
            if outcome.first_fix {
                if let Some(fix) = view.position() {
                    logging::info(Component::Location, None, &format!("First fix at {}", fix.coordinate));
                }
            }
        }
        DashboardEvent::LocationLost(err) => view.on_location_error(err, now),
        DashboardEvent::StationsFetched { seq, result } => {
            if view.on_stations(seq, result, now) == RefreshOutcome::Applied {
                print_recent_alerts(view.recent_alerts(), view.last_update());
            }
        }
    }
    print_ranking(view.top_n());
}

/// Subscriptions come from the backend when a session is configured,
/// otherwise from `[regions] subscribed`.
fn load_subscriptions(config: &ServiceConfig) -> Result<SubscriptionSet, Box<dyn Error>> {
    let fallback = SubscriptionSet::from_regions(config.regions.subscribed.iter().map(String::as_str));
    if config.api.session_cookie.is_none() && config.api.api_token.is_none() {
        return Ok(fallback);
    }

    let store = HttpSubscriptionStore::new(BackendClient::new(&config.api)?);
    match store.load() {
        Ok(set) => {
            logging::info(
                Component::Subscriptions,
                None,
                &format!("Subscribed regions: {}", set.to_vec().join(", ")),
            );
            Ok(set)
        }
        Err(e) => {
            logging::warn(
                Component::Subscriptions,
                None,
                &format!("Could not load subscriptions ({}); using configured regions", e),
            );
            Ok(fallback)
        }
    }
}

// ---------------------------------------------------------------------------
// check / rank / subscribe
// ---------------------------------------------------------------------------

fn run_check(config: &ServiceConfig, json: bool) -> Result<(), Box<dyn Error>> {
    let repository = HttpStationRepository::new(&config.api, config.regions.clone())?;
    let endpoint = repository.endpoint();
    let report = verify::run_verification(&repository, &endpoint);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        verify::print_summary(&report);
    }
    Ok(())
}

fn run_rank(config: &ServiceConfig, lat: f64, lng: f64, dev: bool) -> Result<(), Box<dyn Error>> {
    let position = Coordinate::new(lat, lng)?;

    let (parsed, subscriptions) = if dev {
        let dev_mode = DevMode::default();
        (dev_mode.repository().fetch_stations()?, dev_mode.subscriptions())
    } else {
        let repository = HttpStationRepository::new(&config.api, config.regions.clone())?;
        logging::debug(Component::Stations, None, &format!("Fetching {}", repository.endpoint()));
        (repository.fetch_stations()?, load_subscriptions(config)?)
    };

    let ranked = rank(Some(&position), &parsed.stations);
    print_ranking(top_n(&ranked, config.proximity.top_n));

    match evaluate(&ranked, &subscriptions, config.proximity.threshold_km) {
        Some(alert) => print_alert(&alert),
        None => println!("No proximity alert at this position."),
    }
    Ok(())
}

fn run_subscribe(config: &ServiceConfig, regions: Vec<String>) -> Result<(), Box<dyn Error>> {
    let set = SubscriptionSet::from_regions(regions.iter().map(String::as_str));
    let store = HttpSubscriptionStore::new(BackendClient::new(&config.api)?);
    store.save(&set)?;
    logging::info(
        Component::Subscriptions,
        None,
        &format!("Subscribed to {}", set.to_vec().join(", ")),
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_ranking(nearest: &[RankedStation]) {
    if nearest.is_empty() {
        return;
    }
    println!("Nearest stations:");
    for (i, r) in nearest.iter().enumerate() {
        println!(
            "  {}. {:<24} {:>7.2} km  {:<8} {}",
            i + 1,
            r.station.name,
            r.distance_km,
            r.risk_level().unwrap_or("Unknown"),
            marker_color(r.risk_level()),
        );
    }
}

fn print_alert(alert: &AlertEvent) {
    println!("🚨 {}", alert.title);
    println!("   {}", alert.message);
}

fn print_recent_alerts(alerts: &[ForecastAlert], last_update: Option<DateTime<Utc>>) {
    if let Some(at) = last_update {
        println!("Last updated {}", at.with_timezone(&Local).format("%H:%M:%S"));
    }
    if alerts.is_empty() {
        return;
    }
    println!("Recent alerts:");
    for alert in alerts {
        println!(
            "  {:<24} {:<10} {}",
            alert.location,
            alert.date.as_deref().unwrap_or("-"),
            alert.risk_level
        );
    }
}
