//! Proximity view state.
//!
//! `ProximityView` is the single owner of everything the nearest-stations
//! panel shows: the user's position, the last good station list, the
//! subscriptions, the derived ranking, and the one alert on screen. Inputs
//! arrive in any order (a fix may land before the first station list or
//! after it); each one triggers a full re-rank and an edge-triggered alert
//! pass. All methods are synchronous and cheap, so the caller applies
//! events one at a time on a single thread.

use chrono::{DateTime, Duration, Utc};

use crate::alert::forecast::{ForecastAlert, forecast_alerts};
use crate::alert::proximity::{ActiveAlert, DEFAULT_PROXIMITY_THRESHOLD_KM, EdgeTrigger};
use crate::analysis::proximity::{DEFAULT_TOP_N, rank, top_n};
use crate::config::{ConfigError, ProximityConfig};
use crate::ingest::predictions::ParsedStations;
use crate::logging::{self, Component};
use crate::model::{AlertEvent, FetchError, Fix, LocationError, RankedStation, StationRecord};
use crate::subscriptions::SubscriptionSet;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewSettings {
    pub threshold_km: f64,
    pub top_n: usize,
    pub alert_ttl: Duration,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            threshold_km: DEFAULT_PROXIMITY_THRESHOLD_KM,
            top_n: DEFAULT_TOP_N,
            alert_ttl: Duration::seconds(8),
        }
    }
}

impl TryFrom<&ProximityConfig> for ViewSettings {
    type Error = ConfigError;

    fn try_from(config: &ProximityConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            threshold_km: config.threshold_km,
            top_n: config.top_n,
            alert_ttl: config.alert_ttl()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationState {
    /// No fix yet and no error.
    Acquiring,
    Tracking,
    /// Tracking ended with an error; position is unknown.
    Unavailable(LocationError),
}

/// What the caller should do after a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixOutcome {
    /// `true` exactly once per view: centre the map on this fix.
    pub first_fix: bool,
}

/// A dismissible failure message for the user.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
}

/// How a station refresh response was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// An earlier request answered after a later one had already been applied.
    DiscardedStale,
    /// The fetch failed; the previous list stays in place.
    KeptPrevious,
}

pub struct ProximityView {
    settings: ViewSettings,
    position: Option<Fix>,
    location_state: LocationState,
    first_fix_seen: bool,
    stations: Vec<StationRecord>,
    has_station_data: bool,
    applied_seq: Option<u64>,
    subscriptions: SubscriptionSet,
    ranked: Vec<RankedStation>,
    trigger: EdgeTrigger,
    active_alert: Option<ActiveAlert>,
    recent_alerts: Vec<ForecastAlert>,
    last_update: Option<DateTime<Utc>>,
    notices: Vec<Notice>,
}

impl ProximityView {
    pub fn new(settings: ViewSettings, subscriptions: SubscriptionSet) -> Self {
        Self {
            settings,
            position: None,
            location_state: LocationState::Acquiring,
            first_fix_seen: false,
            stations: Vec::new(),
            has_station_data: false,
            applied_seq: None,
            subscriptions,
            ranked: Vec::new(),
            trigger: EdgeTrigger::new(),
            active_alert: None,
            recent_alerts: Vec::new(),
            last_update: None,
            notices: Vec::new(),
        }
    }

    // --- Inputs -------------------------------------------------------------

    pub fn on_fix(&mut self, fix: Fix, now: DateTime<Utc>) -> FixOutcome {
        let first_fix = !self.first_fix_seen;
        self.first_fix_seen = true;
        self.location_state = LocationState::Tracking;
        self.position = Some(fix);
        self.recompute(now);
        FixOutcome { first_fix }
    }

    /// Tracking ended: forget the position and stop ranking.
    pub fn on_location_error(&mut self, err: LocationError, now: DateTime<Utc>) {
        logging::log_location_failure(&err);
        self.notices.push(Notice {
            message: format!("Location unknown: {}", err),
        });
        self.location_state = LocationState::Unavailable(err);
        self.position = None;
        self.recompute(now);
    }

    /// Applies the response to station request number `seq`.
    ///
    /// Responses to requests issued before the currently applied one are
    /// discarded. A failed fetch leaves the previous list in place.
    pub fn on_stations(
        &mut self,
        seq: u64,
        result: Result<ParsedStations, FetchError>,
        now: DateTime<Utc>,
    ) -> RefreshOutcome {
        if self.applied_seq.is_some_and(|applied| seq < applied) {
            logging::debug(
                Component::Stations,
                None,
                &format!("Discarded out-of-order response #{}", seq),
            );
            return RefreshOutcome::DiscardedStale;
        }

        match result {
            Ok(parsed) => {
                for rejected in &parsed.rejected {
                    logging::warn(
                        Component::Stations,
                        Some(&rejected.name),
                        &format!("Excluded record #{}: {}", rejected.index, rejected.reason),
                    );
                }
                logging::log_refresh_summary(parsed.total(), parsed.stations.len(), parsed.rejected.len());

                self.applied_seq = Some(seq);
                self.recent_alerts = forecast_alerts(&parsed.stations);
                self.last_update = Some(now);
                self.stations = parsed.stations;
                self.has_station_data = true;
                self.recompute(now);
                RefreshOutcome::Applied
            }
            Err(err) => {
                logging::log_fetch_failure("Station refresh", &err);
                let message = if self.has_station_data {
                    format!("Failed to refresh stations ({}); showing last known data", err)
                } else {
                    format!("Failed to fetch stations ({})", err)
                };
                self.notices.push(Notice { message });
                RefreshOutcome::KeptPrevious
            }
        }
    }

    pub fn set_subscriptions(&mut self, subscriptions: SubscriptionSet, now: DateTime<Utc>) {
        self.subscriptions = subscriptions;
        self.recompute(now);
    }

    /// Flips one region. Returns `true` if it is now subscribed.
    pub fn toggle_subscription(&mut self, region: &str, now: DateTime<Utc>) -> bool {
        let subscribed = self.subscriptions.toggle(region);
        self.recompute(now);
        subscribed
    }

    // --- Alert slot ---------------------------------------------------------

    pub fn dismiss_alert(&mut self) -> Option<AlertEvent> {
        self.active_alert.take().map(|a| a.event)
    }

    /// Clears the active alert once its display time has elapsed.
    /// Returns `true` if an alert was cleared.
    pub fn expire_alert(&mut self, now: DateTime<Utc>) -> bool {
        let expired = self
            .active_alert
            .as_ref()
            .is_some_and(|a| a.is_expired_at(now, self.settings.alert_ttl));
        if expired {
            self.active_alert = None;
        }
        expired
    }

    // --- Outputs ------------------------------------------------------------

    pub fn ranked(&self) -> &[RankedStation] {
        &self.ranked
    }

    pub fn top_n(&self) -> &[RankedStation] {
        top_n(&self.ranked, self.settings.top_n)
    }

    pub fn stations(&self) -> &[StationRecord] {
        &self.stations
    }

    pub fn active_alert(&self) -> Option<&AlertEvent> {
        self.active_alert.as_ref().map(|a| &a.event)
    }

    /// Newest-first forecast alerts from the last applied refresh.
    pub fn recent_alerts(&self) -> &[ForecastAlert] {
        &self.recent_alerts
    }

    /// When a station refresh was last applied.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn position(&self) -> Option<&Fix> {
        self.position.as_ref()
    }

    pub fn location_state(&self) -> &LocationState {
        &self.location_state
    }

    pub fn subscriptions(&self) -> &SubscriptionSet {
        &self.subscriptions
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    // --- Recompute ----------------------------------------------------------

    fn recompute(&mut self, now: DateTime<Utc>) {
        let position = self.position.as_ref().map(|fix| &fix.coordinate);
        self.ranked = rank(position, &self.stations);

        let entered = self
            .trigger
            .observe(&self.ranked, &self.subscriptions, self.settings.threshold_km);

        // Nearest newly-entered station takes the slot.
        if let Some(event) = entered.into_iter().next() {
            logging::warn(Component::Alerts, Some(&event.station_id), &event.message);
            self.active_alert = Some(ActiveAlert::new(event, now));
        }
    }
}
