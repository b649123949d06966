//! Proximity alert trigger.
//!
//! A ranked station is *eligible* for an alert when all of these hold:
//!   - the user subscribed to its region (or to the station itself),
//!   - it is strictly closer than the proximity threshold,
//!   - its current risk is known and is not `"Safe"`.
//!
//! Selection is deterministic: the nearest eligible station wins, and
//! because the ranking is stable, equally distant stations fall back to
//! input order.
//!
//! [`evaluate`] answers "which alert applies right now". [`EdgeTrigger`]
//! wraps it with memory so that an alert fires once when a station enters
//! eligibility instead of on every refresh while the user stays in range.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::alert::severity::RiskSeverity;
use crate::model::{AlertEvent, RankedStation};
use crate::subscriptions::SubscriptionSet;

/// Default alert radius around a station, in kilometres. Matches the
/// 700 m risk circle drawn around each station on the map.
pub const DEFAULT_PROXIMITY_THRESHOLD_KM: f64 = 0.7;

/// Result of one evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    NoAlert,
    AlertRaised(AlertEvent),
}

impl EvaluationOutcome {
    pub fn into_alert(self) -> Option<AlertEvent> {
        match self {
            EvaluationOutcome::NoAlert => None,
            EvaluationOutcome::AlertRaised(event) => Some(event),
        }
    }
}

/// Returns `true` if `ranked` qualifies for an alert. Safe is matched the
/// way `RiskSeverity::classify` reads labels, ignoring case. NaN distances
/// or thresholds never qualify.
pub fn is_eligible(ranked: &RankedStation, subscriptions: &SubscriptionSet, threshold_km: f64) -> bool {
    let Some(risk) = ranked.risk_level() else {
        return false;
    };

    RiskSeverity::classify(risk) != RiskSeverity::Safe
        && ranked.distance_km < threshold_km && subscriptions.covers(&ranked.station)
}

/// Builds the notification shown for an eligible station.
pub fn alert_for(ranked: &RankedStation) -> AlertEvent {
    let risk = ranked.risk_level().unwrap_or("Unknown").to_string();
    let severity = RiskSeverity::classify(&risk);

    AlertEvent {
        title: format!("{}: {}", severity.headline(), ranked.station.name),
        message: format!(
            "You are {:.2} km from {} ({} risk).",
            ranked.distance_km, ranked.station.name, risk
        ),
        station_id: ranked.station.id.clone(),
        region: ranked.station.region.clone(),
        distance_km: ranked.distance_km,
        risk_level: risk,
    }
}

/// Picks the alert for the current ranking, if any: the nearest eligible
/// station.
pub fn evaluate(
    ranked: &[RankedStation],
    subscriptions: &SubscriptionSet,
    threshold_km: f64,
) -> Option<AlertEvent> {
    evaluate_pass(ranked, subscriptions, threshold_km).into_alert()
}

/// Same as [`evaluate`], expressed as a pass outcome.
pub fn evaluate_pass(
    ranked: &[RankedStation],
    subscriptions: &SubscriptionSet,
    threshold_km: f64,
) -> EvaluationOutcome {
    ranked
        .iter()
        .find(|r| is_eligible(r, subscriptions, threshold_km))
        .map(|r| EvaluationOutcome::AlertRaised(alert_for(r)))
        .unwrap_or(EvaluationOutcome::NoAlert)
}

// ---------------------------------------------------------------------------
// Edge-triggered evaluation
// ---------------------------------------------------------------------------

/// Remembers which stations are currently eligible (keyed by station id)
/// and reports only the ones that just became eligible.
#[derive(Debug, Default)]
pub struct EdgeTrigger {
    active: HashSet<String>,
}

impl EdgeTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one full pass. Returns alerts for stations that entered
    /// eligibility since the previous pass, nearest first. Stations that
    /// left eligibility are forgotten, so re-entering fires again.
    pub fn observe(
        &mut self,
        ranked: &[RankedStation],
        subscriptions: &SubscriptionSet,
        threshold_km: f64,
    ) -> Vec<AlertEvent> {
        let mut eligible_now = HashSet::new();
        let mut entered = Vec::new();

        for r in ranked.iter().filter(|r| is_eligible(r, subscriptions, threshold_km)) {
            // Duplicate ids collapse onto the nearest record.
            if eligible_now.insert(r.station.id.clone()) && !self.active.contains(&r.station.id) {
                entered.push(alert_for(r));
            }
        }

        self.active = eligible_now;
        entered
    }

    pub fn is_active(&self, station_id: &str) -> bool {
        self.active.contains(station_id)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn reset(&mut self) {
        self.active.clear();
    }
}

// ---------------------------------------------------------------------------
// Active alert slot
// ---------------------------------------------------------------------------

/// The single alert currently on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveAlert {
    pub event: AlertEvent,
    pub raised_at: DateTime<Utc>,
}

impl ActiveAlert {
    pub fn new(event: AlertEvent, raised_at: DateTime<Utc>) -> Self {
        Self { event, raised_at }
    }

    /// Expired once strictly more than `ttl` has passed since it was raised.
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.raised_at > ttl
    }
}
