//! Recent forecast alerts feed.
//!
//! Every forecast day carrying one of the headline labels becomes a feed
//! entry. The feed shows the last few entries in payload order, newest
//! first. Labels are matched exactly as the backend spells them.

use serde::Serialize;

use crate::model::StationRecord;

/// Entries kept in the feed.
pub const RECENT_ALERT_LIMIT: usize = 5;

/// Forecast labels that produce a feed entry.
pub const FEED_RISK_LEVELS: [&str; 3] = ["Red Alert", "Warning", "Safe"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastAlert {
    /// `"{location}-{date}"`; the date part is empty when the day is undated.
    pub id: String,
    pub location: String,
    pub date: Option<String>,
    pub risk_level: String,
}

/// Builds the feed from one refresh: the last `RECENT_ALERT_LIMIT`
/// qualifying forecast days, reversed.
pub fn forecast_alerts(stations: &[StationRecord]) -> Vec<ForecastAlert> {
    let all: Vec<ForecastAlert> = stations
        .iter()
        .flat_map(|station| {
            station.forecast.iter().filter_map(move |day| {
                let risk = day.risk_level.as_deref()?;
                if !FEED_RISK_LEVELS.contains(&risk) {
                    return None;
                }
                Some(ForecastAlert {
                    id: format!("{}-{}", station.name, day.date.as_deref().unwrap_or_default()),
                    location: station.name.clone(),
                    date: day.date.clone(),
                    risk_level: risk.to_string(),
                })
            })
        })
        .collect();

    let start = all.len().saturating_sub(RECENT_ALERT_LIMIT);
    all[start..].iter().rev().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinate, ForecastEntry};

    fn day(date: &str, risk: &str) -> ForecastEntry {
        ForecastEntry {
            date: Some(date.to_string()),
            risk_level: Some(risk.to_string()),
            ..ForecastEntry::default()
        }
    }

    fn station(name: &str, forecast: Vec<ForecastEntry>) -> StationRecord {
        StationRecord {
            id: name.to_lowercase(),
            name: name.to_string(),
            region: "pune".to_string(),
            coordinate: Coordinate::new(18.5, 73.8).unwrap(),
            risk_level: forecast.first().and_then(|d| d.risk_level.clone()),
            forecast,
        }
    }

    fn ids(feed: &[ForecastAlert]) -> Vec<&str> {
        feed.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_keeps_last_five_newest_first() {
        let stations = vec![
            station(
                "Mulshi Dam",
                vec![day("2025-11-11", "Safe"), day("2025-11-12", "Warning"), day("2025-11-13", "Red Alert")],
            ),
            station(
                "Panshet Dam",
                vec![day("2025-11-11", "Safe"), day("2025-11-12", "Safe"), day("2025-11-13", "Warning")],
            ),
        ];

        let feed = forecast_alerts(&stations);
        assert_eq!(
            ids(&feed),
            vec![
                "Panshet Dam-2025-11-13",
                "Panshet Dam-2025-11-12",
                "Panshet Dam-2025-11-11",
                "Mulshi Dam-2025-11-13",
                "Mulshi Dam-2025-11-12",
            ]
        );
        assert_eq!(feed[0].risk_level, "Warning");
        assert_eq!(feed[0].location, "Panshet Dam");
    }

    #[test]
    fn test_short_feed_is_reversed_whole() {
        let stations = vec![station("Mulshi Dam", vec![day("d1", "Safe"), day("d2", "Warning")])];
        assert_eq!(ids(&forecast_alerts(&stations)), vec!["Mulshi Dam-d2", "Mulshi Dam-d1"]);
    }

    #[test]
    fn test_other_labels_are_skipped() {
        let stations = vec![station(
            "Temghar Dam",
            vec![
                day("d1", "Watch"),
                day("d2", "warning"),
                ForecastEntry::default(),
                day("d3", "Red Alert"),
            ],
        )];
        let feed = forecast_alerts(&stations);
        assert_eq!(ids(&feed), vec!["Temghar Dam-d3"]);
    }

    #[test]
    fn test_undated_day_keeps_entry() {
        let undated = ForecastEntry {
            risk_level: Some("Warning".to_string()),
            ..ForecastEntry::default()
        };
        let feed = forecast_alerts(&[station("Varasgaon Dam", vec![undated])]);
        assert_eq!(feed[0].id, "Varasgaon Dam-");
        assert_eq!(feed[0].date, None);
    }

    #[test]
    fn test_no_stations_no_feed() {
        assert!(forecast_alerts(&[]).is_empty());
    }
}
