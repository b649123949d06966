//! Nearest-first station ranking.
//!
//! `rank` is the only computation path: the "nearest N" list shown to the
//! user is always a prefix of it (see [`top_n`]), never a separate query.

use crate::analysis::distance::haversine_km;
use crate::model::{Coordinate, RankedStation, StationRecord};

/// How many stations the nearest-locations list shows by default.
pub const DEFAULT_TOP_N: usize = 6;

/// Annotates every station with its distance from `position` and sorts the
/// result nearest first.
///
/// Returns an empty list when there is no position fix yet or no stations.
/// The sort is stable, so stations at equal distance keep their input
/// order; NaN distances (which validated coordinates cannot produce) sort
/// last.
pub fn rank(position: Option<&Coordinate>, stations: &[StationRecord]) -> Vec<RankedStation> {
    let Some(position) = position else {
        return Vec::new();
    };

    let mut ranked: Vec<RankedStation> = stations
        .iter()
        .map(|station| RankedStation {
            distance_km: haversine_km(position, &station.coordinate),
            station: station.clone(),
        })
        .collect();

    ranked.sort_by(|a, b| match (a.distance_km.is_nan(), b.distance_km.is_nan()) {
        (false, false) => a.distance_km.total_cmp(&b.distance_km),
        (a_nan, b_nan) => a_nan.cmp(&b_nan),
    });
    ranked
}

/// The first `n` entries of a ranking (fewer if the ranking is shorter).
pub fn top_n(ranked: &[RankedStation], n: usize) -> &[RankedStation] {
    &ranked[..n.min(ranked.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn station(id: &str, lat: f64, lng: f64, risk: &str) -> StationRecord {
        StationRecord {
            id: id.to_string(),
            name: id.to_string(),
            region: "pune".to_string(),
            coordinate: Coordinate::new(lat, lng).unwrap(),
            risk_level: Some(risk.to_string()),
            forecast: Vec::new(),
        }
    }

    fn pune_dams() -> Vec<StationRecord> {
        vec![
            station("mulshi", 18.7298, 73.6462, "Warning"),
            station("khadakwasla", 18.3534, 73.8341, "Watch"),
            station("panshet", 18.2245, 74.0267, "Safe"),
        ]
    }

    fn pune_centre() -> Coordinate {
        Coordinate::new(18.5204, 73.8567).unwrap()
    }

    fn ids(ranked: &[RankedStation]) -> Vec<&str> {
        ranked.iter().map(|r| r.station.id.as_str()).collect()
    }

    #[test]
    fn test_pune_dams_ranked_nearest_first() {
        let ranked = rank(Some(&pune_centre()), &pune_dams());
        assert_eq!(ids(&ranked), vec!["khadakwasla", "mulshi", "panshet"]);
        assert!((ranked[0].distance_km - 18.7).abs() < 2.5, "khadakwasla ~ {}", ranked[0].distance_km);
    }

    #[test]
    fn test_no_position_yields_empty_ranking() {
        assert!(rank(None, &pune_dams()).is_empty());
    }

    #[test]
    fn test_no_stations_yields_empty_ranking() {
        assert!(rank(Some(&pune_centre()), &[]).is_empty());
    }

    #[test]
    fn test_ties_keep_input_order() {
        // Two distinct records at the same spot, plus a duplicate id.
        let stations = vec![
            station("b", 18.60, 73.90, "Watch"),
            station("a", 18.60, 73.90, "Warning"),
            station("b", 18.60, 73.90, "Safe"),
            station("near", 18.5205, 73.8567, "Safe"),
        ];
        let ranked = rank(Some(&pune_centre()), &stations);
        assert_eq!(ids(&ranked), vec!["near", "b", "a", "b"]);
        assert_eq!(ranked[1].risk_level(), Some("Watch"));
        assert_eq!(ranked[3].risk_level(), Some("Safe"));
    }

    #[test]
    fn test_rank_does_not_alter_station_payload() {
        let stations = pune_dams();
        let ranked = rank(Some(&pune_centre()), &stations);
        for r in &ranked {
            let original = stations.iter().find(|s| s.id == r.station.id).unwrap();
            assert_eq!(&r.station, original);
        }
    }

    #[test]
    fn test_top_n_is_prefix_and_clamps() {
        let ranked = rank(Some(&pune_centre()), &pune_dams());
        assert_eq!(top_n(&ranked, DEFAULT_TOP_N), &ranked[..]);
        assert_eq!(top_n(&ranked, 2), &ranked[..2]);
        assert!(top_n(&ranked, 0).is_empty());
    }

    fn arb_station() -> impl Strategy<Value = StationRecord> {
        (-60.0f64..60.0, -170.0f64..170.0, 0usize..4).prop_map(|(lat, lng, n)| {
            station(&format!("s{}", n), lat, lng, "Watch")
        })
    }

    proptest! {
        #[test]
        fn prop_ranking_is_non_decreasing(
            stations in proptest::collection::vec(arb_station(), 1..30),
            lat in -60.0f64..60.0, lng in -170.0f64..170.0,
        ) {
            let here = Coordinate::new(lat, lng).unwrap();
            let ranked = rank(Some(&here), &stations);
            prop_assert_eq!(ranked.len(), stations.len());
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].distance_km <= pair[1].distance_km);
            }
        }

        #[test]
        fn prop_ranking_is_deterministic(
            stations in proptest::collection::vec(arb_station(), 0..30),
            lat in -60.0f64..60.0, lng in -170.0f64..170.0,
        ) {
            let here = Coordinate::new(lat, lng).unwrap();
            prop_assert_eq!(rank(Some(&here), &stations), rank(Some(&here), &stations));
        }

        #[test]
        fn prop_top_n_matches_prefix(
            stations in proptest::collection::vec(arb_station(), 0..20),
            n in 0usize..25,
        ) {
            let ranked = rank(Some(&pune_centre()), &stations);
            let expected: Vec<_> = ranked.iter().take(n).cloned().collect();
            prop_assert_eq!(top_n(&ranked, n).to_vec(), expected);
        }

        #[test]
        fn prop_missing_position_is_always_empty(
            stations in proptest::collection::vec(arb_station(), 0..20),
        ) {
            prop_assert!(rank(None, &stations).is_empty());
        }
    }
}
