//! Great-circle distance on a spherical Earth.

use crate::model::Coordinate;

/// Mean Earth radius used by the haversine formula, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two coordinates, in kilometres.
///
/// Accurate to well under a percent for the station-to-user ranges this
/// service deals with (tens of kilometres).
pub fn haversine_km(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat1 = from.latitude().to_radians();
    let lat2 = to.latitude().to_radians();
    let delta_lat = (to.latitude() - from.latitude()).to_radians();
    let delta_lng = (to.longitude() - from.longitude()).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn test_pune_to_mulshi_is_about_thirty_two_km() {
        let pune = coord(18.5204, 73.8567);
        let mulshi = coord(18.7298, 73.6462);
        let d = haversine_km(&pune, &mulshi);
        assert!((d - 32.16).abs() < 0.5, "expected ~32.16 km, got {}", d);
    }

    #[test]
    fn test_same_point_is_zero() {
        let p = coord(18.3534, 73.8341);
        assert_eq!(haversine_km(&p, &p), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude_is_about_111_km() {
        let d = haversine_km(&coord(0.0, 0.0), &coord(1.0, 0.0));
        assert!((d - 111.19).abs() < 0.05, "got {}", d);
    }

    #[test]
    fn test_antipodes_are_half_circumference() {
        let d = haversine_km(&coord(0.0, 0.0), &coord(0.0, 180.0));
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((d - half).abs() < 1e-6, "got {}", d);
    }

    proptest! {
        #[test]
        fn prop_distance_is_symmetric(
            lat1 in -90.0f64..=90.0, lng1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0, lng2 in -180.0f64..=180.0,
        ) {
            let a = coord(lat1, lng1);
            let b = coord(lat2, lng2);
            let ab = haversine_km(&a, &b);
            let ba = haversine_km(&b, &a);
            prop_assert!((ab - ba).abs() < 1e-9, "{} vs {}", ab, ba);
        }

        #[test]
        fn prop_distance_to_self_is_zero(lat in -90.0f64..=90.0, lng in -180.0f64..=180.0) {
            let a = coord(lat, lng);
            prop_assert_eq!(haversine_km(&a, &a), 0.0);
        }

        #[test]
        fn prop_distance_is_bounded_by_half_circumference(
            lat1 in -90.0f64..=90.0, lng1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0, lng2 in -180.0f64..=180.0,
        ) {
            let d = haversine_km(&coord(lat1, lng1), &coord(lat2, lng2));
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
        }
    }
}
