//! Great-circle distances and nearest-station ranking.

use std::f64::consts::PI;

use crate::domain::{Coordinates, RankedStation, StationMarker};

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Number of stations returned by a closest-stations query by default.
pub const DEFAULT_CLOSEST_LIMIT: usize = 3;

/// Convert decimal degrees to radians.
pub fn to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Great-circle distance between two points, in meters.
///
/// See <http://www.movable-type.co.uk/scripts/latlong.html>.
pub fn haversine_distance(from: Coordinates, to: Coordinates) -> f64 {
    let phi1 = to_radians(from.lat);
    let phi2 = to_radians(to.lat);
    let delta_phi = to_radians(to.lat - from.lat);
    let delta_lambda = to_radians(to.lon - from.lon);

    // Rounding can push `a` just past 1 for near-antipodal points.
    let a = ((delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2))
    .min(1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Rank stations by distance from `origin`, nearest first, keeping at most
/// `max`.
///
/// Stations without a usable position are left out. The sort is stable, so
/// stations at exactly the same distance keep their feed order.
pub fn rank_closest(
    stations: Vec<StationMarker>,
    origin: Coordinates,
    max: usize,
) -> Vec<RankedStation> {
    let mut ranked: Vec<RankedStation> = stations
        .into_iter()
        .filter_map(|station| {
            let position = station.coordinates()?;
            Some(RankedStation {
                distance: haversine_distance(origin, position),
                station,
            })
        })
        .collect();

    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    ranked.truncate(max);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(id: &str, lat: f64, lng: f64) -> StationMarker {
        StationMarker::new(vec![
            ("id".to_string(), id.to_string()),
            ("lat".to_string(), lat.to_string()),
            ("lng".to_string(), lng.to_string()),
        ])
    }

    fn ids(ranked: &[RankedStation]) -> Vec<&str> {
        ranked
            .iter()
            .map(|r| r.station.get("id").unwrap())
            .collect()
    }

    #[test]
    fn radians() {
        assert_eq!(to_radians(0.0), 0.0);
        assert!((to_radians(180.0) - PI).abs() < 1e-12);
        assert!((to_radians(-90.0) + PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn distance_between_lille_points() {
        let a = Coordinates::new(50.6292, 3.0573);
        let b = Coordinates::new(50.6371, 3.0630);

        let d = haversine_distance(a, b);

        assert!(d > 900.0 && d < 1000.0, "distance was {d}");
    }

    #[test]
    fn distance_to_self_is_zero() {
        let a = Coordinates::new(50.6292, 3.0573);
        assert_eq!(haversine_distance(a, a), 0.0);
    }

    #[test]
    fn quarter_meridian() {
        let equator = Coordinates::new(0.0, 0.0);
        let pole = Coordinates::new(90.0, 0.0);
        let expected = EARTH_RADIUS_METERS * PI / 2.0;
        assert!((haversine_distance(equator, pole) - expected).abs() < 1e-6);
    }

    #[test]
    fn keeps_the_three_nearest() {
        let origin = Coordinates::new(50.6292, 3.0573);
        let stations = vec![
            marker("far", 50.70, 3.20),
            marker("near", 50.6295, 3.0575),
            marker("farthest", 51.00, 3.50),
            marker("middle", 50.64, 3.07),
            marker("close", 50.632, 3.06),
        ];

        let ranked = rank_closest(stations, origin, DEFAULT_CLOSEST_LIMIT);

        assert_eq!(ranked.len(), 3);
        assert_eq!(ids(&ranked), vec!["near", "close", "middle"]);
        assert!(ranked.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn fewer_stations_than_max() {
        let origin = Coordinates::new(50.0, 3.0);
        let ranked = rank_closest(vec![marker("only", 50.1, 3.0)], origin, 3);
        assert_eq!(ids(&ranked), vec!["only"]);
    }

    #[test]
    fn max_of_zero() {
        let origin = Coordinates::new(50.0, 3.0);
        assert!(rank_closest(vec![marker("a", 50.1, 3.0)], origin, 0).is_empty());
    }

    #[test]
    fn skips_stations_without_position() {
        let origin = Coordinates::new(50.0, 3.0);
        let stations = vec![
            StationMarker::new(vec![("id".to_string(), "nowhere".to_string())]),
            marker("somewhere", 50.5, 3.0),
        ];

        let ranked = rank_closest(stations, origin, 3);

        assert_eq!(ids(&ranked), vec!["somewhere"]);
    }

    #[test]
    fn ties_keep_feed_order() {
        let origin = Coordinates::new(50.0, 3.0);
        let stations = vec![
            marker("first", 50.1, 3.0),
            marker("second", 50.1, 3.0),
            marker("third", 50.1, 3.0),
        ];

        let ranked = rank_closest(stations, origin, 2);

        assert_eq!(ids(&ranked), vec!["first", "second"]);
    }
}
