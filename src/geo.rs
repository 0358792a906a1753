//! Small-area geodesy on the WGS84 sphere.
//!
//! Distances use the haversine formula with a spherical earth. The planar
//! projection is a local equirectangular-style approximation: it is only
//! meaningful over flight-strip scale distances around the origin, and its
//! error grows with distance and latitude.

use serde::{Deserialize, Serialize};

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Local Cartesian offset in meters: `x` east, `y` north.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanePoint {
    pub x: f64,
    pub y: f64,
}

/// Great-circle distance in meters.
pub fn distance(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let delta_lat = (p2.latitude - p1.latitude).to_radians();
    let delta_lon = (p2.longitude - p1.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair above 1 for antipodal points.
    let c = 2.0 * a.min(1.0).sqrt().atan2((1.0 - a).max(0.0).sqrt());

    EARTH_RADIUS_M * c
}

/// Initial bearing from `p1` towards `p2`, in degrees within `[0, 360)`.
pub fn bearing(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let delta_lon = (p2.longitude - p1.longitude).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    normalize_degrees(y.atan2(x).to_degrees())
}

/// Projects `point` onto a plane tangent at `origin`.
///
/// Each axis is a haversine distance with the other coordinate held at the
/// origin's value, signed by comparing the moving coordinate.
pub fn project_to_plane(origin: GeoPoint, point: GeoPoint) -> PlanePoint {
    let east = distance(origin, GeoPoint::new(origin.latitude, point.longitude));
    let north = distance(origin, GeoPoint::new(point.latitude, origin.longitude));

    PlanePoint {
        x: if point.longitude < origin.longitude {
            -east
        } else {
            east
        },
        y: if point.latitude < origin.latitude {
            -north
        } else {
            north
        },
    }
}

/// Absolute difference between two headings, folded into `[0, 180]`.
pub fn angle_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs() % 360.0;
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

fn normalize_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng)
    }

    #[test]
    fn test_distance_symmetric_and_zero() {
        let a = p(47.3769, 8.5417);
        let b = p(47.3790, 8.5450);
        assert_eq!(distance(a, b), distance(b, a));
        assert_eq!(distance(a, a), 0.0);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        let d = distance(p(0.0, 0.0), p(1.0, 0.0));
        // 2πR / 360
        assert!((d - 111_194.93).abs() < 0.1, "got {}", d);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = p(10.0, 20.0);
        assert!(bearing(origin, p(10.1, 20.0)).abs() < 1e-9);
        assert!((bearing(origin, p(10.0, 20.1)) - 90.0).abs() < 0.1);
        assert!((bearing(origin, p(9.9, 20.0)) - 180.0).abs() < 1e-9);
        assert!((bearing(origin, p(10.0, 19.9)) - 270.0).abs() < 0.1);
    }

    #[test]
    fn test_bearing_in_range() {
        let origin = p(-33.86, 151.21);
        for i in 0..36 {
            let angle = (i as f64 * 10.0).to_radians();
            let target = p(-33.86 + 0.01 * angle.cos(), 151.21 + 0.01 * angle.sin());
            let b = bearing(origin, target);
            assert!((0.0..360.0).contains(&b), "bearing {} out of range", b);
        }
    }

    #[test]
    fn test_project_to_plane_signs() {
        let origin = p(45.0, 7.0);
        let ne = project_to_plane(origin, p(45.001, 7.001));
        assert!(ne.x > 0.0 && ne.y > 0.0);
        let sw = project_to_plane(origin, p(44.999, 6.999));
        assert!(sw.x < 0.0 && sw.y < 0.0);
        assert_eq!(project_to_plane(origin, origin), PlanePoint::default());
    }

    #[test]
    fn test_project_to_plane_matches_distance_nearby() {
        let origin = p(45.0, 7.0);
        let target = p(45.002, 7.003);
        let plane = project_to_plane(origin, target);
        let planar = (plane.x * plane.x + plane.y * plane.y).sqrt();
        assert!((planar - distance(origin, target)).abs() < 0.5);
    }

    #[test]
    fn test_angle_difference_folds() {
        assert_eq!(angle_difference(10.0, 350.0), 20.0);
        assert_eq!(angle_difference(0.0, 180.0), 180.0);
        assert_eq!(angle_difference(90.0, 90.0), 0.0);
        assert_eq!(angle_difference(270.0, 0.0), 90.0);
    }
}
