//! Spherical geodesy on a mean-radius Earth.
//!
//! Distance, bearing and destination come from `geo`'s haversine measure;
//! results are wrapped back into the ranges the rest of the crate expects.

use ::geo::{Bearing, Destination, Distance, Haversine, Point};

/// A point on the globe, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub(crate) fn point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// Great-circle distance by the haversine formula.
pub fn distance_km(from: Position, to: Position) -> f64 {
    Haversine.distance(from.point(), to.point()) / 1000.0
}

/// Initial great-circle bearing from `from` to `to`, in `[0, 360)`.
pub fn initial_bearing(from: Position, to: Position) -> f64 {
    normalize_bearing(Haversine.bearing(from.point(), to.point()))
}

/// The point `distance_km` along the great circle leaving `origin` at `bearing_deg`.
///
/// Longitude is wrapped into `[-180, 180)` so tracks cross the antimeridian
/// without a jump out of range.
pub fn destination(origin: Position, bearing_deg: f64, distance_km: f64) -> Position {
    if distance_km == 0.0 {
        return origin;
    }
    let end = Haversine.destination(origin.point(), bearing_deg, distance_km * 1000.0);
    Position {
        latitude: end.y().clamp(-90.0, 90.0),
        longitude: normalize_longitude(end.x()),
    }
}

/// Mean position of a point cloud, averaged on the unit sphere.
///
/// Averaging unit vectors keeps clouds straddling the antimeridian together.
/// `None` for an empty cloud or one whose points cancel out.
pub fn centroid(points: &[Position]) -> Option<Position> {
    let (mut x, mut y, mut z) = (0.0, 0.0, 0.0);
    for p in points {
        let (lat, lon) = (p.latitude.to_radians(), p.longitude.to_radians());
        x += lat.cos() * lon.cos();
        y += lat.cos() * lon.sin();
        z += lat.sin();
    }
    let norm = (x * x + y * y + z * z).sqrt();
    if norm < 1e-12 {
        return None;
    }
    Some(Position {
        latitude: (z / norm).clamp(-1.0, 1.0).asin().to_degrees(),
        longitude: normalize_longitude(y.atan2(x).to_degrees()),
    })
}

/// Wraps a bearing into `[0, 360)`.
pub fn normalize_bearing(deg: f64) -> f64 {
    let b = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if b >= 360.0 { 0.0 } else { b }
}

/// Wraps a longitude into `[-180, 180)`.
pub fn normalize_longitude(deg: f64) -> f64 {
    let lon = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if lon >= 180.0 { -180.0 } else { lon }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    #[test]
    fn one_degree_of_latitude() {
        let d = distance_km(Position::new(0.0, 0.0), Position::new(1.0, 0.0));
        assert_abs_diff_eq!(d, 111.195, epsilon = 0.01);
    }

    #[test]
    fn cardinal_bearings() {
        let o = Position::new(0.0, 0.0);
        assert_abs_diff_eq!(initial_bearing(o, Position::new(1.0, 0.0)), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(initial_bearing(o, Position::new(0.0, 1.0)), 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(initial_bearing(o, Position::new(-1.0, 0.0)), 180.0, epsilon = 1e-9);
        assert_abs_diff_eq!(initial_bearing(o, Position::new(0.0, -1.0)), 270.0, epsilon = 1e-9);
    }

    #[test]
    fn bearing_across_the_antimeridian_points_east() {
        let b = initial_bearing(Position::new(0.0, 179.5), Position::new(0.0, -179.5));
        assert_abs_diff_eq!(b, 90.0, epsilon = 1e-9);
    }

    #[test]
    fn destination_inverts_distance_and_bearing() {
        let o = Position::new(34.5, -122.3);
        let d = destination(o, 37.0, 250.0);
        assert_abs_diff_eq!(distance_km(o, d), 250.0, epsilon = 1e-6);
        assert_abs_diff_eq!(initial_bearing(o, d), 37.0, epsilon = 1e-6);
    }

    #[test]
    fn destination_over_the_pole_stays_in_range() {
        let d = destination(Position::new(89.9, 10.0), 0.0, 50.0);
        assert!((-90.0..=90.0).contains(&d.latitude));
        assert!((-180.0..180.0).contains(&d.longitude));
        assert_abs_diff_eq!(d.longitude, -170.0, epsilon = 1e-6);
    }

    #[test]
    fn centroid_of_a_cloud() {
        let c = centroid(&[Position::new(1.0, 10.0), Position::new(-1.0, 10.0)]).unwrap();
        assert_abs_diff_eq!(c.latitude, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c.longitude, 10.0, epsilon = 1e-9);

        let seam = centroid(&[Position::new(0.0, 179.0), Position::new(0.0, -179.0)]).unwrap();
        assert_abs_diff_eq!(seam.longitude.abs(), 180.0, epsilon = 1e-9);

        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn normalizers_wrap() {
        assert_eq!(normalize_longitude(180.0), -180.0);
        assert_abs_diff_eq!(normalize_longitude(180.3), -179.7, epsilon = 1e-9);
        assert_abs_diff_eq!(normalize_longitude(-190.0), 170.0, epsilon = 1e-9);
        assert_eq!(normalize_bearing(360.0), 0.0);
        assert_abs_diff_eq!(normalize_bearing(-90.0), 270.0, epsilon = 1e-9);
        assert_eq!(normalize_bearing(-1e-20), 0.0);
    }
}
