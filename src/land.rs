//! Coarse land avoidance from configured latitude/longitude boxes.
//!
//! A point is land when it lies inside a land box and outside every water
//! box. Water boxes carve gulfs and straits back out of a land box.

use ::geo::{Contains, Coord, Rect};
use serde::{Deserialize, Serialize};

use crate::geo::Position;

/// An axis-aligned box in degrees. Points on the edge are outside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    pub fn contains(&self, position: Position) -> bool {
        self.rect().contains(&position.point())
    }

    fn rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.min_lon,
                y: self.min_lat,
            },
            Coord {
                x: self.max_lon,
                y: self.max_lat,
            },
        )
    }

    /// Checks bounds are finite, ordered and on the globe.
    ///
    /// Boxes do not wrap the antimeridian; split such a region in two.
    pub(crate) fn validate(&self) -> Result<(), String> {
        let lat_ok = (-90.0..=90.0).contains(&self.min_lat)
            && (-90.0..=90.0).contains(&self.max_lat)
            && self.min_lat < self.max_lat;
        let lon_ok = (-180.0..=180.0).contains(&self.min_lon)
            && (-180.0..=180.0).contains(&self.max_lon)
            && self.min_lon < self.max_lon;
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(format!(
                "box lat [{}, {}] lon [{}, {}] is not an ordered box on the globe",
                self.min_lat, self.max_lat, self.min_lon, self.max_lon
            ))
        }
    }
}

/// Land boxes minus water boxes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandMask {
    land: Vec<BoundingBox>,
    water: Vec<BoundingBox>,
}

impl LandMask {
    pub fn new(land: Vec<BoundingBox>, water: Vec<BoundingBox>) -> Self {
        Self { land, water }
    }

    /// No land configured: every point is water.
    pub fn is_empty(&self) -> bool {
        self.land.is_empty()
    }

    pub fn is_land(&self, position: Position) -> bool {
        self.land.iter().any(|b| b.contains(position))
            && !self.water.iter().any(|b| b.contains(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A coast box with a gulf cut out of its south-west corner.
    fn mask() -> LandMask {
        LandMask::new(
            vec![BoundingBox::new(20.0, 45.0, 105.0, 124.0)],
            vec![BoundingBox::new(18.0, 21.0, 107.0, 109.0)],
        )
    }

    #[test]
    fn inside_a_land_box_is_land() {
        let m = mask();
        assert!(m.is_land(Position::new(30.0, 115.0)));
        assert!(!m.is_land(Position::new(15.0, 115.0)));
        assert!(!m.is_land(Position::new(30.0, 130.0)));
    }

    #[test]
    fn water_boxes_carve_out_land() {
        let m = mask();
        assert!(!m.is_land(Position::new(20.5, 108.0)));
        assert!(m.is_land(Position::new(21.5, 108.0)));
    }

    #[test]
    fn edges_are_water() {
        let m = mask();
        assert!(!m.is_land(Position::new(20.0, 115.0)));
        assert!(!m.is_land(Position::new(30.0, 124.0)));
    }

    #[test]
    fn empty_mask_is_all_water() {
        let m = LandMask::default();
        assert!(m.is_empty());
        assert!(!m.is_land(Position::new(30.0, 115.0)));
    }

    #[test]
    fn rejects_inverted_and_off_globe_boxes() {
        assert!(BoundingBox::new(20.0, 45.0, 105.0, 124.0).validate().is_ok());
        assert!(BoundingBox::new(45.0, 20.0, 105.0, 124.0).validate().is_err());
        assert!(BoundingBox::new(20.0, 45.0, 170.0, -170.0).validate().is_err());
        assert!(BoundingBox::new(-95.0, 45.0, 105.0, 124.0).validate().is_err());
        assert!(BoundingBox::new(20.0, f64::NAN, 105.0, 124.0).validate().is_err());
    }
}
