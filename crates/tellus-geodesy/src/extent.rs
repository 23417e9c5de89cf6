//! Axis-aligned lon/lat rectangles.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::Cartographic;
use crate::error::GeodesyError;

/// An axis-aligned rectangle in longitude/latitude space, in radians.
///
/// A valid extent satisfies `west, east ∈ [-π, π]`,
/// `south, north ∈ [-π/2, π/2]`, `west < east`, and `south < north`.
/// Construction does not validate; call [`GeoExtent::validate`] before
/// tessellating.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GeoExtent {
    /// Westernmost longitude in radians.
    pub west: f64,
    /// Southernmost latitude in radians.
    pub south: f64,
    /// Easternmost longitude in radians.
    pub east: f64,
    /// Northernmost latitude in radians.
    pub north: f64,
}

impl GeoExtent {
    /// Creates an extent from bounds in radians.
    #[inline]
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Creates an extent from bounds in degrees.
    #[must_use]
    pub fn from_degrees(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west: west.to_radians(),
            south: south.to_radians(),
            east: east.to_radians(),
            north: north.to_radians(),
        }
    }

    /// Angular width (east minus west) in radians.
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Angular height (north minus south) in radians.
    #[inline]
    #[must_use]
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Center of the extent at zero height.
    #[must_use]
    pub fn center(&self) -> Cartographic {
        Cartographic::new(
            (self.west + self.east) * 0.5,
            (self.south + self.north) * 0.5,
            0.0,
        )
    }

    /// Northwest corner of the extent at zero height.
    #[must_use]
    pub fn northwest(&self) -> Cartographic {
        Cartographic::new(self.west, self.north, 0.0)
    }

    /// Checks the range and non-degeneracy invariants.
    pub fn validate(&self) -> Result<(), GeodesyError> {
        let fail = |reason: String| Err(GeodesyError::InvalidExtent { reason });

        if self.west < -PI || self.west > PI {
            return fail(format!("west {} is outside [-PI, PI]", self.west));
        }
        if self.east < -PI || self.east > PI {
            return fail(format!("east {} is outside [-PI, PI]", self.east));
        }
        if self.south < -FRAC_PI_2 || self.south > FRAC_PI_2 {
            return fail(format!("south {} is outside [-PI/2, PI/2]", self.south));
        }
        if self.north < -FRAC_PI_2 || self.north > FRAC_PI_2 {
            return fail(format!("north {} is outside [-PI/2, PI/2]", self.north));
        }
        if self.west >= self.east {
            return fail(format!(
                "west {} must be less than east {}",
                self.west, self.east
            ));
        }
        if self.south >= self.north {
            return fail(format!(
                "south {} must be less than north {}",
                self.south, self.north
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_extent_passes_validation() {
        let e = GeoExtent::from_degrees(-10.0, -10.0, 10.0, 10.0);
        assert!(e.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_longitude_fails() {
        let e = GeoExtent::new(-4.0, -0.5, 1.0, 0.5);
        assert!(e.validate().is_err());
    }

    #[test]
    fn test_out_of_range_latitude_fails() {
        let e = GeoExtent::new(-1.0, -2.0, 1.0, 0.5);
        assert!(e.validate().is_err());
    }

    #[test]
    fn test_degenerate_extent_fails() {
        let e = GeoExtent::new(1.0, -0.5, 1.0, 0.5);
        assert!(e.validate().is_err());
        let e = GeoExtent::new(-1.0, 0.5, 1.0, 0.5);
        assert!(e.validate().is_err());
    }

    #[test]
    fn test_center_is_midpoint() {
        let e = GeoExtent::from_degrees(-10.0, 20.0, 30.0, 40.0);
        let c = e.center();
        assert!((c.longitude - 10.0_f64.to_radians()).abs() < 1e-12);
        assert!((c.latitude - 30.0_f64.to_radians()).abs() < 1e-12);
    }
}
