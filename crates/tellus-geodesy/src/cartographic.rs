//! Geodetic position: longitude, latitude, height.

/// A position expressed as longitude/latitude in radians and height in
/// meters above (or below, when negative) the ellipsoid surface.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cartographic {
    /// Longitude in radians, in `[-π, π]`.
    pub longitude: f64,
    /// Latitude in radians, in `[-π/2, π/2]`.
    pub latitude: f64,
    /// Height in meters above the ellipsoid surface.
    pub height: f64,
}

impl Cartographic {
    /// Creates a cartographic position from radians.
    #[inline]
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64, height: f64) -> Self {
        Self {
            longitude,
            latitude,
            height,
        }
    }

    /// Creates a cartographic position from degrees.
    #[inline]
    #[must_use]
    pub fn from_degrees(longitude: f64, latitude: f64, height: f64) -> Self {
        Self {
            longitude: longitude.to_radians(),
            latitude: latitude.to_radians(),
            height,
        }
    }

    /// Component-wise comparison within an absolute tolerance.
    #[must_use]
    pub fn equals_epsilon(&self, other: &Self, epsilon: f64) -> bool {
        (self.longitude - other.longitude).abs() <= epsilon
            && (self.latitude - other.latitude).abs() <= epsilon
            && (self.height - other.height).abs() <= epsilon
    }
}
