//! Tessellation inputs.

use tellus_geodesy::{Ellipsoid, GeoExtent};
use tellus_geometry::VertexFormat;

use crate::error::TessellationError;

/// Everything needed to tessellate one extent.
#[derive(Clone, Copy, Debug)]
pub struct TessellationOptions {
    /// The lon/lat rectangle to tessellate.
    pub extent: GeoExtent,
    /// The ellipsoid the extent lies on.
    pub ellipsoid: Ellipsoid,
    /// Angular distance between grid samples, in radians.
    pub granularity: f64,
    /// Height of the surface above the ellipsoid, in meters.
    pub height: f64,
    /// When set, extrude the extent into a volume between `height` and this
    /// second height (walls plus optional caps).
    pub extruded_height: Option<f64>,
    /// In-plane rotation of the footprint about the extent center, radians
    /// counter-clockwise.
    pub rotation: f64,
    /// Rotation of the texture-coordinate frame about the extent center,
    /// radians counter-clockwise, independent of `rotation`.
    pub st_rotation: f64,
    /// Which vertex attributes to emit.
    pub vertex_format: VertexFormat,
    /// Whether an extruded volume gets a top cap.
    pub close_top: bool,
    /// Whether an extruded volume gets a bottom cap.
    pub close_bottom: bool,
}

impl TessellationOptions {
    /// One-degree default granularity.
    pub const DEFAULT_GRANULARITY: f64 = std::f64::consts::PI / 180.0;

    /// Creates options for a flat, unrotated tessellation of `extent`.
    #[must_use]
    pub fn new(extent: GeoExtent, ellipsoid: Ellipsoid) -> Self {
        Self {
            extent,
            ellipsoid,
            ..Self::default()
        }
    }

    /// Checks the scalar preconditions (extent validity, granularity).
    pub fn validate(&self) -> Result<(), TessellationError> {
        self.extent.validate()?;
        if !(self.granularity.is_finite() && self.granularity > 0.0) {
            return Err(TessellationError::InvalidGranularity {
                granularity: self.granularity,
            });
        }
        if !self.vertex_format.position {
            return Err(TessellationError::MissingPositionFormat);
        }
        Ok(())
    }
}

impl Default for TessellationOptions {
    fn default() -> Self {
        Self {
            extent: GeoExtent::default(),
            ellipsoid: Ellipsoid::wgs84(),
            granularity: Self::DEFAULT_GRANULARITY,
            height: 0.0,
            extruded_height: None,
            rotation: 0.0,
            st_rotation: 0.0,
            vertex_format: VertexFormat::default(),
            close_top: true,
            close_bottom: true,
        }
    }
}
