//! Grid dimensioning, rotated sampling, and texture-coordinate frames.

use std::f64::consts::{FRAC_PI_2, PI};

use glam::{DVec2, DVec3};
use tellus_geodesy::{Cartographic, GeoExtent};

use crate::error::TessellationError;
use crate::options::TessellationOptions;

/// Two consecutive perimeter samples closer than this (in position units)
/// are treated as coincident; their zero-length wall segment defines no
/// normal.
pub const WALL_DEGENERATE_TOLERANCE: f64 = 1e-10;

/// Precomputed sampling parameters for one tessellation.
///
/// The grid is walked row-major from the (possibly rotated) northwest
/// corner; each step accumulates the rotated per-axis angular step vectors,
/// so a nonzero rotation tilts the whole footprint about the extent center.
#[derive(Clone, Copy, Debug)]
pub struct GridParams {
    /// Number of samples per row.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Longitude contribution of one column step.
    gran_x_cos: f64,
    /// Latitude contribution of one column step.
    gran_x_sin: f64,
    /// Latitude contribution of one row step (subtracted; rows run
    /// north to south).
    gran_y_cos: f64,
    /// Longitude contribution of one row step.
    gran_y_sin: f64,
    /// Rotated northwest corner, the grid origin.
    nw_longitude: f64,
    nw_latitude: f64,
    /// Axis-aligned bounds of the rotated footprint, used to normalize
    /// texture coordinates.
    pub st_extent: GeoExtent,
    /// Cosine/sine of the texture-coordinate rotation.
    st_cos: f64,
    st_sin: f64,
}

impl GridParams {
    /// Derives grid dimensions, rotated step vectors, and the texture
    /// extent from the options.
    ///
    /// With a nonzero rotation the northwest corner is rotated about the
    /// extent center and the axis-aligned bounds of the four rotated grid
    /// corners become the texture extent; a footprint leaving the valid
    /// lon/lat range is rejected.
    pub fn compute(options: &TessellationOptions) -> Result<Self, TessellationError> {
        let extent = options.extent;
        let width = (extent.width() / options.granularity).ceil() as usize + 1;
        let height = (extent.height() / options.granularity).ceil() as usize + 1;

        let granularity_x = extent.width() / (width - 1) as f64;
        let granularity_y = extent.height() / (height - 1) as f64;

        let nw = extent.northwest();
        let center = extent.center();

        let (sin_rotation, cos_rotation) = options.rotation.sin_cos();
        let (st_sin, st_cos) = options.st_rotation.sin_cos();

        let mut params = Self {
            width,
            height,
            gran_x_cos: granularity_x * cos_rotation,
            gran_x_sin: granularity_x * sin_rotation,
            gran_y_cos: granularity_y * cos_rotation,
            gran_y_sin: granularity_y * sin_rotation,
            nw_longitude: nw.longitude,
            nw_latitude: nw.latitude,
            st_extent: extent,
            st_cos,
            st_sin,
        };

        if options.rotation != 0.0 {
            // Rotate the northwest corner about the extent center in the
            // local lon/lat tangent frame.
            let d_lon = nw.longitude - center.longitude;
            let d_lat = nw.latitude - center.latitude;
            params.nw_longitude = center.longitude + d_lon * cos_rotation - d_lat * sin_rotation;
            params.nw_latitude = center.latitude + d_lon * sin_rotation + d_lat * cos_rotation;

            // Axis-aligned bounds of the four rotated grid corners.
            let corners = [
                params.sample_cartographic(0, 0),
                params.sample_cartographic(0, width - 1),
                params.sample_cartographic(height - 1, 0),
                params.sample_cartographic(height - 1, width - 1),
            ];
            let mut st = GeoExtent::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
            for corner in corners {
                st.west = st.west.min(corner.longitude);
                st.east = st.east.max(corner.longitude);
                st.south = st.south.min(corner.latitude);
                st.north = st.north.max(corner.latitude);
            }

            if st.north > FRAC_PI_2
                || st.south < -FRAC_PI_2
                || st.east > PI
                || st.west < -PI
            {
                return Err(TessellationError::RotatedExtentOutOfRange);
            }
            params.st_extent = st;
        }

        Ok(params)
    }

    /// Geographic position of grid sample `(row, col)` at zero height.
    /// Row 0 is the (rotated) north edge.
    #[must_use]
    pub fn sample_cartographic(&self, row: usize, col: usize) -> Cartographic {
        let row = row as f64;
        let col = col as f64;
        Cartographic::new(
            self.nw_longitude + row * self.gran_y_sin + col * self.gran_x_cos,
            self.nw_latitude - row * self.gran_y_cos + col * self.gran_x_sin,
            0.0,
        )
    }

    /// Texture coordinate for a sample position: the affine map into the
    /// texture extent, then the texture rotation about `(0.5, 0.5)`.
    #[must_use]
    pub fn sample_st(&self, position: &Cartographic) -> DVec2 {
        let u = (position.longitude - self.st_extent.west) / self.st_extent.width();
        let v = (position.latitude - self.st_extent.south) / self.st_extent.height();

        // Coordinates counter-rotate when the texture frame rotates.
        let du = u - 0.5;
        let dv = v - 0.5;
        DVec2::new(
            0.5 + du * self.st_cos + dv * self.st_sin,
            0.5 - du * self.st_sin + dv * self.st_cos,
        )
    }

    /// Rotates a tangent vector about the surface normal by the texture
    /// rotation so tangent-space shading follows the rotated texture.
    #[must_use]
    pub fn rotate_tangent(&self, normal: DVec3, tangent: DVec3) -> DVec3 {
        if self.st_sin == 0.0 && self.st_cos == 1.0 {
            return tangent;
        }
        // Rodrigues rotation about the unit normal.
        tangent * self.st_cos + normal.cross(tangent) * self.st_sin
            + normal * normal.dot(tangent) * (1.0 - self.st_cos)
    }

    /// Grid perimeter sample coordinates in walk order: north row west to
    /// east, east column north to south, south row east to west, west
    /// column south to north. Side endpoints repeat at the corners; those
    /// coincident pairs are the degenerate wall segments.
    #[must_use]
    pub fn perimeter(&self) -> Vec<(usize, usize)> {
        let w = self.width;
        let h = self.height;
        let mut walk = Vec::with_capacity(2 * w + 2 * h);
        for col in 0..w {
            walk.push((0, col));
        }
        for row in 0..h {
            walk.push((row, w - 1));
        }
        for col in (0..w).rev() {
            walk.push((h - 1, col));
        }
        for row in (0..h).rev() {
            walk.push((row, 0));
        }
        walk
    }
}
