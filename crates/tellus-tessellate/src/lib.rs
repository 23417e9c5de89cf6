//! Extent tessellation: turns a lon/lat rectangle on an ellipsoid into a
//! renderable triangle mesh, optionally extruded into a volume with side
//! walls and caps.

mod builder;
mod error;
mod extruded;
mod grid;
mod options;
mod surface;

pub use error::TessellationError;
pub use grid::WALL_DEGENERATE_TOLERANCE;
pub use options::TessellationOptions;

use tellus_geometry::Geometry;
use tracing::debug;

use crate::grid::GridParams;

/// Tessellates an extent into a single [`Geometry`].
///
/// Flat extents become a sampled lon/lat grid triangulated into
/// `6 * (width - 1) * (height - 1)` indices. When
/// [`TessellationOptions::extruded_height`] is set, the result is a volume:
/// side walls built from the grid perimeter at both heights, plus optional
/// top and bottom caps.
///
/// Fails on invalid extents, non-positive granularity, and rotated
/// footprints leaving the valid lon/lat range. These are precondition
/// violations, never silently corrected.
pub fn tessellate_extent(options: &TessellationOptions) -> Result<Geometry, TessellationError> {
    options.validate()?;
    let params = GridParams::compute(options)?;

    debug!(
        width = params.width,
        height = params.height,
        extruded = options.extruded_height.is_some(),
        "tessellating extent"
    );

    match options.extruded_height {
        Some(extruded_height) => extruded::tessellate(options, &params, extruded_height),
        None => surface::tessellate(options, &params),
    }
}
