//! Flat (non-extruded) extent tessellation.

use glam::{DVec2, DVec3};
use tellus_geometry::{BoundingSphere, Geometry};

use crate::builder::{VertexBuilder, push_quad_indices};
use crate::error::TessellationError;
use crate::grid::GridParams;
use crate::options::TessellationOptions;

/// One grid sample with every derivable attribute.
pub(crate) struct SurfaceSample {
    pub position: DVec3,
    pub normal: DVec3,
    pub tangent: DVec3,
    pub st: DVec2,
}

/// Samples grid cell `(row, col)` at the given height above the surface.
///
/// The tangent points geodetic-east before the texture rotation is applied;
/// the binormal is derived later as `normal × tangent`.
pub(crate) fn sample_surface(
    options: &TessellationOptions,
    params: &GridParams,
    row: usize,
    col: usize,
    height: f64,
) -> SurfaceSample {
    let mut cartographic = params.sample_cartographic(row, col);
    cartographic.height = height;

    let position = options.ellipsoid.cartographic_to_cartesian(&cartographic);
    let normal = options
        .ellipsoid
        .geodetic_surface_normal_cartographic(&cartographic);
    let east = DVec3::new(
        -cartographic.longitude.sin(),
        cartographic.longitude.cos(),
        0.0,
    );
    let tangent = params.rotate_tangent(normal, east);
    let st = params.sample_st(&cartographic);

    SurfaceSample {
        position,
        normal,
        tangent,
        st,
    }
}

/// Triangulates the sampled grid into `6 * (width-1) * (height-1)` indices.
pub(crate) fn tessellate(
    options: &TessellationOptions,
    params: &GridParams,
) -> Result<Geometry, TessellationError> {
    let width = params.width;
    let height = params.height;

    let mut builder = VertexBuilder::with_capacity(options.vertex_format, width * height);
    let mut points = Vec::with_capacity(width * height);

    for row in 0..height {
        for col in 0..width {
            let sample = sample_surface(options, params, row, col, options.height);
            builder.push(sample.position, sample.normal, sample.tangent, sample.st);
            points.push(sample.position);
        }
    }

    let mut indices = Vec::with_capacity(6 * (width - 1) * (height - 1));
    for row in 0..height - 1 {
        for col in 0..width - 1 {
            let upper_left = (row * width + col) as u32;
            let lower_left = upper_left + width as u32;
            push_quad_indices(
                &mut indices,
                upper_left,
                lower_left,
                upper_left + 1,
                lower_left + 1,
                false,
            );
        }
    }

    let sphere = BoundingSphere::from_points(&points);
    Ok(builder.into_geometry(indices, sphere))
}
