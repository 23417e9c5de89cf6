//! Extruded extent tessellation: side walls plus optional caps.

use glam::{DVec2, DVec3};
use tellus_geometry::{BoundingSphere, Geometry};

use crate::builder::{VertexBuilder, push_quad_indices};
use crate::error::TessellationError;
use crate::grid::{GridParams, WALL_DEGENERATE_TOLERANCE};
use crate::options::TessellationOptions;
use crate::surface::{SurfaceSample, sample_surface};

/// Tessellates the extent as a volume between the surface height and the
/// extrusion height.
///
/// Vertex layout: top cap grid (when closed), bottom cap grid (when
/// closed), then the wall ring as alternating top/bottom pairs along the
/// grid perimeter. The bottom cap winds in reverse so both caps face out
/// of the volume.
pub(crate) fn tessellate(
    options: &TessellationOptions,
    params: &GridParams,
    extruded_height: f64,
) -> Result<Geometry, TessellationError> {
    let width = params.width;
    let height = params.height;
    let grid_count = width * height;

    let top_height = options.height.max(extruded_height);
    let bottom_height = options.height.min(extruded_height);

    // Sample both height layers over the full grid; caps index into these,
    // walls pick out the perimeter, and the bounding sphere covers both.
    let top_grid: Vec<SurfaceSample> = (0..grid_count)
        .map(|i| sample_surface(options, params, i / width, i % width, top_height))
        .collect();
    let bottom_grid: Vec<SurfaceSample> = (0..grid_count)
        .map(|i| sample_surface(options, params, i / width, i % width, bottom_height))
        .collect();

    let perimeter = params.perimeter();
    let ring_count = 2 * perimeter.len();

    let cap_vertices = grid_count
        * (usize::from(options.close_top) + usize::from(options.close_bottom));
    let mut builder =
        VertexBuilder::with_capacity(options.vertex_format, cap_vertices + ring_count);
    let mut indices = Vec::new();

    if options.close_top {
        let base = builder.vertex_count() as u32;
        for sample in &top_grid {
            builder.push(sample.position, sample.normal, sample.tangent, sample.st);
        }
        push_cap_indices(&mut indices, base, width, height, false);
    }

    if options.close_bottom {
        let base = builder.vertex_count() as u32;
        for sample in &bottom_grid {
            // The bottom cap faces away from the surface; the binormal
            // flips with it since it is derived from the normal.
            builder.push(sample.position, -sample.normal, sample.tangent, sample.st);
        }
        push_cap_indices(&mut indices, base, width, height, true);
    }

    push_walls(
        &mut builder,
        &mut indices,
        &perimeter,
        &top_grid,
        &bottom_grid,
        width,
    );

    let top_sphere =
        BoundingSphere::from_points(&top_grid.iter().map(|s| s.position).collect::<Vec<_>>());
    let bottom_sphere =
        BoundingSphere::from_points(&bottom_grid.iter().map(|s| s.position).collect::<Vec<_>>());

    Ok(builder.into_geometry(indices, top_sphere.union(&bottom_sphere)))
}

/// Grid triangulation for a cap, offset by `base` into the vertex buffer.
fn push_cap_indices(indices: &mut Vec<u32>, base: u32, width: usize, height: usize, reverse: bool) {
    for row in 0..height - 1 {
        for col in 0..width - 1 {
            let upper_left = base + (row * width + col) as u32;
            let lower_left = upper_left + width as u32;
            push_quad_indices(
                indices,
                upper_left,
                lower_left,
                upper_left + 1,
                lower_left + 1,
                reverse,
            );
        }
    }
}

/// Builds the wall ring along the grid perimeter.
///
/// Every perimeter sample becomes a top/bottom vertex pair. Wall normals
/// are per segment, `geodetic_up × edge`, so each wall face is flat; a
/// zero-length segment (the duplicated corner points of the perimeter
/// walk) takes the next non-degenerate segment's normal instead of
/// deriving one from a zero-length edge, and emits no triangles.
fn push_walls(
    builder: &mut VertexBuilder,
    indices: &mut Vec<u32>,
    perimeter: &[(usize, usize)],
    top_grid: &[SurfaceSample],
    bottom_grid: &[SurfaceSample],
    width: usize,
) {
    let count = perimeter.len();
    let grid_index = |(row, col): (usize, usize)| row * width + col;

    // Per-segment normals and tangents; None marks a degenerate segment.
    let mut segment_frames: Vec<Option<(DVec3, DVec3)>> = Vec::with_capacity(count);
    for i in 0..count {
        let here = &top_grid[grid_index(perimeter[i])];
        let next = &top_grid[grid_index(perimeter[(i + 1) % count])];
        let edge = next.position - here.position;
        if edge.length() <= WALL_DEGENERATE_TOLERANCE {
            segment_frames.push(None);
        } else {
            let tangent = edge.normalize();
            let normal = here.normal.cross(tangent).normalize();
            segment_frames.push(Some((normal, tangent)));
        }
    }

    // Resolve each vertex's frame to the next non-degenerate segment.
    let resolve = |start: usize| -> (DVec3, DVec3) {
        for offset in 0..count {
            if let Some(frame) = segment_frames[(start + offset) % count] {
                return frame;
            }
        }
        // A perimeter with no non-degenerate segment would need a fully
        // collapsed extent, which validation rejects.
        (DVec3::Z, DVec3::X)
    };

    let wall_base = builder.vertex_count() as u32;
    for (i, &cell) in perimeter.iter().enumerate() {
        let (normal, tangent) = resolve(i);
        let u = i as f64 / (count - 1) as f64;
        let top = &top_grid[grid_index(cell)];
        let bottom = &bottom_grid[grid_index(cell)];
        builder.push(top.position, normal, tangent, DVec2::new(u, 1.0));
        builder.push(bottom.position, normal, tangent, DVec2::new(u, 0.0));
    }

    for i in 0..count {
        if segment_frames[i].is_none() {
            continue;
        }
        let j = (i + 1) % count;
        let top_i = wall_base + 2 * i as u32;
        let bottom_i = top_i + 1;
        let top_j = wall_base + 2 * j as u32;
        let bottom_j = top_j + 1;
        // Reversed relative to the cap quads: wall quads are viewed from
        // outside the volume, not from above.
        push_quad_indices(indices, top_i, bottom_i, top_j, bottom_j, true);
    }
}
