//! Antimeridian splitting.
//!
//! In this coordinate convention the antimeridian is the half-plane
//! `x < 0, y = 0`. Primitives crossing it in a linear (non-wrapped)
//! longitude frame render as a band around the whole globe unless they are
//! split against the `y = 0` plane first.

use glam::DVec3;
use tellus_geometry::{AttributeSemantic, Geometry, GeometryAttribute, PrimitiveTopology};

use crate::error::PipelineError;

/// Vertices closer than this to the split plane are nudged off it before
/// classification, so no output edge is degenerate.
pub const PLANE_OFFSET_EPSILON: f64 = 1e-6;

/// Splits triangles and line segments that cross the antimeridian.
///
/// Skips the whole pass when the bounding sphere shows the mesh cannot
/// straddle the plane (entirely in `x > 0`, or not touching `y = 0`).
/// Topologies other than [`PrimitiveTopology::Triangles`] and
/// [`PrimitiveTopology::Lines`] pass through unchanged. An unindexed
/// geometry gains sequential indices before splitting.
pub fn wrap_longitude(geometry: Geometry) -> Result<Geometry, PipelineError> {
    if let Some(sphere) = geometry.bounding_sphere {
        let entirely_east = sphere.center.x - sphere.radius > 0.0;
        let off_plane = sphere.center.y.abs() > sphere.radius;
        if entirely_east || off_plane {
            return Ok(geometry);
        }
    }

    match geometry.primitive_topology {
        PrimitiveTopology::Triangles => wrap_triangles(geometry),
        PrimitiveTopology::Lines => wrap_lines(geometry),
        _ => Ok(geometry),
    }
}

/// Rewrites a geometry by appending vertices copied or interpolated from
/// existing ones, keeping every attribute buffer in step.
struct VertexAppender {
    geometry: Geometry,
}

impl VertexAppender {
    fn position(&self, index: usize) -> DVec3 {
        self.geometry.position(index)
    }

    /// Appends a copy of vertex `source` with its position replaced.
    fn push_moved(&mut self, source: usize, position: DVec3) -> u32 {
        let new_index = self.geometry.vertex_count() as u32;
        for (semantic, attribute) in self.geometry.attributes.iter_mut() {
            let components = attribute.components_per_attribute;
            if *semantic == AttributeSemantic::Position {
                attribute.values.push(position.x);
                attribute.values.push(position.y);
                attribute.values.push(position.z);
            } else {
                for component in 0..components {
                    let value = attribute.values.get(source * components + component);
                    attribute.values.push(value);
                }
            }
        }
        new_index
    }

    /// Appends a vertex at `position` whose secondary attributes are the
    /// `weights`-blend of the three corner vertices.
    fn push_blended(&mut self, corners: [usize; 3], weights: DVec3, position: DVec3) -> u32 {
        let new_index = self.geometry.vertex_count() as u32;
        for (semantic, attribute) in self.geometry.attributes.iter_mut() {
            let components = attribute.components_per_attribute;
            if *semantic == AttributeSemantic::Position {
                attribute.values.push(position.x);
                attribute.values.push(position.y);
                attribute.values.push(position.z);
            } else {
                for component in 0..components {
                    let value = weights.x
                        * attribute.values.get(corners[0] * components + component)
                        + weights.y * attribute.values.get(corners[1] * components + component)
                        + weights.z * attribute.values.get(corners[2] * components + component);
                    attribute.values.push(value);
                }
            }
        }
        new_index
    }

    /// Appends a vertex at `position` linearly blended between two vertices.
    fn push_lerped(&mut self, a: usize, b: usize, t: f64, position: DVec3) -> u32 {
        self.push_blended([a, b, a], DVec3::new(1.0 - t, t, 0.0), position)
    }
}

/// Moves a point off the split plane toward the side it was classified on.
fn offset_from_plane(mut point: DVec3, behind: bool) -> DVec3 {
    if point.y.abs() < PLANE_OFFSET_EPSILON {
        point.y = if behind {
            -PLANE_OFFSET_EPSILON
        } else {
            PLANE_OFFSET_EPSILON
        };
    }
    point
}

/// Barycentric coordinates of `point` with respect to a triangle.
fn barycentric_coordinates(point: DVec3, a: DVec3, b: DVec3, c: DVec3) -> DVec3 {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = point - a;
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denominator = d00 * d11 - d01 * d01;
    let v = (d11 * d20 - d01 * d21) / denominator;
    let w = (d00 * d21 - d01 * d20) / denominator;
    DVec3::new(1.0 - v - w, v, w)
}

/// Intersection of segment `a -> b` with the `y = 0` plane, as the
/// parameter `t` and the point.
fn plane_intersection(a: DVec3, b: DVec3) -> (f64, DVec3) {
    let t = a.y / (a.y - b.y);
    (t, a + (b - a) * t)
}

fn ensure_indices(geometry: &mut Geometry) {
    if geometry.indices.is_none() {
        geometry.indices = Some((0..geometry.vertex_count() as u32).collect());
    }
}

fn wrap_triangles(mut geometry: Geometry) -> Result<Geometry, PipelineError> {
    if !geometry
        .attributes
        .contains_key(&AttributeSemantic::Position)
    {
        return Err(PipelineError::MissingAttribute {
            semantic: AttributeSemantic::Position,
        });
    }
    ensure_indices(&mut geometry);
    let indices = geometry.indices.take().expect("ensured above");

    let mut appender = VertexAppender { geometry };
    let mut output = Vec::with_capacity(indices.len());

    for triangle in indices.chunks_exact(3) {
        let corners = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        let raw = [
            appender.position(corners[0]),
            appender.position(corners[1]),
            appender.position(corners[2]),
        ];

        // A triangle can only straddle the antimeridian if it reaches the
        // x < 0 half-space; crossings entirely at x > 0 are the prime
        // meridian and need no split.
        let near_antimeridian = raw.iter().any(|p| p.x < 0.0);
        let behind: Vec<bool> = raw.iter().map(|p| p.y < 0.0).collect();
        let num_behind = behind.iter().filter(|&&b| b).count();

        if !near_antimeridian || num_behind == 0 || num_behind == 3 {
            output.extend_from_slice(triangle);
            continue;
        }

        // Rotate the corner order so the lone vertex (behind or in front)
        // comes first; splitting is symmetric either way.
        let lone = if num_behind == 1 {
            behind.iter().position(|&b| b).expect("one behind")
        } else {
            behind.iter().position(|&b| !b).expect("one in front")
        };
        let i0 = corners[lone];
        let i1 = corners[(lone + 1) % 3];
        let i2 = corners[(lone + 2) % 3];
        let q0 = offset_from_plane(raw[lone], behind[lone]);
        let q1 = offset_from_plane(raw[(lone + 1) % 3], behind[(lone + 1) % 3]);
        let q2 = offset_from_plane(raw[(lone + 2) % 3], behind[(lone + 2) % 3]);

        let (_, u1) = plane_intersection(q0, q1);
        let (_, u2) = plane_intersection(q2, q0);

        let blend = |appender: &mut VertexAppender, point: DVec3| {
            let weights = barycentric_coordinates(point, raw[0], raw[1], raw[2]);
            appender.push_blended(corners, weights, point)
        };

        let n0 = appender.push_moved(i0, q0);
        let n1 = appender.push_moved(i1, q1);
        let n2 = appender.push_moved(i2, q2);
        let nu1 = blend(&mut appender, u1);
        let nu2 = blend(&mut appender, u2);

        // Lone-vertex side: one triangle. Far side: a quad, two triangles.
        output.extend_from_slice(&[n0, nu1, nu2]);
        output.extend_from_slice(&[nu1, n1, n2]);
        output.extend_from_slice(&[nu1, n2, nu2]);
    }

    appender.geometry.indices = Some(output);
    Ok(appender.geometry)
}

fn wrap_lines(mut geometry: Geometry) -> Result<Geometry, PipelineError> {
    if !geometry
        .attributes
        .contains_key(&AttributeSemantic::Position)
    {
        return Err(PipelineError::MissingAttribute {
            semantic: AttributeSemantic::Position,
        });
    }
    ensure_indices(&mut geometry);
    let indices = geometry.indices.take().expect("ensured above");

    let mut appender = VertexAppender { geometry };
    let mut output = Vec::with_capacity(indices.len());

    for segment in indices.chunks_exact(2) {
        let ia = segment[0] as usize;
        let ib = segment[1] as usize;
        let pa = appender.position(ia);
        let pb = appender.position(ib);

        let crosses_antimeridian =
            (pa.x < 0.0 || pb.x < 0.0) && (pa.y < 0.0) != (pb.y < 0.0);
        if !crosses_antimeridian {
            output.extend_from_slice(segment);
            continue;
        }

        let qa = offset_from_plane(pa, pa.y < 0.0);
        let qb = offset_from_plane(pb, pb.y < 0.0);
        let (t, intersection) = plane_intersection(qa, qb);

        // Two coincident-but-offset points straddling the plane keep each
        // half on its own side of the discontinuity.
        let toward_a = offset_from_plane(intersection, qa.y < 0.0);
        let toward_b = offset_from_plane(intersection, qb.y < 0.0);

        let na = appender.push_moved(ia, qa);
        let nb = appender.push_moved(ib, qb);
        let ni_a = appender.push_lerped(ia, ib, t, toward_a);
        let ni_b = appender.push_lerped(ia, ib, t, toward_b);

        output.extend_from_slice(&[na, ni_a]);
        output.extend_from_slice(&[ni_b, nb]);
    }

    appender.geometry.indices = Some(output);
    Ok(appender.geometry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tellus_geometry::{AttributeValues, BoundingSphere};

    fn triangle_geometry(positions: Vec<f64>, indices: Vec<u32>) -> Geometry {
        let mut attributes = BTreeMap::new();
        let vertex_count = positions.len() / 3;
        attributes.insert(
            AttributeSemantic::Position,
            GeometryAttribute::new(3, AttributeValues::F64(positions)),
        );
        attributes.insert(
            AttributeSemantic::St,
            GeometryAttribute::new(
                2,
                AttributeValues::F32((0..vertex_count * 2).map(|i| i as f32).collect()),
            ),
        );
        Geometry::new(attributes, Some(indices), PrimitiveTopology::Triangles, None).unwrap()
    }

    /// Longitudes 170°, -170°, 0° at the equator on a unit sphere.
    fn straddling_triangle() -> Geometry {
        let lon = |degrees: f64| {
            let r = degrees.to_radians();
            [r.cos(), r.sin(), 0.0]
        };
        let mut positions = Vec::new();
        positions.extend_from_slice(&lon(170.0));
        positions.extend_from_slice(&lon(-170.0));
        positions.extend_from_slice(&lon(0.0));
        triangle_geometry(positions, vec![0, 1, 2])
    }

    fn no_triangle_straddles(geometry: &Geometry) {
        let indices = geometry.indices.as_ref().unwrap();
        for triangle in indices.chunks_exact(3) {
            let ys: Vec<f64> = triangle
                .iter()
                .map(|&i| geometry.position(i as usize))
                .filter(|p| p.x < 0.0)
                .map(|p| p.y)
                .collect();
            let has_negative = ys.iter().any(|&y| y < 0.0);
            let has_positive = ys.iter().any(|&y| y > 0.0);
            assert!(
                !(has_negative && has_positive),
                "triangle {triangle:?} still straddles the antimeridian"
            );
        }
    }

    #[test]
    fn test_straddling_triangle_is_split() {
        let geometry = straddling_triangle();
        let wrapped = wrap_longitude(geometry).unwrap();
        let indices = wrapped.indices.as_ref().unwrap();
        assert!(indices.len() / 3 >= 2, "expected at least 2 triangles");
        no_triangle_straddles(&wrapped);
    }

    #[test]
    fn test_non_straddling_triangle_passes_through() {
        let geometry = triangle_geometry(
            vec![1.0, 0.1, 0.0, 1.0, 0.2, 0.1, 1.0, 0.1, 0.2],
            vec![0, 1, 2],
        );
        let wrapped = wrap_longitude(geometry).unwrap();
        assert_eq!(wrapped.indices.as_ref().unwrap().len(), 3);
        assert_eq!(wrapped.vertex_count(), 3);
    }

    #[test]
    fn test_bounding_sphere_east_of_plane_skips_pass() {
        let mut geometry = straddling_triangle();
        // A (deliberately wrong) sphere entirely in x > 0 disables the pass.
        geometry.bounding_sphere = Some(BoundingSphere::new(DVec3::new(5.0, 0.0, 0.0), 1.0));
        let wrapped = wrap_longitude(geometry).unwrap();
        assert_eq!(wrapped.indices.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn test_split_interpolates_attributes() {
        let wrapped = wrap_longitude(straddling_triangle()).unwrap();
        let st = &wrapped.attributes[&AttributeSemantic::St];
        // Original st values were 0..6; every interpolated value must stay
        // inside the convex hull of the corners.
        for i in 0..wrapped.vertex_count() {
            for component in 0..2 {
                let value = st.values.get(i * 2 + component);
                assert!(
                    (0.0..=5.0).contains(&value),
                    "st component {value} outside corner hull"
                );
            }
        }
    }

    #[test]
    fn test_vertex_on_plane_is_nudged() {
        // One vertex exactly on the plane, others on both sides, all x < 0.
        let geometry = triangle_geometry(
            vec![-1.0, 0.0, 0.0, -1.0, 0.2, 0.0, -1.0, -0.2, 0.1],
            vec![0, 1, 2],
        );
        let wrapped = wrap_longitude(geometry).unwrap();
        no_triangle_straddles(&wrapped);
        let indices = wrapped.indices.as_ref().unwrap();
        for &i in indices {
            let p = wrapped.position(i as usize);
            assert!(p.y != 0.0, "vertex {i} still sits on the plane");
        }
    }

    #[test]
    fn test_line_crossing_is_split_into_two_segments() {
        let mut attributes = BTreeMap::new();
        attributes.insert(
            AttributeSemantic::Position,
            GeometryAttribute::new(
                3,
                AttributeValues::F64(vec![-1.0, 0.3, 0.0, -1.0, -0.3, 0.0]),
            ),
        );
        let geometry = Geometry::new(
            attributes,
            Some(vec![0, 1]),
            PrimitiveTopology::Lines,
            None,
        )
        .unwrap();

        let wrapped = wrap_longitude(geometry).unwrap();
        let indices = wrapped.indices.as_ref().unwrap();
        assert_eq!(indices.len(), 4, "expected two segments");

        // The two inserted points are coincident up to the plane offset.
        let mid_a = wrapped.position(indices[1] as usize);
        let mid_b = wrapped.position(indices[2] as usize);
        assert!((mid_a - mid_b).length() <= 2.0 * PLANE_OFFSET_EPSILON + 1e-12);
        assert!(mid_a.y < 0.0 || mid_b.y < 0.0);
        assert!(mid_a.y.signum() != mid_b.y.signum());
    }

    #[test]
    fn test_other_topologies_pass_through() {
        let mut geometry = straddling_triangle();
        geometry.primitive_topology = PrimitiveTopology::TriangleStrip;
        let wrapped = wrap_longitude(geometry).unwrap();
        assert_eq!(wrapped.vertex_count(), 3);
    }
}
