//! Per-vertex attribute derivation: normals from triangle faces, tangent
//! frames from texture-coordinate gradients.

use glam::DVec3;
use tellus_geometry::{
    AttributeSemantic, AttributeValues, Geometry, GeometryAttribute, PrimitiveTopology,
};

use crate::error::PipelineError;

fn require_attribute(
    geometry: &Geometry,
    semantic: AttributeSemantic,
) -> Result<(), PipelineError> {
    if geometry.attributes.contains_key(&semantic) {
        Ok(())
    } else {
        Err(PipelineError::MissingAttribute { semantic })
    }
}

fn require_triangles(geometry: &Geometry, operation: &'static str) -> Result<(), PipelineError> {
    if geometry.primitive_topology != PrimitiveTopology::Triangles {
        return Err(PipelineError::UnsupportedTopology {
            topology: geometry.primitive_topology,
            operation,
        });
    }
    if geometry.indices.is_none() {
        return Err(PipelineError::MissingIndices);
    }
    Ok(())
}

/// Derives a per-vertex normal attribute by accumulating the unit normals
/// of every incident triangle and renormalizing.
///
/// Vertices referenced by no triangle (or only by degenerate ones) fall
/// back to `+z`. Replaces any existing normal attribute.
pub fn compute_normal(geometry: &mut Geometry) -> Result<(), PipelineError> {
    require_triangles(geometry, "compute_normal")?;
    require_attribute(geometry, AttributeSemantic::Position)?;

    let vertex_count = geometry.vertex_count();
    let indices = geometry.indices.as_ref().expect("checked above");

    let mut accumulated = vec![DVec3::ZERO; vertex_count];
    for triangle in indices.chunks_exact(3) {
        let p0 = geometry.position(triangle[0] as usize);
        let p1 = geometry.position(triangle[1] as usize);
        let p2 = geometry.position(triangle[2] as usize);

        let face = (p1 - p0).cross(p2 - p0);
        if face.length_squared() == 0.0 {
            continue;
        }
        let face = face.normalize();
        for &index in triangle {
            accumulated[index as usize] += face;
        }
    }

    let mut normals = Vec::with_capacity(vertex_count * 3);
    for sum in accumulated {
        let normal = if sum.length_squared() > 0.0 {
            sum.normalize()
        } else {
            DVec3::Z
        };
        normals.extend_from_slice(&[normal.x as f32, normal.y as f32, normal.z as f32]);
    }

    geometry.attributes.insert(
        AttributeSemantic::Normal,
        GeometryAttribute::new(3, AttributeValues::F32(normals)),
    );
    Ok(())
}

/// Derives tangent and binormal attributes from texture-coordinate
/// gradients (Lengyel's method), projected into each vertex's normal plane.
///
/// Requires position, normal, and st attributes plus triangle indices.
/// Replaces any existing tangent/binormal attributes.
pub fn compute_tangent_and_binormal(geometry: &mut Geometry) -> Result<(), PipelineError> {
    require_triangles(geometry, "compute_tangent_and_binormal")?;
    require_attribute(geometry, AttributeSemantic::Position)?;
    require_attribute(geometry, AttributeSemantic::Normal)?;
    require_attribute(geometry, AttributeSemantic::St)?;

    let vertex_count = geometry.vertex_count();
    let indices = geometry.indices.as_ref().expect("checked above");
    let st = &geometry.attributes[&AttributeSemantic::St];
    let read_st = |i: usize| (st.values.get(i * 2), st.values.get(i * 2 + 1));

    let mut tangent_sums = vec![DVec3::ZERO; vertex_count];
    for triangle in indices.chunks_exact(3) {
        let i0 = triangle[0] as usize;
        let i1 = triangle[1] as usize;
        let i2 = triangle[2] as usize;

        let p0 = geometry.position(i0);
        let e1 = geometry.position(i1) - p0;
        let e2 = geometry.position(i2) - p0;

        let (u0, v0) = read_st(i0);
        let (u1, v1) = read_st(i1);
        let (u2, v2) = read_st(i2);
        let s1 = u1 - u0;
        let t1 = v1 - v0;
        let s2 = u2 - u0;
        let t2 = v2 - v0;

        let denominator = s1 * t2 - s2 * t1;
        if denominator.abs() < f64::EPSILON {
            // Degenerate st mapping for this face.
            continue;
        }
        let r = 1.0 / denominator;
        let s_direction = (e1 * t2 - e2 * t1) * r;

        for &index in triangle {
            tangent_sums[index as usize] += s_direction;
        }
    }

    let normal_attribute = &geometry.attributes[&AttributeSemantic::Normal];
    let mut tangents = Vec::with_capacity(vertex_count * 3);
    let mut binormals = Vec::with_capacity(vertex_count * 3);
    for i in 0..vertex_count {
        let n = DVec3::new(
            normal_attribute.values.get(i * 3),
            normal_attribute.values.get(i * 3 + 1),
            normal_attribute.values.get(i * 3 + 2),
        );

        // Gram-Schmidt: remove the normal component, fall back to any
        // vector orthogonal to n for unmapped vertices.
        let raw = tangent_sums[i];
        let projected = raw - n * n.dot(raw);
        let tangent = if projected.length_squared() > 0.0 {
            projected.normalize()
        } else {
            n.any_orthonormal_vector()
        };
        let binormal = n.cross(tangent);

        tangents.extend_from_slice(&[tangent.x as f32, tangent.y as f32, tangent.z as f32]);
        binormals.extend_from_slice(&[binormal.x as f32, binormal.y as f32, binormal.z as f32]);
    }

    geometry.attributes.insert(
        AttributeSemantic::Tangent,
        GeometryAttribute::new(3, AttributeValues::F32(tangents)),
    );
    geometry.attributes.insert(
        AttributeSemantic::Binormal,
        GeometryAttribute::new(3, AttributeValues::F32(binormals)),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    /// Two triangles forming a unit quad in the xy plane.
    fn quad_geometry() -> Geometry {
        let mut attributes = BTreeMap::new();
        attributes.insert(
            AttributeSemantic::Position,
            GeometryAttribute::new(
                3,
                AttributeValues::F64(vec![
                    0.0, 0.0, 0.0, //
                    1.0, 0.0, 0.0, //
                    1.0, 1.0, 0.0, //
                    0.0, 1.0, 0.0,
                ]),
            ),
        );
        attributes.insert(
            AttributeSemantic::St,
            GeometryAttribute::new(
                2,
                AttributeValues::F32(vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0]),
            ),
        );
        Geometry::new(
            attributes,
            Some(vec![0, 1, 2, 0, 2, 3]),
            PrimitiveTopology::Triangles,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_compute_normal_for_planar_quad() {
        let mut geometry = quad_geometry();
        compute_normal(&mut geometry).unwrap();
        let normals = &geometry.attributes[&AttributeSemantic::Normal];
        for i in 0..4 {
            assert!((normals.values.get(i * 3 + 2) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_compute_normal_requires_triangles() {
        let mut geometry = quad_geometry();
        geometry.primitive_topology = PrimitiveTopology::Lines;
        assert!(matches!(
            compute_normal(&mut geometry),
            Err(PipelineError::UnsupportedTopology { .. })
        ));
    }

    #[test]
    fn test_tangent_follows_st_gradient() {
        let mut geometry = quad_geometry();
        compute_normal(&mut geometry).unwrap();
        compute_tangent_and_binormal(&mut geometry).unwrap();

        let tangents = &geometry.attributes[&AttributeSemantic::Tangent];
        let binormals = &geometry.attributes[&AttributeSemantic::Binormal];
        for i in 0..4 {
            // st.u grows with +x, so the tangent is +x and binormal +y.
            assert!((tangents.values.get(i * 3) - 1.0).abs() < 1e-6);
            assert!((binormals.values.get(i * 3 + 1) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_tangent_requires_st() {
        let mut geometry = quad_geometry();
        compute_normal(&mut geometry).unwrap();
        geometry.attributes.remove(&AttributeSemantic::St);
        assert!(matches!(
            compute_tangent_and_binormal(&mut geometry),
            Err(PipelineError::MissingAttribute {
                semantic: AttributeSemantic::St
            })
        ));
    }
}
