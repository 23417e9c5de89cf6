//! Multi-instance combination.

use glam::{DMat3, DMat4, DVec3};
use tellus_geometry::{
    AttributeSemantic, BoundingSphere, Geometry, GeometryAttribute, GeometryInstance,
};
use tracing::debug;

use crate::error::PipelineError;

/// Bakes an instance's model matrix into its geometry.
///
/// Positions transform by the full matrix; normals, tangents, and binormals
/// by the inverse-transpose of its rotation/scale part, renormalized. The
/// bounding sphere center transforms with the matrix and the radius scales
/// by the largest axis scale. The instance's matrix resets to identity, so
/// transformed instances satisfy [`combine`]'s shared-matrix precondition.
pub fn transform_to_world_coordinates(
    instance: &mut GeometryInstance,
) -> Result<(), PipelineError> {
    if instance.model_matrix == DMat4::IDENTITY {
        return Ok(());
    }

    let matrix = instance.model_matrix;
    let rotation = DMat3::from_mat4(matrix);
    if rotation.determinant() == 0.0 {
        return Err(PipelineError::NonInvertibleMatrix);
    }
    let normal_matrix = rotation.inverse().transpose();

    enum Kind {
        Point,
        Direction,
    }

    for (semantic, attribute) in instance.geometry.attributes.iter_mut() {
        let kind = match semantic {
            AttributeSemantic::Position => Kind::Point,
            AttributeSemantic::Normal
            | AttributeSemantic::Tangent
            | AttributeSemantic::Binormal => Kind::Direction,
            AttributeSemantic::St | AttributeSemantic::Color => continue,
        };

        let components = attribute.components_per_attribute;
        for vertex in 0..attribute.vertex_count() {
            let base = vertex * components;
            let v = DVec3::new(
                attribute.values.get(base),
                attribute.values.get(base + 1),
                attribute.values.get(base + 2),
            );
            let v = match kind {
                Kind::Point => matrix.transform_point3(v),
                Kind::Direction => (normal_matrix * v).normalize(),
            };
            attribute.values.set(base, v.x);
            attribute.values.set(base + 1, v.y);
            attribute.values.set(base + 2, v.z);
        }
    }

    if let Some(sphere) = &mut instance.geometry.bounding_sphere {
        let scale = rotation
            .x_axis
            .length()
            .max(rotation.y_axis.length())
            .max(rotation.z_axis.length());
        *sphere = BoundingSphere::new(matrix.transform_point3(sphere.center), sphere.radius * scale);
    }

    instance.model_matrix = DMat4::IDENTITY;
    Ok(())
}

/// Combines instances into one geometry.
///
/// Preconditions: at least one instance; all instances share one primitive
/// topology, one index-buffer status, and one model matrix (transform them
/// into a common frame first — see [`transform_to_world_coordinates`]).
///
/// Per-instance constant attributes are expanded to per-vertex attributes,
/// then only the attribute semantics present in *every* instance survive;
/// the rest are dropped. Attribute buffers concatenate in instance order
/// and indices re-base by the running vertex count. The combined bounding
/// sphere is the average of the instance sphere centers, expanded to cover
/// every instance sphere (`None` when any instance lacks one).
pub fn combine(instances: &[GeometryInstance]) -> Result<Geometry, PipelineError> {
    let Some(first) = instances.first() else {
        return Err(PipelineError::NoInstances);
    };

    let topology = first.geometry.primitive_topology;
    let has_indices = first.geometry.indices.is_some();
    for instance in instances {
        if instance.geometry.primitive_topology != topology {
            return Err(PipelineError::MismatchedTopology);
        }
        if instance.geometry.indices.is_some() != has_indices {
            return Err(PipelineError::MismatchedIndexStatus);
        }
        if instance.model_matrix != first.model_matrix {
            return Err(PipelineError::MismatchedModelMatrix);
        }
    }

    // Expand per-instance constants into per-vertex attributes so they
    // concatenate like any other attribute.
    let expanded: Vec<Geometry> = instances
        .iter()
        .map(|instance| {
            let mut geometry = instance.geometry.clone();
            let vertex_count = geometry.vertex_count();
            for (semantic, attribute) in &instance.attributes {
                geometry
                    .attributes
                    .insert(*semantic, attribute.expand(vertex_count));
            }
            geometry
        })
        .collect();

    // Keep only the semantics every instance carries.
    let shared: Vec<AttributeSemantic> = expanded[0]
        .attributes
        .keys()
        .copied()
        .filter(|semantic| expanded.iter().all(|g| g.attributes.contains_key(semantic)))
        .collect();
    let dropped = expanded[0].attributes.len() - shared.len();
    if dropped > 0 {
        debug!(dropped, "dropping attributes not present in every instance");
    }

    let mut attributes = std::collections::BTreeMap::new();
    for semantic in shared {
        let template = &expanded[0].attributes[&semantic];
        let mut values = template.values.empty_like();
        for geometry in &expanded {
            values.extend_from(&geometry.attributes[&semantic].values)?;
        }
        attributes.insert(
            semantic,
            GeometryAttribute {
                components_per_attribute: template.components_per_attribute,
                normalize: template.normalize,
                values,
            },
        );
    }

    let indices = if has_indices {
        let total: usize = expanded
            .iter()
            .map(|g| g.indices.as_ref().map_or(0, Vec::len))
            .sum();
        let mut combined = Vec::with_capacity(total);
        let mut offset = 0u32;
        for geometry in &expanded {
            let instance_indices = geometry.indices.as_ref().expect("status checked above");
            combined.extend(instance_indices.iter().map(|&index| index + offset));
            offset += geometry.vertex_count() as u32;
        }
        Some(combined)
    } else {
        None
    };

    let bounding_sphere = combine_bounding_spheres(&expanded);

    Ok(Geometry::new(
        attributes,
        indices,
        topology,
        bounding_sphere,
    )?)
}

/// Average of the instance sphere centers, expanded to cover each sphere.
fn combine_bounding_spheres(geometries: &[Geometry]) -> Option<BoundingSphere> {
    let spheres: Vec<BoundingSphere> = geometries
        .iter()
        .map(|g| g.bounding_sphere)
        .collect::<Option<Vec<_>>>()?;

    let center = spheres
        .iter()
        .fold(DVec3::ZERO, |sum, sphere| sum + sphere.center)
        / spheres.len() as f64;
    let radius = spheres
        .iter()
        .map(|sphere| center.distance(sphere.center) + sphere.radius)
        .fold(0.0_f64, f64::max);

    Some(BoundingSphere::new(center, radius))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tellus_geometry::{AttributeValues, InstanceAttribute, PrimitiveTopology};

    fn grid_instance(vertex_count: usize, with_st: bool) -> GeometryInstance {
        let mut attributes = BTreeMap::new();
        let positions: Vec<f64> = (0..vertex_count * 3).map(|i| i as f64).collect();
        attributes.insert(
            AttributeSemantic::Position,
            GeometryAttribute::new(3, AttributeValues::F64(positions)),
        );
        if with_st {
            attributes.insert(
                AttributeSemantic::St,
                GeometryAttribute::new(2, AttributeValues::F32(vec![0.5; vertex_count * 2])),
            );
        }
        let indices: Vec<u32> = (0..vertex_count as u32).collect();
        let geometry = Geometry::new(
            attributes,
            Some(indices),
            PrimitiveTopology::Triangles,
            Some(BoundingSphere::new(DVec3::ZERO, 1.0)),
        )
        .unwrap();
        GeometryInstance::new(geometry)
    }

    #[test]
    fn test_combine_concatenates_vertices_and_rebases_indices() {
        let combined = combine(&[grid_instance(10, true), grid_instance(5, true)]).unwrap();
        assert_eq!(combined.vertex_count(), 15);
        let indices = combined.indices.as_ref().unwrap();
        assert_eq!(indices.len(), 15);
        assert_eq!(*indices.iter().max().unwrap(), 14);
    }

    #[test]
    fn test_combine_drops_attributes_missing_from_any_instance() {
        let combined = combine(&[grid_instance(6, true), grid_instance(3, false)]).unwrap();
        assert!(combined.attributes.contains_key(&AttributeSemantic::Position));
        assert!(!combined.attributes.contains_key(&AttributeSemantic::St));
    }

    #[test]
    fn test_combine_rejects_empty_input() {
        assert!(matches!(combine(&[]), Err(PipelineError::NoInstances)));
    }

    #[test]
    fn test_combine_rejects_mixed_topology() {
        let a = grid_instance(3, false);
        let mut b = grid_instance(3, false);
        b.geometry.primitive_topology = PrimitiveTopology::Lines;
        assert!(matches!(
            combine(&[a, b]),
            Err(PipelineError::MismatchedTopology)
        ));
    }

    #[test]
    fn test_combine_rejects_mixed_index_status() {
        let a = grid_instance(3, false);
        let mut b = grid_instance(3, false);
        b.geometry.indices = None;
        assert!(matches!(
            combine(&[a, b]),
            Err(PipelineError::MismatchedIndexStatus)
        ));
    }

    #[test]
    fn test_combine_rejects_mixed_model_matrices() {
        let a = grid_instance(3, false);
        let b = grid_instance(3, false)
            .with_model_matrix(DMat4::from_translation(DVec3::new(1.0, 0.0, 0.0)));
        assert!(matches!(
            combine(&[a, b]),
            Err(PipelineError::MismatchedModelMatrix)
        ));
    }

    #[test]
    fn test_combine_expands_instance_colors() {
        let a = grid_instance(4, false)
            .with_attribute(AttributeSemantic::Color, InstanceAttribute::color(255, 0, 0, 255));
        let b = grid_instance(2, false)
            .with_attribute(AttributeSemantic::Color, InstanceAttribute::color(0, 255, 0, 255));
        let combined = combine(&[a, b]).unwrap();
        let colors = &combined.attributes[&AttributeSemantic::Color];
        assert_eq!(colors.vertex_count(), 6);
        assert_eq!(colors.values.get(0), 255.0);
        assert_eq!(colors.values.get(4 * 4 + 1), 255.0, "second instance green");
    }

    #[test]
    fn test_combined_bounding_sphere_covers_instances() {
        let mut a = grid_instance(3, false);
        a.geometry.bounding_sphere = Some(BoundingSphere::new(DVec3::new(-4.0, 0.0, 0.0), 1.0));
        let mut b = grid_instance(3, false);
        b.geometry.bounding_sphere = Some(BoundingSphere::new(DVec3::new(6.0, 0.0, 0.0), 2.0));
        let combined = combine(&[a, b]).unwrap();
        let sphere = combined.bounding_sphere.unwrap();
        assert!(sphere.contains(DVec3::new(-5.0, 0.0, 0.0), 1e-9));
        assert!(sphere.contains(DVec3::new(8.0, 0.0, 0.0), 1e-9));
    }

    /// End to end: two tessellated extents combine into one mesh whose
    /// sphere covers both patches.
    #[test]
    fn test_combine_two_tessellated_extents() {
        use tellus_geodesy::{Ellipsoid, GeoExtent};
        use tellus_tessellate::{TessellationOptions, tessellate_extent};

        let tessellate = |west: f64, east: f64| {
            let options = TessellationOptions {
                extent: GeoExtent::from_degrees(west, -10.0, east, 10.0),
                ellipsoid: Ellipsoid::unit_sphere(),
                granularity: 10.0_f64.to_radians(),
                ..TessellationOptions::default()
            };
            tessellate_extent(&options).unwrap()
        };

        let left = tessellate(-30.0, -10.0);
        let right = tessellate(-10.0, 10.0);
        let vertex_total = left.vertex_count() + right.vertex_count();
        let index_total =
            left.indices.as_ref().unwrap().len() + right.indices.as_ref().unwrap().len();

        let combined =
            combine(&[GeometryInstance::new(left), GeometryInstance::new(right)]).unwrap();
        assert_eq!(combined.vertex_count(), vertex_total);
        let indices = combined.indices.as_ref().unwrap();
        assert_eq!(indices.len(), index_total);
        assert!(indices.iter().all(|&i| (i as usize) < vertex_total));

        let sphere = combined.bounding_sphere.unwrap();
        for i in 0..combined.vertex_count() {
            assert!(sphere.contains(combined.position(i), 1e-9));
        }
    }

    #[test]
    fn test_transform_to_world_bakes_matrix() {
        let mut instance = grid_instance(2, false)
            .with_model_matrix(DMat4::from_translation(DVec3::new(10.0, 0.0, 0.0)));
        let first_before = instance.geometry.position(0);
        transform_to_world_coordinates(&mut instance).unwrap();
        assert_eq!(instance.model_matrix, DMat4::IDENTITY);
        let first_after = instance.geometry.position(0);
        assert!((first_after - first_before - DVec3::new(10.0, 0.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_transform_rejects_singular_matrix() {
        let mut instance = grid_instance(2, false).with_model_matrix(DMat4::ZERO);
        assert!(matches!(
            transform_to_world_coordinates(&mut instance),
            Err(PipelineError::NonInvertibleMatrix)
        ));
    }
}
