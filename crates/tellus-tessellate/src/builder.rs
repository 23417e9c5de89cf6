//! Growable attribute buffers shared by the surface and extrusion paths.

use std::collections::BTreeMap;

use glam::{DVec2, DVec3};
use tellus_geometry::{
    AttributeSemantic, AttributeValues, BoundingSphere, Geometry, GeometryAttribute,
    PrimitiveTopology, VertexFormat,
};

/// Accumulates per-vertex attributes in the order vertices are emitted,
/// honoring the requested vertex format. Binormals are always derived as
/// `normal × tangent` so the tangent frame stays right-handed.
pub struct VertexBuilder {
    format: VertexFormat,
    positions: Vec<f64>,
    normals: Vec<f32>,
    tangents: Vec<f32>,
    binormals: Vec<f32>,
    sts: Vec<f32>,
}

impl VertexBuilder {
    /// Creates a builder with capacity for `vertex_count` vertices.
    #[must_use]
    pub fn with_capacity(format: VertexFormat, vertex_count: usize) -> Self {
        let cap3 = if format.position { vertex_count * 3 } else { 0 };
        Self {
            format,
            positions: Vec::with_capacity(cap3),
            normals: Vec::with_capacity(if format.normal { vertex_count * 3 } else { 0 }),
            tangents: Vec::with_capacity(if format.tangent { vertex_count * 3 } else { 0 }),
            binormals: Vec::with_capacity(if format.binormal { vertex_count * 3 } else { 0 }),
            sts: Vec::with_capacity(if format.st { vertex_count * 2 } else { 0 }),
        }
    }

    /// Emits one vertex. Attributes not requested by the format are ignored.
    pub fn push(&mut self, position: DVec3, normal: DVec3, tangent: DVec3, st: DVec2) {
        if self.format.position {
            self.positions
                .extend_from_slice(&[position.x, position.y, position.z]);
        }
        if self.format.normal {
            self.normals
                .extend_from_slice(&[normal.x as f32, normal.y as f32, normal.z as f32]);
        }
        if self.format.tangent {
            self.tangents
                .extend_from_slice(&[tangent.x as f32, tangent.y as f32, tangent.z as f32]);
        }
        if self.format.binormal {
            let binormal = normal.cross(tangent);
            self.binormals
                .extend_from_slice(&[binormal.x as f32, binormal.y as f32, binormal.z as f32]);
        }
        if self.format.st {
            self.sts.extend_from_slice(&[st.x as f32, st.y as f32]);
        }
    }

    /// Number of vertices emitted so far.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Finishes the geometry with the given indices and bounding sphere.
    #[must_use]
    pub fn into_geometry(
        self,
        indices: Vec<u32>,
        bounding_sphere: BoundingSphere,
    ) -> Geometry {
        let mut attributes = BTreeMap::new();
        if self.format.position {
            attributes.insert(
                AttributeSemantic::Position,
                GeometryAttribute::new(3, AttributeValues::F64(self.positions)),
            );
        }
        if self.format.normal {
            attributes.insert(
                AttributeSemantic::Normal,
                GeometryAttribute::new(3, AttributeValues::F32(self.normals)),
            );
        }
        if self.format.tangent {
            attributes.insert(
                AttributeSemantic::Tangent,
                GeometryAttribute::new(3, AttributeValues::F32(self.tangents)),
            );
        }
        if self.format.binormal {
            attributes.insert(
                AttributeSemantic::Binormal,
                GeometryAttribute::new(3, AttributeValues::F32(self.binormals)),
            );
        }
        if self.format.st {
            attributes.insert(
                AttributeSemantic::St,
                GeometryAttribute::new(2, AttributeValues::F32(self.sts)),
            );
        }

        Geometry::new(
            attributes,
            Some(indices),
            PrimitiveTopology::Triangles,
            Some(bounding_sphere),
        )
        .expect("builder emits equal-length attribute buffers")
    }
}

/// Appends the two triangles of one grid quad.
///
/// `upper_left`/`lower_left`/`upper_right`/`lower_right` are vertex indices;
/// `reverse` flips the winding (used for bottom caps viewed from below).
pub fn push_quad_indices(
    indices: &mut Vec<u32>,
    upper_left: u32,
    lower_left: u32,
    upper_right: u32,
    lower_right: u32,
    reverse: bool,
) {
    if reverse {
        indices.extend_from_slice(&[upper_left, upper_right, lower_left]);
        indices.extend_from_slice(&[upper_right, lower_right, lower_left]);
    } else {
        indices.extend_from_slice(&[upper_left, lower_left, upper_right]);
        indices.extend_from_slice(&[upper_right, lower_left, lower_right]);
    }
}
