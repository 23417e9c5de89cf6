//! The geometry container: attributes + indices + topology + bounds.

use std::collections::BTreeMap;

use glam::DVec3;

use crate::attribute::{AttributeSemantic, GeometryAttribute};
use crate::bounding_sphere::BoundingSphere;
use crate::error::GeometryError;

/// How the index (or vertex) stream is assembled into primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    /// Isolated points.
    Points,
    /// Isolated segments, two indices each.
    Lines,
    /// A closed loop of segments.
    LineLoop,
    /// A connected strip of segments.
    LineStrip,
    /// Isolated triangles, three indices each.
    Triangles,
    /// A connected strip of triangles.
    TriangleStrip,
    /// A fan of triangles sharing the first vertex.
    TriangleFan,
}

impl PrimitiveTopology {
    /// Indices consumed per primitive, for the topologies whose streams can
    /// be partitioned primitive-by-primitive. `None` for strips, loops, and
    /// fans, where primitives share indices.
    #[must_use]
    pub const fn vertices_per_primitive(self) -> Option<usize> {
        match self {
            Self::Points => Some(1),
            Self::Lines => Some(2),
            Self::Triangles => Some(3),
            Self::LineLoop | Self::LineStrip | Self::TriangleStrip | Self::TriangleFan => None,
        }
    }
}

/// A renderable mesh: named vertex attributes sharing one vertex count, an
/// optional index buffer, a primitive topology, and an optional bounding
/// sphere.
#[derive(Clone, Debug)]
pub struct Geometry {
    /// Vertex attributes keyed by semantic. Every attribute covers the same
    /// number of vertices; [`Geometry::new`] enforces this.
    pub attributes: BTreeMap<AttributeSemantic, GeometryAttribute>,
    /// Optional index buffer into the attributes.
    pub indices: Option<Vec<u32>>,
    /// How primitives are assembled.
    pub primitive_topology: PrimitiveTopology,
    /// Optional sphere enclosing every vertex position.
    pub bounding_sphere: Option<BoundingSphere>,
}

impl Geometry {
    /// Creates a geometry, checking the shared-vertex-count invariant and
    /// that every buffer length is a multiple of its component width.
    pub fn new(
        attributes: BTreeMap<AttributeSemantic, GeometryAttribute>,
        indices: Option<Vec<u32>>,
        primitive_topology: PrimitiveTopology,
        bounding_sphere: Option<BoundingSphere>,
    ) -> Result<Self, GeometryError> {
        let mut expected: Option<usize> = None;
        for (semantic, attribute) in &attributes {
            if attribute.values.len() % attribute.components_per_attribute != 0 {
                return Err(GeometryError::RaggedAttribute {
                    attribute: format!("{semantic:?}"),
                    len: attribute.values.len(),
                    components_per_attribute: attribute.components_per_attribute,
                });
            }
            let count = attribute.vertex_count();
            match expected {
                None => expected = Some(count),
                Some(e) if e != count => {
                    return Err(GeometryError::AttributeLengthMismatch {
                        expected: e,
                        attribute: format!("{semantic:?}"),
                        actual: count,
                    });
                }
                Some(_) => {}
            }
        }

        let geometry = Self {
            attributes,
            indices,
            primitive_topology,
            bounding_sphere,
        };

        if let (Some(indices), count) = (&geometry.indices, geometry.vertex_count()) {
            for &index in indices {
                if index as usize >= count {
                    return Err(GeometryError::IndexOutOfRange {
                        index,
                        vertex_count: count,
                    });
                }
            }
        }

        Ok(geometry)
    }

    /// Number of vertices shared by every attribute (zero for an empty
    /// attribute map).
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.attributes
            .values()
            .next()
            .map_or(0, GeometryAttribute::vertex_count)
    }

    /// The position of vertex `index` as a `DVec3`.
    ///
    /// # Panics
    /// Panics when the geometry has no position attribute or the index is
    /// out of range.
    #[must_use]
    pub fn position(&self, index: usize) -> DVec3 {
        let attribute = &self.attributes[&AttributeSemantic::Position];
        let base = index * attribute.components_per_attribute;
        DVec3::new(
            attribute.values.get(base),
            attribute.values.get(base + 1),
            attribute.values.get(base + 2),
        )
    }
}
