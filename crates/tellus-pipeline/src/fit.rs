//! 16-bit index partitioning for large meshes.

use rustc_hash::FxHashMap;
use tellus_geometry::{AttributeSemantic, BoundingSphere, Geometry, GeometryAttribute};
use tracing::debug;

use crate::error::PipelineError;

/// Largest vertex count addressable by an unsigned 16-bit index buffer.
pub const MAX_UNSIGNED_SHORT_VERTEX_COUNT: usize = 65_536;

/// Splits a geometry whose vertex count exceeds the 16-bit index range
/// into chunks that fit.
///
/// Walks the index stream one primitive at a time, remapping vertices into
/// a fresh 0-based local index space per chunk and starting a new chunk
/// whenever the next primitive would push the local vertex count past
/// 65 536. A geometry that already fits is returned untouched as a
/// single-element vector.
///
/// Only indexed points, lines, and triangles can be partitioned; strips,
/// loops, and fans share indices between primitives.
pub fn fit_to_unsigned_short_indices(geometry: Geometry) -> Result<Vec<Geometry>, PipelineError> {
    let Some(indices_per_primitive) = geometry.primitive_topology.vertices_per_primitive() else {
        return Err(PipelineError::UnsupportedTopology {
            topology: geometry.primitive_topology,
            operation: "fit_to_unsigned_short_indices",
        });
    };
    if geometry.indices.is_none() {
        return Err(PipelineError::MissingIndices);
    }
    if geometry.vertex_count() <= MAX_UNSIGNED_SHORT_VERTEX_COUNT {
        return Ok(vec![geometry]);
    }

    let indices = geometry.indices.as_ref().expect("checked above");
    let mut chunks = Vec::new();
    let mut builder = ChunkBuilder::new(&geometry);

    for primitive in indices.chunks_exact(indices_per_primitive) {
        let new_vertices = primitive
            .iter()
            .filter(|&&index| !builder.remap.contains_key(&index))
            .count();
        if builder.vertex_count() + new_vertices > MAX_UNSIGNED_SHORT_VERTEX_COUNT {
            chunks.push(builder.finish()?);
            builder = ChunkBuilder::new(&geometry);
        }
        builder.push_primitive(primitive);
    }
    if !builder.indices.is_empty() {
        chunks.push(builder.finish()?);
    }

    debug!(chunks = chunks.len(), "partitioned geometry for 16-bit indices");
    Ok(chunks)
}

/// Accumulates one output chunk: remapped indices plus copied vertices.
struct ChunkBuilder<'a> {
    source: &'a Geometry,
    remap: FxHashMap<u32, u32>,
    attributes: std::collections::BTreeMap<AttributeSemantic, GeometryAttribute>,
    indices: Vec<u32>,
}

impl<'a> ChunkBuilder<'a> {
    fn new(source: &'a Geometry) -> Self {
        let attributes = source
            .attributes
            .iter()
            .map(|(semantic, attribute)| {
                (
                    *semantic,
                    GeometryAttribute {
                        components_per_attribute: attribute.components_per_attribute,
                        normalize: attribute.normalize,
                        values: attribute.values.empty_like(),
                    },
                )
            })
            .collect();
        Self {
            source,
            remap: FxHashMap::default(),
            attributes,
            indices: Vec::new(),
        }
    }

    fn vertex_count(&self) -> usize {
        self.remap.len()
    }

    fn push_primitive(&mut self, primitive: &[u32]) {
        for &index in primitive {
            let local = match self.remap.get(&index) {
                Some(&local) => local,
                None => {
                    let local = self.remap.len() as u32;
                    for (semantic, attribute) in self.attributes.iter_mut() {
                        let source = &self.source.attributes[semantic];
                        let components = source.components_per_attribute;
                        for component in 0..components {
                            attribute
                                .values
                                .push(source.values.get(index as usize * components + component));
                        }
                    }
                    self.remap.insert(index, local);
                    local
                }
            };
            self.indices.push(local);
        }
    }

    fn finish(self) -> Result<Geometry, PipelineError> {
        let bounding_sphere = self
            .attributes
            .contains_key(&AttributeSemantic::Position)
            .then(|| {
                let positions = &self.attributes[&AttributeSemantic::Position];
                let points: Vec<_> = (0..positions.vertex_count())
                    .map(|i| {
                        glam::DVec3::new(
                            positions.values.get(i * 3),
                            positions.values.get(i * 3 + 1),
                            positions.values.get(i * 3 + 2),
                        )
                    })
                    .collect();
                BoundingSphere::from_points(&points)
            });

        Ok(Geometry::new(
            self.attributes,
            Some(self.indices),
            self.source.primitive_topology,
            bounding_sphere,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tellus_geometry::{AttributeValues, PrimitiveTopology};

    /// A triangle strip-like list of `vertex_count` vertices where every
    /// consecutive triple is a triangle.
    fn large_triangle_geometry(vertex_count: usize) -> Geometry {
        let positions: Vec<f64> = (0..vertex_count * 3).map(|i| i as f64).collect();
        let mut attributes = BTreeMap::new();
        attributes.insert(
            AttributeSemantic::Position,
            GeometryAttribute::new(3, AttributeValues::F64(positions)),
        );
        let mut indices = Vec::new();
        for i in 0..(vertex_count as u32 - 2) {
            indices.extend_from_slice(&[i, i + 1, i + 2]);
        }
        Geometry::new(attributes, Some(indices), PrimitiveTopology::Triangles, None).unwrap()
    }

    #[test]
    fn test_small_geometry_passes_through() {
        let geometry = large_triangle_geometry(100);
        let chunks = fit_to_unsigned_short_indices(geometry).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].vertex_count(), 100);
    }

    #[test]
    fn test_seventy_thousand_vertices_split_into_valid_chunks() {
        let geometry = large_triangle_geometry(70_000);
        let chunks = fit_to_unsigned_short_indices(geometry).unwrap();
        assert!(chunks.len() >= 2, "expected at least two chunks");

        for chunk in &chunks {
            let count = chunk.vertex_count();
            assert!(count <= MAX_UNSIGNED_SHORT_VERTEX_COUNT);
            let indices = chunk.indices.as_ref().unwrap();
            assert!(!indices.is_empty());
            for &index in indices {
                assert!((index as usize) < count, "index {index} out of chunk range");
            }
        }

        // Every input triangle survives: total index count is preserved.
        let total: usize = chunks
            .iter()
            .map(|c| c.indices.as_ref().unwrap().len())
            .sum();
        assert_eq!(total, (70_000 - 2) * 3);
    }

    #[test]
    fn test_chunk_vertices_keep_their_positions() {
        let geometry = large_triangle_geometry(70_000);
        let original = geometry.clone();
        let chunks = fit_to_unsigned_short_indices(geometry).unwrap();

        // Spot-check the first triangle of the second chunk against the
        // original geometry by matching positions.
        let chunk = &chunks[1];
        let chunk_indices = chunk.indices.as_ref().unwrap();
        let p = chunk.position(chunk_indices[0] as usize);
        let found = (0..original.vertex_count()).any(|i| (original.position(i) - p).length() == 0.0);
        assert!(found, "chunk vertex not found in source geometry");
    }

    #[test]
    fn test_strip_topology_is_rejected() {
        let mut geometry = large_triangle_geometry(10);
        geometry.primitive_topology = PrimitiveTopology::TriangleStrip;
        assert!(matches!(
            fit_to_unsigned_short_indices(geometry),
            Err(PipelineError::UnsupportedTopology { .. })
        ));
    }

    #[test]
    fn test_unindexed_geometry_is_rejected() {
        let mut geometry = large_triangle_geometry(10);
        geometry.indices = None;
        assert!(matches!(
            fit_to_unsigned_short_indices(geometry),
            Err(PipelineError::MissingIndices)
        ));
    }
}
