//! Geometry instances: a geometry plus world transform and per-instance data.

use std::collections::BTreeMap;

use glam::DMat4;

use crate::attribute::{AttributeSemantic, AttributeValues, GeometryAttribute};
use crate::geometry::Geometry;

/// A constant attribute value applied to every vertex of an instance,
/// expanded to a per-vertex attribute before instances are combined.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceAttribute {
    /// Number of components per vertex after expansion.
    pub components_per_attribute: usize,
    /// Whether the expanded attribute is normalized.
    pub normalize: bool,
    /// One vertex worth of component values.
    pub value: AttributeValues,
}

impl InstanceAttribute {
    /// A normalized RGBA color, the most common per-instance attribute.
    #[must_use]
    pub fn color(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            components_per_attribute: 4,
            normalize: true,
            value: AttributeValues::U8(vec![red, green, blue, alpha]),
        }
    }

    /// Expands the constant value into a per-vertex attribute buffer.
    #[must_use]
    pub fn expand(&self, vertex_count: usize) -> GeometryAttribute {
        let mut values = self.value.empty_like();
        for _ in 0..vertex_count {
            for component in 0..self.value.len() {
                values.push(self.value.get(component));
            }
        }
        GeometryAttribute {
            components_per_attribute: self.components_per_attribute,
            normalize: self.normalize,
            values,
        }
    }
}

/// A geometry paired with a model-to-world transform, optional per-instance
/// constant attributes, and an opaque id for picking/correlation.
#[derive(Clone, Debug)]
pub struct GeometryInstance {
    /// The instance's geometry.
    pub geometry: Geometry,
    /// Model-to-world transform.
    pub model_matrix: DMat4,
    /// Per-instance constant attributes, expanded before combination.
    pub attributes: BTreeMap<AttributeSemantic, InstanceAttribute>,
    /// Opaque identifier carried through the pipeline.
    pub id: Option<String>,
}

impl GeometryInstance {
    /// Creates an instance with an identity transform and no extra
    /// attributes.
    #[must_use]
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            model_matrix: DMat4::IDENTITY,
            attributes: BTreeMap::new(),
            id: None,
        }
    }

    /// Sets the model matrix.
    #[must_use]
    pub fn with_model_matrix(mut self, model_matrix: DMat4) -> Self {
        self.model_matrix = model_matrix;
        self
    }

    /// Attaches a per-instance constant attribute.
    #[must_use]
    pub fn with_attribute(
        mut self,
        semantic: AttributeSemantic,
        attribute: InstanceAttribute,
    ) -> Self {
        self.attributes.insert(semantic, attribute);
        self
    }

    /// Sets the opaque id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}
