//! Renderable geometry data model: typed vertex attributes, index buffers,
//! primitive topology, bounding spheres, and per-instance data.

mod attribute;
mod bounding_sphere;
mod error;
mod geometry;
mod instance;
mod vertex_format;

pub use attribute::{AttributeSemantic, AttributeValues, ComponentDatatype, GeometryAttribute};
pub use bounding_sphere::BoundingSphere;
pub use error::GeometryError;
pub use geometry::{Geometry, PrimitiveTopology};
pub use instance::{GeometryInstance, InstanceAttribute};
pub use vertex_format::VertexFormat;
