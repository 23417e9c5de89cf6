//! Error type for geometry construction preconditions.

use thiserror::Error;

use crate::attribute::ComponentDatatype;

/// Errors raised while constructing or rewriting geometry containers.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// Two attributes in the same geometry cover different vertex counts.
    #[error(
        "attribute vertex counts differ: expected {expected} vertices, \
         attribute {attribute} has {actual}"
    )]
    AttributeLengthMismatch {
        /// Vertex count of the first attribute seen.
        expected: usize,
        /// Offending attribute, formatted for the message.
        attribute: String,
        /// Vertex count of the offending attribute.
        actual: usize,
    },
    /// An attribute buffer length is not a multiple of its component width.
    #[error(
        "attribute {attribute} has {len} components, not divisible by \
         {components_per_attribute} components per vertex"
    )]
    RaggedAttribute {
        /// Offending attribute, formatted for the message.
        attribute: String,
        /// Total component count.
        len: usize,
        /// Declared components per vertex.
        components_per_attribute: usize,
    },
    /// Buffers of different component datatypes were combined.
    #[error("component datatype mismatch: expected {expected:?}, got {actual:?}")]
    DatatypeMismatch {
        /// Datatype of the destination buffer.
        expected: ComponentDatatype,
        /// Datatype of the source buffer.
        actual: ComponentDatatype,
    },
    /// An index referenced a vertex beyond the attribute buffers.
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// The offending index value.
        index: u32,
        /// Number of vertices in the geometry.
        vertex_count: usize,
    },
}
