//! Error type for pipeline preconditions.

use thiserror::Error;

use tellus_geometry::{AttributeSemantic, GeometryError, PrimitiveTopology};

/// Errors raised by pipeline stages.
///
/// Every variant is a precondition violation, fatal for the current
/// request; stages never silently correct their inputs.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage needed an attribute the geometry does not carry.
    #[error("geometry is missing the {semantic:?} attribute")]
    MissingAttribute {
        /// The absent attribute.
        semantic: AttributeSemantic,
    },
    /// A stage needed an index buffer.
    #[error("geometry has no index buffer")]
    MissingIndices,
    /// A stage cannot operate on the geometry's topology.
    #[error("unsupported primitive topology {topology:?}: {operation}")]
    UnsupportedTopology {
        /// The geometry's topology.
        topology: PrimitiveTopology,
        /// Which operation rejected it.
        operation: &'static str,
    },
    /// `combine` was called with no instances.
    #[error("combine requires at least one instance")]
    NoInstances,
    /// Instances to combine disagree on primitive topology.
    #[error("all instances must share one primitive topology")]
    MismatchedTopology,
    /// Some instances are indexed and some are not.
    #[error("all instances must either have indices or all lack them")]
    MismatchedIndexStatus,
    /// Instances to combine carry different model matrices.
    #[error(
        "all instances must share one model matrix; transform them to world \
         coordinates first"
    )]
    MismatchedModelMatrix,
    /// A model matrix could not be inverted for normal transformation.
    #[error("model matrix is not invertible")]
    NonInvertibleMatrix,
    /// The vertex cache must hold at least one triangle.
    #[error("cache size must be at least 3, got {cache_size}")]
    InvalidCacheSize {
        /// The offending cache size.
        cache_size: usize,
    },
    /// A triangle index stream must be a non-empty multiple of three.
    #[error("triangle index count must be a positive multiple of 3, got {len}")]
    InvalidIndexCount {
        /// The offending index count.
        len: usize,
    },
    /// An invariant violation surfaced while rebuilding a geometry.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
