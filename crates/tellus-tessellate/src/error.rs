//! Error type for tessellation preconditions.

use thiserror::Error;

use tellus_geodesy::GeodesyError;

/// Errors raised while tessellating an extent.
///
/// All variants are precondition violations: fatal for the current request
/// and reported back to the caller, never silently corrected.
#[derive(Debug, Error)]
pub enum TessellationError {
    /// The extent or ellipsoid failed validation.
    #[error(transparent)]
    InvalidExtent(#[from] GeodesyError),
    /// Granularity must be a positive, finite angle.
    #[error("granularity must be positive and finite, got {granularity}")]
    InvalidGranularity {
        /// The offending value.
        granularity: f64,
    },
    /// After applying the in-plane rotation, the footprint left the valid
    /// longitude/latitude range (crossed a pole or the ±π meridian).
    #[error("rotated extent leaves the valid longitude/latitude range")]
    RotatedExtentOutOfRange,
    /// Tessellation always emits positions; a format without them has no
    /// vertex stream to build.
    #[error("vertex format must include position")]
    MissingPositionFormat,
}
