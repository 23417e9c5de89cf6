//! Error type for geodetic preconditions.

use thiserror::Error;

/// Errors raised by constructors and validators in this crate.
///
/// These are precondition violations: invalid inputs that can never be
/// silently corrected. Numerical degeneracies (a point coincident with the
/// ellipsoid center) are *not* errors; they surface as `None` from the
/// conversion functions.
#[derive(Debug, Error)]
pub enum GeodesyError {
    /// An ellipsoid radius component was negative.
    #[error("all ellipsoid radii must be greater than or equal to zero, got ({x}, {y}, {z})")]
    InvalidRadii {
        /// Radius along the x axis.
        x: f64,
        /// Radius along the y axis.
        y: f64,
        /// Radius along the z axis.
        z: f64,
    },
    /// An extent bound was outside its valid range or the extent was degenerate.
    #[error("invalid extent: {reason}")]
    InvalidExtent {
        /// Which invariant failed.
        reason: String,
    },
}
