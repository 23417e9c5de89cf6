//! Mesh post-processing pipeline: attribute derivation, antimeridian
//! splitting, multi-instance combination, 16-bit index partitioning, and
//! vertex-cache index reordering.
//!
//! Every pass is a pure function of its inputs; geometries flow through the
//! stages by value and buffers are moved, never copied, when a stage leaves
//! them untouched.

mod combine;
mod derive;
mod error;
mod fit;
mod tipsify;
mod wrap_longitude;

pub use combine::{combine, transform_to_world_coordinates};
pub use derive::{compute_normal, compute_tangent_and_binormal};
pub use error::PipelineError;
pub use fit::{MAX_UNSIGNED_SHORT_VERTEX_COUNT, fit_to_unsigned_short_indices};
pub use tipsify::{DEFAULT_CACHE_SIZE, calculate_acmr, tipsify};
pub use wrap_longitude::{PLANE_OFFSET_EPSILON, wrap_longitude};
