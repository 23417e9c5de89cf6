//! Geodetic coordinate math on triaxial ellipsoids: cartographic ⇄ Cartesian
//! conversions, geodetic surface normals, and lon/lat extent handling.

mod cartographic;
mod ellipsoid;
mod error;
mod extent;

pub use cartographic::Cartographic;
pub use ellipsoid::{Ellipsoid, SURFACE_CONVERGENCE_TOLERANCE};
pub use error::GeodesyError;
pub use extent::GeoExtent;
