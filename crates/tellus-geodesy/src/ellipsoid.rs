//! Triaxial ellipsoid model.
//!
//! An ellipsoid is the quadratic surface `(x/a)² + (y/b)² + (z/c)² = 1`,
//! used to represent the shape of planetary bodies. All derived quantities
//! (squared radii, reciprocals, min/max radius) are cached at construction
//! so the per-sample conversion paths stay allocation- and division-light.

use glam::DVec3;

use crate::Cartographic;
use crate::error::GeodesyError;

/// Convergence threshold for the Newton–Raphson surface projection, applied
/// to the implicit surface function value.
pub const SURFACE_CONVERGENCE_TOLERANCE: f64 = 1e-12;

/// Squared-ellipsoid-norm threshold below which a point is treated as
/// coincident with the center, where the surface normal is undefined.
const CENTER_TOLERANCE_SQUARED: f64 = 0.1;

/// A triaxial ellipsoid centered at the origin, axis-aligned.
///
/// Immutable after construction; intended to be shared by reference across
/// many tessellation calls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipsoid {
    radii: DVec3,
    radii_squared: DVec3,
    radii_to_the_fourth: DVec3,
    one_over_radii: DVec3,
    one_over_radii_squared: DVec3,
    minimum_radius: f64,
    maximum_radius: f64,
    center_tolerance_squared: f64,
}

impl Ellipsoid {
    /// Creates an ellipsoid with the given radii in meters.
    ///
    /// All components must be greater than or equal to zero; a zero radius
    /// produces a degenerate (flat) ellipsoid whose reciprocal radii are
    /// clamped to zero.
    pub fn new(x: f64, y: f64, z: f64) -> Result<Self, GeodesyError> {
        if x < 0.0 || y < 0.0 || z < 0.0 {
            return Err(GeodesyError::InvalidRadii { x, y, z });
        }

        let inv = |v: f64| if v == 0.0 { 0.0 } else { 1.0 / v };

        Ok(Self {
            radii: DVec3::new(x, y, z),
            radii_squared: DVec3::new(x * x, y * y, z * z),
            radii_to_the_fourth: DVec3::new(x * x * x * x, y * y * y * y, z * z * z * z),
            one_over_radii: DVec3::new(inv(x), inv(y), inv(z)),
            one_over_radii_squared: DVec3::new(inv(x * x), inv(y * y), inv(z * z)),
            minimum_radius: x.min(y).min(z),
            maximum_radius: x.max(y).max(z),
            center_tolerance_squared: CENTER_TOLERANCE_SQUARED,
        })
    }

    /// The WGS84 reference ellipsoid.
    #[must_use]
    pub fn wgs84() -> Self {
        Self::new(6_378_137.0, 6_378_137.0, 6_356_752.314_245_179_5)
            .expect("WGS84 radii are positive")
    }

    /// A unit sphere, convenient for tests and scale-free math.
    #[must_use]
    pub fn unit_sphere() -> Self {
        Self::new(1.0, 1.0, 1.0).expect("unit radii are positive")
    }

    /// Radii along the three axes.
    #[inline]
    #[must_use]
    pub fn radii(&self) -> DVec3 {
        self.radii
    }

    /// Radii squared, component-wise.
    #[inline]
    #[must_use]
    pub fn radii_squared(&self) -> DVec3 {
        self.radii_squared
    }

    /// Radii to the fourth power, component-wise.
    #[inline]
    #[must_use]
    pub fn radii_to_the_fourth(&self) -> DVec3 {
        self.radii_to_the_fourth
    }

    /// Reciprocal radii, component-wise (zero where the radius is zero).
    #[inline]
    #[must_use]
    pub fn one_over_radii(&self) -> DVec3 {
        self.one_over_radii
    }

    /// Reciprocal squared radii, component-wise.
    #[inline]
    #[must_use]
    pub fn one_over_radii_squared(&self) -> DVec3 {
        self.one_over_radii_squared
    }

    /// Smallest of the three radii.
    #[inline]
    #[must_use]
    pub fn minimum_radius(&self) -> f64 {
        self.minimum_radius
    }

    /// Largest of the three radii.
    #[inline]
    #[must_use]
    pub fn maximum_radius(&self) -> f64 {
        self.maximum_radius
    }

    /// Outward unit normal to the ellipsoid surface at `cartesian`.
    ///
    /// Distinct from the geocentric (radial) direction except on a sphere.
    #[inline]
    #[must_use]
    pub fn geodetic_surface_normal(&self, cartesian: DVec3) -> DVec3 {
        (cartesian * self.one_over_radii_squared).normalize()
    }

    /// Outward unit normal at a cartographic position.
    #[must_use]
    pub fn geodetic_surface_normal_cartographic(&self, cartographic: &Cartographic) -> DVec3 {
        let cos_latitude = cartographic.latitude.cos();
        DVec3::new(
            cos_latitude * cartographic.longitude.cos(),
            cos_latitude * cartographic.longitude.sin(),
            cartographic.latitude.sin(),
        )
    }

    /// Converts a cartographic position to Cartesian coordinates.
    ///
    /// The geodetic normal is scaled by the squared radii, renormalized onto
    /// the surface, then offset along the normal by the height.
    #[must_use]
    pub fn cartographic_to_cartesian(&self, cartographic: &Cartographic) -> DVec3 {
        let n = self.geodetic_surface_normal_cartographic(cartographic);
        let k = self.radii_squared * n;
        let gamma = n.dot(k).sqrt();
        k / gamma + n * cartographic.height
    }

    /// Converts a Cartesian position to cartographic coordinates.
    ///
    /// Returns `None` when the position is coincident with the ellipsoid
    /// center, where no unique surface projection exists. Height is signed:
    /// negative below the surface.
    #[must_use]
    pub fn cartesian_to_cartographic(&self, cartesian: DVec3) -> Option<Cartographic> {
        let p = self.scale_to_geodetic_surface(cartesian)?;

        let n = self.geodetic_surface_normal(p);
        let h = cartesian - p;

        let longitude = n.y.atan2(n.x);
        let latitude = n.z.asin();
        let height = h.dot(cartesian).signum() * h.length();

        Some(Cartographic::new(longitude, latitude, height))
    }

    /// Projects `cartesian` onto the ellipsoid surface along the geodetic
    /// surface normal.
    ///
    /// Returns `None` when the position is at the center of the ellipsoid.
    ///
    /// Uses Newton–Raphson iteration on the Lagrange multiplier `lambda` of
    /// the constrained nearest-point problem; the gradient at the radial
    /// intersection stands in for the true unit normal, with the magnitude
    /// difference absorbed into the multiplier.
    #[must_use]
    pub fn scale_to_geodetic_surface(&self, cartesian: DVec3) -> Option<DVec3> {
        let scaled = cartesian * self.one_over_radii;
        let x2 = scaled.x * scaled.x;
        let y2 = scaled.y * scaled.y;
        let z2 = scaled.z * scaled.z;

        let squared_norm = x2 + y2 + z2;
        let ratio = (1.0 / squared_norm).sqrt();

        // Radial projection as the initial approximation.
        let intersection = cartesian * ratio;

        // Near the center the iteration will not converge.
        if squared_norm < self.center_tolerance_squared {
            return if ratio.is_finite() {
                Some(intersection)
            } else {
                None
            };
        }

        let one_over_radii_squared = self.one_over_radii_squared;
        let gradient = intersection * one_over_radii_squared * 2.0;

        let mut lambda = (1.0 - ratio) * cartesian.length() / (0.5 * gradient.length());
        let mut correction = 0.0;

        let mut x_multiplier;
        let mut y_multiplier;
        let mut z_multiplier;

        loop {
            lambda -= correction;

            x_multiplier = 1.0 / (1.0 + lambda * one_over_radii_squared.x);
            y_multiplier = 1.0 / (1.0 + lambda * one_over_radii_squared.y);
            z_multiplier = 1.0 / (1.0 + lambda * one_over_radii_squared.z);

            let x_multiplier2 = x_multiplier * x_multiplier;
            let y_multiplier2 = y_multiplier * y_multiplier;
            let z_multiplier2 = z_multiplier * z_multiplier;

            let x_multiplier3 = x_multiplier2 * x_multiplier;
            let y_multiplier3 = y_multiplier2 * y_multiplier;
            let z_multiplier3 = z_multiplier2 * z_multiplier;

            let func = x2 * x_multiplier2 + y2 * y_multiplier2 + z2 * z_multiplier2 - 1.0;

            let denominator = x2 * x_multiplier3 * one_over_radii_squared.x
                + y2 * y_multiplier3 * one_over_radii_squared.y
                + z2 * z_multiplier3 * one_over_radii_squared.z;

            let derivative = -2.0 * denominator;

            correction = func / derivative;

            if func.abs() <= SURFACE_CONVERGENCE_TOLERANCE {
                break;
            }
        }

        Some(DVec3::new(
            cartesian.x * x_multiplier,
            cartesian.y * y_multiplier,
            cartesian.z * z_multiplier,
        ))
    }

    /// Scales `cartesian` along the geocentric (radial) direction onto the
    /// ellipsoid surface.
    #[must_use]
    pub fn scale_to_geocentric_surface(&self, cartesian: DVec3) -> DVec3 {
        let beta = 1.0
            / (cartesian.x * cartesian.x * self.one_over_radii_squared.x
                + cartesian.y * cartesian.y * self.one_over_radii_squared.y
                + cartesian.z * cartesian.z * self.one_over_radii_squared.z)
                .sqrt();
        cartesian * beta
    }
}
