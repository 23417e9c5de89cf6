//! Minimal-ish enclosing spheres for vertex point sets.

use glam::DVec3;

/// A sphere enclosing a set of points.
///
/// Every input point lies within `radius` of `center` up to floating-point
/// tolerance; the sphere is not guaranteed minimal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingSphere {
    /// Center of the sphere.
    pub center: DVec3,
    /// Radius of the sphere.
    pub radius: f64,
}

impl BoundingSphere {
    /// Creates a sphere from center and radius.
    #[inline]
    #[must_use]
    pub const fn new(center: DVec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Computes a tight enclosing sphere for a point set.
    ///
    /// Runs two O(n) candidate constructions and keeps the smaller:
    ///
    /// 1. **Naive**: the axis-aligned bounding box midpoint as center,
    ///    radius from a second max-distance pass.
    /// 2. **Ritter**: seed a sphere from the two extreme points of the
    ///    longest box axis, then grow it just enough for each point found
    ///    outside, recentering toward the point by the exact deficit.
    ///
    /// An empty point set yields a zero sphere at the origin.
    #[must_use]
    pub fn from_points(points: &[DVec3]) -> Self {
        if points.is_empty() {
            return Self::new(DVec3::ZERO, 0.0);
        }

        let mut min = points[0];
        let mut max = points[0];
        // Extreme points along each axis, for the Ritter seed.
        let mut x_min = points[0];
        let mut x_max = points[0];
        let mut y_min = points[0];
        let mut y_max = points[0];
        let mut z_min = points[0];
        let mut z_max = points[0];

        for &p in points {
            min = min.min(p);
            max = max.max(p);
            if p.x < x_min.x {
                x_min = p;
            }
            if p.x > x_max.x {
                x_max = p;
            }
            if p.y < y_min.y {
                y_min = p;
            }
            if p.y > y_max.y {
                y_max = p;
            }
            if p.z < z_min.z {
                z_min = p;
            }
            if p.z > z_max.z {
                z_max = p;
            }
        }

        // Naive candidate: box midpoint, max-distance radius.
        let naive_center = (min + max) * 0.5;
        let mut naive_radius_squared: f64 = 0.0;

        // Ritter candidate: seed from the span of the longest axis.
        let x_span = x_max.distance_squared(x_min);
        let y_span = y_max.distance_squared(y_min);
        let z_span = z_max.distance_squared(z_min);

        let (mut diameter_1, mut diameter_2) = (x_min, x_max);
        let mut max_span = x_span;
        if y_span > max_span {
            max_span = y_span;
            diameter_1 = y_min;
            diameter_2 = y_max;
        }
        if z_span > max_span {
            diameter_1 = z_min;
            diameter_2 = z_max;
        }

        let mut ritter_center = (diameter_1 + diameter_2) * 0.5;
        let mut ritter_radius = diameter_2.distance(ritter_center);

        for &p in points {
            naive_radius_squared = naive_radius_squared.max(p.distance_squared(naive_center));

            let distance = p.distance(ritter_center);
            if distance > ritter_radius {
                // Expand just enough to include p, recentering toward it.
                let old_radius = ritter_radius;
                ritter_radius = (ritter_radius + distance) * 0.5;
                ritter_center += (p - ritter_center) * ((ritter_radius - old_radius) / distance);
            }
        }

        let naive_radius = naive_radius_squared.sqrt();
        if ritter_radius < naive_radius {
            Self::new(ritter_center, ritter_radius)
        } else {
            Self::new(naive_center, naive_radius)
        }
    }

    /// The smallest sphere enclosing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let to_other = other.center - self.center;
        let distance = to_other.length();

        // One sphere already contains the other.
        if self.radius >= distance + other.radius {
            return *self;
        }
        if other.radius >= distance + self.radius {
            return *other;
        }

        let radius = (distance + self.radius + other.radius) * 0.5;
        let center = self.center + to_other * ((radius - self.radius) / distance);
        Self::new(center, radius)
    }

    /// The smallest sphere centered at `self.center` enclosing both `self`
    /// and `point`.
    #[must_use]
    pub fn expand(&self, point: DVec3) -> Self {
        let distance = point.distance(self.center);
        if distance > self.radius {
            Self::new(self.center, distance)
        } else {
            *self
        }
    }

    /// True when `point` lies inside or on the sphere, within `epsilon`.
    #[must_use]
    pub fn contains(&self, point: DVec3, epsilon: f64) -> bool {
        point.distance(self.center) <= self.radius + epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn assert_encloses(sphere: &BoundingSphere, points: &[DVec3]) {
        for &p in points {
            assert!(
                sphere.contains(p, EPSILON),
                "point {p:?} outside sphere centered {:?} radius {}",
                sphere.center,
                sphere.radius
            );
        }
    }

    #[test]
    fn test_from_points_encloses_all_inputs() {
        let points: Vec<DVec3> = (0..100)
            .map(|i| {
                let t = f64::from(i) * 0.37;
                DVec3::new(t.sin() * 12.0, t.cos() * 5.0, (t * 1.7).sin() * 9.0)
            })
            .collect();
        let sphere = BoundingSphere::from_points(&points);
        assert_encloses(&sphere, &points);
    }

    #[test]
    fn test_from_points_is_reasonably_tight() {
        // Points on a unit sphere shell: optimal radius is 1.
        let points: Vec<DVec3> = (0..200)
            .map(|i| {
                let theta = f64::from(i) * 0.314;
                let phi = f64::from(i) * 0.11;
                DVec3::new(
                    theta.sin() * phi.cos(),
                    theta.sin() * phi.sin(),
                    theta.cos(),
                )
            })
            .collect();
        let sphere = BoundingSphere::from_points(&points);
        assert_encloses(&sphere, &points);
        assert!(
            sphere.radius < 1.3,
            "enclosing radius {} is far from optimal 1.0",
            sphere.radius
        );
    }

    #[test]
    fn test_empty_point_set_yields_zero_sphere() {
        let sphere = BoundingSphere::from_points(&[]);
        assert_eq!(sphere.center, DVec3::ZERO);
        assert_eq!(sphere.radius, 0.0);
    }

    #[test]
    fn test_single_point_yields_degenerate_sphere() {
        let p = DVec3::new(3.0, -2.0, 7.0);
        let sphere = BoundingSphere::from_points(&[p]);
        assert!((sphere.center - p).length() < EPSILON);
        assert!(sphere.radius < EPSILON);
    }

    #[test]
    fn test_union_encloses_both_spheres() {
        let a = BoundingSphere::new(DVec3::new(-5.0, 0.0, 0.0), 1.0);
        let b = BoundingSphere::new(DVec3::new(4.0, 3.0, 0.0), 2.0);
        let u = a.union(&b);
        // Sample extreme points of both spheres.
        for (sphere, sign) in [(&a, -1.0), (&b, 1.0)] {
            for axis in [DVec3::X, DVec3::Y, DVec3::Z] {
                let p = sphere.center + axis * sphere.radius * sign;
                assert!(u.contains(p, EPSILON));
            }
        }
    }

    #[test]
    fn test_union_with_contained_sphere_is_identity() {
        let big = BoundingSphere::new(DVec3::ZERO, 10.0);
        let small = BoundingSphere::new(DVec3::new(1.0, 1.0, 1.0), 0.5);
        assert_eq!(big.union(&small), big);
        assert_eq!(small.union(&big), big);
    }

    #[test]
    fn test_expand_covers_new_point() {
        let sphere = BoundingSphere::new(DVec3::ZERO, 1.0);
        let p = DVec3::new(0.0, 0.0, 4.0);
        let expanded = sphere.expand(p);
        assert_eq!(expanded.center, sphere.center);
        assert!(expanded.contains(p, EPSILON));
        assert_eq!(sphere.expand(DVec3::new(0.1, 0.0, 0.0)), sphere);
    }
}
