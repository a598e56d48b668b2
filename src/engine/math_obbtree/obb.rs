use std::fmt::{Debug, Formatter};
use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};
use nab_obbtree::utils::ShortTypeName;
use crate::{Intersection, Intersects, IsOnOrInside, Sphere, Symmetric3x3};

/// An oriented bounding box.
/// The columns of `rotation` are the box's local axes in world space (orthonormal, right-handed).
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OBB
{
    pub center: Vec3,
    pub half_extents: Vec3,
    pub rotation: Mat3,
}
impl Default for OBB
{
    fn default() -> Self { Self
    {
        center: Vec3::ZERO,
        half_extents: Vec3::ZERO,
        rotation: Mat3::IDENTITY,
    }}
}
impl OBB
{
    // added to the absolute rotation terms so near-parallel edge pairs don't produce a bogus separating axis
    const SAT_EPSILON: f32 = 1e-6;

    #[inline] #[must_use]
    pub const fn new(center: Vec3, half_extents: Vec3, rotation: Mat3) -> Self
    {
        Self { center, half_extents, rotation }
    }

    #[inline] #[must_use]
    pub const fn from_center_half(center: Vec3, half_extents: Vec3) -> Self
    {
        Self { center, half_extents, rotation: Mat3::IDENTITY }
    }

    /// Fit a box around `points` and grow it by `inflation_radius` on every side.
    /// Local axis 0 follows the direction of largest spread, axis 2 the smallest.
    /// Returns `None` for an empty cloud.
    #[must_use]
    pub fn from_points(points: &[Vec3], inflation_radius: f32) -> Option<Self>
    {
        let (mean, covariance) = Symmetric3x3::covariance(points)?;
        let rotation = covariance.eigen().vectors;
        let to_local = rotation.transpose();

        let mut local_min = Vec3::MAX;
        let mut local_max = Vec3::MIN;
        for p in points
        {
            let local = to_local * (*p - mean);
            local_min = local_min.min(local);
            local_max = local_max.max(local);
        }

        let local_center = (local_min + local_max) * 0.5;
        Some(Self
        {
            center: mean + rotation * local_center,
            half_extents: (local_max - local_min) * 0.5 + Vec3::splat(inflation_radius),
            rotation,
        })
    }

    #[inline] #[must_use] pub fn axis(&self, i: usize) -> Vec3 { self.rotation.col(i) }
    #[inline] #[must_use] pub fn size(&self) -> Vec3 { self.half_extents * 2.0 }
    #[inline] #[must_use] pub fn bounding_radius(&self) -> f32 { self.half_extents.length() }
    #[inline] #[must_use] pub fn bounding_sphere(&self) -> Sphere { Sphere::new(self.center, self.bounding_radius()) }

    #[inline] #[must_use]
    pub fn volume(&self) -> f32
    {
        let size = self.size();
        size.x * size.y * size.z
    }

    #[inline] #[must_use]
    pub fn translated(self, offset: Vec3) -> Self
    {
        Self { center: self.center + offset, ..self }
    }

    #[inline] #[must_use]
    pub fn to_local(&self, point: Vec3) -> Vec3
    {
        self.rotation.transpose() * (point - self.center)
    }

    /// Bit `i` of the corner index selects the sign along local axis `i`.
    #[must_use]
    pub fn corners(&self) -> [Vec3; 8]
    {
        let ex = self.axis(0) * self.half_extents.x;
        let ey = self.axis(1) * self.half_extents.y;
        let ez = self.axis(2) * self.half_extents.z;
        std::array::from_fn(|i|
        {
            let sx = if i & 1 != 0 { ex } else { -ex };
            let sy = if i & 2 != 0 { ey } else { -ey };
            let sz = if i & 4 != 0 { ez } else { -ez };
            self.center + sx + sy + sz
        })
    }

    #[must_use]
    pub fn contains_point(&self, point: Vec3, tolerance: f32) -> bool
    {
        let local = self.to_local(point);
        local.abs().cmple(self.half_extents + Vec3::splat(tolerance)).all()
    }

    #[must_use]
    pub fn contains_obb(&self, other: &Self, tolerance: f32) -> bool
    {
        other.corners().iter().all(|c| self.contains_point(*c, tolerance))
    }

    /// Separating axis test over the 15 candidate axes. Touching boxes overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool
    {
        let a = self.half_extents;
        let b = other.half_extents;

        // other's axes expressed in self's frame
        let mut r = [[0.0f32; 3]; 3];
        let mut abs_r = [[0.0f32; 3]; 3];
        for i in 0..3
        {
            for j in 0..3
            {
                r[i][j] = self.axis(i).dot(other.axis(j));
                abs_r[i][j] = r[i][j].abs() + Self::SAT_EPSILON;
            }
        }

        let offset = other.center - self.center;
        let t = [offset.dot(self.axis(0)), offset.dot(self.axis(1)), offset.dot(self.axis(2))];

        // self's face normals
        for i in 0..3
        {
            let ra = a[i];
            let rb = b[0] * abs_r[i][0] + b[1] * abs_r[i][1] + b[2] * abs_r[i][2];
            if t[i].abs() > ra + rb
            {
                return false;
            }
        }

        // other's face normals
        for j in 0..3
        {
            let ra = a[0] * abs_r[0][j] + a[1] * abs_r[1][j] + a[2] * abs_r[2][j];
            let rb = b[j];
            let dist = t[0] * r[0][j] + t[1] * r[1][j] + t[2] * r[2][j];
            if dist.abs() > ra + rb
            {
                return false;
            }
        }

        // edge cross products
        for i in 0..3
        {
            let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
            for j in 0..3
            {
                let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
                let ra = a[i1] * abs_r[i2][j] + a[i2] * abs_r[i1][j];
                let rb = b[j1] * abs_r[i][j2] + b[j2] * abs_r[i][j1];
                let dist = t[i2] * r[i1][j] - t[i1] * r[i2][j];
                if dist.abs() > ra + rb
                {
                    return false;
                }
            }
        }

        true
    }
}
impl Debug for OBB
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct(Self::short_type_name())
            .field("center", &self.center)
            .field("half_extents", &self.half_extents)
            .field("x_axis", &self.rotation.x_axis)
            .field("y_axis", &self.rotation.y_axis)
            .field("z_axis", &self.rotation.z_axis)
            .finish()
    }
}
impl Intersects<&OBB> for OBB
{
    fn get_intersection(&self, other: &OBB) -> Intersection
    {
        if !self.overlaps(other) { Intersection::None }
        else if self.contains_obb(other, 0.0) { Intersection::FullyContained }
        else { Intersection::Overlapping }
    }
}
impl IsOnOrInside<Vec3> for OBB
{
    fn rhs_is_on_or_inside(&self, other: Vec3) -> bool { self.contains_point(other, 0.0) }
}

#[cfg(test)]
mod tests
{
    use approx::assert_abs_diff_eq;
    use glam::Quat;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;
    use super::*;

    fn rotated(center: Vec3, half_extents: Vec3, axis: Vec3, angle: f32) -> OBB
    {
        OBB::new(center, half_extents, Mat3::from_quat(Quat::from_axis_angle(axis.normalize(), angle)))
    }

    #[test]
    fn from_points_empty()
    {
        assert!(OBB::from_points(&[], 1.0).is_none());
    }

    #[test]
    fn from_points_single()
    {
        let obb = OBB::from_points(&[Vec3::new(1.0, 2.0, 3.0)], 0.5).unwrap();
        assert_abs_diff_eq!(obb.center, Vec3::new(1.0, 2.0, 3.0));
        assert_abs_diff_eq!(obb.half_extents, Vec3::splat(0.5));
    }

    #[test]
    fn from_points_line()
    {
        let points: Vec<_> = (0..4).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
        let obb = OBB::from_points(&points, 0.0).unwrap();
        assert_abs_diff_eq!(obb.center, Vec3::new(1.5, 0.0, 0.0));
        assert_abs_diff_eq!(obb.half_extents, Vec3::new(1.5, 0.0, 0.0));
        assert_abs_diff_eq!(obb.axis(0).abs(), Vec3::X);
    }

    #[test]
    fn from_points_encloses()
    {
        let mut rng = StdRng::seed_from_u64(0x0bb);
        let tilt = Mat3::from_quat(Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.3).normalize(), 0.7));
        let points: Vec<_> = (0..200)
            .map(|_| tilt * Vec3::new(
                rng.random_range(-5.0..5.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-0.2..0.2)))
            .collect();

        let radius = 0.25;
        let obb = OBB::from_points(&points, radius).unwrap();
        for p in &points
        {
            assert!(obb.contains_point(*p, 1e-4), "{p} outside {obb:?}");
        }

        // the longest side of the cloud ends up on axis 0
        assert!(obb.half_extents.x >= obb.half_extents.y);
        assert!(obb.half_extents.y >= obb.half_extents.z);
        assert!(obb.axis(0).dot(tilt.x_axis).abs() > 0.99);
        assert!(obb.half_extents.z >= radius);
    }

    #[test]
    fn corners()
    {
        let obb = OBB::from_center_half(Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 2.0, 3.0));
        let corners = obb.corners();
        assert_eq!(corners[0], Vec3::new(0.0, -2.0, -3.0));
        assert_eq!(corners[7], Vec3::new(2.0, 2.0, 3.0));
        for c in corners
        {
            assert!(obb.contains_point(c, 1e-6));
        }

        let refit = OBB::from_points(&corners, 0.0).unwrap();
        assert_abs_diff_eq!(refit.volume(), obb.volume(), epsilon = 1e-3);
    }

    #[test]
    fn overlaps_axis_aligned()
    {
        let a = OBB::from_center_half(Vec3::ZERO, Vec3::ONE);
        let b = OBB::from_center_half(Vec3::new(1.5, 0.0, 0.0), Vec3::ONE);
        let c = OBB::from_center_half(Vec3::new(2.0, 0.0, 0.0), Vec3::ONE); // touching
        let d = OBB::from_center_half(Vec3::new(2.5, 0.0, 0.0), Vec3::ONE);

        assert!(a.overlaps(&b) && b.overlaps(&a));
        assert!(a.overlaps(&c) && c.overlaps(&a));
        assert!(!a.overlaps(&d) && !d.overlaps(&a));
    }

    #[test]
    fn overlaps_rotated()
    {
        let a = OBB::from_center_half(Vec3::ZERO, Vec3::ONE);

        // a diamond whose tip pokes into a from the side
        let diamond = rotated(Vec3::new(2.3, 0.0, 0.0), Vec3::ONE, Vec3::Z, std::f32::consts::FRAC_PI_4);
        assert!(a.overlaps(&diamond));
        assert!(diamond.overlaps(&a));

        // far enough that only the rotated extent would reach
        let diamond = rotated(Vec3::new(2.5, 0.0, 0.0), Vec3::ONE, Vec3::Z, std::f32::consts::FRAC_PI_4);
        assert!(!a.overlaps(&diamond));

        // crossed sticks, offset along their shared y axis
        let edge_a = rotated(Vec3::ZERO, Vec3::new(2.0, 0.1, 0.1), Vec3::Y, std::f32::consts::FRAC_PI_4);
        let edge_b = rotated(Vec3::new(0.0, 0.0, 0.5), Vec3::new(2.0, 0.1, 0.1), Vec3::Y, -std::f32::consts::FRAC_PI_4)
            .translated(Vec3::new(0.0, 0.5, 0.0));
        assert!(!edge_a.overlaps(&edge_b));
        assert!(!edge_b.overlaps(&edge_a));
    }

    #[test]
    fn overlaps_agrees_with_sphere_bounds()
    {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500
        {
            let a = rotated(
                Vec3::new(rng.random_range(-4.0..4.0), rng.random_range(-4.0..4.0), rng.random_range(-4.0..4.0)),
                Vec3::new(rng.random_range(0.1..2.0), rng.random_range(0.1..2.0), rng.random_range(0.1..2.0)),
                Vec3::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0), 1.0),
                rng.random_range(0.0..6.0));
            let b = rotated(
                Vec3::new(rng.random_range(-4.0..4.0), rng.random_range(-4.0..4.0), rng.random_range(-4.0..4.0)),
                Vec3::new(rng.random_range(0.1..2.0), rng.random_range(0.1..2.0), rng.random_range(0.1..2.0)),
                Vec3::new(1.0, rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)),
                rng.random_range(0.0..6.0));

            assert_eq!(a.overlaps(&b), b.overlaps(&a));
            if a.center.distance(b.center) > a.bounding_radius() + b.bounding_radius()
            {
                assert!(!a.overlaps(&b));
            }
            // a shared center always overlaps
            assert!(a.overlaps(&b.translated(a.center - b.center)));
        }
    }

    #[test]
    fn containment()
    {
        let outer = rotated(Vec3::ZERO, Vec3::splat(3.0), Vec3::new(0.2, 1.0, 0.1), 0.4);
        let inner = rotated(Vec3::new(0.2, 0.1, 0.0), Vec3::splat(0.5), Vec3::X, 1.0);
        assert_eq!(outer.get_intersection(&inner), Intersection::FullyContained);
        assert_eq!(inner.get_intersection(&outer), Intersection::Overlapping);
        assert!(outer.rhs_is_on_or_inside(inner.center));

        let far = inner.translated(Vec3::splat(20.0));
        assert_eq!(outer.get_intersection(&far), Intersection::None);
    }
}
