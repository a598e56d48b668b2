use std::fmt::{Debug, Formatter};
use glam::{Vec3, Vec4, Vec4Swizzles};
use crate::{CenterDistance, Intersection, Intersects, IsOnOrInside};
use nab_obbtree::utils::ShortTypeName;

#[derive(Default, Clone, Copy, PartialEq)]
pub struct Sphere(pub Vec4);
impl Sphere
{
    pub const EMPTY: Self = Self(Vec4::ZERO);

    #[inline] #[must_use] pub fn new(center: Vec3, radius: f32) -> Self
    {
        Self(Vec4::new(center.x, center.y, center.z, radius))
    }

    #[inline] #[must_use] pub fn center(&self) -> Vec3 { self.0.xyz() }
    #[inline] #[must_use] pub fn radius(&self) -> f32 { self.0.w }
    #[inline] #[must_use] pub fn radius_squared(&self) -> f32 { self.0.w * self.0.w }

    #[inline] #[must_use]
    pub fn expanded(self, add_radius: f32) -> Self
    {
        Self(Vec4::new(self.0.x, self.0.y, self.0.z, self.0.w + add_radius))
    }
}
impl Debug for Sphere
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct(Self::short_type_name())
            .field("center", &self.center())
            .field("radius", &self.radius())
            .finish()
    }
}
impl From<Vec4> for Sphere
{
    fn from(value: Vec4) -> Self
    {
        Self(value)
    }
}
impl IsOnOrInside<Vec3> for Sphere
{
    fn rhs_is_on_or_inside(&self, other: Vec3) -> bool
    {
        self.center().distance_squared(other) <= self.radius_squared()
    }
}
impl Intersects<Sphere> for Sphere
{
    fn get_intersection(&self, other: Sphere) -> Intersection
    {
        let dist = self.center().distance(other.center());
        if dist + other.radius() <= self.radius()
        {
            Intersection::FullyContained
        }
        else if dist <= self.radius() + other.radius()
        {
            Intersection::Overlapping
        }
        else
        {
            Intersection::None
        }
    }
}
impl CenterDistance<Sphere> for Sphere
{
    fn center_distance_sq(&self, other: Sphere) -> f32
    {
        self.center().distance_squared(other.center())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn intersections()
    {
        let a = Sphere::new(Vec3::ZERO, 2.0);
        assert_eq!(a.get_intersection(Sphere::new(Vec3::X, 0.5)), Intersection::FullyContained);
        assert_eq!(a.get_intersection(Sphere::new(Vec3::new(2.5, 0.0, 0.0), 1.0)), Intersection::Overlapping);
        assert_eq!(a.get_intersection(Sphere::new(Vec3::new(5.0, 0.0, 0.0), 1.0)), Intersection::None);
        assert!(!a.get_intersection(Sphere::new(Vec3::new(5.0, 0.0, 0.0), 1.0)).is_any());
    }

    #[test]
    fn distances()
    {
        let a = Sphere::new(Vec3::ZERO, 1.0);
        let b = Sphere::new(Vec3::new(3.0, 4.0, 0.0), 1.0);
        assert_eq!(a.center_distance_sq(b), 25.0);
        assert_eq!(a.center_distance(b), 5.0);
        assert!(a.expanded(1.0).rhs_is_on_or_inside(Vec3::new(0.0, 2.0, 0.0)));
        assert!(!a.rhs_is_on_or_inside(Vec3::new(0.0, 2.0, 0.0)));
    }
}
