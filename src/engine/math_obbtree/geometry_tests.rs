#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Intersection
{
    None,
    Overlapping,
    FullyContained,
}
impl Intersection
{
    #[inline] #[must_use]
    pub fn is_any(self) -> bool { !matches!(self, Self::None) }
}

pub trait Intersects<T>
{
    fn get_intersection(&self, other: T) -> Intersection;
}

pub trait IsOnOrInside<T>
{
    fn rhs_is_on_or_inside(&self, other: T) -> bool;
}

// The distance from this object's center to another object's center
pub trait CenterDistance<T>
{
    fn center_distance(&self, other: T) -> f32 { self.center_distance_sq(other).sqrt() }
    fn center_distance_sq(&self, other: T) -> f32;
}
