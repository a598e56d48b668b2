use std::fmt::{Debug, Formatter};

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct NodeIndex(pub u32);
impl NodeIndex
{
    pub const NONE: u32 = u32::MAX;

    #[inline] #[must_use] pub const fn none() -> Self { Self(Self::NONE) }
    #[inline] #[must_use] pub const fn some(n: usize) -> Self
    {
        debug_assert!(n < Self::NONE as usize, "Node index collides with the invalid sentinel");
        Self(n as u32)
    }

    #[inline] #[must_use] pub const fn is_none(self) -> bool { self.0 == Self::NONE }
    #[inline] #[must_use] pub const fn is_some(self) -> bool { self.0 != Self::NONE }

    // only meaningful if is_some()
    #[inline] #[must_use] pub const fn index(self) -> usize { self.0 as usize }

    #[inline] #[must_use]
    pub const fn get(self) -> Option<usize>
    {
        match self.is_some()
        {
            true => Some(self.0 as usize),
            false => None,
        }
    }
}
impl Default for NodeIndex
{
    fn default() -> Self { Self::none() }
}
impl Debug for NodeIndex
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self.get()
        {
            Some(i) => write!(f, "#{i}"),
            None => f.write_str("#none"),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn basic()
    {
        assert!(NodeIndex::none().is_none());
        assert!(NodeIndex::default().is_none());
        assert!(NodeIndex::some(0).is_some());
        assert!(NodeIndex::some(1).is_some());
        assert!(NodeIndex::some(u32::MAX as usize - 1).is_some());
        assert_eq!(NodeIndex::none().0, 0xffff_ffff);
    }

    #[test]
    fn get()
    {
        assert_eq!(NodeIndex::some(7).get(), Some(7));
        assert_eq!(NodeIndex::some(7).index(), 7);
        assert_eq!(NodeIndex::none().get(), None);
        assert_eq!(format!("{:?} {:?}", NodeIndex::some(3), NodeIndex::none()), "#3 #none");
    }
}
