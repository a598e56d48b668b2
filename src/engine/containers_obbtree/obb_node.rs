use arrayvec::ArrayVec;
use math_obbtree::OBB;
use crate::NodeIndex;

/// One node of an `ObbTree`. Leaves hold up to `C` element indices.
/// Internal nodes always have two children; `skip` is the number of nodes in the subtree below this one.
#[derive(Clone, Debug, Default)]
#[repr(C, align(32))]
pub struct ObbNode<const C: usize>
{
    pub obb: OBB,
    pub left: NodeIndex,
    pub right: NodeIndex,
    pub parent: NodeIndex,
    pub skip: u32,
    members: ArrayVec<u32, C>,
}
impl<const C: usize> ObbNode<C>
{
    #[inline] #[must_use] pub fn is_leaf(&self) -> bool { self.left.is_none() }
    #[inline] #[must_use] pub fn members(&self) -> &[u32] { &self.members }
    #[inline] #[must_use] pub fn member_count(&self) -> usize { self.members.len() }

    #[inline] #[must_use]
    pub fn member(&self, j: usize) -> u32
    {
        debug_assert!(j < self.members.len(), "Member {j} is out of range (leaf holds {})", self.members.len());
        self.members[j]
    }

    #[inline]
    pub(crate) fn set_members(&mut self, elements: &[u32])
    {
        debug_assert!(elements.len() <= C, "{} elements do not fit in a leaf of {C}", elements.len());
        self.members.clear();
        self.members.extend(elements.iter().copied().take(C));
    }
}
