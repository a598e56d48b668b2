use std::ops::{Index, IndexMut};
use nab_obbtree::{format_binary, reserve_exact_to, AllocError};
use crate::NodeIndex;

/// Contiguous node storage addressed by `NodeIndex`.
/// Capacity grows by doubling (starting at 16 slots), and a failed growth is reported instead of aborting.
pub struct NodeArena<T>
{
    nodes: Vec<T>,
    capacity: usize,
}
impl<T: Default> NodeArena<T>
{
    pub const INITIAL_CAPACITY: usize = 16;

    #[inline] #[must_use]
    pub const fn new() -> Self
    {
        Self
        {
            nodes: Vec::new(),
            capacity: 0,
        }
    }

    #[inline] #[must_use] pub fn len(&self) -> usize { self.nodes.len() }
    #[inline] #[must_use] pub fn is_empty(&self) -> bool { self.nodes.is_empty() }
    #[inline] #[must_use] pub fn capacity(&self) -> usize { self.capacity }
    #[inline] #[must_use] pub fn as_slice(&self) -> &[T] { &self.nodes }
    #[inline] #[must_use] pub fn as_mut_slice(&mut self) -> &mut [T] { &mut self.nodes }

    #[inline] #[must_use]
    pub fn get(&self, index: NodeIndex) -> Option<&T>
    {
        index.get().and_then(|i| self.nodes.get(i))
    }

    // keeps the allocation around for the next build
    #[inline]
    pub fn clear(&mut self)
    {
        self.nodes.clear();
    }

    // releases the allocation
    pub fn reset(&mut self)
    {
        self.nodes = Vec::new();
        self.capacity = 0;
    }

    /// Append a default-initialized node, growing the storage if full.
    pub fn allocate(&mut self) -> Result<NodeIndex, AllocError>
    {
        let len = self.nodes.len();
        if len >= NodeIndex::NONE as usize
        {
            return Err(AllocError::CapacityOverflow { requested: len + 1 });
        }
        if len >= self.capacity
        {
            self.grow()?;
        }

        self.nodes.push(T::default());
        Ok(NodeIndex::some(len))
    }

    fn grow(&mut self) -> Result<(), AllocError>
    {
        let new_capacity = match self.capacity
        {
            0 => Self::INITIAL_CAPACITY,
            n => n.checked_mul(2).ok_or(AllocError::CapacityOverflow { requested: n })?,
        };

        reserve_exact_to(&mut self.nodes, new_capacity)?;
        self.capacity = new_capacity;
        log::trace!("Grew node arena to {new_capacity} nodes ({:.1}B)",
            format_binary!(new_capacity * size_of::<T>()));
        Ok(())
    }
}
impl<T: Default> Default for NodeArena<T>
{
    fn default() -> Self { Self::new() }
}
impl<T> Index<NodeIndex> for NodeArena<T>
{
    type Output = T;

    #[inline]
    fn index(&self, index: NodeIndex) -> &Self::Output
    {
        &self.nodes[index.index()]
    }
}
impl<T> IndexMut<NodeIndex> for NodeArena<T>
{
    #[inline]
    fn index_mut(&mut self, index: NodeIndex) -> &mut Self::Output
    {
        &mut self.nodes[index.index()]
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[derive(Default, Debug, PartialEq)]
    #[repr(align(32))]
    struct Wide([u64; 3]);

    #[test]
    fn growth()
    {
        let mut arena = NodeArena::<u32>::new();
        assert_eq!(arena.capacity(), 0);

        let first = arena.allocate().unwrap();
        assert_eq!(first, NodeIndex::some(0));
        assert_eq!(arena.capacity(), 16);

        for _ in 1..16 { arena.allocate().unwrap(); }
        assert_eq!(arena.capacity(), 16);

        let seventeenth = arena.allocate().unwrap();
        assert_eq!(seventeenth, NodeIndex::some(16));
        assert_eq!(arena.capacity(), 32);
        assert_eq!(arena.len(), 17);
    }

    #[test]
    fn contents_survive_growth()
    {
        let mut arena = NodeArena::<u32>::new();
        for i in 0..40
        {
            let index = arena.allocate().unwrap();
            arena[index] = i * 3;
        }
        assert_eq!(arena.capacity(), 64);
        assert!(arena.as_slice().iter().enumerate().all(|(i, v)| *v == i as u32 * 3));
        assert_eq!(arena.get(NodeIndex::some(39)), Some(&117));
        assert_eq!(arena.get(NodeIndex::some(40)), None);
        assert_eq!(arena.get(NodeIndex::none()), None);
    }

    #[test]
    fn clear_keeps_capacity()
    {
        let mut arena = NodeArena::<u32>::new();
        for _ in 0..20 { arena.allocate().unwrap(); }
        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(arena.capacity(), 32);

        arena.reset();
        assert_eq!(arena.capacity(), 0);
    }

    #[test]
    fn aligned()
    {
        let mut arena = NodeArena::<Wide>::new();
        for _ in 0..5 { arena.allocate().unwrap(); }
        assert_eq!(arena.as_slice().as_ptr() as usize % 32, 0);
        assert_eq!(arena[NodeIndex::some(4)], Wide::default());
    }
}
