use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use glam::Vec3;
use smallvec::SmallVec;
use math_obbtree::OBB;
use nab_obbtree::{debug_panic, AllocError};
use crate::{NodeArena, NodeIndex, ObbNode};

#[derive(Debug, Clone, PartialEq)]
pub enum ObbTreeError
{
    Alloc(AllocError),
    MismatchedInputs { boxes: usize, point_sets: usize },
    TooManyElements { count: usize },
    Invariant { node: NodeIndex, reason: &'static str },
}
impl Display for ObbTreeError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { Debug::fmt(self, f) }
}
impl Error for ObbTreeError
{
    fn source(&self) -> Option<&(dyn Error + 'static)>
    {
        match self
        {
            Self::Alloc(err) => Some(err),
            _ => None,
        }
    }
}
impl From<AllocError> for ObbTreeError
{
    fn from(err: AllocError) -> Self { Self::Alloc(err) }
}

/// Bounding volume hierarchy of oriented boxes, with up to `C` elements per leaf.
///
/// Nodes are stored in pre-order: the subtree of node `i` is exactly the node range `[i, i + skip]`,
/// which lets queries walk the node array front to back without a stack.
pub struct ObbTree<const C: usize = 4>
{
    pub(crate) nodes: NodeArena<ObbNode<C>>,
    pub(crate) root: NodeIndex,
    pub(crate) mapping: Vec<NodeIndex>, // element -> leaf
    pub(crate) element_obbs: Vec<OBB>,
    pub(crate) inflation_radius: f32, // from the last build, reapplied when refitting leaves
}
impl<const C: usize> ObbTree<C>
{
    pub(crate) const LEAF_CAPACITY_CHECK: () = assert!(C > 0, "Leaf capacity must be at least one element");

    #[inline] #[must_use]
    pub const fn new() -> Self
    {
        Self
        {
            nodes: NodeArena::new(),
            root: NodeIndex::none(),
            mapping: Vec::new(),
            element_obbs: Vec::new(),
            inflation_radius: 0.0,
        }
    }

    #[inline] #[must_use] pub fn node_count(&self) -> usize { self.nodes.len() }
    #[inline] #[must_use] pub fn capacity(&self) -> usize { self.nodes.capacity() }
    #[inline] #[must_use] pub fn root(&self) -> NodeIndex { self.root }
    #[inline] #[must_use] pub fn is_empty(&self) -> bool { self.nodes.is_empty() }
    #[inline] #[must_use] pub fn nodes(&self) -> &[ObbNode<C>] { self.nodes.as_slice() }
    #[inline] #[must_use] pub fn element_count(&self) -> usize { self.mapping.len() }
    #[inline] #[must_use] pub fn inflation_radius(&self) -> f32 { self.inflation_radius }

    #[inline] #[must_use]
    pub fn node(&self, node: NodeIndex) -> &ObbNode<C>
    {
        debug_assert!(node.index() < self.nodes.len(), "{node:?} is beyond the {} allocated nodes", self.nodes.len());
        &self.nodes[node]
    }

    #[inline] #[must_use] pub fn node_obb(&self, node: NodeIndex) -> &OBB { &self.node(node).obb }
    #[inline] #[must_use] pub fn is_node_leaf(&self, node: NodeIndex) -> bool { self.node(node).is_leaf() }
    #[inline] #[must_use] pub fn node_skip(&self, node: NodeIndex) -> u32 { self.node(node).skip }
    #[inline] #[must_use] pub fn node_left(&self, node: NodeIndex) -> NodeIndex { self.node(node).left }
    #[inline] #[must_use] pub fn node_right(&self, node: NodeIndex) -> NodeIndex { self.node(node).right }
    #[inline] #[must_use] pub fn node_parent(&self, node: NodeIndex) -> NodeIndex { self.node(node).parent }
    #[inline] #[must_use] pub fn node_member_count(&self, node: NodeIndex) -> usize { self.node(node).member_count() }
    #[inline] #[must_use] pub fn node_member(&self, node: NodeIndex, j: usize) -> u32 { self.node(node).member(j) }

    #[inline] #[must_use]
    pub fn leaf_of(&self, element: usize) -> NodeIndex
    {
        debug_assert!(element < self.mapping.len(), "Element {element} is out of range ({} elements)", self.mapping.len());
        self.mapping[element]
    }

    #[inline] #[must_use]
    pub fn element_obb(&self, element: usize) -> &OBB
    {
        debug_assert!(element < self.element_obbs.len(), "Element {element} is out of range ({} elements)", self.element_obbs.len());
        &self.element_obbs[element]
    }

    /// Drop every node and element, keeping the node storage for reuse.
    pub fn clear(&mut self)
    {
        self.nodes.clear();
        self.root = NodeIndex::none();
        self.mapping.clear();
        self.element_obbs.clear();
        self.inflation_radius = 0.0;
    }

    /// Append the members of every leaf whose box overlaps `query_obb` to `hits`.
    /// `hits` is neither cleared nor deduplicated. Returns the number of box overlap tests performed.
    pub fn query(&self, hits: &mut Vec<u32>, query_obb: &OBB) -> u32
    {
        self.query_nodes(query_obb, |_, leaf| hits.extend_from_slice(leaf.members()))
    }

    /// Calls `visit` for every leaf whose box overlaps `query_obb`.
    /// Returns the number of box overlap tests performed.
    pub fn query_nodes(&self, query_obb: &OBB, mut visit: impl FnMut(NodeIndex, &ObbNode<C>)) -> u32
    {
        let nodes = self.nodes.as_slice();
        let mut overlap_tests = 0;

        let mut i = 0;
        while i < nodes.len()
        {
            let node = &nodes[i];
            overlap_tests += 1;
            if node.obb.overlaps(query_obb)
            {
                if node.is_leaf()
                {
                    visit(NodeIndex::some(i), node);
                }
            }
            else
            {
                // jump past the whole subtree
                i += node.skip as usize;
            }
            i += 1;
        }

        overlap_tests
    }

    #[must_use]
    pub fn iter_overlapping(&self, query_obb: OBB) -> ObbTreeIterOverlapping<'_, C>
    {
        ObbTreeIterOverlapping
        {
            nodes: self.nodes.as_slice(),
            query_obb,
            next_node: 0,
            members: &[],
        }
    }

    /// Number of nodes from `element`'s leaf up to and including the root, 0 if the element isn't in the tree.
    #[must_use]
    pub fn height(&self, element: usize) -> u32
    {
        let leaf = self.leaf_of(element);
        if leaf.is_none()
        {
            return 0;
        }

        let mut height = 1;
        let mut current = self.nodes[leaf].parent;
        while current.is_some()
        {
            height += 1;
            current = self.nodes[current].parent;
        }
        height
    }

    /// Replace `element`'s box and refit its leaf over the corners of its members' boxes, grown by the build's inflation radius.
    /// Then refit each ancestor that no longer encloses its changed child.
    /// Ancestors stay enclosing but may be looser than a fresh build would make them.
    /// Returns false if the element was never placed by a build.
    pub fn update(&mut self, element: usize, obb: OBB) -> bool
    {
        let leaf = self.leaf_of(element);
        if leaf.is_none()
        {
            debug_panic!("Element {element} was never placed by a build");
            return false;
        }
        self.element_obbs[element] = obb;

        let members = self.nodes[leaf].members();
        let mut corners: SmallVec<[Vec3; 32]> = SmallVec::with_capacity(members.len() * 8);
        for &member in members
        {
            corners.extend_from_slice(&self.element_obbs[member as usize].corners());
        }
        let leaf_obb = OBB::from_points(&corners, self.inflation_radius)
            .unwrap_or(OBB { half_extents: obb.half_extents + Vec3::splat(self.inflation_radius), ..obb });
        self.nodes[leaf].obb = leaf_obb;

        let mut refits = 1;
        let mut child = leaf;
        let mut current = self.nodes[leaf].parent;
        while current.is_some()
        {
            let child_obb = self.nodes[child].obb;
            let node = &self.nodes[current];
            if node.obb.contains_obb(&child_obb, 0.0)
            {
                break;
            }

            let mut corners = [Vec3::ZERO; 16];
            corners[..8].copy_from_slice(&self.nodes[node.left].obb.corners());
            corners[8..].copy_from_slice(&self.nodes[node.right].obb.corners());
            let parent = node.parent;
            if let Some(refit) = OBB::from_points(&corners, 0.0)
            {
                self.nodes[current].obb = refit;
            }

            refits += 1;
            child = current;
            current = parent;
        }

        log::trace!("Updated element {element}, refit {refits} node(s)");
        true
    }

    /// Check the structural invariants: pre-order layout, skip distances, links, leaf sizes and the element mapping.
    pub fn validate(&self) -> Result<(), ObbTreeError>
    {
        let fail = |node: NodeIndex, reason: &'static str| Err(ObbTreeError::Invariant { node, reason });

        let nodes = self.nodes.as_slice();
        if nodes.is_empty()
        {
            if self.root.is_some()
            {
                return fail(self.root, "Empty tree has a root");
            }
            if let Some(e) = self.mapping.iter().position(|m| m.is_some())
            {
                return fail(self.mapping[e], "Empty tree maps an element to a node");
            }
            return Ok(());
        }

        if self.root != NodeIndex::some(0)
        {
            return fail(self.root, "Root must be the first node");
        }
        if nodes[0].parent.is_some()
        {
            return fail(self.root, "Root has a parent");
        }
        if self.element_obbs.len() != self.mapping.len()
        {
            return fail(NodeIndex::none(), "Element boxes and mapping disagree on the element count");
        }

        let mut placed = vec![false; self.mapping.len()];
        for (i, node) in nodes.iter().enumerate()
        {
            let index = NodeIndex::some(i);
            let last = i + node.skip as usize;
            if last >= nodes.len()
            {
                return fail(index, "Skip runs past the last node");
            }

            if node.is_leaf()
            {
                if node.right.is_some() { return fail(index, "Leaf has a right child"); }
                if node.skip != 0 { return fail(index, "Leaf has a non-zero skip"); }
                if node.member_count() == 0 { return fail(index, "Leaf has no members"); }

                for &member in node.members()
                {
                    let member = member as usize;
                    if member >= placed.len() { return fail(index, "Leaf member is out of range"); }
                    if placed[member] { return fail(index, "Element is in more than one leaf"); }
                    if self.mapping[member] != index { return fail(index, "Element mapping disagrees with leaf"); }
                    placed[member] = true;
                }
                continue;
            }

            if node.member_count() != 0 { return fail(index, "Internal node has members"); }
            if node.left != NodeIndex::some(i + 1) || i + 1 >= nodes.len()
            {
                return fail(index, "Left child must directly follow its parent");
            }
            let right_expected = i + 2 + nodes[i + 1].skip as usize;
            if node.right != NodeIndex::some(right_expected) || right_expected >= nodes.len()
            {
                return fail(index, "Right child must directly follow the left subtree");
            }
            if last != right_expected + nodes[right_expected].skip as usize
            {
                return fail(index, "Skip does not span both subtrees");
            }
            if nodes[i + 1].parent != index || nodes[right_expected].parent != index
            {
                return fail(index, "Child does not link back to its parent");
            }
        }

        if nodes[0].skip as usize + 1 != nodes.len()
        {
            return fail(self.root, "Root subtree does not cover every node");
        }
        if placed.iter().any(|p| !p)
        {
            return fail(NodeIndex::none(), "Element is missing from every leaf");
        }
        Ok(())
    }
}
impl<const C: usize> Default for ObbTree<C>
{
    fn default() -> Self { Self::new() }
}
impl<const C: usize> Debug for ObbTree<C>
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        f.write_fmt(format_args!("ObbTree ({} nodes, {} elements)", self.node_count(), self.element_count()))?;
        if self.root.is_none()
        {
            return Ok(());
        }

        let mut queue = vec![(0, '^', self.root)];
        while let Some((depth, l_r, node)) = queue.pop()
        {
            if f.alternate()
            {
                f.write_fmt(format_args!("\n{:3}  ", node.0))?;
            }
            else
            {
                f.write_str("\n  ")?;
            }

            for i in 0..depth
            {
                f.write_str([" ┗━ ", "━━ "][i.min(1)])?;
            }
            let hydrated = &self.nodes[node];
            f.write_fmt(format_args!("[{l_r}] {:?}", hydrated.obb))?;
            if hydrated.is_leaf()
            {
                f.write_fmt(format_args!(" (Leaf) elements: {:?}", hydrated.members()))?;
            }
            if hydrated.right.is_some() { queue.push((depth + 1, 'R', hydrated.right)); }
            if hydrated.left.is_some() { queue.push((depth + 1, 'L', hydrated.left)); }
        }

        Ok(())
    }
}

/// Yields the members of overlapping leaves in node order, same traversal as `ObbTree::query`.
pub struct ObbTreeIterOverlapping<'t, const C: usize>
{
    nodes: &'t [ObbNode<C>],
    query_obb: OBB,
    next_node: usize,
    members: &'t [u32],
}
impl<const C: usize> Iterator for ObbTreeIterOverlapping<'_, C>
{
    type Item = u32;
    fn next(&mut self) -> Option<Self::Item>
    {
        loop
        {
            if let Some((first, rest)) = self.members.split_first()
            {
                self.members = rest;
                return Some(*first);
            }

            let node = self.nodes.get(self.next_node)?;
            self.next_node += 1;
            if !node.obb.overlaps(&self.query_obb)
            {
                self.next_node += node.skip as usize;
            }
            else if node.is_leaf()
            {
                self.members = node.members();
            }
        }
    }
}
