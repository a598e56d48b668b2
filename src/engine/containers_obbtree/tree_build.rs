use glam::Vec3;
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use math_obbtree::OBB;
use nab_obbtree::iif_debug;
use crate::{NodeIndex, ObbTree, ObbTreeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions
{
    /// Run `ObbTree::validate` after every build
    pub validate: bool,
}
impl Default for BuildOptions
{
    fn default() -> Self
    {
        Self
        {
            validate: iif_debug!(true, false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChildSide
{
    Root,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
struct BuildTask
{
    start: usize,
    len: usize,
    parent: NodeIndex,
    side: ChildSide,
}

impl<const C: usize> ObbTree<C>
{
    /// Build the tree from one box and one point cloud per element. Any previous content is discarded.
    /// Every node box is fit over the points of its elements and grown by `inflation_radius`.
    /// Elements with an empty point cloud contribute the corners of their box instead.
    pub fn build<P: AsRef<[Vec3]>>(&mut self, boxes: &[OBB], point_sets: &[P], inflation_radius: f32) -> Result<(), ObbTreeError>
    {
        self.build_with(boxes, point_sets, inflation_radius, &BuildOptions::default())
    }

    /// Build using the corners of each element's box as its point cloud.
    pub fn build_from_boxes(&mut self, boxes: &[OBB]) -> Result<(), ObbTreeError>
    {
        let corners: Vec<[Vec3; 8]> = boxes.iter().map(OBB::corners).collect();
        self.build(boxes, &corners, 0.0)
    }

    pub fn build_with<P: AsRef<[Vec3]>>(
        &mut self,
        boxes: &[OBB],
        point_sets: &[P],
        inflation_radius: f32,
        options: &BuildOptions) -> Result<(), ObbTreeError>
    {
        let () = Self::LEAF_CAPACITY_CHECK;

        if boxes.len() != point_sets.len()
        {
            return Err(ObbTreeError::MismatchedInputs { boxes: boxes.len(), point_sets: point_sets.len() });
        }
        if boxes.len() >= NodeIndex::NONE as usize
        {
            return Err(ObbTreeError::TooManyElements { count: boxes.len() });
        }

        self.clear();
        self.mapping.resize(boxes.len(), NodeIndex::none());
        self.element_obbs.extend_from_slice(boxes);
        self.inflation_radius = inflation_radius;
        if boxes.is_empty()
        {
            log::debug!("Built empty OBB tree");
            return Ok(());
        }

        let empty_clouds = point_sets.iter().filter(|p| p.as_ref().is_empty()).count();
        if empty_clouds > 0
        {
            log::warn!("{empty_clouds} of {} elements have no points, fitting their box corners instead", boxes.len());
        }

        if let Err(err) = self.build_nodes(boxes, point_sets, inflation_radius)
        {
            log::error!("Failed to build OBB tree of {} elements: {err}", boxes.len());
            self.nodes.reset();
            self.clear();
            return Err(err.into());
        }
        self.update_skips();

        log::debug!("Built OBB tree: {} elements, {} nodes (capacity {}), leaf capacity {C}",
            boxes.len(), self.node_count(), self.capacity());

        if options.validate
        {
            self.validate()?;
        }
        Ok(())
    }

    fn build_nodes<P: AsRef<[Vec3]>>(
        &mut self,
        boxes: &[OBB],
        point_sets: &[P],
        inflation_radius: f32) -> Result<(), nab_obbtree::AllocError>
    {
        // partitioned instead of the caller's buffers
        let mut order: Vec<u32> = (0..boxes.len() as u32).collect();
        let mut points = Vec::new();

        let mut stack: SmallVec<[BuildTask; 32]> = smallvec![BuildTask
        {
            start: 0,
            len: boxes.len(),
            parent: NodeIndex::none(),
            side: ChildSide::Root,
        }];
        while let Some(task) = stack.pop()
        {
            let elements = &mut order[task.start..(task.start + task.len)];
            let obb = Self::fit_elements(elements, boxes, point_sets, inflation_radius, &mut points);

            let node_index = self.nodes.allocate()?;
            match task.side
            {
                ChildSide::Root => self.root = node_index,
                ChildSide::Left => self.nodes[task.parent].left = node_index,
                ChildSide::Right => self.nodes[task.parent].right = node_index,
            }

            let node = &mut self.nodes[node_index];
            node.obb = obb;
            node.parent = task.parent;

            if task.len <= C
            {
                node.set_members(elements);
                for &element in elements.iter()
                {
                    self.mapping[element as usize] = node_index;
                }
                continue;
            }

            let split = Self::partition(elements, boxes, &obb);

            // right goes on the stack first so the whole left subtree is laid out before it
            stack.push(BuildTask
            {
                start: task.start + split,
                len: task.len - split,
                parent: node_index,
                side: ChildSide::Right,
            });
            stack.push(BuildTask
            {
                start: task.start,
                len: split,
                parent: node_index,
                side: ChildSide::Left,
            });
        }

        Ok(())
    }

    fn fit_elements<P: AsRef<[Vec3]>>(
        elements: &[u32],
        boxes: &[OBB],
        point_sets: &[P],
        inflation_radius: f32,
        points: &mut Vec<Vec3>) -> OBB
    {
        points.clear();
        for &element in elements
        {
            let cloud = point_sets[element as usize].as_ref();
            match cloud.is_empty()
            {
                true => points.extend_from_slice(&boxes[element as usize].corners()),
                false => points.extend_from_slice(cloud),
            }
        }

        // every element contributes at least one point
        OBB::from_points(points, inflation_radius).unwrap_or_default()
    }

    /// Split `elements` along the largest spread of `obb`, returning the start of the right half.
    /// Neither half is ever empty.
    fn partition(elements: &mut [u32], boxes: &[OBB], obb: &OBB) -> usize
    {
        let len = elements.len();
        debug_assert!(len >= 2, "Cannot split {len} elements");

        let mut start_right = len;
        if len != 2
        {
            let axis = obb.axis(0);
            let mut i = 0;
            while i < start_right
            {
                let projection = (boxes[elements[i] as usize].center - obb.center).dot(axis);
                if projection < 0.0
                {
                    i += 1;
                }
                else
                {
                    start_right -= 1;
                    elements.swap(i, start_right);
                }
            }
        }

        // one side came up empty (or exactly two elements), move one across
        if start_right == len { start_right = len - 1; }
        if start_right == 0 { start_right = 1; }
        start_right
    }

    // children always sit after their parent, so walking backwards sees every subtree before its root
    fn update_skips(&mut self)
    {
        let nodes = self.nodes.as_mut_slice();
        for i in (0..nodes.len()).rev()
        {
            let node = &nodes[i];
            let skip = match node.is_leaf()
            {
                true => 0,
                false => (nodes[node.left.index()].skip + 1) + (nodes[node.right.index()].skip + 1),
            };
            nodes[i].skip = skip;
        }
    }
}
