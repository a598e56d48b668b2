use glam::Vec3;
use containers_obbtree::{NodeIndex, ObbTree};
use math_obbtree::{Intersects, OBB};
use crate::scenes::*;

fn check_coverage<const C: usize>(tree: &ObbTree<C>, element_count: usize)
{
    let mut placed = vec![0u32; element_count];
    for leaf in leaves(tree)
    {
        let count = tree.node_member_count(leaf);
        assert!((1..=C).contains(&count), "{leaf:?} holds {count} members");
        for j in 0..count
        {
            let element = tree.node_member(leaf, j) as usize;
            placed[element] += 1;
            assert_eq!(tree.leaf_of(element), leaf);
        }
    }
    assert!(placed.iter().all(|p| *p == 1), "every element must be in exactly one leaf");
}

fn check_layout<const C: usize>(tree: &ObbTree<C>)
{
    // count each node's subtree by walking parents and compare against the skip range
    let mut subtree_sizes = vec![0u32; tree.node_count()];
    for n in 0..tree.node_count()
    {
        for ancestor in ancestors(tree, NodeIndex::some(n))
        {
            subtree_sizes[ancestor.index()] += 1;
            assert!(ancestor.index() <= n);
            assert!(n <= ancestor.index() + tree.node_skip(ancestor) as usize, "node {n} outside the range of {ancestor:?}");
        }
    }
    for n in 0..tree.node_count()
    {
        assert_eq!(subtree_sizes[n], tree.node_skip(NodeIndex::some(n)) + 1);
    }
}

#[test]
fn structure_across_capacities()
{
    let scene = point_scene(11, 777, 60.0, 0.1);

    let mut tree1 = ObbTree::<1>::new();
    tree1.build(&scene.boxes, &scene.clouds, 0.1).unwrap();
    check_coverage(&tree1, 777);
    check_layout(&tree1);
    assert_eq!(tree1.node_count(), 2 * 777 - 1);

    let mut tree4 = ObbTree::<4>::new();
    tree4.build(&scene.boxes, &scene.clouds, 0.1).unwrap();
    check_coverage(&tree4, 777);
    check_layout(&tree4);

    let mut tree16 = ObbTree::<16>::new();
    tree16.build(&scene.boxes, &scene.clouds, 0.1).unwrap();
    check_coverage(&tree16, 777);
    check_layout(&tree16);

    assert!(tree16.node_count() < tree4.node_count());
    assert!(tree4.node_count() < tree1.node_count());
}

#[test]
fn capacity_doubles()
{
    let scene = point_scene(3, 40, 20.0, 0.0);
    let mut tree = ObbTree::<1>::new();
    tree.build(&scene.boxes, &scene.clouds, 0.0).unwrap();

    // 79 nodes: 16 -> 32 -> 64 -> 128
    assert_eq!(tree.node_count(), 79);
    assert_eq!(tree.capacity(), 128);

    // a smaller rebuild reuses the storage
    tree.build(&scene.boxes[..5], &scene.clouds[..5], 0.0).unwrap();
    assert_eq!(tree.node_count(), 9);
    assert_eq!(tree.capacity(), 128);
}

#[test]
fn enclosure()
{
    let scene = point_scene(21, 400, 40.0, 0.2);
    let mut tree = ObbTree::<3>::new();
    tree.build(&scene.boxes, &scene.clouds, 0.2).unwrap();

    for leaf in leaves(&tree)
    {
        for &element in tree.node(leaf).members()
        {
            for node in ancestors(&tree, leaf)
            {
                let obb = tree.node_obb(node);
                for p in &scene.clouds[element as usize]
                {
                    assert!(obb.contains_point(*p, 1e-3), "{p} of element {element} escapes {node:?}");
                }
            }
        }
    }
}

#[test]
fn query_finds_every_touching_point()
{
    let scene = point_scene(5150, 1500, 50.0, 0.0);
    let mut tree = ObbTree::<4>::new();
    tree.build(&scene.boxes, &scene.clouds, 0.0).unwrap();

    let mut rng = seeded(8);
    let mut hits = Vec::new();
    for _ in 0..200
    {
        let query = random_obb(&mut rng, 50.0, 8.0);
        hits.clear();
        let tests = tree.query(&mut hits, &query);
        assert!(tests as usize <= tree.node_count());

        for (element, cloud) in scene.clouds.iter().enumerate()
        {
            // inflation 0 means a point on a node face is only enclosed up to rounding
            if cloud.iter().any(|p| query.contains_point(*p, -1e-3))
            {
                assert!(hits.contains(&(element as u32)), "missed element {element}");
            }
        }

        // nothing is reported from a leaf that misses the query
        for &hit in &hits
        {
            assert!(tree.node_obb(tree.leaf_of(hit as usize)).overlaps(&query));
        }
    }
}

#[test]
fn query_superset_of_overlapping_boxes()
{
    // with box corners as the point clouds every node encloses its elements' boxes
    let boxes = box_scene(2024, 1200, 60.0);
    let mut tree = ObbTree::<4>::new();
    tree.build_from_boxes(&boxes).unwrap();

    let mut rng = seeded(99);
    let mut hits = Vec::new();
    for _ in 0..200
    {
        let query = random_obb(&mut rng, 60.0, 10.0);
        hits.clear();
        tree.query(&mut hits, &query);
        hits.sort_unstable();

        for (element, obb) in boxes.iter().enumerate()
        {
            // shrunk slightly so rounding in the fit can't turn a graze into a miss
            let shrunk = OBB { half_extents: obb.half_extents - Vec3::splat(1e-3), ..*obb };
            if shrunk.overlaps(&query)
            {
                assert!(hits.binary_search(&(element as u32)).is_ok(), "missed element {element}");
            }
        }
    }
}

#[test]
fn separated_leaves_never_reported()
{
    let scene = point_scene(31337, 1000, 80.0, 0.1);
    let mut tree = ObbTree::<4>::new();
    tree.build(&scene.boxes, &scene.clouds, 0.1).unwrap();

    let mut rng = seeded(4);
    let mut hits = Vec::new();
    for _ in 0..100
    {
        let query = random_obb(&mut rng, 80.0, 6.0);
        hits.clear();
        tree.query(&mut hits, &query);

        for leaf in leaves(&tree)
        {
            let leaf_sphere = tree.node_obb(leaf).bounding_sphere();
            if !leaf_sphere.get_intersection(query.bounding_sphere()).is_any()
            {
                for &member in tree.node(leaf).members()
                {
                    assert!(!hits.contains(&member), "element {member} is separated from the query");
                }
            }
        }
    }
}

#[test]
fn selective_queries_prune()
{
    // a grid of unit cubes, queried with boxes around single cubes
    let mut boxes = Vec::new();
    for x in 0..16 { for y in 0..16 { for z in 0..4
    {
        boxes.push(OBB::from_center_half(Vec3::new(x as f32, y as f32, z as f32) * 3.0, Vec3::splat(0.5)));
    }}}

    let mut tree = ObbTree::<2>::new();
    tree.build_from_boxes(&boxes).unwrap();

    let mut hits = Vec::new();
    for (element, obb) in boxes.iter().enumerate().step_by(37)
    {
        hits.clear();
        let tests = tree.query(&mut hits, &OBB { half_extents: Vec3::splat(0.25), ..*obb });
        assert!(hits.contains(&(element as u32)));
        assert!((tests as usize) < tree.node_count() / 4, "{tests} overlap tests for a single-cube query");
    }
}

#[test]
fn heights()
{
    let scene = point_scene(77, 256, 30.0, 0.0);
    let mut tree = ObbTree::<1>::new();
    tree.build(&scene.boxes, &scene.clouds, 0.0).unwrap();

    for element in 0..256
    {
        let height = tree.height(element);
        assert!(height >= 2);
        assert_eq!(height as usize, ancestors(&tree, tree.leaf_of(element)).count());
    }
}
