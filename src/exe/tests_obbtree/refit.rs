use glam::{Mat3, Vec3};
use rand::Rng;
use containers_obbtree::ObbTree;
use math_obbtree::OBB;
use crate::scenes::*;

#[test]
fn update_keeps_enclosure()
{
    let boxes = box_scene(606, 500, 40.0);
    let mut tree = ObbTree::<4>::new();
    tree.build_from_boxes(&boxes).unwrap();
    let heights: Vec<u32> = (0..boxes.len()).map(|e| tree.height(e)).collect();

    let mut rng = seeded(1);
    let mut current = boxes.clone();
    for _ in 0..300
    {
        let element = rng.random_range(0..boxes.len());
        let offset = Vec3::new(rng.random_range(-15.0..15.0), rng.random_range(-15.0..15.0), rng.random_range(-15.0..15.0));
        let moved = current[element].translated(offset);
        let moved = rotated(moved, Mat3::from_rotation_z(rng.random_range(-1.0..1.0)));
        assert!(tree.update(element, moved));
        current[element] = moved;
    }

    tree.validate().unwrap();
    for (element, obb) in current.iter().enumerate()
    {
        assert_eq!(tree.height(element), heights[element]);
        assert_eq!(tree.element_obb(element), obb);
        for node in ancestors(&tree, tree.leaf_of(element))
        {
            assert!(tree.node_obb(node).contains_obb(obb, 1e-2), "{node:?} no longer encloses element {element}");
        }

        let mut hits = Vec::new();
        tree.query(&mut hits, obb);
        assert!(hits.contains(&(element as u32)));
    }
}

#[test]
fn rebuild_after_updates_matches_fresh()
{
    let boxes = box_scene(12, 200, 30.0);
    let mut tree = ObbTree::<2>::new();
    tree.build_from_boxes(&boxes).unwrap();

    // fling one element far away, which loosens every ancestor up to the root
    let far = boxes[0].translated(Vec3::splat(500.0));
    assert!(tree.update(0, far));
    assert!(tree.node_obb(tree.root()).contains_obb(&far, 1e-2));

    let mut moved = boxes.clone();
    moved[0] = far;
    tree.build_from_boxes(&moved).unwrap();

    let mut fresh = ObbTree::<2>::new();
    fresh.build_from_boxes(&moved).unwrap();
    assert_eq!(tree.node_count(), fresh.node_count());
    for (a, b) in tree.nodes().iter().zip(fresh.nodes())
    {
        assert_eq!(a.obb, b.obb);
        assert_eq!(a.members(), b.members());
        assert_eq!(a.skip, b.skip);
    }
}

#[test]
fn update_keeps_inflated_margin()
{
    let radius = 0.4;
    // element boxes fit tight, only the tree is inflated
    let scene = point_scene(4242, 300, 25.0, 0.0);
    let mut tree = ObbTree::<4>::new();
    tree.build(&scene.boxes, &scene.clouds, radius).unwrap();

    let element = (0..scene.boxes.len()).find(|e| tree.node_member_count(tree.leaf_of(*e)) > 1).unwrap();
    let sibling = tree.node(tree.leaf_of(element)).members().iter()
        .map(|m| *m as usize)
        .find(|m| *m != element)
        .unwrap();

    let offset = Vec3::new(3.0, -2.0, 1.0);
    let mut clouds = scene.clouds.clone();
    for p in &mut clouds[element] { *p += offset; }
    assert!(tree.update(element, scene.boxes[element].translated(offset)));
    tree.validate().unwrap();

    // just inside the inflated margin around one of the sibling's points
    let mut hits = Vec::new();
    for p in &clouds[sibling]
    {
        for dir in [Vec3::X, Vec3::NEG_Y, Vec3::Z]
        {
            hits.clear();
            tree.query(&mut hits, &OBB::from_center_half(*p + dir * (radius * 0.9), Vec3::splat(0.01)));
            assert!(hits.contains(&(sibling as u32)), "sibling {sibling} lost its margin along {dir}");
        }
    }

    for (e, cloud) in clouds.iter().enumerate()
    {
        for node in ancestors(&tree, tree.leaf_of(e))
        {
            let obb = tree.node_obb(node);
            for p in cloud
            {
                for axis in 0..3
                {
                    for sign in [-1.0, 1.0]
                    {
                        let grown = *p + obb.axis(axis) * (sign * radius);
                        assert!(obb.contains_point(grown, 1e-3), "{node:?} misses {grown} of element {e}");
                    }
                }
            }
        }
    }
}
