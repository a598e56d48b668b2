use std::sync::Arc;
use parking_lot::RwLock;
use containers_obbtree::ObbTree;
use math_obbtree::OBB;
use crate::scenes::*;

fn sorted_hits<const C: usize>(tree: &ObbTree<C>, query: &OBB) -> Vec<u32>
{
    let mut hits = Vec::new();
    tree.query(&mut hits, query);
    hits.sort_unstable();
    hits
}

#[test]
fn concurrent_readers()
{
    let scene = point_scene(808, 2000, 70.0, 0.1);
    let mut tree = ObbTree::<4>::new();
    tree.build(&scene.boxes, &scene.clouds, 0.1).unwrap();

    let mut rng = seeded(17);
    let queries: Vec<OBB> = (0..64).map(|_| random_obb(&mut rng, 70.0, 10.0)).collect();
    let expected: Vec<Vec<u32>> = queries.iter().map(|q| sorted_hits(&tree, q)).collect();

    let tree = Arc::new(RwLock::new(tree));
    crossbeam::scope(|scope|
    {
        for thread in 0..8
        {
            let tree = tree.clone();
            let queries = &queries;
            let expected = &expected;
            scope.spawn(move |_|
            {
                for (q, query) in queries.iter().enumerate().skip(thread).step_by(8)
                {
                    let tree = tree.read();
                    assert_eq!(sorted_hits(&*tree, query), expected[q], "query {q} on thread {thread}");
                }
            });
        }
    }).unwrap();

    // a writer gets exclusive access in between readers
    let moved = scene.boxes[0].translated(glam::Vec3::splat(200.0));
    assert!(tree.write().update(0, moved));
    assert!(sorted_hits(&*tree.read(), &moved).contains(&0));
}

#[test]
fn independent_parallel_builds()
{
    let scenes: Vec<TestScene> = (0..6).map(|i| point_scene(1000 + i, 600, 40.0, 0.0)).collect();

    let trees: Vec<ObbTree<4>> = crossbeam::scope(|scope|
    {
        let handles: Vec<_> = scenes.iter()
            .map(|scene| scope.spawn(move |_|
            {
                let mut tree = ObbTree::<4>::new();
                tree.build(&scene.boxes, &scene.clouds, 0.0).unwrap();
                tree
            }))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    }).unwrap();

    for (tree, scene) in trees.iter().zip(&scenes)
    {
        let mut serial = ObbTree::<4>::new();
        serial.build(&scene.boxes, &scene.clouds, 0.0).unwrap();
        tree.validate().unwrap();
        assert_eq!(tree.node_count(), serial.node_count());
        assert!(tree.nodes().iter().zip(serial.nodes()).all(|(a, b)| a.obb == b.obb));
    }
}
