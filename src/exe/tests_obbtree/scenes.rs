use glam::{Mat3, Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use containers_obbtree::{NodeIndex, ObbTree};
use math_obbtree::OBB;

pub struct TestScene
{
    pub boxes: Vec<OBB>,
    pub clouds: Vec<Vec<Vec3>>,
}

pub fn seeded(seed: u64) -> StdRng { StdRng::seed_from_u64(seed) }

pub fn random_rotation(rng: &mut StdRng) -> Mat3
{
    let axis = Vec3::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0));
    Mat3::from_quat(Quat::from_axis_angle(axis.normalize_or(Vec3::X), rng.random_range(0.0..std::f32::consts::TAU)))
}

pub fn random_obb(rng: &mut StdRng, extent: f32, max_half: f32) -> OBB
{
    let center = Vec3::new(
        rng.random_range(-extent..extent),
        rng.random_range(-extent..extent),
        rng.random_range(-extent..extent));
    let half = Vec3::new(
        rng.random_range(0.05..max_half),
        rng.random_range(0.05..max_half),
        rng.random_range(0.05..max_half));
    OBB::new(center, half, random_rotation(rng))
}

/// Elements are small random point clouds, their box fit over the cloud with `inflation_radius`.
pub fn point_scene(seed: u64, count: usize, extent: f32, inflation_radius: f32) -> TestScene
{
    let mut rng = seeded(seed);
    let mut boxes = Vec::with_capacity(count);
    let mut clouds = Vec::with_capacity(count);
    for _ in 0..count
    {
        let shape = random_obb(&mut rng, extent, 1.5);
        let points = rng.random_range(1..10);
        let cloud: Vec<Vec3> = (0..points)
            .map(|_|
            {
                let local = Vec3::new(rng.random_range(-1.0..=1.0), rng.random_range(-1.0..=1.0), rng.random_range(-1.0..=1.0));
                shape.center + shape.rotation * (local * shape.half_extents)
            })
            .collect();

        boxes.push(OBB::from_points(&cloud, inflation_radius).unwrap());
        clouds.push(cloud);
    }
    TestScene { boxes, clouds }
}

pub fn box_scene(seed: u64, count: usize, extent: f32) -> Vec<OBB>
{
    let mut rng = seeded(seed);
    (0..count).map(|_| random_obb(&mut rng, extent, 2.0)).collect()
}

/// The leaves, in node order.
pub fn leaves<const C: usize>(tree: &ObbTree<C>) -> impl Iterator<Item = NodeIndex> + '_
{
    (0..tree.node_count()).map(NodeIndex::some).filter(|n| tree.is_node_leaf(*n))
}

/// Walks from `node` up to the root, inclusive.
pub fn ancestors<const C: usize>(tree: &ObbTree<C>, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_
{
    std::iter::successors(Some(node).filter(|n| n.is_some()), |n| Some(tree.node_parent(*n)).filter(|p| p.is_some()))
}

/// `obb` spun about its own center.
pub fn rotated(obb: OBB, rotation: Mat3) -> OBB
{
    OBB { rotation: rotation * obb.rotation, ..obb }
}
