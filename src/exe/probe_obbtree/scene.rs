use glam::{Mat3, Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use containers_obbtree::ObbTree;
use math_obbtree::OBB;
use crate::config::{ProbeConfig, ProbeError};

pub type ProbeTree = ObbTree<4>;

pub struct Scene
{
    pub boxes: Vec<OBB>,
    pub clouds: Vec<Vec<Vec3>>,
    pub queries: Vec<OBB>,
}
impl Scene
{
    #[must_use]
    pub fn generate(config: &ProbeConfig) -> Self
    {
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut boxes = Vec::with_capacity(config.element_count);
        let mut clouds = Vec::with_capacity(config.element_count);
        for _ in 0..config.element_count
        {
            let center = random_point(&mut rng, config.scatter_extent);
            let rotation = random_rotation(&mut rng);
            let half = config.element_size / 2.0;
            let cloud: Vec<Vec3> = (0..config.points_per_element)
                .map(|_| center + rotation * Vec3::new(
                    rng.random_range(-half..=half),
                    rng.random_range(-half..=half) * 0.5,
                    rng.random_range(-half..=half) * 0.25))
                .collect();

            boxes.push(OBB::from_points(&cloud, config.inflation_radius).unwrap_or_else(||
                OBB::new(center, Vec3::splat(half), rotation)));
            clouds.push(cloud);
        }

        let queries = (0..config.query_count)
            .map(|_|
            {
                let half = Vec3::new(
                    rng.random_range(0.1..=1.0),
                    rng.random_range(0.1..=1.0),
                    rng.random_range(0.1..=1.0)) * (config.query_size / 2.0);
                OBB::new(random_point(&mut rng, config.scatter_extent), half, random_rotation(&mut rng))
            })
            .collect();

        Self { boxes, clouds, queries }
    }
}

fn random_point(rng: &mut StdRng, extent: f32) -> Vec3
{
    if extent <= 0.0
    {
        return Vec3::ZERO;
    }
    Vec3::new(
        rng.random_range(-extent..=extent),
        rng.random_range(-extent..=extent),
        rng.random_range(-extent..=extent))
}

fn random_rotation(rng: &mut StdRng) -> Mat3
{
    let axis = Vec3::new(rng.random_range(-1.0..=1.0), rng.random_range(-1.0..=1.0), rng.random_range(-1.0..=1.0))
        .normalize_or(Vec3::Z);
    Mat3::from_quat(Quat::from_axis_angle(axis, rng.random_range(0.0..std::f32::consts::TAU)))
}

/// Members of every leaf overlapping `query`, found by testing each leaf directly.
#[must_use]
pub fn brute_force_hits(tree: &ProbeTree, query: &OBB) -> Vec<u32>
{
    let mut hits: Vec<u32> = tree.nodes().iter()
        .filter(|n| n.is_leaf() && n.obb.overlaps(query))
        .flat_map(|n| n.members().iter().copied())
        .collect();
    hits.sort_unstable();
    hits
}

/// Run every query against the tree and check it against a brute-force scan.
/// Every candidate's leaf must overlap the query, and any element with a point inside the query box must be a candidate.
pub fn check_queries(tree: &ProbeTree, scene: &Scene) -> Result<QueryStats, ProbeError>
{
    let mut stats = QueryStats::default();
    let mut hits = Vec::new();
    for (q, query) in scene.queries.iter().enumerate()
    {
        hits.clear();
        stats.overlap_tests += tree.query(&mut hits, query) as u64;
        stats.hits += hits.len() as u64;
        hits.sort_unstable();

        let leaf_hits = brute_force_hits(tree, query);
        if let Some(element) = hits.iter().find(|h| leaf_hits.binary_search(h).is_err())
        {
            return Err(ProbeError::UnexpectedHit { query: q, element: *element });
        }
        if let Some(pair) = hits.windows(2).find(|w| w[0] == w[1])
        {
            return Err(ProbeError::DuplicateHit { query: q, element: pair[0] });
        }

        for (element, cloud) in scene.clouds.iter().enumerate()
        {
            if cloud.iter().any(|p| query.contains_point(*p, 0.0))
            {
                stats.true_hits += 1;
                if hits.binary_search(&(element as u32)).is_err()
                {
                    return Err(ProbeError::MissedElement { query: q, element: element as u32 });
                }
            }
        }
    }
    stats.queries = scene.queries.len() as u64;
    Ok(stats)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct QueryStats
{
    pub queries: u64,
    pub overlap_tests: u64,
    pub hits: u64,
    pub true_hits: u64,
}
impl QueryStats
{
    #[must_use]
    pub fn per_query(self, total: u64) -> f64
    {
        match self.queries
        {
            0 => 0.0,
            n => total as f64 / n as f64,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn small_config() -> ProbeConfig
    {
        ProbeConfig
        {
            element_count: 300,
            query_count: 40,
            scatter_extent: 20.0,
            ..Default::default()
        }
    }

    #[test]
    fn deterministic()
    {
        let a = Scene::generate(&small_config());
        let b = Scene::generate(&small_config());
        assert_eq!(a.boxes, b.boxes);
        assert_eq!(a.queries, b.queries);
        assert_eq!(a.clouds.len(), 300);
        assert!(a.clouds.iter().all(|c| c.len() == 8));
    }

    #[test]
    fn queries_agree()
    {
        let config = small_config();
        let scene = Scene::generate(&config);
        let mut tree = ProbeTree::new();
        tree.build_with(&scene.boxes, &scene.clouds, config.inflation_radius, &config.build).unwrap();

        let stats = check_queries(&tree, &scene).unwrap();
        assert_eq!(stats.queries, 40);
        assert!(stats.hits >= stats.true_hits);
        assert!(stats.overlap_tests <= 40 * tree.node_count() as u64);
    }
}
