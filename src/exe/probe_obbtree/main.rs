mod config;
mod scene;

use std::path::PathBuf;
use std::time::Instant;
use clap::Parser;
use containers_obbtree::ObbTreeError;
use nab_obbtree::app::{fatal_error, AppRun, ExitReason, FatalError};
use crate::config::{ProbeConfig, ProbeError};
use crate::scene::{check_queries, ProbeTree, Scene};

#[derive(Debug, Parser)]
#[command(about = "Build an OBB tree over a random scene and check its queries against a brute-force scan")]
struct CliArgs
{
    /// TOML scene description
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    elements: Option<usize>,

    #[arg(long)]
    queries: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,
}

fn load_config(args: &CliArgs) -> Result<ProbeConfig, ProbeError>
{
    let mut config = match &args.config
    {
        Some(path) => ProbeConfig::load(path)?,
        None => ProbeConfig::default(),
    };

    if let Some(elements) = args.elements { config.element_count = elements; }
    if let Some(queries) = args.queries { config.query_count = queries; }
    if let Some(seed) = args.seed { config.seed = seed; }

    config.check()?;
    Ok(config)
}

fn run_probe(config: &ProbeConfig) -> Result<(), ProbeError>
{
    let scene = Scene::generate(config);

    let mut tree = ProbeTree::new();
    let build_start = Instant::now();
    tree.build_with(&scene.boxes, &scene.clouds, config.inflation_radius, &config.build)?;
    let build_time = build_start.elapsed();

    let max_height = (0..tree.element_count()).map(|e| tree.height(e)).max().unwrap_or(0);
    log::info!("Built {} elements into {} nodes (capacity {}, max height {max_height}) in {build_time:.2?}",
        tree.element_count(), tree.node_count(), tree.capacity());

    let query_start = Instant::now();
    let stats = check_queries(&tree, &scene)?;
    let query_time = query_start.elapsed();

    log::info!("Checked {} queries in {query_time:.2?}: {:.1} overlap tests, {:.2} candidates, {:.2} true hits per query",
        stats.queries,
        stats.per_query(stats.overlap_tests),
        stats.per_query(stats.hits),
        stats.per_query(stats.true_hits));
    Ok(())
}

fn main() -> ExitReason
{
    let app_run = AppRun::<CliArgs>::startup("OBB Tree Probe", env!("CARGO_PKG_VERSION"));

    let config = match load_config(&app_run.args)
    {
        Ok(config) => config,
        Err(err) =>
        {
            log::error!("Invalid probe config: {err}");
            app_run.set_exit_reason(ExitReason::BadConfig);
            return app_run.get_exit_reason();
        }
    };
    log::debug!("{config:#?}");

    match run_probe(&config)
    {
        Ok(()) => { }
        Err(ProbeError::Tree(ObbTreeError::Alloc(err))) => fatal_error(FatalError::Memory, err),
        Err(err) =>
        {
            log::error!("Probe failed: {err}");
            app_run.set_exit_reason(ExitReason::ValidationFailed);
        }
    }

    app_run.get_exit_reason()
}
