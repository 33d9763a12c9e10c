use std::path::PathBuf;

use log::info;

use crate::collect::collect_results;
use crate::entry::resolve_entry_points;
use crate::error::AnalysisError;
use crate::filter::{FilterConfig, NameFilter};
use crate::graph::build_call_graph;
use crate::hierarchy::HierarchyBuilder;
use crate::input::enumerate_units;
use crate::loader::load_units;
use crate::model::{Algorithm, AnalysisResult};

/// Run the full pipeline over the given inputs: enumerate, load, build the
/// hierarchy, seed entry points, construct the graph, collect the result.
/// Recoverable problems are logged where they occur; only a malformed
/// hierarchy aborts the analysis.
pub fn analyze(
    paths: &[PathBuf],
    filter_config: &FilterConfig,
    algorithm: Algorithm,
    entry_specs: &[String],
) -> Result<AnalysisResult, AnalysisError> {
    info!("Initializing analysis for {} input(s)", paths.len());
    let units = enumerate_units(paths);
    info!("Enumerated {} bytecode unit(s)", units.len());

    let decls = load_units(&units);
    let mut builder = HierarchyBuilder::new();
    for decl in decls {
        builder.add(decl);
    }
    let hierarchy = builder.freeze()?;
    info!("Class hierarchy built with {} classes", hierarchy.len());

    let filter = NameFilter::new(filter_config);

    info!("Finding entry points...");
    let entry_points = resolve_entry_points(&hierarchy, &filter, entry_specs);

    info!("Building call graph with {}...", algorithm);
    let graph = build_call_graph(&hierarchy, &entry_points, algorithm);
    info!(
        "Call graph built with {} reachable methods",
        graph.reachable_methods().len()
    );

    let result = collect_results(&hierarchy, &graph, &filter);
    info!(
        "Analysis completed: {} classes, {} methods, {} call edges found",
        result.classes.len(),
        result.methods.len(),
        result.call_edges.len()
    );

    Ok(result)
}
