use log::{debug, info};

use crate::filter::NameFilter;
use crate::graph::CallGraph;
use crate::hierarchy::TypeHierarchy;
use crate::model::{AnalysisResult, ClassInfo, MethodInfo};

/// Assemble the externally observable result: admitted classes and methods in
/// lexicographic order, call edges in first-seen order with both endpoints
/// admitted. Edges are never re-ordered here, only filtered.
pub fn collect_results(
    hierarchy: &TypeHierarchy,
    graph: &CallGraph,
    filter: &NameFilter,
) -> AnalysisResult {
    let mut classes = Vec::new();
    let mut methods = Vec::new();

    for decl in hierarchy.classes() {
        if !filter.admits(&decl.fqn) {
            debug!("Filtered out class: {}", decl.fqn);
            continue;
        }
        classes.push(ClassInfo {
            fqn: decl.fqn.clone(),
            kind: decl.kind,
        });

        let mut declared: Vec<&crate::model::MethodDecl> = decl
            .methods
            .iter()
            .filter(|method| !method.is_synthetic)
            .collect();
        declared.sort_by(|a, b| {
            (a.name.as_str(), a.descriptor.as_str()).cmp(&(b.name.as_str(), b.descriptor.as_str()))
        });
        for method in declared {
            methods.push(MethodInfo {
                owner_fqn: method.owner_fqn.clone(),
                name: method.name.clone(),
                descriptor: method.descriptor.clone(),
                visibility: method.visibility,
                is_static: method.is_static,
            });
        }
    }

    if classes.is_empty() && !hierarchy.is_empty() {
        info!("Filters admitted no classes; result is empty");
    }

    let call_edges = graph
        .edges()
        .iter()
        .filter(|edge| filter.admits(&edge.source.owner) && filter.admits(&edge.target.owner))
        .cloned()
        .collect();

    AnalysisResult {
        classes,
        methods,
        call_edges,
    }
}
