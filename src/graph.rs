use std::collections::{HashSet, VecDeque};

use indexmap::IndexSet;
use log::debug;

use crate::hierarchy::TypeHierarchy;
use crate::model::{Algorithm, CallEdge, CallKind, CallSite, MethodRef};

/// Directed multigraph of method-to-method edges in first-seen order.
#[derive(Clone, Debug)]
pub struct CallGraph {
    edges: Vec<CallEdge>,
    reachable: Vec<MethodRef>,
}

impl CallGraph {
    pub fn edges(&self) -> &[CallEdge] {
        &self.edges
    }

    pub fn reachable_methods(&self) -> &[MethodRef] {
        &self.reachable
    }
}

/// Per-algorithm dispatch state. CHA needs none; RTA tracks which concrete
/// types have had a constructor become reachable, plus every virtual and
/// interface site seen so far so that later instantiations can revisit them.
enum DispatchState {
    Cha,
    Rta {
        instantiated: HashSet<String>,
        recorded_sites: Vec<(MethodRef, CallSite)>,
    },
}

impl DispatchState {
    fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Cha => DispatchState::Cha,
            Algorithm::Rta => DispatchState::Rta {
                instantiated: HashSet::new(),
                recorded_sites: Vec::new(),
            },
        }
    }
}

/// Worklist-driven graph construction shared by both algorithms. The worklist
/// is FIFO and call sites are visited in bytecode order, so edge emission
/// order is a pure function of the input.
pub fn build_call_graph(
    hierarchy: &TypeHierarchy,
    entry_points: &[MethodRef],
    algorithm: Algorithm,
) -> CallGraph {
    let mut edges: IndexSet<CallEdge> = IndexSet::new();
    let mut reachable: IndexSet<MethodRef> = entry_points.iter().cloned().collect();
    let mut worklist: VecDeque<MethodRef> = reachable.iter().cloned().collect();
    let mut state = DispatchState::new(algorithm);

    while let Some(method_ref) = worklist.pop_front() {
        let Some(method) = hierarchy
            .get(&method_ref.owner)
            .and_then(|decl| decl.method(&method_ref.name, &method_ref.descriptor))
        else {
            continue;
        };

        for site in &method.call_sites {
            for target in dispatch(hierarchy, &state, site) {
                insert_edge(
                    &method_ref,
                    target,
                    &mut edges,
                    &mut reachable,
                    &mut worklist,
                );
            }
            if let DispatchState::Rta { recorded_sites, .. } = &mut state {
                if matches!(site.kind, CallKind::Virtual | CallKind::Interface) {
                    recorded_sites.push((method_ref.clone(), site.clone()));
                }
            }
        }

        // RTA instantiation discovery is monotone: a newly observed type
        // reopens every recorded site whose declared owner it subtypes.
        let newly_instantiated = match &mut state {
            DispatchState::Rta { instantiated, .. } if method.is_constructor() => {
                instantiated
                    .insert(method_ref.owner.clone())
                    .then(|| method_ref.owner.clone())
            }
            _ => None,
        };
        if let Some(owner) = newly_instantiated {
            debug!("Instantiated type discovered: {}", owner);
            let supertypes = hierarchy.all_supertypes(&owner);
            let pending: Vec<(MethodRef, CallSite)> = match &state {
                DispatchState::Rta { recorded_sites, .. } => recorded_sites
                    .iter()
                    .filter(|(_, site)| {
                        site.target.owner == owner || supertypes.contains(&site.target.owner)
                    })
                    .cloned()
                    .collect(),
                DispatchState::Cha => Vec::new(),
            };
            for (caller, site) in pending {
                for target in dispatch(hierarchy, &state, &site) {
                    insert_edge(&caller, target, &mut edges, &mut reachable, &mut worklist);
                }
            }
        }
    }

    CallGraph {
        edges: edges.into_iter().collect(),
        reachable: reachable.into_iter().collect(),
    }
}

fn insert_edge(
    source: &MethodRef,
    target: MethodRef,
    edges: &mut IndexSet<CallEdge>,
    reachable: &mut IndexSet<MethodRef>,
    worklist: &mut VecDeque<MethodRef>,
) {
    edges.insert(CallEdge::new(source.clone(), target.clone()));
    if reachable.insert(target.clone()) {
        worklist.push_back(target);
    }
}

/// Resolve one call site to its possible targets under the current state.
/// Unresolved references yield no targets.
fn dispatch(hierarchy: &TypeHierarchy, state: &DispatchState, site: &CallSite) -> Vec<MethodRef> {
    let target = &site.target;
    match site.kind {
        CallKind::Static => hierarchy
            .resolve_static(&target.owner, &target.name, &target.descriptor)
            .into_iter()
            .collect(),
        CallKind::Special => hierarchy
            .resolve_special(&target.owner, &target.name, &target.descriptor)
            .into_iter()
            .collect(),
        CallKind::Virtual => {
            let mut targets = Vec::new();
            if let Some(resolved) =
                hierarchy.resolve_virtual(&target.owner, &target.name, &target.descriptor)
            {
                push_unique(&mut targets, resolved);
            }
            // Every subtype declaring a matching method is a possible
            // dynamic-dispatch target.
            for subtype in hierarchy.subtypes(&target.owner).iter() {
                if let Some(decl) = hierarchy.get(subtype) {
                    if let Some(method) = decl.method(&target.name, &target.descriptor) {
                        push_unique(&mut targets, method.to_ref());
                    }
                }
            }
            retain_instantiated(state, targets)
        }
        CallKind::Interface => {
            let mut targets = Vec::new();
            for implementor in hierarchy.implementors(&target.owner) {
                if let Some(resolved) =
                    hierarchy.resolve_virtual(&implementor, &target.name, &target.descriptor)
                {
                    push_unique(&mut targets, resolved);
                }
            }
            retain_instantiated(state, targets)
        }
    }
}

fn push_unique(targets: &mut Vec<MethodRef>, target: MethodRef) {
    if !targets.contains(&target) {
        targets.push(target);
    }
}

/// RTA restricts virtual and interface targets to types already observed as
/// instantiated; CHA keeps them all.
fn retain_instantiated(state: &DispatchState, mut targets: Vec<MethodRef>) -> Vec<MethodRef> {
    if let DispatchState::Rta { instantiated, .. } = state {
        targets.retain(|target| instantiated.contains(&target.owner));
    }
    targets
}
