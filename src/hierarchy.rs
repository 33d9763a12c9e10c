use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, OnceLock, RwLock};

use log::debug;

use crate::error::AnalysisError;
use crate::model::{ClassDecl, MethodRef};

/// Mutable accumulation phase of the hierarchy. `freeze` validates the graph
/// and produces the immutable query structure.
#[derive(Debug, Default)]
pub struct HierarchyBuilder {
    classes: BTreeMap<String, ClassDecl>,
}

impl HierarchyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// First declaration of a name wins; the loader already deduplicates, so
    /// a collision here only happens when callers feed the builder directly.
    pub fn add(&mut self, decl: ClassDecl) {
        if self.classes.contains_key(&decl.fqn) {
            debug!("Hierarchy already holds {}, ignoring", decl.fqn);
            return;
        }
        self.classes.insert(decl.fqn.clone(), decl);
    }

    /// Validate that supertype and interface links form a DAG and freeze the
    /// hierarchy. A cycle is the one fatal loading condition.
    pub fn freeze(self) -> Result<TypeHierarchy, AnalysisError> {
        detect_cycle(&self.classes)?;
        Ok(TypeHierarchy {
            classes: self.classes,
            supertype_cache: RwLock::new(HashMap::new()),
            subtype_map: OnceLock::new(),
        })
    }
}

/// Three-color depth-first search over super and interface links. Links to
/// classes that were never loaded terminate the walk.
fn detect_cycle(classes: &BTreeMap<String, ClassDecl>) -> Result<(), AnalysisError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        InProgress,
        Done,
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    for root in classes.keys() {
        if marks.contains_key(root.as_str()) {
            continue;
        }
        // Explicit stack; (node, next-edge-index) pairs emulate recursion.
        let mut stack: Vec<(&str, usize)> = vec![(root.as_str(), 0)];
        marks.insert(root.as_str(), Mark::InProgress);
        while let Some((node, edge)) = stack.pop() {
            let Some(decl) = classes.get(node) else {
                marks.insert(node, Mark::Done);
                continue;
            };
            let links: Vec<&str> = decl
                .super_fqn
                .iter()
                .map(String::as_str)
                .chain(decl.interfaces.iter().map(String::as_str))
                .collect();
            if edge >= links.len() {
                marks.insert(node, Mark::Done);
                continue;
            }
            stack.push((node, edge + 1));
            let next = links[edge];
            if !classes.contains_key(next) {
                continue;
            }
            match marks.get(next) {
                Some(Mark::InProgress) => {
                    return Err(AnalysisError::HierarchyCycle(format!(
                        "{} and {} form a supertype cycle",
                        node, next
                    )));
                }
                Some(Mark::Done) => {}
                None => {
                    marks.insert(next, Mark::InProgress);
                    stack.push((next, 0));
                }
            }
        }
    }
    Ok(())
}

/// Immutable view of every loaded type and the derived subtype/supertype
/// relations. The memo caches are the only mutation after `freeze` and are
/// idempotent under concurrent recomputation.
#[derive(Debug)]
pub struct TypeHierarchy {
    classes: BTreeMap<String, ClassDecl>,
    supertype_cache: RwLock<HashMap<String, Arc<BTreeSet<String>>>>,
    subtype_map: OnceLock<HashMap<String, Arc<BTreeSet<String>>>>,
}

impl TypeHierarchy {
    pub fn get(&self, fqn: &str) -> Option<&ClassDecl> {
        self.classes.get(fqn)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// All loaded declarations in lexicographic fqn order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.classes.values()
    }

    /// Union of the superclass link and the directly implemented interfaces,
    /// whether or not those names were loaded.
    pub fn direct_supertypes(&self, fqn: &str) -> BTreeSet<String> {
        let Some(decl) = self.classes.get(fqn) else {
            return BTreeSet::new();
        };
        decl.super_fqn
            .iter()
            .cloned()
            .chain(decl.interfaces.iter().cloned())
            .collect()
    }

    /// Transitive supertype closure. Names that were never loaded appear in
    /// the result but cannot be expanded further.
    pub fn all_supertypes(&self, fqn: &str) -> Arc<BTreeSet<String>> {
        if let Some(cached) = self.supertype_cache.read().expect("supertype cache").get(fqn) {
            return Arc::clone(cached);
        }

        let mut closure = BTreeSet::new();
        let mut queue: VecDeque<String> = self.direct_supertypes(fqn).into_iter().collect();
        while let Some(name) = queue.pop_front() {
            if !closure.insert(name.clone()) {
                continue;
            }
            for next in self.direct_supertypes(&name) {
                if !closure.contains(&next) {
                    queue.push_back(next);
                }
            }
        }

        let closure = Arc::new(closure);
        self.supertype_cache
            .write()
            .expect("supertype cache")
            .entry(fqn.to_string())
            .or_insert_with(|| Arc::clone(&closure))
            .clone()
    }

    /// Transitive subtype closure, built lazily by one forward sweep over the
    /// whole hierarchy on first use.
    pub fn subtypes(&self, fqn: &str) -> Arc<BTreeSet<String>> {
        let map = self.subtype_map.get_or_init(|| {
            let mut reverse: HashMap<String, BTreeSet<String>> = HashMap::new();
            for name in self.classes.keys() {
                for supertype in self.all_supertypes(name).iter() {
                    reverse
                        .entry(supertype.clone())
                        .or_default()
                        .insert(name.clone());
                }
            }
            reverse
                .into_iter()
                .map(|(name, subtypes)| (name, Arc::new(subtypes)))
                .collect()
        });
        map.get(fqn).map(Arc::clone).unwrap_or_default()
    }

    /// Concrete (non-abstract, non-interface) transitive subtypes.
    pub fn implementors(&self, fqn: &str) -> Vec<String> {
        self.subtypes(fqn)
            .iter()
            .filter(|name| {
                self.classes
                    .get(name.as_str())
                    .is_some_and(ClassDecl::is_concrete_class)
            })
            .cloned()
            .collect()
    }

    /// Standard virtual-dispatch lookup: walk the superclass chain from the
    /// receiver; first declared match wins. When the chain has no match, the
    /// superinterface closure of the walked chain is searched breadth-first
    /// for a default method, so inherited defaults resolve too.
    pub fn resolve_virtual(&self, receiver_fqn: &str, name: &str, descriptor: &str) -> Option<MethodRef> {
        let mut interface_queue: VecDeque<String> = VecDeque::new();
        let mut current = Some(receiver_fqn.to_string());
        while let Some(fqn) = current {
            // An unloaded link ends the chain; the reference stays unresolved.
            let Some(decl) = self.classes.get(&fqn) else {
                break;
            };
            if let Some(method) = decl.method(name, descriptor) {
                return Some(method.to_ref());
            }
            interface_queue.extend(decl.interfaces.iter().cloned());
            current = decl.super_fqn.clone();
        }

        let mut seen = BTreeSet::new();
        while let Some(fqn) = interface_queue.pop_front() {
            if !seen.insert(fqn.clone()) {
                continue;
            }
            let Some(decl) = self.classes.get(&fqn) else {
                continue;
            };
            if let Some(method) = decl.method(name, descriptor) {
                if !method.is_abstract {
                    return Some(method.to_ref());
                }
            }
            interface_queue.extend(decl.interfaces.iter().cloned());
        }
        None
    }

    /// Single lookup on the named owner; no chain walk.
    pub fn resolve_static(&self, owner_fqn: &str, name: &str, descriptor: &str) -> Option<MethodRef> {
        self.classes
            .get(owner_fqn)?
            .method(name, descriptor)
            .map(|method| method.to_ref())
    }

    /// Special dispatch (constructors, super-calls, private calls) binds to
    /// the named owner directly.
    pub fn resolve_special(&self, owner_fqn: &str, name: &str, descriptor: &str) -> Option<MethodRef> {
        self.resolve_static(owner_fqn, name, descriptor)
    }
}
