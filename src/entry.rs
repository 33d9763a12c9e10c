use std::str::FromStr;

use jdescriptor::{MethodDescriptor, TypeDescriptor};
use log::{debug, info, warn};

use crate::filter::NameFilter;
use crate::hierarchy::TypeHierarchy;
use crate::model::{MethodRef, Visibility};

/// Produce the method set seeding the analysis. With no explicit specs, every
/// admitted `public static main(String[])` is an entry point; otherwise each
/// spec selects methods by name, optionally restricted to a class named
/// exactly or by simple-name suffix.
pub fn resolve_entry_points(
    hierarchy: &TypeHierarchy,
    filter: &NameFilter,
    entry_specs: &[String],
) -> Vec<MethodRef> {
    let entry_points = if entry_specs.is_empty() {
        find_main_methods(hierarchy, filter)
    } else {
        find_by_specs(hierarchy, filter, entry_specs)
    };

    if entry_points.is_empty() {
        if entry_specs.is_empty() {
            warn!("No main methods found as entry points");
        } else {
            warn!(
                "No custom entry points found matching: {}",
                entry_specs.join(", ")
            );
        }
    } else {
        info!("Found {} entry point(s)", entry_points.len());
        for entry in &entry_points {
            debug!("Entry point: {}", entry);
        }
    }

    entry_points
}

fn find_main_methods(hierarchy: &TypeHierarchy, filter: &NameFilter) -> Vec<MethodRef> {
    let mut entry_points = Vec::new();
    for decl in hierarchy.classes() {
        if !filter.admits(&decl.fqn) {
            continue;
        }
        for method in &decl.methods {
            if method.name == "main"
                && method.visibility == Visibility::Public
                && method.is_static
                && !method.is_abstract
                && is_string_array_main(&method.descriptor)
            {
                entry_points.push(method.to_ref());
            }
        }
    }
    entry_points
}

/// The canonical entry descriptor takes exactly one parameter, the string
/// array.
fn is_string_array_main(descriptor: &str) -> bool {
    let Ok(parsed) = MethodDescriptor::from_str(descriptor) else {
        return false;
    };
    parsed.parameter_types().len() == 1
        && matches!(parsed.parameter_types()[0], TypeDescriptor::Array(_, _))
        && descriptor.starts_with("([Ljava/lang/String;)")
}

fn find_by_specs(
    hierarchy: &TypeHierarchy,
    filter: &NameFilter,
    entry_specs: &[String],
) -> Vec<MethodRef> {
    let mut entry_points: Vec<MethodRef> = Vec::new();
    for spec in entry_specs {
        let (class_part, method_name) = split_spec(spec);
        for decl in hierarchy.classes() {
            if !filter.admits(&decl.fqn) {
                continue;
            }
            if let Some(class_part) = class_part {
                if decl.fqn != class_part && !decl.fqn.ends_with(&format!(".{}", class_part)) {
                    continue;
                }
            }
            for method in &decl.methods {
                if method.name != method_name {
                    continue;
                }
                let entry = method.to_ref();
                if !entry_points.contains(&entry) {
                    entry_points.push(entry);
                }
            }
        }
    }
    entry_points
}

/// `a.b.C.run` and `C.run` split at the last dot; a bare `run` matches any
/// admitted class.
fn split_spec(spec: &str) -> (Option<&str>, &str) {
    match spec.rfind('.') {
        Some(index) => (Some(&spec[..index]), &spec[index + 1..]),
        None => (None, spec),
    }
}
