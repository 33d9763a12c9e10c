use std::io::{self, Write};

use indexmap::IndexSet;
use serde_json::json;

use crate::model::{AnalysisResult, ClassKind, Visibility};

/// Output format selected on the command line.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Format {
    #[default]
    Txt,
    Csv,
    Json,
    Dot,
}

pub fn write_result(
    writer: &mut dyn Write,
    result: &AnalysisResult,
    format: Format,
    verbose: bool,
) -> io::Result<()> {
    match format {
        Format::Txt => write_txt(writer, result, verbose),
        Format::Csv => write_csv(writer, result),
        Format::Json => write_json(writer, result, verbose),
        Format::Dot => write_dot(writer, result),
    }
}

fn write_txt(writer: &mut dyn Write, result: &AnalysisResult, verbose: bool) -> io::Result<()> {
    writeln!(writer, "=== Call Graph Analysis Results ===")?;
    writeln!(writer)?;

    writeln!(writer, "Call Graph ({} edges):", result.call_edges.len())?;
    for edge in &result.call_edges {
        writeln!(
            writer,
            "  {}.{} -> {}.{}",
            edge.source.owner, edge.source.name, edge.target.owner, edge.target.name
        )?;
    }

    if verbose {
        writeln!(writer)?;
        writeln!(writer, "Classes found:")?;
        for class in &result.classes {
            writeln!(writer, "  {} ({})", class.fqn, kind_label(class.kind))?;
        }

        writeln!(writer)?;
        writeln!(writer, "Methods found:")?;
        for method in &result.methods {
            writeln!(
                writer,
                "  {}.{} ({} {})",
                method.owner_fqn,
                method.name,
                visibility_label(method.visibility),
                if method.is_static { "static" } else { "instance" }
            )?;
        }
    } else {
        writeln!(writer)?;
        writeln!(writer, "Classes ({}):", result.classes.len())?;
        for class in &result.classes {
            writeln!(writer, "  {}", class.fqn)?;
        }
    }

    Ok(())
}

fn write_csv(writer: &mut dyn Write, result: &AnalysisResult) -> io::Result<()> {
    writeln!(writer, "source_class,source_method,target_class,target_method")?;
    for edge in &result.call_edges {
        writeln!(
            writer,
            "{},{},{},{}",
            escape_csv(&edge.source.owner),
            escape_csv(&edge.source.name),
            escape_csv(&edge.target.owner),
            escape_csv(&edge.target.name)
        )?;
    }
    Ok(())
}

fn write_json(writer: &mut dyn Write, result: &AnalysisResult, verbose: bool) -> io::Result<()> {
    let edges: Vec<_> = result
        .call_edges
        .iter()
        .map(|edge| {
            json!({
                "sourceClass": edge.source.owner,
                "sourceMethod": edge.source.name,
                "targetClass": edge.target.owner,
                "targetMethod": edge.target.name,
            })
        })
        .collect();

    let document = if verbose {
        let classes: Vec<_> = result
            .classes
            .iter()
            .map(|class| {
                json!({
                    "name": class.fqn,
                    "isInterface": class.kind == ClassKind::Interface,
                    "isAbstract": class.kind == ClassKind::AbstractClass,
                })
            })
            .collect();
        let methods: Vec<_> = result
            .methods
            .iter()
            .map(|method| {
                json!({
                    "className": method.owner_fqn,
                    "methodName": method.name,
                    "descriptor": method.descriptor,
                    "isStatic": method.is_static,
                    "isPrivate": method.visibility == Visibility::Private,
                    "isPublic": method.visibility == Visibility::Public,
                })
            })
            .collect();
        json!({ "callEdges": edges, "classes": classes, "methods": methods })
    } else {
        json!({ "callEdges": edges })
    };

    serde_json::to_writer_pretty(&mut *writer, &document)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    writeln!(writer)
}

fn write_dot(writer: &mut dyn Write, result: &AnalysisResult) -> io::Result<()> {
    writeln!(writer, "digraph CallGraph {{")?;
    writeln!(writer, "  rankdir=LR;")?;
    writeln!(writer, "  node [shape=box, style=rounded];")?;
    writeln!(writer)?;

    // Each method appears as a node exactly once, in first-appearance order.
    let mut nodes: IndexSet<String> = IndexSet::new();
    for edge in &result.call_edges {
        nodes.insert(format!("{}.{}", edge.source.owner, edge.source.name));
        nodes.insert(format!("{}.{}", edge.target.owner, edge.target.name));
    }
    for node in &nodes {
        writeln!(writer, "  \"{}\" [label=\"{}\"];", node, node)?;
    }

    writeln!(writer)?;
    for edge in &result.call_edges {
        writeln!(
            writer,
            "  \"{}.{}\" -> \"{}.{}\";",
            edge.source.owner, edge.source.name, edge.target.owner, edge.target.name
        )?;
    }
    writeln!(writer, "}}")
}

/// Quote a field only when it contains the delimiter, a quote, or a newline;
/// internal quotes are doubled.
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn kind_label(kind: ClassKind) -> &'static str {
    match kind {
        ClassKind::Interface => "interface",
        ClassKind::AbstractClass => "abstract class",
        ClassKind::Class => "class",
    }
}

fn visibility_label(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Public => "public",
        Visibility::Protected => "protected",
        Visibility::Package => "package",
        Visibility::Private => "private",
    }
}
