use std::collections::HashSet;

use anyhow::{Context, Result};
use jclassfile::attributes::Attribute;
use jclassfile::class_file::{self, ClassFlags};
use jclassfile::constant_pool::ConstantPool;
use jclassfile::methods::{MethodFlags, MethodInfo};
use log::{info, warn};

use crate::input::ClassUnit;
use crate::model::{CallKind, CallSite, ClassDecl, ClassKind, MethodDecl, MethodRef, Visibility};
use crate::opcodes;

/// Parse every unit into a `ClassDecl`, skipping units that fail to parse and
/// discarding later duplicates of an already-loaded name (first-wins).
pub fn load_units(units: &[ClassUnit]) -> Vec<ClassDecl> {
    let mut decls = Vec::new();
    let mut seen = HashSet::new();
    for unit in units {
        let decl = match parse_class(&unit.bytes) {
            Ok(decl) => decl,
            Err(err) => {
                warn!("Failed to parse {}: {:#}", unit.origin, err);
                continue;
            }
        };
        if !seen.insert(decl.fqn.clone()) {
            info!("Duplicate class {} from {} ignored", decl.fqn, unit.origin);
            continue;
        }
        decls.push(decl);
    }
    decls
}

/// Parse one class file into the analyzer's declaration model.
pub fn parse_class(bytes: &[u8]) -> Result<ClassDecl> {
    let class_file = class_file::parse(bytes).context("parse class file")?;
    let constant_pool = class_file.constant_pool();

    let fqn = dotted(&resolve_class_name(constant_pool, class_file.this_class())
        .context("resolve class name")?);
    let super_fqn = if class_file.super_class() == 0 {
        None
    } else {
        Some(dotted(
            &resolve_class_name(constant_pool, class_file.super_class())
                .context("resolve super class name")?,
        ))
    };
    let mut interfaces = Vec::new();
    for interface in class_file.interfaces() {
        interfaces.push(dotted(
            &resolve_class_name(constant_pool, *interface).context("resolve interface name")?,
        ));
    }

    let flags = class_file.access_flags();
    let kind = if flags.contains(ClassFlags::ACC_INTERFACE) {
        ClassKind::Interface
    } else if flags.contains(ClassFlags::ACC_ABSTRACT) {
        ClassKind::AbstractClass
    } else {
        ClassKind::Class
    };

    let methods = parse_methods(&fqn, constant_pool, class_file.methods())
        .context("parse method bytecode")?;

    Ok(ClassDecl {
        fqn,
        kind,
        super_fqn,
        interfaces,
        methods,
    })
}

fn parse_methods(
    owner_fqn: &str,
    constant_pool: &[ConstantPool],
    methods: &[MethodInfo],
) -> Result<Vec<MethodDecl>> {
    let mut parsed = Vec::new();
    for method in methods {
        let name =
            resolve_utf8(constant_pool, method.name_index()).context("resolve method name")?;
        let descriptor = resolve_utf8(constant_pool, method.descriptor_index())
            .context("resolve method descriptor")?;
        let flags = method.access_flags();
        let visibility = if flags.contains(MethodFlags::ACC_PUBLIC) {
            Visibility::Public
        } else if flags.contains(MethodFlags::ACC_PROTECTED) {
            Visibility::Protected
        } else if flags.contains(MethodFlags::ACC_PRIVATE) {
            Visibility::Private
        } else {
            Visibility::Package
        };

        // Abstract and native methods carry no Code attribute; they stay in
        // the model with an empty call-site list.
        let code = method.attributes().iter().find_map(|attribute| match attribute {
            Attribute::Code { code, .. } => Some(code),
            _ => None,
        });
        let call_sites = match code {
            Some(code) => parse_call_sites(code, constant_pool)
                .with_context(|| format!("parse bytecode of {}.{}", owner_fqn, name))?,
            None => Vec::new(),
        };

        parsed.push(MethodDecl {
            owner_fqn: owner_fqn.to_string(),
            name,
            descriptor,
            visibility,
            is_static: flags.contains(MethodFlags::ACC_STATIC),
            is_abstract: flags.contains(MethodFlags::ACC_ABSTRACT),
            is_synthetic: flags.contains(MethodFlags::ACC_SYNTHETIC),
            call_sites,
        });
    }
    Ok(parsed)
}

/// Linear walk over a Code attribute collecting invocation instructions in
/// bytecode order. `invokedynamic` is stepped over without producing a site.
fn parse_call_sites(code: &[u8], constant_pool: &[ConstantPool]) -> Result<Vec<CallSite>> {
    let mut sites = Vec::new();
    let mut offset = 0usize;
    while offset < code.len() {
        let opcode = code[offset];
        let length = opcodes::opcode_length(code, offset)?;
        if length == 0 || offset + length > code.len() {
            anyhow::bail!("invalid bytecode length at offset {}", offset);
        }
        match opcode {
            opcodes::INVOKEVIRTUAL
            | opcodes::INVOKESPECIAL
            | opcodes::INVOKESTATIC
            | opcodes::INVOKEINTERFACE => {
                let method_index = opcodes::read_u16(code, offset + 1)?;
                let target =
                    resolve_method_ref(constant_pool, method_index).context("resolve method ref")?;
                let kind = match opcode {
                    opcodes::INVOKESPECIAL => CallKind::Special,
                    opcodes::INVOKESTATIC => CallKind::Static,
                    opcodes::INVOKEINTERFACE => CallKind::Interface,
                    _ => CallKind::Virtual,
                };
                sites.push(CallSite {
                    kind,
                    target,
                    offset: offset as u32,
                });
            }
            _ => {}
        }
        offset += length;
    }
    Ok(sites)
}

fn resolve_method_ref(constant_pool: &[ConstantPool], index: u16) -> Result<MethodRef> {
    let entry = constant_pool
        .get(index as usize)
        .context("missing method ref entry")?;
    let (class_index, name_and_type_index) = match entry {
        ConstantPool::Methodref {
            class_index,
            name_and_type_index,
        } => (*class_index, *name_and_type_index),
        ConstantPool::InterfaceMethodref {
            class_index,
            name_and_type_index,
        } => (*class_index, *name_and_type_index),
        _ => anyhow::bail!("unexpected method ref entry"),
    };
    let owner = resolve_class_name(constant_pool, class_index).context("resolve owner")?;
    let (name_index, descriptor_index) = resolve_name_and_type(constant_pool, name_and_type_index)?;
    let name = resolve_utf8(constant_pool, name_index).context("resolve method name")?;
    let descriptor =
        resolve_utf8(constant_pool, descriptor_index).context("resolve method descriptor")?;
    Ok(MethodRef::new(dotted(&owner), name, descriptor))
}

fn resolve_name_and_type(constant_pool: &[ConstantPool], index: u16) -> Result<(u16, u16)> {
    let entry = constant_pool
        .get(index as usize)
        .context("missing name and type entry")?;
    match entry {
        ConstantPool::NameAndType {
            name_index,
            descriptor_index,
        } => Ok((*name_index, *descriptor_index)),
        _ => anyhow::bail!("unexpected name and type entry"),
    }
}

fn resolve_class_name(constant_pool: &[ConstantPool], class_index: u16) -> Result<String> {
    let entry = constant_pool
        .get(class_index as usize)
        .context("missing class entry")?;
    match entry {
        ConstantPool::Class { name_index } => resolve_utf8(constant_pool, *name_index),
        _ => anyhow::bail!("unexpected class entry"),
    }
}

fn resolve_utf8(constant_pool: &[ConstantPool], index: u16) -> Result<String> {
    let entry = constant_pool
        .get(index as usize)
        .context("missing utf8 entry")?;
    match entry {
        ConstantPool::Utf8 { value } => Ok(value.clone()),
        _ => anyhow::bail!("unexpected utf8 entry"),
    }
}

/// Internal names use slashes; the analyzer works in dotted form throughout.
/// Array owners (`[Ljava/lang/String;`) keep their brackets and simply never
/// resolve.
fn dotted(internal: &str) -> String {
    internal.replace('/', ".")
}
