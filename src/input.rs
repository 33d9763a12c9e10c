use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use zip::ZipArchive;

/// One compiled class, whether loose on disk or an entry within an archive.
#[derive(Clone, Debug)]
pub struct ClassUnit {
    /// Human-readable origin, e.g. `app.jar!/com/example/Main.class`.
    pub origin: String,
    pub bytes: Vec<u8>,
}

/// Walk the supplied paths and collect every bytecode unit they contain.
///
/// Ordering is stable: the supplied argument order is preserved, and within
/// each argument directory listings and archive entries are sorted by name.
/// Paths that do not exist, unreadable files, and malformed archives are
/// logged at WARN and skipped.
pub fn enumerate_units(paths: &[PathBuf]) -> Vec<ClassUnit> {
    let mut units = Vec::new();
    for path in paths {
        if !path.exists() {
            warn!("File or directory does not exist: {}", path.display());
            continue;
        }
        collect_path(path, &mut units);
    }
    units
}

fn collect_path(path: &Path, units: &mut Vec<ClassUnit>) {
    if path.is_dir() {
        collect_dir(path, units);
        return;
    }

    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if name.ends_with(".class") {
        collect_class_file(path, units);
    } else if name.ends_with(".jar") || name.ends_with(".war") {
        collect_archive(path, units);
    } else {
        warn!(
            "Unsupported file type: {} (supported: .jar, .war, .class)",
            path.display()
        );
    }
}

fn collect_dir(path: &Path, units: &mut Vec<ClassUnit>) {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("Failed to read directory {}: {}", path.display(), err);
            return;
        }
    };

    // Keep deterministic ordering by sorting directory listings.
    let mut children = Vec::new();
    for entry in entries {
        match entry {
            Ok(entry) => children.push(entry.path()),
            Err(err) => warn!("Failed to read entry under {}: {}", path.display(), err),
        }
    }
    children.sort_by(|a, b| path_key(a).cmp(&path_key(b)));

    for child in children {
        if child.is_dir() {
            collect_dir(&child, units);
        } else if child
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.to_ascii_lowercase().ends_with(".class"))
        {
            // Directory trees contribute class files only; archives must be
            // named as inputs themselves.
            collect_class_file(&child, units);
        }
    }
}

fn collect_class_file(path: &Path, units: &mut Vec<ClassUnit>) {
    match fs::read(path) {
        Ok(bytes) => {
            debug!("Adding class file: {}", path.display());
            units.push(ClassUnit {
                origin: path.display().to_string(),
                bytes,
            });
        }
        Err(err) => warn!("Failed to read {}: {}", path.display(), err),
    }
}

/// Read every `.class` entry out of a JAR/WAR. The archive handle is dropped
/// before the caller moves on to the next input.
fn collect_archive(path: &Path, units: &mut Vec<ClassUnit>) {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(err) => {
            warn!("Failed to open {}: {}", path.display(), err);
            return;
        }
    };
    let mut archive = match ZipArchive::new(file) {
        Ok(archive) => archive,
        Err(err) => {
            warn!("Failed to read {}: {}", path.display(), err);
            return;
        }
    };

    let mut entry_names = Vec::new();
    for index in 0..archive.len() {
        let entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Failed to read {}: {}", path.display(), err);
                continue;
            }
        };
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if name.ends_with(".class")
            && !name.ends_with("module-info.class")
            && !name.starts_with("META-INF/versions/")
        {
            entry_names.push(name);
        }
    }
    entry_names.sort();

    debug!(
        "Adding archive {} with {} class entries",
        path.display(),
        entry_names.len()
    );
    for name in entry_names {
        let mut entry = match archive.by_name(&name) {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Failed to read {}:{}: {}", path.display(), name, err);
                continue;
            }
        };
        let mut bytes = Vec::new();
        if let Err(err) = entry.read_to_end(&mut bytes) {
            warn!("Failed to read {}:{}: {}", path.display(), name, err);
            continue;
        }
        units.push(ClassUnit {
            origin: format!("{}!/{}", path.display(), name),
            bytes,
        });
    }
}

fn path_key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
