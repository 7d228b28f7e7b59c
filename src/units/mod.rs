//! Unit file discovery and parsing
//!
//! Finds systemd .service files in the search path and parses them (plus
//! drop-ins) into a typed [`ServiceConfig`].

mod name;
mod parser;
mod service;
pub mod specifiers;

pub use name::{normalize_service_name, UnitName};
pub use parser::{parse_service_str, unquote, ParseError, UnitParser};
pub use service::{ServiceConfig, ServiceType};
pub use specifiers::{HostFacts, Specifiers, SystemHost};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Find the unit file for `name`, first match in `search_paths` wins
pub fn find_unit(search_paths: &[PathBuf], name: &UnitName) -> Option<PathBuf> {
    let file_name = name.unit_file_name();
    search_paths
        .iter()
        .map(|base| base.join(&file_name))
        .find(|path| path.is_file())
}

/// All .service files in the search path, keyed by service name.
/// Earlier directories take precedence over later ones.
pub fn discover_units(search_paths: &[PathBuf]) -> BTreeMap<String, PathBuf> {
    let mut found = BTreeMap::new();

    for base in search_paths {
        if !base.is_dir() {
            log::debug!("Unit directory {} does not exist, skipping", base.display());
            continue;
        }

        let pattern = base.join("*.service");
        let Some(pattern) = pattern.to_str() else {
            continue;
        };
        let entries = match glob::glob(pattern) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Bad unit directory pattern {}: {}", pattern, e);
                continue;
            }
        };

        for path in entries.flatten() {
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let name = normalize_service_name(file_name).to_string();
            found.entry(name).or_insert(path);
        }
    }

    found
}

/// Load a service from disk, expanding specifiers when `name` is a template instance
pub async fn load_service(
    path: &Path,
    name: &UnitName,
    search_paths: &[PathBuf],
    host: &dyn HostFacts,
) -> Result<ServiceConfig, ParseError> {
    let instance = name.instance().unwrap_or_default();
    let unit_name = specifiers::instance_unit_name(path, instance);
    let specifiers = Specifiers::new(&unit_name, instance, host);

    let mut parser = UnitParser::new(path, name.instance().map(|_| &specifiers));
    parser.feed_file(path).await?;

    for dropin in find_dropins(path, name, search_paths) {
        log::debug!("Applying drop-in {}", dropin.display());
        parser.feed_file(&dropin).await?;
    }

    Ok(parser.finish())
}

/// Drop-in `*.conf` files for a unit, ordered by file name.
///
/// Looks in `<unit>.d/` next to the unit file and in every search
/// directory. Instances also read `app@inst.service.d/` ahead of the
/// template's `app@.service.d/`. A file name seen in an earlier directory
/// masks later ones.
fn find_dropins(unit_path: &Path, name: &UnitName, search_paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut dir_names = Vec::new();
    if name.instance().is_some() {
        dir_names.push(format!("{}.d", name.unit_name()));
    }
    dir_names.push(format!("{}.d", name.unit_file_name()));

    let bases = search_paths.iter().map(PathBuf::as_path).chain(unit_path.parent());
    let mut dirs: Vec<PathBuf> = Vec::new();
    for base in bases {
        for dir_name in &dir_names {
            let dir = base.join(dir_name);
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
    }

    let mut by_name: BTreeMap<String, PathBuf> = BTreeMap::new();
    for dir in dirs.iter().filter(|d| d.is_dir()) {
        let Some(pattern) = dir.join("*.conf").to_str().map(str::to_string) else {
            continue;
        };
        let Ok(entries) = glob::glob(&pattern) else {
            continue;
        };
        for path in entries.flatten() {
            if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
                by_name.entry(file_name.to_string()).or_insert(path);
            }
        }
    }

    by_name.into_values().collect()
}
