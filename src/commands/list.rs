//! list / list-units / list-unit-files

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::openrc::{state_matches, ActiveState, InitBackend, InstalledScript};
use crate::units::{discover_units, load_service, UnitName};
use crate::Error;

use super::Context;

/// A row of `list`
#[derive(Debug, Clone, PartialEq)]
pub struct ListRow {
    pub name: String,
    pub enabled: bool,
    /// Unit file the script was converted from
    pub source: Option<PathBuf>,
    pub converted: bool,
}

/// A row of `list-units`
#[derive(Debug, Clone, PartialEq)]
pub struct UnitRow {
    pub unit: String,
    pub loaded: bool,
    pub active: ActiveState,
    pub description: String,
}

/// A row of `list-unit-files`
#[derive(Debug, Clone, PartialEq)]
pub struct UnitFileRow {
    pub unit: String,
    pub state: &'static str,
}

pub async fn list<B: InitBackend>(ctx: &Context<B>, all: bool) -> Result<i32, Error> {
    let enabled = ctx.backend.enabled_services().await?;
    let units = discover_units(&ctx.unit_paths());
    let scripts = ctx.installed_scripts();

    print!("{}", format_list(&list_rows(&units, &scripts, &enabled, all)));
    Ok(0)
}

/// Unit files plus installed scripts. Scripts with no unit file are only
/// shown when enabled, unless `all`.
pub fn list_rows(
    units: &BTreeMap<String, PathBuf>,
    scripts: &BTreeSet<String>,
    enabled: &BTreeSet<String>,
    all: bool,
) -> Vec<ListRow> {
    let mut names: BTreeSet<&String> = units.keys().collect();
    names.extend(
        scripts
            .iter()
            .filter(|name| all || enabled.contains(*name) || units.contains_key(*name)),
    );

    names
        .into_iter()
        .map(|name| {
            let converted = scripts.contains(name);
            ListRow {
                name: name.clone(),
                enabled: enabled.contains(name),
                source: units.get(name).filter(|_| converted).cloned(),
                converted,
            }
        })
        .collect()
}

pub fn format_list(rows: &[ListRow]) -> String {
    let mut out = format!("{:<30} {}\n", "SERVICE", "STATUS");
    for row in rows {
        let status = if row.enabled { "enabled" } else { "disabled" };
        let line = match (&row.source, row.converted) {
            (_, false) => format!("{:<30} {} (not converted)", row.name, status),
            (Some(path), true) => format!("{:<30} {} (from {})", row.name, status, path.display()),
            (None, true) => format!("{:<30} {}", row.name, status),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

pub async fn list_units<B: InitBackend>(
    ctx: &Context<B>,
    all: bool,
    unit_type: Option<&str>,
    state: Option<&str>,
) -> Result<i32, Error> {
    let rows = if unit_type.map_or(true, |t| t == "service") {
        unit_rows(ctx, all, state).await?
    } else {
        Vec::new()
    };
    print!("{}", format_units(&rows));
    Ok(0)
}

async fn unit_rows<B: InitBackend>(
    ctx: &Context<B>,
    all: bool,
    state: Option<&str>,
) -> Result<Vec<UnitRow>, Error> {
    let search_paths = ctx.unit_paths();
    let units = discover_units(&search_paths);
    let scripts = ctx.installed_scripts();
    let enabled = ctx.backend.enabled_services().await?;

    let names: BTreeSet<&String> = units.keys().chain(scripts.iter()).collect();
    let mut rows = Vec::new();

    for name in names {
        let loaded = scripts.contains(name);
        let active = if loaded {
            ctx.backend.query_status(name).await?.state
        } else {
            ActiveState::Unknown
        };

        if !all && !enabled.contains(name) && active != ActiveState::Active {
            continue;
        }
        if let Some(filter) = state {
            if !state_matches(active, active.sub_state(), filter) {
                continue;
            }
        }

        let mut description = String::new();
        if loaded {
            if let Ok(script) = InstalledScript::read(&ctx.config.script_path(name)).await {
                description = script.description.unwrap_or_default();
            }
        }
        if description.is_empty() {
            if let Some(path) = units.get(name) {
                let unit = UnitName::parse(name);
                if let Ok(config) = load_service(path, &unit, &search_paths, ctx.host.as_ref()).await {
                    description = config.description.unwrap_or_default();
                }
            }
        }

        rows.push(UnitRow {
            unit: format!("{}.service", name),
            loaded,
            active,
            description,
        });
    }

    Ok(rows)
}

pub fn format_units(rows: &[UnitRow]) -> String {
    let mut out = format!(
        "{:<35} {:<10} {:<7} {:<7} {}\n",
        "UNIT", "LOAD", "ACTIVE", "SUB", "DESCRIPTION"
    );
    for row in rows {
        let load = if row.loaded { "loaded" } else { "not-found" };
        out.push_str(
            format!(
                "{:<35} {:<10} {:<7} {:<7} {}",
                row.unit,
                load,
                row.active.as_str(),
                row.active.sub_state().as_str(),
                row.description
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

pub async fn list_unit_files<B: InitBackend>(
    ctx: &Context<B>,
    unit_type: Option<&str>,
    state: Option<&str>,
) -> Result<i32, Error> {
    let enabled = ctx.backend.enabled_services().await?;
    let units = discover_units(&ctx.unit_paths());
    let scripts = ctx.installed_scripts();

    let rows = unit_file_rows(&units, &scripts, &enabled, unit_type, state);
    print!("{}", format_unit_files(&rows));
    Ok(0)
}

/// enabled/disabled for unit files, static for scripts without one
pub fn unit_file_rows(
    units: &BTreeMap<String, PathBuf>,
    scripts: &BTreeSet<String>,
    enabled: &BTreeSet<String>,
    unit_type: Option<&str>,
    state: Option<&str>,
) -> Vec<UnitFileRow> {
    if unit_type.is_some_and(|t| t != "service") {
        return Vec::new();
    }

    let mut states: BTreeMap<&String, &'static str> = units
        .keys()
        .map(|name| {
            let state = if enabled.contains(name) { "enabled" } else { "disabled" };
            (name, state)
        })
        .collect();
    for name in scripts {
        states.entry(name).or_insert("static");
    }

    states
        .into_iter()
        .filter(|(_, s)| state.map_or(true, |filter| filter == *s))
        .map(|(name, state)| UnitFileRow {
            unit: format!("{}.service", name),
            state,
        })
        .collect()
}

pub fn format_unit_files(rows: &[UnitFileRow]) -> String {
    let mut out = format!("{:<50} {}\n", "UNIT FILE", "STATE");
    for row in rows {
        out.push_str(&format!("{:<50} {}\n", row.unit, row.state));
    }
    out
}
