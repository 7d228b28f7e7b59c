//! systemctl verbs
//!
//! Every verb returns the process exit code. Batch verbs keep going after a
//! per-service failure and report it on stderr.

mod disable;
mod edit;
mod enable;
mod info;
mod lifecycle;
mod list;
mod show;
mod status;

pub use disable::disable;
pub use edit::{edit, edit_script, find_editor, EditOutcome};
pub use enable::enable;
pub use info::{daemon_reload, version};
pub use lifecycle::{lifecycle, run_action};
pub use list::{list, list_unit_files, list_units, ListRow, UnitFileRow, UnitRow};
pub use show::{format_show_output, manager_properties, service_properties, show};
pub use status::{is_active, is_enabled, status};

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::config::Config;
use crate::install::Installer;
use crate::openrc::InitBackend;
use crate::units::{HostFacts, UnitName};
use crate::Error;

/// Everything a verb needs
pub struct Context<B> {
    pub config: Config,
    pub backend: B,
    pub host: Box<dyn HostFacts>,
}

impl<B: InitBackend> Context<B> {
    pub fn new(config: Config, backend: B, host: Box<dyn HostFacts>) -> Self {
        Self {
            config,
            backend,
            host,
        }
    }

    pub fn unit_paths(&self) -> Vec<PathBuf> {
        self.config.unit_search_paths()
    }

    pub fn installer(&self) -> Installer<'_, B> {
        Installer::new(self.config.script_dir(), &self.backend)
    }

    /// Path of the installed script, or NotFound
    pub fn require_script(&self, name: &str) -> Result<PathBuf, Error> {
        let path = self.config.script_path(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(Error::NotFound(name.to_string()))
        }
    }

    /// Names of installed scripts (hidden files skipped)
    pub fn installed_scripts(&self) -> BTreeSet<String> {
        let dir = self.config.script_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("Cannot read {}: {}", dir.display(), e);
                return BTreeSet::new();
            }
        };

        entries
            .flatten()
            .filter(|entry| entry.file_type().map(|t| !t.is_dir()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| !name.starts_with('.'))
            .collect()
    }
}

/// OpenRC script name for a command-line service argument
pub fn service_name(arg: &str) -> String {
    UnitName::parse(arg).service_name()
}

fn report_failure(verb: &str, name: &str, err: &Error) {
    eprintln!("systemctl: failed to {} {}: {}", verb, name, err);
}

fn exit_code(failed: bool) -> i32 {
    if failed {
        1
    } else {
        0
    }
}
