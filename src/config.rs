//! Resolved command-line configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Unit search directories, highest priority first
pub const DEFAULT_UNIT_PATHS: &[&str] = &[
    "/etc/systemd/system",
    "/lib/systemd/system",
    "/usr/lib/systemd/system",
];

pub const DEFAULT_INIT_DIR: &str = "/etc/init.d";
pub const DEFAULT_RUNLEVEL: &str = "default";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Filesystem root every configured path is resolved under
    pub root: PathBuf,
    pub unit_paths: Vec<PathBuf>,
    pub init_dir: PathBuf,
    pub runlevel: String,
    /// Upper bound on each rc-update/rc-service invocation
    pub tool_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            unit_paths: DEFAULT_UNIT_PATHS.iter().map(PathBuf::from).collect(),
            init_dir: PathBuf::from(DEFAULT_INIT_DIR),
            runlevel: DEFAULT_RUNLEVEL.to_string(),
            tool_timeout: None,
        }
    }
}

impl Config {
    /// Resolve an absolute path under `root`
    pub fn under_root(&self, path: &Path) -> PathBuf {
        if self.root == Path::new("/") {
            return path.to_path_buf();
        }
        self.root.join(path.strip_prefix("/").unwrap_or(path))
    }

    pub fn unit_search_paths(&self) -> Vec<PathBuf> {
        self.unit_paths.iter().map(|p| self.under_root(p)).collect()
    }

    pub fn script_dir(&self) -> PathBuf {
        self.under_root(&self.init_dir)
    }

    pub fn script_path(&self, name: &str) -> PathBuf {
        self.script_dir().join(name)
    }
}
