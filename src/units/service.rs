//! Typed service configuration read from a systemd .service file

use std::path::PathBuf;

/// Service type determines how the converted script backgrounds the command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    Simple,  // Stays in the foreground
    Exec,    // Like simple, ready after exec()
    Forking, // Daemonizes itself, parent exits
    Oneshot, // Runs once
    Dbus,    // Ready when D-Bus name acquired
    Notify,  // Ready on sd_notify READY=1
    Idle,    // Simple, delayed until jobs are dispatched
}

impl ServiceType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "simple" => Some(Self::Simple),
            "exec" => Some(Self::Exec),
            "forking" => Some(Self::Forking),
            "oneshot" => Some(Self::Oneshot),
            "dbus" => Some(Self::Dbus),
            "notify" => Some(Self::Notify),
            "idle" => Some(Self::Idle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Exec => "exec",
            Self::Forking => "forking",
            Self::Oneshot => "oneshot",
            Self::Dbus => "dbus",
            Self::Notify => "notify",
            Self::Idle => "idle",
        }
    }
}

/// Parsed [Unit], [Service] and [Install] settings of one service
///
/// Fields absent from the unit stay `None`/empty. Only `exec_start` is
/// required, and that is enforced at conversion time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceConfig {
    // [Unit]
    pub description: Option<String>,
    pub documentation: Vec<String>,

    // Credentials
    pub user: Option<String>,
    pub group: Option<String>,
    pub working_directory: Option<String>,

    // Environment
    pub environment_file: Option<String>,
    /// `KEY=VALUE` entries in file order, duplicates kept
    pub environment: Vec<String>,

    // Execution
    pub exec_start_pre: Vec<String>,
    pub exec_start: Option<String>,
    pub exec_start_post: Vec<String>,
    pub exec_stop: Option<String>,
    pub exec_stop_post: Vec<String>,
    pub exec_reload: Vec<String>,
    pub pid_file: Option<String>,
    pub service_type: Option<ServiceType>,

    // Restart (informational only)
    pub restart: Option<String>,
    pub restart_sec: Option<String>,

    pub ambient_capabilities: Vec<String>,

    // [Install]
    pub wanted_by: Vec<String>,

    /// Unit file this configuration was read from
    pub source_path: PathBuf,
}

impl ServiceConfig {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            ..Self::default()
        }
    }
}
