//! OpenRC side of the translation
//!
//! Everything that touches `rc-update` or `rc-service` goes through the
//! [`InitBackend`] trait so commands can be tested without running tools.

mod script;
mod state;
mod tools;

pub use script::{is_modified, mark_modified, InstalledScript};
pub use state::{state_matches, ActiveState, SubState};
pub use tools::OpenRc;

use std::collections::BTreeSet;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        source: std::io::Error,
    },

    #[error("{tool} {args} failed ({}){}", exit_label(*code), stderr_suffix(stderr))]
    Failed {
        tool: &'static str,
        args: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} {args} timed out after {after:?}")]
    Timeout {
        tool: &'static str,
        args: String,
        after: Duration,
    },
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "killed by signal".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

/// `rc-service` actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
    Restart,
    Reload,
    Status,
}

impl ServiceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Reload => "reload",
            Self::Status => "status",
        }
    }

    /// `Starting`, `Stopping`, ...
    pub fn progress(&self) -> &'static str {
        match self {
            Self::Start => "Starting",
            Self::Stop => "Stopping",
            Self::Restart => "Restarting",
            Self::Reload => "Reloading",
            Self::Status => "Checking",
        }
    }

    /// `started`, `stopped`, ...
    pub fn done(&self) -> &'static str {
        match self {
            Self::Start => "started",
            Self::Stop => "stopped",
            Self::Restart => "restarted",
            Self::Reload => "reloaded",
            Self::Status => "checked",
        }
    }
}

/// Result of a status query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStatus {
    pub state: ActiveState,
    /// Raw `rc-service status` exit code, -1 if it was killed by a signal
    pub exit_code: i32,
}

impl ServiceStatus {
    pub fn from_exit_code(exit_code: i32) -> Self {
        Self {
            state: ActiveState::from_exit_code(exit_code),
            exit_code,
        }
    }
}

/// The narrow interface to the init system's tools
#[allow(async_fn_in_trait)]
pub trait InitBackend {
    /// Services registered in the configured runlevel
    async fn enabled_services(&self) -> Result<BTreeSet<String>, ToolError>;

    async fn is_enabled(&self, name: &str) -> Result<bool, ToolError> {
        Ok(self.enabled_services().await?.contains(name))
    }

    /// Register a service in the runlevel
    async fn add(&self, name: &str) -> Result<(), ToolError>;

    /// Remove a service from the runlevel
    async fn remove(&self, name: &str) -> Result<(), ToolError>;

    /// Run a lifecycle action with output going to the terminal.
    /// A non-zero exit is [`ToolError::Failed`].
    async fn control(&self, name: &str, action: ServiceAction) -> Result<(), ToolError>;

    /// Query status silently; any exit code is a valid answer
    async fn query_status(&self, name: &str) -> Result<ServiceStatus, ToolError>;
}

/// Parse `rc-update show <runlevel>` output.
///
/// Lines look like `  nginx | default`; a service is listed when the
/// runlevel appears after the `|`.
pub fn parse_runlevel_listing(output: &str, runlevel: &str) -> BTreeSet<String> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [name, "|", levels @ ..] if levels.contains(&runlevel) => Some(name.to_string()),
                _ => None,
            }
        })
        .collect()
}
