//! sysrc - systemctl for OpenRC systems
//!
//! Translates systemctl verbs into OpenRC actions:
//! - Parses systemd .service unit files (with drop-ins and template instances)
//! - Converts them into openrc-run scripts
//! - Drives rc-update and rc-service for enablement and lifecycle
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   systemctl                      │
//! ├─────────────────────────────────────────────────┤
//! │  Unit Parser  │  Script Converter │  Installer   │
//! ├─────────────────────────────────────────────────┤
//! │       InitBackend (rc-update / rc-service)       │
//! └─────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod convert;
pub mod install;
pub mod openrc;
pub mod units;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use convert::{convert, ConvertError, TemplateData};
pub use install::{InstallError, Installer};
pub use openrc::{InitBackend, OpenRc, ToolError};
pub use units::{ParseError, ServiceConfig, ServiceType, UnitName};

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("service {0} does not exist")]
    NotFound(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("failed to convert to OpenRC: {0}")]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("{} has been manually modified, use --force to overwrite", .0.display())]
    Conflict(PathBuf),

    #[error(transparent)]
    Install(InstallError),

    #[error("no editor found, install vi, nano or ed")]
    NoEditor,

    #[error("editor exited with error: {0}")]
    Editor(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

impl From<InstallError> for Error {
    fn from(err: InstallError) -> Self {
        match err {
            InstallError::Conflict { path } => Self::Conflict(path),
            other => Self::Install(other),
        }
    }
}
