//! Script installation
//!
//! Writes generated scripts into the init directory and registers them in
//! the runlevel. The script is fully written and made executable before it
//! is moved into place, and registration only ever follows a successful
//! write.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::openrc::{is_modified, InitBackend, ToolError};

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("{} has been manually modified, use --force to overwrite", path.display())]
    Conflict { path: PathBuf },

    #[error("failed to inspect {}: {source}", path.display())]
    Inspect {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write OpenRC script {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to enable {name}: {source}")]
    Register {
        name: String,
        #[source]
        source: ToolError,
    },
}

pub struct Installer<'a, B> {
    init_dir: PathBuf,
    backend: &'a B,
}

impl<'a, B: InitBackend> Installer<'a, B> {
    pub fn new(init_dir: impl Into<PathBuf>, backend: &'a B) -> Self {
        Self {
            init_dir: init_dir.into(),
            backend,
        }
    }

    pub fn script_path(&self, name: &str) -> PathBuf {
        self.init_dir.join(name)
    }

    /// Refuse to replace a hand-edited script unless `force` is set
    pub async fn check_overwrite(&self, name: &str, force: bool) -> Result<(), InstallError> {
        if force {
            return Ok(());
        }

        let path = self.script_path(name);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) if is_modified(&content) => Err(InstallError::Conflict { path }),
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(InstallError::Inspect { path, source }),
        }
    }

    /// Write `script` as an executable file named `name`
    pub async fn write_script(&self, name: &str, script: &str) -> Result<PathBuf, InstallError> {
        let path = self.script_path(name);
        tokio::fs::create_dir_all(&self.init_dir)
            .await
            .map_err(|source| InstallError::Write {
                path: self.init_dir.clone(),
                source,
            })?;

        let tmp = self.init_dir.join(format!(".{}.sysrc-tmp", name));
        if let Err(source) = write_executable(&tmp, script, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(InstallError::Write { path, source });
        }

        log::debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Add the service to the runlevel
    pub async fn register(&self, name: &str) -> Result<(), InstallError> {
        self.backend
            .add(name)
            .await
            .map_err(|source| InstallError::Register {
                name: name.to_string(),
                source,
            })
    }

    /// Write then register
    pub async fn install(&self, name: &str, script: &str) -> Result<PathBuf, InstallError> {
        let path = self.write_script(name, script).await?;
        self.register(name).await?;
        Ok(path)
    }
}

async fn write_executable(tmp: &Path, content: &str, dest: &Path) -> std::io::Result<()> {
    tokio::fs::write(tmp, content).await?;
    tokio::fs::set_permissions(tmp, std::fs::Permissions::from_mode(0o755)).await?;
    tokio::fs::rename(tmp, dest).await
}
