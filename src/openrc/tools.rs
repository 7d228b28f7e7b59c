//! `rc-update` / `rc-service` invocation

use std::collections::BTreeSet;
use std::future::Future;
use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;

use tokio::process::Command;

use super::{parse_runlevel_listing, InitBackend, ServiceAction, ServiceStatus, ToolError};

const RC_UPDATE: &str = "rc-update";
const RC_SERVICE: &str = "rc-service";

/// Backend that shells out to the OpenRC tools
#[derive(Debug, Clone)]
pub struct OpenRc {
    runlevel: String,
    timeout: Option<Duration>,
}

impl OpenRc {
    pub fn new(runlevel: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            runlevel: runlevel.into(),
            timeout,
        }
    }

    pub fn runlevel(&self) -> &str {
        &self.runlevel
    }

    /// Run a tool with captured output
    async fn output(&self, tool: &'static str, args: &[&str]) -> Result<Output, ToolError> {
        log::debug!("Running {} {}", tool, args.join(" "));
        let mut cmd = Command::new(tool);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        bounded(self.timeout, tool, args, cmd.output())
            .await?
            .map_err(|source| ToolError::Spawn { tool, source })
    }

    /// Run a tool attached to the terminal
    async fn status(&self, tool: &'static str, args: &[&str]) -> Result<ExitStatus, ToolError> {
        log::debug!("Running {} {}", tool, args.join(" "));
        let mut cmd = Command::new(tool);
        cmd.args(args).kill_on_drop(true);

        bounded(self.timeout, tool, args, cmd.status())
            .await?
            .map_err(|source| ToolError::Spawn { tool, source })
    }

    async fn checked(&self, tool: &'static str, args: &[&str]) -> Result<Output, ToolError> {
        let output = self.output(tool, args).await?;
        if !output.status.success() {
            return Err(ToolError::Failed {
                tool,
                args: args.join(" "),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

impl InitBackend for OpenRc {
    async fn enabled_services(&self) -> Result<BTreeSet<String>, ToolError> {
        let output = self.checked(RC_UPDATE, &["show", &self.runlevel]).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_runlevel_listing(&stdout, &self.runlevel))
    }

    async fn add(&self, name: &str) -> Result<(), ToolError> {
        let output = self.checked(RC_UPDATE, &["add", name, &self.runlevel]).await?;
        log::debug!("{}", String::from_utf8_lossy(&output.stdout).trim());
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<(), ToolError> {
        let output = self.checked(RC_UPDATE, &["del", name, &self.runlevel]).await?;
        log::debug!("{}", String::from_utf8_lossy(&output.stdout).trim());
        Ok(())
    }

    async fn control(&self, name: &str, action: ServiceAction) -> Result<(), ToolError> {
        let args = [name, action.as_str()];
        let status = self.status(RC_SERVICE, &args).await?;
        if !status.success() {
            return Err(ToolError::Failed {
                tool: RC_SERVICE,
                args: args.join(" "),
                code: status.code(),
                stderr: String::new(),
            });
        }
        Ok(())
    }

    async fn query_status(&self, name: &str) -> Result<ServiceStatus, ToolError> {
        let output = self.output(RC_SERVICE, &[name, "status"]).await?;
        let exit_code = output.status.code().unwrap_or(-1);
        log::debug!("{} {} status exited with {}", RC_SERVICE, name, exit_code);
        Ok(ServiceStatus::from_exit_code(exit_code))
    }
}

/// Apply the optional tool timeout to a pending invocation
async fn bounded<F, T>(
    limit: Option<Duration>,
    tool: &'static str,
    args: &[&str],
    fut: F,
) -> Result<T, ToolError>
where
    F: Future<Output = T>,
{
    match limit {
        Some(after) => tokio::time::timeout(after, fut)
            .await
            .map_err(|_| ToolError::Timeout {
                tool,
                args: args.join(" "),
                after,
            }),
        None => Ok(fut.await),
    }
}
