//! systemd service to OpenRC script conversion
//!
//! A [`ServiceConfig`] is projected into [`TemplateData`], which is rendered
//! through a fixed `openrc-run` script template.

mod template;

pub use template::collapse_blank_lines;

use std::path::PathBuf;

use crate::units::{ServiceConfig, ServiceType};

/// Comment that marks a script as hand-edited
pub const MODIFIED_MARKER: &str = "# Modified by systemctl edit";

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("ExecStart is empty")]
    EmptyExecStart,

    #[error("cannot quote {field} for the shell: {source}")]
    Quote {
        field: &'static str,
        source: shlex::QuoteError,
    },

    #[error("failed to render script: {0}")]
    Render(#[from] std::fmt::Error),
}

/// Script-ready view of a service
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateData {
    pub name: String,
    pub description: Option<String>,
    pub documentation: Vec<String>,
    pub user: Option<String>,
    pub group: Option<String>,
    pub working_directory: Option<String>,
    pub environment_file: Option<String>,
    pub environment: Vec<String>,
    pub exec_start_pre_commands: Vec<String>,
    pub command: String,
    pub command_args: String,
    pub exec_start_post_commands: Vec<String>,
    pub stop_command: Option<String>,
    pub exec_stop_post_commands: Vec<String>,
    pub reload_commands: Vec<String>,
    pub pid_file: Option<String>,
    pub capabilities: String,
    pub command_background: bool,
    pub source_path: PathBuf,
    pub instance_name: Option<String>,
}

impl TemplateData {
    pub fn from_config(
        config: &ServiceConfig,
        service_name: &str,
        instance_name: Option<&str>,
    ) -> Result<Self, ConvertError> {
        let exec_start = config.exec_start.as_deref().unwrap_or_default();
        let (command, command_args) =
            split_exec_start(exec_start).ok_or(ConvertError::EmptyExecStart)?;

        let command_background = command_background(config.service_type);
        let has_pidfile = config.pid_file.is_some() || command_background;

        let stop_command = config
            .exec_stop
            .as_deref()
            .map(hook_command)
            .map(|cmd| if has_pidfile { replace_mainpid(&cmd) } else { cmd });

        let reload_commands = hook_commands(&config.exec_reload)
            .into_iter()
            .map(|cmd| if has_pidfile { replace_mainpid(&cmd) } else { cmd })
            .collect();

        Ok(Self {
            name: service_name.to_string(),
            description: config.description.clone(),
            documentation: config.documentation.clone(),
            user: config.user.clone(),
            group: config.group.clone(),
            working_directory: config.working_directory.clone(),
            environment_file: config.environment_file.clone(),
            environment: config.environment.clone(),
            exec_start_pre_commands: hook_commands(&config.exec_start_pre),
            command,
            command_args,
            exec_start_post_commands: hook_commands(&config.exec_start_post),
            stop_command,
            exec_stop_post_commands: hook_commands(&config.exec_stop_post),
            reload_commands,
            pid_file: config.pid_file.clone(),
            capabilities: format_capabilities(&config.ambient_capabilities),
            command_background,
            source_path: config.source_path.clone(),
            instance_name: instance_name.map(str::to_string),
        })
    }

    /// Render the OpenRC script text
    pub fn render(&self) -> Result<String, ConvertError> {
        template::render(self)
    }
}

/// Convert a parsed service into OpenRC script text
pub fn convert(
    config: &ServiceConfig,
    service_name: &str,
    instance_name: Option<&str>,
) -> Result<String, ConvertError> {
    TemplateData::from_config(config, service_name, instance_name)?.render()
}

/// Split `ExecStart` into the program and its argument string
pub fn split_exec_start(exec_start: &str) -> Option<(String, String)> {
    let (_, exec_start) = strip_exec_prefixes(exec_start);
    let mut parts = exec_start.split_whitespace();
    let command = parts.next()?.to_string();
    let args = parts.collect::<Vec<_>>().join(" ");
    Some((command, args))
}

/// Only `Type=forking` daemonizes on its own
pub fn command_background(service_type: Option<ServiceType>) -> bool {
    service_type != Some(ServiceType::Forking)
}

/// `CAP_NET_BIND_SERVICE CAP_SYS_TIME` -> `^cap_net_bind_service,^cap_sys_time`
pub fn format_capabilities(tokens: &[String]) -> String {
    tokens
        .iter()
        .flat_map(|t| t.split_whitespace())
        .map(|cap| format!("^{}", cap.to_lowercase()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Rewrite exec lines for the shell, keeping their order
pub fn hook_commands(commands: &[String]) -> Vec<String> {
    commands.iter().map(|cmd| hook_command(cmd)).collect()
}

/// A `-` prefix (systemd's ignore-failure marker) becomes `|| true`
fn hook_command(cmd: &str) -> String {
    let (ignore_failure, cmd) = strip_exec_prefixes(cmd);
    if ignore_failure {
        format!("{} || true", cmd)
    } else {
        cmd.to_string()
    }
}

/// Strip systemd exec prefixes. `-` is reported; `+`, `!`, `!!` and `:`
/// have no OpenRC equivalent and are dropped.
fn strip_exec_prefixes(cmd: &str) -> (bool, &str) {
    let mut ignore_failure = false;
    let mut rest = cmd.trim_start();
    while let Some(c) = rest.chars().next() {
        match c {
            '-' => ignore_failure = true,
            '+' | '!' | ':' => {}
            _ => break,
        }
        rest = &rest[1..];
    }
    (ignore_failure, rest)
}

/// Point `$MAINPID` at the pidfile OpenRC keeps for the service
fn replace_mainpid(cmd: &str) -> String {
    const PID: &str = "$(cat \"${pidfile}\")";
    cmd.replace("${MAINPID}", PID).replace("$MAINPID", PID)
}
