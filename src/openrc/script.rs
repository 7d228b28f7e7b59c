//! Inspection of installed `/etc/init.d` scripts

use std::path::Path;

use crate::convert::MODIFIED_MARKER;

/// Variables read back from an installed openrc-run script
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstalledScript {
    pub description: Option<String>,
    pub command: Option<String>,
    pub command_args: Option<String>,
    pub command_user: Option<String>,
    pub directory: Option<String>,
    pub pidfile: Option<String>,
    pub command_background: bool,
    pub modified: bool,
}

impl InstalledScript {
    /// Read top-level `key=value` assignments. Later assignments win, as
    /// they would when the shell sources the script.
    pub fn parse(content: &str) -> Self {
        let mut script = Self {
            modified: is_modified(content),
            ..Self::default()
        };

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = shell_value(value);
            match key {
                "description" => script.description = Some(value),
                "command" => script.command = Some(value),
                // Quoted twice: once for the assignment, once for eval
                "command_args" => script.command_args = Some(shell_value(&value)),
                "command_user" => script.command_user = Some(value),
                "directory" => script.directory = Some(value),
                "pidfile" => script.pidfile = Some(value),
                "command_background" => {
                    script.command_background = matches!(value.as_str(), "true" | "yes" | "1")
                }
                _ => {}
            }
        }

        script
    }

    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(Self::parse(&content))
    }

    /// `command` plus `command_args`, as the service would be launched
    pub fn exec_start(&self) -> Option<String> {
        let command = self.command.as_deref()?;
        match self.command_args.as_deref() {
            Some(args) if !args.is_empty() => Some(format!("{} {}", command, args)),
            _ => Some(command.to_string()),
        }
    }
}

/// Undo shell quoting on an assignment's right-hand side
fn shell_value(raw: &str) -> String {
    match shlex::split(raw) {
        Some(words) => words.join(" "),
        None => raw.trim().trim_matches(|c| c == '"' || c == '\'').to_string(),
    }
}

/// Has the script been hand-edited through `systemctl edit`?
pub fn is_modified(content: &str) -> bool {
    content.contains(MODIFIED_MARKER)
}

/// Stamp the modification marker with `timestamp`, replacing an existing
/// marker line or appending a new one.
pub fn mark_modified(content: &str, timestamp: &str) -> String {
    let marker = format!("{} on {}", MODIFIED_MARKER, timestamp);

    if !is_modified(content) {
        let mut out = content.to_string();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&marker);
        out.push('\n');
        return out;
    }

    content
        .split('\n')
        .map(|line| {
            if line.trim_start().starts_with(MODIFIED_MARKER) {
                marker.as_str()
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
