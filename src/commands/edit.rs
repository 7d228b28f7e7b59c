//! Edit an installed script and stamp it as hand-modified

use std::path::Path;

use chrono::{Local, SecondsFormat};
use tokio::process::Command;

use crate::openrc::{is_modified, mark_modified, InitBackend};
use crate::Error;

use super::{service_name, Context};

const FALLBACK_EDITORS: &[&str] = &["vi", "nano", "ed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Unchanged,
    /// First edit, marker appended
    Marked,
    /// Marker already present, timestamp refreshed
    Refreshed,
}

pub async fn edit<B: InitBackend>(ctx: &Context<B>, arg: &str) -> Result<i32, Error> {
    let name = service_name(arg);
    let path = ctx.require_script(&name)?;

    let env_editor = std::env::var("EDITOR").ok();
    let editor = find_editor(env_editor.as_deref()).ok_or(Error::NoEditor)?;

    match edit_script(&path, &editor).await? {
        EditOutcome::Unchanged => println!("Service {} was not modified", name),
        EditOutcome::Marked => println!("Service {} has been modified and saved", name),
        EditOutcome::Refreshed => println!(
            "Service {} has been modified and saved (timestamp updated)",
            name
        ),
    }
    Ok(0)
}

/// Editor command line: `$EDITOR` when it resolves on PATH, else the first
/// of vi, nano and ed that does
pub fn find_editor(env_editor: Option<&str>) -> Option<Vec<String>> {
    if let Some(value) = env_editor.filter(|v| !v.trim().is_empty()) {
        let mut words = shlex::split(value).unwrap_or_default();
        if let Some(program) = words.first() {
            if let Ok(path) = which::which(program) {
                words[0] = path.to_string_lossy().into_owned();
                return Some(words);
            }
        }
        log::warn!("EDITOR={} not found on PATH, trying {:?}", value, FALLBACK_EDITORS);
    }

    FALLBACK_EDITORS
        .iter()
        .find_map(|editor| which::which(editor).ok())
        .map(|path| vec![path.to_string_lossy().into_owned()])
}

/// Run `editor` on `path` and mark the script if its content changed
pub async fn edit_script(path: &Path, editor: &[String]) -> Result<EditOutcome, Error> {
    let (program, args) = editor.split_first().ok_or(Error::NoEditor)?;
    let before = read_script(path).await?;

    let status = Command::new(program)
        .args(args)
        .arg(path)
        .status()
        .await
        .map_err(|e| Error::Editor(format!("{}: {}", program, e)))?;
    if !status.success() {
        return Err(Error::Editor(format!("{}: {}", program, status)));
    }

    let after = read_script(path).await?;
    if after == before {
        return Ok(EditOutcome::Unchanged);
    }

    let outcome = if is_modified(&after) {
        EditOutcome::Refreshed
    } else {
        EditOutcome::Marked
    };
    let timestamp = Local::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    tokio::fs::write(path, mark_modified(&after, &timestamp))
        .await
        .map_err(|e| Error::io(format!("failed to save {}", path.display()), e))?;

    Ok(outcome)
}

async fn read_script(path: &Path) -> Result<String, Error> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::io(format!("failed to read service file {}", path.display()), e))
}
