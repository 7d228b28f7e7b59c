//! The openrc-run script template

use std::borrow::Cow;
use std::fmt::Write;

use super::{ConvertError, TemplateData};

pub(super) fn render(data: &TemplateData) -> Result<String, ConvertError> {
    let mut out = String::new();
    write_header(&mut out, data)?;
    write_variables(&mut out, data)?;
    write_environment(&mut out, data)?;
    write_hooks(&mut out, data)?;
    Ok(collapse_blank_lines(&out))
}

fn quote<'a>(field: &'static str, value: &'a str) -> Result<Cow<'a, str>, ConvertError> {
    shlex::try_quote(value).map_err(|source| ConvertError::Quote { field, source })
}

fn write_header(out: &mut String, data: &TemplateData) -> Result<(), ConvertError> {
    writeln!(out, "#!/sbin/openrc-run")?;
    writeln!(out, "# Generated by systemctl from {}", data.source_path.display())?;
    if let Some(instance) = &data.instance_name {
        writeln!(out, "# Instance: {}", instance)?;
    }
    for doc in &data.documentation {
        writeln!(out, "# Documentation: {}", doc)?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_variables(out: &mut String, data: &TemplateData) -> Result<(), ConvertError> {
    writeln!(out, "name={}", quote("name", &data.name)?)?;
    if let Some(description) = &data.description {
        writeln!(out, "description={}", quote("description", description)?)?;
    }
    writeln!(out)?;

    writeln!(out, "command={}", quote("command", &data.command)?)?;
    if !data.command_args.is_empty() {
        writeln!(out, "command_args={}", quote("command_args", &eval_words(&data.command_args)?)?)?;
    }
    match (&data.user, &data.group) {
        (Some(user), Some(group)) => {
            let user_group = format!("{}:{}", user, group);
            writeln!(out, "command_user={}", quote("command_user", &user_group)?)?;
        }
        (Some(user), None) => writeln!(out, "command_user={}", quote("command_user", user)?)?,
        (None, Some(group)) => {
            log::warn!(
                "Group={} without User= cannot be expressed for {}, ignoring",
                group,
                data.name
            );
        }
        (None, None) => {}
    }
    if let Some(dir) = &data.working_directory {
        writeln!(out, "directory={}", quote("directory", dir)?)?;
    }
    if data.command_background {
        writeln!(out, "command_background=true")?;
    }
    match &data.pid_file {
        Some(pid_file) => writeln!(out, "pidfile={}", quote("pidfile", pid_file)?)?,
        None if data.command_background => writeln!(out, "pidfile=\"/run/${{RC_SVCNAME}}.pid\"")?,
        None => {}
    }
    if !data.capabilities.is_empty() {
        writeln!(out, "capabilities={}", quote("capabilities", &data.capabilities)?)?;
    }
    if !data.reload_commands.is_empty() {
        writeln!(out, "extra_started_commands=\"reload\"")?;
    }
    writeln!(out)?;
    Ok(())
}

/// openrc-run passes `command_args` through `eval`, so every argument is
/// quoted once more. `$VAR` and `${VAR}` stay live so eval expands them
/// from the environment the way systemd does.
fn eval_words(args: &str) -> Result<String, ConvertError> {
    let words = shlex::split(args)
        .unwrap_or_else(|| args.split_whitespace().map(str::to_string).collect());

    let mut quoted = Vec::with_capacity(words.len());
    for word in &words {
        if let Some(name) = word.strip_prefix("${").and_then(|w| w.strip_suffix('}')) {
            if is_shell_name(name) {
                quoted.push(format!("\"{}\"", word));
                continue;
            }
        }
        if word.strip_prefix('$').is_some_and(is_shell_name) {
            quoted.push(word.clone());
            continue;
        }
        quoted.push(quote("command_args", word)?.into_owned());
    }
    Ok(quoted.join(" "))
}

fn write_environment(out: &mut String, data: &TemplateData) -> Result<(), ConvertError> {
    if let Some(file) = &data.environment_file {
        let file = quote("environment_file", file)?;
        writeln!(out, "if [ -f {} ]; then", file)?;
        writeln!(out, "\tset -a")?;
        writeln!(out, "\t. {}", file)?;
        writeln!(out, "\tset +a")?;
        writeln!(out, "fi")?;
        writeln!(out)?;
    }

    for entry in &data.environment {
        let assignments = environment_assignments(entry);
        if assignments.is_empty() {
            log::warn!("Skipping malformed Environment entry for {}: {}", data.name, entry);
        }
        for (key, value) in assignments {
            writeln!(out, "export {}={}", key, quote("environment", &value)?)?;
        }
    }
    writeln!(out)?;
    Ok(())
}

fn write_hooks(out: &mut String, data: &TemplateData) -> Result<(), ConvertError> {
    write_function(out, "start_pre", None, &data.exec_start_pre_commands)?;
    write_function(out, "start_post", None, &data.exec_start_post_commands)?;

    if let Some(stop) = &data.stop_command {
        writeln!(out, "stop() {{")?;
        writeln!(out, "\tebegin \"Stopping ${{RC_SVCNAME}}\"")?;
        writeln!(out, "\t{}", stop)?;
        writeln!(out, "\teend $?")?;
        writeln!(out, "}}")?;
        writeln!(out)?;
    }

    write_function(out, "stop_post", None, &data.exec_stop_post_commands)?;
    write_function(out, "reload", Some("Reloading"), &data.reload_commands)?;
    Ok(())
}

/// Emit a hook function whose commands run under `set -e`, so an unguarded
/// failure aborts the hook while `|| true` lines are tolerated.
fn write_function(
    out: &mut String,
    name: &str,
    banner: Option<&str>,
    commands: &[String],
) -> Result<(), ConvertError> {
    if commands.is_empty() {
        return Ok(());
    }

    writeln!(out, "{}() {{", name)?;
    if let Some(banner) = banner {
        writeln!(out, "\tebegin \"{} ${{RC_SVCNAME}}\"", banner)?;
    }
    writeln!(out, "\t(")?;
    writeln!(out, "\t\tset -e")?;
    for cmd in commands {
        writeln!(out, "\t\t{}", cmd)?;
    }
    writeln!(out, "\t)")?;
    if banner.is_some() {
        writeln!(out, "\teend $?")?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;
    Ok(())
}

/// Split an `Environment=` entry into assignments.
///
/// `A=1 B=2` yields two assignments when every word is one; otherwise the
/// entry is a single `KEY=VALUE` split at the first `=`.
fn environment_assignments(entry: &str) -> Vec<(String, String)> {
    if let Some(words) = shlex::split(entry) {
        let pairs: Option<Vec<_>> = words
            .iter()
            .map(|word| word.split_once('=').filter(|(key, _)| is_shell_name(key)))
            .collect();
        if let Some(pairs) = pairs {
            if pairs.len() > 1 {
                return pairs
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
            }
        }
    }

    match entry.split_once('=') {
        Some((key, value)) if is_shell_name(key.trim()) => {
            vec![(key.trim().to_string(), value.to_string())]
        }
        _ => Vec::new(),
    }
}

fn is_shell_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Collapse runs of blank lines into one and trim the whole script.
///
/// Non-blank lines keep their indentation; the result ends in a newline.
pub fn collapse_blank_lines(input: &str) -> String {
    let mut lines = Vec::new();
    let mut prev_empty = false;

    for line in input.lines() {
        let empty = line.trim().is_empty();
        if !empty {
            lines.push(line);
        } else if !prev_empty {
            lines.push("");
        }
        prev_empty = empty;
    }

    let mut out = lines.join("\n").trim().to_string();
    out.push('\n');
    out
}
