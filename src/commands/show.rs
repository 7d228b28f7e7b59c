//! show: systemd-style `Key=Value` properties

use std::collections::BTreeMap;

use crate::openrc::{ActiveState, InitBackend, InstalledScript};
use crate::Error;

use super::{service_name, Context};

/// systemd version reported to scripts that gate on it
const COMPAT_VERSION: &str = "230";

pub async fn show<B: InitBackend>(
    ctx: &Context<B>,
    name: Option<&str>,
    properties: &[String],
    value_only: bool,
) -> Result<i32, Error> {
    let props = match name {
        Some(arg) => service_properties(ctx, &service_name(arg)).await?,
        None => manager_properties(ctx),
    };
    print!("{}", format_show_output(&props, properties, value_only));
    Ok(0)
}

/// Properties of the (emulated) service manager
pub fn manager_properties<B>(ctx: &Context<B>) -> BTreeMap<String, String> {
    [
        ("Version", COMPAT_VERSION.to_string()),
        ("Architecture", ctx.host.architecture()),
        ("DefaultStandardOutput", "stdout".to_string()),
        ("DefaultStandardError", "inherit".to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Properties of one service, read from its installed script and the tools
pub async fn service_properties<B: InitBackend>(
    ctx: &Context<B>,
    name: &str,
) -> Result<BTreeMap<String, String>, Error> {
    let path = ctx.require_script(name)?;
    let script = InstalledScript::read(&path)
        .await
        .map_err(|e| Error::io(format!("failed to read {}", path.display()), e))?;

    let state = match ctx.backend.query_status(name).await {
        Ok(status) => status.state,
        Err(e) => {
            log::warn!("Cannot query status of {}: {}", name, e);
            ActiveState::Unknown
        }
    };
    let enabled = match ctx.backend.is_enabled(name).await {
        Ok(enabled) => enabled,
        Err(e) => {
            log::warn!("Cannot query runlevel for {}: {}", name, e);
            false
        }
    };

    let mut props = BTreeMap::new();
    props.insert("Id".to_string(), format!("{}.service", name));
    props.insert("LoadState".to_string(), "loaded".to_string());
    props.insert(
        "Description".to_string(),
        script.description.clone().unwrap_or_default(),
    );
    props.insert("ActiveState".to_string(), state.as_str().to_string());
    props.insert("SubState".to_string(), state.sub_state().as_str().to_string());
    props.insert(
        "UnitFileState".to_string(),
        if enabled { "enabled" } else { "disabled" }.to_string(),
    );
    let service_type = if script.command_background {
        "simple"
    } else {
        "forking"
    };
    props.insert("Type".to_string(), service_type.to_string());

    let optional = [
        ("ExecStart", script.exec_start()),
        ("User", script.command_user),
        ("WorkingDirectory", script.directory),
        ("PIDFile", script.pidfile),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            props.insert(key.to_string(), value);
        }
    }

    Ok(props)
}

/// Render properties sorted by key, optionally filtered to `requested`
pub fn format_show_output(
    props: &BTreeMap<String, String>,
    requested: &[String],
    value_only: bool,
) -> String {
    let mut out = String::new();
    for (key, value) in props {
        if !requested.is_empty() && !requested.iter().any(|r| r == key) {
            continue;
        }
        if value_only {
            out.push_str(value);
        } else {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
        }
        out.push('\n');
    }
    out
}
