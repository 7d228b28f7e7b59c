//! status / is-active / is-enabled

use crate::openrc::{InitBackend, ServiceAction, ToolError};
use crate::Error;

use super::{service_name, Context};

/// Show `rc-service status`. A non-zero status is reported, not an error.
pub async fn status<B: InitBackend>(ctx: &Context<B>, arg: &str) -> Result<i32, Error> {
    let name = service_name(arg);
    ctx.require_script(&name)?;

    match ctx.backend.control(&name, ServiceAction::Status).await {
        Ok(()) => {}
        Err(ToolError::Failed { code, .. }) => {
            log::debug!("{} status exited with {:?}", name, code);
            println!("Service {} might be stopped or has issues", name);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(0)
}

/// Print the active state; exit with the status exit code
pub async fn is_active<B: InitBackend>(ctx: &Context<B>, arg: &str) -> Result<i32, Error> {
    let name = service_name(arg);
    ctx.require_script(&name)?;

    let status = ctx.backend.query_status(&name).await?;
    println!("{}", status.state.as_str());
    Ok(if status.exit_code < 0 { 1 } else { status.exit_code })
}

/// Print enabled/disabled; exit 1 when disabled
pub async fn is_enabled<B: InitBackend>(ctx: &Context<B>, arg: &str) -> Result<i32, Error> {
    let name = service_name(arg);
    ctx.require_script(&name)?;

    if ctx.backend.is_enabled(&name).await? {
        println!("enabled");
        Ok(0)
    } else {
        println!("disabled");
        Ok(1)
    }
}
