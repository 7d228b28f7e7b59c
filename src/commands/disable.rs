//! Disable services

use crate::openrc::{InitBackend, ServiceAction};
use crate::Error;

use super::lifecycle::run_action;
use super::{exit_code, report_failure, service_name, Context};

pub async fn disable<B: InitBackend>(
    ctx: &Context<B>,
    names: &[String],
    now: bool,
) -> Result<i32, Error> {
    let mut failed = false;
    for arg in names {
        let name = service_name(arg);
        if let Err(e) = disable_one(ctx, &name, now).await {
            report_failure("disable", &name, &e);
            failed = true;
        }
    }
    Ok(exit_code(failed))
}

async fn disable_one<B: InitBackend>(ctx: &Context<B>, name: &str, now: bool) -> Result<(), Error> {
    ctx.require_script(name)?;

    if now {
        run_action(ctx, name, ServiceAction::Stop).await?;
    }

    ctx.backend.remove(name).await?;
    println!("Service {} has been disabled", name);
    Ok(())
}
