//! start / stop / restart / reload

use crate::openrc::{InitBackend, ServiceAction};
use crate::Error;

use super::{exit_code, report_failure, service_name, Context};

/// Apply `action` to every named service
pub async fn lifecycle<B: InitBackend>(
    ctx: &Context<B>,
    names: &[String],
    action: ServiceAction,
) -> Result<i32, Error> {
    let mut failed = false;
    for arg in names {
        let name = service_name(arg);
        let result = match ctx.require_script(&name) {
            Ok(_) => run_action(ctx, &name, action).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            report_failure(action.as_str(), &name, &e);
            failed = true;
        }
    }
    Ok(exit_code(failed))
}

/// Run one rc-service action with progress lines around it
pub async fn run_action<B: InitBackend>(
    ctx: &Context<B>,
    name: &str,
    action: ServiceAction,
) -> Result<(), Error> {
    println!("{} service {}...", action.progress(), name);
    ctx.backend.control(name, action).await?;
    println!("Service {} {}", name, action.done());
    Ok(())
}
