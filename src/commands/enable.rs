//! Enable services: convert the unit, install the script, add it to the runlevel

use crate::convert::convert;
use crate::install::InstallError;
use crate::openrc::{InitBackend, ServiceAction};
use crate::units::{find_unit, load_service, UnitName};
use crate::Error;

use super::lifecycle::run_action;
use super::{exit_code, report_failure, Context};

pub async fn enable<B: InitBackend>(
    ctx: &Context<B>,
    names: &[String],
    now: bool,
    force: bool,
) -> Result<i32, Error> {
    let mut failed = false;
    for name in names {
        if let Err(e) = enable_one(ctx, name, now, force).await {
            report_failure("enable", name, &e);
            failed = true;
        }
    }
    Ok(exit_code(failed))
}

async fn enable_one<B: InitBackend>(
    ctx: &Context<B>,
    arg: &str,
    now: bool,
    force: bool,
) -> Result<(), Error> {
    let unit = UnitName::parse(arg);
    let name = unit.service_name();
    let installer = ctx.installer();
    let script_exists = installer.script_path(&name).is_file();

    let search_paths = ctx.unit_paths();
    let unit_path = find_unit(&search_paths, &unit);

    match installer.check_overwrite(&name, force).await {
        Err(InstallError::Conflict { .. }) => {
            println!(
                "Service {} has been manually modified. Use --force to overwrite.",
                name
            );
            if unit_path.is_some() {
                println!("Skipping conversion due to manual modifications. Enabling existing service.");
            }
        }
        Err(e) => return Err(e.into()),
        Ok(()) => match unit_path {
            Some(path) => {
                log::debug!("Converting {} from {}", name, path.display());
                let config = load_service(&path, &unit, &search_paths, ctx.host.as_ref()).await?;
                let script = convert(&config, &name, unit.instance())?;
                installer.write_script(&name, &script).await?;
                println!("Service {} has been converted to OpenRC", name);
            }
            None if script_exists => {
                println!(
                    "No systemd service file found for {}, but OpenRC service exists. Enabling existing service.",
                    arg
                );
            }
            None => return Err(Error::NotFound(unit.unit_file_name())),
        },
    }

    installer.register(&name).await?;
    println!("Service {} has been enabled", name);

    if now {
        run_action(ctx, &name, ServiceAction::Start).await?;
    }
    Ok(())
}
