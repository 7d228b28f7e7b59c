//! daemon-reload and version

use crate::Error;

pub fn daemon_reload() -> Result<i32, Error> {
    println!("The 'daemon-reload' command is not needed in OpenRC.");
    println!("OpenRC reads service scripts directly each time they are used.");
    println!("No action was performed.");
    Ok(0)
}

pub fn version() -> Result<i32, Error> {
    println!("{}", version_string());
    Ok(0)
}

fn version_string() -> String {
    format!("systemctl (OpenRC translator) version {}", env!("CARGO_PKG_VERSION"))
}
