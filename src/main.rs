//! systemctl - systemd-style service management on OpenRC

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use sysrc::commands::{self, Context};
use sysrc::config::{Config, DEFAULT_INIT_DIR, DEFAULT_RUNLEVEL};
use sysrc::openrc::{InitBackend, OpenRc, ServiceAction};
use sysrc::units::SystemHost;

#[derive(Parser)]
#[command(name = "systemctl")]
#[command(version)]
#[command(about = "Translate systemctl commands to OpenRC")]
struct Args {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct GlobalArgs {
    /// Resolve all paths under this root directory
    #[arg(long, global = true, env = "SYSRC_ROOT", default_value = "/")]
    root: PathBuf,

    /// Unit search directory, highest priority first (repeatable)
    #[arg(long = "unit-path", global = true, env = "SYSRC_UNIT_PATH", value_delimiter = ':')]
    unit_paths: Vec<PathBuf>,

    /// Directory holding OpenRC scripts
    #[arg(long, global = true, env = "SYSRC_INIT_DIR", default_value = DEFAULT_INIT_DIR)]
    init_dir: PathBuf,

    /// Runlevel used by enable/disable
    #[arg(long, global = true, env = "SYSRC_RUNLEVEL", default_value = DEFAULT_RUNLEVEL)]
    runlevel: String,

    /// Give up on rc-update/rc-service after this many seconds
    #[arg(long, global = true, env = "SYSRC_TOOL_TIMEOUT")]
    tool_timeout: Option<u64>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

impl GlobalArgs {
    fn into_config(self) -> Config {
        let defaults = Config::default();
        Config {
            root: self.root,
            unit_paths: if self.unit_paths.is_empty() {
                defaults.unit_paths
            } else {
                self.unit_paths
            },
            init_dir: self.init_dir,
            runlevel: self.runlevel,
            tool_timeout: self.tool_timeout.map(Duration::from_secs),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Convert services to OpenRC scripts and enable them at boot
    Enable {
        /// Start the services after enabling them
        #[arg(long)]
        now: bool,
        /// Overwrite manually modified scripts
        #[arg(short, long)]
        force: bool,
        /// Service names (e.g., "nginx" or "app@worker1.service")
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Remove services from the runlevel
    Disable {
        /// Stop the services before disabling them
        #[arg(long)]
        now: bool,
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Start services
    Start {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Stop services
    Stop {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Restart services
    Restart {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Reload services
    Reload {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Show service status
    Status { name: String },

    /// Print the active state, exit non-zero unless active
    IsActive { name: String },

    /// Print whether the service starts at boot, exit 1 if not
    IsEnabled { name: String },

    /// Show properties of a service or the service manager
    Show {
        name: Option<String>,
        /// Only these properties (repeatable, comma separated)
        #[arg(short = 'p', long = "property", value_delimiter = ',')]
        properties: Vec<String>,
        /// Print values only
        #[arg(long)]
        value: bool,
    },

    /// List systemd services and their OpenRC status
    #[command(alias = "ls")]
    List {
        /// Include disabled OpenRC-only services
        #[arg(short, long)]
        all: bool,
    },

    /// List units with their load and active states
    ListUnits {
        /// Include disabled and inactive units
        #[arg(short, long)]
        all: bool,
        /// Filter by unit type (service)
        #[arg(long = "type")]
        unit_type: Option<String>,
        /// Filter by state (active, inactive, failed, running, dead)
        #[arg(long)]
        state: Option<String>,
    },

    /// List unit files with their enablement state
    ListUnitFiles {
        /// Filter by unit type (service)
        #[arg(long = "type")]
        unit_type: Option<String>,
        /// Filter by state (enabled, disabled, static)
        #[arg(long)]
        state: Option<String>,
    },

    /// Edit an installed OpenRC script
    Edit { name: String },

    /// No-op under OpenRC
    DaemonReload,

    /// Show version information
    Version,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let default_level = if args.global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = args.global.into_config();
    log::debug!("Using {:?}", config);

    let backend = OpenRc::new(config.runlevel.clone(), config.tool_timeout);
    let host = SystemHost::new(&config.root);
    let ctx = Context::new(config, backend, Box::new(host));

    let code = match run(&ctx, args.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("systemctl: {}", e);
            1
        }
    };
    std::process::exit(code);
}

async fn run<B: InitBackend>(ctx: &Context<B>, command: Command) -> Result<i32, sysrc::Error> {
    match command {
        Command::Enable { now, force, names } => commands::enable(ctx, &names, now, force).await,
        Command::Disable { now, names } => commands::disable(ctx, &names, now).await,
        Command::Start { names } => commands::lifecycle(ctx, &names, ServiceAction::Start).await,
        Command::Stop { names } => commands::lifecycle(ctx, &names, ServiceAction::Stop).await,
        Command::Restart { names } => {
            commands::lifecycle(ctx, &names, ServiceAction::Restart).await
        }
        Command::Reload { names } => commands::lifecycle(ctx, &names, ServiceAction::Reload).await,
        Command::Status { name } => commands::status(ctx, &name).await,
        Command::IsActive { name } => commands::is_active(ctx, &name).await,
        Command::IsEnabled { name } => commands::is_enabled(ctx, &name).await,
        Command::Show {
            name,
            properties,
            value,
        } => commands::show(ctx, name.as_deref(), &properties, value).await,
        Command::List { all } => commands::list(ctx, all).await,
        Command::ListUnits {
            all,
            unit_type,
            state,
        } => commands::list_units(ctx, all, unit_type.as_deref(), state.as_deref()).await,
        Command::ListUnitFiles { unit_type, state } => {
            commands::list_unit_files(ctx, unit_type.as_deref(), state.as_deref()).await
        }
        Command::Edit { name } => commands::edit(ctx, &name).await,
        Command::DaemonReload => commands::daemon_reload(),
        Command::Version => commands::version(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_enable_flags() {
        let args = Args::try_parse_from(["systemctl", "enable", "--now", "-f", "a", "b"]).unwrap();
        match args.command {
            Command::Enable { now, force, names } => {
                assert!(now);
                assert!(force);
                assert_eq!(names, vec!["a", "b"]);
            }
            _ => panic!("expected enable"),
        }
    }

    #[test]
    fn test_enable_requires_a_name() {
        assert!(Args::try_parse_from(["systemctl", "enable"]).is_err());
    }

    #[test]
    fn test_show_properties_split_on_commas() {
        let args = Args::try_parse_from([
            "systemctl", "show", "nginx", "-p", "ActiveState,SubState", "--property", "Id", "--value",
        ])
        .unwrap();
        match args.command {
            Command::Show {
                name,
                properties,
                value,
            } => {
                assert_eq!(name.as_deref(), Some("nginx"));
                assert_eq!(properties, vec!["ActiveState", "SubState", "Id"]);
                assert!(value);
            }
            _ => panic!("expected show"),
        }
    }

    #[test]
    fn test_ls_alias_and_global_flags() {
        let args = Args::try_parse_from([
            "systemctl", "ls", "-a", "--root", "/mnt", "--unit-path", "/a", "--unit-path", "/b",
            "--tool-timeout", "5",
        ])
        .unwrap();
        assert!(matches!(args.command, Command::List { all: true }));
        let config = args.global.into_config();
        assert_eq!(config.root, PathBuf::from("/mnt"));
        assert_eq!(config.unit_paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(config.tool_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_default_config() {
        let args = Args::try_parse_from(["systemctl", "daemon-reload"]).unwrap();
        let config = args.global.into_config();
        assert_eq!(config.unit_paths, Config::default().unit_paths);
        assert_eq!(config.runlevel, "default");
    }
}
