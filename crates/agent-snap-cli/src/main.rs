//! agent-snap CLI
//!
//! Resolve and install the pinned grafana-agent snap for this machine.
//!
//! ## Commands
//!
//! - `arch`: Show raw and normalized host architecture
//! - `revisions`: Show the pinned revision table
//! - `resolve`: Dry-run revision resolution
//! - `install`: Install and hold the pinned revision
//! - `info`: Show snapd availability

use std::process::ExitCode;

use agent_snap::{
    install_grafana_agent, plan_install, raw_system_arch, Arch, InstallIntent, SnapCli,
    SnapCliConfig, SnapError, GRAFANA_AGENT_REVISIONS,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::Level;

/// Exit status for an architecture/confinement pair with no pinned revision
const EXIT_UNSUPPORTED_PLATFORM: u8 = 2;

#[derive(Parser)]
#[command(name = "agent-snap")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pinned grafana-agent snap management", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the host architecture as reported and as normalized
    Arch,

    /// Show the pinned revision table
    Revisions,

    /// Resolve the revision that would be installed, without installing
    Resolve {
        /// Use classic confinement
        #[arg(long)]
        classic: bool,

        /// Raw architecture to resolve for (default: this host)
        #[arg(long)]
        arch: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Install the pinned revision and hold it against refreshes
    Install {
        /// Use classic confinement
        #[arg(long)]
        classic: bool,

        /// `snap` executable to drive (default: snap)
        #[arg(long, env = "AGENT_SNAP_PROGRAM")]
        snap_program: Option<String>,
    },

    /// Show snapd availability
    Info {
        /// `snap` executable to probe (default: snap)
        #[arg(long, env = "AGENT_SNAP_PROGRAM")]
        snap_program: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct ResolveReport<'a> {
    raw_arch: &'a str,
    arch: &'a Arch,
    #[serde(flatten)]
    intent: &'a InstallIntent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    agent_snap::init_tracing(cli.json, level);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Arch => cmd_arch(),
        Commands::Revisions => cmd_revisions(),
        Commands::Resolve {
            classic,
            arch,
            output,
        } => cmd_resolve(classic, arch.as_deref(), output),
        Commands::Install {
            classic,
            snap_program,
        } => cmd_install(classic, snap_cli(snap_program.as_deref())),
        Commands::Info { snap_program } => cmd_info(snap_cli(snap_program.as_deref())),
    }
}

/// Unsupported platform gets its own status so operators can tell it from a
/// failed install.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<SnapError>() {
        Some(e) if e.is_unsupported_platform() => EXIT_UNSUPPORTED_PLATFORM,
        _ => 1,
    }
}

fn snap_cli(program: Option<&str>) -> SnapCli {
    match program {
        Some(p) => SnapCli::new(SnapCliConfig::new(p)),
        None => SnapCli::from_env(),
    }
}

fn cmd_arch() -> Result<()> {
    let raw = raw_system_arch();
    println!("Reported: {}", raw);
    println!("Normalized: {}", Arch::normalize(&raw));
    Ok(())
}

fn cmd_revisions() -> Result<()> {
    println!("{:<12} {:<10} {:>8}", "CONFINEMENT", "ARCH", "REVISION");
    for (confinement, arch, revision) in GRAFANA_AGENT_REVISIONS {
        println!("{:<12} {:<10} {:>8}", confinement, arch, revision);
    }
    Ok(())
}

fn cmd_resolve(classic: bool, arch: Option<&str>, output: OutputFormat) -> Result<()> {
    let raw_arch = match arch {
        Some(a) => a.to_string(),
        None => raw_system_arch(),
    };
    let intent = plan_install(classic, &raw_arch)?;

    match output {
        OutputFormat::Json => {
            let report = ResolveReport {
                raw_arch: &raw_arch,
                arch: &Arch::normalize(&raw_arch),
                intent: &intent,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("Snap: {}", intent.name);
            println!("Arch: {} ({})", Arch::normalize(&raw_arch), raw_arch);
            println!("Confinement: {}", intent.confinement());
            println!("Revision: {}", intent.revision);
        }
    }

    Ok(())
}

fn cmd_install(classic: bool, manager: SnapCli) -> Result<()> {
    let outcome = install_grafana_agent(&manager, classic)?;

    let previous = outcome.previous_revision.as_deref().unwrap_or("none");
    if outcome.changed {
        println!(
            "Installed {} revision {} (was {}), held",
            outcome.intent.name, outcome.intent.revision, previous
        );
    } else {
        println!(
            "{} already at revision {}, held",
            outcome.intent.name, outcome.intent.revision
        );
    }

    Ok(())
}

fn cmd_info(cli: SnapCli) -> Result<()> {
    println!("agent-snap {}", env!("CARGO_PKG_VERSION"));
    println!("Host architecture: {}", Arch::normalize(&raw_system_arch()));
    println!("Snap program: {}", cli.program());

    let version = cli
        .version()
        .with_context(|| format!("Failed to query {}", cli.program()));
    match version {
        Ok(v) => {
            println!("snapd available: yes");
            println!("snap version: {}", v);
            Ok(())
        }
        Err(e) => {
            println!("snapd available: no");
            Err(e)
        }
    }
}
