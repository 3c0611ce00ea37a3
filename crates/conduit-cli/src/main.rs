use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use conduit_cli::commands::junctions::handle_junctions;
use conduit_cli::commands::route::{handle_route, RouteCommandArgs};
use conduit_cli::commands::sweep::handle_sweep;
use conduit_cli::logging::{init_logging, LogFormat, LoggingConfig};
use conduit_cli::output::OutputFormat;
use conduit_lib::{NetworkConfig, RouterKind, Topology, TracingSink};

#[derive(Parser, Debug)]
#[command(author, version, about = "Conduit topology routing utilities")]
struct Cli {
    /// Topology file (JSON) describing nodes, links and destinations.
    #[arg(long)]
    topology: PathBuf,

    /// Routing strategy; overrides the topology file and CONDUIT_ROUTER.
    #[arg(long)]
    router: Option<RouterKind>,

    /// Output format for command results.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Log format; overrides LOG_FORMAT.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the route between two destinations.
    Route {
        /// Source node name.
        #[arg(long = "from")]
        from: String,
        /// Target node name.
        #[arg(long = "to")]
        to: String,
    },
    /// Route from one destination to every other destination.
    Sweep {
        /// Source node name.
        #[arg(long = "from")]
        from: String,
    },
    /// Print the simplified junction graph.
    Junctions,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if let Some(format) = cli.log_format {
        logging = logging.with_format(format);
    }
    init_logging(&logging);

    let mut topology = Topology::from_path(&cli.topology)
        .with_context(|| format!("failed to load topology from {}", cli.topology.display()))?;
    if let Some(router) = cli.router {
        topology.router = Some(router);
    }
    let built = topology
        .build_with(NetworkConfig::from_env(), Arc::new(TracingSink))
        .with_context(|| format!("failed to build network from {}", cli.topology.display()))?;

    let output = match cli.command {
        Command::Route { from, to } => {
            handle_route(&built, &RouteCommandArgs { from, to }, cli.format)?
        }
        Command::Sweep { from } => handle_sweep(&built, &from, cli.format)?,
        Command::Junctions => handle_junctions(&built, cli.format)?,
    };
    print!("{output}");

    Ok(())
}
