//! Route command handler for a single source and target.

use anyhow::{bail, Context, Result};

use conduit_lib::{BuiltNetwork, RouteLookup, RouteRenderMode, RouteSummary};

use super::display_name;
use crate::output::{render, OutputFormat};

/// Arguments for the route command.
#[derive(Debug, Clone)]
pub struct RouteCommandArgs {
    /// Source node name.
    pub from: String,
    /// Target node name.
    pub to: String,
}

pub fn handle_route(
    built: &BuiltNetwork,
    args: &RouteCommandArgs,
    format: OutputFormat,
) -> Result<String> {
    let source = built
        .id(&args.from)
        .with_context(|| format!("unknown source {}", args.from))?;
    let target = built
        .id(&args.to)
        .with_context(|| format!("unknown target {}", args.to))?;

    let lookup = built.network().lock()?.route_from_to(source, target);
    match lookup {
        RouteLookup::Found(route) => {
            let summary = RouteSummary::from_route(&route, built);
            render(&summary, format, |summary| {
                summary.render(RouteRenderMode::PlainText)
            })
        }
        RouteLookup::NoPath => bail!("No route found between {} and {}.", args.from, args.to),
        RouteLookup::UnknownEndpoint(id) => {
            bail!("{} is not a registered destination.", display_name(built, id))
        }
    }
}
