//! Junctions command handler: dump the simplified graph.

use anyhow::Result;

use conduit_lib::output::JunctionListing;
use conduit_lib::BuiltNetwork;

use crate::output::{render, OutputFormat};

pub fn handle_junctions(built: &BuiltNetwork, format: OutputFormat) -> Result<String> {
    let network = built.network().lock()?;
    let listing = JunctionListing::from_graph(network.junctions(), built);
    render(&listing, format, JunctionListing::render)
}
