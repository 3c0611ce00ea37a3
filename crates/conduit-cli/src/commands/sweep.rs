//! Sweep command handler: route from one destination to all others.

use anyhow::{Context, Result};

use conduit_lib::output::SweepSummary;
use conduit_lib::BuiltNetwork;

use crate::output::{render, OutputFormat};

pub fn handle_sweep(built: &BuiltNetwork, from: &str, format: OutputFormat) -> Result<String> {
    let source = built
        .id(from)
        .with_context(|| format!("unknown source {from}"))?;
    let results = built
        .network()
        .lock()?
        .routes_from(source)
        .with_context(|| format!("cannot sweep from {from}"))?;

    let summary = SweepSummary::from_results(source, &results, built);
    render(&summary, format, SweepSummary::render)
}
