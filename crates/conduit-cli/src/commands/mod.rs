//! Handlers for the CLI subcommands.
//!
//! Each handler takes a built network and returns the rendered output; the
//! binary only parses arguments and prints.

pub mod junctions;
pub mod route;
pub mod sweep;

use conduit_lib::{BuiltNetwork, NodeId};

/// Display name for a node, falling back to its id.
pub(crate) fn display_name(built: &BuiltNetwork, id: NodeId) -> String {
    built
        .name(id)
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string())
}
