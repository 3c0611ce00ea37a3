use std::fmt::Write;

use serde::Serialize;

use crate::graph::{Facing, NodeId};
use crate::network::RouteLookup;
use crate::path::Route;
use crate::simplify::JunctionGraph;
use crate::topology::BuiltNetwork;

/// Resolves node ids to human-readable names.
pub trait NodeNames {
    fn node_name(&self, id: NodeId) -> Option<&str>;
}

impl NodeNames for BuiltNetwork {
    fn node_name(&self, id: NodeId) -> Option<&str> {
        self.name(id)
    }
}

/// Names nothing; renderings fall back to ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unnamed;

impl NodeNames for Unnamed {
    fn node_name(&self, _id: NodeId) -> Option<&str> {
        None
    }
}

/// Presentation style for turning a summary into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRenderMode {
    /// Header line followed by one line per step.
    PlainText,
    /// Everything on a single line.
    Compact,
}

/// Endpoint within a route.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RouteEndpoint {
    pub id: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RouteEndpoint {
    fn resolve(id: NodeId, names: &impl NodeNames) -> Self {
        Self {
            id,
            name: names.node_name(id).map(str::to_string),
        }
    }

    fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// Physical node visited along a route.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RouteStep {
    pub index: usize,
    pub id: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Facing travelled to enter this node; absent for the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facing: Option<Facing>,
}

impl RouteStep {
    fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// Serializable representation of a [`Route`] with resolved names.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RouteSummary {
    pub hops: usize,
    pub weight: u32,
    pub start: RouteEndpoint,
    pub goal: RouteEndpoint,
    /// Every node on the route, source first.
    pub steps: Vec<RouteStep>,
}

impl RouteSummary {
    pub fn from_route(route: &Route, names: &impl NodeNames) -> Self {
        let source = RouteStep {
            index: 0,
            id: route.source,
            name: names.node_name(route.source).map(str::to_string),
            facing: None,
        };
        let steps = std::iter::once(source)
            .chain(route.steps.iter().enumerate().map(|(offset, step)| RouteStep {
                index: offset + 1,
                id: step.node,
                name: names.node_name(step.node).map(str::to_string),
                facing: Some(step.facing),
            }))
            .collect();

        Self {
            hops: route.hop_count(),
            weight: route.weight,
            start: RouteEndpoint::resolve(route.source, names),
            goal: RouteEndpoint::resolve(route.target, names),
            steps,
        }
    }

    pub fn render(&self, mode: RouteRenderMode) -> String {
        match mode {
            RouteRenderMode::PlainText => self.render_plain(),
            RouteRenderMode::Compact => self.render_compact(),
        }
    }

    fn render_plain(&self) -> String {
        let mut buffer = String::new();
        let _ = writeln!(
            buffer,
            "Route: {} -> {} ({} hops, weight {})",
            self.start.display_name(),
            self.goal.display_name(),
            self.hops,
            self.weight
        );
        for step in &self.steps {
            match step.facing {
                Some(facing) => {
                    let _ = writeln!(
                        buffer,
                        "{:>3}: {} ({}) via {}",
                        step.index,
                        step.display_name(),
                        step.id,
                        facing
                    );
                }
                None => {
                    let _ = writeln!(
                        buffer,
                        "{:>3}: {} ({})",
                        step.index,
                        step.display_name(),
                        step.id
                    );
                }
            }
        }
        buffer
    }

    fn render_compact(&self) -> String {
        let joined = self
            .steps
            .iter()
            .map(RouteStep::display_name)
            .collect::<Vec<_>>()
            .join(" -> ");
        format!("{joined} (weight {})", self.weight)
    }
}

/// Result of routing from one destination to a single other destination.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepOutcome {
    Found { route: RouteSummary },
    NoPath,
    UnknownEndpoint { id: NodeId },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SweepEntry {
    pub target: RouteEndpoint,
    #[serde(flatten)]
    pub outcome: SweepOutcome,
}

/// Routes from one destination to every other destination.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SweepSummary {
    pub source: RouteEndpoint,
    pub reachable: usize,
    pub entries: Vec<SweepEntry>,
}

impl SweepSummary {
    pub fn from_results(
        source: NodeId,
        results: &[(NodeId, RouteLookup)],
        names: &impl NodeNames,
    ) -> Self {
        let entries: Vec<SweepEntry> = results
            .iter()
            .map(|(target, lookup)| SweepEntry {
                target: RouteEndpoint::resolve(*target, names),
                outcome: match lookup {
                    RouteLookup::Found(route) => SweepOutcome::Found {
                        route: RouteSummary::from_route(route, names),
                    },
                    RouteLookup::NoPath => SweepOutcome::NoPath,
                    RouteLookup::UnknownEndpoint(id) => SweepOutcome::UnknownEndpoint { id: *id },
                },
            })
            .collect();
        let reachable = entries
            .iter()
            .filter(|entry| matches!(entry.outcome, SweepOutcome::Found { .. }))
            .count();

        Self {
            source: RouteEndpoint::resolve(source, names),
            reachable,
            entries,
        }
    }

    pub fn render(&self) -> String {
        let mut buffer = String::new();
        let _ = writeln!(
            buffer,
            "Sweep from {}: {} of {} destinations reachable",
            self.source.display_name(),
            self.reachable,
            self.entries.len()
        );
        for entry in &self.entries {
            let target = entry.target.display_name();
            let _ = match &entry.outcome {
                SweepOutcome::Found { route } => {
                    writeln!(buffer, "  {target}: {}", route.render(RouteRenderMode::Compact))
                }
                SweepOutcome::NoPath => writeln!(buffer, "  {target}: no route"),
                SweepOutcome::UnknownEndpoint { id } => {
                    writeln!(buffer, "  {target}: unknown endpoint {id}")
                }
            };
        }
        buffer
    }
}

/// Edge of the simplified graph as listed by [`JunctionListing`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JunctionLink {
    pub target: RouteEndpoint,
    pub weight: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JunctionEntry {
    pub junction: RouteEndpoint,
    pub destination: bool,
    pub links: Vec<JunctionLink>,
}

/// Snapshot of a [`JunctionGraph`] with resolved names.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JunctionListing {
    pub epoch: u64,
    pub junctions: Vec<JunctionEntry>,
}

impl JunctionListing {
    pub fn from_graph(graph: &JunctionGraph, names: &impl NodeNames) -> Self {
        let junctions = graph
            .junctions()
            .map(|junction| JunctionEntry {
                junction: RouteEndpoint::resolve(junction.id, names),
                destination: junction.destination,
                links: junction
                    .edges
                    .iter()
                    .map(|edge| JunctionLink {
                        target: RouteEndpoint::resolve(edge.target, names),
                        weight: edge.weight,
                    })
                    .collect(),
            })
            .collect();

        Self {
            epoch: graph.epoch().get(),
            junctions,
        }
    }

    pub fn render(&self) -> String {
        let mut buffer = String::new();
        let _ = writeln!(
            buffer,
            "Junctions: {} (epoch {})",
            self.junctions.len(),
            self.epoch
        );
        for entry in &self.junctions {
            let marker = if entry.destination { " [destination]" } else { "" };
            let _ = writeln!(buffer, "{}{marker}", entry.junction.display_name());
            for link in &entry.links {
                let _ = writeln!(
                    buffer,
                    "  -> {} (weight {})",
                    link.target.display_name(),
                    link.weight
                );
            }
        }
        buffer
    }
}
