//! Conduit library entry points.
//!
//! This crate keeps a graph of physically linked nodes, collapses it into a
//! graph of junctions (branch points and destinations) and answers shortest
//! route queries between destinations, optionally memoizing results until the
//! topology changes. Hosts (the CLI, embedding applications) should drive
//! everything through [`Network`] or [`SharedNetwork`] so the junction graph
//! and route caches always match the current topology.
//!

#![deny(warnings)]

pub mod config;
pub mod diagnostics;
pub mod endpoint;
pub mod error;
pub mod graph;
pub mod network;
pub mod output;
pub mod path;
pub mod routing;
pub mod simplify;
pub mod topology;

pub use config::NetworkConfig;
pub use diagnostics::{DiagnosticsSink, NetworkEvent, NullSink, RecordingSink, TracingSink};
pub use endpoint::{Routable, StaticEndpoint};
pub use error::{Error, Result};
pub use graph::{Facing, Node, NodeGraph, NodeId, Step, TopologyEpoch};
pub use network::{Network, NetworkLink, NetworkState, RouteLookup, SharedNetwork};
pub use output::{RouteRenderMode, RouteSummary};
pub use path::{PathFinder, Route};
pub use routing::{CacheStats, RouteStrategy, Router, RouterKind};
pub use simplify::{simplify, JunctionGraph};
pub use topology::{BuiltNetwork, Topology};
