//! Structured network diagnostics.
//!
//! A [`Network`](crate::Network) reports what it does through the
//! [`DiagnosticsSink`] it was constructed with. [`TracingSink`] forwards
//! events to `tracing`; [`RecordingSink`] keeps them in memory.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::graph::{NodeId, TopologyEpoch};

/// Operation that was skipped because it would not change anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedundantOperation {
    RegisterDestination,
    UnregisterDestination,
    SetRoot,
    Connect,
    Disconnect,
    RemoveRoot,
}

/// Why a route query produced no route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    /// Both endpoints are destinations but no path connects them.
    Unreachable,
    /// An endpoint is absent from the network or is not a destination.
    UnknownEndpoint,
}

/// Event emitted by a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NetworkEvent {
    TopologyRebuilt {
        network: Uuid,
        epoch: TopologyEpoch,
        nodes: usize,
        junctions: usize,
        edges: usize,
    },
    NodeSubscribed {
        network: Uuid,
        node: NodeId,
        root: bool,
    },
    NodeRemoved {
        network: Uuid,
        node: NodeId,
    },
    DestinationRegistered {
        network: Uuid,
        node: NodeId,
    },
    DestinationUnregistered {
        network: Uuid,
        node: NodeId,
    },
    RouteFound {
        network: Uuid,
        source: NodeId,
        target: NodeId,
        weight: u32,
        elapsed_micros: u64,
    },
    RouteMissing {
        network: Uuid,
        source: NodeId,
        target: NodeId,
        reason: MissReason,
        elapsed_micros: u64,
    },
    SweepCompleted {
        network: Uuid,
        source: NodeId,
        reachable: usize,
        unreachable: usize,
        elapsed_micros: u64,
    },
    RedundantOperation {
        network: Uuid,
        operation: RedundantOperation,
        node: NodeId,
    },
    NetworkPurged {
        network: Uuid,
        dissolved: usize,
    },
}

pub(crate) fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

/// Receiver for network events.
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, event: &NetworkEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record(&self, event: &NetworkEvent) {
        match event {
            NetworkEvent::TopologyRebuilt {
                network,
                epoch,
                nodes,
                junctions,
                edges,
            } => debug!(%network, %epoch, nodes, junctions, edges, "topology rebuilt"),
            NetworkEvent::NodeSubscribed {
                network,
                node,
                root,
            } => debug!(%network, %node, root, "node subscribed"),
            NetworkEvent::NodeRemoved { network, node } => {
                debug!(%network, %node, "node removed")
            }
            NetworkEvent::DestinationRegistered { network, node } => {
                info!(%network, %node, "registered destination")
            }
            NetworkEvent::DestinationUnregistered { network, node } => {
                info!(%network, %node, "unregistered destination")
            }
            NetworkEvent::RouteFound {
                network,
                source,
                target,
                weight,
                elapsed_micros,
            } => info!(%network, %source, %target, weight, elapsed_micros, "route found"),
            NetworkEvent::RouteMissing {
                network,
                source,
                target,
                reason,
                elapsed_micros,
            } => info!(%network, %source, %target, ?reason, elapsed_micros, "route not found"),
            NetworkEvent::SweepCompleted {
                network,
                source,
                reachable,
                unreachable,
                elapsed_micros,
            } => info!(
                %network,
                %source,
                reachable,
                unreachable,
                elapsed_micros,
                "routing to all destinations completed"
            ),
            NetworkEvent::RedundantOperation {
                network,
                operation,
                node,
            } => warn!(%network, %node, ?operation, "redundant operation ignored"),
            NetworkEvent::NetworkPurged { network, dissolved } => {
                info!(%network, dissolved, "network purged")
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn record(&self, _event: &NetworkEvent) {}
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<NetworkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<NetworkEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn record(&self, event: &NetworkEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
