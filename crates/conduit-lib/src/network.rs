//! Network orchestration.
//!
//! A [`Network`] owns the physical [`NodeGraph`], the derived
//! [`JunctionGraph`] and one [`Router`]. Every topology mutation goes through
//! the network so the junction graph is rebuilt and the router invalidated
//! before the next query can run. [`SharedNetwork`] puts the whole network
//! behind one lock for multi-threaded hosts.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::config::NetworkConfig;
use crate::diagnostics::{
    micros, DiagnosticsSink, MissReason, NetworkEvent, RedundantOperation,
};
use crate::endpoint::Routable;
use crate::error::{Error, Result};
use crate::graph::{Facing, Node, NodeGraph, NodeId, TopologyEpoch};
use crate::path::Route;
use crate::routing::{CacheStats, RouteStrategy, Router, RouterKind};
use crate::simplify::{simplify, JunctionGraph};

/// Lifecycle state of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    /// No root has been registered yet.
    Uninitialized,
    /// A root exists; the network accepts mutations and queries.
    Active,
}

/// Outcome of a route query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteLookup {
    Found(Arc<Route>),
    /// Both endpoints are destinations but they are not connected.
    NoPath,
    /// The identifier is absent from the network or is not a destination.
    UnknownEndpoint(NodeId),
}

impl RouteLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, RouteLookup::Found(_))
    }

    pub fn route(&self) -> Option<&Arc<Route>> {
        match self {
            RouteLookup::Found(route) => Some(route),
            _ => None,
        }
    }
}

/// Weak handle an endpoint keeps to the network it belongs to.
#[derive(Clone)]
pub struct NetworkLink {
    name: Uuid,
    handle: Weak<Mutex<Network>>,
}

impl NetworkLink {
    /// Name of the network this link points at.
    pub fn name(&self) -> Uuid {
        self.name
    }

    /// Shared handle to the network, if it is still alive and shared.
    pub fn upgrade(&self) -> Option<SharedNetwork> {
        self.handle.upgrade().map(|inner| SharedNetwork { inner })
    }

    pub fn is_attached(&self) -> bool {
        self.handle.strong_count() > 0
    }
}

impl fmt::Debug for NetworkLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkLink")
            .field("name", &self.name)
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// A single routing network.
pub struct Network {
    name: Uuid,
    graph: NodeGraph,
    junctions: JunctionGraph,
    router: Router,
    link: NetworkLink,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl Network {
    /// Create a standalone network.
    ///
    /// Endpoints subscribed to a standalone network receive a link that never
    /// upgrades; use [`SharedNetwork::new`] when endpoints need to call back.
    pub fn new(config: &NetworkConfig, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        Self::build(config, diagnostics, Weak::new())
    }

    fn build(
        config: &NetworkConfig,
        diagnostics: Arc<dyn DiagnosticsSink>,
        handle: Weak<Mutex<Network>>,
    ) -> Self {
        let name = config.name.unwrap_or_else(Uuid::new_v4);
        let graph = NodeGraph::new();
        let junctions = simplify(&graph);
        Self {
            name,
            graph,
            junctions,
            router: Router::new(config.router),
            link: NetworkLink { name, handle },
            diagnostics,
        }
    }

    pub fn name(&self) -> Uuid {
        self.name
    }

    /// Network name as a string.
    pub fn get_name(&self) -> String {
        self.name.to_string()
    }

    pub fn state(&self) -> NetworkState {
        if self.graph.root().is_some() {
            NetworkState::Active
        } else {
            NetworkState::Uninitialized
        }
    }

    pub fn router_kind(&self) -> RouterKind {
        self.router.kind()
    }

    pub fn router_stats(&self) -> CacheStats {
        self.router.stats()
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn junctions(&self) -> &JunctionGraph {
        &self.junctions
    }

    pub fn epoch(&self) -> TopologyEpoch {
        self.graph.epoch()
    }

    /// Link handed to endpoints on subscription.
    pub fn link(&self) -> NetworkLink {
        self.link.clone()
    }

    /// Register the root node.
    ///
    /// Returns [`NodeId::NIL`] without changing anything when a root exists.
    pub fn set_root<E: Routable + 'static>(&mut self, endpoint: &Arc<E>) -> NodeId {
        let weak = downgrade(endpoint);
        let id = self.graph.set_root(weak);
        if id.is_nil() {
            self.emit(NetworkEvent::RedundantOperation {
                network: self.name,
                operation: RedundantOperation::SetRoot,
                node: self.graph.root().unwrap_or(NodeId::NIL),
            });
            return id;
        }
        endpoint.subscribe(self.link());
        self.emit(NetworkEvent::NodeSubscribed {
            network: self.name,
            node: id,
            root: true,
        });
        self.rescan();
        id
    }

    pub fn get_root(&self) -> Option<&Node> {
        self.graph.root().and_then(|id| self.graph.node(id))
    }

    /// Add a node for `endpoint` and link the endpoint back to this network.
    pub fn subscribe_node<E: Routable + 'static>(&mut self, endpoint: &Arc<E>) -> NodeId {
        let weak = downgrade(endpoint);
        let id = self.graph.add_node(weak);
        endpoint.subscribe(self.link());
        self.emit(NetworkEvent::NodeSubscribed {
            network: self.name,
            node: id,
            root: false,
        });
        self.rescan();
        id
    }

    /// Link two nodes; `b` is reached from `a` by leaving through `facing`.
    pub fn connect(&mut self, a: NodeId, b: NodeId, facing: Facing) -> Result<bool> {
        let changed = self.graph.connect(a, b, facing)?;
        if changed {
            self.rescan();
        } else {
            self.redundant(RedundantOperation::Connect, a);
        }
        Ok(changed)
    }

    /// Remove every link between two nodes.
    pub fn disconnect(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        let changed = self.graph.disconnect(a, b)?;
        if changed {
            self.rescan();
        } else {
            self.redundant(RedundantOperation::Disconnect, a);
        }
        Ok(changed)
    }

    /// Remove and dissolve a node. The root is never removed.
    pub fn remove_node(&mut self, id: NodeId) -> Result<bool> {
        if self.graph.root() == Some(id) {
            self.redundant(RedundantOperation::RemoveRoot, id);
            return Ok(false);
        }
        let removed = self.graph.remove_node(id)?;
        if removed {
            self.emit(NetworkEvent::NodeRemoved {
                network: self.name,
                node: id,
            });
            self.rescan();
        }
        Ok(removed)
    }

    /// Mark a node as a routable destination.
    pub fn register_destination(&mut self, id: NodeId) -> Result<bool> {
        if !self.graph.mark_destination(id, true)? {
            self.redundant(RedundantOperation::RegisterDestination, id);
            return Ok(false);
        }
        self.emit(NetworkEvent::DestinationRegistered {
            network: self.name,
            node: id,
        });
        self.rescan();
        Ok(true)
    }

    /// Clear the destination flag of a node.
    pub fn unregister_destination(&mut self, id: NodeId) -> Result<bool> {
        if !self.graph.mark_destination(id, false)? {
            self.redundant(RedundantOperation::UnregisterDestination, id);
            return Ok(false);
        }
        self.emit(NetworkEvent::DestinationUnregistered {
            network: self.name,
            node: id,
        });
        self.rescan();
        Ok(true)
    }

    pub fn is_destination(&self, id: NodeId) -> bool {
        self.graph
            .node(id)
            .map(Node::is_destination)
            .unwrap_or(false)
    }

    /// Registered destinations in identifier order.
    pub fn destinations(&self) -> Vec<NodeId> {
        self.graph.destinations().collect()
    }

    /// Dissolve every node except the root and reset the router.
    pub fn purge_network(&mut self) {
        let dissolved = self.graph.purge();
        self.router.shutdown();
        self.emit(NetworkEvent::NetworkPurged {
            network: self.name,
            dissolved,
        });
        self.rescan();
    }

    /// Lookup a node by identifier.
    pub fn get_node_by_id(&self, id: NodeId) -> Result<&Node> {
        self.graph.require(id)
    }

    /// Route between two distinct destinations.
    ///
    /// A destination is never routed to itself: `source == target` is `NoPath`.
    pub fn route_from_to(&mut self, source: NodeId, target: NodeId) -> RouteLookup {
        let started = Instant::now();
        let lookup = self.lookup(source, target);
        self.report(source, target, &lookup, started.elapsed());
        lookup
    }

    /// Whether a route exists between two destinations.
    pub fn get_route_from_to(&mut self, source: NodeId, target: NodeId) -> bool {
        self.route_from_to(source, target).is_found()
    }

    /// Route from `source` to every other destination.
    ///
    /// The router is cleaned once the sweep completes.
    pub fn routes_from(&mut self, source: NodeId) -> Result<Vec<(NodeId, RouteLookup)>> {
        if !self.graph.require(source)?.is_destination() {
            return Err(Error::NotDestination { id: source });
        }

        let started = Instant::now();
        let targets: Vec<NodeId> = self
            .graph
            .destinations()
            .filter(|target| *target != source)
            .collect();
        let results: Vec<(NodeId, RouteLookup)> = targets
            .into_iter()
            .map(|target| (target, self.route_from_to(source, target)))
            .collect();
        self.router.clean();

        let reachable = results.iter().filter(|(_, lookup)| lookup.is_found()).count();
        self.emit(NetworkEvent::SweepCompleted {
            network: self.name,
            source,
            reachable,
            unreachable: results.len() - reachable,
            elapsed_micros: micros(started.elapsed()),
        });
        Ok(results)
    }

    /// Whether any other destination is reachable from `source`.
    pub fn get_all_routes_from(&mut self, source: NodeId) -> bool {
        match self.routes_from(source) {
            Ok(results) => results.iter().any(|(_, lookup)| lookup.is_found()),
            Err(err) => {
                tracing::warn!(network = %self.name, %source, "{err}");
                false
            }
        }
    }

    fn lookup(&mut self, source: NodeId, target: NodeId) -> RouteLookup {
        if let Some(unknown) = [source, target]
            .into_iter()
            .find(|id| !self.is_destination(*id))
        {
            return RouteLookup::UnknownEndpoint(unknown);
        }
        if source == target {
            return RouteLookup::NoPath;
        }
        match self.router.route(&self.junctions, source, target) {
            Some(route) => RouteLookup::Found(route),
            None => RouteLookup::NoPath,
        }
    }

    fn report(&self, source: NodeId, target: NodeId, lookup: &RouteLookup, elapsed: Duration) {
        let elapsed_micros = micros(elapsed);
        let event = match lookup {
            RouteLookup::Found(route) => NetworkEvent::RouteFound {
                network: self.name,
                source,
                target,
                weight: route.weight,
                elapsed_micros,
            },
            RouteLookup::NoPath => NetworkEvent::RouteMissing {
                network: self.name,
                source,
                target,
                reason: MissReason::Unreachable,
                elapsed_micros,
            },
            RouteLookup::UnknownEndpoint(_) => NetworkEvent::RouteMissing {
                network: self.name,
                source,
                target,
                reason: MissReason::UnknownEndpoint,
                elapsed_micros,
            },
        };
        self.emit(event);
    }

    fn rescan(&mut self) {
        self.junctions = simplify(&self.graph);
        self.router.clean();
        self.emit(NetworkEvent::TopologyRebuilt {
            network: self.name,
            epoch: self.junctions.epoch(),
            nodes: self.graph.len(),
            junctions: self.junctions.len(),
            edges: self.junctions.edge_count(),
        });
    }

    fn redundant(&self, operation: RedundantOperation, node: NodeId) {
        self.emit(NetworkEvent::RedundantOperation {
            network: self.name,
            operation,
            node,
        });
    }

    fn emit(&self, event: NetworkEvent) {
        self.diagnostics.record(&event);
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("name", &self.name)
            .field("epoch", &self.graph.epoch())
            .field("nodes", &self.graph.len())
            .field("junctions", &self.junctions.len())
            .field("router", &self.router.kind())
            .finish()
    }
}

fn downgrade<E: Routable + 'static>(endpoint: &Arc<E>) -> Weak<dyn Routable> {
    let weak: Weak<E> = Arc::downgrade(endpoint);
    weak
}

/// Cloneable handle serializing every mutation and query through one lock.
#[derive(Clone)]
pub struct SharedNetwork {
    inner: Arc<Mutex<Network>>,
}

impl SharedNetwork {
    /// Create a network whose endpoints receive upgradable links.
    pub fn new(config: &NetworkConfig, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        let inner = Arc::new_cyclic(|handle: &Weak<Mutex<Network>>| {
            Mutex::new(Network::build(config, diagnostics, handle.clone()))
        });
        Self { inner }
    }

    /// Acquire exclusive access to the network.
    pub fn lock(&self) -> Result<MutexGuard<'_, Network>> {
        self.inner.lock().map_err(|_| Error::Poisoned)
    }

    pub fn link(&self) -> Result<NetworkLink> {
        Ok(self.lock()?.link())
    }

    /// Whether both handles point at the same network.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for SharedNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Ok(network) => f.debug_tuple("SharedNetwork").field(&*network).finish(),
            Err(_) => f.write_str("SharedNetwork(<locked>)"),
        }
    }
}
