use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::endpoint::Routable;
use crate::error::{Error, Result};

/// Identifier of a physical node within one network.
///
/// Identifiers are allocated monotonically starting at 1; [`NodeId::NIL`] is
/// never handed out and marks "no node" where a sentinel is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Sentinel returned when no node could be created.
    pub const NIL: NodeId = NodeId(0);

    /// Wrap a raw identifier value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    pub const fn get(self) -> u64 {
        self.0
    }

    pub fn is_nil(self) -> bool {
        self == Self::NIL
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Physical direction a link leaves a node through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Facing {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Facing {
    /// Every facing, in link iteration order.
    pub const ALL: [Facing; 6] = [
        Facing::Down,
        Facing::Up,
        Facing::North,
        Facing::South,
        Facing::West,
        Facing::East,
    ];

    /// The facing a neighbour uses to link back.
    pub fn opposite(self) -> Self {
        match self {
            Facing::Down => Facing::Up,
            Facing::Up => Facing::Down,
            Facing::North => Facing::South,
            Facing::South => Facing::North,
            Facing::West => Facing::East,
            Facing::East => Facing::West,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Facing::Down => "down",
            Facing::Up => "up",
            Facing::North => "north",
            Facing::South => "south",
            Facing::West => "west",
            Facing::East => "east",
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Facing {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Facing::ALL
            .into_iter()
            .find(|facing| facing.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownFacing {
                name: s.to_string(),
            })
    }
}

impl TryFrom<String> for Facing {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Topology snapshot identifier.
///
/// Advances on every completed mutation of a [`NodeGraph`]; anything derived
/// from the graph records the epoch it was computed under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TopologyEpoch(u64);

impl TopologyEpoch {
    pub const INITIAL: TopologyEpoch = TopologyEpoch(0);

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TopologyEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One hop along a physical path: the node entered and the facing travelled
/// from the previous node to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Step {
    pub node: NodeId,
    pub facing: Facing,
}

/// Physical vertex of the transport network.
pub struct Node {
    id: NodeId,
    endpoint: Weak<dyn Routable>,
    links: BTreeMap<Facing, NodeId>,
    destination: bool,
}

impl Node {
    fn new(id: NodeId, endpoint: Weak<dyn Routable>) -> Self {
        Self {
            id,
            endpoint,
            links: BTreeMap::new(),
            destination: false,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Host endpoint backing this node, if it is still alive.
    pub fn endpoint(&self) -> Option<Arc<dyn Routable>> {
        self.endpoint.upgrade()
    }

    /// Neighbour links in facing order.
    pub fn neighbours(&self) -> impl Iterator<Item = (Facing, NodeId)> + '_ {
        self.links.iter().map(|(facing, id)| (*facing, *id))
    }

    /// Neighbour reached by leaving through `facing`.
    pub fn neighbour(&self, facing: Facing) -> Option<NodeId> {
        self.links.get(&facing).copied()
    }

    pub fn degree(&self) -> usize {
        self.links.len()
    }

    pub fn is_destination(&self) -> bool {
        self.destination
    }

    /// Drop every link and tell the host endpoint it left the network.
    fn dissolve(&mut self) {
        self.links.clear();
        self.destination = false;
        if let Some(endpoint) = self.endpoint.upgrade() {
            endpoint.unsubscribe();
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("links", &self.links)
            .field("destination", &self.destination)
            .field("endpoint_alive", &(self.endpoint.strong_count() > 0))
            .finish()
    }
}

/// Raw adjacency storage for every physical node of a network.
#[derive(Debug)]
pub struct NodeGraph {
    nodes: BTreeMap<NodeId, Node>,
    root: Option<NodeId>,
    next_id: u64,
    epoch: TopologyEpoch,
}

impl Default for NodeGraph {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            root: None,
            next_id: 1,
            epoch: TopologyEpoch::INITIAL,
        }
    }
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> TopologyEpoch {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Lookup a node, failing with [`Error::UnknownNode`] when absent.
    pub fn require(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(Error::UnknownNode { id })
    }

    /// All nodes in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    /// Identifiers of every node flagged as a destination.
    pub fn destinations(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .values()
            .filter(|node| node.destination)
            .map(|node| node.id)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Store a new node for `endpoint` and return its identifier.
    pub fn add_node(&mut self, endpoint: Weak<dyn Routable>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Node::new(id, endpoint));
        self.touch();
        debug!(node = %id, "node added");
        id
    }

    /// Add the root node, or return [`NodeId::NIL`] if one already exists.
    pub fn set_root(&mut self, endpoint: Weak<dyn Routable>) -> NodeId {
        if self.root.is_some() {
            return NodeId::NIL;
        }
        let id = self.add_node(endpoint);
        self.root = Some(id);
        id
    }

    /// Detach and dissolve a node.
    ///
    /// Returns `Ok(false)` without touching the graph when `id` is the root.
    pub fn remove_node(&mut self, id: NodeId) -> Result<bool> {
        if self.root == Some(id) {
            warn!(node = %id, "refusing to remove the root node");
            return Ok(false);
        }
        let mut node = self.nodes.remove(&id).ok_or(Error::UnknownNode { id })?;
        for (facing, neighbour) in node.neighbours().collect::<Vec<_>>() {
            if let Some(other) = self.nodes.get_mut(&neighbour) {
                if other.links.get(&facing.opposite()) == Some(&id) {
                    other.links.remove(&facing.opposite());
                }
            }
        }
        node.dissolve();
        self.touch();
        debug!(node = %id, "node removed");
        Ok(true)
    }

    /// Link `a` to `b` through `facing` (and `b` back to `a` through the opposite facing).
    ///
    /// Returns `Ok(false)` when the exact link already exists. A pair of nodes
    /// shares at most one link, so linking them through a second facing fails.
    pub fn connect(&mut self, a: NodeId, b: NodeId, facing: Facing) -> Result<bool> {
        if a == b {
            return Err(Error::SelfLink { id: a });
        }
        let reverse = facing.opposite();
        let forward_slot = self.require(a)?.neighbour(facing);
        let reverse_slot = self.require(b)?.neighbour(reverse);

        if forward_slot == Some(b) && reverse_slot == Some(a) {
            return Ok(false);
        }
        if let Some((existing, _)) = self.require(a)?.neighbours().find(|(_, n)| *n == b) {
            return Err(Error::AlreadyLinked {
                id: a,
                other: b,
                facing: existing,
            });
        }
        if let Some(existing) = forward_slot.filter(|existing| *existing != b) {
            return Err(Error::FacingOccupied {
                id: a,
                facing,
                existing,
            });
        }
        if let Some(existing) = reverse_slot.filter(|existing| *existing != a) {
            return Err(Error::FacingOccupied {
                id: b,
                facing: reverse,
                existing,
            });
        }

        if let Some(node) = self.nodes.get_mut(&a) {
            node.links.insert(facing, b);
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            node.links.insert(reverse, a);
        }
        self.touch();
        debug!(from = %a, to = %b, %facing, "nodes linked");
        Ok(true)
    }

    /// Remove every link between `a` and `b`.
    ///
    /// Returns `Ok(false)` when the nodes were not linked.
    pub fn disconnect(&mut self, a: NodeId, b: NodeId) -> Result<bool> {
        self.require(a)?;
        self.require(b)?;

        let mut removed = false;
        for (from, to) in [(a, b), (b, a)] {
            if let Some(node) = self.nodes.get_mut(&from) {
                let before = node.links.len();
                node.links.retain(|_, neighbour| *neighbour != to);
                removed |= node.links.len() != before;
            }
        }
        if removed {
            self.touch();
            debug!(from = %a, to = %b, "nodes unlinked");
        }
        Ok(removed)
    }

    /// Set the destination flag of a node.
    ///
    /// Returns `Ok(false)` when the flag already had the requested value.
    pub fn mark_destination(&mut self, id: NodeId, destination: bool) -> Result<bool> {
        let node = self.nodes.get_mut(&id).ok_or(Error::UnknownNode { id })?;
        if node.destination == destination {
            return Ok(false);
        }
        node.destination = destination;
        self.touch();
        Ok(true)
    }

    /// Dissolve every node except the root and reset the root to an unlinked,
    /// non-destination node. Returns the number of nodes dissolved.
    pub fn purge(&mut self) -> usize {
        let root = self.root.and_then(|id| self.nodes.remove(&id));
        let mut dissolved = 0;
        for (_, mut node) in std::mem::take(&mut self.nodes) {
            node.dissolve();
            dissolved += 1;
        }
        if let Some(mut root) = root {
            root.links.clear();
            root.destination = false;
            self.nodes.insert(root.id, root);
        }
        self.touch();
        dissolved
    }

    fn touch(&mut self) {
        self.epoch = self.epoch.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::StaticEndpoint;

    fn detached() -> Weak<dyn Routable> {
        Weak::<StaticEndpoint>::new()
    }

    #[test]
    fn facing_round_trips_through_opposite() {
        for facing in Facing::ALL {
            assert_eq!(facing.opposite().opposite(), facing);
            assert_ne!(facing.opposite(), facing);
        }
    }

    #[test]
    fn facing_parses_case_insensitively() {
        assert_eq!("EAST".parse::<Facing>().unwrap(), Facing::East);
        assert!("sideways".parse::<Facing>().is_err());
    }

    #[test]
    fn identifiers_start_after_nil() {
        let mut graph = NodeGraph::new();
        let first = graph.add_node(detached());
        assert_eq!(first.get(), 1);
        assert!(!first.is_nil());
        assert!(NodeId::NIL.is_nil());
    }

    #[test]
    fn connect_links_both_directions() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(detached());
        let b = graph.add_node(detached());

        assert!(graph.connect(a, b, Facing::East).unwrap());
        assert_eq!(graph.node(a).unwrap().neighbour(Facing::East), Some(b));
        assert_eq!(graph.node(b).unwrap().neighbour(Facing::West), Some(a));
        assert!(!graph.connect(a, b, Facing::East).unwrap(), "relink is a no-op");
    }

    #[test]
    fn connect_rejects_occupied_facing() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(detached());
        let b = graph.add_node(detached());
        let c = graph.add_node(detached());
        graph.connect(a, b, Facing::East).unwrap();

        let err = graph.connect(a, c, Facing::East).unwrap_err();
        assert!(matches!(err, Error::FacingOccupied { id, existing, .. } if id == a && existing == b));
        assert!(matches!(
            graph.connect(a, a, Facing::Up),
            Err(Error::SelfLink { .. })
        ));
    }

    #[test]
    fn pair_shares_a_single_link() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(detached());
        let b = graph.add_node(detached());
        let c = graph.add_node(detached());
        graph.connect(a, b, Facing::East).unwrap();
        let before = graph.epoch();

        let err = graph.connect(a, b, Facing::Up).unwrap_err();
        assert!(matches!(
            err,
            Error::AlreadyLinked { id, other, facing: Facing::East } if id == a && other == b
        ));
        assert!(graph.connect(b, a, Facing::Down).is_err());
        assert_eq!(graph.epoch(), before);
        assert_eq!(graph.node(b).unwrap().neighbour(Facing::Down), None);

        graph.connect(a, c, Facing::North).unwrap();
        let node = graph.node(a).unwrap();
        assert_eq!(node.degree(), 2);
        assert!(!crate::simplify::is_junction(node));
    }

    #[test]
    fn every_mutation_advances_epoch() {
        let mut graph = NodeGraph::new();
        let start = graph.epoch();
        let a = graph.add_node(detached());
        let b = graph.add_node(detached());
        let after_adds = graph.epoch();
        assert!(after_adds > start);

        graph.connect(a, b, Facing::North).unwrap();
        let after_link = graph.epoch();
        assert!(after_link > after_adds);

        assert!(!graph.mark_destination(a, false).unwrap());
        assert_eq!(graph.epoch(), after_link, "no-op leaves epoch untouched");

        graph.mark_destination(a, true).unwrap();
        assert!(graph.epoch() > after_link);
    }

    #[test]
    fn remove_node_detaches_neighbours() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(detached());
        let b = graph.add_node(detached());
        graph.connect(a, b, Facing::South).unwrap();

        assert!(graph.remove_node(b).unwrap());
        assert_eq!(graph.node(a).unwrap().degree(), 0);
        assert!(matches!(
            graph.remove_node(b),
            Err(Error::UnknownNode { .. })
        ));
    }

    #[test]
    fn root_cannot_be_removed_or_replaced() {
        let mut graph = NodeGraph::new();
        let root = graph.set_root(detached());
        assert!(graph.set_root(detached()).is_nil());
        assert!(!graph.remove_node(root).unwrap());
        assert!(graph.contains(root));
    }

    #[test]
    fn purge_keeps_only_a_clean_root() {
        let mut graph = NodeGraph::new();
        let root = graph.set_root(detached());
        let a = graph.add_node(detached());
        graph.connect(root, a, Facing::Up).unwrap();
        graph.mark_destination(root, true).unwrap();

        assert_eq!(graph.purge(), 1);
        assert_eq!(graph.len(), 1);
        let kept = graph.node(root).unwrap();
        assert_eq!(kept.degree(), 0);
        assert!(!kept.is_destination());
        assert_eq!(graph.destinations().count(), 0);
    }

    #[test]
    fn disconnect_reports_missing_link() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(detached());
        let b = graph.add_node(detached());
        assert!(!graph.disconnect(a, b).unwrap());
        graph.connect(a, b, Facing::Down).unwrap();
        assert!(graph.disconnect(a, b).unwrap());
        assert_eq!(graph.node(b).unwrap().degree(), 0);
    }
}
