//! Junction graph construction.
//!
//! The physical graph is mostly long runs of plain conduit. Only branch points
//! (three or more links) and destinations matter for routing, so the
//! simplifier collapses every run of degree-2 nodes between two such
//! junctions into a single weighted edge that remembers the physical steps it
//! replaces.

use std::collections::BTreeMap;

use tracing::debug;

use crate::graph::{Facing, Node, NodeGraph, NodeId, Step, TopologyEpoch};

/// Weighted edge between two junctions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JunctionEdge {
    pub target: NodeId,
    /// Number of physical hops along the chain.
    pub weight: u32,
    /// Steps from the owning junction to `target`, ending with `target`.
    pub steps: Vec<Step>,
}

/// Node of topological significance in the simplified graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Junction {
    pub id: NodeId,
    pub destination: bool,
    pub edges: Vec<JunctionEdge>,
}

/// Simplified graph of junctions, tagged with the epoch it was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JunctionGraph {
    epoch: TopologyEpoch,
    junctions: BTreeMap<NodeId, Junction>,
}

impl JunctionGraph {
    pub fn epoch(&self) -> TopologyEpoch {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.junctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.junctions.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.junctions.contains_key(&id)
    }

    pub fn junction(&self, id: NodeId) -> Option<&Junction> {
        self.junctions.get(&id)
    }

    /// Junctions in identifier order.
    pub fn junctions(&self) -> impl Iterator<Item = &Junction> + '_ {
        self.junctions.values()
    }

    /// Outgoing edges of a junction; empty for unknown identifiers.
    pub fn edges(&self, id: NodeId) -> &[JunctionEdge] {
        self.junctions
            .get(&id)
            .map(|junction| junction.edges.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.junctions.values().map(|j| j.edges.len()).sum()
    }
}

/// Whether a node is kept in the junction graph.
pub fn is_junction(node: &Node) -> bool {
    node.is_destination() || node.degree() >= 3
}

/// Rebuild the junction graph from scratch.
pub fn simplify(graph: &NodeGraph) -> JunctionGraph {
    let mut junctions = BTreeMap::new();

    for node in graph.nodes().filter(|node| is_junction(node)) {
        let edges = node
            .neighbours()
            .filter_map(|(facing, first)| walk_chain(graph, node.id(), facing, first))
            .collect();
        junctions.insert(
            node.id(),
            Junction {
                id: node.id(),
                destination: node.is_destination(),
                edges,
            },
        );
    }

    let simplified = JunctionGraph {
        epoch: graph.epoch(),
        junctions,
    };
    debug!(
        epoch = %simplified.epoch,
        nodes = graph.len(),
        junctions = simplified.len(),
        edges = simplified.edge_count(),
        "junction graph rebuilt"
    );
    simplified
}

/// Follow a chain of plain nodes leaving `origin` through `facing`.
///
/// Returns `None` for dead ends and for chains that loop back to `origin`.
fn walk_chain(
    graph: &NodeGraph,
    origin: NodeId,
    facing: Facing,
    first: NodeId,
) -> Option<JunctionEdge> {
    let mut steps = vec![Step {
        node: first,
        facing,
    }];
    let mut current = first;
    let mut entered = facing;

    loop {
        let node = graph.node(current)?;
        if is_junction(node) {
            break;
        }
        let back = entered.opposite();
        let (next_facing, next) = node.neighbours().find(|(f, _)| *f != back)?;
        steps.push(Step {
            node: next,
            facing: next_facing,
        });
        current = next;
        entered = next_facing;
    }

    if current == origin {
        return None;
    }

    Some(JunctionEdge {
        target: current,
        weight: u32::try_from(steps.len()).unwrap_or(u32::MAX),
        steps,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Weak;

    use super::*;
    use crate::endpoint::{Routable, StaticEndpoint};

    fn detached() -> Weak<dyn Routable> {
        Weak::<StaticEndpoint>::new()
    }

    fn chain(graph: &mut NodeGraph, len: usize) -> Vec<NodeId> {
        let ids: Vec<_> = (0..len).map(|_| graph.add_node(detached())).collect();
        for pair in ids.windows(2) {
            graph.connect(pair[0], pair[1], Facing::East).unwrap();
        }
        ids
    }

    #[test]
    fn linear_chain_collapses_to_one_edge_per_direction() {
        let mut graph = NodeGraph::new();
        let ids = chain(&mut graph, 4);
        graph.mark_destination(ids[0], true).unwrap();
        graph.mark_destination(ids[3], true).unwrap();

        let simplified = simplify(&graph);
        assert_eq!(simplified.len(), 2);

        let forward = simplified.edges(ids[0]);
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].target, ids[3]);
        assert_eq!(forward[0].weight, 3);
        let nodes: Vec<_> = forward[0].steps.iter().map(|s| s.node).collect();
        assert_eq!(nodes, vec![ids[1], ids[2], ids[3]]);
        assert!(forward[0].steps.iter().all(|s| s.facing == Facing::East));

        let backward = simplified.edges(ids[3]);
        assert_eq!(backward[0].target, ids[0]);
        assert!(backward[0].steps.iter().all(|s| s.facing == Facing::West));
    }

    #[test]
    fn dead_ends_contribute_no_edge() {
        let mut graph = NodeGraph::new();
        let ids = chain(&mut graph, 3);
        graph.mark_destination(ids[0], true).unwrap();

        let simplified = simplify(&graph);
        assert_eq!(simplified.len(), 1);
        assert!(simplified.edges(ids[0]).is_empty());
    }

    #[test]
    fn isolated_destination_is_a_bare_junction() {
        let mut graph = NodeGraph::new();
        let lone = graph.add_node(detached());
        graph.mark_destination(lone, true).unwrap();

        let simplified = simplify(&graph);
        let junction = simplified.junction(lone).expect("destination kept");
        assert!(junction.destination);
        assert!(junction.edges.is_empty());
    }

    #[test]
    fn branch_points_become_junctions() {
        let mut graph = NodeGraph::new();
        let hub = graph.add_node(detached());
        let arms: Vec<_> = [Facing::North, Facing::South, Facing::East]
            .into_iter()
            .map(|facing| {
                let arm = graph.add_node(detached());
                graph.connect(hub, arm, facing).unwrap();
                graph.mark_destination(arm, true).unwrap();
                arm
            })
            .collect();

        let simplified = simplify(&graph);
        assert!(simplified.junction(hub).is_some_and(|j| !j.destination));
        assert_eq!(simplified.edges(hub).len(), 3);
        for arm in arms {
            assert_eq!(simplified.edges(arm)[0].target, hub);
            assert_eq!(simplified.edges(arm)[0].weight, 1);
        }
    }

    #[test]
    fn loop_back_to_origin_is_dropped() {
        let mut graph = NodeGraph::new();
        let hub = graph.add_node(detached());
        let tail = graph.add_node(detached());
        graph.connect(hub, tail, Facing::Down).unwrap();
        graph.mark_destination(tail, true).unwrap();

        // hub -> a -> b -> c -> hub
        let a = graph.add_node(detached());
        let b = graph.add_node(detached());
        let c = graph.add_node(detached());
        graph.connect(hub, a, Facing::North).unwrap();
        graph.connect(a, b, Facing::East).unwrap();
        graph.connect(b, c, Facing::South).unwrap();
        graph.connect(c, hub, Facing::West).unwrap();

        let simplified = simplify(&graph);
        let targets: Vec<_> = simplified.edges(hub).iter().map(|e| e.target).collect();
        assert_eq!(targets, vec![tail]);
    }

    #[test]
    fn junction_free_cycle_is_invisible() {
        let mut graph = NodeGraph::new();
        let ring: Vec<_> = (0..4).map(|_| graph.add_node(detached())).collect();
        graph.connect(ring[0], ring[1], Facing::East).unwrap();
        graph.connect(ring[1], ring[2], Facing::South).unwrap();
        graph.connect(ring[2], ring[3], Facing::West).unwrap();
        graph.connect(ring[3], ring[0], Facing::North).unwrap();

        assert!(simplify(&graph).is_empty());
    }

    #[test]
    fn parallel_chains_are_both_kept() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(detached());
        let b = graph.add_node(detached());
        graph.mark_destination(a, true).unwrap();
        graph.mark_destination(b, true).unwrap();
        graph.connect(a, b, Facing::East).unwrap();

        let detour = graph.add_node(detached());
        graph.connect(a, detour, Facing::Up).unwrap();
        graph.connect(detour, b, Facing::North).unwrap();

        let simplified = simplify(&graph);
        let mut weights: Vec<_> = simplified.edges(a).iter().map(|e| e.weight).collect();
        weights.sort_unstable();
        assert_eq!(weights, vec![1, 2]);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let mut graph = NodeGraph::new();
        let ids = chain(&mut graph, 6);
        graph.mark_destination(ids[0], true).unwrap();
        graph.mark_destination(ids[5], true).unwrap();
        let branch = graph.add_node(detached());
        graph.connect(ids[2], branch, Facing::Up).unwrap();

        assert_eq!(simplify(&graph), simplify(&graph));
    }

    #[test]
    fn records_source_epoch() {
        let mut graph = NodeGraph::new();
        let a = graph.add_node(detached());
        graph.mark_destination(a, true).unwrap();
        assert_eq!(simplify(&graph).epoch(), graph.epoch());
    }
}
