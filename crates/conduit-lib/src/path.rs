use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use serde::Serialize;

use crate::graph::{NodeId, Step, TopologyEpoch};
use crate::simplify::JunctionGraph;

/// Shortest path between two junctions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub source: NodeId,
    pub target: NodeId,
    /// Total physical hop count.
    pub weight: u32,
    /// Steps from `source` to `target`; excludes `source`, ends with `target`.
    pub steps: Vec<Step>,
    /// Topology snapshot the route was computed under.
    pub epoch: TopologyEpoch,
}

impl Route {
    fn trivial(node: NodeId, epoch: TopologyEpoch) -> Self {
        Self {
            source: node,
            target: node,
            weight: 0,
            steps: Vec::new(),
            epoch,
        }
    }

    /// Number of hops in the route.
    pub fn hop_count(&self) -> usize {
        self.steps.len()
    }

    /// Nodes visited after leaving the source.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.steps.iter().map(|step| step.node)
    }
}

/// Dijkstra search over a [`JunctionGraph`].
///
/// Scratch buffers are kept between calls so repeated queries do not
/// reallocate; [`PathFinder::release`] gives the memory back.
#[derive(Debug, Default)]
pub struct PathFinder {
    distances: HashMap<NodeId, u32>,
    parents: HashMap<NodeId, (NodeId, usize)>,
    frontier: BinaryHeap<QueueEntry>,
}

impl PathFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the lowest-weight route from `source` to `target`.
    ///
    /// Returns `None` when either endpoint is not a junction or the target is
    /// unreachable. Equal-cost alternatives resolve to the first one
    /// discovered.
    pub fn find(&mut self, graph: &JunctionGraph, source: NodeId, target: NodeId) -> Option<Route> {
        if !graph.contains(source) || !graph.contains(target) {
            return None;
        }
        if source == target {
            return Some(Route::trivial(source, graph.epoch()));
        }

        self.reset();
        let mut sequence = 0u64;
        self.distances.insert(source, 0);
        self.frontier.push(QueueEntry::new(source, 0, sequence));

        while let Some(entry) = self.frontier.pop() {
            if matches!(self.distances.get(&entry.node), Some(best) if *best < entry.cost) {
                continue;
            }

            if entry.node == target {
                return self.reconstruct(graph, source, target, entry.cost);
            }

            for (index, edge) in graph.edges(entry.node).iter().enumerate() {
                let next_cost = entry.cost.saturating_add(edge.weight);
                if next_cost < *self.distances.get(&edge.target).unwrap_or(&u32::MAX) {
                    self.distances.insert(edge.target, next_cost);
                    self.parents.insert(edge.target, (entry.node, index));
                    sequence += 1;
                    self.frontier
                        .push(QueueEntry::new(edge.target, next_cost, sequence));
                }
            }
        }

        None
    }

    /// Drop the scratch buffers.
    pub fn release(&mut self) {
        *self = Self::default();
    }

    fn reset(&mut self) {
        self.distances.clear();
        self.parents.clear();
        self.frontier.clear();
    }

    fn reconstruct(
        &self,
        graph: &JunctionGraph,
        source: NodeId,
        target: NodeId,
        weight: u32,
    ) -> Option<Route> {
        let mut chain = Vec::new();
        let mut current = target;
        while current != source {
            let &(parent, index) = self.parents.get(&current)?;
            chain.push(graph.edges(parent).get(index)?);
            current = parent;
        }

        let steps = chain
            .into_iter()
            .rev()
            .flat_map(|edge| edge.steps.iter().copied())
            .collect();

        Some(Route {
            source,
            target,
            weight,
            steps,
            epoch: graph.epoch(),
        })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: NodeId,
    cost: u32,
    sequence: u64,
}

impl QueueEntry {
    fn new(node: NodeId, cost: u32, sequence: u64) -> Self {
        Self {
            node,
            cost,
            sequence,
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost, then by
        // discovery order.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
