//! Memoizing route strategies.
//!
//! Both caches invalidate by epoch: an entry computed under one topology
//! snapshot is never served for another. The table cache drops everything at
//! once when the epoch moves on instead of tracking which entries an edit
//! touched.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use super::{CacheStats, RouteStrategy, RouterKind};
use crate::graph::{NodeId, TopologyEpoch};
use crate::path::{PathFinder, Route};
use crate::simplify::JunctionGraph;

#[derive(Debug, Clone)]
struct CachedRoute {
    source: NodeId,
    target: NodeId,
    epoch: TopologyEpoch,
    route: Option<Arc<Route>>,
}

/// Remembers the most recent query only.
#[derive(Debug, Default)]
pub struct PathCache {
    finder: PathFinder,
    slot: Option<CachedRoute>,
    stats: CacheStats,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RouteStrategy for PathCache {
    fn kind(&self) -> RouterKind {
        RouterKind::Cached
    }

    fn route(
        &mut self,
        graph: &JunctionGraph,
        source: NodeId,
        target: NodeId,
    ) -> Option<Arc<Route>> {
        if let Some(slot) = &self.slot {
            if slot.source == source && slot.target == target && slot.epoch == graph.epoch() {
                self.stats.hits += 1;
                trace!(%source, %target, "single-entry cache hit");
                return slot.route.clone();
            }
        }

        self.stats.misses += 1;
        let route = self.finder.find(graph, source, target).map(Arc::new);
        self.slot = Some(CachedRoute {
            source,
            target,
            epoch: graph.epoch(),
            route: route.clone(),
        });
        route
    }

    fn clean(&mut self) {
        self.slot = None;
    }

    fn shutdown(&mut self) {
        self.clean();
        self.finder.release();
    }

    fn stats(&self) -> CacheStats {
        self.stats
    }
}

/// Remembers every pair queried under the current epoch.
#[derive(Debug, Default)]
pub struct PathCacheTable {
    finder: PathFinder,
    epoch: Option<TopologyEpoch>,
    entries: HashMap<(NodeId, NodeId), Option<Arc<Route>>>,
    stats: CacheStats,
}

impl PathCacheTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached pairs, including cached misses.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RouteStrategy for PathCacheTable {
    fn kind(&self) -> RouterKind {
        RouterKind::MultiCached
    }

    fn route(
        &mut self,
        graph: &JunctionGraph,
        source: NodeId,
        target: NodeId,
    ) -> Option<Arc<Route>> {
        if self.epoch != Some(graph.epoch()) {
            if !self.entries.is_empty() {
                trace!(dropped = self.entries.len(), epoch = %graph.epoch(), "route table invalidated");
            }
            self.entries.clear();
            self.epoch = Some(graph.epoch());
        }

        if let Some(cached) = self.entries.get(&(source, target)) {
            self.stats.hits += 1;
            return cached.clone();
        }

        self.stats.misses += 1;
        let route = self.finder.find(graph, source, target).map(Arc::new);
        self.entries.insert((source, target), route.clone());
        route
    }

    fn clean(&mut self) {
        self.entries.clear();
        self.epoch = None;
    }

    fn shutdown(&mut self) {
        self.entries = HashMap::new();
        self.epoch = None;
        self.finder.release();
    }

    fn stats(&self) -> CacheStats {
        self.stats
    }
}
