//! Route strategies for junction graphs.
//!
//! This module provides:
//! - [`RouterKind`] - the supported strategies (uncached, single-entry cache, table cache)
//! - [`RouteStrategy`] - the query contract every strategy implements
//! - [`Router`] - the closed set of strategies, selected once per network
//! - [`CacheStats`] - hit/miss counters reported by every strategy
//!
//! All strategies answer `route(graph, source, target)` identically; they only
//! differ in how much previously computed work they keep. Cached results are
//! scoped to the [`TopologyEpoch`](crate::graph::TopologyEpoch) of the graph
//! they were computed on and are never returned for another epoch.

mod cache;

pub use cache::{PathCache, PathCacheTable};

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::graph::NodeId;
use crate::path::{PathFinder, Route};
use crate::simplify::JunctionGraph;

/// Supported routing strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum RouterKind {
    /// Plain Dijkstra, nothing is remembered.
    Dijkstra,
    /// Dijkstra behind a single-entry cache.
    Cached,
    /// Dijkstra behind a table of every pair queried under the current epoch.
    #[default]
    MultiCached,
}

impl RouterKind {
    fn as_str(self) -> &'static str {
        match self {
            RouterKind::Dijkstra => "dijkstra",
            RouterKind::Cached => "cached",
            RouterKind::MultiCached => "multi-cached",
        }
    }
}

impl fmt::Display for RouterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dijkstra" => Ok(RouterKind::Dijkstra),
            "cached" => Ok(RouterKind::Cached),
            "multi-cached" | "multi_cached" | "multicached" => Ok(RouterKind::MultiCached),
            _ => Err(Error::UnknownRouter {
                name: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for RouterKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Cache counters. Uncached strategies count every query as a miss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Query contract shared by every routing strategy.
pub trait RouteStrategy: Send {
    /// The strategy identifier.
    fn kind(&self) -> RouterKind;

    /// Route from `source` to `target` on `graph`.
    ///
    /// Returns `None` when no path exists; this is an expected outcome.
    fn route(&mut self, graph: &JunctionGraph, source: NodeId, target: NodeId)
        -> Option<Arc<Route>>;

    /// Drop every cached route.
    fn clean(&mut self);

    /// Drop every cached route and release search buffers.
    fn shutdown(&mut self);

    fn stats(&self) -> CacheStats;
}

/// Strategy that recomputes every query.
#[derive(Debug, Default)]
pub struct DijkstraRouter {
    finder: PathFinder,
    stats: CacheStats,
}

impl DijkstraRouter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RouteStrategy for DijkstraRouter {
    fn kind(&self) -> RouterKind {
        RouterKind::Dijkstra
    }

    fn route(
        &mut self,
        graph: &JunctionGraph,
        source: NodeId,
        target: NodeId,
    ) -> Option<Arc<Route>> {
        self.stats.misses += 1;
        self.finder.find(graph, source, target).map(Arc::new)
    }

    fn clean(&mut self) {}

    fn shutdown(&mut self) {
        self.finder.release();
    }

    fn stats(&self) -> CacheStats {
        self.stats
    }
}

/// The routing strategy owned by a network.
#[derive(Debug)]
pub enum Router {
    Dijkstra(DijkstraRouter),
    Cached(PathCache),
    MultiCached(PathCacheTable),
}

impl Router {
    /// Build the strategy for `kind`.
    pub fn new(kind: RouterKind) -> Self {
        match kind {
            RouterKind::Dijkstra => Router::Dijkstra(DijkstraRouter::new()),
            RouterKind::Cached => Router::Cached(PathCache::new()),
            RouterKind::MultiCached => Router::MultiCached(PathCacheTable::new()),
        }
    }

    fn strategy(&self) -> &dyn RouteStrategy {
        match self {
            Router::Dijkstra(router) => router,
            Router::Cached(router) => router,
            Router::MultiCached(router) => router,
        }
    }

    fn strategy_mut(&mut self) -> &mut dyn RouteStrategy {
        match self {
            Router::Dijkstra(router) => router,
            Router::Cached(router) => router,
            Router::MultiCached(router) => router,
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Router::new(RouterKind::default())
    }
}

impl RouteStrategy for Router {
    fn kind(&self) -> RouterKind {
        self.strategy().kind()
    }

    fn route(
        &mut self,
        graph: &JunctionGraph,
        source: NodeId,
        target: NodeId,
    ) -> Option<Arc<Route>> {
        self.strategy_mut().route(graph, source, target)
    }

    fn clean(&mut self) {
        self.strategy_mut().clean();
    }

    fn shutdown(&mut self) {
        self.strategy_mut().shutdown();
    }

    fn stats(&self) -> CacheStats {
        self.strategy().stats()
    }
}
