//! Shared helpers for conduit-lib integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use conduit_lib::{
    BuiltNetwork, Network, NetworkConfig, NodeId, NullSink, Route, RouterKind, StaticEndpoint,
    Topology,
};

/// Path to the fixtures directory shared with the CLI tests.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

/// Build one of the JSON fixtures with a router override.
#[allow(dead_code)]
pub fn build_fixture(name: &str, router: RouterKind) -> BuiltNetwork {
    let mut topology = Topology::from_path(&fixtures_dir().join(name)).expect("fixture parses");
    topology.router = Some(router);
    topology.build(Arc::new(NullSink)).expect("fixture builds")
}

/// Standalone network plus the endpoints keeping its nodes alive.
#[allow(dead_code)]
pub struct Harness {
    pub network: Network,
    pub endpoints: Vec<Arc<StaticEndpoint>>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(router: RouterKind) -> Self {
        let config = NetworkConfig::default().with_router(router);
        Self {
            network: Network::new(&config, Arc::new(NullSink)),
            endpoints: Vec::new(),
        }
    }

    pub fn add(&mut self, label: &str) -> NodeId {
        let endpoint = Arc::new(StaticEndpoint::new(label));
        let id = self.network.subscribe_node(&endpoint);
        self.endpoints.push(endpoint);
        id
    }

    pub fn root(&mut self, label: &str) -> NodeId {
        let endpoint = Arc::new(StaticEndpoint::new(label));
        let id = self.network.set_root(&endpoint);
        self.endpoints.push(endpoint);
        id
    }
}

/// Follow the facings recorded in `route` from its source through the
/// network's physical links and return where the walk ends.
#[allow(dead_code)]
pub fn replay(network: &Network, route: &Route) -> NodeId {
    let mut current = route.source;
    for step in &route.steps {
        let node = network.get_node_by_id(current).expect("node on route exists");
        current = node
            .neighbour(step.facing)
            .expect("facing on route is linked");
        assert_eq!(current, step.node, "facing leads to the recorded node");
    }
    current
}

/// Every strategy, for tests that must hold regardless of caching.
#[allow(dead_code)]
pub const ALL_ROUTERS: [RouterKind; 3] = [
    RouterKind::Dijkstra,
    RouterKind::Cached,
    RouterKind::MultiCached,
];
