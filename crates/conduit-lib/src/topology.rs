//! Declarative topology files.
//!
//! A topology names its nodes, lists the links between them and marks the
//! destinations. Building one produces a live [`SharedNetwork`] together with
//! the endpoints backing it and the mapping between names and node ids.
//!
//! ```json
//! {
//!   "router": "multi-cached",
//!   "root": "core",
//!   "nodes": ["a", "b"],
//!   "links": [
//!     { "from": "core", "to": "a", "facing": "east" },
//!     { "from": "a", "to": "b", "facing": "up" }
//!   ],
//!   "destinations": ["core", "b"]
//! }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::NetworkConfig;
use crate::diagnostics::DiagnosticsSink;
use crate::endpoint::StaticEndpoint;
use crate::error::{Error, Result};
use crate::graph::{Facing, NodeId};
use crate::network::SharedNetwork;
use crate::routing::RouterKind;

/// Directed link declaration; `to` is reached from `from` through `facing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub from: String,
    pub to: String,
    pub facing: Facing,
}

/// Parsed topology file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router: Option<RouterKind>,
    /// Name of the root node; declared here instead of in `nodes`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
    #[serde(default)]
    pub destinations: Vec<String>,
}

impl Topology {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Check names without building anything.
    pub fn validate(&self) -> Result<()> {
        if self.root.is_none() && self.nodes.is_empty() {
            return Err(Error::InvalidTopology {
                message: "topology declares no nodes".to_string(),
            });
        }

        let mut declared = HashSet::new();
        for name in self.root.iter().chain(&self.nodes) {
            if name.trim().is_empty() {
                return Err(Error::InvalidTopology {
                    message: "node names must not be blank".to_string(),
                });
            }
            if !declared.insert(name.as_str()) {
                return Err(Error::DuplicateTopologyNode { name: name.clone() });
            }
        }

        let referenced = self
            .links
            .iter()
            .flat_map(|link| [&link.from, &link.to])
            .chain(&self.destinations);
        for name in referenced {
            if !declared.contains(name.as_str()) {
                return Err(Error::UnknownTopologyNode { name: name.clone() });
            }
        }
        Ok(())
    }

    /// Build with the default configuration and the router the file names.
    pub fn build(&self, diagnostics: Arc<dyn DiagnosticsSink>) -> Result<BuiltNetwork> {
        self.build_with(NetworkConfig::default(), diagnostics)
    }

    /// Build with `config`; a router named in the file takes precedence.
    pub fn build_with(
        &self,
        config: NetworkConfig,
        diagnostics: Arc<dyn DiagnosticsSink>,
    ) -> Result<BuiltNetwork> {
        self.validate()?;

        let config = match self.router {
            Some(router) => config.with_router(router),
            None => config,
        };
        let network = SharedNetwork::new(&config, diagnostics);
        let mut built = BuiltNetwork {
            network: network.clone(),
            ids: BTreeMap::new(),
            names: BTreeMap::new(),
            endpoints: Vec::with_capacity(self.nodes.len() + 1),
        };

        let mut guard = network.lock()?;
        if let Some(root) = &self.root {
            let endpoint = Arc::new(StaticEndpoint::new(root.clone()));
            let id = guard.set_root(&endpoint);
            built.insert(root, id, endpoint);
        }
        for name in &self.nodes {
            let endpoint = Arc::new(StaticEndpoint::new(name.clone()));
            let id = guard.subscribe_node(&endpoint);
            built.insert(name, id, endpoint);
        }
        for link in &self.links {
            guard.connect(built.id(&link.from)?, built.id(&link.to)?, link.facing)?;
        }
        for name in &self.destinations {
            guard.register_destination(built.id(name)?)?;
        }
        debug!(
            network = %guard.name(),
            nodes = built.ids.len(),
            links = self.links.len(),
            destinations = self.destinations.len(),
            "built topology"
        );
        drop(guard);

        Ok(built)
    }
}

/// Network built from a [`Topology`].
///
/// The network only holds its endpoints weakly; they live as long as this
/// value does.
#[derive(Debug)]
pub struct BuiltNetwork {
    network: SharedNetwork,
    ids: BTreeMap<String, NodeId>,
    names: BTreeMap<NodeId, String>,
    endpoints: Vec<Arc<StaticEndpoint>>,
}

impl BuiltNetwork {
    fn insert(&mut self, name: &str, id: NodeId, endpoint: Arc<StaticEndpoint>) {
        self.ids.insert(name.to_string(), id);
        self.names.insert(id, name.to_string());
        self.endpoints.push(endpoint);
    }

    pub fn network(&self) -> &SharedNetwork {
        &self.network
    }

    /// Node id for a declared name.
    pub fn id(&self, name: &str) -> Result<NodeId> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownTopologyNode {
                name: name.to_string(),
            })
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Declared names in name order.
    pub fn names(&self) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.ids.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn endpoints(&self) -> &[Arc<StaticEndpoint>] {
        &self.endpoints
    }
}
