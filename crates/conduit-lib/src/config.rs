//! Network construction settings.
//!
//! # Environment Variables
//!
//! - `CONDUIT_ROUTER`: routing strategy, one of `dijkstra`, `cached` or
//!   `multi-cached` (default)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::routing::RouterKind;

/// Environment variable selecting the routing strategy.
pub const ROUTER_ENV: &str = "CONDUIT_ROUTER";

/// Settings applied when a network is constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Routing strategy, fixed for the lifetime of the network.
    #[serde(default)]
    pub router: RouterKind,
    /// Network name; a random one is generated when absent.
    #[serde(default)]
    pub name: Option<Uuid>,
}

impl NetworkConfig {
    /// Create configuration from environment variables.
    ///
    /// An unparsable `CONDUIT_ROUTER` is reported and the default strategy is
    /// used instead.
    pub fn from_env() -> Self {
        let router = match std::env::var(ROUTER_ENV) {
            Ok(value) => value.parse::<RouterKind>().unwrap_or_else(|err| {
                tracing::warn!(%value, "{err}; using default router");
                RouterKind::default()
            }),
            Err(_) => RouterKind::default(),
        };
        Self { router, name: None }
    }

    pub fn with_router(mut self, router: RouterKind) -> Self {
        self.router = router;
        self
    }

    pub fn with_name(mut self, name: Uuid) -> Self {
        self.name = Some(name);
        self
    }
}
