//! Host endpoint contract.
//!
//! Anything that joins a network (a pipe, a machine, the network core) is
//! represented to the library by a [`Routable`]. The network keeps only a weak
//! reference to it and hands it a [`NetworkLink`], which is itself weak, so the
//! two sides never keep each other alive.

use std::sync::{Mutex, PoisonError};

use crate::network::NetworkLink;

/// Host-provided object backing a network node.
///
/// Both callbacks run while the network lock is held: implementations must
/// not lock the network they are handed.
pub trait Routable: Send + Sync {
    /// Called once the endpoint has been registered as a node.
    fn subscribe(&self, link: NetworkLink);

    /// Called when the node backing this endpoint is dissolved.
    fn unsubscribe(&self) {}
}

/// Minimal endpoint carrying only a label and its current network link.
///
/// Used by declarative topologies and by hosts that keep their own state
/// elsewhere.
#[derive(Debug, Default)]
pub struct StaticEndpoint {
    label: String,
    link: Mutex<Option<NetworkLink>>,
}

impl StaticEndpoint {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            link: Mutex::new(None),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Link to the network this endpoint is currently subscribed to.
    pub fn link(&self) -> Option<NetworkLink> {
        self.link
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_subscribed(&self) -> bool {
        self.link().is_some()
    }
}

impl Routable for StaticEndpoint {
    fn subscribe(&self, link: NetworkLink) {
        *self.link.lock().unwrap_or_else(PoisonError::into_inner) = Some(link);
    }

    fn unsubscribe(&self) {
        self.link
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
