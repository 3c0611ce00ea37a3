use std::path::PathBuf;
use std::sync::Arc;

use conduit_lib::{BuiltNetwork, NullSink, Topology};

/// Build one of the shared JSON fixtures.
pub fn fixture(name: &str) -> BuiltNetwork {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../docs/fixtures")
        .join(name);
    Topology::from_path(&path)
        .expect("fixture parses")
        .build(Arc::new(NullSink))
        .expect("fixture builds")
}
