//! Conduit CLI library.
//!
//! Command handlers, output formatting and logging setup for the
//! `conduit-cli` binary. Handlers return the rendered output so they can be
//! exercised without spawning the binary.

pub mod commands;
pub mod logging;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
