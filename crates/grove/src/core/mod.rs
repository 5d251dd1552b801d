#![allow(clippy::new_without_default)]
//! Core types for the grove component-instance engine.

/// Time sources.
pub mod clock;
/// Imperative command parsing.
pub mod command;
/// The renderer mutation protocol.
pub mod commit;
/// Core error types.
pub mod error;
/// Renderer events and native callbacks.
pub mod event;
/// Cross-thread task scheduling.
pub mod executor;
/// Derived native attribute groups.
pub mod facets;
/// Instance and tag identifiers.
pub mod id;
/// Arena nodes.
pub mod instance;
/// Layout pass output.
pub mod layout;
/// The native toolkit seam.
pub mod native;
/// Hover and click routing.
pub mod pointer;
/// Props snapshots.
pub mod props;
/// Native event routing.
pub mod registry;
/// State snapshots.
pub mod state;
/// Testing utilities.
#[cfg(any(test, feature = "testing"))]
pub mod testing;
/// Touch targets and hit testing.
pub mod touch;
/// The instance tree.
pub mod tree;

pub use commit::{Commit, Mutation};
pub use id::{InstanceId, Tag};
pub use instance::Instance;
pub use tree::{InstanceTree, InstanceTreeBuilder};
