//! Grove: a component-instance engine for declarative UI renderers.
//!
//! Grove sits between a renderer that diffs shadow trees and a native UI
//! toolkit. It keeps one arena node per shadow node, turns props, state and
//! layout snapshots into the minimal set of native attribute writes, runs the
//! scroll engine, virtualizes offscreen children, hit-tests pointer input and
//! routes native callbacks back to the renderer as events.
//!
//! # Quick Start
//!
//! The main entry points are:
//! - [`InstanceTree`] - The arena and every operation on it
//! - [`Commit`] - An ordered batch of renderer mutations
//! - [`native::NativeFacade`] - The seam to the native toolkit
//! - [`event::RendererBridge`] - The seam back to the renderer
//!
//! # Module Organization
//!
//! - [`geom`] - Geometry primitives (Rect, Point, Matrix4, etc.)
//! - [`widgets`] - Per-kind behaviour: scrolling, text, virtualization

#![warn(missing_docs)]

// Internal core module - re-export specific items below
mod core;

// Public modules
pub mod config;
pub mod logging;
pub mod widgets;

pub use grove_geom as geom;

#[cfg(any(test, feature = "testing"))]
pub use core::testing;
pub use core::{Commit, Instance, InstanceId, InstanceTree, InstanceTreeBuilder, Mutation, Tag};
pub use core::{
    clock, command, commit, error, event, executor, facets, id, instance, layout, native, pointer,
    props, registry, state, touch, tree,
};
