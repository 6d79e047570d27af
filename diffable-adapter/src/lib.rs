//! Adapter utilities for the `diffable` crate.
//!
//! The `diffable` crate is UI-agnostic and focuses on snapshots and the differ. This crate
//! provides the framework-neutral pieces an adapter needs to drive a real list or grid:
//!
//! - [`DataSourceController`]: owns the applied snapshot, serializes and coalesces apply
//!   requests, and handles outline expand/collapse
//! - [`Renderer`]: the collaborator that receives edit scripts
//! - [`CellRegistry`]: kind-to-presentation dispatch for heterogeneous items
//! - [`DiffWorker`] (feature `worker`): a background thread for large diffs
//!
//! This crate is intentionally framework-agnostic (no ratatui/egui bindings).
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(any(test, feature = "worker"))]
extern crate std;

#[macro_use]
mod macros;

mod controller;
mod registry;
mod renderer;
#[cfg(feature = "worker")]
mod worker;

#[cfg(test)]
mod tests;

pub use controller::{ApplyOutcome, ApplyStats, ControllerOptions, DataSourceController, Phase};
pub use registry::{CellProvider, CellRegistry, Kinded};
pub use renderer::{ModelRenderer, Renderer};
#[cfg(feature = "worker")]
pub use worker::{DiffWorker, WorkerConfig};
