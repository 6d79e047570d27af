//! A headless ordered-snapshot diffing engine for list and grid data sources.
//!
//! For the apply/coalescing controller and the renderer contract, see the `diffable-adapter`
//! crate.
//!
//! You describe the state you want as a [`Snapshot`] (ordered sections of ordered items, or an
//! [`OutlineSnapshot`] for expandable sidebars), and [`diff`] computes the [`EditScript`] that
//! turns the previous snapshot into the new one: section and item inserts, removes, moves and
//! reloads, matched by identity.
//!
//! It is UI-agnostic. A TUI/GUI layer is expected to provide:
//! - stable identifiers for sections and items
//! - content fingerprints or reload markers when an item's displayed value changes
//! - a renderer that turns an edit script into on-screen row updates
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod differ;
mod error;
mod key;
mod lis;
mod outline;
mod script;
mod snapshot;
mod types;


pub use differ::{diff, diff_by};
pub use error::SnapshotError;
pub use key::{IdMap, Identifier, fingerprint};
pub use outline::OutlineSnapshot;
pub use script::{EditScript, ItemChange, SectionChange};
pub use snapshot::Snapshot;
pub use types::ItemPath;
