//! Resolution of mod references against host reference data.
//!
//! A mod binary refers to host members by name and signature as they looked
//! when the mod was compiled. The [`Resolver`] checks those references against
//! the [`ReferenceSet`] of host modules loaded at startup and reports whether
//! each one still matches, matches with a different type, or no longer exists.
//!
//! # Key Components
//!
//! - [`ReferenceSet`] - Shared, read-only host modules keyed by scope
//! - [`Resolver`] - Per-pass resolver with its own type lookup cache
//! - [`Resolution`] - Outcome of resolving one member reference

mod reference;
mod resolve;

pub use reference::ReferenceSet;
pub use resolve::{Resolution, Resolver, UnresolvedReason};
