//! Step ordering via `SystemSet` phases.
//!
//! These sets are the phase barrier of the engine made explicit: within
//! one `FixedUpdate` step, the debounced graph rebuild completes before
//! any route search starts, and statistics aggregation runs after both.
//! Rebuild and search are mutually exclusive phases, never interleaved —
//! a search observing a partially rebuilt graph is a contract violation,
//! not a recoverable condition.
//!
//! ```text
//! Rebuild  →  Search  →  Report
//! ```
//!
//! * **Rebuild** – step counter, change-log drains, the at-most-once
//!   rebuild pass, and the snapshot freeze every search of this step
//!   reads.
//! * **Search** – all route-search consumers: the batched reroute pass and
//!   any game system generating cargo. Within this phase, searches for
//!   *different* origin halts may run on worker threads concurrently;
//!   the shared snapshot is immutable for the whole phase.
//! * **Report** – read-only aggregation of outcome statistics.

use bevy::prelude::*;

/// Ordered phases for systems running in the `FixedUpdate` schedule.
///
/// Configured as a chain: `Rebuild` → `Search` → `Report`. Plugins use
/// `.in_set(RoutingSet::X)` when registering systems, giving them
/// automatic ordering relative to the other phases.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoutingSet {
    /// Drain change notifications, rebuild dirty graph state, freeze the
    /// step's snapshot.
    Rebuild,
    /// Route-search consumers: rerouting, cargo generation.
    Search,
    /// Statistics aggregation; reads, never mutates.
    Report,
}
