//! The per-category connection graph derived from schedules.
//!
//! Nodes are halts; an edge exists between two halts for a category when at
//! least one service links them directly with the category enabled, with an
//! integer weight describing service quality (lower = better). On top of
//! the adjacency the classifier assigns connected-component ids and the
//! transfer flags route search relies on.
//!
//! Everything in this module is a rebuildable cache over the schedule book
//! — the debouncer (`crate::debounce`) decides *when* to rebuild; this
//! module only knows *how*.

pub mod components;
pub mod graph;
mod tests;
pub mod types;

pub use components::*;
pub use graph::*;
pub use types::*;

use bevy::prelude::*;

// =============================================================================
// Plugin
// =============================================================================

pub struct ConnectionsPlugin;

impl Plugin for ConnectionsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ConnectionGraph>();
    }
}
