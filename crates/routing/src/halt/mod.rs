//! Halt entities and the world-owned halt registry.
//!
//! A halt is a station/stop that cargo waits at. Halts are created when
//! their first physical tile is placed, destroyed when the last tile goes
//! (or when merged into another halt), and referenced everywhere else
//! through generation-checked [`HaltHandle`]s so that destruction is a
//! checked, explicit condition rather than a dangling pointer.
//!
//! ## Data model
//! - `Halt`: id, owner, accepted cargo classes, tiles, per-category
//!   capacity + overcrowded bit, waiting cargo keyed by destination
//! - `HaltRegistry`: slot arena + liveness checks + the catchment index
//!   behind `halts_at`

pub mod state;
mod tests;
pub mod types;

pub use state::*;
pub use types::*;

use bevy::prelude::*;

// =============================================================================
// Plugin
// =============================================================================

pub struct HaltPlugin;

impl Plugin for HaltPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HaltRegistry>();
    }
}
