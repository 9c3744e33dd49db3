//! Cargo packets and the routing entry points that produce them.
//!
//! ## Data model
//! - `CargoPacket`: category, amount, final destination, route annotation
//! - `RouteAnnotation`: next-transfer halt / walking / unroutable —
//!   exactly one holds after any search
//! - `RouteOutcome`: the externally observable result of a generation call
//!
//! ## Flow
//! `generate_cargo` classifies and stores fresh cargo; after every
//! debounced rebuild the affected halts are queued and
//! `process_reroute_queue` re-annotates their waiting packets in parallel,
//! one resumable search session per (halt, category).

pub mod systems;
pub mod types;

pub use systems::*;
pub use types::*;

use bevy::prelude::*;

use crate::simulation_sets::RoutingSet;

// =============================================================================
// Plugin
// =============================================================================

pub struct CargoPlugin;

impl Plugin for CargoPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            process_reroute_queue.in_set(RoutingSet::Search),
        );
    }
}
