//! Cargo/passenger routing and connectivity engine for a transport-network
//! simulation.
//!
//! For every unit of cargo appearing at a station ("halt") this crate
//! decides the best reachable next transfer halt, and it maintains —
//! incrementally, under constant mutation of the network — the per-category
//! graph of which halts can reach which others:
//!
//! - [`halt`]: halts, generation-checked handles, the world-owned registry
//! - [`schedule`]: lines and lineless convoys, the persisted source of truth
//! - [`connections`]: the derived connection graph, component classifier,
//!   and transfer flags
//! - [`debounce`]: the generation-counted rebuild debouncer (at most one
//!   pass per step, only for what changed)
//! - [`search`]: one-shot and resumable priority search over the frozen
//!   per-step snapshot
//! - [`cargo`]: packet generation and the parallel reroute pass
//!
//! Everything derived is a cache over the schedule book and rebuilt from
//! it alone; only sources of truth persist ([`persistence`]).

use bevy::prelude::*;

pub mod cargo;
pub mod config;
pub mod connections;
pub mod debounce;
pub mod goods;
pub mod halt;
pub mod map;
pub mod params;
pub mod persistence;
pub mod router;
pub mod schedule;
pub mod search;
pub mod simulation_sets;
pub mod stats;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
pub mod test_harness;

pub use router::Router;
pub use simulation_sets::RoutingSet;

// ---------------------------------------------------------------------------
// Core resources
// ---------------------------------------------------------------------------

/// Global step counter incremented each `FixedUpdate` (one simulated step).
#[derive(Resource, Default)]
pub struct StepCounter(pub u64);

pub fn tick_step_counter(mut step: ResMut<StepCounter>) {
    step.0 = step.0.wrapping_add(1);
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct RoutingPlugin;

impl Plugin for RoutingPlugin {
    fn build(&self, app: &mut App) {
        // Core resources and the phase chain.
        app.init_resource::<StepCounter>()
            .init_resource::<map::MapBounds>()
            .init_resource::<goods::GoodsCatalog>()
            .init_resource::<debounce::NetworkState>()
            .init_resource::<debounce::RerouteQueue>()
            .add_event::<debounce::NetworkRebuilt>();

        app.configure_sets(
            FixedUpdate,
            (
                RoutingSet::Rebuild,
                RoutingSet::Search,
                RoutingSet::Report,
            )
                .chain(),
        );

        // Rebuild phase: drain notifications, rebuild dirty state, freeze
        // the snapshot every search of this step reads.
        app.add_systems(
            FixedUpdate,
            (
                tick_step_counter,
                debounce::absorb_pending_changes,
                debounce::rebuild_network,
                search::refresh_snapshot,
            )
                .chain()
                .in_set(RoutingSet::Rebuild),
        );

        app.add_systems(FixedUpdate, stats::report_stats.in_set(RoutingSet::Report));

        // Feature plugins.
        app.add_plugins((
            params::RoutingParamsPlugin,
            halt::HaltPlugin,
            schedule::SchedulePlugin,
            connections::ConnectionsPlugin,
            search::SearchPlugin,
            cargo::CargoPlugin,
            stats::StatsPlugin,
        ));
    }
}
