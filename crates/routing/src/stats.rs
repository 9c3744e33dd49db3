//! Routing statistics: outcome counters surfaced to UI/diagnostics.
//!
//! Unroutable cargo is not an error — it is a normal outcome the rest of
//! the game consumes as a statistic (unhappy passengers, returned mail).
//! This module only produces the counts; rendering them is someone else's
//! job.

use bevy::prelude::*;

use crate::cargo::RouteOutcome;

#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct RoutingStats {
    pub walked: u64,
    pub routed: u64,
    pub overcrowded: u64,
    pub no_route: u64,
    /// Waiting packets re-examined by the reroute pass.
    pub packets_rerouted: u64,
    /// Completed debounced rebuild passes.
    pub rebuilds: u64,
    /// Connections in the graph after the most recent rebuild, summed over
    /// the categories that pass touched.
    pub last_rebuild_connections: usize,
}

impl RoutingStats {
    pub fn record_outcome(&mut self, outcome: &RouteOutcome) {
        match outcome {
            RouteOutcome::Walked => self.walked += 1,
            RouteOutcome::Routed(_) => self.routed += 1,
            RouteOutcome::Overcrowded => self.overcrowded += 1,
            RouteOutcome::NoRoute => self.no_route += 1,
        }
    }

    /// Cargo that could not be routed, the "unhappy" figure.
    pub fn unserved(&self) -> u64 {
        self.overcrowded + self.no_route
    }
}

/// System: periodic low-noise diagnostic of the outcome counters.
pub fn report_stats(step: Res<crate::StepCounter>, stats: Res<RoutingStats>) {
    const REPORT_INTERVAL: u64 = 256;
    if step.0 == 0 || !step.0.is_multiple_of(REPORT_INTERVAL) {
        return;
    }
    debug!(
        "routing stats @ step {}: {} walked, {} routed, {} overcrowded, {} no-route, {} rerouted, {} rebuilds",
        step.0, stats.walked, stats.routed, stats.overcrowded, stats.no_route,
        stats.packets_rerouted, stats.rebuilds
    );
}

// =============================================================================
// Plugin
// =============================================================================

pub struct StatsPlugin;

impl Plugin for StatsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RoutingStats>();
    }
}
