//! Cargo generation and the batched reroute pass.

use bevy::prelude::*;
use bevy::tasks::ComputeTaskPool;

use crate::debounce::RerouteQueue;
use crate::goods::CatgIndex;
use crate::halt::{HaltHandle, HaltRegistry};
use crate::map::Coord;
use crate::params::RoutingParams;
use crate::router::Router;
use crate::search::{RoutingSnapshot, SearchResult, SearchSession};
use crate::stats::RoutingStats;

use super::types::{CargoPacket, RouteAnnotation, RouteOutcome};

/// Generate a unit of cargo at a set of origin halts (one coordinate can
/// be covered by several overlapping stations) bound for `dest`.
///
/// Routed cargo is stored at the origin halt the winning path starts at,
/// annotated with its next-transfer halt; walked cargo needs no halt at
/// all; overcrowded and unroutable cargo is counted and dropped — retrying
/// is the generation layer's policy, not ours.
pub fn generate_cargo(
    registry: &mut HaltRegistry,
    stats: &mut RoutingStats,
    snapshot: &RoutingSnapshot,
    params: &RoutingParams,
    origins: &[HaltHandle],
    dest: Coord,
    category: CatgIndex,
    amount: u32,
) -> RouteOutcome {
    let result = Router::new(snapshot, params).route_cargo(origins, dest, category);
    stats.record_outcome(&result.outcome);

    if let RouteOutcome::Routed(next) = result.outcome {
        let origin = result
            .origin
            .expect("routed results carry their origin halt");
        if let Some(halt) = registry.get_mut(origin) {
            let mut packet = CargoPacket::new(category, amount, dest);
            packet.route = RouteAnnotation::Via(next);
            halt.store_waiting(packet);
        }
    }
    result.outcome
}

/// Re-route everything waiting at one halt for one category, through a
/// single resumable session. Returns the number of packets processed.
pub fn reroute_waiting_cargo(
    registry: &mut HaltRegistry,
    stats: &mut RoutingStats,
    snapshot: &RoutingSnapshot,
    params: &RoutingParams,
    halt: HaltHandle,
    category: CatgIndex,
) -> usize {
    let destinations = match registry.get(halt) {
        Some(h) => h.waiting_destinations(category),
        None => return 0,
    };
    if destinations.is_empty() {
        return 0;
    }

    let mut session = SearchSession::new(snapshot.net.clone(), category, &[halt], params);
    let results: Vec<(Coord, SearchResult)> = destinations
        .into_iter()
        .map(|dest| (dest, session.route_to(dest)))
        .collect();

    apply_reroute_results(registry, stats, halt, category, &results)
}

fn apply_reroute_results(
    registry: &mut HaltRegistry,
    stats: &mut RoutingStats,
    halt: HaltHandle,
    category: CatgIndex,
    results: &[(Coord, SearchResult)],
) -> usize {
    let Some(halt_data) = registry.get_mut(halt) else {
        return 0;
    };
    let mut processed = 0;
    for (dest, result) in results {
        let annotation = match result.outcome {
            RouteOutcome::Routed(next) => RouteAnnotation::Via(next),
            RouteOutcome::Walked => RouteAnnotation::Walking,
            RouteOutcome::Overcrowded | RouteOutcome::NoRoute => RouteAnnotation::Unroutable,
        };
        if halt_data.annotate_route(category, *dest, annotation) {
            processed += 1;
        }
    }
    stats.packets_rerouted += processed as u64;
    processed
}

// =============================================================================
// Systems
// =============================================================================

/// System: drain the reroute queue filled by the rebuild pass, fanning the
/// per-halt searches out across the compute task pool. Each task owns a
/// private session for its origin halt — no two tasks ever share one — and
/// reads only the `Arc`-shared frozen snapshot. The scope joins before the
/// system returns, so all search work of the step completes inside the
/// search phase, and results are applied in queue order for determinism.
pub fn process_reroute_queue(
    mut queue: ResMut<RerouteQueue>,
    mut registry: ResMut<HaltRegistry>,
    snapshot: Res<RoutingSnapshot>,
    params: Res<RoutingParams>,
    mut stats: ResMut<RoutingStats>,
) {
    if queue.is_empty() {
        return;
    }

    let jobs: Vec<(HaltHandle, CatgIndex, Vec<Coord>)> = queue
        .drain()
        .into_iter()
        .filter_map(|(halt, category)| {
            registry
                .get(halt)
                .map(|h| (halt, category, h.waiting_destinations(category)))
        })
        .filter(|(_, _, destinations)| !destinations.is_empty())
        .collect();
    if jobs.is_empty() {
        return;
    }

    let pool = ComputeTaskPool::get_or_init(Default::default);
    let params_copy = *params;
    let results: Vec<Vec<(Coord, SearchResult)>> = pool.scope(|scope| {
        for (halt, category, destinations) in &jobs {
            let net = snapshot.net.clone();
            let halt = *halt;
            let category = *category;
            let destinations = destinations.clone();
            scope.spawn(async move {
                let mut session = SearchSession::new(net, category, &[halt], &params_copy);
                destinations
                    .into_iter()
                    .map(|dest| (dest, session.route_to(dest)))
                    .collect::<Vec<_>>()
            });
        }
    });

    let mut processed = 0;
    for ((halt, category, _), job_results) in jobs.iter().zip(results.iter()) {
        processed += apply_reroute_results(&mut registry, &mut stats, *halt, *category, job_results);
    }
    debug!(
        "reroute pass: {} halts, {} packets re-examined",
        jobs.len(),
        processed
    );
}
