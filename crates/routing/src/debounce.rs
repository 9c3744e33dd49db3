//! NET-014: Network change debouncer.
//!
//! Schedule edits are cheap and frequent; graph rebuilds are not. This
//! module batches every edit made since the last clean state and performs
//! at most one rebuild pass per simulated step, restricted to the halts and
//! categories actually touched. The pass runs in `RoutingSet::Rebuild`,
//! strictly before any search work of the same step — rebuild and search
//! are mutually exclusive phases, never interleaved.
//!
//! State machine: `Clean` → (any schedule mutation) → `Dirty` → (once per
//! step) → `Rebuilding` → `Clean`, bumping a monotonically increasing
//! generation counter on every completed pass.

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::connections::{recompute_components, ConnectionGraph};
use crate::goods::{CatgIndex, CategoryMask, GoodsCatalog};
use crate::halt::{HaltHandle, HaltRegistry};
use crate::persistence::PostLoadRebuildPending;
use crate::schedule::ScheduleBook;
use crate::stats::RoutingStats;

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildPhase {
    /// The graph reflects all known schedules.
    Clean,
    /// At least one schedule changed since the last rebuild.
    Dirty,
    /// A rebuild pass is executing; component ids are undecided.
    Rebuilding,
}

/// Debouncer state: the phase, the rebuild generation, and the dirty
/// (slot → categories) bookkeeping.
#[derive(Resource, Debug)]
pub struct NetworkState {
    phase: RebuildPhase,
    generation: u64,
    dirty: BTreeMap<u32, CategoryMask>,
}

impl Default for NetworkState {
    fn default() -> Self {
        Self {
            phase: RebuildPhase::Clean,
            generation: 0,
            dirty: BTreeMap::new(),
        }
    }
}

impl NetworkState {
    pub fn phase(&self) -> RebuildPhase {
        self.phase
    }

    /// Completed-rebuild counter. Searches cache against this; cached
    /// search state from an older generation must be discarded.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record that (halt slot, categories) needs rebuilding. Idempotent
    /// when already dirty. Marking during a rebuild would mean a schedule
    /// mutation is racing the rebuild phase — a contract violation.
    pub fn mark_dirty(&mut self, slot: u32, categories: CategoryMask) {
        assert!(
            self.phase != RebuildPhase::Rebuilding,
            "schedule mutation during rebuild: phase barrier violated"
        );
        if categories.is_empty() {
            return;
        }
        self.dirty.entry(slot).or_default().union(&categories);
        self.phase = RebuildPhase::Dirty;
    }

    /// Mark every live halt dirty for every known category (post-load, or
    /// bulk invalidation).
    pub fn mark_all_dirty(&mut self, registry: &HaltRegistry, catalog: &GoodsCatalog) {
        let all = CategoryMask::all_below(catalog.len());
        for (handle, _) in registry.iter_live() {
            self.mark_dirty(handle.index, all);
        }
        // Even an empty world counts as dirty after a load, so the first
        // step still runs (and logs) a pass.
        assert!(self.phase != RebuildPhase::Rebuilding);
        self.phase = RebuildPhase::Dirty;
    }

    pub fn is_dirty(&self) -> bool {
        self.phase == RebuildPhase::Dirty
    }

    fn begin_rebuild(&mut self) -> BTreeMap<u32, CategoryMask> {
        assert!(
            self.phase != RebuildPhase::Rebuilding,
            "re-entrant rebuild: phase barrier violated"
        );
        self.phase = RebuildPhase::Rebuilding;
        std::mem::take(&mut self.dirty)
    }

    fn finish_rebuild(&mut self) {
        debug_assert_eq!(self.phase, RebuildPhase::Rebuilding);
        self.phase = RebuildPhase::Clean;
        self.generation += 1;
    }
}

/// Fired after each completed rebuild pass.
#[derive(Event, Debug, Clone)]
pub struct NetworkRebuilt {
    pub generation: u64,
    pub categories_touched: usize,
}

/// Halt/category pairs whose links changed in the last rebuild; the
/// reroute pass drains this in the same step's search phase.
#[derive(Resource, Debug, Default)]
pub struct RerouteQueue {
    jobs: Vec<(HaltHandle, CatgIndex)>,
}

impl RerouteQueue {
    pub fn push(&mut self, halt: HaltHandle, catg: CatgIndex) {
        self.jobs.push((halt, catg));
    }

    /// Drain pending jobs, sorted and deduplicated for deterministic
    /// processing order.
    pub fn drain(&mut self) -> Vec<(HaltHandle, CatgIndex)> {
        let mut jobs = std::mem::take(&mut self.jobs);
        jobs.sort_unstable();
        jobs.dedup();
        jobs
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

// =============================================================================
// Core passes (plain functions so tests can drive them without an App)
// =============================================================================

/// Absorb pending change notifications into the dirty set: the schedule
/// book's change log and halt topology changes (destroy/merge).
pub fn drain_notifications(
    book: &mut ScheduleBook,
    registry: &mut HaltRegistry,
    graph: &ConnectionGraph,
    catalog: &GoodsCatalog,
    state: &mut NetworkState,
) {
    for change in book.drain_changes() {
        for halt in change.halts {
            // Dead stops are marked too: their slots may hold leftover
            // link state that the rebuild must clear.
            state.mark_dirty(halt.index, change.categories);
        }
    }

    for slot in registry.take_topology_changes() {
        state.mark_dirty(slot, CategoryMask::all_below(catalog.len()));
        // Halts still linking *to* the changed slot must rebuild as well,
        // or they would keep edges into a dead halt until their own next
        // schedule edit.
        for catg in 0..catalog.len() {
            let catg = catg as CatgIndex;
            for linking in graph.slots_linking_to(slot, catg) {
                state.mark_dirty(linking, CategoryMask::single(catg));
            }
        }
    }
}

/// Summary of one completed rebuild pass.
pub struct RebuildSummary {
    pub halts: usize,
    pub categories: usize,
    pub connections: usize,
}

/// The debounced rebuild pass: only dirty (halt, category) pairs get their
/// link state rebuilt; the component classifier and transfer propagation
/// re-run in full for every touched category. Affected live halts are
/// queued for rerouting. Returns `None` when nothing was dirty.
pub fn perform_rebuild(
    graph: &mut ConnectionGraph,
    registry: &HaltRegistry,
    book: &ScheduleBook,
    catalog: &GoodsCatalog,
    state: &mut NetworkState,
    queue: &mut RerouteQueue,
) -> Option<RebuildSummary> {
    if !state.is_dirty() {
        return None;
    }

    let dirty = state.begin_rebuild();
    graph.ensure_shape(registry.slot_count(), catalog.len());

    let mut touched = CategoryMask::EMPTY;
    for (slot, mask) in &dirty {
        touched.union(mask);
        match registry.handle_of_slot(*slot) {
            Some(handle) => {
                for catg in mask.iter() {
                    graph.rebuild_halt_category(handle, catg, book, registry);
                }
            }
            None => graph.clear_slot(*slot),
        }
    }

    let mut categories = 0;
    let mut connections = 0;
    for catg in touched.iter() {
        recompute_components(graph, registry, catg);
        graph.propagate_transfer_flags(catg);
        categories += 1;
        connections += graph.connection_count(catg);
    }

    for (slot, mask) in &dirty {
        if let Some(handle) = registry.handle_of_slot(*slot) {
            for catg in mask.iter() {
                queue.push(handle, catg);
            }
        }
    }

    state.finish_rebuild();
    Some(RebuildSummary {
        halts: dirty.len(),
        categories,
        connections,
    })
}

// =============================================================================
// Systems
// =============================================================================

/// System: post-load marker + change-log drains feed the dirty set.
pub fn absorb_pending_changes(
    mut commands: Commands,
    post_load: Option<Res<PostLoadRebuildPending>>,
    mut book: ResMut<ScheduleBook>,
    mut registry: ResMut<HaltRegistry>,
    catalog: Res<GoodsCatalog>,
    graph: Res<ConnectionGraph>,
    mut state: ResMut<NetworkState>,
) {
    if post_load.is_some() {
        info!("post-load: marking entire network dirty for rebuild");
        state.mark_all_dirty(&registry, &catalog);
        commands.remove_resource::<PostLoadRebuildPending>();
    }
    drain_notifications(&mut book, &mut registry, &graph, &catalog, &mut state);
}

/// System: run the debounced rebuild pass at most once per step.
pub fn rebuild_network(
    mut graph: ResMut<ConnectionGraph>,
    registry: Res<HaltRegistry>,
    book: Res<ScheduleBook>,
    catalog: Res<GoodsCatalog>,
    mut state: ResMut<NetworkState>,
    mut queue: ResMut<RerouteQueue>,
    mut stats: ResMut<RoutingStats>,
    mut rebuilt: EventWriter<NetworkRebuilt>,
) {
    let Some(summary) = perform_rebuild(
        &mut graph,
        &registry,
        &book,
        &catalog,
        &mut state,
        &mut queue,
    ) else {
        return;
    };

    stats.rebuilds += 1;
    stats.last_rebuild_connections = summary.connections;

    info!(
        "network rebuild #{}: {} halts, {} categories, {} connections",
        state.generation(),
        summary.halts,
        summary.categories,
        summary.connections
    );
    rebuilt.send(NetworkRebuilt {
        generation: state.generation(),
        categories_touched: summary.categories,
    });
}
