//! Immutable network snapshot for route search.
//!
//! Search runs against a frozen copy of the network — halt liveness,
//! adjacency, component ids, overcrowding bits, and the coverage index —
//! shared via `Arc` so worker tasks reference it without cloning per task.
//! The snapshot is refreshed once per step, after the rebuild phase and
//! before any search work, so every packet processed in a step observes
//! the same network state and no search can observe a partially rebuilt
//! graph. Halts destroyed after the freeze simply vanish from the next
//! step's snapshot; the running step completes against the frozen copy.

use std::collections::BTreeMap;
use std::sync::Arc;

use bevy::prelude::*;

use crate::connections::{ComponentId, ConnectionGraph};
use crate::debounce::{NetworkState, RebuildPhase};
use crate::goods::{CargoClass, CatgIndex, CategoryMask, GoodsCatalog};
use crate::halt::{HaltHandle, HaltId, HaltRegistry};
use crate::map::{Coord, MapBounds};

/// Frozen per-slot halt data.
#[derive(Debug, Clone, Default)]
pub struct SnapshotHalt {
    pub handle: HaltHandle,
    pub id: HaltId,
    pub alive: bool,
    pub tiles: Vec<Coord>,
    pub accepts: crate::goods::ClassMask,
    pub overcrowded: CategoryMask,
    pub transfer: CategoryMask,
}

/// Frozen connection. Only live-to-live edges survive the freeze, so the
/// search needs no liveness checks of its own.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotLink {
    pub target_slot: u32,
    pub target_id: HaltId,
    pub weight: u32,
    pub is_transfer: bool,
}

/// The frozen network.
#[derive(Debug, Default)]
pub struct NetworkSnapshot {
    halts: Vec<SnapshotHalt>,
    /// `links[slot][category]`, sorted by target halt id.
    links: Vec<Vec<Vec<SnapshotLink>>>,
    /// `components[slot][category]`.
    components: Vec<Vec<ComponentId>>,
    category_classes: Vec<CargoClass>,
    coverage: BTreeMap<Coord, Vec<u32>>,
    bounds: MapBounds,
    /// True when the freeze observed a not-clean debouncer. Component ids
    /// then read as undecided: callers fall back to full expansion rather
    /// than trusting half-built labels.
    rebuilding: bool,
    /// Rebuild generation the freeze observed.
    pub generation: u64,
}

impl NetworkSnapshot {
    pub fn freeze(
        registry: &HaltRegistry,
        graph: &ConnectionGraph,
        catalog: &GoodsCatalog,
        state: &NetworkState,
        bounds: &MapBounds,
    ) -> Self {
        let slot_count = registry.slot_count();
        let category_count = catalog.len();
        let rebuilding = state.phase() != RebuildPhase::Clean;

        let mut halts = vec![SnapshotHalt::default(); slot_count];
        let mut links = vec![vec![Vec::new(); category_count]; slot_count];
        let mut components =
            vec![vec![ComponentId::UNDECIDED; category_count]; slot_count];
        let mut coverage: BTreeMap<Coord, Vec<u32>> = BTreeMap::new();

        for (handle, halt) in registry.iter_live() {
            let slot = handle.index as usize;
            let mut transfer = CategoryMask::EMPTY;
            for catg in 0..category_count {
                let catg = catg as CatgIndex;
                if let Some(link) = graph.link(handle.index, catg) {
                    if link.is_transfer {
                        transfer.set(catg);
                    }
                    if !rebuilding {
                        components[slot][catg as usize] = link.component;
                    }
                    links[slot][catg as usize] = link
                        .connections
                        .iter()
                        .filter(|conn| registry.is_live(conn.target))
                        .map(|conn| SnapshotLink {
                            target_slot: conn.target.index,
                            target_id: conn.target_id,
                            weight: conn.weight,
                            is_transfer: conn.is_transfer,
                        })
                        .collect();
                }
            }
            halts[slot] = SnapshotHalt {
                handle,
                id: halt.id,
                alive: true,
                tiles: halt.tiles.clone(),
                accepts: halt.accepts,
                overcrowded: halt.overcrowded_mask(),
                transfer,
            };
        }

        for (coord, handles) in registry.coverage_entries() {
            coverage.insert(
                *coord,
                handles.iter().map(|handle| handle.index).collect(),
            );
        }

        Self {
            halts,
            links,
            components,
            category_classes: catalog.classes(),
            coverage,
            bounds: *bounds,
            rebuilding,
            generation: state.generation(),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn slot_count(&self) -> usize {
        self.halts.len()
    }

    pub fn bounds(&self) -> &MapBounds {
        &self.bounds
    }

    pub fn rebuilding(&self) -> bool {
        self.rebuilding
    }

    pub fn halt(&self, slot: u32) -> Option<&SnapshotHalt> {
        self.halts.get(slot as usize).filter(|halt| halt.alive)
    }

    /// Resolve a handle against the frozen state: the slot, if the handle
    /// was live at freeze time.
    pub fn slot_of(&self, handle: HaltHandle) -> Option<u32> {
        self.halt(handle.index)
            .filter(|halt| halt.handle == handle)
            .map(|_| handle.index)
    }

    pub fn handle_of(&self, slot: u32) -> Option<HaltHandle> {
        self.halt(slot).map(|halt| halt.handle)
    }

    pub fn id_of(&self, slot: u32) -> Option<HaltId> {
        self.halt(slot).map(|halt| halt.id)
    }

    /// Slots of halts covering a coordinate.
    pub fn halts_at(&self, coord: Coord) -> &[u32] {
        self.coverage.get(&coord).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn links(&self, slot: u32, catg: CatgIndex) -> &[SnapshotLink] {
        self.links
            .get(slot as usize)
            .and_then(|per_catg| per_catg.get(catg as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Component id, undecided while a rebuild was in flight at freeze
    /// time.
    pub fn component(&self, slot: u32, catg: CatgIndex) -> ComponentId {
        self.components
            .get(slot as usize)
            .and_then(|per_catg| per_catg.get(catg as usize))
            .copied()
            .unwrap_or(ComponentId::UNDECIDED)
    }

    pub fn is_transfer(&self, slot: u32, catg: CatgIndex) -> bool {
        self.halt(slot).is_some_and(|halt| halt.transfer.get(catg))
    }

    pub fn is_overcrowded(&self, slot: u32, catg: CatgIndex) -> bool {
        self.halt(slot)
            .is_some_and(|halt| halt.overcrowded.get(catg))
    }

    pub fn class_of(&self, catg: CatgIndex) -> Option<CargoClass> {
        self.category_classes.get(catg as usize).copied()
    }

    /// Whether any tile of the halt is within walking range of `dest`.
    pub fn within_walking(&self, slot: u32, dest: Coord, range: u32) -> bool {
        self.halt(slot).is_some_and(|halt| {
            halt.tiles.iter().any(|tile| tile.distance(dest) <= range)
        })
    }
}

// =============================================================================
// Resource + refresh system
// =============================================================================

/// Shared read-only snapshot, refreshed once per step between the rebuild
/// and search phases. The version counter is monotonic; a search session
/// built against an older version must not be resumed.
#[derive(Resource)]
pub struct RoutingSnapshot {
    pub net: Arc<NetworkSnapshot>,
    pub version: u64,
}

impl Default for RoutingSnapshot {
    fn default() -> Self {
        Self {
            net: Arc::new(NetworkSnapshot::default()),
            version: 0,
        }
    }
}

/// System: freeze the current network state. Always runs, because
/// overcrowding bits change with every cargo movement even when the graph
/// topology is stable.
pub fn refresh_snapshot(
    registry: Res<HaltRegistry>,
    graph: Res<ConnectionGraph>,
    catalog: Res<GoodsCatalog>,
    state: Res<NetworkState>,
    bounds: Res<MapBounds>,
    mut snapshot: ResMut<RoutingSnapshot>,
) {
    snapshot.net = Arc::new(NetworkSnapshot::freeze(
        &registry, &graph, &catalog, &state, &bounds,
    ));
    snapshot.version += 1;
}
