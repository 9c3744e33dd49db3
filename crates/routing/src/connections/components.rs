//! Connected-component classifier.
//!
//! For each goods category, halts partition into equivalence classes under
//! "reachable via zero or more direct connections" (weights and capacity
//! ignored). Component-id equality is the exact test for path existence —
//! sound and complete once a rebuild finishes. The component id is always
//! the smallest halt id in the component, which keeps the labeling
//! canonical across traversal orders for deterministic save/replay.

use pathfinding::prelude::connected_components;

use crate::goods::CatgIndex;
use crate::halt::HaltRegistry;

use super::graph::ConnectionGraph;
use super::types::ComponentId;

/// Recompute component ids for one category over the current link state.
///
/// Every live halt gets a decided component afterwards; halts without any
/// connection form singleton components of their own id, so equality stays
/// a total connectivity test. The sentinel is only observable while this
/// pass (or the surrounding rebuild) is in flight.
pub fn recompute_components(
    graph: &mut ConnectionGraph,
    registry: &HaltRegistry,
    catg: CatgIndex,
) {
    // Sentinel everything first so a concurrent observer of a frozen
    // mid-rebuild snapshot can never read a half-updated labeling.
    for slot in 0..graph.slot_count() as u32 {
        if let Some(link) = graph.link_mut(slot, catg) {
            link.component = ComponentId::UNDECIDED;
        }
    }

    let live_slots: Vec<u32> = registry.iter_live().map(|(handle, _)| handle.index).collect();
    if live_slots.is_empty() {
        return;
    }

    let sets = connected_components(&live_slots, |slot: &u32| {
        graph
            .link(*slot, catg)
            .map(|link| {
                link.connections
                    .iter()
                    .filter(|conn| registry.is_live(conn.target))
                    .map(|conn| conn.target.index)
                    .collect::<Vec<u32>>()
            })
            .unwrap_or_default()
    });

    for set in sets {
        let component = set
            .iter()
            .filter_map(|slot| registry.handle_of_slot(*slot))
            .filter_map(|handle| registry.get(handle))
            .map(|halt| halt.id)
            .min()
            .map(ComponentId)
            .unwrap_or(ComponentId::UNDECIDED);

        for slot in set {
            if let Some(link) = graph.link_mut(slot, catg) {
                link.component = component;
            }
        }
    }
}
