//! Route search: priority-ordered expansion with deferred termination,
//! one-shot or resumable.
//!
//! A [`SearchSession`] is the explicit carrier of all cross-call search
//! state: the scratch arena, the open heap, and the finalized order. A
//! one-shot search is a fresh session used once; the reroute pass keeps a
//! session per (origin halt, category) and asks it for one destination
//! after another, resuming the expansion instead of restarting. Resumption
//! is a pure performance optimization: for any destination sequence the
//! session returns exactly what fresh one-shot searches would.
//!
//! Determinism: the open heap orders by (aggregate weight, halt id), so
//! ties always resolve toward the smaller halt id and identical network
//! state yields identical results — required for lock-step multiplayer.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;

use crate::cargo::RouteOutcome;
use crate::config::SLOT_NONE;
use crate::goods::CatgIndex;
use crate::halt::{HaltHandle, HaltId};
use crate::map::Coord;
use crate::params::RoutingParams;

use super::snapshot::NetworkSnapshot;

/// Result of one search call: the outcome plus which origin halt the
/// winning path starts at (where generated cargo should wait) and, for a
/// routed result, the aggregate weight of the chosen path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub outcome: RouteOutcome,
    pub origin: Option<HaltHandle>,
    pub weight: Option<u32>,
}

impl SearchResult {
    fn no_route() -> Self {
        Self {
            outcome: RouteOutcome::NoRoute,
            origin: None,
            weight: None,
        }
    }

    fn overcrowded() -> Self {
        Self {
            outcome: RouteOutcome::Overcrowded,
            origin: None,
            weight: None,
        }
    }
}

// =============================================================================
// Scratch state
// =============================================================================

/// Per-halt scratch, valid only for the arena generation that wrote it; a
/// stale `seen_in` reads as unvisited, a stale `finalized_in` as open.
#[derive(Debug, Clone, Copy)]
struct SearchNode {
    seen_in: u32,
    finalized_in: u32,
    /// Best aggregate weight seen so far in this generation.
    best: u32,
    /// First transfer halt on the best known path (`SLOT_NONE` at origins).
    first_transfer: u32,
    /// Origin halt the best known path starts at.
    origin_slot: u32,
    /// Hop count, the safety bound.
    depth: u8,
}

impl Default for SearchNode {
    fn default() -> Self {
        Self {
            seen_in: 0,
            finalized_in: 0,
            best: u32::MAX,
            first_transfer: SLOT_NONE,
            origin_slot: SLOT_NONE,
            depth: 0,
        }
    }
}

/// Open-set entry, min-ordered by (weight, halt id) through `Reverse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct OpenEntry {
    weight: u32,
    id: HaltId,
    slot: u32,
}

// =============================================================================
// Session
// =============================================================================

/// Stateful route search over one frozen network snapshot, for one origin
/// set and one goods category. Policies are captured at construction so a
/// resumed call can never diverge from the one-shot equivalent.
pub struct SearchSession {
    net: Arc<NetworkSnapshot>,
    category: CatgIndex,
    params: RoutingParams,
    /// Seedable origins: live at freeze time and accepting the category's
    /// cargo class, sorted by halt id.
    origins: Vec<u32>,
    /// Origins for the walking shortcut (acceptance not required to walk),
    /// sorted by halt id.
    walk_origins: Vec<u32>,
    /// Component ids reachable from the origins; `None` disables component
    /// pruning (some relevant id was undecided at freeze time).
    allowed_components: Option<Vec<u32>>,
    nodes: Vec<SearchNode>,
    open: BinaryHeap<Reverse<OpenEntry>>,
    /// Finalized slots in pop order — ascending (weight, halt id).
    finalized_order: Vec<u32>,
    generation: u32,
    seeded: bool,
}

impl SearchSession {
    pub fn new(
        net: Arc<NetworkSnapshot>,
        category: CatgIndex,
        origin_handles: &[HaltHandle],
        params: &RoutingParams,
    ) -> Self {
        let mut walk_origins: Vec<u32> = origin_handles
            .iter()
            .filter_map(|handle| net.slot_of(*handle))
            .collect();
        walk_origins.sort_by_key(|slot| net.id_of(*slot));
        walk_origins.dedup();

        let class = net.class_of(category);
        let origins: Vec<u32> = walk_origins
            .iter()
            .copied()
            .filter(|slot| {
                net.halt(*slot)
                    .zip(class)
                    .is_some_and(|(halt, class)| halt.accepts.accepts(class))
            })
            .collect();

        let allowed_components = if net.rebuilding() {
            None
        } else {
            let mut components = Vec::with_capacity(origins.len());
            let mut decided = true;
            for slot in &origins {
                let component = net.component(*slot, category);
                if component.is_decided() {
                    components.push(component.0);
                } else {
                    decided = false;
                    break;
                }
            }
            if decided {
                components.sort_unstable();
                components.dedup();
                Some(components)
            } else {
                None
            }
        };

        let slot_count = net.slot_count();
        Self {
            net,
            category,
            params: *params,
            origins,
            walk_origins,
            allowed_components,
            nodes: vec![SearchNode::default(); slot_count],
            open: BinaryHeap::new(),
            finalized_order: Vec::new(),
            generation: 1,
            seeded: false,
        }
    }

    pub fn category(&self) -> CatgIndex {
        self.category
    }

    /// Rebuild generation of the underlying snapshot. A caller holding a
    /// session across steps compares this against the current snapshot and
    /// discards the session on mismatch.
    pub fn network_generation(&self) -> u64 {
        self.net.generation
    }

    /// Whether this session can serve calls for the given origin set and
    /// category against the given snapshot. Anything else requires a fresh
    /// session.
    pub fn matches(
        &self,
        net: &Arc<NetworkSnapshot>,
        category: CatgIndex,
        origin_handles: &[HaltHandle],
    ) -> bool {
        if !Arc::ptr_eq(&self.net, net) || self.category != category {
            return false;
        }
        let mut slots: Vec<u32> = origin_handles
            .iter()
            .filter_map(|handle| self.net.slot_of(*handle))
            .collect();
        slots.sort_by_key(|slot| self.net.id_of(*slot));
        slots.dedup();
        slots == self.walk_origins
    }

    // -------------------------------------------------------------------------
    // The search
    // -------------------------------------------------------------------------

    /// Find the best route from this session's origins to `dest`. Resumes
    /// prior expansion when called repeatedly.
    pub fn route_to(&mut self, dest: Coord) -> SearchResult {
        if !self.net.bounds().contains(dest) {
            return SearchResult::no_route();
        }

        // Walking shortcut: cheapest possible outcome, checked before any
        // graph work. Scanned in halt-id order for determinism.
        let range = self.params.search.walking_range;
        for &slot in &self.walk_origins {
            if self.net.within_walking(slot, dest, range) {
                return SearchResult {
                    outcome: RouteOutcome::Walked,
                    origin: self.net.handle_of(slot),
                    weight: None,
                };
            }
        }

        if self.origins.is_empty() {
            return SearchResult::no_route();
        }

        // Halts serving the destination area, filtered to those accepting
        // the category's cargo class.
        let class = self.net.class_of(self.category);
        let mut dest_slots: Vec<u32> = self
            .net
            .halts_at(dest)
            .iter()
            .copied()
            .filter(|slot| {
                self.net
                    .halt(*slot)
                    .zip(class)
                    .is_some_and(|(halt, class)| halt.accepts.accepts(class))
            })
            .collect();
        dest_slots.sort_unstable();
        dest_slots.dedup();
        if dest_slots.is_empty() {
            return SearchResult::no_route();
        }

        // Destination already served by an origin halt: the cargo needs no
        // vehicle at all.
        if let Some(&slot) = self
            .origins
            .iter()
            .find(|&&slot| dest_slots.binary_search(&slot).is_ok())
        {
            return SearchResult {
                outcome: RouteOutcome::Walked,
                origin: self.net.handle_of(slot),
                weight: None,
            };
        }

        // Component fast rejection: when every relevant id is decided and
        // no destination component is reachable from the origins, there is
        // no path — an exact answer, not a heuristic. Undecided ids fall
        // back to the full expansion below.
        if let Some(allowed) = &self.allowed_components {
            let dest_components: Vec<_> = dest_slots
                .iter()
                .map(|slot| self.net.component(*slot, self.category))
                .collect();
            if dest_components.iter().all(|component| component.is_decided())
                && !dest_components
                    .iter()
                    .any(|component| allowed.binary_search(&component.0).is_ok())
            {
                return SearchResult::no_route();
            }
        }

        let avoid_overcrowded = self.params.policy.route_around_overcrowded;
        let open_dest: Vec<u32> = dest_slots
            .iter()
            .copied()
            .filter(|slot| {
                !avoid_overcrowded || !self.net.is_overcrowded(*slot, self.category)
            })
            .collect();
        let rejected_overcrowded = open_dest.len() != dest_slots.len();
        if open_dest.is_empty() {
            // The network may well connect; policy forbids using it.
            return SearchResult::overcrowded();
        }

        if !self.seeded {
            self.seed();
        }

        // A destination candidate already finalized by an earlier call?
        // `finalized_order` is ascending (weight, id), so the first hit is
        // the best one — identical to what a fresh search would pop first.
        let mut best: Option<(u32, u32)> = None;
        for &slot in &self.finalized_order {
            if open_dest.binary_search(&slot).is_ok() {
                best = Some((slot, self.nodes[slot as usize].best));
                break;
            }
        }

        // Priority expansion with deferred termination: keep popping until
        // the best candidate is at least as cheap as everything remaining,
        // because a better destination halt may still surface.
        while let Some(Reverse(top)) = self.open.peek().copied() {
            if let Some((_, best_weight)) = best {
                if best_weight <= top.weight {
                    break;
                }
            }
            self.open.pop();

            let node = self.nodes[top.slot as usize];
            if node.finalized_in == self.generation {
                continue;
            }
            if top.weight > node.best {
                continue; // superseded heap entry
            }

            self.nodes[top.slot as usize].finalized_in = self.generation;
            self.finalized_order.push(top.slot);

            if best.is_none() && open_dest.binary_search(&top.slot).is_ok() {
                best = Some((top.slot, top.weight));
            }

            // With all-pairs edges per service, every halt reachable
            // without changing services is already a direct neighbor of
            // the predecessor — paths only branch at transfer halts, so
            // nothing else is worth expanding (origins always are).
            let at_origin = node.depth == 0;
            if !at_origin && !self.net.is_transfer(top.slot, self.category) {
                continue;
            }
            if node.depth >= self.params.search.max_hops {
                continue;
            }

            for link in self.net.links(top.slot, self.category) {
                let target = link.target_slot;
                if self.nodes[target as usize].finalized_in == self.generation {
                    continue;
                }
                if avoid_overcrowded && self.net.is_overcrowded(target, self.category) {
                    continue;
                }
                if let Some(allowed) = &self.allowed_components {
                    let component = self.net.component(target, self.category);
                    if component.is_decided()
                        && allowed.binary_search(&component.0).is_err()
                    {
                        continue;
                    }
                }
                let first_transfer = if at_origin {
                    target
                } else {
                    node.first_transfer
                };
                Self::relax(
                    &mut self.nodes,
                    &mut self.open,
                    self.generation,
                    target,
                    top.weight + link.weight,
                    link.target_id,
                    first_transfer,
                    node.origin_slot,
                    node.depth + 1,
                );
            }
        }

        match best {
            Some((slot, weight)) => {
                let node = self.nodes[slot as usize];
                let first = if node.first_transfer == SLOT_NONE {
                    slot
                } else {
                    node.first_transfer
                };
                SearchResult {
                    outcome: RouteOutcome::Routed(
                        self.net.handle_of(first).expect("finalized slots are live"),
                    ),
                    origin: self.net.handle_of(node.origin_slot),
                    weight: Some(weight),
                }
            }
            None if rejected_overcrowded => SearchResult::overcrowded(),
            None => SearchResult::no_route(),
        }
    }

    fn seed(&mut self) {
        debug_assert!(!self.seeded);
        self.seeded = true;
        for &slot in &self.origins {
            let id = self.net.id_of(slot).expect("origins are live at freeze");
            self.nodes[slot as usize] = SearchNode {
                seen_in: self.generation,
                finalized_in: 0,
                best: 0,
                first_transfer: SLOT_NONE,
                origin_slot: slot,
                depth: 0,
            };
            self.open.push(Reverse(OpenEntry {
                weight: 0,
                id,
                slot,
            }));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn relax(
        nodes: &mut [SearchNode],
        open: &mut BinaryHeap<Reverse<OpenEntry>>,
        generation: u32,
        slot: u32,
        weight: u32,
        id: HaltId,
        first_transfer: u32,
        origin_slot: u32,
        depth: u8,
    ) {
        let node = &mut nodes[slot as usize];
        let unvisited = node.seen_in != generation;
        if unvisited || weight < node.best {
            *node = SearchNode {
                seen_in: generation,
                finalized_in: 0,
                best: weight,
                first_transfer,
                origin_slot,
                depth,
            };
            open.push(Reverse(OpenEntry { weight, id, slot }));
        }
    }
}
