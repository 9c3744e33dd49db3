//! The derived connection graph and its rebuild pass.
//!
//! **Determinism**: adjacency lists are sorted by target halt id, and the
//! whole structure is a pure function of (`ScheduleBook`, `HaltRegistry`)
//! — rebuilding twice with no intervening edits yields identical output.
//! The graph is a cache, never a source of truth: nothing here survives a
//! save file, and any entry is recomputable from schedules alone.

use bevy::prelude::*;

use crate::config::{SPEED_BONUS_CAP, WEIGHT_CAPACITY_SCALE, WEIGHT_FREQUENCY_SCALE};
use crate::goods::CatgIndex;
use crate::halt::{HaltHandle, HaltRegistry};
use crate::schedule::{ScheduleBook, ServiceQuality};

use super::types::{ComponentId, Connection, LinkState};

/// Connection weight policy: combines departure frequency, capacity, and
/// speed into one non-negative integer, lower = better service. Any
/// monotonic weighting satisfies the routing contract; this one is cheap
/// and keeps small networks in small-integer territory.
pub fn connection_weight(quality: &ServiceQuality) -> u32 {
    let frequency_term = WEIGHT_FREQUENCY_SCALE / quality.departures_per_month.max(1);
    let capacity_term = WEIGHT_CAPACITY_SCALE / (quality.capacity + 1);
    (frequency_term + capacity_term)
        .saturating_sub(quality.speed.min(SPEED_BONUS_CAP))
        .max(1)
}

/// Per-category adjacency for every halt slot, `links[slot][category]`.
#[derive(Resource, Debug, Default)]
pub struct ConnectionGraph {
    links: Vec<Vec<LinkState>>,
}

impl ConnectionGraph {
    /// Grow the table to cover all registry slots and `category_count`
    /// categories. Existing entries are untouched.
    pub fn ensure_shape(&mut self, slot_count: usize, category_count: usize) {
        if self.links.len() < slot_count {
            self.links.resize_with(slot_count, Vec::new);
        }
        for per_catg in &mut self.links {
            if per_catg.len() < category_count {
                per_catg.resize_with(category_count, LinkState::default);
            }
        }
    }

    pub fn link(&self, slot: u32, catg: CatgIndex) -> Option<&LinkState> {
        self.links
            .get(slot as usize)
            .and_then(|per_catg| per_catg.get(catg as usize))
    }

    pub fn link_mut(&mut self, slot: u32, catg: CatgIndex) -> Option<&mut LinkState> {
        self.links
            .get_mut(slot as usize)
            .and_then(|per_catg| per_catg.get_mut(catg as usize))
    }

    pub fn slot_count(&self) -> usize {
        self.links.len()
    }

    /// Total connection count for one category, a diagnostic figure.
    pub fn connection_count(&self, catg: CatgIndex) -> usize {
        self.links
            .iter()
            .filter_map(|per_catg| per_catg.get(catg as usize))
            .map(|link| link.connections.len())
            .sum()
    }

    /// Slots whose adjacency for `catg` references `target_slot`. Used by
    /// the debouncer when a halt dies without a schedule edit.
    pub fn slots_linking_to(&self, target_slot: u32, catg: CatgIndex) -> Vec<u32> {
        self.links
            .iter()
            .enumerate()
            .filter(|(_, per_catg)| {
                per_catg.get(catg as usize).is_some_and(|link| {
                    link.connections
                        .iter()
                        .any(|conn| conn.target.index == target_slot)
                })
            })
            .map(|(slot, _)| slot as u32)
            .collect()
    }

    /// Wipe every category's link state for a slot. Used when the halt
    /// behind the slot has been destroyed.
    pub fn clear_slot(&mut self, slot: u32) {
        if let Some(per_catg) = self.links.get_mut(slot as usize) {
            for link in per_catg.iter_mut() {
                *link = LinkState::default();
            }
        }
    }

    /// Rebuild the link state of one (halt, category) pair from schedules.
    ///
    /// Scans every service stopping at the halt with the category enabled
    /// and inserts one connection per *other* live stop of that service
    /// (all-pairs within a service: same-service reachability is always a
    /// single edge). Idempotent; a dead handle is a no-op.
    pub fn rebuild_halt_category(
        &mut self,
        handle: HaltHandle,
        catg: CatgIndex,
        book: &ScheduleBook,
        registry: &HaltRegistry,
    ) {
        if !registry.is_live(handle) {
            // Destroyed between scheduling and rebuild: clear any leftover
            // state for the slot and bail.
            if let Some(link) = self.link_mut(handle.index, catg) {
                *link = LinkState::default();
            }
            return;
        }

        let mut connections: Vec<Connection> = Vec::new();
        let mut serving = 0u16;

        for service in book.services_at(handle) {
            if !service.categories.get(catg) {
                continue;
            }
            serving = serving.saturating_add(1);
            let weight = connection_weight(&service.quality);

            for stop in &service.stops {
                if *stop == handle {
                    continue;
                }
                let Some(target_halt) = registry.get(*stop) else {
                    continue;
                };
                match connections.iter_mut().find(|conn| conn.target == *stop) {
                    Some(existing) => existing.weight = existing.weight.min(weight),
                    None => connections.push(Connection {
                        target: *stop,
                        target_id: target_halt.id,
                        weight,
                        is_transfer: false,
                    }),
                }
            }
        }

        connections.sort_by_key(|conn| conn.target_id);

        let link = self
            .link_mut(handle.index, catg)
            .expect("graph shaped before rebuild");
        *link = LinkState {
            connections,
            serving_services: serving,
            is_transfer: serving >= 2,
            // Components are recomputed by the classifier after all dirty
            // link states of this category are rebuilt.
            component: ComponentId::UNDECIDED,
        };
    }

    /// Propagate transfer classification onto incoming connections: each
    /// connection's `is_transfer` mirrors its target's link state. Runs
    /// once per rebuilt category, after all link states are final.
    pub fn propagate_transfer_flags(&mut self, catg: CatgIndex) {
        let transfer_by_slot: Vec<bool> = self
            .links
            .iter()
            .map(|per_catg| {
                per_catg
                    .get(catg as usize)
                    .is_some_and(|link| link.is_transfer)
            })
            .collect();

        for per_catg in &mut self.links {
            if let Some(link) = per_catg.get_mut(catg as usize) {
                for conn in &mut link.connections {
                    conn.is_transfer = transfer_by_slot
                        .get(conn.target.index as usize)
                        .copied()
                        .unwrap_or(false);
                }
            }
        }
    }
}
