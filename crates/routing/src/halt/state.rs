//! The `HaltRegistry`: slot arena, halt lifecycle, and the tile-coverage
//! index backing `halts_at`.

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::config::COVERAGE_RADIUS;
use crate::goods::{CatgIndex, ClassMask};
use crate::map::Coord;

use super::types::{Halt, HaltHandle, HaltId, PlayerId};

// =============================================================================
// Slot arena
// =============================================================================

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    halt: Option<Halt>,
}

/// Process-wide halt registry, owned by the simulation world as a resource
/// (one registry per running game; created on new-game or load, dropped with
/// the world). All halt access goes through generation-checked handles.
#[derive(Resource, Debug, Default)]
pub struct HaltRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    next_id: HaltId,
    /// Catchment index: every cell within `COVERAGE_RADIUS` of a halt tile
    /// maps to the halts covering it.
    coverage: BTreeMap<Coord, Vec<HaltHandle>>,
    /// Slots whose incident connections went stale (halt destroyed or
    /// merged) since the debouncer last drained this log.
    topology_changes: Vec<u32>,
}

impl HaltRegistry {
    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Create a halt on its first physical tile.
    pub fn create_halt(&mut self, owner: PlayerId, accepts: ClassMask, tile: Coord) -> HaltHandle {
        let id = self.next_id;
        self.next_id += 1;

        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let handle = HaltHandle {
            index,
            generation: self.slots[index as usize].generation,
        };
        self.slots[index as usize].halt = Some(Halt::new(id, owner, accepts, tile));
        self.register_coverage(handle, tile);
        handle
    }

    /// Add a station tile to an existing halt. Returns false on a stale
    /// handle or a duplicate tile.
    pub fn add_tile(&mut self, handle: HaltHandle, tile: Coord) -> bool {
        let Some(halt) = self.get_mut(handle) else {
            return false;
        };
        if halt.tiles.contains(&tile) {
            return false;
        }
        halt.tiles.push(tile);
        self.register_coverage(handle, tile);
        true
    }

    /// Remove a station tile. Removing the last tile destroys the halt (a
    /// halt with zero tiles must not exist). Returns true when the halt was
    /// destroyed by this call.
    pub fn remove_tile(&mut self, handle: HaltHandle, tile: Coord) -> bool {
        let Some(halt) = self.get_mut(handle) else {
            return false;
        };
        let Some(pos) = halt.tiles.iter().position(|t| *t == tile) else {
            return false;
        };
        halt.tiles.swap_remove(pos);
        let remaining = halt.tiles.clone();

        // Drop coverage cells of the removed tile that no remaining tile
        // still covers.
        for cell in coverage_cells(tile) {
            let still_covered = remaining
                .iter()
                .any(|t| chebyshev(*t, cell) <= COVERAGE_RADIUS);
            if !still_covered {
                self.remove_coverage_entry(cell, handle);
            }
        }

        if remaining.is_empty() {
            self.destroy_halt(handle);
            return true;
        }
        false
    }

    /// Destroy a halt outright: purge its coverage, free its slot, bump the
    /// slot generation so outstanding handles go stale, and log the
    /// topology change for the debouncer.
    pub fn destroy_halt(&mut self, handle: HaltHandle) {
        if !self.is_live(handle) {
            return;
        }
        let slot = &mut self.slots[handle.index as usize];
        let halt = slot.halt.take().expect("live slot holds a halt");
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.topology_changes.push(handle.index);

        for tile in &halt.tiles {
            for cell in coverage_cells(*tile) {
                self.remove_coverage_entry(cell, handle);
            }
        }
    }

    /// Merge `from` into `into`: tiles, waiting cargo, capacities, and the
    /// accepted-class mask all move to the surviving halt, then `from` is
    /// destroyed. Schedule stops referencing the absorbed halt must be
    /// rewritten separately (`ScheduleBook::replace_halt`).
    pub fn merge_halts(&mut self, into: HaltHandle, from: HaltHandle) -> bool {
        if into == from || !self.is_live(into) || !self.is_live(from) {
            return false;
        }

        let from_halt = {
            let slot = &mut self.slots[from.index as usize];
            let halt = slot.halt.take().expect("live slot holds a halt");
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(from.index);
            halt
        };
        for tile in &from_halt.tiles {
            for cell in coverage_cells(*tile) {
                self.remove_coverage_entry(cell, from);
            }
        }

        let mut from_halt = from_halt;
        let packets = from_halt.drain_waiting();
        let from_caps: Vec<u32> = from_halt.capacities().to_vec();
        let from_tiles = std::mem::take(&mut from_halt.tiles);

        {
            let into_halt = self
                .get_mut(into)
                .expect("liveness checked above");
            into_halt.accepts = ClassMask(into_halt.accepts.0 | from_halt.accepts.0);
            for (catg, cap) in from_caps.iter().enumerate() {
                let catg = catg as CatgIndex;
                let combined = into_halt.capacity(catg).saturating_add(*cap);
                into_halt.set_capacity(catg, combined);
            }
            for packet in packets {
                into_halt.store_waiting(packet);
            }
        }
        for tile in from_tiles {
            self.add_tile(into, tile);
        }

        self.topology_changes.push(from.index);
        self.topology_changes.push(into.index);
        true
    }

    /// Halt ownership changes hands (sale). Routing is owner-agnostic, so
    /// no topology change is logged.
    pub fn transfer_ownership(&mut self, handle: HaltHandle, new_owner: PlayerId) -> bool {
        match self.get_mut(handle) {
            Some(halt) => {
                halt.owner = new_owner;
                true
            }
            None => false,
        }
    }

    // -------------------------------------------------------------------------
    // Access
    // -------------------------------------------------------------------------

    pub fn is_live(&self, handle: HaltHandle) -> bool {
        self.slots
            .get(handle.index as usize)
            .is_some_and(|slot| slot.generation == handle.generation && slot.halt.is_some())
    }

    pub fn get(&self, handle: HaltHandle) -> Option<&Halt> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.halt.as_ref()
    }

    pub fn get_mut(&mut self, handle: HaltHandle) -> Option<&mut Halt> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.halt.as_mut()
    }

    /// Current handle for a slot index, if the slot holds a live halt.
    pub fn handle_of_slot(&self, index: u32) -> Option<HaltHandle> {
        let slot = self.slots.get(index as usize)?;
        slot.halt.as_ref().map(|_| HaltHandle {
            index,
            generation: slot.generation,
        })
    }

    /// All live halts in slot order (deterministic).
    pub fn iter_live(&self) -> impl Iterator<Item = (HaltHandle, &Halt)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.halt.as_ref().map(|halt| {
                (
                    HaltHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    halt,
                )
            })
        })
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.halt.is_some()).count()
    }

    /// Halts whose catchment covers a coordinate (stations overlapping a
    /// tile). The map layer's `halt_at` query.
    pub fn halts_at(&self, coord: Coord) -> &[HaltHandle] {
        self.coverage.get(&coord).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn take_topology_changes(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.topology_changes)
    }

    /// The full coverage index, iterated when freezing a network snapshot.
    pub(crate) fn coverage_entries(&self) -> impl Iterator<Item = (&Coord, &Vec<HaltHandle>)> {
        self.coverage.iter()
    }

    // -------------------------------------------------------------------------
    // Coverage index
    // -------------------------------------------------------------------------

    fn register_coverage(&mut self, handle: HaltHandle, tile: Coord) {
        for cell in coverage_cells(tile) {
            let entry = self.coverage.entry(cell).or_default();
            if !entry.contains(&handle) {
                entry.push(handle);
            }
        }
    }

    fn remove_coverage_entry(&mut self, cell: Coord, handle: HaltHandle) {
        if let Some(entry) = self.coverage.get_mut(&cell) {
            entry.retain(|h| *h != handle);
            if entry.is_empty() {
                self.coverage.remove(&cell);
            }
        }
    }
}

/// Cells within the catchment square of a tile.
fn coverage_cells(tile: Coord) -> impl Iterator<Item = Coord> {
    (-COVERAGE_RADIUS..=COVERAGE_RADIUS).flat_map(move |dy| {
        (-COVERAGE_RADIUS..=COVERAGE_RADIUS)
            .map(move |dx| Coord::new(tile.x + dx, tile.y + dy))
    })
}

fn chebyshev(a: Coord, b: Coord) -> i32 {
    (a.x - b.x).abs().max((a.y - b.y).abs())
}
