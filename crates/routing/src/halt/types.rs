//! Halt data types: stable ids, generation-checked handles, and the halt
//! entity itself.

use std::collections::BTreeMap;

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::cargo::{CargoPacket, RouteAnnotation};
use crate::config::DEFAULT_HALT_CAPACITY;
use crate::goods::{CatgIndex, CategoryMask, ClassMask};
use crate::map::Coord;

/// Stable halt identifier, unique for the session and never reused.
/// Component ids and all deterministic tie-breaks are expressed in terms of
/// `HaltId`, not slot indices.
pub type HaltId = u32;

/// Owning player.
pub type PlayerId = u8;

// =============================================================================
// Handles
// =============================================================================

/// Weak reference to a halt: a slot index plus the slot generation at the
/// time the handle was taken. Halts are destroyed and recreated during play
/// (mergers, removal), so everything outside the registry holds handles and
/// checks liveness on access; a stale handle resolves to `None`, never to a
/// different halt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
    Encode, Decode,
)]
pub struct HaltHandle {
    pub index: u32,
    pub generation: u32,
}

// =============================================================================
// Halt
// =============================================================================

/// A station entity. Cargo waits here, keyed by goods category and final
/// destination; capacity and the derived overcrowded bit are tracked per
/// category.
#[derive(Debug, Clone)]
pub struct Halt {
    pub id: HaltId,
    pub owner: PlayerId,
    /// Cargo super-classes this halt accepts at all.
    pub accepts: ClassMask,
    /// Physical station tiles. Never empty: a halt whose last tile is
    /// removed is destroyed by the registry.
    pub tiles: Vec<Coord>,
    capacity: Vec<u32>,
    overcrowded: CategoryMask,
    waiting: Vec<BTreeMap<Coord, CargoPacket>>,
}

impl Halt {
    pub(crate) fn new(id: HaltId, owner: PlayerId, accepts: ClassMask, tile: Coord) -> Self {
        Self {
            id,
            owner,
            accepts,
            tiles: vec![tile],
            capacity: Vec::new(),
            overcrowded: CategoryMask::EMPTY,
            waiting: Vec::new(),
        }
    }

    fn ensure_category(&mut self, catg: CatgIndex) {
        let needed = catg as usize + 1;
        if self.capacity.len() < needed {
            self.capacity.resize(needed, DEFAULT_HALT_CAPACITY);
        }
        if self.waiting.len() < needed {
            self.waiting.resize_with(needed, BTreeMap::new);
        }
    }

    // -------------------------------------------------------------------------
    // Capacity and overcrowding
    // -------------------------------------------------------------------------

    pub fn capacity(&self, catg: CatgIndex) -> u32 {
        self.capacity
            .get(catg as usize)
            .copied()
            .unwrap_or(DEFAULT_HALT_CAPACITY)
    }

    pub fn set_capacity(&mut self, catg: CatgIndex, capacity: u32) {
        self.ensure_category(catg);
        self.capacity[catg as usize] = capacity;
        self.update_overcrowded(catg);
    }

    /// Total waiting amount for a category across all destinations.
    pub fn waiting_amount(&self, catg: CatgIndex) -> u32 {
        self.waiting
            .get(catg as usize)
            .map(|dests| dests.values().map(|packet| packet.amount).sum())
            .unwrap_or(0)
    }

    /// Overcrowded = waiting cargo exceeds capacity. The bit is recomputed
    /// on every waiting or capacity mutation, never lazily.
    pub fn is_overcrowded(&self, catg: CatgIndex) -> bool {
        self.overcrowded.get(catg)
    }

    pub fn overcrowded_mask(&self) -> CategoryMask {
        self.overcrowded
    }

    /// Whether newly generated cargo may start waiting here. Consulted by
    /// the cargo-generation layer when the "do not let cargo wait at an
    /// overcrowded halt" policy is active.
    pub fn can_accept(&self, catg: CatgIndex, hold_at_overcrowded: bool) -> bool {
        !(hold_at_overcrowded && self.is_overcrowded(catg))
    }

    fn update_overcrowded(&mut self, catg: CatgIndex) {
        if self.waiting_amount(catg) > self.capacity(catg) {
            self.overcrowded.set(catg);
        } else {
            self.overcrowded.clear(catg);
        }
    }

    // -------------------------------------------------------------------------
    // Waiting cargo
    // -------------------------------------------------------------------------

    /// Add a packet to the waiting store, merging with any packet already
    /// bound for the same destination.
    pub fn store_waiting(&mut self, packet: CargoPacket) {
        let catg = packet.category;
        self.ensure_category(catg);
        let dests = &mut self.waiting[catg as usize];
        match dests.get_mut(&packet.destination) {
            Some(existing) => existing.absorb(packet),
            None => {
                dests.insert(packet.destination, packet);
            }
        }
        self.update_overcrowded(catg);
    }

    /// Remove and return the packet bound for `destination`, if any. Used
    /// by the vehicle layer when loading cargo.
    pub fn take_waiting(&mut self, catg: CatgIndex, destination: Coord) -> Option<CargoPacket> {
        let packet = self
            .waiting
            .get_mut(catg as usize)
            .and_then(|dests| dests.remove(&destination));
        if packet.is_some() {
            self.update_overcrowded(catg);
        }
        packet
    }

    /// Waiting packets for a category, in destination order.
    pub fn iter_waiting(&self, catg: CatgIndex) -> impl Iterator<Item = &CargoPacket> {
        self.waiting
            .get(catg as usize)
            .into_iter()
            .flat_map(|dests| dests.values())
    }

    /// Destinations with waiting cargo for a category, in coordinate order.
    pub fn waiting_destinations(&self, catg: CatgIndex) -> Vec<Coord> {
        self.waiting
            .get(catg as usize)
            .map(|dests| dests.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Rewrite the route annotation of the packet bound for `destination`.
    /// Returns false when no such packet waits here.
    pub fn annotate_route(
        &mut self,
        catg: CatgIndex,
        destination: Coord,
        route: RouteAnnotation,
    ) -> bool {
        match self
            .waiting
            .get_mut(catg as usize)
            .and_then(|dests| dests.get_mut(&destination))
        {
            Some(packet) => {
                packet.route = route;
                true
            }
            None => false,
        }
    }

    /// Drain all waiting cargo, used when merging halts.
    pub(crate) fn drain_waiting(&mut self) -> Vec<CargoPacket> {
        let drained = self
            .waiting
            .iter_mut()
            .flat_map(|dests| std::mem::take(dests).into_values())
            .collect();
        self.overcrowded = CategoryMask::EMPTY;
        drained
    }

    pub(crate) fn capacities(&self) -> &[u32] {
        &self.capacity
    }
}
