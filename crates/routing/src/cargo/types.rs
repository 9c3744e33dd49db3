//! Cargo packet data types.

use crate::goods::CatgIndex;
use crate::halt::HaltHandle;
use crate::map::Coord;

/// Externally observable result of a cargo generation or re-route call.
/// Exactly one variant is produced per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Destination reachable on foot from an origin halt; no vehicle needed.
    Walked,
    /// Best reachable next-transfer halt to hand the cargo to: the *first*
    /// transfer halt on the cheapest path, not the last hop.
    Routed(HaltHandle),
    /// The network connects, but policy forbids using it right now
    /// (destination halts overcrowded).
    Overcrowded,
    /// No path and no walking option.
    NoRoute,
}

/// Routing decision attached to a cargo packet. Exactly one of the three
/// states holds after any route-search call:
/// a valid next-transfer halt, the walking shortcut, or unroutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAnnotation {
    /// No route is currently known. Freshly created packets start here and
    /// return here when a re-route finds the network no longer connects.
    /// Discarding such packets after bounded retries is the caller's policy.
    Unroutable,
    /// Hand the packet to this halt next; the vehicle layer carries it.
    Via(HaltHandle),
    /// The destination is within walking range; no vehicle is needed.
    Walking,
}

/// A unit of cargo (a bundle of passengers, mail, or freight) waiting at a
/// halt, bound for a final destination coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CargoPacket {
    pub category: CatgIndex,
    pub amount: u32,
    pub destination: Coord,
    pub route: RouteAnnotation,
}

impl CargoPacket {
    pub fn new(category: CatgIndex, amount: u32, destination: Coord) -> Self {
        Self {
            category,
            amount,
            destination,
            route: RouteAnnotation::Unroutable,
        }
    }

    /// Merge another packet for the same destination and category into this
    /// one. The newer packet's route annotation wins (it reflects the more
    /// recent search).
    pub fn absorb(&mut self, other: CargoPacket) {
        debug_assert_eq!(self.category, other.category);
        debug_assert_eq!(self.destination, other.destination);
        self.amount += other.amount;
        self.route = other.route;
    }
}
