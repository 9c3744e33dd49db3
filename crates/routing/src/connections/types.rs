//! Connection-graph data types.

use crate::halt::{HaltHandle, HaltId};

/// Connected-component label for one (halt, category) pair. Conventionally
/// the smallest `HaltId` in the component, which makes the label canonical
/// and independent of traversal order.
///
/// `UNDECIDED` means a component pass is in progress (or has never run for
/// this pair). Callers must treat it as "cannot conclude" — never as
/// connected, never as disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentId(pub u32);

impl ComponentId {
    pub const UNDECIDED: ComponentId = ComponentId(u32::MAX);

    pub fn is_decided(self) -> bool {
        self != Self::UNDECIDED
    }
}

impl Default for ComponentId {
    fn default() -> Self {
        ComponentId::UNDECIDED
    }
}

/// A direct service connection from one halt to another for one goods
/// category: at least one schedule links the two halts with the category
/// enabled. Weight is the service-quality figure (lower = better); when
/// several services link the same pair, the best weight wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    /// Weak handle; a dead target contributes nothing at read time.
    pub target: HaltHandle,
    /// Stable id of the target, the deterministic sort key of adjacency
    /// lists and of all tie-breaks.
    pub target_id: HaltId,
    pub weight: u32,
    /// Whether the target is a transfer halt for this category, inherited
    /// from the target's classification in a finalize pass after rebuild.
    pub is_transfer: bool,
}

/// Derived per-(halt, category) link state: the adjacency list plus the
/// classification results. Recomputed wholesale during a rebuild pass,
/// never patched line-by-line.
#[derive(Debug, Clone, Default)]
pub struct LinkState {
    /// Connections ordered by target halt id.
    pub connections: Vec<Connection>,
    /// Number of distinct services stopping here with this category
    /// enabled.
    pub serving_services: u16,
    /// A halt is a transfer halt when two or more distinct services serve
    /// it for this category — a place cargo can change services. A halt
    /// served end-to-end by a single line is not a transfer point.
    pub is_transfer: bool,
    pub component: ComponentId,
}
