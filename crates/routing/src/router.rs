//! The `Router` facade: a read-only bundle of the frozen snapshot and the
//! active params, the explicit context everything outside this crate goes
//! through for routing queries. Constructing one is free; it borrows the
//! step's `RoutingSnapshot` and never touches mutable state.

use crate::cargo::RouteOutcome;
use crate::goods::CatgIndex;
use crate::halt::{HaltHandle, HaltId};
use crate::map::Coord;
use crate::params::RoutingParams;
use crate::search::{RoutingSnapshot, SearchResult, SearchSession};

pub struct Router<'a> {
    snapshot: &'a RoutingSnapshot,
    params: &'a RoutingParams,
}

impl<'a> Router<'a> {
    pub fn new(snapshot: &'a RoutingSnapshot, params: &'a RoutingParams) -> Self {
        Self { snapshot, params }
    }

    /// One-shot route search: a fresh session, used once. Exactly one of
    /// `Walked` / `Routed` / `Overcrowded` / `NoRoute` comes back.
    pub fn route_cargo(
        &self,
        origins: &[HaltHandle],
        dest: Coord,
        category: CatgIndex,
    ) -> SearchResult {
        self.open_session(category, origins).route_to(dest)
    }

    /// Convenience wrapper returning just the outcome.
    pub fn outcome(&self, origins: &[HaltHandle], dest: Coord, category: CatgIndex) -> RouteOutcome {
        self.route_cargo(origins, dest, category).outcome
    }

    /// Open a resumable session for many destinations sharing one origin
    /// set and category. The caller owns the session and is responsible
    /// for not reusing it across steps (`SearchSession::matches`).
    pub fn open_session(&self, category: CatgIndex, origins: &[HaltHandle]) -> SearchSession {
        SearchSession::new(self.snapshot.net.clone(), category, origins, self.params)
    }

    // -------------------------------------------------------------------------
    // Reachability hints (UI / diagnostics)
    // -------------------------------------------------------------------------

    /// Whether the halt is a transfer point for the category, per the
    /// frozen snapshot.
    pub fn is_transfer_halt(&self, halt: HaltHandle, category: CatgIndex) -> bool {
        self.snapshot
            .net
            .slot_of(halt)
            .is_some_and(|slot| self.snapshot.net.is_transfer(slot, category))
    }

    /// Connected-component id of the halt for the category. `None` means
    /// undecided (rebuild in flight) or a dead halt — callers must treat
    /// it as "cannot conclude", never as disconnected.
    pub fn component_id(&self, halt: HaltHandle, category: CatgIndex) -> Option<HaltId> {
        let slot = self.snapshot.net.slot_of(halt)?;
        let component = self.snapshot.net.component(slot, category);
        component.is_decided().then_some(component.0)
    }
}
