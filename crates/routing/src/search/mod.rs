//! Route search over the frozen network snapshot.
//!
//! Two entry shapes, one algorithm: a fresh [`SearchSession`] used once is
//! the one-shot search; a session kept across calls for the same origin
//! set and category is the resumable search the batch reroute pass uses.
//! Both read only the immutable [`NetworkSnapshot`], so any number of
//! sessions for *different* origins may run on worker threads at once.

pub mod session;
pub mod snapshot;

pub use session::*;
pub use snapshot::*;

use bevy::prelude::*;

// =============================================================================
// Plugin
// =============================================================================

pub struct SearchPlugin;

impl Plugin for SearchPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RoutingSnapshot>();
    }
}
