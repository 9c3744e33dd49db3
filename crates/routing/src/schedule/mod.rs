//! Schedules: lines and lineless convoys, the source of truth the whole
//! connection graph is derived from.
//!
//! Every mutation of the [`ScheduleBook`] appends to an internal change log
//! recording which halts and categories were touched. The network debouncer
//! drains that log once per simulated step; nothing in this module touches
//! the derived graph directly.

pub mod state;
pub mod types;

pub use state::*;
pub use types::*;

use bevy::prelude::*;

// =============================================================================
// Plugin
// =============================================================================

pub struct SchedulePlugin;

impl Plugin for SchedulePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ScheduleBook>();
    }
}
