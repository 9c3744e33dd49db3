//! Service (line / lineless convoy) data types.

use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::goods::CategoryMask;
use crate::halt::{HaltHandle, PlayerId};

/// Stable service identifier within one `ScheduleBook`.
pub type ServiceId = u32;

/// Whether a schedule belongs to a player-managed line (shared by many
/// convoys) or to a single lineless convoy. Routing treats both the same;
/// the distinction matters for service counting and for the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum ServiceKind {
    Line,
    Convoy,
}

/// Quality of a scheduled service, the inputs to the connection-weight
/// policy. Lower resulting weight = better service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct ServiceQuality {
    /// Average departures per game month over the whole schedule.
    pub departures_per_month: u32,
    /// Average cargo capacity per departure.
    pub capacity: u32,
    /// Average speed of the vehicles running this service.
    pub speed: u32,
}

impl Default for ServiceQuality {
    fn default() -> Self {
        Self {
            departures_per_month: 4,
            capacity: 60,
            speed: 50,
        }
    }
}

/// One scheduled service: an ordered stop list plus the goods categories it
/// carries. Everything the connection graph derives from lives here.
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct Service {
    pub id: ServiceId,
    pub owner: PlayerId,
    pub kind: ServiceKind,
    /// Stops in schedule order. Weak handles: a stop whose halt has been
    /// destroyed simply contributes no connections.
    pub stops: Vec<HaltHandle>,
    /// Categories enabled on this service.
    pub categories: CategoryMask,
    pub quality: ServiceQuality,
}
