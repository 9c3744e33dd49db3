//! Tunable routing parameters, grouped into a single saveable resource so
//! that a saved game replays with the exact policies it was played with.

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_MAX_HOPS, DEFAULT_WALKING_RANGE};
use crate::persistence::{decode_or_warn, Saveable};

/// Overcrowding policies. Both are external configuration, not derived
/// state: flipping them takes effect on the next search without any rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct PolicyParams {
    /// Do not route cargo *through* (or to) an overcrowded halt. Consulted
    /// directly by the route search.
    pub route_around_overcrowded: bool,
    /// Do not let freshly generated cargo *wait* at an overcrowded halt.
    /// Consulted by the cargo-generation layer via `Halt::can_accept`, not
    /// by the search itself.
    pub hold_at_overcrowded: bool,
}

impl Default for PolicyParams {
    fn default() -> Self {
        Self {
            route_around_overcrowded: false,
            hold_at_overcrowded: false,
        }
    }
}

/// Route-search tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct SearchParams {
    /// Destinations within this Manhattan distance of an origin halt are
    /// reached on foot.
    pub walking_range: u32,
    /// Safety bound on path length in hops.
    pub max_hops: u8,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            walking_range: DEFAULT_WALKING_RANGE,
            max_hops: DEFAULT_MAX_HOPS,
        }
    }
}

#[derive(
    Resource, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Encode, Decode,
)]
pub struct RoutingParams {
    pub policy: PolicyParams,
    pub search: SearchParams,
}

impl Saveable for RoutingParams {
    const SAVE_KEY: &'static str = "routing_params";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        if *self == RoutingParams::default() {
            return None;
        }
        Some(bitcode::encode(self))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        decode_or_warn(Self::SAVE_KEY, bytes)
    }
}

// =============================================================================
// Plugin
// =============================================================================

pub struct RoutingParamsPlugin;

impl Plugin for RoutingParamsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RoutingParams>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_skips_save() {
        assert!(RoutingParams::default().save_to_bytes().is_none());
    }

    #[test]
    fn test_roundtrip_non_default() {
        let mut params = RoutingParams::default();
        params.policy.route_around_overcrowded = true;
        params.search.walking_range = 3;
        let bytes = params.save_to_bytes().unwrap();
        assert_eq!(RoutingParams::load_from_bytes(&bytes), params);
    }
}
