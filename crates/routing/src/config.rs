//! Compile-time constants shared across the routing engine.

/// Hard upper bound on goods categories. Per-halt category flags are stored
/// as fixed 256-bit masks, so the catalog may never grow past this.
pub const MAX_GOODS_CATEGORIES: usize = 256;

/// Catchment radius of a station tile, in map cells (Chebyshev). Every cell
/// within this radius of any halt tile is "covered" by that halt.
pub const COVERAGE_RADIUS: i32 = 2;

/// Default walking range in map cells. Destinations within this Manhattan
/// distance of an origin halt are reached on foot, bypassing the network.
pub const DEFAULT_WALKING_RANGE: u32 = 8;

/// Safety bound on route-search depth (hops). A path longer than this is
/// abandoned; real networks stay far below it.
pub const DEFAULT_MAX_HOPS: u8 = 32;

/// Default per-category waiting capacity for a freshly created halt.
pub const DEFAULT_HALT_CAPACITY: u32 = 64;

/// Connection-weight policy: scale divided by departures per month.
pub const WEIGHT_FREQUENCY_SCALE: u32 = 480;

/// Connection-weight policy: scale divided by (capacity + 1).
pub const WEIGHT_CAPACITY_SCALE: u32 = 64;

/// Connection-weight policy: cap on the speed bonus subtracted from the
/// frequency/capacity terms.
pub const SPEED_BONUS_CAP: u32 = 8;

/// Sentinel slot index meaning "no halt" in search scratch state.
pub const SLOT_NONE: u32 = u32::MAX;
