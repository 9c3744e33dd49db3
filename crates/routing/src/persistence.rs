//! SAVE-031: Save/load for the routing engine's sources of truth.
//!
//! Only three resources persist: the schedule book, the goods catalog, and
//! the routing params. The connection graph, component ids, snapshots, and
//! all search scratch state are derived caches — they are never serialized
//! and are rebuilt from schedules alone. After a load the debouncer is
//! forced dirty via [`PostLoadRebuildPending`], so the first simulated step
//! reconstructs everything derived before any search runs.

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::goods::GoodsCatalog;
use crate::params::RoutingParams;
use crate::schedule::ScheduleBook;

// =============================================================================
// Saveable trait
// =============================================================================

/// Resources that persist into the save file's extension map. Each
/// implementor owns its serialization; `SAVE_KEY` must be stable across
/// versions.
pub trait Saveable: Resource + Default + Send + Sync + 'static {
    const SAVE_KEY: &'static str;

    /// Serialize to bytes. Return `None` to skip saving (resource at its
    /// default state).
    fn save_to_bytes(&self) -> Option<Vec<u8>>;

    /// Deserialize, falling back to `Default` on corrupt input.
    fn load_from_bytes(bytes: &[u8]) -> Self;
}

/// Decode via `bitcode::decode`, logging a warning and returning `Default`
/// on failure.
pub fn decode_or_warn<T: bitcode::DecodeOwned + Default>(key: &str, bytes: &[u8]) -> T {
    match bitcode::decode(bytes) {
        Ok(value) => value,
        Err(err) => {
            warn!(
                "Saveable {}: failed to decode {} bytes, falling back to default: {}",
                key,
                bytes.len(),
                err
            );
            T::default()
        }
    }
}

// =============================================================================
// World-level save/load
// =============================================================================

/// Marker resource inserted by [`load_world`]. The debouncer consumes it on
/// the next step and marks the whole network dirty, because every derived
/// structure is stale after a load.
#[derive(Resource, Default)]
pub struct PostLoadRebuildPending;

/// Collect the persisted routing state into an extension map.
pub fn save_world(world: &World) -> BTreeMap<String, Vec<u8>> {
    let mut extensions = BTreeMap::new();
    save_entry::<ScheduleBook>(world, &mut extensions);
    save_entry::<GoodsCatalog>(world, &mut extensions);
    save_entry::<RoutingParams>(world, &mut extensions);
    extensions
}

/// Restore persisted routing state from an extension map and schedule the
/// post-load rebuild. Resources whose key is absent keep their defaults.
pub fn load_world(world: &mut World, extensions: &BTreeMap<String, Vec<u8>>) {
    load_entry::<ScheduleBook>(world, extensions);
    load_entry::<GoodsCatalog>(world, extensions);
    load_entry::<RoutingParams>(world, extensions);
    world.insert_resource(PostLoadRebuildPending);
}

fn save_entry<T: Saveable>(world: &World, extensions: &mut BTreeMap<String, Vec<u8>>) {
    if let Some(bytes) = world.get_resource::<T>().and_then(|r| r.save_to_bytes()) {
        extensions.insert(T::SAVE_KEY.to_string(), bytes);
    }
}

fn load_entry<T: Saveable>(world: &mut World, extensions: &BTreeMap<String, Vec<u8>>) {
    if let Some(bytes) = extensions.get(T::SAVE_KEY) {
        world.insert_resource(T::load_from_bytes(bytes));
    }
}

// =============================================================================
// Saveable impls for the simple sources of truth
// =============================================================================

impl Saveable for GoodsCatalog {
    const SAVE_KEY: &'static str = "goods_catalog";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        if *self == GoodsCatalog::default() {
            return None;
        }
        Some(bitcode::encode(self))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        decode_or_warn(Self::SAVE_KEY, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goods::{CargoClass, CategoryMask};
    use crate::halt::HaltHandle;
    use crate::schedule::{ServiceKind, ServiceQuality};

    #[test]
    fn test_save_load_roundtrip_marks_post_load() {
        let mut world = World::new();
        let mut book = ScheduleBook::default();
        let a = HaltHandle {
            index: 0,
            generation: 0,
        };
        let b = HaltHandle {
            index: 1,
            generation: 0,
        };
        book.add_service(
            0,
            ServiceKind::Line,
            vec![a, b],
            CategoryMask::single(0),
            ServiceQuality::default(),
        );
        let mut catalog = GoodsCatalog::default();
        catalog.add_kind("coal", CargoClass::Freight);
        world.insert_resource(book);
        world.insert_resource(catalog);
        world.insert_resource(RoutingParams::default());

        let extensions = save_world(&world);
        assert!(extensions.contains_key(ScheduleBook::SAVE_KEY));
        assert!(extensions.contains_key(GoodsCatalog::SAVE_KEY));

        let mut fresh = World::new();
        fresh.insert_resource(ScheduleBook::default());
        fresh.insert_resource(GoodsCatalog::default());
        fresh.insert_resource(RoutingParams::default());
        load_world(&mut fresh, &extensions);

        assert_eq!(fresh.resource::<ScheduleBook>().len(), 1);
        assert_eq!(fresh.resource::<GoodsCatalog>().len(), 3);
        assert!(fresh.get_resource::<PostLoadRebuildPending>().is_some());
    }

    #[test]
    fn test_decode_or_warn_falls_back() {
        let catalog: GoodsCatalog = decode_or_warn("goods_catalog", &[0xFF, 0x01, 0x02]);
        assert_eq!(catalog.len(), GoodsCatalog::default().len());
    }
}
