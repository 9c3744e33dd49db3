//! Unit tests for halt lifecycle, coverage, and overcrowding.

#[cfg(test)]
mod tests {
    use crate::cargo::{CargoPacket, RouteAnnotation};
    use crate::goods::{CargoClass, ClassMask};
    use crate::halt::{HaltRegistry, PlayerId};
    use crate::map::Coord;

    const OWNER: PlayerId = 0;

    fn all_classes() -> ClassMask {
        ClassMask::ALL
    }

    #[test]
    fn test_create_and_lookup() {
        let mut registry = HaltRegistry::default();
        let a = registry.create_halt(OWNER, all_classes(), Coord::new(5, 5));
        assert!(registry.is_live(a));
        assert_eq!(registry.get(a).unwrap().tiles, vec![Coord::new(5, 5)]);
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_stable_ids_never_reused() {
        let mut registry = HaltRegistry::default();
        let a = registry.create_halt(OWNER, all_classes(), Coord::new(0, 0));
        let id_a = registry.get(a).unwrap().id;
        registry.destroy_halt(a);
        let b = registry.create_halt(OWNER, all_classes(), Coord::new(1, 1));
        assert_ne!(registry.get(b).unwrap().id, id_a);
    }

    #[test]
    fn test_stale_handle_after_destroy() {
        let mut registry = HaltRegistry::default();
        let a = registry.create_halt(OWNER, all_classes(), Coord::new(0, 0));
        registry.destroy_halt(a);
        assert!(!registry.is_live(a));
        assert!(registry.get(a).is_none());

        // Slot reuse must not resurrect the old handle.
        let b = registry.create_halt(OWNER, all_classes(), Coord::new(2, 2));
        assert_eq!(b.index, a.index);
        assert!(registry.get(a).is_none());
        assert!(registry.is_live(b));
    }

    #[test]
    fn test_last_tile_removal_destroys_halt() {
        let mut registry = HaltRegistry::default();
        let a = registry.create_halt(OWNER, all_classes(), Coord::new(4, 4));
        assert!(registry.add_tile(a, Coord::new(4, 5)));
        assert!(!registry.remove_tile(a, Coord::new(4, 4)));
        assert!(registry.is_live(a));
        assert!(registry.remove_tile(a, Coord::new(4, 5)));
        assert!(!registry.is_live(a));
        assert!(registry.halts_at(Coord::new(4, 5)).is_empty());
    }

    #[test]
    fn test_coverage_index() {
        let mut registry = HaltRegistry::default();
        let a = registry.create_halt(OWNER, all_classes(), Coord::new(10, 10));
        // Within the catchment square.
        assert_eq!(registry.halts_at(Coord::new(12, 10)), &[a]);
        assert_eq!(registry.halts_at(Coord::new(8, 12)), &[a]);
        // Outside it.
        assert!(registry.halts_at(Coord::new(13, 10)).is_empty());

        // A second overlapping halt shows up at shared cells.
        let b = registry.create_halt(OWNER, all_classes(), Coord::new(13, 10));
        assert_eq!(registry.halts_at(Coord::new(12, 10)), &[a, b]);
    }

    #[test]
    fn test_coverage_survives_partial_tile_removal() {
        let mut registry = HaltRegistry::default();
        let a = registry.create_halt(OWNER, all_classes(), Coord::new(10, 10));
        registry.add_tile(a, Coord::new(11, 10));
        // (13,10) covered only by the second tile.
        assert_eq!(registry.halts_at(Coord::new(13, 10)), &[a]);
        registry.remove_tile(a, Coord::new(11, 10));
        assert!(registry.halts_at(Coord::new(13, 10)).is_empty());
        // Still covered by the remaining tile.
        assert_eq!(registry.halts_at(Coord::new(12, 10)), &[a]);
    }

    #[test]
    fn test_overcrowding_tracks_waiting_and_capacity() {
        let mut registry = HaltRegistry::default();
        let a = registry.create_halt(OWNER, all_classes(), Coord::new(0, 0));
        let halt = registry.get_mut(a).unwrap();
        halt.set_capacity(0, 10);
        assert!(!halt.is_overcrowded(0));

        halt.store_waiting(CargoPacket::new(0, 8, Coord::new(9, 9)));
        assert!(!halt.is_overcrowded(0));
        halt.store_waiting(CargoPacket::new(0, 5, Coord::new(7, 7)));
        assert!(halt.is_overcrowded(0));
        assert_eq!(halt.waiting_amount(0), 13);

        // Taking cargo clears the bit again.
        halt.take_waiting(0, Coord::new(7, 7));
        assert!(!halt.is_overcrowded(0));

        // Shrinking capacity can set it without any waiting change.
        halt.set_capacity(0, 4);
        assert!(halt.is_overcrowded(0));
    }

    #[test]
    fn test_store_waiting_merges_same_destination() {
        let mut registry = HaltRegistry::default();
        let a = registry.create_halt(OWNER, all_classes(), Coord::new(0, 0));
        let halt = registry.get_mut(a).unwrap();
        halt.store_waiting(CargoPacket::new(1, 3, Coord::new(5, 5)));
        halt.store_waiting(CargoPacket::new(1, 4, Coord::new(5, 5)));
        let packets: Vec<_> = halt.iter_waiting(1).collect();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].amount, 7);
    }

    #[test]
    fn test_annotate_route() {
        let mut registry = HaltRegistry::default();
        let a = registry.create_halt(OWNER, all_classes(), Coord::new(0, 0));
        let b = registry.create_halt(OWNER, all_classes(), Coord::new(20, 20));
        let halt = registry.get_mut(a).unwrap();
        halt.store_waiting(CargoPacket::new(0, 1, Coord::new(20, 20)));
        assert!(halt.annotate_route(0, Coord::new(20, 20), RouteAnnotation::Via(b)));
        assert_eq!(
            halt.iter_waiting(0).next().unwrap().route,
            RouteAnnotation::Via(b)
        );
        assert!(!halt.annotate_route(0, Coord::new(1, 1), RouteAnnotation::Walking));
    }

    #[test]
    fn test_merge_halts() {
        let mut registry = HaltRegistry::default();
        let a = registry.create_halt(OWNER, CargoClass::Passengers.mask(), Coord::new(0, 0));
        let b = registry.create_halt(1, CargoClass::Freight.mask(), Coord::new(30, 30));
        registry.get_mut(a).unwrap().set_capacity(0, 10);
        registry.get_mut(b).unwrap().set_capacity(0, 20);
        registry
            .get_mut(b)
            .unwrap()
            .store_waiting(CargoPacket::new(0, 6, Coord::new(40, 40)));

        assert!(registry.merge_halts(a, b));
        assert!(!registry.is_live(b));
        let merged = registry.get(a).unwrap();
        assert_eq!(merged.tiles.len(), 2);
        assert_eq!(merged.capacity(0), 30);
        assert_eq!(merged.waiting_amount(0), 6);
        assert!(merged.accepts.accepts(CargoClass::Passengers));
        assert!(merged.accepts.accepts(CargoClass::Freight));
        // The absorbed halt's coverage now points at the survivor.
        assert_eq!(registry.halts_at(Coord::new(30, 30)), &[a]);
    }

    #[test]
    fn test_merge_rejects_stale_or_self() {
        let mut registry = HaltRegistry::default();
        let a = registry.create_halt(OWNER, all_classes(), Coord::new(0, 0));
        let b = registry.create_halt(OWNER, all_classes(), Coord::new(9, 9));
        assert!(!registry.merge_halts(a, a));
        registry.destroy_halt(b);
        assert!(!registry.merge_halts(a, b));
    }

    #[test]
    fn test_transfer_ownership() {
        let mut registry = HaltRegistry::default();
        let a = registry.create_halt(0, all_classes(), Coord::new(0, 0));
        assert!(registry.transfer_ownership(a, 3));
        assert_eq!(registry.get(a).unwrap().owner, 3);
    }
}
