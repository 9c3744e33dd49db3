//! Unit tests for connection rebuild, weights, transfer classification,
//! and the component classifier.

#[cfg(test)]
mod tests {
    use crate::connections::{
        connection_weight, recompute_components, ComponentId, ConnectionGraph,
    };
    use crate::goods::{CategoryMask, ClassMask};
    use crate::halt::{HaltHandle, HaltRegistry};
    use crate::map::Coord;
    use crate::schedule::{ScheduleBook, ServiceKind, ServiceQuality};

    const CATG: u8 = 0;

    fn make_halts(registry: &mut HaltRegistry, n: usize) -> Vec<HaltHandle> {
        (0..n)
            .map(|i| {
                registry.create_halt(0, ClassMask::ALL, Coord::new(i as i32 * 20, 0))
            })
            .collect()
    }

    fn line(book: &mut ScheduleBook, stops: &[HaltHandle]) {
        book.add_service(
            0,
            ServiceKind::Line,
            stops.to_vec(),
            CategoryMask::single(CATG),
            ServiceQuality::default(),
        );
    }

    /// Full rebuild of one category, the way the debouncer drives it.
    fn rebuild_all(
        graph: &mut ConnectionGraph,
        registry: &HaltRegistry,
        book: &ScheduleBook,
    ) {
        graph.ensure_shape(registry.slot_count(), 1);
        for (handle, _) in registry.iter_live() {
            graph.rebuild_halt_category(handle, CATG, book, registry);
        }
        recompute_components(graph, registry, CATG);
        graph.propagate_transfer_flags(CATG);
    }

    #[test]
    fn test_weight_monotonicity() {
        let base = ServiceQuality::default();
        let more_frequent = ServiceQuality {
            departures_per_month: base.departures_per_month * 2,
            ..base
        };
        let bigger = ServiceQuality {
            capacity: base.capacity * 4,
            ..base
        };
        assert!(connection_weight(&more_frequent) <= connection_weight(&base));
        assert!(connection_weight(&bigger) <= connection_weight(&base));
        assert!(connection_weight(&base) >= 1);
    }

    #[test]
    fn test_all_pairs_within_service() {
        let mut registry = HaltRegistry::default();
        let halts = make_halts(&mut registry, 3);
        let mut book = ScheduleBook::default();
        line(&mut book, &halts);

        let mut graph = ConnectionGraph::default();
        rebuild_all(&mut graph, &registry, &book);

        // Every stop links directly to every other stop of the line.
        for (i, handle) in halts.iter().enumerate() {
            let link = graph.link(handle.index, CATG).unwrap();
            assert_eq!(link.connections.len(), 2, "halt {i} has all-pairs edges");
            assert_eq!(link.serving_services, 1);
            assert!(!link.is_transfer);
        }
    }

    #[test]
    fn test_adjacency_sorted_by_target_id() {
        let mut registry = HaltRegistry::default();
        let halts = make_halts(&mut registry, 4);
        let mut book = ScheduleBook::default();
        // Deliberately scrambled stop order.
        line(&mut book, &[halts[2], halts[0], halts[3], halts[1]]);

        let mut graph = ConnectionGraph::default();
        rebuild_all(&mut graph, &registry, &book);

        let link = graph.link(halts[2].index, CATG).unwrap();
        let ids: Vec<u32> = link.connections.iter().map(|c| c.target_id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut registry = HaltRegistry::default();
        let halts = make_halts(&mut registry, 3);
        let mut book = ScheduleBook::default();
        line(&mut book, &halts);

        let mut graph = ConnectionGraph::default();
        rebuild_all(&mut graph, &registry, &book);
        let first: Vec<_> = halts
            .iter()
            .map(|h| graph.link(h.index, CATG).unwrap().clone())
            .collect();

        rebuild_all(&mut graph, &registry, &book);
        for (handle, before) in halts.iter().zip(first.iter()) {
            let after = graph.link(handle.index, CATG).unwrap();
            assert_eq!(after.connections, before.connections);
            assert_eq!(after.component, before.component);
            assert_eq!(after.is_transfer, before.is_transfer);
        }
    }

    #[test]
    fn test_two_services_keep_min_weight() {
        let mut registry = HaltRegistry::default();
        let halts = make_halts(&mut registry, 2);
        let mut book = ScheduleBook::default();
        let slow = ServiceQuality {
            departures_per_month: 1,
            capacity: 10,
            speed: 1,
        };
        let fast = ServiceQuality {
            departures_per_month: 30,
            capacity: 200,
            speed: 120,
        };
        book.add_service(
            0,
            ServiceKind::Line,
            halts.clone(),
            CategoryMask::single(CATG),
            slow,
        );
        book.add_service(
            0,
            ServiceKind::Line,
            halts.clone(),
            CategoryMask::single(CATG),
            fast,
        );

        let mut graph = ConnectionGraph::default();
        rebuild_all(&mut graph, &registry, &book);

        let link = graph.link(halts[0].index, CATG).unwrap();
        assert_eq!(link.connections.len(), 1);
        assert_eq!(link.connections[0].weight, connection_weight(&fast));
        // Two services at both ends: both halts are transfers.
        assert!(link.is_transfer);
        assert!(link.connections[0].is_transfer);
    }

    #[test]
    fn test_transfer_classification_at_junction() {
        let mut registry = HaltRegistry::default();
        let halts = make_halts(&mut registry, 3);
        let mut book = ScheduleBook::default();
        line(&mut book, &[halts[0], halts[1]]);
        line(&mut book, &[halts[1], halts[2]]);

        let mut graph = ConnectionGraph::default();
        rebuild_all(&mut graph, &registry, &book);

        assert!(!graph.link(halts[0].index, CATG).unwrap().is_transfer);
        assert!(graph.link(halts[1].index, CATG).unwrap().is_transfer);
        assert!(!graph.link(halts[2].index, CATG).unwrap().is_transfer);

        // Incoming connections inherited the junction's flag.
        let from_a = graph.link(halts[0].index, CATG).unwrap();
        assert!(from_a.connections[0].is_transfer);
    }

    #[test]
    fn test_disabled_category_produces_no_edges() {
        let mut registry = HaltRegistry::default();
        let halts = make_halts(&mut registry, 2);
        let mut book = ScheduleBook::default();
        book.add_service(
            0,
            ServiceKind::Line,
            halts.clone(),
            CategoryMask::single(5),
            ServiceQuality::default(),
        );

        let mut graph = ConnectionGraph::default();
        rebuild_all(&mut graph, &registry, &book);

        let link = graph.link(halts[0].index, CATG).unwrap();
        assert!(link.connections.is_empty());
        assert_eq!(link.serving_services, 0);
    }

    #[test]
    fn test_dead_stop_contributes_nothing() {
        let mut registry = HaltRegistry::default();
        let halts = make_halts(&mut registry, 3);
        let mut book = ScheduleBook::default();
        line(&mut book, &halts);
        registry.destroy_halt(halts[1]);

        let mut graph = ConnectionGraph::default();
        rebuild_all(&mut graph, &registry, &book);

        let link = graph.link(halts[0].index, CATG).unwrap();
        assert_eq!(link.connections.len(), 1);
        assert_eq!(link.connections[0].target, halts[2]);
    }

    #[test]
    fn test_components_split_and_merge() {
        let mut registry = HaltRegistry::default();
        let halts = make_halts(&mut registry, 4);
        let mut book = ScheduleBook::default();
        line(&mut book, &[halts[0], halts[1]]);
        line(&mut book, &[halts[2], halts[3]]);

        let mut graph = ConnectionGraph::default();
        rebuild_all(&mut graph, &registry, &book);

        let comp = |g: &ConnectionGraph, h: HaltHandle| g.link(h.index, CATG).unwrap().component;
        assert_eq!(comp(&graph, halts[0]), comp(&graph, halts[1]));
        assert_eq!(comp(&graph, halts[2]), comp(&graph, halts[3]));
        assert_ne!(comp(&graph, halts[0]), comp(&graph, halts[2]));
        assert!(comp(&graph, halts[0]).is_decided());

        // Canonical labels: smallest halt id in each component.
        let id_of = |h: HaltHandle| registry.get(h).unwrap().id;
        assert_eq!(comp(&graph, halts[0]), ComponentId(id_of(halts[0])));
        assert_eq!(comp(&graph, halts[2]), ComponentId(id_of(halts[2])));

        // Bridge the two components and rebuild: one label everywhere.
        line(&mut book, &[halts[1], halts[2]]);
        rebuild_all(&mut graph, &registry, &book);
        assert_eq!(comp(&graph, halts[0]), comp(&graph, halts[3]));
        assert_eq!(comp(&graph, halts[0]), ComponentId(id_of(halts[0])));
    }

    #[test]
    fn test_isolated_halt_is_singleton_component() {
        let mut registry = HaltRegistry::default();
        let halts = make_halts(&mut registry, 3);
        let mut book = ScheduleBook::default();
        line(&mut book, &[halts[0], halts[1]]);

        let mut graph = ConnectionGraph::default();
        rebuild_all(&mut graph, &registry, &book);

        let lonely = graph.link(halts[2].index, CATG).unwrap().component;
        assert!(lonely.is_decided());
        assert_eq!(lonely, ComponentId(registry.get(halts[2]).unwrap().id));
        assert_ne!(lonely, graph.link(halts[0].index, CATG).unwrap().component);
    }
}
