//! # TestNet — headless integration test harness for the routing engine
//!
//! A fluent builder wrapping `bevy::app::App` + `RoutingPlugin` for
//! exercising the full step loop (rebuild debouncing, snapshot freezing,
//! the parallel reroute pass) without a window or renderer.

use bevy::app::App;
use bevy::prelude::*;

use crate::cargo::{self, RouteOutcome};
use crate::goods::{CargoClass, CatgIndex, CategoryMask, ClassMask, GoodsCatalog};
use crate::halt::{HaltHandle, HaltRegistry};
use crate::map::Coord;
use crate::params::RoutingParams;
use crate::schedule::{ScheduleBook, ServiceId, ServiceKind, ServiceQuality};
use crate::search::RoutingSnapshot;
use crate::stats::RoutingStats;
use crate::RoutingPlugin;

/// A headless app wrapping `RoutingPlugin` for integration testing.
///
/// Builder methods set up halts, goods, and services; `tick()` advances
/// the simulation one step at a time and queries assert on the resulting
/// state.
pub struct TestNet {
    pub app: App,
}

impl TestNet {
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(RoutingPlugin);
        // One update so startup work runs before the first manual step.
        app.update();
        Self { app }
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    /// Advance n simulated steps (the `FixedUpdate` schedule, run
    /// directly, as wall-clock pacing is irrelevant to tests).
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().run_schedule(FixedUpdate);
        }
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    pub fn add_goods(&mut self, name: &str, class: CargoClass) -> CatgIndex {
        self.app
            .world_mut()
            .resource_mut::<GoodsCatalog>()
            .add_kind(name, class)
    }

    pub fn add_halt(&mut self, x: i32, y: i32) -> HaltHandle {
        self.app
            .world_mut()
            .resource_mut::<HaltRegistry>()
            .create_halt(0, ClassMask::ALL, Coord::new(x, y))
    }

    pub fn add_line(&mut self, stops: &[HaltHandle], catg: CatgIndex) -> ServiceId {
        self.add_line_quality(stops, catg, ServiceQuality::default())
    }

    pub fn add_line_quality(
        &mut self,
        stops: &[HaltHandle],
        catg: CatgIndex,
        quality: ServiceQuality,
    ) -> ServiceId {
        self.app.world_mut().resource_mut::<ScheduleBook>().add_service(
            0,
            ServiceKind::Line,
            stops.to_vec(),
            CategoryMask::single(catg),
            quality,
        )
    }

    pub fn remove_service(&mut self, id: ServiceId) -> bool {
        self.app
            .world_mut()
            .resource_mut::<ScheduleBook>()
            .remove_service(id)
    }

    // -----------------------------------------------------------------------
    // Routing entry points
    // -----------------------------------------------------------------------

    /// Generate cargo through the full pipeline (search + waiting storage
    /// + stats), against the current step's snapshot.
    pub fn generate(
        &mut self,
        origins: &[HaltHandle],
        dest: Coord,
        catg: CatgIndex,
        amount: u32,
    ) -> RouteOutcome {
        let origins = origins.to_vec();
        let world = self.app.world_mut();
        world.resource_scope(|world, mut registry: Mut<HaltRegistry>| {
            world.resource_scope(|world, mut stats: Mut<RoutingStats>| {
                let snapshot = world.resource::<RoutingSnapshot>();
                let params = world.resource::<RoutingParams>();
                cargo::generate_cargo(
                    &mut registry,
                    &mut stats,
                    snapshot,
                    params,
                    &origins,
                    dest,
                    catg,
                    amount,
                )
            })
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }

    pub fn registry(&self) -> &HaltRegistry {
        self.app.world().resource::<HaltRegistry>()
    }

    pub fn stats(&self) -> RoutingStats {
        *self.app.world().resource::<RoutingStats>()
    }

    pub fn snapshot(&self) -> &RoutingSnapshot {
        self.app.world().resource::<RoutingSnapshot>()
    }

    pub fn params(&self) -> RoutingParams {
        *self.app.world().resource::<RoutingParams>()
    }

    pub fn set_params(&mut self, params: RoutingParams) {
        *self.app.world_mut().resource_mut::<RoutingParams>() = params;
    }

    pub fn network_generation(&self) -> u64 {
        self.app
            .world()
            .resource::<crate::debounce::NetworkState>()
            .generation()
    }
}

impl Default for TestNet {
    fn default() -> Self {
        Self::new()
    }
}
