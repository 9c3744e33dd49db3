//! The `ScheduleBook`: source of truth for every scheduled service, plus
//! the change log the network debouncer drains once per step.

use std::collections::BTreeMap;

use bevy::prelude::*;
use bitcode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::goods::CategoryMask;
use crate::halt::HaltHandle;
use crate::persistence::{decode_or_warn, Saveable};

use super::types::{Service, ServiceId, ServiceKind, ServiceQuality};
use crate::halt::PlayerId;

/// A recorded schedule mutation: which halts were touched, for which
/// categories. Drained by the debouncer to mark dirty (halt, category)
/// pairs — this is the "schedules changed" notification.
#[derive(Debug, Clone)]
pub struct ScheduleChange {
    pub halts: Vec<HaltHandle>,
    pub categories: CategoryMask,
}

/// All currently active services, keyed by id. The connection graph and
/// component ids are derived from this book and are rebuildable from it
/// alone; only the book itself is ever persisted.
#[derive(Resource, Debug, Default)]
pub struct ScheduleBook {
    services: BTreeMap<ServiceId, Service>,
    next_id: ServiceId,
    changes: Vec<ScheduleChange>,
}

impl ScheduleBook {
    // -------------------------------------------------------------------------
    // Mutation (every entry point records a change)
    // -------------------------------------------------------------------------

    /// Register a new service. Returns its id.
    pub fn add_service(
        &mut self,
        owner: PlayerId,
        kind: ServiceKind,
        stops: Vec<HaltHandle>,
        categories: CategoryMask,
        quality: ServiceQuality,
    ) -> ServiceId {
        let id = self.next_id;
        self.next_id += 1;
        self.changes.push(ScheduleChange {
            halts: stops.clone(),
            categories,
        });
        self.services.insert(
            id,
            Service {
                id,
                owner,
                kind,
                stops,
                categories,
                quality,
            },
        );
        id
    }

    /// Replace the stops, categories, and quality of an existing service.
    /// Both the old and new stop sets are marked changed. Returns false for
    /// an unknown id.
    pub fn update_service(
        &mut self,
        id: ServiceId,
        stops: Vec<HaltHandle>,
        categories: CategoryMask,
        quality: ServiceQuality,
    ) -> bool {
        let Some(service) = self.services.get_mut(&id) else {
            return false;
        };
        let mut touched = service.categories;
        touched.union(&categories);
        let mut halts = service.stops.clone();
        halts.extend(stops.iter().copied());
        self.changes.push(ScheduleChange {
            halts,
            categories: touched,
        });
        service.stops = stops;
        service.categories = categories;
        service.quality = quality;
        true
    }

    /// Delete a service (line removed or convoy sold). Returns false for an
    /// unknown id.
    pub fn remove_service(&mut self, id: ServiceId) -> bool {
        match self.services.remove(&id) {
            Some(service) => {
                self.changes.push(ScheduleChange {
                    halts: service.stops,
                    categories: service.categories,
                });
                true
            }
            None => false,
        }
    }

    /// Rewrite every stop referencing `from` to `to` (halt merger). The
    /// affected services are recorded as changed; duplicate consecutive
    /// references produced by the rewrite are collapsed.
    pub fn replace_halt(&mut self, from: HaltHandle, to: HaltHandle) -> usize {
        let mut rewritten = 0;
        for service in self.services.values_mut() {
            if !service.stops.contains(&from) {
                continue;
            }
            for stop in &mut service.stops {
                if *stop == from {
                    *stop = to;
                }
            }
            service.stops.dedup();
            self.changes.push(ScheduleChange {
                halts: service.stops.clone(),
                categories: service.categories,
            });
            rewritten += 1;
        }
        rewritten
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn get(&self, id: ServiceId) -> Option<&Service> {
        self.services.get(&id)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// All services in id order (deterministic).
    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }

    /// Services that stop at `halt`, in id order.
    pub fn services_at(&self, halt: HaltHandle) -> impl Iterator<Item = &Service> {
        self.services
            .values()
            .filter(move |service| service.stops.contains(&halt))
    }

    /// Drain the pending change log. Called once per step by the debouncer.
    pub fn drain_changes(&mut self) -> Vec<ScheduleChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn has_pending_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

// =============================================================================
// Saveable implementation
// =============================================================================

/// Wire format: a flat service list plus the id allocator. The change log
/// is transient and deliberately not persisted — a loaded world starts with
/// the debouncer forced dirty instead.
#[derive(Serialize, Deserialize, Encode, Decode, Default)]
struct ScheduleBookPayload {
    services: Vec<Service>,
    next_id: ServiceId,
}

impl Saveable for ScheduleBook {
    const SAVE_KEY: &'static str = "schedule_book";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        if self.services.is_empty() {
            return None;
        }
        let payload = ScheduleBookPayload {
            services: self.services.values().cloned().collect(),
            next_id: self.next_id,
        };
        Some(bitcode::encode(&payload))
    }

    fn load_from_bytes(bytes: &[u8]) -> Self {
        let payload: ScheduleBookPayload = decode_or_warn(Self::SAVE_KEY, bytes);
        Self {
            services: payload
                .services
                .into_iter()
                .map(|service| (service.id, service))
                .collect(),
            next_id: payload.next_id,
            changes: Vec::new(),
        }
    }
}
