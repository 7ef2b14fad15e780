//! Settlement-wide derived values: population and storage capacity, plus
//! passive building production.

use crate::components::{Building, Citizen, ResourceType};
use crate::events::{EventBus, GameEvent};
use crate::world::World;

use super::resources::ResourceStore;

/// Sum of population provided by constructed buildings
pub fn population_capacity(world: &World) -> u32 {
    world
        .query::<&Building>()
        .into_iter()
        .filter_map(|e| world.get::<Building>(e).map(|b| b.population_contribution()))
        .sum()
}

/// Number of living citizens
pub fn population(world: &World) -> u32 {
    world.query::<&Citizen>().len() as u32
}

/// Per-resource storage capacity: the base plus every constructed storage building
pub fn storage_capacity(world: &World, base: u32) -> u32 {
    world
        .query::<&Building>()
        .into_iter()
        .filter_map(|e| world.get::<Building>(e).map(|b| b.storage_contribution()))
        .fold(base, |acc, s| acc.saturating_add(s))
}

/// Cached capacities, re-derived from the world every tick and after a load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettlementCache {
    pub population_capacity: u32,
    pub storage_capacity: u32,
}

impl SettlementCache {
    /// Compute fresh values without emitting anything
    pub fn derive(world: &World, base_storage: u32) -> Self {
        Self {
            population_capacity: population_capacity(world),
            storage_capacity: storage_capacity(world, base_storage),
        }
    }

    /// Recompute, apply storage caps to the store and announce population changes
    pub fn refresh(
        &mut self,
        world: &World,
        store: &mut ResourceStore,
        events: &EventBus,
        base_storage: u32,
    ) {
        let fresh = Self::derive(world, base_storage);

        if fresh.storage_capacity != self.storage_capacity {
            tracing::debug!(old = self.storage_capacity, new = fresh.storage_capacity, "storage capacity changed");
        }
        apply_storage(store, fresh.storage_capacity);

        let old = self.population_capacity;
        *self = fresh;
        if old != fresh.population_capacity {
            tracing::info!(old, new = fresh.population_capacity, "population capacity changed");
            events.emit(GameEvent::PopulationCapacityChanged {
                old,
                new: fresh.population_capacity,
            });
        }
    }
}

pub fn apply_storage(store: &mut ResourceStore, capacity: u32) {
    for resource in ResourceType::ALL {
        store.set_capacity(resource, capacity);
    }
}

/// Accumulate passive output of constructed buildings and deposit whole units
pub fn production_system(
    world: &mut World,
    store: &mut ResourceStore,
    events: &EventBus,
    delta_seconds: f32,
) {
    for entity in world.query::<&Building>() {
        let Some(mut building) = world.get_mut::<Building>(entity) else {
            continue;
        };
        let Some((resource, rate)) = building.def().produces else {
            continue;
        };
        if !building.constructed {
            continue;
        }

        building.production_progress += rate * delta_seconds;
        let whole = building.production_progress.floor();
        if whole < 1.0 {
            continue;
        }
        building.production_progress -= whole;
        drop(building);

        store.produce_and_notify(resource, whole as u32, events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BuildingType, Position};
    use crate::events::EventKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_only_constructed_buildings_count() {
        let mut world = World::new();
        world.spawn((Building::constructed(BuildingType::TownCenter),));
        let house = world.spawn((Building::new(BuildingType::House),));
        assert_eq!(population_capacity(&world), 5);

        world.get_mut::<Building>(house).unwrap().constructed = true;
        assert_eq!(population_capacity(&world), 9);
        assert_eq!(storage_capacity(&world, 50), 150);
    }

    #[test]
    fn test_refresh_emits_on_change_only() {
        let mut world = World::new();
        let mut store = ResourceStore::new();
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = bus.on(EventKind::PopulationCapacityChanged, move |e, _| sink.borrow_mut().push(e.clone()));

        let mut cache = SettlementCache::default();
        world.spawn((Building::constructed(BuildingType::House), Position::new(0.0, 0.0)));
        cache.refresh(&world, &mut store, &bus, 50);
        cache.refresh(&world, &mut store, &bus, 50);

        assert_eq!(*seen.borrow(), vec![GameEvent::PopulationCapacityChanged { old: 0, new: 4 }]);
        assert_eq!(store.capacity(ResourceType::Wood), Some(50));
    }

    #[test]
    fn test_farm_produces_whole_units() {
        let mut world = World::new();
        let mut store = ResourceStore::new();
        let bus = EventBus::new();
        let farm = world.spawn((Building::constructed(BuildingType::Farm),));
        world.spawn((Building::new(BuildingType::Farm),));

        // 0.2 food/s: nothing after 4s, one unit after 6s
        production_system(&mut world, &mut store, &bus, 4.0);
        assert_eq!(store.get(ResourceType::Food), 0);
        production_system(&mut world, &mut store, &bus, 2.0);
        assert_eq!(store.get(ResourceType::Food), 1);
        assert!((world.get::<Building>(farm).unwrap().production_progress - 0.2).abs() < 1e-4);
    }
}
