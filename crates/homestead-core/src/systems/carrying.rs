//! Carrying system - deposits hauled loads into the resource store

use hecs::Entity;

use crate::components::{BehaviorState, Carry, Citizen, Inventory};
use crate::events::EventBus;
use crate::world::World;

use super::resources::ResourceStore;

/// Deposit every load whose route has arrived and send the carrier back to Idle
pub fn carrying_system(world: &mut World, store: &mut ResourceStore, events: &EventBus) {
    let delivered: Vec<Entity> = world
        .query::<(&Citizen, &Carry)>()
        .into_iter()
        .filter(|e| world.get::<Carry>(*e).map(|c| c.route.arrived).unwrap_or(false))
        .collect();

    for entity in delivered {
        let Some(carry) = world.remove::<Carry>(entity) else {
            continue;
        };
        if let Some(mut inventory) = world.get_mut::<Inventory>(entity) {
            inventory.remove(carry.resource, carry.amount);
        }
        let stored = store.produce_and_notify(carry.resource, carry.amount, events);
        if let Some(mut citizen) = world.get_mut::<Citizen>(entity) {
            citizen.state = BehaviorState::Idle;
            citizen.target = None;
        }
        tracing::debug!(?entity, resource = ?carry.resource, stored, "load delivered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ResourceType, Route, Vec3};

    fn carrier(world: &mut World, arrived: bool) -> Entity {
        let mut citizen = Citizen::new("C");
        citizen.state = BehaviorState::Carrying;
        let mut inventory = Inventory::new();
        inventory.add(ResourceType::Stone, 4);
        let mut route = Route::new(Vec3::ZERO, 1.0);
        route.arrived = arrived;
        world.spawn((
            citizen,
            inventory,
            Carry {
                resource: ResourceType::Stone,
                amount: 4,
                route,
            },
        ))
    }

    #[test]
    fn test_arrived_load_is_deposited() {
        let mut world = World::new();
        let mut store = ResourceStore::new();
        let bus = EventBus::new();
        let entity = carrier(&mut world, true);

        carrying_system(&mut world, &mut store, &bus);

        assert_eq!(store.get(ResourceType::Stone), 4);
        assert!(!world.has::<Carry>(entity));
        assert!(world.get::<Inventory>(entity).unwrap().is_empty());
        assert_eq!(world.get::<Citizen>(entity).unwrap().state, BehaviorState::Idle);
    }

    #[test]
    fn test_load_in_transit_is_untouched() {
        let mut world = World::new();
        let mut store = ResourceStore::new();
        let bus = EventBus::new();
        let entity = carrier(&mut world, false);

        carrying_system(&mut world, &mut store, &bus);

        assert_eq!(store.get(ResourceType::Stone), 0);
        assert!(world.has::<Carry>(entity));
    }

    #[test]
    fn test_full_storage_discards_excess() {
        let mut world = World::new();
        let mut store = ResourceStore::new();
        store.set_capacity(ResourceType::Stone, 1);
        let bus = EventBus::new();
        carrier(&mut world, true);

        carrying_system(&mut world, &mut store, &bus);

        assert_eq!(store.get(ResourceType::Stone), 1);
    }
}
