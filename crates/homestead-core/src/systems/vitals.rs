//! Vitals system - hunger, eating and starvation.
//!
//! This is the default vitals collaborator. Death destroys the entity
//! outright; worker lists and targets that still name it heal on read.

use hecs::Entity;

use crate::components::{Citizen, ResourceType, Selectable};
use crate::config::SimulationConfig;
use crate::events::{EventBus, GameEvent};
use crate::world::World;

use super::jobs::reset_to_idle;
use super::resources::ResourceStore;

/// Advance hunger and health for every citizen. Returns the citizens that
/// died this tick (already destroyed).
pub fn vitals_system(
    world: &mut World,
    store: &mut ResourceStore,
    events: &EventBus,
    config: &SimulationConfig,
    delta_seconds: f32,
) -> Vec<Entity> {
    let mut dead = Vec::new();

    for entity in world.query::<&Citizen>() {
        let Some(hunger) = world.get::<Citizen>(entity).map(|c| c.hunger) else {
            continue;
        };
        let mut hunger = (hunger + config.hunger_rate * delta_seconds).min(Citizen::MAX_HUNGER);

        if hunger >= config.eat_threshold && store.consume_and_notify(ResourceType::Food, 1, events) == 1 {
            hunger = (hunger - config.food_hunger_relief).max(0.0);
            tracing::trace!(?entity, hunger, "ate");
        }

        let Some(mut citizen) = world.get_mut::<Citizen>(entity) else {
            continue;
        };
        citizen.hunger = hunger;
        if hunger >= Citizen::MAX_HUNGER {
            citizen.health = (citizen.health - config.starvation_damage * delta_seconds).max(0.0);
        }
        if !citizen.is_alive() {
            dead.push(entity);
        }
    }

    for &entity in &dead {
        kill(world, events, entity);
    }
    dead
}

/// Remove a citizen from the world and announce it
pub fn kill(world: &mut World, events: &EventBus, entity: Entity) {
    let Some(name) = world.get::<Citizen>(entity).map(|c| c.name.clone()) else {
        return;
    };
    let was_selected = world.get::<Selectable>(entity).map(|s| s.selected).unwrap_or(false);

    // Release the worker slot eagerly; anything else referencing it heals on read
    reset_to_idle(world, entity);
    world.destroy(entity);

    tracing::info!(?entity, %name, "citizen died");
    if was_selected {
        events.emit(GameEvent::EntityDeselected { entity });
    }
    events.emit(GameEvent::CitizenDied { entity, name });
}
