//! Movement system - the default path-follow collaborator.
//!
//! Walks entities along their `PathFollow` route and removes it on arrival.
//! Carry routes are advanced the same way but flagged as arrived instead,
//! since the load is still being held until the carrying system deposits it.

use hecs::Entity;

use crate::components::{Carry, PathFollow, Position, Route, Vec3};
use crate::world::World;

/// Move walkers toward their destinations
pub fn movement_system(world: &mut World, delta_seconds: f32, arrival_radius: f32) {
    // Collect updates (can't mutate while iterating)
    let mut walkers: Vec<(Entity, Vec3, bool)> = Vec::new();
    for entity in world.query::<(&Position, &PathFollow)>() {
        let (Some(pos), Some(path)) = (world.get::<Position>(entity), world.get::<PathFollow>(entity)) else {
            continue;
        };
        let (next, arrived) = step_towards(pos.0, &path.route, delta_seconds, arrival_radius);
        walkers.push((entity, next, arrived));
    }

    for (entity, next, arrived) in walkers {
        if let Some(mut pos) = world.get_mut::<Position>(entity) {
            pos.0 = next;
        }
        if arrived {
            world.remove::<PathFollow>(entity);
        }
    }

    let mut carriers: Vec<(Entity, Vec3, bool)> = Vec::new();
    for entity in world.query::<(&Position, &Carry)>() {
        let (Some(pos), Some(carry)) = (world.get::<Position>(entity), world.get::<Carry>(entity)) else {
            continue;
        };
        if carry.route.arrived {
            continue;
        }
        let (next, arrived) = step_towards(pos.0, &carry.route, delta_seconds, arrival_radius);
        carriers.push((entity, next, arrived));
    }

    for (entity, next, arrived) in carriers {
        if let Some(mut pos) = world.get_mut::<Position>(entity) {
            pos.0 = next;
        }
        if let Some(mut carry) = world.get_mut::<Carry>(entity) {
            carry.route.arrived = arrived;
        }
    }
}

/// Advance one step along a straight route, returns new position and whether it arrived
fn step_towards(current: Vec3, route: &Route, delta_seconds: f32, arrival_radius: f32) -> (Vec3, bool) {
    let diff = route.destination - current;
    let distance = diff.length();
    let step = route.speed * delta_seconds;

    // Check if we've arrived (or will arrive this frame)
    if distance <= arrival_radius || step >= distance {
        (route.destination, true)
    } else {
        (current + diff.normalize() * step, false)
    }
}
