//! Building worker slots.
//!
//! Worker lists hold plain entity ids. Nothing cascades when a citizen is
//! destroyed; every read here prunes ids that are no longer alive.

use std::collections::HashSet;

use hecs::Entity;

use crate::components::{Building, Citizen};
use crate::error::AssignError;
use crate::world::World;

use super::jobs::reset_to_idle;

/// Live workers of a building, pruning stale references as a side effect
pub fn live_workers(world: &mut World, building: Entity) -> Vec<Entity> {
    prune(world, building);
    world
        .get::<Building>(building)
        .map(|b| b.workers.clone())
        .unwrap_or_default()
}

fn prune(world: &mut World, building: Entity) {
    let live: HashSet<Entity> = match world.get::<Building>(building) {
        Some(b) => b
            .workers
            .iter()
            .copied()
            .filter(|w| world.is_alive(*w) && world.has::<Citizen>(*w))
            .collect(),
        None => return,
    };
    if let Some(mut b) = world.get_mut::<Building>(building) {
        let removed = b.prune_workers(|w| live.contains(&w));
        if removed > 0 {
            tracing::warn!(?building, removed, "pruned stale worker references");
        }
    }
}

/// Put a citizen in one of the building's worker slots.
/// Assigning an already listed worker is a no-op. A citizen works at one
/// building at a time: a successful assignment drops any other claim, and a
/// citizen busy at another building is reset to Idle first.
pub fn assign_worker(world: &mut World, building: Entity, citizen: Entity) -> Result<(), AssignError> {
    if !world.has::<Citizen>(citizen) {
        return Err(AssignError::NotACitizen(citizen));
    }
    if !world.has::<Building>(building) {
        return Err(AssignError::NoSuchBuilding(building));
    }
    prune(world, building);

    if let Some(b) = world.get::<Building>(building) {
        if b.workers.contains(&citizen) {
            return Ok(());
        }
        if !b.has_free_slot() {
            return Err(AssignError::SlotsFull {
                capacity: b.worker_slots,
            });
        }
    }

    let working_elsewhere = world
        .get::<Citizen>(citizen)
        .and_then(|c| c.target)
        .map(|t| t != building && world.has::<Building>(t))
        .unwrap_or(false);
    if working_elsewhere {
        reset_to_idle(world, citizen);
    } else {
        release_all(world, citizen);
    }
    claim_slot(world, building, citizen)
}

pub(crate) fn claim_slot(world: &mut World, building: Entity, citizen: Entity) -> Result<(), AssignError> {
    if !world.has::<Building>(building) {
        return Err(AssignError::NoSuchBuilding(building));
    }
    prune(world, building);

    let Some(mut b) = world.get_mut::<Building>(building) else {
        return Err(AssignError::NoSuchBuilding(building));
    };
    if b.workers.contains(&citizen) {
        return Ok(());
    }
    if !b.has_free_slot() {
        return Err(AssignError::SlotsFull {
            capacity: b.worker_slots,
        });
    }
    b.workers.push(citizen);
    Ok(())
}

/// Remove a citizen from every worker list it appears on.
/// Returns how many lists it was removed from.
pub fn release_all(world: &mut World, citizen: Entity) -> usize {
    let listed: Vec<Entity> = world
        .query::<&Building>()
        .into_iter()
        .filter(|b| {
            world
                .get::<Building>(*b)
                .map(|b| b.workers.contains(&citizen))
                .unwrap_or(false)
        })
        .collect();
    listed
        .into_iter()
        .filter(|b| release_worker(world, *b, citizen))
        .count()
}

/// Remove a citizen from a building's worker list. Harmless if either
/// entity is gone or the citizen was never listed.
pub fn release_worker(world: &mut World, building: Entity, citizen: Entity) -> bool {
    world
        .get_mut::<Building>(building)
        .map(|mut b| b.remove_worker(citizen))
        .unwrap_or(false)
}
