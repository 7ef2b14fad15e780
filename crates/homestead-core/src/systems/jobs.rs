//! Job system - job reassignment, target planning and arrival hand-off.
//!
//! A citizen moves through `Idle -> PathFollowing -> (Gathering | Constructing)`.
//! Reassigning a job is a hard reset: every activity component is removed
//! and the citizen is Idle before any other system looks at it again.

use hecs::Entity;

use crate::components::{
    BehaviorState, Building, Carry, Citizen, ConstructionWork, Gathering, Inventory, JobAssignment,
    JobType, PathFollow, Position, ResourceNode, Vec3,
};
use crate::config::SimulationConfig;
use crate::error::JobError;
use crate::world::World;

use super::workers::{claim_slot, release_all};

/// Number of activity components (PathFollow, Gathering, Carry,
/// ConstructionWork) attached to an entity
pub fn activity_count(world: &World, entity: Entity) -> usize {
    [
        world.has::<PathFollow>(entity),
        world.has::<Gathering>(entity),
        world.has::<Carry>(entity),
        world.has::<ConstructionWork>(entity),
    ]
    .into_iter()
    .filter(|has| *has)
    .count()
}

/// Citizens holding more than one activity component. Always empty unless
/// a system has a bug.
pub fn activity_violations(world: &World) -> Vec<Entity> {
    world
        .query::<&Citizen>()
        .into_iter()
        .filter(|e| activity_count(world, *e) > 1)
        .collect()
}

/// Give a citizen a new job, cancelling whatever it was doing
pub fn assign_job(world: &mut World, entity: Entity, job: JobType) -> Result<(), JobError> {
    if !world.is_alive(entity) {
        return Err(JobError::NoSuchEntity(entity));
    }
    if !world.has::<Citizen>(entity) {
        return Err(JobError::NotACitizen(entity));
    }

    reset_to_idle(world, entity);
    if let Some(mut citizen) = world.get_mut::<Citizen>(entity) {
        citizen.job = job;
    }
    attach(world, entity, JobAssignment { job });

    tracing::debug!(?entity, ?job, "job assigned");
    Ok(())
}

/// Strip all activity state and return the citizen to Idle, keeping its job.
/// Cargo being carried is dropped, never deposited.
pub fn reset_to_idle(world: &mut World, entity: Entity) {
    release_all(world, entity);

    world.remove::<PathFollow>(entity);
    world.remove::<Gathering>(entity);
    world.remove::<ConstructionWork>(entity);
    if let Some(carry) = world.remove::<Carry>(entity) {
        if let Some(mut inventory) = world.get_mut::<Inventory>(entity) {
            inventory.remove(carry.resource, carry.amount);
        }
    }

    if let Some(mut citizen) = world.get_mut::<Citizen>(entity) {
        citizen.state = BehaviorState::Idle;
        citizen.target = None;
    }
}

/// Attach a component to an entity the caller has just checked is alive
pub(crate) fn attach<T: hecs::Component>(world: &mut World, entity: Entity, component: T) {
    let attached = world.add_component(entity, component);
    debug_assert!(attached.is_ok(), "attaching to dead entity {entity:?}");
    if attached.is_err() {
        tracing::warn!(?entity, "component dropped, entity no longer exists");
    }
}

fn position_of(world: &World, entity: Entity) -> Option<Vec3> {
    world.get::<Position>(entity).map(|p| p.0)
}

/// Pick a target for every idle citizen that has a job and start walking.
/// Citizens with nothing to do stay Idle and are retried next tick.
pub fn job_planner_system(world: &mut World, config: &SimulationConfig) {
    let idle: Vec<(Entity, JobType, Vec3)> = world
        .query::<(&Citizen, &Position)>()
        .into_iter()
        .filter(|e| activity_count(world, *e) == 0)
        .filter_map(|e| {
            let citizen = world.get::<Citizen>(e)?;
            let pos = position_of(world, e)?;
            (citizen.state == BehaviorState::Idle && citizen.job != JobType::Idle)
                .then(|| (e, citizen.job, pos))
        })
        .collect();

    for (entity, job, from) in idle {
        let def = job.def();
        let planned = if let Some(resource) = def.gathers {
            nearest_node(world, resource, from)
        } else if def.constructs {
            claim_construction_site(world, entity, from)
        } else {
            None
        };

        let Some((target, destination)) = planned else {
            tracing::trace!(?entity, ?job, "no target available");
            continue;
        };

        attach(world, entity, PathFollow::new(destination, config.walk_speed));
        if let Some(mut citizen) = world.get_mut::<Citizen>(entity) {
            citizen.state = BehaviorState::PathFollowing;
            citizen.target = Some(target);
        }
        tracing::debug!(?entity, ?job, ?target, "heading to target");
    }
}

/// Closest node of a resource type with something left to harvest
fn nearest_node(
    world: &World,
    resource: crate::components::ResourceType,
    from: Vec3,
) -> Option<(Entity, Vec3)> {
    let mut best: Option<(Entity, Vec3, f32)> = None;
    for entity in world.query::<(&ResourceNode, &Position)>() {
        let Some(node) = world.get::<ResourceNode>(entity) else {
            continue;
        };
        if node.resource != resource || node.is_depleted() {
            continue;
        }
        let Some(pos) = position_of(world, entity) else {
            continue;
        };
        let dist = pos.distance_squared(&from);
        if best.map_or(true, |(_, _, d)| dist < d) {
            best = Some((entity, pos, dist));
        }
    }
    best.map(|(e, p, _)| (e, p))
}

/// Unfinished building the citizen already holds a slot on, otherwise the
/// closest unfinished building with a free slot, which gets claimed
fn claim_construction_site(
    world: &mut World,
    citizen: Entity,
    from: Vec3,
) -> Option<(Entity, Vec3)> {
    let claimed = world.query::<(&Building, &Position)>().into_iter().find(|e| {
        world
            .get::<Building>(*e)
            .map(|b| !b.constructed && b.workers.contains(&citizen))
            .unwrap_or(false)
    });
    if let Some(site) = claimed {
        return position_of(world, site).map(|p| (site, p));
    }

    let mut candidates: Vec<(Entity, Vec3, f32)> = world
        .query::<(&Building, &Position)>()
        .into_iter()
        .filter_map(|e| {
            let building = world.get::<Building>(e)?;
            if building.constructed {
                return None;
            }
            let pos = position_of(world, e)?;
            Some((e, pos, pos.distance_squared(&from)))
        })
        .collect();
    // Stable sort keeps creation order among equally distant sites
    candidates.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));

    candidates
        .into_iter()
        .find(|(building, _, _)| claim_slot(world, *building, citizen).is_ok())
        .map(|(e, p, _)| (e, p))
}

/// Hand off from walking to the job's work activity once PathFollow is gone
pub fn arrival_system(world: &mut World, config: &SimulationConfig) {
    let arrived: Vec<(Entity, JobType, Option<Entity>)> = world
        .query::<&Citizen>()
        .into_iter()
        .filter(|e| !world.has::<PathFollow>(*e))
        .filter_map(|e| {
            let citizen = world.get::<Citizen>(e)?;
            (citizen.state == BehaviorState::PathFollowing).then(|| (e, citizen.job, citizen.target))
        })
        .collect();

    for (entity, job, target) in arrived {
        let def = job.def();
        let started = match target {
            Some(node) if def.gathers.is_some() => start_gathering(world, entity, node, config),
            Some(building) if def.constructs => start_construction(world, entity, building),
            _ => false,
        };
        if !started {
            tracing::debug!(?entity, ?job, "target gone on arrival, replanning");
            reset_to_idle(world, entity);
        }
    }
}

fn start_gathering(world: &mut World, entity: Entity, node: Entity, config: &SimulationConfig) -> bool {
    let Some(resource) = world
        .get::<ResourceNode>(node)
        .filter(|n| !n.is_depleted())
        .map(|n| n.resource)
    else {
        return false;
    };

    let gathering = Gathering {
        node,
        resource,
        progress: 0.0,
        duration: config.gather_duration,
        amount: config.gather_amount,
    };
    attach(world, entity, gathering);
    if let Some(mut citizen) = world.get_mut::<Citizen>(entity) {
        citizen.state = BehaviorState::Gathering;
    }
    true
}

fn start_construction(world: &mut World, entity: Entity, building: Entity) -> bool {
    let open = world
        .get::<Building>(building)
        .map(|b| !b.constructed && b.workers.contains(&entity))
        .unwrap_or(false);
    if !open {
        return false;
    }

    attach(
        world,
        entity,
        ConstructionWork {
            building,
            contributed: 0.0,
        },
    );
    if let Some(mut citizen) = world.get_mut::<Citizen>(entity) {
        citizen.state = BehaviorState::Constructing;
    }
    true
}
