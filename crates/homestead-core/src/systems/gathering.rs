//! Gathering system - harvesting resource nodes and starting the haul home

use hecs::Entity;

use crate::components::{
    BehaviorState, Building, Carry, Citizen, Gathering, Inventory, Position, ResourceNode, Route,
    Vec3,
};
use crate::config::SimulationConfig;
use crate::world::World;

use super::jobs::{attach, reset_to_idle};

/// Progress every active harvest; finished loads become a Carry toward the
/// nearest drop-off
pub fn gathering_system(world: &mut World, config: &SimulationConfig, delta_seconds: f32) {
    let mut finished: Vec<(Entity, Gathering)> = Vec::new();
    let mut abandoned: Vec<Entity> = Vec::new();

    for entity in world.query::<(&Citizen, &Gathering)>() {
        let Some(mut gathering) = world.get::<Gathering>(entity).map(|g| *g) else {
            continue;
        };
        let node_ok = world
            .get::<ResourceNode>(gathering.node)
            .map(|n| !n.is_depleted())
            .unwrap_or(false);
        if !node_ok {
            abandoned.push(entity);
            continue;
        }
        gathering.progress += delta_seconds;
        if let Some(mut stored) = world.get_mut::<Gathering>(entity) {
            stored.progress = gathering.progress;
        }
        if gathering.is_complete() {
            finished.push((entity, gathering));
        }
    }

    for entity in abandoned {
        tracing::debug!(?entity, "resource node gone, abandoning harvest");
        reset_to_idle(world, entity);
    }

    for (entity, gathering) in finished {
        let harvested = world
            .get_mut::<ResourceNode>(gathering.node)
            .map(|mut n| n.harvest(gathering.amount))
            .unwrap_or(0);
        world.remove::<Gathering>(entity);

        if harvested == 0 {
            reset_to_idle(world, entity);
            continue;
        }

        let from = world.get::<Position>(entity).map(|p| p.0).unwrap_or(Vec3::ZERO);
        let destination = nearest_drop_off(world, from);
        let carry = Carry {
            resource: gathering.resource,
            amount: harvested,
            route: Route::new(destination, config.walk_speed),
        };
        attach(world, entity, carry);
        if let Some(mut inventory) = world.get_mut::<Inventory>(entity) {
            inventory.add(gathering.resource, harvested);
        }
        if let Some(mut citizen) = world.get_mut::<Citizen>(entity) {
            citizen.state = BehaviorState::Carrying;
            citizen.target = None;
        }
        tracing::debug!(?entity, resource = ?gathering.resource, harvested, "load harvested");
    }
}

/// Closest constructed drop-off building, or the settlement origin if none
pub fn nearest_drop_off(world: &World, from: Vec3) -> Vec3 {
    world
        .query::<(&Building, &Position)>()
        .into_iter()
        .filter_map(|e| {
            let building = world.get::<Building>(e)?;
            if !building.constructed || !building.def().drop_off {
                return None;
            }
            world.get::<Position>(e).map(|p| p.0)
        })
        .min_by(|a, b| {
            a.distance_squared(&from)
                .partial_cmp(&b.distance_squared(&from))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(Vec3::ZERO)
}

/// Restore units on regenerating nodes
pub fn regeneration_system(world: &mut World, config: &SimulationConfig, delta_seconds: f32) {
    for entity in world.query::<&ResourceNode>() {
        if let Some(mut node) = world.get_mut::<ResourceNode>(entity) {
            node.regenerate(delta_seconds, config.node_regen_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BuildingType, JobType, ResourceType};

    fn gatherer_at_node(world: &mut World, node_amount: u32) -> (Entity, Entity) {
        let mut node = ResourceNode::new(ResourceType::Wood, 10, false);
        node.amount = node_amount;
        let node = world.spawn((node, Position::new(4.0, 0.0)));
        let mut citizen = Citizen::new("G").with_job(JobType::Woodcutter);
        citizen.state = BehaviorState::Gathering;
        citizen.target = Some(node);
        let entity = world.spawn((
            citizen,
            Position::new(4.0, 0.0),
            Inventory::new(),
            Gathering {
                node,
                resource: ResourceType::Wood,
                progress: 0.0,
                duration: 2.0,
                amount: 5,
            },
        ));
        (entity, node)
    }

    #[test]
    fn test_harvest_completes_into_carry() {
        let mut world = World::new();
        let config = SimulationConfig::default();
        let depot = world.spawn((Building::constructed(BuildingType::Storehouse), Position::new(0.0, 3.0)));
        let _site = world.spawn((Building::new(BuildingType::Storehouse), Position::new(4.0, 1.0)));
        let (citizen, node) = gatherer_at_node(&mut world, 10);

        gathering_system(&mut world, &config, 1.0);
        assert!(world.has::<Gathering>(citizen));

        gathering_system(&mut world, &config, 1.0);
        assert!(!world.has::<Gathering>(citizen));
        assert_eq!(world.get::<ResourceNode>(node).unwrap().amount, 5);

        let carry = *world.get::<Carry>(citizen).unwrap();
        assert_eq!(carry.amount, 5);
        assert_eq!(carry.route.destination, world.get::<Position>(depot).unwrap().0);
        assert_eq!(world.get::<Citizen>(citizen).unwrap().state, BehaviorState::Carrying);
        assert_eq!(world.get::<Inventory>(citizen).unwrap().count(ResourceType::Wood), 5);
    }

    #[test]
    fn test_partial_harvest_takes_what_is_left() {
        let mut world = World::new();
        let (citizen, node) = gatherer_at_node(&mut world, 3);

        gathering_system(&mut world, &SimulationConfig::default(), 5.0);

        assert_eq!(world.get::<Carry>(citizen).unwrap().amount, 3);
        assert!(world.get::<ResourceNode>(node).unwrap().is_depleted());
        // No drop-off building: haul to the origin
        assert_eq!(world.get::<Carry>(citizen).unwrap().route.destination, Vec3::ZERO);
    }

    #[test]
    fn test_node_destroyed_mid_harvest() {
        let mut world = World::new();
        let (citizen, node) = gatherer_at_node(&mut world, 10);
        world.destroy(node);

        gathering_system(&mut world, &SimulationConfig::default(), 1.0);

        assert!(!world.has::<Gathering>(citizen));
        assert!(!world.has::<Carry>(citizen));
        assert_eq!(world.get::<Citizen>(citizen).unwrap().state, BehaviorState::Idle);
    }

    #[test]
    fn test_regeneration_system() {
        let mut world = World::new();
        let mut bush = ResourceNode::new(ResourceType::Food, 4, true);
        bush.amount = 1;
        let bush = world.spawn((bush,));
        let config = SimulationConfig {
            node_regen_interval: 1.0,
            ..Default::default()
        };

        regeneration_system(&mut world, &config, 2.5);
        assert_eq!(world.get::<ResourceNode>(bush).unwrap().amount, 3);
    }
}
