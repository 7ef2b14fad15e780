//! Starting settlement generation: a town center, its first citizens and
//! the resource nodes scattered around it

use hecs::Entity;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::world::World;

use super::names::generate_name;

/// Parameters for generating a new settlement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SettlementConfig {
    /// Jobs of the starting citizens, one citizen per entry
    pub starting_jobs: Vec<JobType>,
    pub trees: u32,
    pub rocks: u32,
    pub berry_bushes: u32,
    /// Nodes are placed in a ring between these distances from the origin
    pub min_node_distance: f32,
    pub max_node_distance: f32,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            starting_jobs: vec![
                JobType::Woodcutter,
                JobType::Woodcutter,
                JobType::Quarrier,
                JobType::Forager,
                JobType::Builder,
            ],
            trees: 12,
            rocks: 6,
            berry_bushes: 6,
            min_node_distance: 8.0,
            max_node_distance: 30.0,
        }
    }
}

/// Entities created by [`generate_settlement`]
#[derive(Debug, Clone, Default)]
pub struct SettlementLayout {
    pub town_center: Option<Entity>,
    pub citizens: Vec<Entity>,
    pub nodes: Vec<Entity>,
}

/// Spawn a constructed town center at the origin, the starting citizens
/// around it and resource nodes further out
pub fn generate_settlement(
    world: &mut World,
    config: &SettlementConfig,
    rng: &mut impl Rng,
) -> SettlementLayout {
    let town_center = world.spawn((
        Building::constructed(BuildingType::TownCenter),
        Position::new(0.0, 0.0),
        Selectable::default(),
    ));

    let citizens = config
        .starting_jobs
        .iter()
        .map(|job| {
            let position = ring_position(rng, 4.5, 6.0);
            spawn_citizen(world, generate_name(rng), *job, position)
        })
        .collect();

    let mut nodes = Vec::new();
    let kinds = [
        (ResourceType::Wood, config.trees, 40, false),
        (ResourceType::Stone, config.rocks, 60, false),
        (ResourceType::Food, config.berry_bushes, 15, true),
    ];
    for (resource, count, amount, regenerates) in kinds {
        for _ in 0..count {
            let position = ring_position(rng, config.min_node_distance, config.max_node_distance);
            nodes.push(spawn_resource_node(world, resource, amount, regenerates, position));
        }
    }

    tracing::info!(citizens = config.starting_jobs.len(), nodes = nodes.len(), "settlement generated");
    SettlementLayout {
        town_center: Some(town_center),
        citizens,
        nodes,
    }
}

/// Spawn a citizen with every component the behavior systems expect
pub fn spawn_citizen(world: &mut World, name: String, job: JobType, position: Vec3) -> Entity {
    world.spawn((
        Citizen::new(name).with_job(job),
        JobAssignment { job },
        Position(position),
        Inventory::new(),
        Selectable::default(),
    ))
}

/// Spawn a full resource node
pub fn spawn_resource_node(
    world: &mut World,
    resource: ResourceType,
    amount: u32,
    regenerates: bool,
    position: Vec3,
) -> Entity {
    world.spawn((
        ResourceNode::new(resource, amount, regenerates),
        Position(position),
        Selectable::default(),
    ))
}

fn ring_position(rng: &mut impl Rng, min: f32, max: f32) -> Vec3 {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let distance = if max > min { rng.gen_range(min..max) } else { min };
    Vec3::ground(angle.cos() * distance, angle.sin() * distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_settlement() {
        let mut world = World::new();
        let mut rng = StdRng::seed_from_u64(42);
        let config = SettlementConfig::default();

        let layout = generate_settlement(&mut world, &config, &mut rng);

        assert_eq!(layout.citizens.len(), 5);
        assert_eq!(layout.nodes.len(), 24);
        assert!(world.get::<Building>(layout.town_center.unwrap()).unwrap().constructed);
        for node in &layout.nodes {
            let distance = world.get::<Position>(*node).unwrap().0.length();
            assert!((7.99..=30.01).contains(&distance));
        }
        let jobs: Vec<JobType> = layout
            .citizens
            .iter()
            .map(|c| world.get::<Citizen>(*c).unwrap().job)
            .collect();
        assert_eq!(jobs, config.starting_jobs);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let positions = |seed| {
            let mut world = World::new();
            let mut rng = StdRng::seed_from_u64(seed);
            let layout = generate_settlement(&mut world, &SettlementConfig::default(), &mut rng);
            let positions: Vec<Vec3> = layout
                .nodes
                .iter()
                .map(|n| world.get::<Position>(*n).unwrap().0)
                .collect();
            positions
        };
        assert_eq!(positions(3), positions(3));
        assert_ne!(positions(3), positions(4));
    }
}
