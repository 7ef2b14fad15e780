//! Save/Load functionality for persisting simulation state
//!
//! Uses bincode for binary serialization of the whole settlement. Each
//! entity is written with its id and every component as an optional, then
//! recreated under the same id on load so weak references stay valid.

use std::collections::{BTreeMap, HashSet};
use std::io::{Read, Write};

use hecs::Entity;
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::error::SnapshotError;
use crate::systems::{activity_count, attach, reset_to_idle, ResourceStore, TimeSystem};
use crate::world::World;

/// Version number for save file format (increment when format changes)
pub const SNAPSHOT_VERSION: u32 = 1;

/// Complete, self-consistent copy of the simulation state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Save format version
    pub version: u32,
    /// Clock, including simulation time and pause state
    pub time: TimeSystem,
    /// Resource ledger
    pub store: ResourceStore,
    /// All entities in creation order
    pub entities: Vec<SavedEntity>,
}

/// One entity and all of its components
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SavedEntity {
    /// `Entity::to_bits` of the live entity
    pub id: u64,

    // Citizens
    pub citizen: Option<Citizen>,
    pub job_assignment: Option<JobAssignment>,
    pub inventory: Option<Inventory>,

    // Activities
    pub path_follow: Option<PathFollow>,
    pub gathering: Option<Gathering>,
    pub carry: Option<Carry>,
    pub construction_work: Option<ConstructionWork>,

    // Structures and nodes
    pub building: Option<Building>,
    pub resource_node: Option<ResourceNode>,

    // Shared
    pub position: Option<Position>,
    pub selectable: Option<Selectable>,
}

impl SavedEntity {
    fn activity_count(&self) -> usize {
        [
            self.path_follow.is_some(),
            self.gathering.is_some(),
            self.carry.is_some(),
            self.construction_work.is_some(),
        ]
        .into_iter()
        .filter(|has| *has)
        .count()
    }
}

/// Copy every live entity out of the world
pub fn capture(world: &World, time: &TimeSystem, store: &ResourceStore) -> Snapshot {
    let entities = world
        .entities()
        .into_iter()
        .map(|entity| SavedEntity {
            id: entity.to_bits().get(),
            citizen: world.cloned(entity),
            job_assignment: world.cloned(entity),
            inventory: world.cloned(entity),
            path_follow: world.cloned(entity),
            gathering: world.cloned(entity),
            carry: world.cloned(entity),
            construction_work: world.cloned(entity),
            building: world.cloned(entity),
            resource_node: world.cloned(entity),
            position: world.cloned(entity),
            selectable: world.cloned(entity),
        })
        .collect();

    Snapshot {
        version: SNAPSHOT_VERSION,
        time: time.clone(),
        store: store.clone(),
        entities,
    }
}

/// State rebuilt from a snapshot
pub struct Restored {
    pub world: World,
    pub time: TimeSystem,
    pub store: ResourceStore,
}

/// Rebuild a world from a snapshot. The snapshot is validated before
/// anything is created; dangling references are pruned afterwards.
pub fn restore(snapshot: Snapshot) -> Result<Restored, SnapshotError> {
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::VersionMismatch {
            expected: SNAPSHOT_VERSION,
            found: snapshot.version,
        });
    }

    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(snapshot.entities.len());
    for saved in &snapshot.entities {
        let entity = Entity::from_bits(saved.id).ok_or(SnapshotError::InvalidEntity(saved.id))?;
        if !seen.insert(saved.id) {
            return Err(SnapshotError::DuplicateEntity(saved.id));
        }
        if saved.citizen.is_some() && saved.activity_count() > 1 {
            return Err(SnapshotError::ConflictingActivities(saved.id));
        }
        ids.push(entity);
    }

    let mut world = World::new();
    for (entity, saved) in ids.into_iter().zip(snapshot.entities) {
        world.create_at(entity);
        insert_components(&mut world, entity, saved);
    }
    heal_references(&mut world);

    tracing::info!(entities = world.len(), "snapshot restored");
    Ok(Restored {
        world,
        time: snapshot.time,
        store: snapshot.store,
    })
}

fn insert_components(world: &mut World, entity: Entity, saved: SavedEntity) {
    macro_rules! insert {
        ($($field:ident),* $(,)?) => {
            $(
                if let Some(c) = saved.$field {
                    attach(world, entity, c);
                }
            )*
        };
    }
    insert!(
        citizen,
        job_assignment,
        inventory,
        path_follow,
        gathering,
        carry,
        construction_work,
        building,
        resource_node,
        position,
        selectable,
    );
}

/// Drop worker ids and activity targets that do not resolve. A citizen
/// listed on several buildings keeps only its first slot.
fn heal_references(world: &mut World) {
    let mut placed: HashSet<Entity> = HashSet::new();
    for building in world.query::<&Building>() {
        let workers = match world.get::<Building>(building) {
            Some(b) => b.workers.clone(),
            None => continue,
        };
        let live: Vec<Entity> = workers
            .iter()
            .copied()
            .filter(|w| world.has::<Citizen>(*w) && placed.insert(*w))
            .collect();
        if live.len() != workers.len() {
            tracing::warn!(?building, dropped = workers.len() - live.len(), "dangling workers in snapshot");
            if let Some(mut b) = world.get_mut::<Building>(building) {
                b.workers = live;
            }
        }
    }

    for citizen in world.query::<&Citizen>() {
        let target = world.get::<Citizen>(citizen).and_then(|c| c.target);
        let target_gone = target.map(|t| !world.is_alive(t)).unwrap_or(false);
        let node_gone = world
            .get::<Gathering>(citizen)
            .map(|g| !world.has::<ResourceNode>(g.node))
            .unwrap_or(false);
        let site_gone = world
            .get::<ConstructionWork>(citizen)
            .map(|w| !world.has::<Building>(w.building))
            .unwrap_or(false);

        if target_gone || node_gone || site_gone {
            tracing::warn!(?citizen, "dangling activity target in snapshot, resetting");
            reset_to_idle(world, citizen);
        }
        debug_assert!(activity_count(world, citizen) <= 1);
    }
}

/// Write a snapshot with bincode
pub fn save_snapshot<W: Write>(writer: W, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    bincode::serialize_into(writer, snapshot)?;
    Ok(())
}

/// Read a bincode snapshot and check its version
pub fn load_snapshot<R: Read>(reader: R) -> Result<Snapshot, SnapshotError> {
    let snapshot: Snapshot = bincode::deserialize_from(reader)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::VersionMismatch {
            expected: SNAPSHOT_VERSION,
            found: snapshot.version,
        });
    }
    Ok(snapshot)
}

/// Human-readable overview of a snapshot
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SnapshotSummary {
    pub version: u32,
    pub sim_time: f64,
    pub paused: bool,
    pub time_scale: f32,
    pub resources: BTreeMap<ResourceType, u32>,
    pub citizens: usize,
    pub buildings: usize,
    pub constructed_buildings: usize,
    pub resource_nodes: usize,
}

impl Snapshot {
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            version: self.version,
            sim_time: self.time.sim_time(),
            paused: self.time.is_paused(),
            time_scale: self.time.time_scale(),
            resources: self.store.amounts().collect(),
            citizens: self.entities.iter().filter(|e| e.citizen.is_some()).count(),
            buildings: self.entities.iter().filter(|e| e.building.is_some()).count(),
            constructed_buildings: self
                .entities
                .iter()
                .filter(|e| e.building.as_ref().map(|b| b.constructed).unwrap_or(false))
                .count(),
            resource_nodes: self.entities.iter().filter(|e| e.resource_node.is_some()).count(),
        }
    }

    /// Pretty JSON of the summary
    pub fn summary_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_world() -> (World, Entity, Entity, Entity) {
        let mut world = World::new();
        let site = world.spawn((Building::new(BuildingType::House), Position::new(3.0, 0.0), Selectable::default()));
        let mut citizen = Citizen::new("Ida").with_job(JobType::Builder);
        citizen.state = BehaviorState::Constructing;
        citizen.target = Some(site);
        let builder = world.spawn((
            citizen,
            Position::new(3.0, 0.0),
            Inventory::new(),
            ConstructionWork {
                building: site,
                contributed: 4.0,
            },
        ));
        world.get_mut::<Building>(site).unwrap().workers.push(builder);
        let node = world.spawn((ResourceNode::new(ResourceType::Stone, 30, false), Position::new(-5.0, 2.0)));
        (world, site, builder, node)
    }

    #[test]
    fn test_round_trip_keeps_ids_and_references() {
        let (world, site, builder, node) = sample_world();
        let store = ResourceStore::with_amounts([(ResourceType::Wood, 12)]);
        let snapshot = capture(&world, &TimeSystem::new(), &store);

        let mut buffer = Vec::new();
        save_snapshot(&mut buffer, &snapshot).unwrap();
        let loaded = load_snapshot(&buffer[..]).unwrap();
        assert_eq!(loaded, snapshot);

        let restored = restore(loaded).unwrap();
        let world = restored.world;
        assert_eq!(world.entities(), vec![site, builder, node]);
        assert_eq!(world.get::<Building>(site).unwrap().workers, vec![builder]);
        assert_eq!(world.get::<ConstructionWork>(builder).unwrap().building, site);
        assert_eq!(restored.store.get(ResourceType::Wood), 12);
    }

    #[test]
    fn test_restored_world_spawns_fresh_ids() {
        let (world, site, builder, node) = sample_world();
        let snapshot = capture(&world, &TimeSystem::new(), &ResourceStore::new());
        let mut world = restore(snapshot).unwrap().world;

        let fresh = world.create();
        assert!(![site, builder, node].contains(&fresh));
        assert_eq!(world.len(), 4);
    }

    #[test]
    fn test_dangling_references_are_pruned() {
        let (mut world, site, builder, _) = sample_world();
        let ghost = world.spawn((Citizen::new("Ghost"),));
        world.get_mut::<Building>(site).unwrap().workers.push(ghost);
        let mut snapshot = capture(&world, &TimeSystem::new(), &ResourceStore::new());
        // Drop the ghost and the construction site from the save
        let ghost_id = ghost.to_bits().get();
        let site_id = site.to_bits().get();
        snapshot.entities.retain(|e| e.id != ghost_id && e.id != site_id);

        let world = restore(snapshot).unwrap().world;
        let citizen = world.get::<Citizen>(builder).unwrap();
        assert_eq!(citizen.state, BehaviorState::Idle);
        assert!(citizen.target.is_none());
        assert!(!world.has::<ConstructionWork>(builder));
    }

    #[test]
    fn test_worker_listed_twice_keeps_first_slot() {
        let (mut world, site, builder, _) = sample_world();
        let farm = world.spawn((Building::new(BuildingType::Farm), Position::new(20.0, 0.0)));
        world.get_mut::<Building>(farm).unwrap().workers.push(builder);
        let snapshot = capture(&world, &TimeSystem::new(), &ResourceStore::new());

        let world = restore(snapshot).unwrap().world;
        assert_eq!(world.get::<Building>(site).unwrap().workers, vec![builder]);
        assert!(world.get::<Building>(farm).unwrap().workers.is_empty());
    }

    #[test]
    fn test_invalid_snapshots_are_rejected() {
        let (world, _, builder, _) = sample_world();
        let good = capture(&world, &TimeSystem::new(), &ResourceStore::new());

        let mut duplicate = good.clone();
        duplicate.entities.push(duplicate.entities[0].clone());
        assert!(matches!(restore(duplicate), Err(SnapshotError::DuplicateEntity(_))));

        let mut zero = good.clone();
        zero.entities[0].id = 0;
        assert!(matches!(restore(zero), Err(SnapshotError::InvalidEntity(0))));

        let mut conflicting = good.clone();
        let id = builder.to_bits().get();
        let saved = conflicting.entities.iter_mut().find(|e| e.id == id).unwrap();
        saved.path_follow = Some(PathFollow::new(Vec3::ZERO, 1.0));
        assert!(matches!(restore(conflicting), Err(SnapshotError::ConflictingActivities(i)) if i == id));

        let mut old = good;
        old.version = 0;
        assert!(matches!(
            restore(old),
            Err(SnapshotError::VersionMismatch { expected: SNAPSHOT_VERSION, found: 0 })
        ));
    }

    #[test]
    fn test_summary_counts() {
        let (world, _, _, _) = sample_world();
        let snapshot = capture(&world, &TimeSystem::new(), &ResourceStore::with_amounts([(ResourceType::Food, 3)]));
        let summary = snapshot.summary();
        assert_eq!(summary.citizens, 1);
        assert_eq!(summary.buildings, 1);
        assert_eq!(summary.constructed_buildings, 0);
        assert_eq!(summary.resource_nodes, 1);
        assert!(snapshot.summary_json().unwrap().contains("\"citizens\": 1"));
    }
}
