//! Simulation engine - main entry point for running the simulation

use std::io::{Read, Write};

use hecs::Entity;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::components::*;
use crate::config::SimulationConfig;
use crate::error::{AssignError, JobError, PlacementError, SnapshotError, SpawnError, TimeError};
use crate::events::{EventBus, GameEvent};
use crate::generation::{self, SettlementConfig, SettlementLayout};
use crate::persistence::{self, Snapshot};
use crate::systems::*;
use crate::world::World;

/// Main simulation engine
///
/// Owns the world and every singleton system. Hosts feed it wall-clock
/// deltas through [`update`](Self::update) and player intents through the
/// intent methods; renderers read state through the accessors.
pub struct SimulationEngine {
    world: World,
    events: EventBus,
    time: TimeSystem,
    store: ResourceStore,
    config: SimulationConfig,
    terrain: Box<dyn Terrain>,
    rng: StdRng,
    settlement: SettlementCache,
    /// Scaled seconds not yet consumed by a fixed step
    accumulator: f32,
    ticks: u64,
}

impl SimulationEngine {
    /// Create an empty simulation on flat terrain
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_terrain(config, FlatTerrain::default())
    }

    pub fn with_terrain(config: SimulationConfig, terrain: impl Terrain + 'static) -> Self {
        let world = World::new();
        let mut store = ResourceStore::with_amounts(config.starting_resources.clone());
        let settlement = SettlementCache::derive(&world, config.base_storage_capacity);
        apply_storage(&mut store, settlement.storage_capacity);

        Self {
            rng: StdRng::seed_from_u64(config.seed),
            world,
            events: EventBus::new(),
            time: TimeSystem::new(),
            store,
            terrain: Box::new(terrain),
            settlement,
            config,
            accumulator: 0.0,
            ticks: 0,
        }
    }

    /// Populate the world with a starting settlement
    pub fn generate(&mut self, settlement: &SettlementConfig) -> SettlementLayout {
        let layout = generation::generate_settlement(&mut self.world, settlement, &mut self.rng);
        self.settlement.refresh(
            &self.world,
            &mut self.store,
            &self.events,
            self.config.base_storage_capacity,
        );
        layout
    }

    /// Advance by a wall-clock delta. Runs as many fixed steps as the scaled
    /// time covers, up to the configured cap, and returns how many ran.
    pub fn update(&mut self, wall_delta: f32) -> u32 {
        let scaled = self.time.advance(wall_delta);
        let step = self.config.fixed_step;

        // Non-positive step length: one variable step per update
        if step <= 0.0 {
            if scaled > 0.0 {
                self.step(scaled);
                return 1;
            }
            return 0;
        }

        self.accumulator += scaled;
        let mut steps = 0;
        while self.accumulator >= step && steps < self.config.max_steps_per_update {
            self.step(step);
            self.accumulator -= step;
            steps += 1;
        }
        if self.accumulator >= step {
            tracing::warn!(
                dropped = self.accumulator,
                "update fell behind, dropping simulation time"
            );
            self.accumulator %= step;
        }
        steps
    }

    /// Run every system once, in order, with a scaled delta
    pub fn step(&mut self, dt: f32) {
        let config = &self.config;

        vitals_system(&mut self.world, &mut self.store, &self.events, config, dt);
        job_planner_system(&mut self.world, config);
        movement_system(&mut self.world, dt, config.arrival_radius);
        arrival_system(&mut self.world, config);
        gathering_system(&mut self.world, config, dt);
        carrying_system(&mut self.world, &mut self.store, &self.events);
        construction_system(&mut self.world, &self.events, config.build_rate, dt);
        regeneration_system(&mut self.world, config, dt);
        production_system(&mut self.world, &mut self.store, &self.events, dt);
        self.settlement.refresh(
            &self.world,
            &mut self.store,
            &self.events,
            config.base_storage_capacity,
        );

        self.ticks += 1;
        debug_assert!(
            activity_violations(&self.world).is_empty(),
            "citizens with more than one activity: {:?}",
            activity_violations(&self.world)
        );
    }

    // === INTENTS ===

    /// Give a citizen a new job. Takes effect before the next tick.
    pub fn assign_job(&mut self, entity: Entity, job: JobType) -> Result<(), JobError> {
        if let Err(err) = assign_job(&mut self.world, entity, job) {
            tracing::warn!(?entity, ?job, %err, "job assignment rejected");
            return Err(err);
        }
        self.events.emit(GameEvent::JobAssigned { entity, job });
        Ok(())
    }

    /// Place a construction site, paying its cost
    pub fn place_building(&mut self, kind: BuildingType, position: Vec3) -> Result<Entity, PlacementError> {
        place_building(
            &mut self.world,
            &mut self.store,
            self.terrain.as_ref(),
            &self.events,
            kind,
            position,
        )
    }

    /// Put a citizen in one of a building's worker slots
    pub fn assign_worker(&mut self, building: Entity, citizen: Entity) -> Result<(), AssignError> {
        assign_worker(&mut self.world, building, citizen).map_err(|err| {
            tracing::warn!(?building, ?citizen, %err, "worker assignment rejected");
            err
        })
    }

    /// Live workers of a building
    pub fn workers(&mut self, building: Entity) -> Vec<Entity> {
        live_workers(&mut self.world, building)
    }

    pub fn select(&mut self, entity: Entity) -> bool {
        select(&mut self.world, &self.events, entity)
    }

    pub fn deselect(&mut self, entity: Entity) -> bool {
        deselect(&mut self.world, &self.events, entity)
    }

    pub fn toggle_selection(&mut self, entity: Entity) -> Option<bool> {
        toggle_selection(&mut self.world, &self.events, entity)
    }

    pub fn selected(&self) -> Vec<Entity> {
        selected_entities(&self.world)
    }

    pub fn pause(&mut self) {
        self.time.pause(&self.events);
    }

    pub fn resume(&mut self) {
        self.time.resume(&self.events);
    }

    pub fn set_time_scale(&mut self, scale: f32) -> Result<(), TimeError> {
        self.time.set_time_scale(scale, &self.events)
    }

    /// Step to the next speed preset, returning the new scale
    pub fn cycle_speed(&mut self) -> Result<f32, TimeError> {
        self.time.cycle_speed(&self.config.speed_presets, &self.events)
    }

    /// Spawn an idle citizen, if there is room for one
    pub fn spawn_citizen(&mut self, position: Vec3) -> Result<Entity, SpawnError> {
        let capacity = population_capacity(&self.world);
        if population(&self.world) >= capacity {
            tracing::warn!(capacity, "spawn rejected: population capacity reached");
            return Err(SpawnError::PopulationCapReached { capacity });
        }
        let name = generation::generate_name(&mut self.rng);
        let entity = generation::spawn_citizen(&mut self.world, name, JobType::Idle, position);
        tracing::debug!(?entity, "citizen spawned");
        Ok(entity)
    }

    /// Add a full resource node to the map
    pub fn seed_resource_node(
        &mut self,
        resource: ResourceType,
        amount: u32,
        regenerates: bool,
        position: Vec3,
    ) -> Entity {
        generation::spawn_resource_node(&mut self.world, resource, amount, regenerates, position)
    }

    // === PERSISTENCE ===

    /// Capture the current state
    pub fn snapshot(&self) -> Snapshot {
        persistence::capture(&self.world, &self.time, &self.store)
    }

    /// Replace the current state with a snapshot. Event subscriptions are kept.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<(), SnapshotError> {
        let restored = persistence::restore(snapshot)?;
        let old_scale = self.time.effective_scale();

        self.world = restored.world;
        self.store = restored.store;
        self.time = restored.time;
        self.accumulator = 0.0;
        self.settlement = SettlementCache::derive(&self.world, self.config.base_storage_capacity);
        apply_storage(&mut self.store, self.settlement.storage_capacity);

        let new_scale = self.time.effective_scale();
        if old_scale != new_scale {
            self.events.emit(GameEvent::TimeScaleChanged {
                old: old_scale,
                new: new_scale,
            });
        }
        Ok(())
    }

    /// Save the simulation to a writer
    pub fn save<W: Write>(&self, writer: W) -> Result<(), SnapshotError> {
        persistence::save_snapshot(writer, &self.snapshot())?;
        tracing::info!(entities = self.world.len(), "simulation saved");
        Ok(())
    }

    /// Load a simulation from a reader
    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), SnapshotError> {
        let snapshot = persistence::load_snapshot(reader)?;
        self.restore(snapshot)
    }

    // === READS ===

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for external collaborators (a host-side
    /// movement or vitals implementation, scenario setup)
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The event bus. Subscribe with `engine.events().on(..)`.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn time(&self) -> &TimeSystem {
        &self.time
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    pub fn resource(&self, resource: ResourceType) -> u32 {
        self.store.get(resource)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Scaled seconds since the start of the simulation
    pub fn sim_time(&self) -> f64 {
        self.time.sim_time()
    }

    /// Fixed steps run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn population(&self) -> u32 {
        population(&self.world)
    }

    /// Population capacity as of the last refresh
    pub fn population_capacity(&self) -> u32 {
        self.settlement.population_capacity
    }

    pub fn storage_capacity(&self) -> u32 {
        self.settlement.storage_capacity
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn config() -> SimulationConfig {
        SimulationConfig {
            hunger_rate: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_update_runs_fixed_steps() {
        let mut engine = SimulationEngine::new(SimulationConfig {
            fixed_step: 0.25,
            ..config()
        });

        assert_eq!(engine.update(0.6), 2);
        assert_eq!(engine.update(0.6), 2);
        assert_eq!(engine.ticks(), 4);
        assert!((engine.sim_time() - 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_update_caps_steps_per_call() {
        let mut engine = SimulationEngine::new(SimulationConfig {
            fixed_step: 0.5,
            max_steps_per_update: 3,
            ..config()
        });

        assert_eq!(engine.update(10.0), 3);
        // The backlog was dropped, not carried
        assert_eq!(engine.update(0.25), 0);
    }

    #[test]
    fn test_paused_engine_does_not_step() {
        let mut engine = SimulationEngine::new(config());
        engine.pause();
        assert_eq!(engine.update(1.0), 0);
        assert_eq!(engine.sim_time(), 0.0);

        engine.set_time_scale(2.0).unwrap();
        assert_eq!(engine.update(1.0), 0);
        engine.resume();
        assert_eq!(engine.time().effective_scale(), 2.0);
    }

    #[test]
    fn test_spawn_respects_population_capacity() {
        let mut engine = SimulationEngine::new(config());
        assert!(matches!(
            engine.spawn_citizen(Vec3::ZERO),
            Err(SpawnError::PopulationCapReached { capacity: 0 })
        ));

        engine
            .world_mut()
            .spawn((Building::constructed(BuildingType::House), Position::new(0.0, 0.0)));
        for _ in 0..4 {
            engine.spawn_citizen(Vec3::ground(2.0, 0.0)).unwrap();
        }
        assert!(engine.spawn_citizen(Vec3::ZERO).is_err());
        assert_eq!(engine.population(), 4);
    }

    #[test]
    fn test_assign_job_emits_event() {
        let mut engine = SimulationEngine::new(config());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = engine
            .events()
            .on(EventKind::JobAssigned, move |e, _| sink.borrow_mut().push(e.clone()));

        let citizen = generation::spawn_citizen(engine.world_mut(), "Ode".into(), JobType::Idle, Vec3::ZERO);
        engine.assign_job(citizen, JobType::Forager).unwrap();
        let rock = engine.seed_resource_node(ResourceType::Stone, 10, false, Vec3::ZERO);
        assert!(engine.assign_job(rock, JobType::Forager).is_err());

        assert_eq!(
            *seen.borrow(),
            vec![GameEvent::JobAssigned {
                entity: citizen,
                job: JobType::Forager
            }]
        );
    }

    #[test]
    fn test_completed_house_raises_capacity() {
        let mut engine = SimulationEngine::new(config());
        engine.generate(&SettlementConfig {
            starting_jobs: vec![JobType::Builder, JobType::Builder],
            trees: 0,
            rocks: 0,
            berry_bushes: 0,
            ..Default::default()
        });
        assert_eq!(engine.population_capacity(), 5);

        engine.place_building(BuildingType::House, Vec3::ground(8.0, 0.0)).unwrap();
        engine.step(0.0);
        assert_eq!(engine.population_capacity(), 5);

        for _ in 0..400 {
            engine.step(0.1);
        }
        assert_eq!(engine.population_capacity(), 9);
        assert!(activity_violations(engine.world()).is_empty());
    }
}
