//! Simulation configuration with documented constants
//!
//! Every tunable number lives here. Values can be overridden from a TOML
//! file; missing keys fall back to the defaults below.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::components::ResourceType;
use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for all simulation randomness (names, node scatter)
    pub seed: u64,

    // === TIMING ===
    /// Length of one simulation tick in scaled seconds
    pub fixed_step: f32,
    /// Upper bound on ticks run per `update`, so a long frame cannot stall
    /// the host. Excess time is dropped.
    pub max_steps_per_update: u32,
    /// Speed multipliers offered by the speed control
    pub speed_presets: Vec<f32>,

    // === MOVEMENT ===
    /// Citizen walking speed in units per second
    pub walk_speed: f32,
    /// Distance at which a walker counts as arrived
    pub arrival_radius: f32,

    // === WORK ===
    /// Seconds to harvest one load
    pub gather_duration: f32,
    /// Units per load
    pub gather_amount: u32,
    /// Work units one builder adds per second
    pub build_rate: f32,
    /// Seconds for a regenerating node to restore one unit
    pub node_regen_interval: f32,

    // === VITALS ===
    /// Hunger gained per second
    pub hunger_rate: f32,
    /// Hunger at which a citizen eats from the store
    pub eat_threshold: f32,
    /// Hunger removed by one unit of food
    pub food_hunger_relief: f32,
    /// Health lost per second at maximum hunger
    pub starvation_damage: f32,

    // === SETTLEMENT ===
    /// Storage capacity per resource before any storage building
    pub base_storage_capacity: u32,
    pub starting_resources: BTreeMap<ResourceType, u32>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            fixed_step: 1.0 / 20.0,
            max_steps_per_update: 100,
            speed_presets: vec![1.0, 2.0, 3.0, 5.0],
            walk_speed: 2.0,
            arrival_radius: 0.25,
            gather_duration: 3.0,
            gather_amount: 5,
            build_rate: 1.0,
            node_regen_interval: 20.0,
            hunger_rate: 0.5,
            eat_threshold: 60.0,
            food_hunger_relief: 40.0,
            starvation_damage: 2.0,
            base_storage_capacity: 50,
            starting_resources: BTreeMap::from([
                (ResourceType::Wood, 50),
                (ResourceType::Stone, 20),
                (ResourceType::Food, 30),
            ]),
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
