//! Homestead Core - Settlement Survival Simulation Engine
//!
//! An ECS-based simulation of a small settlement: citizens gather wood,
//! stone and food, haul it to storage, raise new buildings and need to eat.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Citizens, buildings, resource nodes
//! - **Components**: Pure data attached to entities (Citizen, Building, Gathering, etc.)
//! - **Systems**: Logic that queries and updates components, run in a fixed
//!   order every tick
//!
//! Systems never call each other directly; anything a UI or audio layer
//! needs to react to goes out through the [`events::EventBus`].
//!
//! # Example
//!
//! ```rust,no_run
//! use homestead_core::prelude::*;
//! use homestead_core::generation::SettlementConfig;
//!
//! let mut engine = SimulationEngine::new(SimulationConfig::default());
//!
//! // Town center, starting citizens and resource nodes
//! engine.generate(&SettlementConfig::default());
//!
//! // Run simulation
//! loop {
//!     engine.update(1.0 / 60.0); // 60 FPS
//! }
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod generation;
pub mod persistence;
pub mod systems;
pub mod world;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use hecs::Entity;

    pub use crate::components::*;
    pub use crate::config::SimulationConfig;
    pub use crate::engine::SimulationEngine;
    pub use crate::error::*;
    pub use crate::events::{EventBus, EventKind, GameEvent, Subscription};
    pub use crate::systems::{FlatTerrain, ResourceStore, Terrain, TimeSystem};
    pub use crate::world::World;
}
