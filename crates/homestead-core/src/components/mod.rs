//! Component definitions for the ECS simulation.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in systems.

mod building;
mod citizen;
mod common;
mod resource;

pub use building::*;
pub use citizen::*;
pub use common::*;
pub use resource::*;
