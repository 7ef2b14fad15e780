//! Construction system - builders add work to construction sites

use hecs::Entity;

use crate::components::{Building, Citizen, ConstructionWork};
use crate::events::{EventBus, GameEvent};
use crate::world::World;

use super::jobs::reset_to_idle;

/// Outcome of adding work to a building
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContributionResult {
    /// Work contributed, building still under construction
    InProgress { contributed: f32 },
    /// Work contributed, building is now complete
    Completed { contributed: f32 },
    /// Building is already complete
    AlreadyComplete,
    /// Building not found
    NotFound,
}

/// Add work to a building, flipping it to constructed when enough has accumulated
pub fn apply_construction_work(world: &mut World, building: Entity, work: f32) -> ContributionResult {
    let Some(mut b) = world.get_mut::<Building>(building) else {
        return ContributionResult::NotFound;
    };
    if b.constructed {
        return ContributionResult::AlreadyComplete;
    }

    b.progress += work;
    if b.progress >= b.def().work_required {
        b.progress = b.def().work_required;
        b.constructed = true;
        b.workers.clear();
        ContributionResult::Completed { contributed: work }
    } else {
        ContributionResult::InProgress { contributed: work }
    }
}

/// Progress every construction site that has a builder on it.
/// Returns the buildings completed this tick.
pub fn construction_system(
    world: &mut World,
    events: &EventBus,
    build_rate: f32,
    delta_seconds: f32,
) -> Vec<Entity> {
    let mut completed = Vec::new();
    let work = build_rate * delta_seconds;

    for entity in world.query::<(&Citizen, &ConstructionWork)>() {
        let Some(site) = world.get::<ConstructionWork>(entity).map(|w| w.building) else {
            continue;
        };

        match apply_construction_work(world, site, work) {
            ContributionResult::InProgress { contributed } => {
                if let Some(mut w) = world.get_mut::<ConstructionWork>(entity) {
                    w.contributed += contributed;
                }
            }
            ContributionResult::Completed { .. } => {
                let kind = world.get::<Building>(site).map(|b| b.kind);
                if let Some(kind) = kind {
                    tracing::info!(building = ?site, ?kind, "construction completed");
                    events.emit(GameEvent::ConstructionCompleted { entity: site, kind });
                }
                completed.push(site);
                // Everyone on the site is done, not just the one who finished it
                for builder in builders_on(world, site) {
                    reset_to_idle(world, builder);
                }
            }
            // Another builder finished it earlier this tick, or it was demolished
            ContributionResult::AlreadyComplete | ContributionResult::NotFound => {
                reset_to_idle(world, entity);
            }
        }
    }

    completed
}

fn builders_on(world: &World, site: Entity) -> Vec<Entity> {
    world
        .query::<&ConstructionWork>()
        .into_iter()
        .filter(|e| world.get::<ConstructionWork>(*e).map(|w| w.building == site).unwrap_or(false))
        .collect()
}
