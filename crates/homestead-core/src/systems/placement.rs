//! Building placement - cost, terrain and footprint validation, then commit.
//!
//! Terrain is an external collaborator behind the [`Terrain`] trait. The
//! cost check and the deduction happen under the same `&mut ResourceStore`
//! borrow, so nothing can spend in between.

use hecs::Entity;

use crate::components::{Building, BuildingType, Position, Selectable, Vec3};
use crate::error::{PlacementError, PlacementViolation};
use crate::events::{EventBus, GameEvent};
use crate::world::World;

use super::resources::ResourceStore;

/// Ground queries needed to validate a footprint
pub trait Terrain {
    fn in_bounds(&self, position: Vec3) -> bool;
    /// Whether a circular footprint of `radius` centred on `position` can be built on
    fn is_buildable(&self, position: Vec3, radius: f32) -> bool;
}

/// Level ground over a square map centred on the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatTerrain {
    pub half_extent: f32,
}

impl FlatTerrain {
    pub fn new(half_extent: f32) -> Self {
        Self { half_extent }
    }
}

impl Default for FlatTerrain {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Terrain for FlatTerrain {
    fn in_bounds(&self, position: Vec3) -> bool {
        position.x.abs() <= self.half_extent && position.z.abs() <= self.half_extent
    }

    fn is_buildable(&self, position: Vec3, radius: f32) -> bool {
        position.x.abs() + radius <= self.half_extent && position.z.abs() + radius <= self.half_extent
    }
}

/// Check a position against the terrain and every existing footprint
pub fn validate_placement(
    world: &World,
    terrain: &dyn Terrain,
    kind: BuildingType,
    position: Vec3,
) -> Result<(), PlacementViolation> {
    let radius = kind.def().footprint_radius;
    if !terrain.in_bounds(position) {
        return Err(PlacementViolation::OutOfBounds);
    }
    if !terrain.is_buildable(position, radius) {
        return Err(PlacementViolation::Unbuildable);
    }

    for other in world.query::<(&Building, &Position)>() {
        let (Some(building), Some(pos)) = (world.get::<Building>(other), world.get::<Position>(other)) else {
            continue;
        };
        let min_gap = radius + building.def().footprint_radius;
        if pos.0.distance_squared(&position) < min_gap * min_gap {
            return Err(PlacementViolation::Overlaps(other));
        }
    }
    Ok(())
}

/// Place a new construction site. Nothing changes unless both the cost
/// and the position are acceptable.
pub fn place_building(
    world: &mut World,
    store: &mut ResourceStore,
    terrain: &dyn Terrain,
    events: &EventBus,
    kind: BuildingType,
    position: Vec3,
) -> Result<Entity, PlacementError> {
    let cost = kind.def().cost;

    let missing = store.shortfall(cost);
    if !missing.is_empty() {
        tracing::warn!(?kind, ?missing, "placement rejected: insufficient resources");
        return Err(PlacementError::InsufficientResources { missing });
    }
    if let Err(violation) = validate_placement(world, terrain, kind, position) {
        tracing::warn!(?kind, %violation, "placement rejected");
        return Err(PlacementError::InvalidPlacement(violation));
    }

    store.deduct(cost)?;
    for (resource, amount) in cost {
        events.emit(GameEvent::ResourceConsumed {
            resource: *resource,
            amount: *amount,
        });
    }

    let entity = world.spawn((Building::new(kind), Position(position), Selectable::default()));
    tracing::info!(?entity, ?kind, x = position.x, z = position.z, "building placed");
    events.emit(GameEvent::BuildingPlaced { entity, kind });
    Ok(entity)
}
