//! Error types for rejected intents, save/load and configuration.
//!
//! Rejections leave simulation state unchanged. "No target found" is not an
//! error anywhere in the core: the citizen simply stays idle.

use hecs::Entity;
use thiserror::Error;

use crate::components::ResourceType;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobError {
    #[error("entity {0:?} does not exist")]
    NoSuchEntity(Entity),

    #[error("entity {0:?} is not a citizen")]
    NotACitizen(Entity),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssignError {
    #[error("entity {0:?} is not a building")]
    NoSuchBuilding(Entity),

    #[error("entity {0:?} is not a living citizen")]
    NotACitizen(Entity),

    #[error("all {capacity} worker slots are taken")]
    SlotsFull { capacity: u32 },
}

/// Reason a position was refused
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum PlacementViolation {
    #[error("outside the map")]
    OutOfBounds,

    #[error("terrain is not buildable")]
    Unbuildable,

    #[error("overlaps building {0:?}")]
    Overlaps(Entity),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlacementError {
    #[error("insufficient resources: missing {missing:?}")]
    InsufficientResources { missing: Vec<(ResourceType, u32)> },

    #[error("invalid placement: {0}")]
    InvalidPlacement(PlacementViolation),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpendError {
    #[error("cannot afford cost: missing {missing:?}")]
    Shortfall { missing: Vec<(ResourceType, u32)> },
}

impl From<SpendError> for PlacementError {
    fn from(err: SpendError) -> Self {
        match err {
            SpendError::Shortfall { missing } => PlacementError::InsufficientResources { missing },
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeError {
    #[error("time scale must be positive and finite, got {0}")]
    InvalidScale(f32),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpawnError {
    #[error("population capacity of {capacity} reached")]
    PopulationCapReached { capacity: u32 },
}

/// Errors that can occur during save/load
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Encode(#[from] Box<bincode::ErrorKind>),

    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("entity id {0} appears more than once")]
    DuplicateEntity(u64),

    #[error("entity id {0} is not a valid identifier")]
    InvalidEntity(u64),

    #[error("citizen {0} holds more than one activity component")]
    ConflictingActivities(u64),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_messages() {
        let err = PlacementError::InvalidPlacement(PlacementViolation::Unbuildable);
        assert_eq!(err.to_string(), "invalid placement: terrain is not buildable");
        assert_eq!(PlacementViolation::OutOfBounds.to_string(), "outside the map");
    }

    #[test]
    fn test_spend_error_converts_to_shortfall() {
        let missing = vec![(ResourceType::Wood, 5)];
        let err: PlacementError = SpendError::Shortfall { missing: missing.clone() }.into();
        assert_eq!(err, PlacementError::InsufficientResources { missing });
    }
}
