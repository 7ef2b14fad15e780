//! Citizen components: Citizen, jobs, and the transient activity components
//! (PathFollow, Gathering, Carry, ConstructionWork).

use hecs::Entity;
use serde::{Deserialize, Serialize};

use super::common::{entity_bits, Vec3};
use super::resource::ResourceType;

/// Occupations a citizen can be assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobType {
    Idle,
    Woodcutter,
    Quarrier,
    Forager,
    Builder,
}

/// Static data describing a job
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobDef {
    pub name: &'static str,
    pub icon: &'static str,
    /// Resource harvested by this job, if it is a gathering job
    pub gathers: Option<ResourceType>,
    /// Whether this job works on construction sites
    pub constructs: bool,
}

static IDLE: JobDef = JobDef {
    name: "Idle",
    icon: "icon_idle",
    gathers: None,
    constructs: false,
};
static WOODCUTTER: JobDef = JobDef {
    name: "Woodcutter",
    icon: "icon_axe",
    gathers: Some(ResourceType::Wood),
    constructs: false,
};
static QUARRIER: JobDef = JobDef {
    name: "Quarrier",
    icon: "icon_pickaxe",
    gathers: Some(ResourceType::Stone),
    constructs: false,
};
static FORAGER: JobDef = JobDef {
    name: "Forager",
    icon: "icon_basket",
    gathers: Some(ResourceType::Food),
    constructs: false,
};
static BUILDER: JobDef = JobDef {
    name: "Builder",
    icon: "icon_hammer",
    gathers: None,
    constructs: true,
};

impl JobType {
    pub const ALL: [JobType; 5] = [
        JobType::Idle,
        JobType::Woodcutter,
        JobType::Quarrier,
        JobType::Forager,
        JobType::Builder,
    ];

    pub fn def(&self) -> &'static JobDef {
        match self {
            JobType::Idle => &IDLE,
            JobType::Woodcutter => &WOODCUTTER,
            JobType::Quarrier => &QUARRIER,
            JobType::Forager => &FORAGER,
            JobType::Builder => &BUILDER,
        }
    }

    /// Gatherer job for a resource type
    pub fn gatherer_of(resource: ResourceType) -> JobType {
        match resource {
            ResourceType::Wood => JobType::Woodcutter,
            ResourceType::Stone => JobType::Quarrier,
            ResourceType::Food => JobType::Forager,
        }
    }
}

/// Current behavior phase of a citizen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BehaviorState {
    #[default]
    Idle,
    PathFollowing,
    Gathering,
    Carrying,
    Constructing,
}

/// Core citizen data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citizen {
    pub name: String,
    /// 0-100
    pub health: f32,
    /// 0 (fed) - 100 (starving)
    pub hunger: f32,
    pub job: JobType,
    pub state: BehaviorState,
    /// Entity the current plan is aimed at (resource node or building).
    /// Weak: may refer to a destroyed entity and must be checked before use.
    #[serde(with = "entity_bits::option", default)]
    pub target: Option<Entity>,
}

impl Citizen {
    pub const MAX_HEALTH: f32 = 100.0;
    pub const MAX_HUNGER: f32 = 100.0;

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            health: Self::MAX_HEALTH,
            hunger: 0.0,
            job: JobType::Idle,
            state: BehaviorState::Idle,
            target: None,
        }
    }

    pub fn with_job(mut self, job: JobType) -> Self {
        self.job = job;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

/// The citizen's requested job, replaced wholesale on every job change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobAssignment {
    pub job: JobType,
}

/// Straight-line walk toward a destination
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub destination: Vec3,
    /// Units per second
    pub speed: f32,
    pub arrived: bool,
}

impl Route {
    pub fn new(destination: Vec3, speed: f32) -> Self {
        Self {
            destination,
            speed,
            arrived: false,
        }
    }
}

/// Activity: walking to the current target. Removed by the movement
/// collaborator on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathFollow {
    pub route: Route,
}

impl PathFollow {
    pub fn new(destination: Vec3, speed: f32) -> Self {
        Self {
            route: Route::new(destination, speed),
        }
    }
}

/// Activity: harvesting a resource node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gathering {
    #[serde(with = "entity_bits")]
    pub node: Entity,
    pub resource: ResourceType,
    /// Seconds spent so far
    pub progress: f32,
    /// Seconds needed for one load
    pub duration: f32,
    /// Units taken from the node when the load completes
    pub amount: u32,
}

impl Gathering {
    pub fn is_complete(&self) -> bool {
        self.progress >= self.duration
    }
}

/// Activity: hauling a load to a drop-off. The walk is embedded so the
/// citizen still holds a single activity component while travelling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Carry {
    pub resource: ResourceType,
    pub amount: u32,
    pub route: Route,
}

/// Activity: adding construction progress to a building
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstructionWork {
    #[serde(with = "entity_bits")]
    pub building: Entity,
    /// Work units contributed by this citizen so far
    pub contributed: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_table_is_consistent() {
        for resource in ResourceType::ALL {
            let job = JobType::gatherer_of(resource);
            assert_eq!(job.def().gathers, Some(resource));
            assert!(!job.def().constructs);
        }
        assert!(JobType::Builder.def().constructs);
        assert_eq!(JobType::Idle.def().gathers, None);
    }

    #[test]
    fn test_new_citizen_is_idle_and_healthy() {
        let citizen = Citizen::new("Ada").with_job(JobType::Builder);
        assert_eq!(citizen.state, BehaviorState::Idle);
        assert_eq!(citizen.job, JobType::Builder);
        assert!(citizen.is_alive());
        assert!(citizen.target.is_none());
    }

    #[test]
    fn test_gathering_completion() {
        let mut world = hecs::World::new();
        let node = world.spawn(());
        let mut gathering = Gathering {
            node,
            resource: ResourceType::Wood,
            progress: 0.0,
            duration: 2.0,
            amount: 5,
        };
        assert!(!gathering.is_complete());
        gathering.progress = 2.0;
        assert!(gathering.is_complete());
    }
}
