//! Building components and the static building definitions table.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use super::common::entity_bits;
use super::resource::ResourceType;

/// Placeable building kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuildingType {
    TownCenter,
    House,
    Storehouse,
    Farm,
}

/// Static data describing a building kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingDef {
    pub name: &'static str,
    pub icon: &'static str,
    pub cost: &'static [(ResourceType, u32)],
    /// Work units needed to finish construction
    pub work_required: f32,
    pub worker_slots: u32,
    /// Population capacity added once constructed
    pub provides_population: u32,
    /// Storage capacity added to every resource once constructed
    pub provides_storage: u32,
    /// Radius of the circular footprint on the ground plane
    pub footprint_radius: f32,
    /// Accepts carried goods
    pub drop_off: bool,
    /// Passive output while constructed: (resource, units per second)
    pub produces: Option<(ResourceType, f32)>,
}

static TOWN_CENTER: BuildingDef = BuildingDef {
    name: "Town Center",
    icon: "icon_town_center",
    cost: &[(ResourceType::Wood, 100), (ResourceType::Stone, 50)],
    work_required: 120.0,
    worker_slots: 6,
    provides_population: 5,
    provides_storage: 100,
    footprint_radius: 4.0,
    drop_off: true,
    produces: None,
};
static HOUSE: BuildingDef = BuildingDef {
    name: "House",
    icon: "icon_house",
    cost: &[(ResourceType::Wood, 20)],
    work_required: 20.0,
    worker_slots: 2,
    provides_population: 4,
    provides_storage: 0,
    footprint_radius: 1.5,
    drop_off: false,
    produces: None,
};
static STOREHOUSE: BuildingDef = BuildingDef {
    name: "Storehouse",
    icon: "icon_storehouse",
    cost: &[(ResourceType::Wood, 30), (ResourceType::Stone, 10)],
    work_required: 30.0,
    worker_slots: 3,
    provides_population: 0,
    provides_storage: 150,
    footprint_radius: 2.0,
    drop_off: true,
    produces: None,
};
static FARM: BuildingDef = BuildingDef {
    name: "Farm",
    icon: "icon_farm",
    cost: &[(ResourceType::Wood, 25)],
    work_required: 25.0,
    worker_slots: 2,
    provides_population: 0,
    provides_storage: 0,
    footprint_radius: 3.0,
    drop_off: false,
    produces: Some((ResourceType::Food, 0.2)),
};

impl BuildingType {
    pub const ALL: [BuildingType; 4] = [
        BuildingType::TownCenter,
        BuildingType::House,
        BuildingType::Storehouse,
        BuildingType::Farm,
    ];

    pub fn def(&self) -> &'static BuildingDef {
        match self {
            BuildingType::TownCenter => &TOWN_CENTER,
            BuildingType::House => &HOUSE,
            BuildingType::Storehouse => &STOREHOUSE,
            BuildingType::Farm => &FARM,
        }
    }
}

/// A placed building, constructed or not
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Building {
    pub kind: BuildingType,
    pub constructed: bool,
    /// Work units accumulated toward `work_required`
    pub progress: f32,
    pub worker_slots: u32,
    /// Assigned workers. Weak references: a destroyed citizen may still be
    /// listed until the next read prunes it.
    #[serde(with = "entity_bits::vec")]
    pub workers: Vec<Entity>,
    /// Fractional output not yet deposited
    #[serde(default)]
    pub production_progress: f32,
}

impl Building {
    /// A freshly placed construction site
    pub fn new(kind: BuildingType) -> Self {
        Self {
            kind,
            constructed: false,
            progress: 0.0,
            worker_slots: kind.def().worker_slots,
            workers: Vec::new(),
            production_progress: 0.0,
        }
    }

    /// An already finished building (starting settlement, scenario setup)
    pub fn constructed(kind: BuildingType) -> Self {
        Self {
            constructed: true,
            progress: kind.def().work_required,
            ..Self::new(kind)
        }
    }

    pub fn def(&self) -> &'static BuildingDef {
        self.kind.def()
    }

    /// Population contribution; zero until constructed
    pub fn population_contribution(&self) -> u32 {
        if self.constructed {
            self.def().provides_population
        } else {
            0
        }
    }

    /// Storage contribution; zero until constructed
    pub fn storage_contribution(&self) -> u32 {
        if self.constructed {
            self.def().provides_storage
        } else {
            0
        }
    }

    /// Construction progress in 0..=1
    pub fn completion(&self) -> f32 {
        let required = self.def().work_required;
        if required <= 0.0 {
            1.0
        } else {
            (self.progress / required).clamp(0.0, 1.0)
        }
    }

    pub fn has_free_slot(&self) -> bool {
        (self.workers.len() as u32) < self.worker_slots
    }

    /// Drop references for which `is_alive` is false. Returns how many were removed.
    pub fn prune_workers(&mut self, is_alive: impl Fn(Entity) -> bool) -> usize {
        let before = self.workers.len();
        self.workers.retain(|w| is_alive(*w));
        before - self.workers.len()
    }

    pub fn remove_worker(&mut self, worker: Entity) -> bool {
        let before = self.workers.len();
        self.workers.retain(|w| *w != worker);
        before != self.workers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconstructed_contributes_nothing() {
        let mut house = Building::new(BuildingType::House);
        assert_eq!(house.population_contribution(), 0);
        house.constructed = true;
        assert_eq!(house.population_contribution(), 4);

        let store = Building::constructed(BuildingType::Storehouse);
        assert_eq!(store.storage_contribution(), 150);
        assert_eq!(store.completion(), 1.0);
    }

    #[test]
    fn test_prune_workers() {
        let mut world = hecs::World::new();
        let alive = world.spawn(());
        let dead = world.spawn(());
        world.despawn(dead).unwrap();

        let mut farm = Building::new(BuildingType::Farm);
        farm.workers = vec![alive, dead];
        assert!(!farm.has_free_slot());

        assert_eq!(farm.prune_workers(|e| world.contains(e)), 1);
        assert_eq!(farm.workers, vec![alive]);
        assert!(farm.has_free_slot());
    }

    #[test]
    fn test_definitions_have_costs() {
        for kind in BuildingType::ALL {
            let def = kind.def();
            assert!(!def.cost.is_empty(), "{} has no cost", def.name);
            assert!(def.work_required > 0.0);
            assert!(def.worker_slots > 0);
        }
    }
}
