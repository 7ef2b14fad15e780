//! Property tests for the ledger, activity exclusivity and population capacity

use std::collections::BTreeMap;

use proptest::prelude::*;

use homestead_core::generation::SettlementConfig;
use homestead_core::prelude::*;
use homestead_core::systems::{
    activity_count, activity_violations, apply_construction_work, population_capacity,
};

fn resource() -> impl Strategy<Value = ResourceType> {
    prop::sample::select(ResourceType::ALL.to_vec())
}

fn job() -> impl Strategy<Value = JobType> {
    prop::sample::select(JobType::ALL.to_vec())
}

fn building_type() -> impl Strategy<Value = BuildingType> {
    prop::sample::select(BuildingType::ALL.to_vec())
}

proptest! {
    #[test]
    fn afford_then_deduct_never_overdraws(
        stock in prop::collection::vec((resource(), 0u32..200), 0..4),
        cost in prop::collection::vec((resource(), 0u32..200), 0..4),
    ) {
        let mut store = ResourceStore::with_amounts(stock);
        let before: BTreeMap<ResourceType, u32> =
            ResourceType::ALL.iter().map(|r| (*r, store.get(*r))).collect();

        if store.can_afford(&cost) {
            prop_assert!(store.deduct(&cost).is_ok());
            for r in ResourceType::ALL {
                let spent: u32 = cost.iter().filter(|(c, _)| *c == r).map(|(_, a)| a).sum();
                prop_assert_eq!(store.get(r), before[&r] - spent);
            }
        } else {
            prop_assert!(store.deduct(&cost).is_err());
            for r in ResourceType::ALL {
                prop_assert_eq!(store.get(r), before[&r]);
            }
        }
    }

    #[test]
    fn reassignment_never_leaves_two_activities(
        ops in prop::collection::vec((0usize..5, job(), 0u32..40), 1..25),
    ) {
        let mut engine = SimulationEngine::new(SimulationConfig {
            hunger_rate: 0.0,
            ..SimulationConfig::default()
        });
        let layout = engine.generate(&SettlementConfig {
            trees: 4,
            rocks: 2,
            berry_bushes: 2,
            ..SettlementConfig::default()
        });
        engine.place_building(BuildingType::House, Vec3::ground(0.0, -12.0)).unwrap();

        for (index, new_job, steps) in ops {
            let citizen = layout.citizens[index % layout.citizens.len()];
            engine.assign_job(citizen, new_job).unwrap();
            prop_assert_eq!(activity_count(engine.world(), citizen), 0);

            for _ in 0..steps {
                engine.step(0.1);
                prop_assert!(activity_violations(engine.world()).is_empty());
            }
        }
    }

    #[test]
    fn population_capacity_counts_constructed_only(
        buildings in prop::collection::vec((building_type(), any::<bool>()), 0..12),
    ) {
        let mut world = World::new();
        let mut expected = 0;
        let mut unfinished = Vec::new();
        for (i, (kind, constructed)) in buildings.into_iter().enumerate() {
            let building = if constructed {
                expected += kind.def().provides_population;
                Building::constructed(kind)
            } else {
                Building::new(kind)
            };
            let entity = world.spawn((building, Position::new(i as f32 * 10.0, 0.0)));
            if !constructed {
                unfinished.push((entity, kind));
            }
        }
        prop_assert_eq!(population_capacity(&world), expected);

        for (entity, kind) in unfinished {
            let before = population_capacity(&world);
            apply_construction_work(&mut world, entity, kind.def().work_required);
            prop_assert_eq!(population_capacity(&world), before + kind.def().provides_population);
        }
    }
}
