//! Homestead Headless Simulation Harness
//!
//! Runs end-to-end settlement scenarios against the core engine.
//! Entirely in-process: no renderer, no window, no input.
//!
//! Usage:
//!   cargo run -p homestead-simtest
//!   cargo run -p homestead-simtest -- --verbose
//!   cargo run -p homestead-simtest -- --config settlement.toml --dump

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use homestead_core::generation::SettlementConfig;
use homestead_core::persistence::SnapshotSummary;
use homestead_core::prelude::*;
use homestead_core::systems::activity_violations;
use serde::Serialize;

const FRAME: f32 = 1.0 / 60.0;

// ── Test harness ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    passed: usize,
    failed: usize,
    results: &'a [TestResult],
    final_state: Option<SnapshotSummary>,
}

struct Args {
    verbose: bool,
    dump: bool,
    config: Option<String>,
}

fn parse_args() -> Args {
    let mut args = Args {
        verbose: false,
        dump: false,
        config: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--verbose" | "-v" => args.verbose = true,
            "--dump" => args.dump = true,
            "--config" => args.config = iter.next(),
            other => eprintln!("ignoring unknown argument {other}"),
        }
    }
    args
}

fn main() {
    let args = parse_args();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    println!("=== Homestead Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Configuration
    let config = match load_config(args.config.as_deref(), &mut results) {
        Some(config) => config,
        None => {
            finish(&results, None, &args);
            return;
        }
    };

    // 2. Definition tables
    results.extend(validate_definitions());

    // 3. Gathering economy
    let economy = run_economy(&config, &mut results);

    // 4. Construction
    results.extend(validate_construction(&config));

    // 5. Time control
    results.extend(validate_time_control(&config));

    // 6. Save / load
    results.extend(validate_persistence(&economy));

    // 7. Starvation
    results.extend(validate_starvation(&config));

    let summary = args.dump.then(|| economy.snapshot().summary());
    finish(&results, summary, &args);
}

fn finish(results: &[TestResult], summary: Option<SnapshotSummary>, args: &Args) {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    if args.dump {
        let report = Report {
            passed,
            failed,
            results,
            final_state: summary,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("\n{json}"),
            Err(e) => eprintln!("could not encode report: {e}"),
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed,
        results.len(),
        failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

/// Run `seconds` of simulated time at 60 frames per second
fn run_for(engine: &mut SimulationEngine, seconds: f32) {
    let frames = (seconds / FRAME).round() as u32;
    for _ in 0..frames {
        engine.update(FRAME);
    }
}

// ── 1. Configuration ────────────────────────────────────────────────────

fn load_config(path: Option<&str>, results: &mut Vec<TestResult>) -> Option<SimulationConfig> {
    println!("--- Configuration ---");
    let config = match path {
        Some(path) => match SimulationConfig::load(path) {
            Ok(config) => {
                results.push(TestResult::new("config_load", true, format!("loaded {path}")));
                config
            }
            Err(e) => {
                results.push(TestResult::new("config_load", false, format!("{path}: {e}")));
                return None;
            }
        },
        None => SimulationConfig::default(),
    };

    results.push(TestResult::new(
        "config_positive_step",
        config.fixed_step > 0.0,
        format!("fixed step {}s", config.fixed_step),
    ));
    results.push(TestResult::new(
        "config_speed_presets",
        !config.speed_presets.is_empty() && config.speed_presets.iter().all(|p| *p > 0.0),
        format!("presets {:?}", config.speed_presets),
    ));
    Some(config)
}

// ── 2. Definitions ──────────────────────────────────────────────────────

fn validate_definitions() -> Vec<TestResult> {
    println!("--- Definitions ---");
    let mut results = Vec::new();

    let free: Vec<&str> = BuildingType::ALL
        .iter()
        .filter(|k| k.def().cost.iter().all(|(_, amount)| *amount == 0))
        .map(|k| k.def().name)
        .collect();
    results.push(TestResult::new(
        "buildings_have_costs",
        free.is_empty(),
        if free.is_empty() {
            "every building costs something".to_string()
        } else {
            format!("free buildings: {}", free.join(", "))
        },
    ));

    let drop_offs = BuildingType::ALL.iter().filter(|k| k.def().drop_off).count();
    results.push(TestResult::new(
        "drop_off_exists",
        drop_offs > 0,
        format!("{drop_offs} drop-off building kinds"),
    ));

    let unharvested: Vec<&str> = ResourceType::ALL
        .iter()
        .filter(|r| !JobType::ALL.iter().any(|j| j.def().gathers == Some(**r)))
        .map(|r| r.name())
        .collect();
    results.push(TestResult::new(
        "every_resource_gatherable",
        unharvested.is_empty(),
        format!("ungathered: {unharvested:?}"),
    ));
    results
}

// ── 3. Economy ──────────────────────────────────────────────────────────

fn run_economy(config: &SimulationConfig, results: &mut Vec<TestResult>) -> SimulationEngine {
    println!("--- Gathering Economy ---");
    let mut engine = SimulationEngine::new(config.clone());
    let layout = engine.generate(&SettlementConfig::default());

    let produced = Rc::new(RefCell::new(BTreeMap::<ResourceType, u32>::new()));
    let sink = Rc::clone(&produced);
    let _sub = engine.events().on(EventKind::ResourceProduced, move |e, _| {
        if let GameEvent::ResourceProduced { resource, amount } = e {
            *sink.borrow_mut().entry(*resource).or_default() += amount;
        }
    });

    let mut violations = 0;
    for _ in 0..120 {
        run_for(&mut engine, 1.0);
        violations += activity_violations(engine.world()).len();
    }

    tracing::info!(
        ticks = engine.ticks(),
        population = engine.population(),
        "economy run finished"
    );

    let produced = produced.borrow();
    for resource in [ResourceType::Wood, ResourceType::Stone] {
        let amount = produced.get(&resource).copied().unwrap_or(0);
        results.push(TestResult::new(
            &format!("economy_{}_delivered", resource.name().to_lowercase()),
            amount > 0,
            format!("{amount} delivered in 120s"),
        ));
    }
    results.push(TestResult::new(
        "economy_single_activity",
        violations == 0,
        format!("{violations} activity conflicts observed"),
    ));
    results.push(TestResult::new(
        "economy_population_alive",
        engine.population() as usize == layout.citizens.len(),
        format!("{}/{} citizens alive", engine.population(), layout.citizens.len()),
    ));
    engine
}

// ── 4. Construction ─────────────────────────────────────────────────────

fn validate_construction(config: &SimulationConfig) -> Vec<TestResult> {
    println!("--- Construction ---");
    let mut results = Vec::new();
    let mut engine = SimulationEngine::new(config.clone());
    engine.generate(&SettlementConfig {
        starting_jobs: vec![JobType::Builder; 3],
        ..SettlementConfig::default()
    });

    let before = engine.population_capacity();
    let house = match engine.place_building(BuildingType::House, Vec3::ground(0.0, 10.0)) {
        Ok(house) => house,
        Err(e) => {
            results.push(TestResult::new("construction_place", false, e.to_string()));
            return results;
        }
    };
    results.push(TestResult::new(
        "construction_unfinished_adds_nothing",
        engine.population_capacity() == before,
        format!("capacity {before} after placing"),
    ));

    run_for(&mut engine, 60.0);

    let done = engine
        .world()
        .get::<Building>(house)
        .map(|b| b.constructed)
        .unwrap_or(false);
    results.push(TestResult::new("construction_completed", done, format!("house constructed: {done}")));
    let expected = before + BuildingType::House.def().provides_population;
    results.push(TestResult::new(
        "construction_capacity_raised",
        engine.population_capacity() == expected,
        format!("capacity {} (expected {expected})", engine.population_capacity()),
    ));

    let rejected = engine.place_building(BuildingType::House, Vec3::ground(0.0, 10.0));
    results.push(TestResult::new(
        "construction_overlap_rejected",
        matches!(
            rejected,
            Err(PlacementError::InvalidPlacement(PlacementViolation::Overlaps(_)))
        ),
        format!("{rejected:?}"),
    ));
    results
}

// ── 5. Time control ─────────────────────────────────────────────────────

fn validate_time_control(config: &SimulationConfig) -> Vec<TestResult> {
    println!("--- Time Control ---");
    let mut results = Vec::new();
    let mut engine = SimulationEngine::new(config.clone());

    engine.pause();
    let steps = engine.update(1.0);
    results.push(TestResult::new("time_paused_no_steps", steps == 0, format!("{steps} steps while paused")));

    let _ = engine.set_time_scale(3.0);
    let paused_scale = engine.time().effective_scale();
    engine.resume();
    results.push(TestResult::new(
        "time_scale_applies_on_resume",
        paused_scale == 0.0 && engine.time().effective_scale() == 3.0,
        format!("paused {paused_scale}, resumed {}", engine.time().effective_scale()),
    ));

    let start = engine.sim_time();
    run_for(&mut engine, 1.0);
    let elapsed = engine.sim_time() - start;
    results.push(TestResult::new(
        "time_scaled_delta",
        (elapsed - 3.0).abs() < 0.01,
        format!("{elapsed:.3}s simulated in 1s at 3x"),
    ));
    results
}

// ── 6. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(engine: &SimulationEngine) -> Vec<TestResult> {
    println!("--- Save / Load ---");
    let mut results = Vec::new();

    let mut buffer = Vec::new();
    if let Err(e) = engine.save(&mut buffer) {
        results.push(TestResult::new("persistence_save", false, e.to_string()));
        return results;
    }
    results.push(TestResult::new("persistence_save", true, format!("{} bytes", buffer.len())));

    let mut loaded = SimulationEngine::new(engine.config().clone());
    match loaded.load(&buffer[..]) {
        Ok(()) => {
            let same = loaded.snapshot() == engine.snapshot();
            results.push(TestResult::new("persistence_roundtrip", same, "snapshot identical after load"));
            results.push(TestResult::new(
                "persistence_caches",
                loaded.population_capacity() == engine.population_capacity(),
                format!("population capacity {}", loaded.population_capacity()),
            ));
        }
        Err(e) => results.push(TestResult::new("persistence_roundtrip", false, e.to_string())),
    }
    results
}

// ── 7. Starvation ───────────────────────────────────────────────────────

fn validate_starvation(config: &SimulationConfig) -> Vec<TestResult> {
    println!("--- Starvation ---");
    let mut results = Vec::new();
    let mut engine = SimulationEngine::new(SimulationConfig {
        hunger_rate: 20.0,
        starvation_damage: 50.0,
        starting_resources: BTreeMap::new(),
        ..config.clone()
    });
    engine.generate(&SettlementConfig {
        starting_jobs: vec![JobType::Idle; 3],
        berry_bushes: 0,
        ..SettlementConfig::default()
    });

    let deaths = Rc::new(RefCell::new(0u32));
    let sink = Rc::clone(&deaths);
    let _sub = engine
        .events()
        .on(EventKind::CitizenDied, move |_, _| *sink.borrow_mut() += 1);

    run_for(&mut engine, 10.0);

    let died = *deaths.borrow();
    results.push(TestResult::new(
        "starvation_kills",
        died == 3 && engine.population() == 0,
        format!("{died} deaths, {} alive", engine.population()),
    ));
    results
}
