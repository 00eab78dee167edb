// Monte Carlo Infrastructure - N runs per scenario with statistical aggregation
// Run i uses seed `base_seed + i`; every run is driven with a fixed frame delta.

use funnel_engine::{FunnelSimulation, RunConfig};

use crate::report::*;
use crate::scenarios::Scenario;

use std::time::Instant;

/// Simulated frame delta fed to the engine.
pub const FRAME_MS: f64 = 16.0;
/// Guard against runs that can never complete.
const MAX_FRAMES: u32 = 200_000;

/// Run a single scenario iteration with a specific seed.
pub fn run_single(scenario: &Scenario, seed: u64) -> Result<BenchResult, String> {
    let start = Instant::now();
    let config =
        RunConfig::new(scenario.total_particles, scenario.speed).map_err(|e| e.to_string())?;

    let mut sim = FunnelSimulation::new(seed);
    sim.start((scenario.graph)(), config, 800.0, 500.0).map_err(|e| e.to_string())?;

    let mut frames = 0u32;
    while sim.advance(FRAME_MS) {
        frames += 1;
        if frames >= MAX_FRAMES {
            eprintln!("  WARNING: {} seed {} hit the frame limit", scenario.name, seed);
            sim.stop();
            break;
        }
    }

    let stats = sim.stats().clone();
    let report = sim.results();
    let completed = report.is_some();
    let overall_pass_rate = report.as_ref().map(|r| r.overall_pass_rate).unwrap_or(0);
    let accounted = stats.total_passed + stats.total_dropped + stats.total_stranded;

    let c = &scenario.criteria;
    let pass = completed
        && accounted == stats.total_spawned
        && overall_pass_rate >= c.min_pass_pct
        && overall_pass_rate <= c.max_pass_pct
        && (!c.require_stranded || stats.total_stranded > 0);

    Ok(BenchResult {
        scenario: scenario.name.to_string(),
        seed,
        pass,
        completed,
        total_spawned: stats.total_spawned,
        total_passed: stats.total_passed,
        total_dropped: stats.total_dropped,
        total_stranded: stats.total_stranded,
        overall_pass_rate,
        top_bottleneck: report.and_then(|r| r.bottlenecks.first().map(|b| b.id.clone())),
        frames,
        sim_seconds: frames as f64 * FRAME_MS * scenario.speed as f64 / 1000.0,
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    })
}

/// Run `n_runs` seeded iterations and aggregate them.
pub fn run_monte_carlo(
    scenario: &Scenario,
    n_runs: usize,
    base_seed: u64,
) -> Result<MonteCarloReport, String> {
    let runs = (0..n_runs as u64)
        .map(|i| run_single(scenario, base_seed + i))
        .collect::<Result<Vec<_>, _>>()?;

    let sample = |f: fn(&BenchResult) -> f64| -> Stats {
        Stats::from_samples(&runs.iter().map(f).collect::<Vec<_>>())
    };

    let passed = runs.iter().filter(|r| r.pass).count();

    Ok(MonteCarloReport {
        scenario_name: scenario.name.to_string(),
        label: scenario.label.to_string(),
        category: scenario.category.to_string(),
        n_runs,
        pass_rate: if n_runs > 0 { passed as f64 / n_runs as f64 } else { 0.0 },
        overall_pass_rate: sample(|r| r.overall_pass_rate as f64),
        dropped: sample(|r| r.total_dropped as f64),
        stranded: sample(|r| r.total_stranded as f64),
        sim_seconds: sample(|r| r.sim_seconds),
        elapsed_ms: sample(|r| r.elapsed_ms),
        individual_runs: runs,
    })
}
