// Funnel Benchmark Runner
// Monte Carlo over named funnel scenarios, seedable ChaCha8 PRNG, fixed frame delta
//
// Usage:
//   cargo run --release --bin bench                      # Run all scenarios (30 runs each)
//   cargo run --release --bin bench -- --runs 5          # Quick mode (5 runs each)
//   cargo run --release --bin bench -- DEAD_END          # Filter by name, label or category
//   cargo run --release --bin bench -- --seed 42         # Custom base seed
//   cargo run --release --bin bench -- --json results    # Write bench-<ts>.json into results/

mod monte_carlo;
mod report;
mod scenarios;

use report::*;
use scenarios::*;
use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

const PASS_THRESHOLD: f64 = 0.933;

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    runs: usize,
    seed: u64,
    json_dir: Option<PathBuf>,
    filter: Option<String>,
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs { runs: 30, seed: 0, json_dir: None, filter: None };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--runs" => {
                i += 1;
                if i < args.len() {
                    cli.runs = args[i].parse().unwrap_or(30);
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    cli.seed = args[i].parse().unwrap_or(0);
                }
            }
            "--json" => {
                i += 1;
                if i < args.len() {
                    cli.json_dir = Some(PathBuf::from(&args[i]));
                }
            }
            arg if !arg.starts_with('-') => {
                cli.filter = Some(arg.to_string());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    cli
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = parse_args();
    let all_scenarios = scenarios();

    let to_run: Vec<&Scenario> = match &cli.filter {
        Some(f) => {
            let f_lower = f.to_lowercase();
            all_scenarios
                .iter()
                .filter(|s| {
                    s.name.to_lowercase().contains(&f_lower)
                        || s.label.to_lowercase().contains(&f_lower)
                        || s.category.to_lowercase().contains(&f_lower)
                })
                .collect()
        }
        None => all_scenarios.iter().collect(),
    };

    if to_run.is_empty() {
        eprintln!("No scenarios match filter: {:?}", cli.filter);
        std::process::exit(1);
    }

    println!("\n  Funnel Benchmark Runner");
    println!(
        "  PRNG: ChaCha8Rng | Runs/scenario: {} | Base seed: {} | Frame: {}ms",
        cli.runs,
        cli.seed,
        monte_carlo::FRAME_MS
    );
    println!("  Running {} scenario(s)...\n", to_run.len());
    println!(
        "  {:<34} {:>5} {:>12} {:>12} {:>10} {:>9} {:>7}",
        "Scenario", "Pass%", "Overall%", "Dropped", "Stranded", "SimTime", "Time"
    );
    println!("  {}", "-".repeat(96));

    let suite_start = Instant::now();
    let mut mc_reports = Vec::new();

    for scenario in &to_run {
        let report = monte_carlo::run_monte_carlo(scenario, cli.runs, cli.seed)?;
        let status = if report.pass_rate >= PASS_THRESHOLD { "PASS" } else { "FAIL" };

        println!(
            "  {:<34} {:>4}% {:>6.1}±{:<4.1} {:>6.1}±{:<4.1} {:>10.1} {:>8.1}s {:>5.0}ms  {}",
            report.label,
            (report.pass_rate * 100.0) as u32,
            report.overall_pass_rate.mean,
            report.overall_pass_rate.half_width(),
            report.dropped.mean,
            report.dropped.half_width(),
            report.stranded.mean,
            report.sim_seconds.mean,
            report.elapsed_ms.mean,
            status,
        );

        mc_reports.push(report);
    }

    let suite_elapsed = suite_start.elapsed();

    // ─── Summary ────────────────────────────────────────────────────────

    let total = mc_reports.len();
    let passed = mc_reports.iter().filter(|r| r.pass_rate >= PASS_THRESHOLD).count();
    let failed = total - passed;

    println!("  {}", "-".repeat(96));
    println!(
        "  Total: {}  Passed: {}  Failed: {}  Suite time: {:.1}s\n",
        total,
        passed,
        failed,
        suite_elapsed.as_secs_f64()
    );

    // ─── Write JSON Report ──────────────────────────────────────────────

    if let Some(dir) = &cli.json_dir {
        let ts = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
        let timestamp = format!("{}", ts);

        let report = BenchReport {
            timestamp: timestamp.clone(),
            version: env!("CARGO_PKG_VERSION"),
            prng: "ChaCha8Rng",
            frame_ms: monte_carlo::FRAME_MS,
            n_runs_per_scenario: cli.runs,
            summary: Summary {
                total,
                passed,
                failed,
                pass_rate: passed as f64 / total as f64,
            },
            scenarios: mc_reports,
        };

        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("bench-{}.json", timestamp));
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        println!("  Results saved to: {}\n", path.display());
    }

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
