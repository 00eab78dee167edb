// Benchmark Report Types
// Structured output for comparing scenario behavior across engine changes

use serde::Serialize;

// ─── Statistics (per-metric Monte Carlo aggregation) ────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, ci_lower: 0.0, ci_upper: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std_dev = variance.sqrt();
        let stderr = std_dev / (n as f64).sqrt();
        let z = 1.96; // 95% CI
        Self {
            mean,
            std_dev,
            ci_lower: mean - z * stderr,
            ci_upper: mean + z * stderr,
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }

    pub fn half_width(&self) -> f64 {
        (self.ci_upper - self.ci_lower) / 2.0
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct BenchResult {
    pub scenario: String,
    pub seed: u64,
    pub pass: bool,
    pub completed: bool,
    pub total_spawned: u32,
    pub total_passed: u32,
    pub total_dropped: u32,
    pub total_stranded: u32,
    pub overall_pass_rate: u32,
    pub top_bottleneck: Option<String>,
    pub frames: u32,
    pub sim_seconds: f64,
    pub elapsed_ms: f64,
}

// ─── Monte Carlo Report (per-scenario aggregation) ──────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    pub scenario_name: String,
    pub label: String,
    pub category: String,
    pub n_runs: usize,
    pub pass_rate: f64,
    pub overall_pass_rate: Stats,
    pub dropped: Stats,
    pub stranded: Stats,
    pub sim_seconds: Stats,
    pub elapsed_ms: Stats,
    pub individual_runs: Vec<BenchResult>,
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub frame_ms: f64,
    pub n_runs_per_scenario: usize,
    pub summary: Summary,
    pub scenarios: Vec<MonteCarloReport>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_from_samples() {
        let s = Stats::from_samples(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(s.n, 4);
        assert!((s.mean - 2.5).abs() < 1e-12);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert!(s.ci_lower < s.mean && s.mean < s.ci_upper);
        assert!((s.half_width() - 1.96 * s.std_dev / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_stats_empty_and_single() {
        assert_eq!(Stats::from_samples(&[]).n, 0);
        let one = Stats::from_samples(&[5.0]);
        assert_eq!(one.std_dev, 0.0);
        assert_eq!(one.ci_lower, 5.0);
    }
}
