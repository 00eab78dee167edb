// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Funnel Simulation Engine - Results Analyzer
//
// Post-run report: overall pass rate, per-node rows for charting and the
// top bottlenecks ranked by drop rate.

use serde::{Deserialize, Serialize};

use crate::types::{NodeCoord, NodeKind, SimStats};

/// Nodes need more than this many arrivals to be ranked.
pub const MIN_ARRIVALS_FOR_RANKING: u32 = 3;
pub const MAX_BOTTLENECKS: usize = 3;

const HIGH_DROP_RATE: f64 = 0.7;
const MEDIUM_DROP_RATE: f64 = 0.5;

// ─── Severity ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn from_drop_rate(rate: f64) -> Self {
        if rate > HIGH_DROP_RATE {
            Self::High
        } else if rate > MEDIUM_DROP_RATE {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

// ─── Report types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeResultRow {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub arrived: u32,
    pub passed: u32,
    pub dropped: u32,
    /// `dropped / arrived`, 0 when nothing arrived.
    pub drop_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bottleneck {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub drop_rate: f64,
    pub severity: Severity,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    /// Percentage of spawned particles that converted at a revenue node.
    pub overall_pass_rate: u32,
    pub total_spawned: u32,
    pub total_passed: u32,
    pub total_dropped: u32,
    pub total_stranded: u32,
    pub rows: Vec<NodeResultRow>,
    pub bottlenecks: Vec<Bottleneck>,
}

// ─── Suggestions ─────────────────────────────────────────────────────────────

/// Canned improvement advice per node type.
pub fn suggestions_for(kind: NodeKind) -> &'static [&'static str] {
    match kind {
        NodeKind::Traffic => &[
            "Target keywords that match the audience's search intent",
            "Diversify acquisition channels beyond a single source",
            "Improve titles and thumbnails to raise click-through",
        ],
        NodeKind::Content => &[
            "Put the key answer in the first paragraph",
            "Add images and subheadings to improve readability",
            "Link related posts to extend time on page",
        ],
        NodeKind::Conversion => &[
            "Make the call to action more visible and specific",
            "Reduce the number of form fields",
            "Add reviews or testimonials near the offer",
        ],
        NodeKind::Revenue => &[
            "Simplify the checkout steps",
            "Offer more payment options",
            "Follow up on abandoned purchases",
        ],
    }
}

// ─── Analysis ────────────────────────────────────────────────────────────────

pub fn overall_pass_rate(total_passed: u32, total_spawned: u32) -> u32 {
    if total_spawned == 0 {
        return 0;
    }
    (total_passed as f64 / total_spawned as f64 * 100.0).round() as u32
}

/// Build the final report from the last stats snapshot and the run's layout.
pub fn analyze(stats: &SimStats, coords: &[NodeCoord]) -> SimulationReport {
    let rows: Vec<NodeResultRow> = coords
        .iter()
        .map(|c| {
            let s = stats.node_stats.get(&c.id).copied().unwrap_or_default();
            NodeResultRow {
                id: c.id.clone(),
                label: c.label.clone(),
                kind: c.kind,
                arrived: s.arrived,
                passed: s.passed,
                dropped: s.dropped,
                drop_rate: if s.arrived > 0 { s.dropped as f64 / s.arrived as f64 } else { 0.0 },
            }
        })
        .collect();

    SimulationReport {
        overall_pass_rate: overall_pass_rate(stats.total_passed, stats.total_spawned),
        total_spawned: stats.total_spawned,
        total_passed: stats.total_passed,
        total_dropped: stats.total_dropped,
        total_stranded: stats.total_stranded,
        bottlenecks: rank_bottlenecks(&rows),
        rows,
    }
}

/// Top nodes by drop rate among those with enough arrivals.
pub fn rank_bottlenecks(rows: &[NodeResultRow]) -> Vec<Bottleneck> {
    let mut candidates: Vec<&NodeResultRow> = rows
        .iter()
        .filter(|r| r.arrived > MIN_ARRIVALS_FOR_RANKING)
        .collect();
    // Stable sort keeps layout order among equal rates.
    candidates.sort_by(|a, b| b.drop_rate.total_cmp(&a.drop_rate));

    candidates
        .into_iter()
        .take(MAX_BOTTLENECKS)
        .map(|r| Bottleneck {
            id: r.id.clone(),
            label: r.label.clone(),
            kind: r.kind,
            drop_rate: r.drop_rate,
            severity: Severity::from_drop_rate(r.drop_rate),
            suggestions: suggestions_for(r.kind).iter().map(|s| s.to_string()).collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
