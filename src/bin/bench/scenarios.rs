// Scenario Definitions
// Each scenario is a funnel graph plus the run settings and the band the
// overall pass rate is expected to land in.

use funnel_engine::{FunnelEdge, FunnelGraph, FunnelNode, NodeKind};

// ─── Scenario Configuration ─────────────────────────────────────────────────

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub total_particles: u32,
    pub speed: u32,
    pub graph: fn() -> FunnelGraph,
    pub criteria: PassCriteria,
}

pub struct PassCriteria {
    pub min_pass_pct: u32,
    pub max_pass_pct: u32,
    pub require_stranded: bool,
}

impl Default for PassCriteria {
    fn default() -> Self {
        Self { min_pass_pct: 0, max_pass_pct: 100, require_stranded: false }
    }
}

// ─── Graph Builders ─────────────────────────────────────────────────────────

fn node(id: &str, kind: NodeKind, x: f64, y: f64, rate: f64) -> FunnelNode {
    FunnelNode::new(id, kind, x, y, rate)
}

fn edges(pairs: &[(&str, &str)]) -> Vec<FunnelEdge> {
    pairs.iter().map(|(s, t)| FunnelEdge::new(s, t)).collect()
}

fn linear_funnel() -> FunnelGraph {
    FunnelGraph {
        nodes: vec![
            node("search", NodeKind::Traffic, 0.0, 200.0, 100.0),
            node("guide", NodeKind::Content, 250.0, 200.0, 70.0),
            node("signup", NodeKind::Conversion, 500.0, 200.0, 40.0),
            node("sale", NodeKind::Revenue, 750.0, 200.0, 100.0),
        ],
        edges: edges(&[("search", "guide"), ("guide", "signup"), ("signup", "sale")]),
    }
}

fn leaky_content() -> FunnelGraph {
    FunnelGraph {
        nodes: vec![
            node("search", NodeKind::Traffic, 0.0, 200.0, 100.0),
            node("thin-post", NodeKind::Content, 250.0, 200.0, 15.0),
            node("signup", NodeKind::Conversion, 500.0, 200.0, 80.0),
            node("sale", NodeKind::Revenue, 750.0, 200.0, 100.0),
        ],
        edges: edges(&[("search", "thin-post"), ("thin-post", "signup"), ("signup", "sale")]),
    }
}

fn dead_end_branch() -> FunnelGraph {
    FunnelGraph {
        nodes: vec![
            node("social", NodeKind::Traffic, 0.0, 200.0, 100.0),
            node("hub", NodeKind::Content, 250.0, 200.0, 100.0),
            node("offer", NodeKind::Conversion, 500.0, 100.0, 100.0),
            node("archive", NodeKind::Content, 500.0, 300.0, 100.0),
            node("sale", NodeKind::Revenue, 750.0, 100.0, 100.0),
        ],
        edges: edges(&[
            ("social", "hub"),
            ("hub", "offer"),
            ("hub", "archive"),
            ("offer", "sale"),
        ]),
    }
}

fn wide_top() -> FunnelGraph {
    let mut search = node("search", NodeKind::Traffic, 0.0, 100.0, 100.0);
    search.data.traffic_weight = 3.0;
    FunnelGraph {
        nodes: vec![
            search,
            node("newsletter", NodeKind::Traffic, 0.0, 300.0, 100.0),
            node("landing", NodeKind::Content, 300.0, 200.0, 60.0),
            node("sale", NodeKind::Revenue, 600.0, 200.0, 100.0),
        ],
        edges: edges(&[
            ("search", "landing"),
            ("newsletter", "landing"),
            ("landing", "sale"),
        ]),
    }
}

fn coin_flip() -> FunnelGraph {
    FunnelGraph {
        nodes: vec![
            node("ads", NodeKind::Traffic, 0.0, 0.0, 100.0),
            node("checkout", NodeKind::Conversion, 300.0, 0.0, 50.0),
            node("sale", NodeKind::Revenue, 600.0, 0.0, 100.0),
        ],
        edges: edges(&[("ads", "checkout"), ("checkout", "sale")]),
    }
}

// ─── Scenario Table ─────────────────────────────────────────────────────────

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "LINEAR_FUNNEL",
            label: "Linear funnel (70% x 40%)",
            category: "baseline",
            total_particles: 200,
            speed: 2,
            graph: linear_funnel,
            criteria: PassCriteria { min_pass_pct: 18, max_pass_pct: 38, ..Default::default() },
        },
        Scenario {
            name: "LEAKY_CONTENT",
            label: "Leaky content (15% post)",
            category: "bottleneck",
            total_particles: 200,
            speed: 2,
            graph: leaky_content,
            criteria: PassCriteria { min_pass_pct: 4, max_pass_pct: 22, ..Default::default() },
        },
        Scenario {
            name: "DEAD_END_BRANCH",
            label: "Dead-end branch (50/50 split)",
            category: "topology",
            total_particles: 100,
            speed: 2,
            graph: dead_end_branch,
            criteria: PassCriteria { min_pass_pct: 35, max_pass_pct: 65, require_stranded: true },
        },
        Scenario {
            name: "WIDE_TOP",
            label: "Wide top (two weighted sources)",
            category: "topology",
            total_particles: 200,
            speed: 2,
            graph: wide_top,
            criteria: PassCriteria { min_pass_pct: 48, max_pass_pct: 72, ..Default::default() },
        },
        Scenario {
            name: "FAST_RUN",
            label: "Fast run (4x, 200 particles)",
            category: "timing",
            total_particles: 200,
            speed: 4,
            graph: coin_flip,
            criteria: PassCriteria { min_pass_pct: 38, max_pass_pct: 62, ..Default::default() },
        },
    ]
}
