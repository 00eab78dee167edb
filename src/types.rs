// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Funnel Simulation Engine - Type Definitions

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ─── Node Kind ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Traffic = 0,
    Content = 1,
    Conversion = 2,
    Revenue = 3,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Traffic => "traffic",
            Self::Content => "content",
            Self::Conversion => "conversion",
            Self::Revenue => "revenue",
        }
    }
}

// ─── Funnel Graph (editor output) ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub traffic_weight: f64,
    /// Percentage in 0..=100.
    #[serde(default)]
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunnelNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub position: Position,
    #[serde(default)]
    pub data: NodeData,
}

impl FunnelNode {
    pub fn new(id: &str, kind: NodeKind, x: f64, y: f64, conversion_rate: f64) -> Self {
        Self {
            id: id.to_string(),
            kind,
            position: Position { x, y },
            data: NodeData {
                label: id.to_string(),
                traffic_weight: if kind == NodeKind::Traffic { 1.0 } else { 0.0 },
                conversion_rate,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FunnelEdge {
    pub source: String,
    pub target: String,
}

impl FunnelEdge {
    pub fn new(source: &str, target: &str) -> Self {
        Self { source: source.to_string(), target: target.to_string() }
    }

    /// Key used by the edge-flow map.
    pub fn flow_key(&self) -> String {
        flow_key(&self.source, &self.target)
    }
}

pub fn flow_key(source: &str, target: &str) -> String {
    format!("{}-{}", source, target)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FunnelGraph {
    #[serde(default)]
    pub nodes: Vec<FunnelNode>,
    #[serde(default)]
    pub edges: Vec<FunnelEdge>,
}

impl FunnelGraph {
    pub fn node(&self, id: &str) -> Option<&FunnelNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Targets of every edge leaving `id`, in edge order.
    pub fn outgoing(&self, id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.source == id)
            .map(|e| e.target.as_str())
            .collect()
    }
}

// ─── NodeCoord (canvas space, per run) ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeCoord {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub label: String,
    pub conversion_rate: f64,
}

// ─── Particle State ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParticleState {
    Spawning = 0,
    Moving = 1,
    Arriving = 2,
    Deciding = 3,
    Passed = 4,  // TERMINAL
    Dropped = 5, // TERMINAL
}

impl ParticleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Dropped)
    }

    /// States in which a particle sits at `from_node_id` rather than on an edge.
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Spawning | Self::Arriving | Self::Deciding)
    }
}

// ─── Particle ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrailPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Particle {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub from_node_id: String,
    pub to_node_id: Option<String>,
    pub progress: f64,
    pub state: ParticleState,
    pub opacity: f64,
    pub trail: Vec<TrailPoint>,
    pub state_timer: f64,
    pub velocity_y: f64,
    /// Set only when the particle passed at a revenue node.
    #[serde(default)]
    pub converted: bool,
}

impl Particle {
    pub fn spawn(id: u64, at: &NodeCoord, next: Option<String>) -> Self {
        Self {
            id,
            x: at.x,
            y: at.y,
            from_node_id: at.id.clone(),
            to_node_id: next,
            progress: 0.0,
            state: ParticleState::Spawning,
            opacity: 0.0,
            trail: Vec::new(),
            state_timer: 0.0,
            velocity_y: 0.0,
            converted: false,
        }
    }

    /// Terminal and no longer visible.
    pub fn is_faded(&self) -> bool {
        self.state.is_terminal() && self.opacity <= 0.0
    }

    /// Counted toward run progress: passed, or dropped and fully faded.
    pub fn is_finalized(&self) -> bool {
        match self.state {
            ParticleState::Passed => true,
            ParticleState::Dropped => self.opacity <= 0.0,
            _ => false,
        }
    }
}

// ─── Edge Flows ──────────────────────────────────────────────────────────────

pub type EdgeFlows = HashMap<String, u32>;

// ─── Statistics ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeStats {
    pub arrived: u32,
    pub passed: u32,
    pub dropped: u32,
    /// Live particles currently sitting at the node.
    #[serde(default)]
    pub waiting: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SimStats {
    pub total_spawned: u32,
    pub total_passed: u32,
    pub total_dropped: u32,
    #[serde(default)]
    pub total_stranded: u32,
    pub node_stats: HashMap<String, NodeStats>,
    pub is_running: bool,
    #[serde(default)]
    pub is_paused: bool,
    pub is_complete: bool,
    pub progress: f64,
    #[serde(default)]
    pub speed: u32,
}
