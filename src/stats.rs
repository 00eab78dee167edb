// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Funnel Simulation Engine - Statistics Aggregator

use std::collections::HashMap;

use crate::particle::{Topology, Transition};
use crate::types::{flow_key, EdgeFlows, NodeKind, NodeStats, Particle, ParticleState, SimStats};

// ---------------------------------------------------------------------------
// FlowTally - cumulative counters fed by particle transitions
// ---------------------------------------------------------------------------

/// Per-node arrival/pass/drop counters and per-edge completion counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowTally {
    nodes: HashMap<String, NodeStats>,
    edges: EdgeFlows,
}

impl FlowTally {
    pub fn new(topo: &Topology) -> Self {
        let nodes = topo
            .coords()
            .iter()
            .map(|c| (c.id.clone(), NodeStats::default()))
            .collect();
        Self { nodes, edges: EdgeFlows::new() }
    }

    /// A freshly spawned particle counts as an arrival at its traffic node.
    pub fn record_spawn(&mut self, node: &str) {
        self.node_mut(node).arrived += 1;
    }

    pub fn record(&mut self, transition: &Transition) {
        match transition {
            Transition::Departed { node, .. } => self.node_mut(node).passed += 1,
            Transition::Arrived { from, node } => {
                *self.edges.entry(flow_key(from, node)).or_insert(0) += 1;
                self.node_mut(node).arrived += 1;
            }
            Transition::Passed { node, .. } => self.node_mut(node).passed += 1,
            Transition::Dropped { node } => self.node_mut(node).dropped += 1,
            Transition::Aborted { .. } => {}
        }
    }

    pub fn node_stats(&self) -> &HashMap<String, NodeStats> {
        &self.nodes
    }

    pub fn edge_flows(&self) -> &EdgeFlows {
        &self.edges
    }

    fn node_mut(&mut self, id: &str) -> &mut NodeStats {
        self.nodes.entry(id.to_string()).or_default()
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Run-level inputs to a snapshot that the particle set cannot tell us.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunStatus {
    pub total_particles: u32,
    pub spawned: u32,
    pub is_running: bool,
    pub is_paused: bool,
    pub speed: u32,
}

/// Recompute `SimStats` from the live particle set and the cumulative tally.
pub fn aggregate(
    particles: &[Particle],
    topo: &Topology,
    tally: &FlowTally,
    status: RunStatus,
) -> SimStats {
    let mut node_stats = tally.node_stats().clone();
    for stats in node_stats.values_mut() {
        stats.waiting = 0;
    }

    let mut total_passed = 0u32;
    let mut total_stranded = 0u32;
    let mut total_dropped = 0u32;
    let mut finalized = 0u32;

    for p in particles {
        if p.state.is_waiting() {
            node_stats.entry(p.from_node_id.clone()).or_default().waiting += 1;
        }
        match p.state {
            ParticleState::Passed => {
                let at_revenue = topo
                    .coord(&p.from_node_id)
                    .map(|c| c.kind == NodeKind::Revenue)
                    .unwrap_or(false);
                if at_revenue {
                    total_passed += 1;
                } else {
                    total_stranded += 1;
                }
            }
            ParticleState::Dropped => total_dropped += 1,
            _ => {}
        }
        if p.is_finalized() {
            finalized += 1;
        }
    }

    let is_complete = status.total_particles > 0
        && status.spawned >= status.total_particles
        && finalized >= status.total_particles;

    SimStats {
        total_spawned: status.spawned,
        total_passed,
        total_dropped,
        total_stranded,
        node_stats,
        is_running: status.is_running && !is_complete,
        is_paused: status.is_paused,
        is_complete,
        progress: progress(finalized, status.total_particles),
        speed: status.speed,
    }
}

/// Finalized share of the configured total, in percent.
pub fn progress(finalized: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (finalized as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
