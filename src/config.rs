// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Funnel Simulation Engine - Run Configuration and Pre-flight Checks

use serde::{Deserialize, Serialize};

use crate::types::{FunnelGraph, NodeKind};

pub const PARTICLE_BUDGETS: [u32; 3] = [50, 100, 200];
pub const SPEEDS: [u32; 3] = [1, 2, 4];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Rejected run configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unsupported particle budget {0} (expected 50, 100 or 200)")]
    ParticleBudget(u32),
    #[error("unsupported speed {0}x (expected 1, 2 or 4)")]
    Speed(u32),
}

/// Reasons the host should refuse to start a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreflightError {
    #[error("the funnel has no nodes")]
    NoNodes,
    #[error("the funnel needs at least one traffic node")]
    NoTrafficNode,
    #[error("the funnel has no connections between nodes")]
    NoEdges,
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    #[serde(default = "default_total_particles")]
    pub total_particles: u32,
    #[serde(default = "default_speed")]
    pub speed: u32,
}

pub fn default_total_particles() -> u32 {
    100
}

pub fn default_speed() -> u32 {
    1
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { total_particles: default_total_particles(), speed: default_speed() }
    }
}

impl RunConfig {
    pub fn new(total_particles: u32, speed: u32) -> Result<Self, ConfigError> {
        let config = Self { total_particles, speed };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !PARTICLE_BUDGETS.contains(&self.total_particles) {
            return Err(ConfigError::ParticleBudget(self.total_particles));
        }
        validate_speed(self.speed)
    }
}

pub fn validate_speed(speed: u32) -> Result<(), ConfigError> {
    if SPEEDS.contains(&speed) {
        Ok(())
    } else {
        Err(ConfigError::Speed(speed))
    }
}

/// Checks the host runs before allowing `start()`.
pub fn preflight(graph: &FunnelGraph) -> Result<(), PreflightError> {
    if graph.nodes.is_empty() {
        return Err(PreflightError::NoNodes);
    }
    if !graph.nodes.iter().any(|n| n.kind == NodeKind::Traffic) {
        return Err(PreflightError::NoTrafficNode);
    }
    if graph.edges.is_empty() {
        return Err(PreflightError::NoEdges);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
