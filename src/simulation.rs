// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Funnel Simulation Engine - Simulation Core

use wasm_bindgen::prelude::*;

use crate::config::{validate_speed, ConfigError, RunConfig};
use crate::layout::{normalize_layout, DEFAULT_PADDING};
use crate::particle::{self, Topology};
use crate::render::Snapshot;
use crate::results::{self, SimulationReport};
use crate::rng::RandomSource;
use crate::scheduler::SimulationClock;
use crate::stats::{self, FlowTally, RunStatus};
use crate::types::*;

/// Particles created per spawn firing.
pub const SPAWN_BATCH: u32 = 10;

// ─── FunnelSimulation struct ─────────────────────────────────────────────────

/// One simulation per view. All mutable run state lives here.
#[wasm_bindgen]
pub struct FunnelSimulation {
    pub(crate) graph: FunnelGraph,
    pub(crate) topology: Topology,
    pub(crate) particles: Vec<Particle>,
    pub(crate) tally: FlowTally,
    pub(crate) clock: SimulationClock,
    pub(crate) config: RunConfig,
    pub(crate) stats: SimStats,

    pub(crate) width: f64,
    pub(crate) height: f64,

    pub(crate) next_particle_id: u64,
    pub(crate) spawned: u32,

    pub(crate) rng: Box<dyn RandomSource>,
}

// ─── Internal Logic (Testable, pure Rust) ────────────────────────────────────

impl FunnelSimulation {
    pub fn with_random(rng: Box<dyn RandomSource>) -> Self {
        Self {
            graph: FunnelGraph::default(),
            topology: Topology::default(),
            particles: Vec::new(),
            tally: FlowTally::default(),
            clock: SimulationClock::new(),
            config: RunConfig::default(),
            stats: SimStats::default(),
            width: 0.0,
            height: 0.0,
            next_particle_id: 0,
            spawned: 0,
            rng,
        }
    }

    /// Reset every piece of run state and begin a new run.
    pub fn start(
        &mut self,
        graph: FunnelGraph,
        config: RunConfig,
        width: f64,
        height: f64,
    ) -> Result<(), ConfigError> {
        config.validate()?;
        self.clock.stop();

        let coords = normalize_layout(&graph.nodes, width, height, DEFAULT_PADDING);
        self.topology = Topology::new(&graph, coords);
        self.tally = FlowTally::new(&self.topology);
        self.graph = graph;
        self.config = config;
        self.width = width;
        self.height = height;
        self.particles.clear();
        self.next_particle_id = 0;
        self.spawned = 0;

        if !self.topology.has_sources() {
            log::warn!("funnel has no traffic node; no particles will spawn");
        }
        log::debug!(
            "starting run: {} nodes, {} edges, {} particles at {}x",
            self.graph.nodes.len(),
            self.graph.edges.len(),
            config.total_particles,
            config.speed
        );

        self.clock.start(config.speed);
        self.refresh_stats();
        Ok(())
    }

    /// Feed one real frame delta. Returns whether the run is still going.
    pub fn advance(&mut self, real_dt_ms: f64) -> bool {
        let plan = self.clock.tick(real_dt_ms);

        for _ in 0..plan.spawn_batches {
            self.spawn_batch();
        }
        if let Some(dt) = plan.sim_dt {
            self.step_particles(dt);
        }
        if plan.stats_due {
            self.refresh_stats();
            if self.stats.is_complete && self.clock.is_running() {
                self.finish();
            }
        }
        self.clock.is_running()
    }

    /// Change the speed multiplier without touching run state.
    pub fn change_speed(&mut self, speed: u32) -> Result<(), ConfigError> {
        validate_speed(speed)?;
        self.config.speed = speed;
        self.clock.set_speed(speed);
        self.stats.speed = speed;
        Ok(())
    }

    /// Cancel all timers and take a final snapshot. Safe to repeat.
    pub fn halt(&mut self) {
        if self.clock.stop() {
            log::debug!("run stopped after {} frames", self.clock.frames());
            self.refresh_stats();
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn node_coords(&self) -> &[NodeCoord] {
        self.topology.coords()
    }

    pub fn edge_flows(&self) -> &EdgeFlows {
        self.tally.edge_flows()
    }

    /// Last periodic snapshot.
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    pub fn config(&self) -> RunConfig {
        self.config
    }

    pub fn frames(&self) -> u64 {
        self.clock.frames()
    }

    /// Final report; only available once the run completed.
    pub fn results(&self) -> Option<SimulationReport> {
        if self.stats.is_complete {
            Some(results::analyze(&self.stats, self.topology.coords()))
        } else {
            None
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            width: self.width,
            height: self.height,
            coords: self.topology.coords(),
            edges: &self.graph.edges,
            flows: self.tally.edge_flows(),
            particles: &self.particles,
        }
    }

    fn spawn_batch(&mut self) {
        let remaining = self.config.total_particles.saturating_sub(self.spawned);
        let count = remaining.min(SPAWN_BATCH);

        for _ in 0..count {
            let source = match self.topology.pick_source(self.rng.as_mut()) {
                Some(s) => s,
                None => return,
            };
            let next = self.topology.pick_next(&source.id, self.rng.as_mut());
            self.next_particle_id += 1;
            let p = Particle::spawn(self.next_particle_id, source, next);
            self.tally.record_spawn(&p.from_node_id);
            self.particles.push(p);
            self.spawned += 1;
        }

        if self.spawned >= self.config.total_particles {
            self.clock.finish_spawning();
        }
    }

    fn step_particles(&mut self, dt: f64) {
        for p in self.particles.iter_mut().filter(|p| !p.is_faded()) {
            if let Some(t) = particle::step(p, dt, &self.topology, self.rng.as_mut()) {
                self.tally.record(&t);
            }
        }
    }

    pub(crate) fn refresh_stats(&mut self) {
        let status = RunStatus {
            total_particles: self.config.total_particles,
            spawned: self.spawned,
            is_running: self.clock.is_running(),
            is_paused: self.clock.is_paused(),
            speed: self.clock.speed(),
        };
        self.stats = stats::aggregate(&self.particles, &self.topology, &self.tally, status);
    }

    fn finish(&mut self) {
        self.clock.stop();
        self.refresh_stats();
        log::info!(
            "run complete: spawned={} passed={} dropped={} stranded={}",
            self.stats.total_spawned,
            self.stats.total_passed,
            self.stats.total_dropped,
            self.stats.total_stranded
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
