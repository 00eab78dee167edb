// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Funnel Simulation Engine - Particle State Machine
//
// Each particle holds exactly one state and is advanced once per frame by the
// speed-scaled frame delta. The deciding step is the only place a node's
// conversion rate governs the outcome.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::rng::RandomSource;
use crate::types::{FunnelGraph, NodeCoord, NodeKind, Particle, ParticleState, TrailPoint};

/// Fade-in after creation.
pub const SPAWN_FADE_MS: f64 = 300.0;
/// Nominal time to traverse one edge.
pub const TRAVEL_MS: f64 = 2000.0;
/// Blink duration on arrival.
pub const ARRIVE_BLINK_MS: f64 = 200.0;
/// Fade-out of a particle that passed.
pub const PASS_FADE_MS: f64 = 500.0;
/// Fade-out of a particle that dropped.
pub const DROP_FADE_MS: f64 = 1000.0;
/// Downward acceleration of dropped particles, px/ms².
pub const DROP_GRAVITY: f64 = 0.0004;
pub const TRAIL_LEN: usize = 5;

// ─── Topology ────────────────────────────────────────────────────────────────

/// Per-run lookup tables: canvas coordinates and outgoing hops by node id.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    coords: Vec<NodeCoord>,
    index: HashMap<String, usize>,
    outgoing: HashMap<String, Vec<String>>,
    sources: Vec<(usize, f64)>,
}

impl Topology {
    pub fn new(graph: &FunnelGraph, coords: Vec<NodeCoord>) -> Self {
        let index: HashMap<String, usize> = coords
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        let mut outgoing: HashMap<String, Vec<String>> = HashMap::new();
        for edge in &graph.edges {
            outgoing
                .entry(edge.source.clone())
                .or_default()
                .push(edge.target.clone());
        }
        let sources = graph
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Traffic)
            .filter_map(|n| index.get(&n.id).map(|&i| (i, n.data.traffic_weight)))
            .collect();
        Self { coords, index, outgoing, sources }
    }

    pub fn coords(&self) -> &[NodeCoord] {
        &self.coords
    }

    pub fn coord(&self, id: &str) -> Option<&NodeCoord> {
        self.index.get(id).map(|&i| &self.coords[i])
    }

    pub fn next_hops(&self, id: &str) -> &[String] {
        self.outgoing.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Uniformly chosen outgoing target of `id`, if any.
    pub fn pick_next(&self, id: &str, rng: &mut dyn RandomSource) -> Option<String> {
        let hops = self.next_hops(id);
        if hops.is_empty() {
            None
        } else {
            Some(hops[rng.index(hops.len())].clone())
        }
    }

    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    /// Traffic node for a new particle, weighted by traffic weight.
    pub fn pick_source(&self, rng: &mut dyn RandomSource) -> Option<&NodeCoord> {
        if self.sources.is_empty() {
            return None;
        }
        let weights: Vec<f64> = self.sources.iter().map(|&(_, w)| w).collect();
        let (i, _) = self.sources[rng.weighted_index(&weights)];
        Some(&self.coords[i])
    }
}

// ─── Transitions ─────────────────────────────────────────────────────────────

/// State change produced by a single step, reported to the run's counters.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Left `node` toward `to`.
    Departed { node: String, to: String },
    /// Completed the edge `from` → `node`.
    Arrived { from: String, node: String },
    /// Finished at `node`; `converted` only for revenue nodes.
    Passed { node: String, converted: bool },
    /// Failed the conversion draw at `node`.
    Dropped { node: String },
    /// A referenced node vanished; terminated as passed without counting.
    Aborted { node: String },
}

/// Advance `p` by `dt` milliseconds of simulated time.
pub fn step(
    p: &mut Particle,
    dt: f64,
    topo: &Topology,
    rng: &mut dyn RandomSource,
) -> Option<Transition> {
    p.state_timer += dt;
    match p.state {
        ParticleState::Spawning => step_spawning(p),
        ParticleState::Moving => step_moving(p, dt, topo),
        ParticleState::Arriving => step_arriving(p),
        ParticleState::Deciding => step_deciding(p, topo, rng),
        ParticleState::Passed => {
            p.opacity = (p.opacity - dt / PASS_FADE_MS).max(0.0);
            None
        }
        ParticleState::Dropped => {
            p.velocity_y += DROP_GRAVITY * dt;
            p.y += p.velocity_y * dt;
            p.opacity = (p.opacity - dt / DROP_FADE_MS).max(0.0);
            None
        }
    }
}

fn enter(p: &mut Particle, state: ParticleState) {
    p.state = state;
    p.state_timer = 0.0;
}

fn step_spawning(p: &mut Particle) -> Option<Transition> {
    p.opacity = (p.state_timer / SPAWN_FADE_MS).min(1.0);
    if p.state_timer < SPAWN_FADE_MS {
        return None;
    }
    p.opacity = 1.0;
    match p.to_node_id.clone() {
        Some(to) => {
            p.progress = 0.0;
            enter(p, ParticleState::Moving);
            Some(Transition::Departed { node: p.from_node_id.clone(), to })
        }
        None => {
            enter(p, ParticleState::Passed);
            Some(Transition::Passed { node: p.from_node_id.clone(), converted: false })
        }
    }
}

fn step_moving(p: &mut Particle, dt: f64, topo: &Topology) -> Option<Transition> {
    let to_id = match p.to_node_id.clone() {
        Some(id) => id,
        None => return Some(abort(p)),
    };
    let (from, to) = match (topo.coord(&p.from_node_id), topo.coord(&to_id)) {
        (Some(f), Some(t)) => (f, t),
        _ => {
            log::warn!("particle {} lost edge {} -> {}", p.id, p.from_node_id, to_id);
            return Some(abort(p));
        }
    };

    p.trail.push(TrailPoint { x: p.x, y: p.y });
    if p.trail.len() > TRAIL_LEN {
        p.trail.remove(0);
    }

    p.progress = (p.progress + dt / TRAVEL_MS).min(1.0);
    p.x = from.x + (to.x - from.x) * p.progress;
    p.y = from.y + (to.y - from.y) * p.progress;

    if p.progress < 1.0 {
        return None;
    }
    let from_id = std::mem::replace(&mut p.from_node_id, to_id.clone());
    p.to_node_id = None;
    p.progress = 0.0;
    enter(p, ParticleState::Arriving);
    Some(Transition::Arrived { from: from_id, node: to_id })
}

fn step_arriving(p: &mut Particle) -> Option<Transition> {
    let phase = p.state_timer / ARRIVE_BLINK_MS;
    p.opacity = 0.5 + 0.5 * (phase * 4.0 * PI).cos();
    if p.state_timer < ARRIVE_BLINK_MS {
        return None;
    }
    p.opacity = 1.0;
    enter(p, ParticleState::Deciding);
    None
}

fn step_deciding(
    p: &mut Particle,
    topo: &Topology,
    rng: &mut dyn RandomSource,
) -> Option<Transition> {
    let node = match topo.coord(&p.from_node_id) {
        Some(n) => n,
        None => {
            log::warn!("particle {} at unknown node {}", p.id, p.from_node_id);
            return Some(abort(p));
        }
    };
    let node_id = node.id.clone();

    if node.kind == NodeKind::Revenue {
        p.converted = true;
        enter(p, ParticleState::Passed);
        return Some(Transition::Passed { node: node_id, converted: true });
    }

    if rng.percent() < node.conversion_rate {
        match topo.pick_next(&node_id, rng) {
            Some(to) => {
                p.to_node_id = Some(to.clone());
                p.progress = 0.0;
                enter(p, ParticleState::Moving);
                Some(Transition::Departed { node: node_id, to })
            }
            None => {
                enter(p, ParticleState::Passed);
                Some(Transition::Passed { node: node_id, converted: false })
            }
        }
    } else {
        p.velocity_y = 0.0;
        enter(p, ParticleState::Dropped);
        Some(Transition::Dropped { node: node_id })
    }
}

fn abort(p: &mut Particle) -> Transition {
    p.to_node_id = None;
    enter(p, ParticleState::Passed);
    Transition::Aborted { node: p.from_node_id.clone() }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::normalize_layout;
    use crate::rng::SeededRandom;
    use crate::types::{FunnelEdge, FunnelNode};

    /// Replays a fixed list of draws, then repeats the last one.
    struct Scripted {
        draws: Vec<f64>,
        pos: usize,
    }

    impl Scripted {
        fn new(draws: &[f64]) -> Self {
            Self { draws: draws.to_vec(), pos: 0 }
        }
    }

    impl RandomSource for Scripted {
        fn next_f64(&mut self) -> f64 {
            let v = self.draws[self.pos.min(self.draws.len() - 1)];
            self.pos += 1;
            v
        }
    }

    fn topology(rate: f64) -> Topology {
        let graph = FunnelGraph {
            nodes: vec![
                FunnelNode::new("t", NodeKind::Traffic, 0.0, 0.0, 100.0),
                FunnelNode::new("c", NodeKind::Conversion, 100.0, 0.0, rate),
                FunnelNode::new("r", NodeKind::Revenue, 200.0, 0.0, 100.0),
            ],
            edges: vec![FunnelEdge::new("t", "c"), FunnelEdge::new("c", "r")],
        };
        let coords = normalize_layout(&graph.nodes, 800.0, 500.0, 80.0);
        Topology::new(&graph, coords)
    }

    fn particle_at(topo: &Topology, id: &str, state: ParticleState) -> Particle {
        let mut p = Particle::spawn(1, topo.coord(id).unwrap(), None);
        p.state = state;
        p.opacity = 1.0;
        p
    }

    #[test]
    fn test_spawning_fades_in_then_moves() {
        let topo = topology(50.0);
        let mut rng = Scripted::new(&[0.0]);
        let mut p = Particle::spawn(1, topo.coord("t").unwrap(), Some("c".into()));

        assert_eq!(step(&mut p, 150.0, &topo, &mut rng), None);
        assert!((p.opacity - 0.5).abs() < 1e-9);
        assert_eq!(p.state, ParticleState::Spawning);

        let t = step(&mut p, 150.0, &topo, &mut rng);
        assert_eq!(t, Some(Transition::Departed { node: "t".into(), to: "c".into() }));
        assert_eq!(p.state, ParticleState::Moving);
        assert_eq!(p.state_timer, 0.0);
        assert_eq!(p.opacity, 1.0);
    }

    #[test]
    fn test_spawning_without_next_hop_passes() {
        let topo = topology(50.0);
        let mut rng = Scripted::new(&[0.0]);
        let mut p = Particle::spawn(1, topo.coord("t").unwrap(), None);
        let t = step(&mut p, SPAWN_FADE_MS, &topo, &mut rng);
        assert_eq!(t, Some(Transition::Passed { node: "t".into(), converted: false }));
        assert_eq!(p.state, ParticleState::Passed);
        assert!(!p.converted);
    }

    #[test]
    fn test_moving_interpolates_and_arrives() {
        let topo = topology(50.0);
        let mut rng = Scripted::new(&[0.0]);
        let mut p = particle_at(&topo, "t", ParticleState::Moving);
        p.to_node_id = Some("c".into());
        let (tx, cx) = (topo.coord("t").unwrap().x, topo.coord("c").unwrap().x);

        assert_eq!(step(&mut p, TRAVEL_MS / 2.0, &topo, &mut rng), None);
        assert!((p.x - (tx + cx) / 2.0).abs() < 1e-9);

        let t = step(&mut p, TRAVEL_MS / 2.0, &topo, &mut rng);
        assert_eq!(t, Some(Transition::Arrived { from: "t".into(), node: "c".into() }));
        assert_eq!(p.state, ParticleState::Arriving);
        assert_eq!(p.from_node_id, "c");
        assert_eq!(p.to_node_id, None);
        assert!((p.x - cx).abs() < 1e-9);
    }

    #[test]
    fn test_trail_is_capped() {
        let topo = topology(50.0);
        let mut rng = Scripted::new(&[0.0]);
        let mut p = particle_at(&topo, "t", ParticleState::Moving);
        p.to_node_id = Some("c".into());
        for _ in 0..20 {
            step(&mut p, 16.0, &topo, &mut rng);
        }
        assert_eq!(p.trail.len(), TRAIL_LEN);
    }

    #[test]
    fn test_arriving_blinks_then_decides() {
        let topo = topology(50.0);
        let mut rng = Scripted::new(&[0.0]);
        let mut p = particle_at(&topo, "c", ParticleState::Arriving);
        step(&mut p, 50.0, &topo, &mut rng);
        assert!(p.opacity < 1.0);
        assert_eq!(p.state, ParticleState::Arriving);
        step(&mut p, 150.0, &topo, &mut rng);
        assert_eq!(p.state, ParticleState::Deciding);
        assert_eq!(p.opacity, 1.0);
    }

    #[test]
    fn test_deciding_below_rate_moves_on() {
        let topo = topology(50.0);
        // 0.49 * 100 = 49 < 50
        let mut rng = Scripted::new(&[0.49, 0.0]);
        let mut p = particle_at(&topo, "c", ParticleState::Deciding);
        let t = step(&mut p, 16.0, &topo, &mut rng);
        assert_eq!(t, Some(Transition::Departed { node: "c".into(), to: "r".into() }));
        assert_eq!(p.state, ParticleState::Moving);
        assert_eq!(p.to_node_id.as_deref(), Some("r"));
    }

    #[test]
    fn test_deciding_at_rate_drops() {
        let topo = topology(50.0);
        let mut rng = Scripted::new(&[0.5]);
        let mut p = particle_at(&topo, "c", ParticleState::Deciding);
        let t = step(&mut p, 16.0, &topo, &mut rng);
        assert_eq!(t, Some(Transition::Dropped { node: "c".into() }));
        assert_eq!(p.state, ParticleState::Dropped);
    }

    #[test]
    fn test_revenue_always_passes() {
        let topo = topology(0.0);
        let mut rng = SeededRandom::new(3);
        for _ in 0..1000 {
            let mut p = particle_at(&topo, "r", ParticleState::Deciding);
            let t = step(&mut p, 16.0, &topo, &mut rng);
            assert_eq!(t, Some(Transition::Passed { node: "r".into(), converted: true }));
            assert!(p.converted);
        }
    }

    #[test]
    fn test_dead_end_passes_unconverted() {
        let graph = FunnelGraph {
            nodes: vec![FunnelNode::new("c", NodeKind::Content, 0.0, 0.0, 100.0)],
            edges: vec![],
        };
        let topo = Topology::new(&graph, normalize_layout(&graph.nodes, 400.0, 400.0, 80.0));
        let mut rng = Scripted::new(&[0.0]);
        let mut p = particle_at(&topo, "c", ParticleState::Deciding);
        let t = step(&mut p, 16.0, &topo, &mut rng);
        assert_eq!(t, Some(Transition::Passed { node: "c".into(), converted: false }));
        assert!(!p.converted);
    }

    #[test]
    fn test_conversion_rate_converges() {
        let topo = topology(30.0);
        let mut rng = SeededRandom::new(42);
        let n = 10_000;
        let mut moved = 0;
        for _ in 0..n {
            let mut p = particle_at(&topo, "c", ParticleState::Deciding);
            if let Some(Transition::Departed { .. }) = step(&mut p, 16.0, &topo, &mut rng) {
                moved += 1;
            }
        }
        let frac = moved as f64 / n as f64;
        // 3σ for p=0.3, n=10k is ~0.014
        assert!((frac - 0.30).abs() < 0.015, "moved fraction {}", frac);
    }

    #[test]
    fn test_dropped_falls_and_fades() {
        let topo = topology(50.0);
        let mut rng = Scripted::new(&[0.0]);
        let mut p = particle_at(&topo, "c", ParticleState::Dropped);
        let y0 = p.y;
        step(&mut p, 500.0, &topo, &mut rng);
        assert!(p.y > y0);
        assert!((p.opacity - 0.5).abs() < 1e-9);
        step(&mut p, 600.0, &topo, &mut rng);
        assert_eq!(p.opacity, 0.0);
        assert!(p.is_faded());
        assert_eq!(p.state, ParticleState::Dropped);
    }

    #[test]
    fn test_passed_fades_to_zero() {
        let topo = topology(50.0);
        let mut rng = Scripted::new(&[0.0]);
        let mut p = particle_at(&topo, "r", ParticleState::Passed);
        step(&mut p, PASS_FADE_MS, &topo, &mut rng);
        assert_eq!(p.opacity, 0.0);
        assert_eq!(p.state, ParticleState::Passed);
    }

    #[test]
    fn test_missing_target_aborts_as_passed() {
        let topo = topology(50.0);
        let mut rng = Scripted::new(&[0.0]);
        let mut p = particle_at(&topo, "t", ParticleState::Moving);
        p.to_node_id = Some("ghost".into());
        let t = step(&mut p, 16.0, &topo, &mut rng);
        assert_eq!(t, Some(Transition::Aborted { node: "t".into() }));
        assert_eq!(p.state, ParticleState::Passed);
        assert!(!p.converted);
    }
}
