// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Funnel Simulation Engine - Rendering Overlay
//
// Paints one frame from read-only snapshots. The overlay never touches
// simulation state; backends implement `Surface`.

use std::fmt::Write;

use crate::types::{EdgeFlows, FunnelEdge, NodeCoord, NodeKind, Particle, ParticleState};

pub const NODE_RADIUS: f64 = 22.0;
pub const PARTICLE_RADIUS: f64 = 4.0;
const EDGE_BASE_WIDTH: f64 = 1.5;
const EDGE_FLOW_CAP: u32 = 50;
const EDGE_FLOW_WIDTH: f64 = 0.1;

// ─── Color ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self { a: a.clamp(0.0, 1.0), ..self }
    }

    pub fn css(&self) -> String {
        format!("rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, self.a)
    }
}

const BACKGROUND: Rgba = Rgba::rgb(15, 23, 42);
const EDGE: Rgba = Rgba::rgb(148, 163, 184);
const LABEL: Rgba = Rgba::rgb(226, 232, 240);

pub fn node_color(kind: NodeKind) -> Rgba {
    match kind {
        NodeKind::Traffic => Rgba::rgb(59, 130, 246),
        NodeKind::Content => Rgba::rgb(168, 85, 247),
        NodeKind::Conversion => Rgba::rgb(245, 158, 11),
        NodeKind::Revenue => Rgba::rgb(16, 185, 129),
    }
}

pub fn particle_color(state: ParticleState) -> Rgba {
    match state {
        ParticleState::Passed => Rgba::rgb(34, 197, 94),
        ParticleState::Dropped => Rgba::rgb(239, 68, 68),
        _ => Rgba::rgb(96, 165, 250),
    }
}

/// Stroke width for an edge that `flow` particles have completed.
pub fn edge_width(flow: u32) -> f64 {
    EDGE_BASE_WIDTH + flow.min(EDGE_FLOW_CAP) as f64 * EDGE_FLOW_WIDTH
}

// ─── Surface ─────────────────────────────────────────────────────────────────

/// Minimal drawing backend.
pub trait Surface {
    fn clear(&mut self, width: f64, height: f64, color: Rgba);
    fn line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Rgba);
    fn circle(&mut self, center: (f64, f64), radius: f64, fill: Rgba);
    fn text(&mut self, at: (f64, f64), size: f64, color: Rgba, text: &str);
}

/// Everything one frame needs, borrowed from the engine.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub width: f64,
    pub height: f64,
    pub coords: &'a [NodeCoord],
    pub edges: &'a [FunnelEdge],
    pub flows: &'a EdgeFlows,
    pub particles: &'a [Particle],
}

// ─── Overlay ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Overlay {
    pub node_radius: f64,
    pub particle_radius: f64,
    pub show_trails: bool,
}

impl Default for Overlay {
    fn default() -> Self {
        Self { node_radius: NODE_RADIUS, particle_radius: PARTICLE_RADIUS, show_trails: true }
    }
}

impl Overlay {
    pub fn draw(&self, snap: &Snapshot<'_>, surface: &mut dyn Surface) {
        surface.clear(snap.width, snap.height, BACKGROUND);
        self.draw_edges(snap, surface);
        self.draw_nodes(snap, surface);
        self.draw_particles(snap, surface);
    }

    fn draw_edges(&self, snap: &Snapshot<'_>, surface: &mut dyn Surface) {
        for edge in snap.edges {
            let from = snap.coords.iter().find(|c| c.id == edge.source);
            let to = snap.coords.iter().find(|c| c.id == edge.target);
            let (from, to) = match (from, to) {
                (Some(f), Some(t)) => (f, t),
                _ => continue,
            };
            let flow = snap.flows.get(&edge.flow_key()).copied().unwrap_or(0);
            let alpha = if flow > 0 { 0.6 } else { 0.3 };
            surface.line((from.x, from.y), (to.x, to.y), edge_width(flow), EDGE.with_alpha(alpha));
        }
    }

    fn draw_nodes(&self, snap: &Snapshot<'_>, surface: &mut dyn Surface) {
        for node in snap.coords {
            let color = node_color(node.kind);
            surface.circle((node.x, node.y), self.node_radius + 4.0, color.with_alpha(0.25));
            surface.circle((node.x, node.y), self.node_radius, color);
            surface.text(
                (node.x, node.y + self.node_radius + 14.0),
                12.0,
                LABEL,
                &node.label,
            );
            if node.kind != NodeKind::Traffic && node.kind != NodeKind::Revenue {
                let rate = format!("{}%", node.conversion_rate.round() as i64);
                surface.text((node.x, node.y + 4.0), 11.0, LABEL, &rate);
            }
        }
    }

    fn draw_particles(&self, snap: &Snapshot<'_>, surface: &mut dyn Surface) {
        for p in snap.particles.iter().filter(|p| p.opacity > 0.0) {
            let color = particle_color(p.state);
            if self.show_trails {
                let n = p.trail.len() as f64;
                for (i, t) in p.trail.iter().enumerate() {
                    let fade = (i + 1) as f64 / (n + 1.0);
                    surface.circle(
                        (t.x, t.y),
                        self.particle_radius * fade,
                        color.with_alpha(p.opacity * fade * 0.5),
                    );
                }
            }
            surface.circle((p.x, p.y), self.particle_radius, color.with_alpha(p.opacity));
        }
    }
}

// ─── SVG backend ─────────────────────────────────────────────────────────────

/// Collects a frame as an SVG document.
#[derive(Debug, Clone, Default)]
pub struct SvgSurface {
    width: f64,
    height: f64,
    body: String,
}

impl SvgSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">{body}</svg>",
            w = self.width,
            h = self.height,
            body = self.body,
        )
    }
}

impl Surface for SvgSurface {
    fn clear(&mut self, width: f64, height: f64, color: Rgba) {
        self.width = width;
        self.height = height;
        self.body.clear();
        let _ = write!(
            self.body,
            "<rect width=\"{}\" height=\"{}\" fill=\"{}\"/>",
            width,
            height,
            color.css()
        );
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Rgba) {
        let _ = write!(
            self.body,
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"{:.2}\"/>",
            from.0,
            from.1,
            to.0,
            to.1,
            color.css(),
            width
        );
    }

    fn circle(&mut self, center: (f64, f64), radius: f64, fill: Rgba) {
        let _ = write!(
            self.body,
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{:.2}\" fill=\"{}\"/>",
            center.0,
            center.1,
            radius,
            fill.css()
        );
    }

    fn text(&mut self, at: (f64, f64), size: f64, color: Rgba, text: &str) {
        let _ = write!(
            self.body,
            "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"{}\" text-anchor=\"middle\" fill=\"{}\">{}</text>",
            at.0,
            at.1,
            size,
            color.css(),
            escape_xml(text)
        );
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

// ─── Canvas backend (browser) ────────────────────────────────────────────────

#[cfg(target_arch = "wasm32")]
impl Surface for web_sys::CanvasRenderingContext2d {
    fn clear(&mut self, width: f64, height: f64, color: Rgba) {
        self.set_fill_style_str(&color.css());
        self.fill_rect(0.0, 0.0, width, height);
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Rgba) {
        self.set_stroke_style_str(&color.css());
        self.set_line_width(width);
        self.begin_path();
        self.move_to(from.0, from.1);
        self.line_to(to.0, to.1);
        self.stroke();
    }

    fn circle(&mut self, center: (f64, f64), radius: f64, fill: Rgba) {
        self.set_fill_style_str(&fill.css());
        self.begin_path();
        let _ = self.arc(center.0, center.1, radius, 0.0, std::f64::consts::TAU);
        self.fill();
    }

    fn text(&mut self, at: (f64, f64), size: f64, color: Rgba, text: &str) {
        self.set_fill_style_str(&color.css());
        self.set_font(&format!("{}px sans-serif", size));
        self.set_text_align("center");
        let _ = self.fill_text(text, at.0, at.1);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
