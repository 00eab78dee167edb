// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Funnel Simulation Engine - Graph Layout Normalizer
//
// Maps editor-space node positions onto the simulation canvas with a
// uniform scale-to-fit followed by centering.

use crate::types::{FunnelNode, NodeCoord};

/// Default margin kept free on every side of the canvas.
pub const DEFAULT_PADDING: f64 = 80.0;

/// Upper bound on the scale factor so tiny graphs are not blown up.
pub const MAX_SCALE: f64 = 2.0;

/// Axis-aligned bounding box of the raw node positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn of(nodes: &[FunnelNode]) -> Option<Self> {
        let first = nodes.first()?;
        let init = Bounds {
            min_x: first.position.x,
            max_x: first.position.x,
            min_y: first.position.y,
            max_y: first.position.y,
        };
        Some(nodes.iter().fold(init, |b, n| Bounds {
            min_x: b.min_x.min(n.position.x),
            max_x: b.max_x.max(n.position.x),
            min_y: b.min_y.min(n.position.y),
            max_y: b.max_y.max(n.position.y),
        }))
    }

    /// Width of the box, or 1 when degenerate.
    pub fn range_x(&self) -> f64 {
        non_zero_range(self.max_x - self.min_x)
    }

    /// Height of the box, or 1 when degenerate.
    pub fn range_y(&self) -> f64 {
        non_zero_range(self.max_y - self.min_y)
    }
}

fn non_zero_range(range: f64) -> f64 {
    if range == 0.0 {
        1.0
    } else {
        range
    }
}

/// Uniform scale that fits `bounds` into the padded canvas, capped at `MAX_SCALE`.
///
/// A canvas narrower than twice the padding collapses the graph onto its
/// center instead of mirroring it.
pub fn fit_scale(bounds: &Bounds, width: f64, height: f64, padding: f64) -> f64 {
    let scale_x = (width - padding * 2.0).max(0.0) / bounds.range_x();
    let scale_y = (height - padding * 2.0).max(0.0) / bounds.range_y();
    scale_x.min(scale_y).min(MAX_SCALE)
}

/// Project every node into canvas pixel space.
///
/// The scaled graph is centered on the canvas. An empty node list yields an
/// empty layout.
pub fn normalize_layout(
    nodes: &[FunnelNode],
    width: f64,
    height: f64,
    padding: f64,
) -> Vec<NodeCoord> {
    let bounds = match Bounds::of(nodes) {
        Some(b) => b,
        None => return Vec::new(),
    };

    let scale = fit_scale(&bounds, width, height, padding);
    let scaled_w = (bounds.max_x - bounds.min_x) * scale;
    let scaled_h = (bounds.max_y - bounds.min_y) * scale;
    let offset_x = (width - scaled_w) / 2.0;
    let offset_y = (height - scaled_h) / 2.0;

    nodes
        .iter()
        .map(|n| NodeCoord {
            id: n.id.clone(),
            x: offset_x + (n.position.x - bounds.min_x) * scale,
            y: offset_y + (n.position.y - bounds.min_y) * scale,
            kind: n.kind,
            label: n.data.label.clone(),
            conversion_rate: n.data.conversion_rate,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
