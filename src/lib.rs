// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Funnel Simulation Engine

pub mod types;
pub mod config;
pub mod layout;
pub mod rng;
pub mod particle;
pub mod scheduler;
pub mod stats;
pub mod results;
pub mod render;
pub mod simulation;

pub use types::*;
pub use config::{preflight, ConfigError, PreflightError, RunConfig};
pub use results::{Bottleneck, NodeResultRow, Severity, SimulationReport};
pub use simulation::FunnelSimulation;

use wasm_bindgen::prelude::*;

use crate::render::{Overlay, SvgSurface};
use crate::rng::SeededRandom;

fn init_logging() {
    #[cfg(target_arch = "wasm32")]
    {
        let _ = console_log::init_with_level(log::Level::Info);
        console_error_panic_hook::set_once();
    }
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Maps become plain objects so the host can index them by id.
fn to_js<T: serde::Serialize + ?Sized>(value: &T) -> JsValue {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::NULL)
}

// ─── WASM Interface ──────────────────────────────────────────────────────────

#[wasm_bindgen]
impl FunnelSimulation {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Self {
        init_logging();
        Self::with_random(Box::new(SeededRandom::new(seed)))
    }

    /// Begin a run over `{ nodes, edges }`. Any previous run is discarded.
    #[wasm_bindgen(js_name = start)]
    pub fn start_js(
        &mut self,
        graph: JsValue,
        total_particles: u32,
        speed: u32,
        width: f64,
        height: f64,
    ) -> Result<(), JsValue> {
        let graph: FunnelGraph = serde_wasm_bindgen::from_value(graph)?;
        let config = RunConfig::new(total_particles, speed).map_err(to_js_error)?;
        self.start(graph, config, width, height).map_err(to_js_error)
    }

    /// Host-side checks to run before `start`; resolves to an error message.
    #[wasm_bindgen(js_name = preflight)]
    pub fn preflight_js(graph: JsValue) -> Result<(), JsValue> {
        let graph: FunnelGraph = serde_wasm_bindgen::from_value(graph)?;
        preflight(&graph).map_err(to_js_error)
    }

    pub fn stop(&mut self) {
        self.halt();
    }

    /// Returns the new paused state.
    pub fn toggle_pause(&mut self) -> bool {
        let paused = self.clock.toggle_pause();
        self.refresh_stats();
        paused
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn set_speed(&mut self, speed: u32) -> Result<(), JsValue> {
        self.change_speed(speed).map_err(to_js_error)
    }

    /// Drive one animation frame. Returns false once the run has ended.
    pub fn frame(&mut self, dt_ms: f64) -> bool {
        self.advance(dt_ms)
    }

    pub fn get_particles(&self) -> JsValue {
        to_js(self.particles())
    }

    pub fn get_node_coords(&self) -> JsValue {
        to_js(self.node_coords())
    }

    pub fn get_edge_flows(&self) -> JsValue {
        to_js(self.edge_flows())
    }

    pub fn get_stats(&self) -> JsValue {
        to_js(self.stats())
    }

    /// `null` until the run has completed.
    pub fn get_results(&self) -> JsValue {
        match self.results() {
            Some(report) => to_js(&report),
            None => JsValue::NULL,
        }
    }

    pub fn render_svg(&self) -> String {
        let mut svg = SvgSurface::new();
        Overlay::default().draw(&self.snapshot(), &mut svg);
        svg.finish()
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl FunnelSimulation {
    /// Paint the overlay onto a host canvas context.
    pub fn draw(&self, ctx: &web_sys::CanvasRenderingContext2d) {
        let mut ctx = ctx.clone();
        Overlay::default().draw(&self.snapshot(), &mut ctx);
    }
}
