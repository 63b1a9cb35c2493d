use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, warn};

use crate::color::Rgb;
use crate::config::Config;
use crate::pacing::{Debouncer, PacingController};
use crate::render::Renderer;
use crate::sim::{Simulation, Viewport};

/// Cancels the animation; checked at the top of every frame.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    Stopped,
    /// Pacing gate rejected the frame.
    Skipped,
    Rendered,
}

const HUD_FG: Rgb = Rgb::new(210, 225, 255);
const HUD_BG: Rgb = Rgb::new(0, 0, 0);

pub struct Animation {
    sim: Simulation,
    pacing: PacingController,
    resize: Debouncer<Viewport>,
    renderer: Renderer,
    stop: StopHandle,
    pub paused: bool,
    pub show_hud: bool,
}

impl Animation {
    pub fn start(cfg: Config, viewport: Viewport, now_ms: f64) -> (Self, StopHandle) {
        let pacing = PacingController::new(&cfg, now_ms);
        let resize = Debouncer::new(cfg.resize_quiet_ms);
        let sim = Simulation::new(cfg, viewport);
        let (cols, rows) = (sim.grid().cols, sim.grid().rows);
        if cols == 0 || rows == 0 {
            warn!(
                "viewport {}x{} px is smaller than one glyph cell",
                viewport.width, viewport.height
            );
        }
        info!(
            "starting {} background: {} forms, {}x{} cells, {:.0} ms interval",
            sim.style().label(),
            sim.emitters().len(),
            cols,
            rows,
            pacing.interval_ms()
        );

        let stop = StopHandle::default();
        let anim = Self {
            renderer: Renderer::new(cols as u16, rows as u16),
            sim,
            pacing,
            resize,
            stop: stop.clone(),
            paused: false,
            show_hud: false,
        };
        (anim, stop)
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn simulation_mut(&mut self) -> &mut Simulation {
        &mut self.sim
    }

    pub fn pacing(&self) -> &PacingController {
        &self.pacing
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Queue a viewport change; applied after the quiet period.
    pub fn request_resize(&mut self, viewport: Viewport, now_ms: f64) {
        self.resize.notify(viewport, now_ms);
    }

    /// How long the host may sleep before the next useful frame.
    pub fn idle_ms(&self, now_ms: f64) -> f64 {
        self.pacing.wait_ms(now_ms)
    }

    pub fn frame(&mut self, now_ms: f64) -> FrameOutcome {
        if self.stop.is_stopped() {
            return FrameOutcome::Stopped;
        }

        if let Some(vp) = self.resize.poll(now_ms) {
            self.sim.resize(vp);
            let g = self.sim.grid();
            self.renderer.resize(g.cols as u16, g.rows as u16);
            self.renderer.invalidate();
        }

        let Some(dt) = self.pacing.poll(now_ms) else {
            return FrameOutcome::Skipped;
        };

        if !self.paused {
            self.sim.step(dt);
        }
        self.renderer.draw(self.sim.grid());
        if self.show_hud {
            let line = self.hud_line();
            self.renderer.overlay(0, &line, HUD_FG, HUD_BG);
        }
        FrameOutcome::Rendered
    }

    pub fn present<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        self.renderer.present(out)
    }

    fn hud_line(&self) -> String {
        format!(
            " {}  forms:{}  {:>3} fps  tick:{:.0}ms{}  [s]tyle [space] pause [h]ud [q]uit ",
            self.sim.style().label(),
            self.sim.emitters().len(),
            self.pacing().fps(),
            self.pacing().interval_ms(),
            if self.paused { "  [PAUSED]" } else { "" }
        )
    }
}
