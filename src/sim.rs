//! Per-tick field simulation: emitter motion, influence accumulation and
//! glyph/colour assignment for every grid cell.

use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::config::Config;
use crate::emitter::{Emitter, FocalAttractor, Vec2};
use crate::grid::{Grid, Logo};
use crate::noise::NoiseField;
use crate::style::{RenderStyle, Tier};

/// Only forms above this influence colour a cell.
const DOMINANT_MIN: f32 = 0.1;
/// Background glyphs re-roll when the gating noise exceeds this.
const BACKGROUND_GATE: f32 = 0.4;
const HIGHLIGHT_LIFT: f32 = 35.0;

/// Viewport size in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Terminal size in character cells, scaled to pixels.
    pub fn from_cells(cols: u16, rows: u16, cfg: &Config) -> Self {
        Self::new(cols as f32 * cfg.cell_w, rows as f32 * cfg.cell_h)
    }
}

/// All mutable state of the background, owned by the animation loop.
pub struct Simulation {
    cfg: Config,
    noise: NoiseField,
    rng: StdRng,
    grid: Grid,
    emitters: Vec<Emitter>,
    attractor: FocalAttractor,
    logo: Option<Logo>,
    viewport: Viewport,
    time_ms: f64,
}

impl Simulation {
    pub fn new(cfg: Config, viewport: Viewport) -> Self {
        let mut forms_rng = StdRng::seed_from_u64(cfg.seed.wrapping_add(2));
        let emitters = (0..cfg.forms)
            .map(|_| Emitter::random(&mut forms_rng, cfg.form_speed))
            .collect();
        let logo = cfg.logo.then(Logo::default);

        let mut sim = Self::unbuilt(cfg, viewport, emitters, logo);
        sim.resize(viewport);
        sim
    }

    /// Build around caller-placed emitters; they are not repositioned.
    pub fn with_emitters(
        cfg: Config,
        viewport: Viewport,
        emitters: Vec<Emitter>,
        logo: Option<Logo>,
    ) -> Self {
        let mut sim = Self::unbuilt(cfg, viewport, emitters, logo);
        sim.rebuild_grid(viewport);
        sim
    }

    /// Grid and focal point are left empty for `rebuild_grid`.
    fn unbuilt(
        cfg: Config,
        viewport: Viewport,
        emitters: Vec<Emitter>,
        logo: Option<Logo>,
    ) -> Self {
        let noise = NoiseField::new(&mut StdRng::seed_from_u64(cfg.seed));
        Self {
            noise,
            rng: StdRng::seed_from_u64(cfg.seed.wrapping_add(1)),
            grid: Grid::empty(cfg.cell_w, cfg.cell_h),
            emitters,
            attractor: FocalAttractor::new(Vec2::default(), cfg.attractor_strength),
            logo,
            viewport,
            time_ms: 0.0,
            cfg,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub fn attractor(&self) -> &FocalAttractor {
        &self.attractor
    }

    pub fn time_ms(&self) -> f64 {
        self.time_ms
    }

    pub fn style(&self) -> RenderStyle {
        self.cfg.style
    }

    pub fn set_style(&mut self, style: RenderStyle) {
        self.cfg.style = style;
    }

    /// Full rebuild: grid, logo, emitter positions and focal point.
    /// Deterministic for a given seed and viewport.
    pub fn resize(&mut self, viewport: Viewport) {
        self.rebuild_grid(viewport);
        for e in &mut self.emitters {
            e.reposition(&mut self.rng, viewport.width, viewport.height);
        }
        info!(
            "rebuilt grid {}x{} for {}x{} px",
            self.grid.cols, self.grid.rows, viewport.width, viewport.height
        );
    }

    fn rebuild_grid(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.rng = StdRng::seed_from_u64(self.cfg.seed.wrapping_add(1));
        self.grid = Grid::build(
            viewport.width,
            viewport.height,
            self.cfg.cell_w,
            self.cfg.cell_h,
            self.logo.as_ref(),
            self.cfg.style,
            &mut self.rng,
        );
        self.attractor = FocalAttractor::new(focal_point(&self.grid), self.cfg.attractor_strength);
    }

    /// Start a highlight on a background cell.
    pub fn flash(&mut self, col: usize, row: usize) {
        if col >= self.grid.cols || row >= self.grid.rows {
            return;
        }
        let ttl = self.cfg.highlight_ttl;
        let cell = self.grid.get_mut(col, row);
        if !cell.logo && cell.tier == Tier::Background {
            cell.highlight = ttl;
        }
    }

    /// Advance by `dt_ms` and recompute every cell.
    pub fn step(&mut self, dt_ms: f64) {
        self.time_ms += dt_ms;
        self.move_emitters(dt_ms as f32);
        self.accumulate_influence();
        self.age_highlights();
        self.assign_cells();
    }

    fn move_emitters(&mut self, dt: f32) {
        let (w, h) = (self.viewport.width, self.viewport.height);
        let hue_step = self.cfg.color_shift_speed * dt * 0.01;
        for e in &mut self.emitters {
            e.advance(self.time_ms, self.cfg.noise_scale, w, h);
            self.attractor.attract(e, dt);
            e.shift_hue(hue_step);
        }
    }

    fn accumulate_influence(&mut self) {
        for cell in self.grid.cells_mut() {
            cell.influence = 0.0;
            cell.dominant = None;
        }

        for (ei, e) in self.emitters.iter().enumerate() {
            let Some(((c0, c1), (r0, r1))) = self.grid.cover(e.p, e.radius) else {
                continue;
            };
            for row in r0..=r1 {
                for col in c0..=c1 {
                    let c = self.grid.center(col, row);
                    let cell = self.grid.get_mut(col, row);
                    if cell.logo {
                        continue;
                    }
                    let v = e.influence(c.x, c.y);
                    if v > cell.influence {
                        cell.influence = v;
                        if v > DOMINANT_MIN {
                            cell.dominant = Some(ei);
                        }
                    }
                }
            }
        }
    }

    fn age_highlights(&mut self) {
        for cell in self.grid.cells_mut() {
            cell.highlight = cell.highlight.saturating_sub(1);
        }
        if self.grid.is_empty() || !self.rng.gen_bool(self.cfg.highlight_chance) {
            return;
        }
        let col = self.rng.gen_range(0..self.grid.cols);
        let row = self.rng.gen_range(0..self.grid.rows);
        self.flash(col, row);
    }

    fn assign_cells(&mut self) {
        let t = self.time_ms;
        let style = self.cfg.style;
        let smooth = self.cfg.transition_smoothness;
        let tz = (t * 0.001) as f32;
        let rain = style.rain_offset(t);
        let logo = style.logo_color(t);

        for row in 0..self.grid.rows {
            for col in 0..self.grid.cols {
                let (fx, fy) = (col as f32, row as f32);
                let cell = self.grid.get_mut(col, row);
                if cell.logo {
                    cell.color = logo;
                    continue;
                }

                let n = self.noise.sample(fx * 0.1, fy * 0.1, tz);
                let adjusted = cell.influence + n * 0.5 * smooth;
                let tier = Tier::from_influence(adjusted);

                if tier == Tier::Background {
                    let gate = background_gate(&self.noise, col, row, t, rain);
                    if gate.abs() > BACKGROUND_GATE {
                        cell.ch = style.background_glyph(&mut self.rng);
                    }
                    cell.color = style.background_color(n * 20.0);
                } else {
                    cell.ch = style.tier_glyph(tier, &mut self.rng);
                    let base = cell.dominant.map(|i| self.emitters[i].hue);
                    cell.color = style.tier_color(tier, base, adjusted, t);
                    cell.highlight = 0;
                }
                cell.tier = tier;

                if cell.highlight > 0 {
                    cell.color = cell.color.lighten(HIGHLIGHT_LIFT);
                }
            }
        }
    }
}

/// Noise sample deciding whether a background glyph may re-roll.
fn background_gate(noise: &NoiseField, col: usize, row: usize, t_ms: f64, rain: f32) -> f32 {
    noise.sample(
        col as f32 * 0.05 + (t_ms * 0.0001) as f32,
        row as f32 * 0.05 - rain,
        (t_ms * 0.0002) as f32,
    )
}

fn focal_point(grid: &Grid) -> Vec2 {
    Vec2::new(
        (grid.cols as f32 / 2.0) * grid.cell_w,
        (grid.rows as f32 / 2.0) * grid.cell_h,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> Config {
        Config {
            forms: 0,
            logo: false,
            transition_smoothness: 0.0,
            highlight_chance: 0.0,
            highlight_ttl: 3,
            seed: 9,
            ..Config::default()
        }
    }

    fn still(x: f32, y: f32, r: f32, hue: f32) -> Emitter {
        Emitter::new(Vec2::new(x, y), r, 0.0, hue, 0.0)
    }

    #[test]
    fn influence_is_max_not_sum() {
        let vp = Viewport::new(240.0, 160.0);
        let two = vec![still(120.0, 80.0, 60.0, 10.0), still(120.0, 80.0, 60.0, 200.0)];
        let mut a = Simulation::with_emitters(quiet(), vp, two, None);
        let one = vec![still(120.0, 80.0, 60.0, 10.0)];
        let mut b = Simulation::with_emitters(quiet(), vp, one, None);
        a.step(0.0);
        b.step(0.0);
        for (ca, cb) in a.grid().cells().iter().zip(b.grid().cells()) {
            assert_eq!(ca.influence, cb.influence);
            assert!(ca.influence <= 1.0);
        }
    }

    #[test]
    fn influence_does_not_accumulate_across_ticks() {
        let vp = Viewport::new(240.0, 160.0);
        let form = vec![still(60.0, 60.0, 50.0, 0.0)];
        let mut sim = Simulation::with_emitters(quiet(), vp, form, None);
        sim.step(0.0);
        let first: Vec<f32> = sim.grid().cells().iter().map(|c| c.influence).collect();
        sim.step(0.0);
        let second: Vec<f32> = sim.grid().cells().iter().map(|c| c.influence).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn dominant_form_is_the_strongest() {
        let vp = Viewport::new(480.0, 160.0);
        let forms = vec![still(100.0, 80.0, 150.0, 30.0), still(300.0, 80.0, 150.0, 250.0)];
        let mut sim = Simulation::with_emitters(quiet(), vp, forms, None);
        sim.step(0.0);
        let left = sim.grid().get(8, 5);
        let right = sim.grid().get(25, 5);
        assert_eq!(left.dominant, Some(0));
        assert_eq!(right.dominant, Some(1));
    }

    #[test]
    fn logo_cells_are_untouched_by_the_field() {
        let cfg = Config {
            logo: true,
            ..quiet()
        };
        let vp = Viewport::new(40.0 * 12.0, 20.0 * 16.0);
        let centre = Vec2::new(20.0 * 12.0, 10.0 * 16.0);
        let form = vec![still(centre.x, centre.y, 200.0, 0.0)];
        let mut sim = Simulation::with_emitters(cfg, vp, form, Some(Logo::default()));
        let before: Vec<char> = sim
            .grid()
            .logo_cells()
            .map(|(x, y)| sim.grid().get(x, y).ch)
            .collect();
        for _ in 0..5 {
            sim.step(16.0);
        }
        for (i, (x, y)) in sim.grid().logo_cells().enumerate() {
            let c = sim.grid().get(x, y);
            assert_eq!(c.ch, before[i]);
            assert_eq!(c.tier, Tier::Logo);
            assert_eq!(c.influence, 0.0);
            assert_eq!(c.color.h, 180.0);
        }
    }

    #[test]
    fn calm_background_keeps_its_glyph() {
        let vp = Viewport::new(200.0 * 12.0, 100.0 * 16.0);
        let mut sim = Simulation::with_emitters(quiet(), vp, vec![], None);
        let (mut gated, mut rerolled) = (0, 0);
        for _ in 0..20 {
            let before: Vec<char> = sim.grid().cells().iter().map(|c| c.ch).collect();
            sim.step(16.0);
            let t = sim.time_ms();
            let rain = sim.style().rain_offset(t);
            for row in 0..sim.grid().rows {
                for col in 0..sim.grid().cols {
                    let ch = sim.grid().get(col, row).ch;
                    let was = before[sim.grid().idx(col, row)];
                    let gate = background_gate(&sim.noise, col, row, t, rain);
                    if gate.abs() > BACKGROUND_GATE {
                        gated += 1;
                        rerolled += (ch != was) as usize;
                    } else {
                        assert_eq!(ch, was, "calm cell {col},{row} flipped at {t} ms");
                    }
                }
            }
        }
        assert!(gated > 0);
        assert!(rerolled > 0);
    }

    #[test]
    fn initial_viewport_does_not_leak_into_placement() {
        let cfg = Config {
            forms: 5,
            seed: 31,
            ..Config::default()
        };
        let vp = Viewport::new(960.0, 640.0);
        let direct = Simulation::new(cfg.clone(), vp);
        let mut moved = Simulation::new(cfg, Viewport::new(300.0, 200.0));
        moved.resize(vp);

        assert_eq!(direct.grid(), moved.grid());
        assert_eq!(direct.attractor().center, moved.attractor().center);
        for (a, b) in direct.emitters().iter().zip(moved.emitters()) {
            assert_eq!(a.p, b.p);
            assert_eq!((a.radius, a.speed, a.hue, a.phase), (b.radius, b.speed, b.hue, b.phase));
            assert!(a.p.x >= 0.0 && a.p.x <= vp.width);
            assert!(a.p.y >= 0.0 && a.p.y <= vp.height);
        }
    }

    #[test]
    fn binary_rain_logo_fades_in() {
        let cfg = Config {
            style: RenderStyle::BinaryRain,
            logo: true,
            ..quiet()
        };
        let vp = Viewport::new(40.0 * 12.0, 20.0 * 16.0);
        let mut sim = Simulation::with_emitters(cfg, vp, vec![], Some(Logo::default()));
        let (x, y) = sim.grid().logo_cells().next().unwrap();
        assert_eq!(sim.grid().get(x, y).color.l, 0.0);

        sim.step(1000.0);
        let early = sim.grid().get(x, y).color.l;
        assert!(early > 0.0);
        sim.step(3000.0);
        let t = sim.time_ms();
        assert!(sim.grid().get(x, y).color.l > early);
        assert_eq!(sim.grid().get(x, y).color, RenderStyle::Metaball.logo_color(t));
    }

    #[test]
    fn highlight_decays_one_per_tick() {
        let vp = Viewport::new(120.0, 160.0);
        let mut sim = Simulation::with_emitters(quiet(), vp, vec![], None);
        sim.step(0.0);
        let calm = sim.grid().get(2, 2).color;
        sim.flash(2, 2);
        assert_eq!(sim.grid().get(2, 2).highlight, 3);
        sim.step(0.0);
        assert_eq!(sim.grid().get(2, 2).highlight, 2);
        assert!(sim.grid().get(2, 2).color.l > calm.l);
        sim.step(0.0);
        sim.step(0.0);
        assert_eq!(sim.grid().get(2, 2).highlight, 0);
        assert_eq!(sim.grid().get(2, 2).color, calm);
    }

    #[test]
    fn random_highlights_spawn() {
        let cfg = Config {
            highlight_chance: 1.0,
            ..quiet()
        };
        let mut sim = Simulation::with_emitters(cfg, Viewport::new(120.0, 160.0), vec![], None);
        sim.step(0.0);
        let lit = sim.grid().cells().iter().filter(|c| c.highlight > 0).count();
        assert_eq!(lit, 1);
    }

    #[test]
    fn forms_are_pulled_and_recoloured() {
        let cfg = Config {
            forms: 3,
            seed: 4,
            ..Config::default()
        };
        let mut sim = Simulation::new(cfg, Viewport::new(960.0, 640.0));
        let hues: Vec<f32> = sim.emitters().iter().map(|e| e.hue).collect();
        for _ in 0..10 {
            sim.step(16.0);
        }
        assert!(sim.time_ms() > 159.0);
        assert!(sim.attractor().pulse_phase() > 0.0);
        for (e, h0) in sim.emitters().iter().zip(hues) {
            assert!((e.hue - h0).rem_euclid(360.0) > 0.0);
        }
    }

    #[test]
    fn binary_rain_draws_only_digits_and_logo() {
        let cfg = Config {
            style: RenderStyle::BinaryRain,
            forms: 4,
            seed: 12,
            ..Config::default()
        };
        let mut sim = Simulation::new(cfg, Viewport::new(960.0, 640.0));
        for _ in 0..5 {
            sim.step(16.0);
        }
        for c in sim.grid().cells() {
            assert!(c.logo || matches!(c.ch, '0' | '1'), "unexpected glyph {:?}", c.ch);
        }
    }
}
