use anyhow::{bail, Result};

use crate::style::RenderStyle;

#[derive(Clone, Debug)]
pub struct Config {
    pub forms: usize,        // number of flowing forms
    pub form_speed: f32,     // base emitter speed
    pub attractor_strength: f32,
    pub noise_scale: f32,    // drift oscillator scale
    pub color_shift_speed: f32,
    pub transition_smoothness: f32, // noise blended into influence

    // Pacing (ms)
    pub interval_ms: f64,
    pub min_interval_ms: f64,
    pub max_interval_ms: f64,
    pub slow_fps: u32,
    pub fast_fps: u32,
    pub slow_step_ms: f64,
    pub fast_step_ms: f64,

    // Pixel size of one glyph cell
    pub cell_w: f32,
    pub cell_h: f32,

    pub style: RenderStyle,
    pub seed: u64,
    pub logo: bool,

    pub highlight_chance: f64,
    pub highlight_ttl: u8,
    pub resize_quiet_ms: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            forms: 4,
            form_speed: 0.5,
            attractor_strength: 50.0,
            noise_scale: 0.003,
            color_shift_speed: 0.1,
            transition_smoothness: 0.15,
            interval_ms: 16.0,
            min_interval_ms: 12.0,
            max_interval_ms: 33.0,
            slow_fps: 30,
            fast_fps: 55,
            slow_step_ms: 2.0,
            fast_step_ms: 1.0,
            cell_w: 12.0,
            cell_h: 16.0,
            style: RenderStyle::Metaball,
            seed: 0,
            logo: true,
            highlight_chance: 0.02,
            highlight_ttl: 12,
            resize_quiet_ms: 250.0,
        }
    }
}

impl Config {
    /// Slower motion and colour drift at ~30 Hz.
    pub fn reduced_motion() -> Self {
        let base = Self::default();
        Self {
            form_speed: base.form_speed * 0.3,
            color_shift_speed: base.color_shift_speed * 0.5,
            interval_ms: 33.0,
            ..base
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.forms > 64 {
            bail!("too many forms: {} (max 64)", self.forms);
        }
        for (name, v) in [
            ("form speed", self.form_speed),
            ("attractor strength", self.attractor_strength),
            ("noise scale", self.noise_scale),
            ("color shift speed", self.color_shift_speed),
            ("transition smoothness", self.transition_smoothness),
        ] {
            if !v.is_finite() || v < 0.0 {
                bail!("{name} must be a non-negative number, got {v}");
            }
        }
        if !(self.cell_w >= 1.0 && self.cell_h >= 1.0) {
            bail!("cell size must be at least 1x1 px, got {}x{}", self.cell_w, self.cell_h);
        }
        if !(self.min_interval_ms > 0.0 && self.min_interval_ms <= self.max_interval_ms) {
            bail!(
                "interval bounds must satisfy 0 < min <= max, got {}..{}",
                self.min_interval_ms,
                self.max_interval_ms
            );
        }
        if self.interval_ms < self.min_interval_ms || self.interval_ms > self.max_interval_ms {
            bail!(
                "initial interval {} ms outside {}..{} ms",
                self.interval_ms,
                self.min_interval_ms,
                self.max_interval_ms
            );
        }
        if self.slow_fps >= self.fast_fps {
            bail!("slow fps threshold must be below the fast one");
        }
        if !(0.0..=1.0).contains(&self.highlight_chance) {
            bail!("highlight chance must be in 0..=1, got {}", self.highlight_chance);
        }
        Ok(())
    }
}
