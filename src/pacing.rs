use log::debug;

use crate::config::Config;

const WINDOW_MS: f64 = 1000.0;

/// Tick gate with additive interval adaptation.
#[derive(Clone, Debug)]
pub struct PacingController {
    interval_ms: f64,
    min_ms: f64,
    max_ms: f64,
    slow_fps: u32,
    fast_fps: u32,
    slow_step_ms: f64,
    fast_step_ms: f64,

    last_tick: f64,
    window_start: f64,
    frames: u32,
    fps: u32,
}

impl PacingController {
    pub fn new(cfg: &Config, now_ms: f64) -> Self {
        Self {
            interval_ms: cfg.interval_ms,
            min_ms: cfg.min_interval_ms,
            max_ms: cfg.max_interval_ms,
            slow_fps: cfg.slow_fps,
            fast_fps: cfg.fast_fps,
            slow_step_ms: cfg.slow_step_ms,
            fast_step_ms: cfg.fast_step_ms,
            last_tick: now_ms,
            window_start: now_ms,
            frames: 0,
            fps: 0,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Frames counted in the last completed window.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Time left before the next tick may run.
    pub fn wait_ms(&self, now_ms: f64) -> f64 {
        (self.last_tick + self.interval_ms - now_ms).max(0.0)
    }

    pub fn accepts(&self, now_ms: f64) -> bool {
        now_ms - self.last_tick >= self.interval_ms
    }

    /// Gate a candidate tick. Returns the elapsed ms since the last accepted one.
    pub fn poll(&mut self, now_ms: f64) -> Option<f64> {
        if !self.accepts(now_ms) {
            return None;
        }
        let dt = now_ms - self.last_tick;
        self.last_tick = now_ms;
        self.record(now_ms);
        Some(dt)
    }

    /// Count an accepted tick and adapt at window boundaries.
    pub fn record(&mut self, now_ms: f64) {
        self.frames += 1;
        if now_ms - self.window_start < WINDOW_MS {
            return;
        }
        self.fps = self.frames;
        self.frames = 0;
        self.window_start = now_ms;

        let before = self.interval_ms;
        if self.fps < self.slow_fps {
            self.interval_ms = (self.interval_ms + self.slow_step_ms).min(self.max_ms);
        } else if self.fps > self.fast_fps {
            self.interval_ms = (self.interval_ms - self.fast_step_ms).max(self.min_ms);
        }
        if self.interval_ms != before {
            debug!(
                "pacing: {} fps, interval {:.0} -> {:.0} ms",
                self.fps, before, self.interval_ms
            );
        }
    }
}

/// Coalesces bursts of notifications into one value after a quiet period.
#[derive(Clone, Debug)]
pub struct Debouncer<T> {
    quiet_ms: f64,
    pending: Option<(T, f64)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet_ms: f64) -> Self {
        Self {
            quiet_ms,
            pending: None,
        }
    }

    pub fn notify(&mut self, value: T, now_ms: f64) {
        self.pending = Some((value, now_ms + self.quiet_ms));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn poll(&mut self, now_ms: f64) -> Option<T> {
        match self.pending {
            Some((_, due)) if now_ms >= due => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticks(p: &mut PacingController, n: u32, span_ms: f64) {
        for k in 1..=n {
            let now = (k as f64 * span_ms) / n as f64;
            assert!(p.poll(now).is_some(), "tick {k} rejected");
        }
    }

    fn relaxed() -> Config {
        Config {
            interval_ms: 16.0,
            min_interval_ms: 1.0,
            ..Config::default()
        }
    }

    #[test]
    fn gate_respects_interval() {
        let mut p = PacingController::new(&Config::default(), 0.0);
        assert!(p.poll(10.0).is_none());
        assert_eq!(p.poll(16.0), Some(16.0));
        assert!(p.poll(31.9).is_none());
        assert_eq!(p.poll(40.0), Some(24.0));
        assert!((p.wait_ms(50.0) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn sixty_ticks_report_sixty_fps() {
        let cfg = Config {
            interval_ms: 12.0,
            ..Config::default()
        };
        let mut p = PacingController::new(&cfg, 0.0);
        ticks(&mut p, 60, 1000.0);
        assert_eq!(p.fps(), 60);
        // 60 > 55 but already at the floor
        assert_eq!(p.interval_ms(), 12.0);
    }

    #[test]
    fn fast_window_shortens_interval_by_one() {
        let mut p = PacingController::new(&relaxed(), 0.0);
        ticks(&mut p, 60, 1000.0);
        assert_eq!(p.fps(), 60);
        assert_eq!(p.interval_ms(), 15.0);
    }

    #[test]
    fn slow_window_lengthens_interval_by_step() {
        let mut p = PacingController::new(&Config::default(), 0.0);
        ticks(&mut p, 20, 1000.0);
        assert_eq!(p.fps(), 20);
        assert_eq!(p.interval_ms(), 18.0);
    }

    #[test]
    fn slow_window_clamps_at_max() {
        let cfg = Config {
            interval_ms: 32.0,
            ..Config::default()
        };
        let mut p = PacingController::new(&cfg, 0.0);
        ticks(&mut p, 20, 1000.0);
        assert_eq!(p.interval_ms(), 33.0);
    }

    #[test]
    fn steady_band_keeps_interval() {
        let mut p = PacingController::new(&Config::default(), 0.0);
        ticks(&mut p, 40, 1000.0);
        assert_eq!(p.fps(), 40);
        assert_eq!(p.interval_ms(), 16.0);
    }

    #[test]
    fn debouncer_coalesces_bursts() {
        let mut d = Debouncer::new(250.0);
        d.notify((80, 24), 0.0);
        d.notify((90, 30), 100.0);
        d.notify((100, 40), 200.0);
        assert_eq!(d.poll(300.0), None);
        assert_eq!(d.poll(450.0), Some((100, 40)));
        assert_eq!(d.poll(1000.0), None);
        assert!(!d.is_pending());
    }
}
