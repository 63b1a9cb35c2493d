use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}
impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
    pub fn add(self, o: Vec2) -> Self {
        Self::new(self.x + o.x, self.y + o.y)
    }
    pub fn sub(self, o: Vec2) -> Self {
        Self::new(self.x - o.x, self.y - o.y)
    }
    pub fn mul(self, k: f32) -> Self {
        Self::new(self.x * k, self.y * k)
    }
    pub fn len2(self) -> f32 {
        self.x * self.x + self.y * self.y
    }
    pub fn len(self) -> f32 {
        self.len2().sqrt()
    }
}

/// Weight of the previous velocity in the smoothing average.
const VELOCITY_KEEP: f32 = 0.9;

/// A moving metaball ("flowing form"). Pixel-space coordinates.
#[derive(Clone, Debug)]
pub struct Emitter {
    pub p: Vec2,
    pub v: Vec2,
    pub radius: f32,
    pub speed: f32,
    pub hue: f32,
    pub phase: f32,
}

impl Emitter {
    pub fn new(p: Vec2, radius: f32, speed: f32, hue: f32, phase: f32) -> Self {
        assert!(
            radius.is_finite() && radius > 0.0,
            "emitter radius must be positive, got {radius}"
        );
        Self {
            p,
            v: Vec2::default(),
            radius,
            speed,
            hue: hue.rem_euclid(360.0),
            phase,
        }
    }

    /// Random shape, speed, hue and phase at the origin; `reposition` places it.
    pub fn random<R: Rng>(rng: &mut R, base_speed: f32) -> Self {
        let radius = 100.0 + rng.gen::<f32>() * 150.0;
        let speed = base_speed * (0.5 + rng.gen::<f32>());
        let hue = rng.gen::<f32>() * 360.0;
        let phase = rng.gen::<f32>() * 1000.0;
        Self::new(Vec2::default(), radius, speed, hue, phase)
    }

    /// New position inside the bounds; shape, hue and phase are kept.
    pub fn reposition<R: Rng>(&mut self, rng: &mut R, w: f32, h: f32) {
        self.p = Vec2::new(rng.gen::<f32>() * w, rng.gen::<f32>() * h);
        self.v = Vec2::default();
    }

    /// One step of oscillator-driven drift with soft wraparound.
    pub fn advance(&mut self, time_ms: f64, noise_scale: f32, w: f32, h: f32) {
        let omega = noise_scale as f64 / 3.0;
        let a = time_ms * omega + self.phase as f64;
        let nx = a.sin() as f32 * self.speed;
        let ny = (a + 100.0).cos() as f32 * self.speed;

        self.v = self
            .v
            .mul(VELOCITY_KEEP)
            .add(Vec2::new(nx, ny).mul(1.0 - VELOCITY_KEEP));
        self.p = self.p.add(self.v);

        let r = self.radius;
        if self.p.x < -r {
            self.p.x = w + r;
        } else if self.p.x > w + r {
            self.p.x = -r;
        }
        if self.p.y < -r {
            self.p.y = h + r;
        } else if self.p.y > h + r {
            self.p.y = -r;
        }
    }

    pub fn shift_hue(&mut self, degrees: f32) {
        self.hue = (self.hue + degrees).rem_euclid(360.0);
    }

    /// Metaball kernel: 1 at the centre, 0 at and beyond the radius.
    pub fn influence(&self, px: f32, py: f32) -> f32 {
        let d = Vec2::new(px, py).sub(self.p).len();
        if d >= self.radius {
            return 0.0;
        }
        let n = d / self.radius;
        1.0 - n * n
    }
}

/// Central pull that keeps the forms orbiting the logo.
#[derive(Clone, Debug)]
pub struct FocalAttractor {
    pub center: Vec2,
    pub strength: f32,
    pub min_distance: f32,
    pulse_phase: f32,
}

impl FocalAttractor {
    pub fn new(center: Vec2, strength: f32) -> Self {
        Self {
            center,
            strength,
            min_distance: 100.0,
            pulse_phase: 0.0,
        }
    }

    pub fn pulse_phase(&self) -> f32 {
        self.pulse_phase
    }

    pub fn attract(&mut self, e: &mut Emitter, dt_ms: f32) {
        let d = self.center.sub(e.p);
        let dist = d.len();

        if dist > self.min_distance {
            let force = self.strength / (dist * dist + 1000.0);
            let pulse = 1.0 + self.pulse_phase.sin() * 0.1;
            let step = force * dt_ms * 0.001 * pulse;
            e.p = e.p.add(d.mul(step / dist));
        }

        self.pulse_phase += dt_ms * 0.001;
    }
}
