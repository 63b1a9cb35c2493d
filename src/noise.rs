// ------------------------------
// Seeded 3D gradient noise
// ------------------------------

use rand::Rng;

/// Permutation-table gradient noise. Period 256 along every axis.
#[derive(Clone)]
pub struct NoiseField {
    perm: [u8; 512],
}

impl NoiseField {
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        let mut base = [0u8; 256];
        for (i, p) in base.iter_mut().enumerate() {
            *p = i as u8;
        }
        // Fisher-Yates
        for i in (1..256usize).rev() {
            let j = rng.gen_range(0..=i);
            base.swap(i, j);
        }

        // Duplicate so corner lookups at +1 never wrap.
        let mut perm = [0u8; 512];
        perm[..256].copy_from_slice(&base);
        perm[256..].copy_from_slice(&base);
        Self { perm }
    }

    #[inline]
    fn p(&self, i: usize) -> usize {
        self.perm[i] as usize
    }

    /// Smooth noise in [-1, 1].
    pub fn sample(&self, x: f32, y: f32, z: f32) -> f32 {
        let (xf, yf, zf) = (x.floor(), y.floor(), z.floor());
        let xi = (xf as i32 & 255) as usize;
        let yi = (yf as i32 & 255) as usize;
        let zi = (zf as i32 & 255) as usize;

        let x = x - xf;
        let y = y - yf;
        let z = z - zf;

        let u = fade(x);
        let v = fade(y);
        let w = fade(z);

        let a = self.p(xi) + yi;
        let aa = self.p(a) + zi;
        let ab = self.p(a + 1) + zi;
        let b = self.p(xi + 1) + yi;
        let ba = self.p(b) + zi;
        let bb = self.p(b + 1) + zi;

        let n = lerp(
            w,
            lerp(
                v,
                lerp(u, grad(self.p(aa), x, y, z), grad(self.p(ba), x - 1.0, y, z)),
                lerp(
                    u,
                    grad(self.p(ab), x, y - 1.0, z),
                    grad(self.p(bb), x - 1.0, y - 1.0, z),
                ),
            ),
            lerp(
                v,
                lerp(
                    u,
                    grad(self.p(aa + 1), x, y, z - 1.0),
                    grad(self.p(ba + 1), x - 1.0, y, z - 1.0),
                ),
                lerp(
                    u,
                    grad(self.p(ab + 1), x, y - 1.0, z - 1.0),
                    grad(self.p(bb + 1), x - 1.0, y - 1.0, z - 1.0),
                ),
            ),
        );
        n.clamp(-1.0, 1.0)
    }
}

/// Quintic fade: C2 continuous at lattice boundaries.
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(t: f32, a: f32, b: f32) -> f32 {
    a + t * (b - a)
}

// Low 4 bits pick one of the 12 cube-edge gradients (4 repeated).
fn grad(hash: usize, x: f32, y: f32, z: f32) -> f32 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}
