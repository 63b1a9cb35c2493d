use crossterm::style::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn lerp(a: Rgb, b: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let lerp1 = |x: u8, y: u8| -> u8 {
            (x as f32 + (y as f32 - x as f32) * t).round().clamp(0.0, 255.0) as u8
        };
        Rgb {
            r: lerp1(a.r, b.r),
            g: lerp1(a.g, b.g),
            b: lerp1(a.b, b.b),
        }
    }

    /// Channel-wise maximum.
    pub fn max(self, o: Rgb) -> Rgb {
        Rgb {
            r: self.r.max(o.r),
            g: self.g.max(o.g),
            b: self.b.max(o.b),
        }
    }

    pub fn to_color(self) -> Color {
        Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

/// Hue in degrees, saturation and lightness in percent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    pub const fn new(h: f32, s: f32, l: f32) -> Self {
        Self { h, s, l }
    }

    pub fn lighten(self, dl: f32) -> Hsl {
        Hsl::new(self.h, self.s, (self.l + dl).clamp(0.0, 100.0))
    }

    pub fn to_rgb(self) -> Rgb {
        let h = self.h.rem_euclid(360.0) / 60.0;
        let s = (self.s / 100.0).clamp(0.0, 1.0);
        let l = (self.l / 100.0).clamp(0.0, 1.0);

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let m = l - c / 2.0;
        let (r, g, b) = match h as i32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let q = |v: f32| -> u8 { ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8 };
        Rgb::new(q(r), q(g), q(b))
    }
}
