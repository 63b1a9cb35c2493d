use clap::ValueEnum;
use rand::Rng;

use crate::color::Hsl;

/// Visual bucket a cell falls into for one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    Core,
    Mid,
    Edge,
    Background,
    Logo,
}

impl Tier {
    pub fn from_influence(adjusted: f32) -> Tier {
        if adjusted > 0.7 {
            Tier::Core
        } else if adjusted > 0.3 {
            Tier::Mid
        } else if adjusted > 0.1 {
            Tier::Edge
        } else {
            Tier::Background
        }
    }

    /// Blur radius in pixels.
    pub fn glow_px(self) -> f32 {
        match self {
            Tier::Core => 8.0,
            Tier::Logo => 6.0,
            Tier::Mid => 4.0,
            Tier::Edge | Tier::Background => 0.0,
        }
    }
}

pub const DEFAULT_HUE: f32 = 180.0;
/// Time for the binary-rain logo to reach full lightness.
pub const LOGO_REVEAL_MS: f64 = 3000.0;

/// Glyph and colour policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, ValueEnum)]
pub enum RenderStyle {
    /// `*` / `#` / `%` tiers over a cyan binary background
    #[default]
    Metaball,
    /// green falling digits, brighter where the forms pass; the logo fades in
    BinaryRain,
}

impl RenderStyle {
    pub fn next(self) -> RenderStyle {
        match self {
            RenderStyle::Metaball => RenderStyle::BinaryRain,
            RenderStyle::BinaryRain => RenderStyle::Metaball,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RenderStyle::Metaball => "metaball",
            RenderStyle::BinaryRain => "binary-rain",
        }
    }

    pub fn background_glyph<R: Rng>(self, rng: &mut R) -> char {
        if rng.gen_bool(0.5) {
            '0'
        } else {
            '1'
        }
    }

    /// Glyph for an emitter-driven tier.
    pub fn tier_glyph<R: Rng>(self, tier: Tier, rng: &mut R) -> char {
        match self {
            RenderStyle::Metaball => match tier {
                Tier::Core => '*',
                Tier::Mid => '#',
                Tier::Edge => '%',
                Tier::Background | Tier::Logo => self.background_glyph(rng),
            },
            RenderStyle::BinaryRain => self.background_glyph(rng),
        }
    }

    /// Vertical scroll of the background noise, in noise units.
    pub fn rain_offset(self, t_ms: f64) -> f32 {
        match self {
            RenderStyle::Metaball => 0.0,
            RenderStyle::BinaryRain => (t_ms * 0.0005) as f32,
        }
    }

    pub fn tier_color(self, tier: Tier, base_hue: Option<f32>, adjusted: f32, t_ms: f64) -> Hsl {
        let base = base_hue.unwrap_or(DEFAULT_HUE);
        match self {
            RenderStyle::Metaball => {
                let (drift, gain, s, l) = match tier {
                    Tier::Core => (0.01, 60.0, 85.0, 75.0),
                    Tier::Mid => (0.005, 30.0, 70.0, 55.0),
                    _ => (0.002, 15.0, 50.0, 35.0),
                };
                let hue = (base + (t_ms * drift) as f32 + adjusted * gain).rem_euclid(360.0);
                Hsl::new(hue, s, l)
            }
            RenderStyle::BinaryRain => match tier {
                Tier::Core => Hsl::new(120.0, 100.0, 72.0),
                Tier::Mid => Hsl::new(125.0, 85.0, 52.0),
                _ => Hsl::new(135.0, 65.0, 36.0),
            },
        }
    }

    /// `variation` is a noise sample scaled to [-20, 20].
    pub fn background_color(self, variation: f32) -> Hsl {
        match self {
            RenderStyle::Metaball => Hsl::new(180.0 + variation, 90.0, 15.0 + variation.abs()),
            RenderStyle::BinaryRain => {
                Hsl::new(140.0 + variation * 0.5, 80.0, 10.0 + variation.abs() * 0.6)
            }
        }
    }

    /// Fixed hue, lightness breathing with time. Binary rain fades the logo
    /// in from black over the first `LOGO_REVEAL_MS`.
    pub fn logo_color(self, t_ms: f64) -> Hsl {
        let l = 70.0 + (t_ms * 0.005).sin() as f32 * 10.0;
        match self {
            RenderStyle::Metaball => Hsl::new(180.0, 100.0, l),
            RenderStyle::BinaryRain => {
                let reveal = (t_ms / LOGO_REVEAL_MS).clamp(0.0, 1.0) as f32;
                Hsl::new(180.0, 100.0, l * reveal)
            }
        }
    }
}
