use std::io::{self, Write};

use crossterm::{
    cursor, queue,
    style::{Print, SetBackgroundColor, SetForegroundColor},
};

use crate::color::Rgb;
use crate::grid::Grid;

/// `#0a0a0a`
pub const BACKGROUND: Rgb = Rgb::new(10, 10, 10);

/// Blend weight of a full-strength glow at its own cell.
const GLOW_GAIN: f32 = 0.22;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Texel {
    pub ch: char,
    pub fg: Rgb,
    pub bg: Rgb,
}

impl Texel {
    fn blank(bg: Rgb) -> Self {
        Self { ch: ' ', fg: bg, bg }
    }
}

/// Off-screen compositor. `back` is drawn every tick, `front` mirrors what
/// the terminal currently shows.
pub struct Renderer {
    w: u16,
    h: u16,
    back: Vec<Texel>,
    front: Vec<Option<Texel>>,
}

impl Renderer {
    pub fn new(w: u16, h: u16) -> Self {
        let n = w as usize * h as usize;
        Self {
            w,
            h,
            back: vec![Texel::blank(BACKGROUND); n],
            front: vec![None; n],
        }
    }

    pub fn size(&self) -> (u16, u16) {
        (self.w, self.h)
    }

    pub fn resize(&mut self, w: u16, h: u16) {
        if self.w == w && self.h == h {
            return;
        }
        *self = Self::new(w, h);
    }

    /// Forget what the terminal shows so the next present repaints all.
    pub fn invalidate(&mut self) {
        self.front.iter_mut().for_each(|t| *t = None);
    }

    fn idx(&self, x: u16, y: u16) -> usize {
        y as usize * self.w as usize + x as usize
    }

    pub fn texel(&self, x: u16, y: u16) -> Texel {
        self.back[self.idx(x, y)]
    }

    /// Compose the grid into the off-screen buffer.
    pub fn draw(&mut self, grid: &Grid) {
        for t in &mut self.back {
            *t = Texel::blank(BACKGROUND);
        }

        let cols = grid.cols.min(self.w as usize);
        let rows = grid.rows.min(self.h as usize);

        for row in 0..rows {
            for col in 0..cols {
                let cell = grid.get(col, row);
                let i = self.idx(col as u16, row as u16);
                self.back[i].ch = cell.ch;
                self.back[i].fg = cell.color.to_rgb();
            }
        }

        // Glow pass reads fg only and max-blends bg, so cell order is irrelevant.
        for row in 0..rows {
            for col in 0..cols {
                let blur = grid.get(col, row).tier.glow_px();
                if blur <= 0.0 {
                    continue;
                }
                let fg = self.back[self.idx(col as u16, row as u16)].fg;
                let strength = blur / 8.0;
                let reach = (blur / grid.cell_w).ceil() as i64;

                for dy in -reach..=reach {
                    for dx in -reach..=reach {
                        let x = col as i64 + dx;
                        let y = row as i64 + dy;
                        if x < 0 || y < 0 || x >= cols as i64 || y >= rows as i64 {
                            continue;
                        }
                        let d = dx.abs().max(dy.abs()) as f32;
                        let tint = Rgb::lerp(BACKGROUND, fg, GLOW_GAIN * strength / (1.0 + d));
                        let i = self.idx(x as u16, y as u16);
                        self.back[i].bg = self.back[i].bg.max(tint);
                    }
                }
            }
        }
    }

    /// Write a line of text over the composed frame.
    pub fn overlay(&mut self, y: u16, text: &str, fg: Rgb, bg: Rgb) {
        if y >= self.h {
            return;
        }
        for (x, ch) in text.chars().take(self.w as usize).enumerate() {
            let i = self.idx(x as u16, y);
            self.back[i] = Texel { ch, fg, bg };
        }
    }

    /// Copy the off-screen buffer to `out`, emitting only changed texels.
    pub fn present<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let mut last_fg: Option<Rgb> = None;
        let mut last_bg: Option<Rgb> = None;

        for y in 0..self.h {
            for x in 0..self.w {
                let i = self.idx(x, y);
                let b = self.back[i];
                if self.front[i] == Some(b) {
                    continue;
                }

                queue!(out, cursor::MoveTo(x, y))?;
                if last_bg != Some(b.bg) {
                    queue!(out, SetBackgroundColor(b.bg.to_color()))?;
                    last_bg = Some(b.bg);
                }
                if last_fg != Some(b.fg) {
                    queue!(out, SetForegroundColor(b.fg.to_color()))?;
                    last_fg = Some(b.fg);
                }
                queue!(out, Print(b.ch))?;
                self.front[i] = Some(b);
            }
        }
        Ok(())
    }
}
