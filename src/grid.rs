use rand::Rng;

use crate::color::Hsl;
use crate::emitter::Vec2;
use crate::style::{RenderStyle, Tier, DEFAULT_HUE};

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub color: Hsl,
    pub tier: Tier,
    /// Max emitter influence this tick.
    pub influence: f32,
    pub dominant: Option<usize>,
    pub logo: bool,
    /// Ticks of highlight left.
    pub highlight: u8,
}

impl Cell {
    fn background(ch: char) -> Self {
        Self {
            ch,
            color: Hsl::new(DEFAULT_HUE, 100.0, 20.0),
            tier: Tier::Background,
            influence: 0.0,
            dominant: None,
            logo: false,
            highlight: 0,
        }
    }
}

/// Glyph pattern stamped at the centre of the grid.
#[derive(Clone, Debug)]
pub struct Logo {
    rows: Vec<Vec<char>>,
}

impl Logo {
    pub fn from_rows(rows: &[&str]) -> Self {
        Self {
            rows: rows.iter().map(|r| r.chars().collect()).collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Top-left corner that centres the pattern on a `cols` x `rows` grid.
    pub fn anchor(&self, cols: usize, rows: usize) -> (i64, i64) {
        let x = (cols / 2) as i64 - (self.width() / 2) as i64;
        let y = (rows / 2) as i64 - (self.height() / 2) as i64;
        (x, y)
    }
}

impl Default for Logo {
    fn default() -> Self {
        Logo::from_rows(&[
            "    ██████    ",
            "  ██████████  ",
            " ████████████ ",
            "██████████████",
            "██  ██████  ██",
            "██  ██████  ██",
            "██  ████████  ",
            "██   ██████   ",
            "██    ████    ",
            "██     ██     ",
        ])
    }
}

/// Character grid over the viewport; one cell is `cell_w` x `cell_h` pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    pub cols: usize,
    pub rows: usize,
    pub cell_w: f32,
    pub cell_h: f32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Partial trailing cells are dropped.
    pub fn dims_for(width: f32, height: f32, cell_w: f32, cell_h: f32) -> (usize, usize) {
        let cols = (width / cell_w).floor().max(0.0) as usize;
        let rows = (height / cell_h).floor().max(0.0) as usize;
        (cols, rows)
    }

    /// Zero-sized placeholder until the first `build`.
    pub fn empty(cell_w: f32, cell_h: f32) -> Self {
        Self {
            cols: 0,
            rows: 0,
            cell_w,
            cell_h,
            cells: Vec::new(),
        }
    }

    pub fn build<R: Rng>(
        width: f32,
        height: f32,
        cell_w: f32,
        cell_h: f32,
        logo: Option<&Logo>,
        style: RenderStyle,
        rng: &mut R,
    ) -> Self {
        let (cols, rows) = Self::dims_for(width, height, cell_w, cell_h);
        let cells = (0..cols * rows)
            .map(|_| Cell::background(style.background_glyph(rng)))
            .collect();
        let mut grid = Self {
            cols,
            rows,
            cell_w,
            cell_h,
            cells,
        };
        if let Some(logo) = logo {
            grid.stamp_logo(logo, style);
        }
        grid
    }

    fn stamp_logo(&mut self, logo: &Logo, style: RenderStyle) {
        let (ax, ay) = logo.anchor(self.cols, self.rows);
        for (ly, line) in logo.rows.iter().enumerate() {
            for (lx, &ch) in line.iter().enumerate() {
                if ch == ' ' {
                    continue;
                }
                let gx = ax + lx as i64;
                let gy = ay + ly as i64;
                if gx < 0 || gy < 0 || gx >= self.cols as i64 || gy >= self.rows as i64 {
                    continue;
                }
                let cell = self.get_mut(gx as usize, gy as usize);
                cell.ch = ch;
                cell.logo = true;
                cell.tier = Tier::Logo;
                cell.color = style.logo_color(0.0);
            }
        }
    }

    #[inline]
    pub fn idx(&self, col: usize, row: usize) -> usize {
        row * self.cols + col
    }

    pub fn get(&self, col: usize, row: usize) -> &Cell {
        &self.cells[self.idx(col, row)]
    }

    pub fn get_mut(&mut self, col: usize, row: usize) -> &mut Cell {
        let i = self.idx(col, row);
        &mut self.cells[i]
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Pixel-space centre of a cell.
    pub fn center(&self, col: usize, row: usize) -> Vec2 {
        Vec2::new(
            col as f32 * self.cell_w + self.cell_w / 2.0,
            row as f32 * self.cell_h + self.cell_h / 2.0,
        )
    }

    /// Inclusive cell ranges covered by a square of half-size `r` around `p`.
    pub fn cover(&self, p: Vec2, r: f32) -> Option<((usize, usize), (usize, usize))> {
        if self.is_empty() {
            return None;
        }
        let c0 = ((p.x - r) / self.cell_w).floor().max(0.0);
        let c1 = ((p.x + r) / self.cell_w).floor().min(self.cols as f32 - 1.0);
        let r0 = ((p.y - r) / self.cell_h).floor().max(0.0);
        let r1 = ((p.y + r) / self.cell_h).floor().min(self.rows as f32 - 1.0);
        if c0 > c1 || r0 > r1 {
            return None;
        }
        Some(((c0 as usize, c1 as usize), (r0 as usize, r1 as usize)))
    }

    pub fn logo_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.logo)
            .map(move |(i, _)| (i % self.cols, i / self.cols))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn grid(w: f32, h: f32, logo: Option<&Logo>) -> Grid {
        let mut rng = StdRng::seed_from_u64(42);
        Grid::build(w, h, 12.0, 16.0, logo, RenderStyle::Metaball, &mut rng)
    }

    #[test]
    fn floor_division_drops_partial_cells() {
        let g = grid(125.0, 170.0, None);
        assert_eq!((g.cols, g.rows), (10, 10));
        assert_eq!(g.cells().len(), 100);
        assert!(g.cells().iter().all(|c| matches!(c.ch, '0' | '1')));
    }

    #[test]
    fn logo_is_centred() {
        let logo = Logo::default();
        for (cols, rows) in [(80usize, 40usize), (81, 41), (33, 17)] {
            let g = grid(cols as f32 * 12.0, rows as f32 * 16.0, Some(&logo));
            let (ax, ay) = logo.anchor(cols, rows);
            assert_eq!(ax, (cols / 2) as i64 - 7);
            assert_eq!(ay, (rows / 2) as i64 - 5);

            let min_x = g.logo_cells().map(|(x, _)| x).min();
            let min_y = g.logo_cells().map(|(_, y)| y).min();
            assert_eq!(min_x, Some(ax as usize));
            assert_eq!(min_y, Some(ay as usize));
            // first row starts after four blanks
            assert!(g.get(ax as usize + 4, ay as usize).logo);
            assert!(!g.get(ax as usize, ay as usize).logo);
        }
    }

    #[test]
    fn logo_is_clipped_on_tiny_grids() {
        let logo = Logo::default();
        let g = grid(6.0 * 12.0, 4.0 * 16.0, Some(&logo));
        assert!(g.logo_cells().count() > 0);
        assert!(g.logo_cells().all(|(x, y)| x < 6 && y < 4));
    }

    #[test]
    fn cover_clamps_to_grid() {
        let g = grid(120.0, 160.0, None);
        let ((c0, c1), (r0, r1)) = g.cover(Vec2::new(0.0, 0.0), 30.0).unwrap();
        assert_eq!((c0, c1, r0, r1), (0, 2, 0, 1));
        assert!(g.cover(Vec2::new(-500.0, 20.0), 50.0).is_none());
        let ((_, c1), (_, r1)) = g.cover(Vec2::new(110.0, 150.0), 200.0).unwrap();
        assert_eq!((c1, r1), (9, 9));
    }

    #[test]
    fn same_seed_same_grid() {
        let logo = Logo::default();
        assert_eq!(grid(400.0, 300.0, Some(&logo)), grid(400.0, 300.0, Some(&logo)));
    }
}
