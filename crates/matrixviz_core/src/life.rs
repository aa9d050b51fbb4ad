//! Game of Life
//!
//! Conway's B3/S23 rules on a torus the size of the matrix. The grid
//! advances once every `frames_per_step` drawn frames and reseeds itself
//! when every cell has died.

use matrixviz_display::{Canvas, Rgb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Fraction of cells alive after seeding
pub const SEED_DENSITY: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct GameOfLife {
    width: usize,
    height: usize,
    cells: Vec<bool>,
    next: Vec<bool>,
    rng: StdRng,
    frames_per_step: u32,
    frame: u32,
    generation: u64,
}

impl GameOfLife {
    /// Randomly seeded grid; `seed` makes the sequence reproducible
    pub fn new(width: usize, height: usize, frames_per_step: u32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        let mut life = Self {
            width,
            height,
            cells: vec![false; width * height],
            next: vec![false; width * height],
            rng,
            frames_per_step: frames_per_step.max(1),
            frame: 0,
            generation: 0,
        };
        life.reseed();
        life
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    pub fn set_alive(&mut self, x: usize, y: usize, alive: bool) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = alive;
        }
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = false);
    }

    pub fn reseed(&mut self) {
        for cell in &mut self.cells {
            *cell = self.rng.random_bool(SEED_DENSITY);
        }
        debug!("Life grid seeded with {} live cells", self.live_count());
    }

    fn live_neighbours(&self, x: usize, y: usize) -> u8 {
        let (w, h) = (self.width, self.height);
        let mut count = 0;
        for dy in [h - 1, 0, 1] {
            for dx in [w - 1, 0, 1] {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = (x + dx) % w;
                let ny = (y + dy) % h;
                count += self.cells[ny * w + nx] as u8;
            }
        }
        count
    }

    /// Advance one generation; reseed if nothing survives
    pub fn step(&mut self) {
        if self.cells.is_empty() {
            return;
        }
        for y in 0..self.height {
            for x in 0..self.width {
                let alive = self.cells[y * self.width + x];
                let n = self.live_neighbours(x, y);
                self.next[y * self.width + x] = matches!((alive, n), (true, 2) | (_, 3));
            }
        }
        std::mem::swap(&mut self.cells, &mut self.next);
        self.generation += 1;

        if self.live_count() == 0 {
            debug!("Life grid died out at generation {}", self.generation);
            self.reseed();
        }
    }

    /// Count one frame, stepping when the interval elapses, then draw
    pub fn draw<C: Canvas + ?Sized>(&mut self, canvas: &mut C) {
        self.frame += 1;
        if self.frame >= self.frames_per_step {
            self.frame = 0;
            self.step();
        }

        canvas.clear();
        for y in 0..self.height.min(canvas.height()) {
            for x in 0..self.width.min(canvas.width()) {
                if self.cells[y * self.width + x] {
                    canvas.set_pixel(x, y, Rgb::WHITE);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrixviz_display::FrameBuffer;

    fn empty(width: usize, height: usize) -> GameOfLife {
        let mut life = GameOfLife::new(width, height, 1, Some(7));
        life.clear();
        life
    }

    #[test]
    fn test_seed_density() {
        let life = GameOfLife::new(64, 32, 200, Some(42));
        let ratio = life.live_count() as f64 / (64.0 * 32.0);
        assert!((0.2..0.4).contains(&ratio), "{}", ratio);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = GameOfLife::new(16, 8, 1, Some(3));
        let b = GameOfLife::new(16, 8, 1, Some(3));
        assert_eq!(a.cells, b.cells);
    }

    #[test]
    fn test_blinker_oscillates() {
        let mut life = empty(5, 5);
        for x in 1..4 {
            life.set_alive(x, 2, true);
        }
        life.step();
        assert!(life.is_alive(2, 1) && life.is_alive(2, 2) && life.is_alive(2, 3));
        assert!(!life.is_alive(1, 2) && !life.is_alive(3, 2));
        life.step();
        assert!(life.is_alive(1, 2) && life.is_alive(2, 2) && life.is_alive(3, 2));
        assert_eq!(life.live_count(), 3);
    }

    #[test]
    fn test_block_is_still() {
        let mut life = empty(6, 6);
        for (x, y) in [(2, 2), (3, 2), (2, 3), (3, 3)] {
            life.set_alive(x, y, true);
        }
        life.step();
        assert_eq!(life.live_count(), 4);
        assert!(life.is_alive(2, 2) && life.is_alive(3, 3));
    }

    #[test]
    fn test_edges_wrap() {
        // A blinker across the left/right seam
        let mut life = empty(6, 6);
        life.set_alive(5, 3, true);
        life.set_alive(0, 3, true);
        life.set_alive(1, 3, true);
        life.step();
        assert!(life.is_alive(0, 2) && life.is_alive(0, 3) && life.is_alive(0, 4));
        assert_eq!(life.live_count(), 3);
    }

    #[test]
    fn test_dead_grid_reseeds() {
        let mut life = empty(16, 16);
        life.set_alive(4, 4, true);
        life.step();
        assert!(life.live_count() > 0);
        assert_eq!(life.generation(), 1);
    }

    #[test]
    fn test_steps_on_interval() {
        let mut life = GameOfLife::new(8, 8, 3, Some(1));
        let mut fb = FrameBuffer::new(8, 8).unwrap();
        life.draw(&mut fb);
        life.draw(&mut fb);
        assert_eq!(life.generation(), 0);
        life.draw(&mut fb);
        assert_eq!(life.generation(), 1);
    }

    #[test]
    fn test_draw_white_cells() {
        let mut life = empty(4, 4);
        life.frames_per_step = 100;
        life.set_alive(1, 2, true);
        let mut fb = FrameBuffer::new(4, 4).unwrap();
        life.draw(&mut fb);
        assert_eq!(fb.pixel(1, 2), Some(Rgb::WHITE));
        assert_eq!(fb.lit_pixels(), 1);
    }
}
