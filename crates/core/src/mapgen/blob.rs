//! Freeform connected shapes grown from noise and flood fill.
//!
//! A search fills a working grid with random live cells, flood-fills each
//! component and keeps the first one whose size lands inside the requested
//! mass window. Everything else on the working grid is cleared and the
//! survivor is cropped to its bounding box.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::rng::GenRng;

/// Live-cell probability used when the caller does not pick one. Just below
/// the 4-connected percolation threshold, so component sizes vary widely.
pub const DEFAULT_NOISE_DENSITY: f64 = 0.58;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobGrid {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl BlobGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, cells: vec![false; width * height] }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = alive;
        }
    }

    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    /// Live cells in row-major order.
    pub fn live_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(index, _)| (index % self.width, index / self.width))
    }

    /// Minimal bounding rectangle of the live cells. An empty grid crops to 0x0.
    pub fn crop(&self) -> Self {
        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0;
        let mut max_y = 0;
        for (x, y) in self.live_cells() {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        if min_x == usize::MAX {
            return Self::new(0, 0);
        }

        let mut cropped = Self::new(max_x - min_x + 1, max_y - min_y + 1);
        for (x, y) in self.live_cells() {
            cropped.set(x - min_x, y - min_y, true);
        }
        cropped
    }

    /// Truncates to at most `width` x `height`, keeping the top-left corner.
    pub fn clamp_to(&self, width: usize, height: usize) -> Self {
        if self.width <= width && self.height <= height {
            return self.clone();
        }
        warn!(
            natural_width = self.width,
            natural_height = self.height,
            width,
            height,
            "blob exceeds forced size; truncating"
        );
        let mut clamped = Self::new(self.width.min(width), self.height.min(height));
        for (x, y) in self.live_cells() {
            clamped.set(x, y, true);
        }
        clamped
    }

    /// Fills vertical gaps of at most `max_gap` cells between the top and
    /// bottom live cell of every column.
    pub fn gooify(&mut self, max_gap: usize) {
        for x in 0..self.width {
            let column: Vec<usize> = (0..self.height).filter(|&y| self.get(x, y)).collect();
            let (Some(&top), Some(&bottom)) = (column.first(), column.last()) else {
                continue;
            };
            let mut gap_start = None;
            for y in top..=bottom {
                match (self.get(x, y), gap_start) {
                    (false, None) => gap_start = Some(y),
                    (true, Some(start)) => {
                        if y - start <= max_gap {
                            for fill in start..y {
                                self.set(x, fill, true);
                            }
                        }
                        gap_start = None;
                    }
                    _ => {}
                }
            }
        }
    }

    /// Quarter turn clockwise.
    pub fn rotated(&self) -> Self {
        let mut rotated = Self::new(self.height, self.width);
        for (x, y) in self.live_cells() {
            rotated.set(self.height - 1 - y, x, true);
        }
        rotated
    }

    pub fn is_connected(&self) -> bool {
        let Some((start_x, start_y)) = self.live_cells().next() else {
            return true;
        };
        let component = self.component_from(start_x, start_y, &mut vec![false; self.cells.len()]);
        component.len() == self.count()
    }

    fn component_from(&self, x: usize, y: usize, visited: &mut [bool]) -> Vec<usize> {
        let start = y * self.width + x;
        let mut component = Vec::new();
        if !self.cells[start] || visited[start] {
            return component;
        }
        let mut queue = VecDeque::from([start]);
        visited[start] = true;
        while let Some(index) = queue.pop_front() {
            component.push(index);
            let (cx, cy) = (index % self.width, index / self.width);
            let mut neighbors = Vec::with_capacity(4);
            if cx > 0 {
                neighbors.push(index - 1);
            }
            if cx + 1 < self.width {
                neighbors.push(index + 1);
            }
            if cy > 0 {
                neighbors.push(index - self.width);
            }
            if cy + 1 < self.height {
                neighbors.push(index + self.width);
            }
            for next in neighbors {
                if self.cells[next] && !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        component
    }
}

/// Retry budget for one blob search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlobLimits {
    /// Noise passes per mass window before the window widens.
    pub attempts: u32,
    pub relaxations: u32,
}

impl Default for BlobLimits {
    fn default() -> Self {
        Self { attempts: 400, relaxations: 4 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlobOptions {
    pub noise_density: f64,
    /// Overrides the working-grid magnifier derived from the mass.
    pub magnifier: Option<f64>,
    pub gooify: Option<usize>,
    pub forced_size: Option<(usize, usize)>,
}

impl Default for BlobOptions {
    fn default() -> Self {
        Self { noise_density: DEFAULT_NOISE_DENSITY, magnifier: None, gooify: None, forced_size: None }
    }
}

fn check_mass_request(
    min_mass: usize,
    max_mass: usize,
    options: &BlobOptions,
) -> Result<(), GenerationError> {
    if !(options.noise_density > 0.0 && options.noise_density <= 1.0) {
        return Err(GenerationError::InvalidBlobRequest("noise density must be in (0, 1]"));
    }
    if options.magnifier.is_some_and(|magnifier| !(magnifier.is_finite() && magnifier > 0.0)) {
        return Err(GenerationError::InvalidBlobRequest("magnifier must be positive"));
    }
    if max_mass == 0 || min_mass > max_mass {
        return Err(GenerationError::InvalidBlobRequest("mass window is empty"));
    }
    Ok(())
}

fn check_size_request(
    width: usize,
    height: usize,
    min_density: f64,
    max_density: f64,
) -> Result<(), GenerationError> {
    if width == 0 || height == 0 {
        return Err(GenerationError::InvalidBlobRequest("target rectangle is empty"));
    }
    if !(0.0..=1.0).contains(&min_density) || !(0.0..=1.0).contains(&max_density) || min_density > max_density {
        return Err(GenerationError::InvalidBlobRequest("density window must lie in [0, 1] with min <= max"));
    }
    Ok(())
}

fn default_magnifier(max_mass: usize) -> f64 {
    1.0 + 3.0 / (max_mass.max(10) as f64).log10()
}

/// One connected blob of `min_mass..=max_mass` live cells.
pub fn generate_blob_of_mass(
    rng: &mut GenRng,
    min_mass: usize,
    max_mass: usize,
    options: BlobOptions,
    limits: BlobLimits,
) -> Result<BlobGrid, GenerationError> {
    check_mass_request(min_mass, max_mass, &options)?;
    let magnifier = options.magnifier.unwrap_or_else(|| default_magnifier(max_mass));
    let edge = ((max_mass as f64).sqrt() / options.noise_density * magnifier).ceil() as usize;
    let edge = edge.max(3);
    let search = BlobSearch {
        grid_width: edge,
        grid_height: edge,
        noise_density: options.noise_density,
        fit: None,
    };
    let mut blob = search.run(rng, min_mass, max_mass, limits)?;
    if let Some(max_gap) = options.gooify {
        blob.gooify(max_gap);
    }
    if let Some((width, height)) = options.forced_size {
        blob = blob.clamp_to(width, height);
    }
    Ok(blob)
}

/// Blob inside a `width` x `height` rectangle covering `min_density..=max_density`
/// of its area. The working grid is exactly the rectangle, which is quick but
/// gives blockier edges.
pub fn generate_blob_of_size_fast(
    rng: &mut GenRng,
    width: usize,
    height: usize,
    min_density: f64,
    max_density: f64,
    limits: BlobLimits,
) -> Result<BlobGrid, GenerationError> {
    check_size_request(width, height, min_density, max_density)?;
    let (min_mass, max_mass) = mass_window(width, height, min_density, max_density);
    let search = BlobSearch {
        grid_width: width,
        grid_height: height,
        noise_density: ((min_density + max_density) / 2.0 + 0.2).clamp(DEFAULT_NOISE_DENSITY, 0.95),
        fit: None,
    };
    search.run(rng, min_mass, max_mass, limits)
}

/// Same target as [`generate_blob_of_size_fast`], searched on an oversized
/// working grid; only components whose bounding box fits are accepted.
pub fn generate_blob_of_size_smooth(
    rng: &mut GenRng,
    width: usize,
    height: usize,
    min_density: f64,
    max_density: f64,
    limits: BlobLimits,
) -> Result<BlobGrid, GenerationError> {
    check_size_request(width, height, min_density, max_density)?;
    let (min_mass, max_mass) = mass_window(width, height, min_density, max_density);
    let magnifier = default_magnifier(max_mass);
    let search = BlobSearch {
        grid_width: ((width as f64) * magnifier).ceil() as usize,
        grid_height: ((height as f64) * magnifier).ceil() as usize,
        noise_density: ((min_density + max_density) / 2.0 + 0.1).clamp(DEFAULT_NOISE_DENSITY, 0.9),
        fit: Some((width, height)),
    };
    search.run(rng, min_mass, max_mass, limits)
}

fn mass_window(width: usize, height: usize, min_density: f64, max_density: f64) -> (usize, usize) {
    let area = (width * height) as f64;
    let min_mass = ((area * min_density).round() as usize).max(1);
    let max_mass = ((area * max_density).round() as usize).max(min_mass);
    (min_mass, max_mass)
}

struct BlobSearch {
    grid_width: usize,
    grid_height: usize,
    noise_density: f64,
    fit: Option<(usize, usize)>,
}

impl BlobSearch {
    fn run(
        &self,
        rng: &mut GenRng,
        min_mass: usize,
        max_mass: usize,
        limits: BlobLimits,
    ) -> Result<BlobGrid, GenerationError> {
        let mut window = (min_mass, max_mass);
        for relaxation in 0..=limits.relaxations {
            if relaxation > 0 {
                window = ((window.0 * 3 / 4).max(1), window.1 * 5 / 4);
                warn!(min_mass = window.0, max_mass = window.1, relaxation, "widening blob mass window");
            }
            for _ in 0..limits.attempts {
                if let Some(blob) = self.attempt(rng, window.0, window.1) {
                    return Ok(blob);
                }
            }
            debug!(min_mass = window.0, max_mass = window.1, "blob window produced no match");
        }
        Err(GenerationError::BlobSearchExhausted { min_mass: window.0, max_mass: window.1 })
    }

    fn attempt(&self, rng: &mut GenRng, min_mass: usize, max_mass: usize) -> Option<BlobGrid> {
        let mut grid = BlobGrid::new(self.grid_width, self.grid_height);
        for cell in &mut grid.cells {
            *cell = rng.chance(self.noise_density);
        }

        let mut visited = vec![false; grid.cells.len()];
        let mut tried_seeds = Vec::new();
        for start in 0..grid.cells.len() {
            if !grid.cells[start] || visited[start] {
                continue;
            }
            let component =
                grid.component_from(start % grid.width, start / grid.width, &mut visited);
            if (min_mass..=max_mass).contains(&component.len()) && self.fits(&grid, &component) {
                clear_rejected(&mut grid, &tried_seeds);
                return Some(isolate(&grid, &component).crop());
            }
            tried_seeds.push(start);
        }
        None
    }

    fn fits(&self, grid: &BlobGrid, component: &[usize]) -> bool {
        let Some((width, height)) = self.fit else {
            return true;
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (usize::MAX, usize::MAX, 0, 0);
        for &index in component {
            let (x, y) = (index % grid.width, index / grid.width);
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        max_x + 1 - min_x <= width && max_y + 1 - min_y <= height
    }
}

fn clear_rejected(grid: &mut BlobGrid, tried_seeds: &[usize]) {
    let mut visited = vec![false; grid.cells.len()];
    for &seed in tried_seeds {
        for index in grid.component_from(seed % grid.width, seed / grid.width, &mut visited) {
            grid.cells[index] = false;
        }
    }
}

/// Copy of `grid` holding only `component`, so components after the accepted
/// one in scan order never leak into the result.
fn isolate(grid: &BlobGrid, component: &[usize]) -> BlobGrid {
    let mut only = BlobGrid::new(grid.width, grid.height);
    for &index in component {
        only.cells[index] = true;
    }
    only
}
