//! Room footprints in room-local coordinates: inner area, wall ring and
//! per-direction door candidates.

use std::collections::BTreeMap;

use crate::catalog::{BlobParams, ShapeKind};
use crate::error::GenerationError;
use crate::rng::GenRng;
use crate::types::{Direction, Pos};

use super::blob::{BlobGrid, BlobLimits, generate_blob_of_size_fast, generate_blob_of_size_smooth};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocalCell {
    Outside,
    Wall,
    Inner,
}

/// Horizontal run of cells `x_start..=x_end` on row `y`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub y: i32,
    pub x_start: i32,
    pub x_end: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeMask {
    kind: ShapeKind,
    width: usize,
    height: usize,
    cells: Vec<LocalCell>,
    door_candidates: BTreeMap<Direction, Vec<Pos>>,
}

impl ShapeMask {
    /// Builds `kind` inside a `width` x `height` footprint. Shapes that need
    /// more room than the footprint offers degrade to a rectangle.
    pub fn build(
        kind: ShapeKind,
        width: usize,
        height: usize,
        blob: &BlobParams,
        limits: BlobLimits,
        rng: &mut GenRng,
    ) -> Result<Self, GenerationError> {
        if width < 3 || height < 3 {
            return Err(GenerationError::RoomTooSmall { shape: kind.name(), width, height });
        }
        let kind = match kind {
            ShapeKind::Circular | ShapeKind::Perpendicular if width < 7 || height < 7 => {
                ShapeKind::Rectangular
            }
            ShapeKind::Blob if width < 5 || height < 5 => ShapeKind::Rectangular,
            other => other,
        };
        let mask = match kind {
            ShapeKind::Rectangular => Self::rectangular(width, height),
            ShapeKind::Circular => Self::circular(width, height),
            ShapeKind::Perpendicular => Self::perpendicular(width, height),
            ShapeKind::Blob => Self::blob(width, height, blob, limits, rng)?,
        };
        if mask.inner_count() == 0 {
            return Err(GenerationError::RoomTooSmall { shape: kind.name(), width, height });
        }
        Ok(mask)
    }

    pub fn rectangular(width: usize, height: usize) -> Self {
        let mut mask = Self::empty(ShapeKind::Rectangular, width, height);
        for y in 0..height {
            for x in 0..width {
                let border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
                mask.put(x, y, if border { LocalCell::Wall } else { LocalCell::Inner });
            }
        }
        mask.door_candidates = mask.flanked_door_candidates();
        mask
    }

    /// Rows 0 and `h-1` are inset by two, rows 1 and `h-2` by one.
    pub fn circular(width: usize, height: usize) -> Self {
        let mut mask = Self::empty(ShapeKind::Circular, width, height);
        for y in 0..height {
            let inset = match y.min(height - 1 - y) {
                0 => 2,
                1 => 1,
                _ => 0,
            };
            for x in inset..(width - inset) {
                mask.put(x, y, LocalCell::Wall);
            }
        }
        mask.erode_into_inner();
        mask.door_candidates = mask.flanked_door_candidates();
        mask
    }

    /// Plus sign: a full-width bar crossed by a full-height bar.
    pub fn perpendicular(width: usize, height: usize) -> Self {
        let mut mask = Self::empty(ShapeKind::Perpendicular, width, height);
        let bar_rows = (height / 2).max(3);
        let bar_columns = (width / 2).max(3);
        let top = (height - bar_rows) / 2;
        let left = (width - bar_columns) / 2;
        for y in 0..height {
            for x in 0..width {
                let in_row_bar = (top..top + bar_rows).contains(&y);
                let in_column_bar = (left..left + bar_columns).contains(&x);
                if in_row_bar || in_column_bar {
                    mask.put(x, y, LocalCell::Wall);
                }
            }
        }
        mask.erode_into_inner();
        mask.door_candidates = mask.flanked_door_candidates();
        mask
    }

    /// Blob inner area with an 8-connected wall ring around it.
    pub fn blob(
        width: usize,
        height: usize,
        params: &BlobParams,
        limits: BlobLimits,
        rng: &mut GenRng,
    ) -> Result<Self, GenerationError> {
        let rotate = params.rotate && rng.chance(0.5);
        let (target_width, target_height) =
            if rotate { (height - 2, width - 2) } else { (width - 2, height - 2) };
        let generate =
            if params.smooth { generate_blob_of_size_smooth } else { generate_blob_of_size_fast };
        let mut grid = generate(
            rng,
            target_width,
            target_height,
            params.min_density,
            params.max_density,
            limits,
        )?;
        if let Some(max_gap) = params.gooify {
            grid.gooify(max_gap);
        }
        if rotate {
            grid = grid.rotated();
        }
        Ok(Self::from_blob(&grid))
    }

    pub fn from_blob(grid: &BlobGrid) -> Self {
        let width = grid.width() + 2;
        let height = grid.height() + 2;
        let mut mask = Self::empty(ShapeKind::Blob, width, height);
        for (x, y) in grid.live_cells() {
            for wy in y..=y + 2 {
                for wx in x..=x + 2 {
                    if mask.at(wx as i32, wy as i32) == LocalCell::Outside {
                        mask.put(wx, wy, LocalCell::Wall);
                    }
                }
            }
        }
        for (x, y) in grid.live_cells() {
            mask.put(x + 1, y + 1, LocalCell::Inner);
        }
        mask.door_candidates = mask.scanned_door_candidates();
        mask
    }

    fn empty(kind: ShapeKind, width: usize, height: usize) -> Self {
        Self {
            kind,
            width,
            height,
            cells: vec![LocalCell::Outside; width * height],
            door_candidates: BTreeMap::new(),
        }
    }

    fn put(&mut self, x: usize, y: usize, cell: LocalCell) {
        self.cells[y * self.width + x] = cell;
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn at(&self, x: i32, y: i32) -> LocalCell {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return LocalCell::Outside;
        }
        self.cells[(y as usize) * self.width + (x as usize)]
    }

    fn at_pos(&self, pos: Pos) -> LocalCell {
        self.at(pos.x, pos.y)
    }

    pub fn inner_count(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell == LocalCell::Inner).count()
    }

    pub fn door_candidates(&self, direction: Direction) -> &[Pos] {
        self.door_candidates.get(&direction).map_or(&[], Vec::as_slice)
    }

    pub fn inner_spans(&self) -> Vec<Span> {
        self.spans(|cell| cell == LocalCell::Inner)
    }

    /// Wall plus inner.
    pub fn outer_spans(&self) -> Vec<Span> {
        self.spans(|cell| cell != LocalCell::Outside)
    }

    fn spans(&self, keep: impl Fn(LocalCell) -> bool) -> Vec<Span> {
        let mut spans = Vec::new();
        for y in 0..self.height as i32 {
            let mut run_start = None;
            for x in 0..=self.width as i32 {
                match (keep(self.at(x, y)) && x < self.width as i32, run_start) {
                    (true, None) => run_start = Some(x),
                    (false, Some(x_start)) => {
                        spans.push(Span { y, x_start, x_end: x - 1 });
                        run_start = None;
                    }
                    _ => {}
                }
            }
        }
        spans
    }

    /// Materializes a span list into local cells.
    pub fn expand(spans: &[Span]) -> Vec<Pos> {
        spans
            .iter()
            .flat_map(|span| (span.x_start..=span.x_end).map(move |x| Pos { y: span.y, x }))
            .collect()
    }

    /// Cells of the outline whose whole 8-neighbourhood lies in the outline become inner.
    fn erode_into_inner(&mut self) {
        let mut inner = Vec::new();
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let enclosed = (-1..=1).all(|dy| {
                    (-1..=1).all(|dx| self.at(x + dx, y + dy) != LocalCell::Outside)
                });
                if enclosed {
                    inner.push((x as usize, y as usize));
                }
            }
        }
        for (x, y) in inner {
            self.put(x, y, LocalCell::Inner);
        }
    }

    /// Wall cells with open space in front, inner behind and wall on both flanks.
    fn flanked_door_candidates(&self) -> BTreeMap<Direction, Vec<Pos>> {
        let mut candidates = BTreeMap::new();
        for direction in Direction::ALL {
            let (side_a, side_b) = flanks(direction);
            let cells: Vec<Pos> = (0..self.height as i32)
                .flat_map(|y| (0..self.width as i32).map(move |x| Pos { y, x }))
                .filter(|&pos| {
                    self.at_pos(pos) == LocalCell::Wall
                        && self.at_pos(pos.step(direction)) == LocalCell::Outside
                        && self.at_pos(pos.step(direction.opposite())) == LocalCell::Inner
                        && self.at_pos(pos.step(side_a)) == LocalCell::Wall
                        && self.at_pos(pos.step(side_b)) == LocalCell::Wall
                })
                .collect();
            candidates.insert(direction, cells);
        }
        candidates
    }

    /// Scans lines from the `direction` side for the first run of wall cells
    /// that, with its two end cells trimmed, still has a usable door cell.
    fn scanned_door_candidates(&self) -> BTreeMap<Direction, Vec<Pos>> {
        let mut candidates = BTreeMap::new();
        for direction in Direction::ALL {
            let horizontal = matches!(direction, Direction::Up | Direction::Down);
            let (lines, along) = if horizontal {
                (self.height as i32, self.width as i32)
            } else {
                (self.width as i32, self.height as i32)
            };
            let line_order: Vec<i32> = match direction {
                Direction::Up | Direction::Left => (0..lines).collect(),
                Direction::Down | Direction::Right => (0..lines).rev().collect(),
            };
            let cell_at = |line: i32, offset: i32| {
                if horizontal { Pos { y: line, x: offset } } else { Pos { y: offset, x: line } }
            };

            let mut found = Vec::new();
            'lines: for line in line_order {
                let mut offset = 0;
                while offset < along {
                    if self.at_pos(cell_at(line, offset)) != LocalCell::Wall {
                        offset += 1;
                        continue;
                    }
                    let run_start = offset;
                    while offset < along && self.at_pos(cell_at(line, offset)) == LocalCell::Wall {
                        offset += 1;
                    }
                    let run_end = offset - 1;
                    found = ((run_start + 1)..run_end)
                        .map(|inside| cell_at(line, inside))
                        .filter(|&pos| {
                            self.at_pos(pos.step(direction)) == LocalCell::Outside
                                && self.at_pos(pos.step(direction.opposite())) == LocalCell::Inner
                        })
                        .collect();
                    if !found.is_empty() {
                        break 'lines;
                    }
                }
            }
            candidates.insert(direction, found);
        }
        candidates
    }
}

fn flanks(direction: Direction) -> (Direction, Direction) {
    match direction {
        Direction::Up | Direction::Down => (Direction::Left, Direction::Right),
        Direction::Left | Direction::Right => (Direction::Up, Direction::Down),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen::grid::neighbors8;

    fn assert_inner_enclosed(mask: &ShapeMask) {
        for pos in ShapeMask::expand(&mask.inner_spans()) {
            for around in neighbors8(pos) {
                assert_ne!(
                    mask.at_pos(around),
                    LocalCell::Outside,
                    "inner cell {pos:?} of {:?} touches the outside at {around:?}",
                    mask.kind()
                );
            }
        }
    }

    fn assert_doors_are_well_formed(mask: &ShapeMask) {
        for direction in Direction::ALL {
            for &door in mask.door_candidates(direction) {
                assert_eq!(mask.at_pos(door), LocalCell::Wall);
                assert_eq!(mask.at_pos(door.step(direction)), LocalCell::Outside);
                assert_eq!(mask.at_pos(door.step(direction.opposite())), LocalCell::Inner);
            }
        }
    }

    #[test]
    fn rectangle_doors_skip_corners() {
        let mask = ShapeMask::rectangular(6, 5);
        assert_eq!(mask.inner_count(), 4 * 3);
        let up = mask.door_candidates(Direction::Up);
        assert_eq!(up.len(), 4);
        assert!(!up.contains(&Pos { y: 0, x: 0 }));
        assert!(!up.contains(&Pos { y: 0, x: 5 }));
        assert_eq!(mask.door_candidates(Direction::Left).len(), 3);
        assert_doors_are_well_formed(&mask);
    }

    #[test]
    fn circle_insets_rows_and_keeps_inner_enclosed() {
        let mask = ShapeMask::circular(9, 9);
        assert_eq!(mask.at(0, 0), LocalCell::Outside);
        assert_eq!(mask.at(1, 0), LocalCell::Outside);
        assert_eq!(mask.at(2, 0), LocalCell::Wall);
        assert_eq!(mask.at(0, 1), LocalCell::Outside);
        assert_eq!(mask.at(0, 4), LocalCell::Wall);
        assert_inner_enclosed(&mask);
        assert_doors_are_well_formed(&mask);
        for direction in Direction::ALL {
            assert!(!mask.door_candidates(direction).is_empty(), "{direction:?} has no door cell");
        }
    }

    #[test]
    fn perpendicular_is_a_plus_sign() {
        let mask = ShapeMask::perpendicular(9, 9);
        assert_eq!(mask.at(0, 0), LocalCell::Outside);
        assert_eq!(mask.at(4, 0), LocalCell::Wall);
        assert_eq!(mask.at(0, 4), LocalCell::Wall);
        assert_eq!(mask.at(4, 4), LocalCell::Inner);
        assert_inner_enclosed(&mask);
        assert_doors_are_well_formed(&mask);
    }

    #[test]
    fn small_footprints_degrade_to_rectangles() {
        let mut rng = GenRng::from_seed(4);
        let params = BlobParams::default();
        let mask =
            ShapeMask::build(ShapeKind::Circular, 5, 6, &params, BlobLimits::default(), &mut rng)
                .expect("fallback rectangle");
        assert_eq!(mask.kind(), ShapeKind::Rectangular);
        assert!(matches!(
            ShapeMask::build(ShapeKind::Rectangular, 2, 6, &params, BlobLimits::default(), &mut rng),
            Err(GenerationError::RoomTooSmall { .. })
        ));
    }

    #[test]
    fn blob_rooms_are_walled_and_have_doors() {
        for seed in 0..10 {
            let mut rng = GenRng::from_seed(seed);
            let mask = ShapeMask::build(
                ShapeKind::Blob,
                12,
                10,
                &BlobParams::default(),
                BlobLimits::default(),
                &mut rng,
            )
            .expect("blob room");
            assert!(mask.width() <= 12 && mask.height() <= 10, "seed {seed}: blob overflowed");
            assert_inner_enclosed(&mask);
            assert_doors_are_well_formed(&mask);
            let total: usize =
                Direction::ALL.iter().map(|&direction| mask.door_candidates(direction).len()).sum();
            assert!(total > 0, "seed {seed}: blob room has no door candidates");
        }
    }

    #[test]
    fn span_expansion_covers_every_outer_cell() {
        let mask = ShapeMask::circular(7, 8);
        let outer = ShapeMask::expand(&mask.outer_spans());
        let direct = mask.cells.iter().filter(|&&cell| cell != LocalCell::Outside).count();
        assert_eq!(outer.len(), direct);
    }
}
