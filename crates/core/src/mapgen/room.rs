//! A shape instance placed on the map, with its doors and door convexes.

use std::collections::BTreeMap;

use tracing::debug;

use crate::catalog::{ShapeKind, Terrain, TerrainId};
use crate::error::GenerationError;
use crate::level::{Level, PlacedRoom};
use crate::rng::GenRng;
use crate::types::{Category, Direction, Pos};

use super::blob::BlobLimits;
use super::grid::neighbors8;
use super::shape::{LocalCell, ShapeMask};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Room {
    pub terrain: TerrainId,
    pub origin: Pos,
    pub protected: bool,
    mask: ShapeMask,
    doors: BTreeMap<Direction, Pos>,
    convexes: BTreeMap<Direction, Pos>,
}

/// Everything needed to instantiate one room candidate.
pub struct RoomRequest<'a> {
    pub terrain_id: TerrainId,
    pub terrain: &'a Terrain,
    pub shape: ShapeKind,
    pub origin: Pos,
    pub width: usize,
    pub height: usize,
    pub blob_limits: BlobLimits,
}

impl Room {
    /// Builds the shape and rolls its doors. Door cells are chosen here, at
    /// construction, from each direction's candidate list.
    pub fn build(request: &RoomRequest<'_>, rng: &mut GenRng) -> Result<Self, GenerationError> {
        let mask = ShapeMask::build(
            request.shape,
            request.width,
            request.height,
            &request.terrain.blob,
            request.blob_limits,
            rng,
        )?;
        let mut room = Self {
            terrain: request.terrain_id,
            origin: request.origin,
            protected: request.terrain.protected,
            mask,
            doors: BTreeMap::new(),
            convexes: BTreeMap::new(),
        };

        let door_count = request.terrain.doors.sample(rng).copied().unwrap_or(0).min(4);
        let mut directions = Direction::ALL;
        rng.shuffle(&mut directions);
        for direction in directions.into_iter().take(door_count) {
            let candidates: Vec<Pos> = room
                .mask
                .door_candidates(direction)
                .iter()
                .map(|&local| room.to_world(local))
                .filter(|&door| room.doors.values().all(|&other| !neighbors8(other).contains(&door)))
                .collect();
            let Some(&door) = rng.choose(&candidates) else {
                debug!(?direction, shape = room.shape().name(), "no door candidate on this side");
                continue;
            };
            room.doors.insert(direction, door);
            room.convexes.insert(direction, door.step(direction));
        }
        Ok(room)
    }

    pub fn shape(&self) -> ShapeKind {
        self.mask.kind()
    }

    pub fn width(&self) -> usize {
        self.mask.width()
    }

    pub fn height(&self) -> usize {
        self.mask.height()
    }

    fn to_world(&self, local: Pos) -> Pos {
        Pos { y: self.origin.y + local.y, x: self.origin.x + local.x }
    }

    fn local_cell(&self, pos: Pos) -> LocalCell {
        self.mask.at(pos.x - self.origin.x, pos.y - self.origin.y)
    }

    pub fn doors(&self) -> impl Iterator<Item = (Direction, Pos)> + '_ {
        self.doors.iter().map(|(&direction, &pos)| (direction, pos))
    }

    pub fn convex(&self, direction: Direction) -> Option<Pos> {
        self.convexes.get(&direction).copied()
    }

    pub fn convexes(&self) -> impl Iterator<Item = Pos> + '_ {
        self.convexes.values().copied()
    }

    pub fn door_count(&self) -> usize {
        self.doors.len()
    }

    /// Drops every door whose convex falls on a protected cell and returns how
    /// many went. Such a door is skipped rather than failing the whole room.
    pub(super) fn drop_doors_into_protected(&mut self, level: &Level) -> usize {
        let blocked: Vec<Direction> = self
            .convexes
            .iter()
            .filter(|&(_, &convex)| level.in_bounds(convex) && level.is_protected(convex))
            .map(|(&direction, _)| direction)
            .collect();
        for direction in &blocked {
            debug!(?direction, convex = ?self.convexes.get(direction), "door convex lands on a protected cell; door skipped");
            self.doors.remove(direction);
            self.convexes.remove(direction);
        }
        blocked.len()
    }

    pub fn inner_cells(&self) -> Vec<Pos> {
        ShapeMask::expand(&self.mask.inner_spans()).into_iter().map(|p| self.to_world(p)).collect()
    }

    pub fn outer_cells(&self) -> Vec<Pos> {
        ShapeMask::expand(&self.mask.outer_spans()).into_iter().map(|p| self.to_world(p)).collect()
    }

    pub fn wall_cells(&self) -> Vec<Pos> {
        self.outer_cells()
            .into_iter()
            .filter(|&pos| self.local_cell(pos) == LocalCell::Wall)
            .collect()
    }

    pub fn is_inner(&self, pos: Pos) -> bool {
        self.local_cell(pos) == LocalCell::Inner
    }

    /// Outer cells plus door convexes.
    pub fn owns(&self, pos: Pos) -> bool {
        self.local_cell(pos) != LocalCell::Outside || self.convexes.values().any(|&c| c == pos)
    }

    /// Inner cell closest to the footprint's geometric center.
    pub fn anchor(&self) -> Pos {
        let center_x2 = 2 * self.origin.x + self.width() as i32 - 1;
        let center_y2 = 2 * self.origin.y + self.height() as i32 - 1;
        self.inner_cells()
            .into_iter()
            .min_by_key(|pos| {
                let dx = i64::from(2 * pos.x - center_x2);
                let dy = i64::from(2 * pos.y - center_y2);
                (dx * dx + dy * dy, pos.y, pos.x)
            })
            .unwrap_or(self.origin)
    }

    /// True when this candidate cannot be placed on `level` as it stands.
    pub fn intersects(&self, level: &Level) -> bool {
        for pos in self.outer_cells() {
            if !level.in_bounds(pos)
                || level.category_at(pos) != Category::Void
                || level.is_protected(pos)
            {
                return true;
            }
        }
        for (direction, door) in self.doors() {
            let Some(convex) = self.convex(direction) else {
                continue;
            };
            if !level.in_bounds(convex)
                || level.category_at(convex) != Category::Void
                || level.is_protected(convex)
            {
                return true;
            }
            if neighbors8(door).into_iter().any(|around| level.category_at(around) == Category::Door)
            {
                return true;
            }
        }
        false
    }

    pub fn to_placed(&self) -> PlacedRoom {
        PlacedRoom {
            terrain: self.terrain,
            shape: self.shape(),
            origin: self.origin,
            width: self.width(),
            height: self.height(),
            inner: self.inner_cells(),
            walls: self.wall_cells(),
            doors: self.doors.values().copied().collect(),
            convexes: self.convexes.values().copied().collect(),
        }
    }
}
