//! Grid and tile-space primitives shared by placement, tunnels, stairs and validation.

use std::collections::VecDeque;

use crate::level::Level;
use crate::types::{Category, Pos};

pub(crate) fn neighbors4(p: Pos) -> [Pos; 4] {
    [
        Pos { y: p.y - 1, x: p.x },
        Pos { y: p.y, x: p.x + 1 },
        Pos { y: p.y + 1, x: p.x },
        Pos { y: p.y, x: p.x - 1 },
    ]
}

pub(crate) fn diagonals(p: Pos) -> [Pos; 4] {
    [
        Pos { y: p.y - 1, x: p.x - 1 },
        Pos { y: p.y - 1, x: p.x + 1 },
        Pos { y: p.y + 1, x: p.x + 1 },
        Pos { y: p.y + 1, x: p.x - 1 },
    ]
}

pub(crate) fn neighbors8(p: Pos) -> [Pos; 8] {
    let [up, right, down, left] = neighbors4(p);
    let [up_left, up_right, down_right, down_left] = diagonals(p);
    [up, up_right, right, down_right, down, down_left, left, up_left]
}

pub(crate) fn manhattan(a: Pos, b: Pos) -> u32 {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
}

/// BFS distances over walkable-and-safe cells, 8-connected. Entities are ignored.
pub(crate) fn walk_distances(level: &Level, start: Pos) -> Vec<Option<u32>> {
    let mut distances = vec![None; level.width * level.height];
    if !level.is_walkable_and_safe(start) {
        return distances;
    }
    let index = |pos: Pos| (pos.y as usize) * level.width + (pos.x as usize);

    let mut queue = VecDeque::from([start]);
    distances[index(start)] = Some(0);
    while let Some(current) = queue.pop_front() {
        let next_distance = distances[index(current)].map_or(0, |distance| distance + 1);
        for next in neighbors8(current) {
            if !level.is_walkable_and_safe(next) || distances[index(next)].is_some() {
                continue;
            }
            distances[index(next)] = Some(next_distance);
            queue.push_back(next);
        }
    }
    distances
}

pub(crate) fn has_walkable_route(level: &Level, start: Pos, goal: Pos) -> bool {
    if !level.in_bounds(goal) {
        return false;
    }
    let distances = walk_distances(level, start);
    distances[(goal.y as usize) * level.width + (goal.x as usize)].is_some()
}

/// Walkable-and-safe structural cells that `start` cannot reach.
pub(crate) fn unreachable_cells(level: &Level, start: Pos) -> Vec<Pos> {
    let distances = walk_distances(level, start);
    level
        .positions()
        .filter(|&pos| {
            level.is_walkable_and_safe(pos)
                && !matches!(level.category_at(pos), Category::Void | Category::MapBorder)
                && distances[(pos.y as usize) * level.width + (pos.x as usize)].is_none()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TileKind;

    fn carved(width: usize, height: usize, floor: &[Pos]) -> Level {
        let mut level = Level::new(width, height, 1, "test", TileKind::Wall);
        for &pos in floor {
            level.stamp(pos, TileKind::Floor, Category::RoomInner);
        }
        level
    }

    #[test]
    fn diagonal_steps_connect_cells() {
        let a = Pos { y: 1, x: 1 };
        let b = Pos { y: 2, x: 2 };
        let level = carved(5, 5, &[a, b]);
        assert!(has_walkable_route(&level, a, b));
        assert!(unreachable_cells(&level, a).is_empty());
    }

    #[test]
    fn unsafe_tiles_break_routes() {
        let cells = [Pos { y: 2, x: 1 }, Pos { y: 2, x: 2 }, Pos { y: 2, x: 3 }];
        let mut level = carved(5, 5, &cells);
        level.set_tile(Pos { y: 2, x: 2 }, TileKind::Trap);
        assert!(!has_walkable_route(&level, cells[0], cells[2]));
        assert_eq!(unreachable_cells(&level, cells[0]), vec![cells[2]]);
    }

    #[test]
    fn neighbors8_has_no_duplicates() {
        let mut around = neighbors8(Pos { y: 5, x: 5 }).to_vec();
        around.sort();
        around.dedup();
        assert_eq!(around.len(), 8);
        assert!(!around.contains(&Pos { y: 5, x: 5 }));
    }
}
