//! Corridor carving between rooms and repair of door convexes that no
//! corridor reached.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::level::{EntityKind, Level};
use crate::types::{Category, Pos, TileKind};

use super::grid::{diagonals, manhattan, neighbors4, neighbors8};
use super::room::Room;
use super::session::GenerationSession;

/// Step costs for corridor search. A very expensive diagonal keeps
/// corridors straight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepCosts {
    pub orthogonal: u32,
    pub diagonal: u32,
}

impl Default for StepCosts {
    fn default() -> Self {
        Self { orthogonal: 2, diagonal: 1000 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f: u32,
    h: u32,
    y: i32,
    x: i32,
}

/// Cheapest 8-connected path from `start` to `goal` over tunnel-allowed
/// cells, both endpoints included.
pub fn find_tunnel_path(level: &Level, start: Pos, goal: Pos, costs: StepCosts) -> Option<Vec<Pos>> {
    if !level.in_bounds(start) || !level.in_bounds(goal) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    let heuristic = |pos: Pos| manhattan(pos, goal) * costs.orthogonal;
    let mut open_set = BTreeSet::new();
    let mut g_score = BTreeMap::new();
    let mut came_from = BTreeMap::new();
    let h = heuristic(start);
    open_set.insert(OpenNode { f: h, h, y: start.y, x: start.x });
    g_score.insert(start, 0_u32);

    while let Some(current) = open_set.pop_first() {
        let pos = Pos { y: current.y, x: current.x };
        if pos == goal {
            return Some(reconstruct_path(&came_from, start, goal));
        }
        let Some(&current_g) = g_score.get(&pos) else {
            continue;
        };
        if current.f > current_g + current.h {
            continue;
        }

        let steps = neighbors4(pos)
            .map(|next| (next, costs.orthogonal))
            .into_iter()
            .chain(diagonals(pos).map(|next| (next, costs.diagonal)));
        for (next, step_cost) in steps {
            if next != goal && !level.is_tunnel_allowed(next) {
                continue;
            }
            let tentative = current_g + step_cost;
            if tentative < g_score.get(&next).copied().unwrap_or(u32::MAX) {
                came_from.insert(next, pos);
                g_score.insert(next, tentative);
                let h = heuristic(next);
                open_set.insert(OpenNode { f: tentative + h, h, y: next.y, x: next.x });
            }
        }
    }
    None
}

fn reconstruct_path(came_from: &BTreeMap<Pos, Pos>, start: Pos, goal: Pos) -> Vec<Pos> {
    let mut pos = goal;
    let mut path = vec![pos];
    while pos != start {
        let Some(&previous) = came_from.get(&pos) else {
            break;
        };
        pos = previous;
        path.push(pos);
    }
    path.reverse();
    path
}

/// Greedy chain: start at point 0 and always hop to the nearest unvisited
/// point, lower index on ties.
pub fn nearest_neighbor_chain(points: &[Pos]) -> Vec<usize> {
    if points.is_empty() {
        return Vec::new();
    }
    let mut visited = vec![false; points.len()];
    let mut order = Vec::with_capacity(points.len());
    let mut current = 0;
    visited[0] = true;
    order.push(0);
    while order.len() < points.len() {
        let next = (0..points.len())
            .filter(|&index| !visited[index])
            .min_by_key(|&index| (points[current].distance_squared(points[index]), index));
        let Some(next) = next else {
            break;
        };
        visited[next] = true;
        order.push(next);
        current = next;
    }
    order
}

/// Turns every VOID cell of `path` into corridor. Returns the number carved.
pub fn carve_path(level: &mut Level, path: &[Pos], tile: TileKind) -> usize {
    let mut carved = 0;
    for &pos in path {
        if level.category_at(pos) == Category::Void && !level.is_protected(pos) {
            level.stamp(pos, tile, Category::Tunnel);
            carved += 1;
        }
    }
    carved
}

pub(super) fn link_rooms(level: &mut Level, rooms: &[Room], tile: TileKind, costs: StepCosts) {
    let anchors: Vec<Pos> = rooms.iter().map(Room::anchor).collect();
    let order = nearest_neighbor_chain(&anchors);
    for pair in order.windows(2) {
        let (from, to) = (anchors[pair[0]], anchors[pair[1]]);
        match find_tunnel_path(level, from, to, costs) {
            Some(path) => {
                let carved = carve_path(level, &path, tile);
                debug!(from = pair[0], to = pair[1], carved, "rooms linked");
            }
            None => debug!(from = pair[0], to = pair[1], "no corridor route between rooms"),
        }
    }
}

/// A convex whose surroundings are still untouched rock or wall.
pub(super) fn is_orphan_convex(level: &Level, convex: Pos) -> bool {
    neighbors8(convex)
        .into_iter()
        .filter(|&around| matches!(level.category_at(around), Category::Void | Category::RoomWall))
        .count()
        >= 7
}

pub(super) fn adjust_convexes(session: &mut GenerationSession<'_>, costs: StepCosts) {
    let convexes: Vec<Pos> = session.rooms.iter().flat_map(Room::convexes).collect();
    repair_convexes(session, &convexes, costs);
}

/// Links orphaned convexes pairwise, then puts a chest or monster on any
/// convex that still has no corridor next to it.
fn repair_convexes(session: &mut GenerationSession<'_>, convexes: &[Pos], costs: StepCosts) {
    let tile = session.biome.tiles.tunnel;
    let orphans: Vec<Pos> =
        convexes.iter().copied().filter(|&convex| is_orphan_convex(&session.level, convex)).collect();
    if orphans.is_empty() {
        return;
    }

    let order = nearest_neighbor_chain(&orphans);
    for pair in order.windows(2) {
        let (from, to) = (orphans[pair[0]], orphans[pair[1]]);
        if let Some(path) = find_tunnel_path(&session.level, from, to, costs) {
            carve_path(&mut session.level, &path, tile);
        }
    }

    let catalog = session.catalog;
    let roller = session.difficulty();
    let chests = catalog.bestiary.chests();
    for convex in orphans {
        if !is_orphan_convex(&session.level, convex) || session.level.is_occupied(convex) {
            continue;
        }
        let rng = &mut session.rng;
        let feature = if !chests.is_empty() && rng.chance(0.5) {
            chests.sample(rng).map(|archetype| EntityKind::Chest {
                archetype: archetype.clone(),
                contents: Vec::new(),
            })
        } else {
            roller.pick_monster(rng, 0).map(|(template, difficulty)| EntityKind::Monster {
                template,
                difficulty,
            })
        };
        match feature {
            Some(kind) => {
                debug!(?convex, "orphan convex gets a feature instead of a corridor");
                session.level.spawn(convex, kind);
            }
            None => debug!(?convex, "orphan convex left bare; no feature template available"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::mapgen::placement::stamp_earth;

    fn stamp_box(level: &mut Level, left: i32, top: i32, size: i32) {
        for y in top..top + size {
            for x in left..left + size {
                let pos = Pos { y, x };
                let edge = y == top || x == left || y == top + size - 1 || x == left + size - 1;
                if edge {
                    level.stamp(pos, TileKind::Wall, Category::RoomWall);
                    level.set_tunnel_allowed(pos, false);
                } else {
                    level.stamp(pos, TileKind::Floor, Category::RoomInner);
                }
            }
        }
    }

    fn stamp_door(level: &mut Level, door: Pos, convex: Pos) {
        level.stamp(door, TileKind::Door, Category::Door);
        level.set_tunnel_allowed(door, true);
        level.stamp(convex, TileKind::Corridor, Category::DoorConvex);
    }

    #[test]
    fn facing_doors_get_a_straight_corridor() {
        let mut level = Level::new(60, 20, 1, "test", TileKind::Wall);
        stamp_earth(&mut level);
        stamp_box(&mut level, 7, 7, 7);
        stamp_box(&mut level, 37, 7, 7);
        stamp_door(&mut level, Pos { y: 10, x: 13 }, Pos { y: 10, x: 14 });
        stamp_door(&mut level, Pos { y: 10, x: 37 }, Pos { y: 10, x: 36 });

        let path = find_tunnel_path(
            &level,
            Pos { y: 10, x: 10 },
            Pos { y: 10, x: 40 },
            StepCosts::default(),
        )
        .expect("rooms with facing doors must link");
        assert!(
            path.windows(2).all(|step| step[1].x >= step[0].x),
            "corridor x must never decrease: {path:?}"
        );

        let carved = carve_path(&mut level, &path, TileKind::Corridor);
        assert_eq!(carved, 36 - 14 - 1);
        for pos in level.positions().filter(|&p| level.category_at(p) == Category::Tunnel) {
            assert_eq!(pos.y, 10, "corridor left the door row at {pos:?}");
        }
    }

    #[test]
    fn walls_block_corridors() {
        let mut level = Level::new(30, 15, 1, "test", TileKind::Wall);
        stamp_earth(&mut level);
        stamp_box(&mut level, 5, 4, 6);
        let inside = Pos { y: 6, x: 7 };
        assert!(find_tunnel_path(&level, inside, Pos { y: 7, x: 20 }, StepCosts::default()).is_none());
    }

    #[test]
    fn chain_visits_nearest_point_first() {
        let points = [
            Pos { y: 0, x: 0 },
            Pos { y: 0, x: 10 },
            Pos { y: 0, x: 2 },
            Pos { y: 0, x: 5 },
        ];
        assert_eq!(nearest_neighbor_chain(&points), vec![0, 2, 3, 1]);
        assert!(nearest_neighbor_chain(&[]).is_empty());
    }

    #[test]
    fn convex_with_corridor_next_to_it_is_not_orphaned() {
        let mut level = Level::new(20, 12, 1, "test", TileKind::Wall);
        stamp_earth(&mut level);
        stamp_box(&mut level, 3, 3, 5);
        let door = Pos { y: 5, x: 7 };
        let convex = Pos { y: 5, x: 8 };
        stamp_door(&mut level, door, convex);
        assert!(is_orphan_convex(&level, convex));

        level.stamp(Pos { y: 5, x: 9 }, TileKind::Corridor, Category::Tunnel);
        assert!(!is_orphan_convex(&level, convex));
    }

    #[test]
    fn orphaned_convexes_are_linked_or_given_a_feature() {
        let catalog = Catalog::builtin().expect("builtin catalog");
        let biome = catalog.biome("dungeon").expect("dungeon biome");
        let mut session = GenerationSession::new(&catalog, biome, 1, 17);
        let level = &mut session.level;
        stamp_earth(level);
        stamp_box(level, 3, 3, 5);
        stamp_box(level, 20, 3, 5);
        let west = Pos { y: 5, x: 8 };
        let east = Pos { y: 5, x: 19 };
        stamp_door(level, Pos { y: 5, x: 7 }, west);
        stamp_door(level, Pos { y: 5, x: 20 }, east);

        let sealed = Pos { y: 14, x: 30 };
        for around in neighbors8(sealed) {
            level.stamp(around, TileKind::Wall, Category::RoomWall);
            level.set_tunnel_allowed(around, false);
        }
        level.stamp(sealed, TileKind::Corridor, Category::DoorConvex);
        for convex in [west, east, sealed] {
            assert!(is_orphan_convex(level, convex), "{convex:?} starts orphaned");
        }

        repair_convexes(&mut session, &[west, east, sealed], StepCosts::default());

        let level = &session.level;
        for x in 9..19 {
            assert_eq!(level.category_at(Pos { y: 5, x }), Category::Tunnel, "gap at x={x}");
        }
        assert!(!is_orphan_convex(level, west) && !is_orphan_convex(level, east));
        assert!(!level.is_occupied(west) && !level.is_occupied(east));

        assert!(is_orphan_convex(level, sealed), "nothing can tunnel to a walled-in convex");
        let feature = level
            .entity_at(sealed)
            .and_then(|id| level.entity(id))
            .expect("sealed convex gets a feature");
        assert!(
            matches!(feature.kind, EntityKind::Chest { .. } | EntityKind::Monster { .. }),
            "unexpected feature {:?}",
            feature.kind
        );
    }
}
