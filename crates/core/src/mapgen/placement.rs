//! Earth and room stages: the border, then rejection-sampled rooms with doors.

use tracing::debug;

use crate::catalog::{BiomeTiles, Terrain};
use crate::level::{EntityKind, Level};
use crate::types::{Category, Pos, TileKind};

use super::room::{Room, RoomRequest};
use super::session::GenerationSession;

/// Rooms keep at least this many cells between their footprint and the map edge.
const BORDER_MARGIN: usize = 3;

pub(super) fn stamp_earth(level: &mut Level) {
    let positions: Vec<Pos> = level.positions().collect();
    for pos in positions {
        let on_edge = pos.x == 0
            || pos.y == 0
            || pos.x as usize == level.width - 1
            || pos.y as usize == level.height - 1;
        if on_edge {
            level.stamp(pos, TileKind::Bedrock, Category::MapBorder);
            level.set_tunnel_allowed(pos, false);
            level.set_protected(pos, true);
        }
    }
}

pub(super) fn place_rooms(session: &mut GenerationSession<'_>) {
    let catalog = session.catalog;
    let biome = session.biome;
    let table = biome.terrain_table(session.depth);
    let blob_limits = session.blob_limits();
    let GenerationSession { rng, level, rooms, .. } = session;

    for attempt in 0..biome.max_rooms {
        let Some(&terrain_id) = table.sample(rng) else {
            break;
        };
        let terrain = catalog.terrain(terrain_id);
        let width = terrain.width.sample(rng) as usize;
        let height = terrain.height.sample(rng) as usize;
        if width + 2 * BORDER_MARGIN > level.width || height + 2 * BORDER_MARGIN > level.height {
            debug!(attempt, terrain = %terrain.id, width, height, "room larger than the map; skipped");
            continue;
        }
        let origin = Pos {
            y: rng.range_usize(BORDER_MARGIN, level.height - BORDER_MARGIN - height) as i32,
            x: rng.range_usize(BORDER_MARGIN, level.width - BORDER_MARGIN - width) as i32,
        };
        let Some(&shape) = terrain.shapes.sample(rng) else {
            continue;
        };

        let request = RoomRequest {
            terrain_id,
            terrain,
            shape,
            origin,
            width,
            height,
            blob_limits,
        };
        let mut room = match Room::build(&request, rng) {
            Ok(room) => room,
            Err(error) => {
                debug!(attempt, terrain = %terrain.id, %error, "room shape failed; skipped");
                continue;
            }
        };
        room.drop_doors_into_protected(level);
        if terrain.has_doors() && room.door_count() == 0 {
            debug!(attempt, terrain = %terrain.id, "room has no usable door; skipped");
            continue;
        }
        if room.intersects(level) {
            debug!(attempt, terrain = %terrain.id, ?origin, "room overlaps existing cells; skipped");
            continue;
        }

        stamp_room(level, &room, terrain, biome.tiles);
        rooms.push(room);
    }
    debug!(placed = rooms.len(), max_rooms = biome.max_rooms, "room stage finished");
}

pub(super) fn stamp_room(level: &mut Level, room: &Room, terrain: &Terrain, tiles: BiomeTiles) {
    let floor = terrain.floor.unwrap_or(tiles.floor);
    for pos in room.wall_cells() {
        level.stamp(pos, tiles.wall, Category::RoomWall);
        level.set_tunnel_allowed(pos, false);
        level.set_protected(pos, room.protected);
    }
    for pos in room.inner_cells() {
        level.stamp(pos, floor, Category::RoomInner);
        level.set_tunnel_allowed(pos, true);
        level.set_protected(pos, room.protected);
    }

    for (direction, door) in room.doors() {
        let Some(convex) = room.convex(direction) else {
            continue;
        };
        level.stamp(door, TileKind::Door, Category::Door);
        level.set_tunnel_allowed(door, true);
        level.set_protected(door, room.protected);
        level.stamp(convex, tiles.tunnel, Category::DoorConvex);
        level.set_tunnel_allowed(convex, true);
        level.set_protected(convex, room.protected);
        if level.spawn(door, EntityKind::Door { open: false }).is_none() {
            debug!(?door, "door cell already occupied; no door entity");
        }
    }
}
