//! Stairs stage: an ascend stair always, a descend stair when the biome asks
//! for one, connected by a safe walkable route.

use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::level::Level;
use crate::rng::GenRng;
use crate::types::{Category, Pos, TileKind};

use super::grid::{has_walkable_route, walk_distances};
use super::room::Room;
use super::session::GenerationSession;

fn stair_cells(level: &Level, room: &Room) -> Vec<Pos> {
    room.inner_cells()
        .into_iter()
        .filter(|&pos| {
            level.category_at(pos) == Category::RoomInner
                && level.is_walkable_and_safe(pos)
                && !level.is_occupied(pos)
                && !level.is_protected(pos)
        })
        .collect()
}

fn sample_cell(rng: &mut GenRng, pools: &[Vec<Pos>]) -> Option<Pos> {
    let pool = rng.choose(pools)?;
    rng.choose(pool).copied()
}

fn commit(level: &mut Level, pos: Pos, tile: TileKind, category: Category) {
    level.stamp(pos, tile, category);
    level.set_protected(pos, true);
}

pub(super) fn place_stairs(session: &mut GenerationSession<'_>) -> Result<(), GenerationError> {
    let want_descend = session.biome.generate_descending_stair;
    let mut pools: Vec<Vec<Pos>> = Vec::new();
    for (room_index, room) in session.rooms.iter().enumerate() {
        if !session.terrain_of(room_index).allow_stairs {
            continue;
        }
        let cells = stair_cells(&session.level, room);
        if !cells.is_empty() {
            pools.push(cells);
        }
    }
    if pools.is_empty() {
        debug!("no stair-friendly room; considering every room");
        pools = session
            .rooms
            .iter()
            .map(|room| stair_cells(&session.level, room))
            .filter(|cells| !cells.is_empty())
            .collect();
    }
    if pools.is_empty() {
        return Err(GenerationError::StairsUnreachable);
    }

    let attempts = session.limits().stair_attempts;
    let rng = &mut session.rng;
    let level = &mut session.level;
    let mut last_ascend = None;
    for attempt in 0..attempts {
        let Some(ascend) = sample_cell(rng, &pools) else {
            break;
        };
        last_ascend = Some(ascend);
        if !want_descend {
            commit(level, ascend, TileKind::AscendStair, Category::AscendStair);
            level.ascend = Some(ascend);
            return Ok(());
        }
        let Some(descend) = sample_cell(rng, &pools) else {
            break;
        };
        if descend == ascend || !has_walkable_route(level, ascend, descend) {
            debug!(attempt, ?ascend, ?descend, "stair pair rejected");
            continue;
        }
        commit(level, ascend, TileKind::AscendStair, Category::AscendStair);
        commit(level, descend, TileKind::DescendStair, Category::DescendStair);
        level.ascend = Some(ascend);
        level.descend = Some(descend);
        return Ok(());
    }

    let ascend = last_ascend.ok_or(GenerationError::StairsUnreachable)?;
    let distances = walk_distances(level, ascend);
    let descend = pools
        .iter()
        .flatten()
        .copied()
        .filter(|&pos| pos != ascend)
        .filter_map(|pos| {
            distances[(pos.y as usize) * level.width + (pos.x as usize)].map(|distance| (pos, distance))
        })
        .max_by(|(a, da), (b, db)| da.cmp(db).then_with(|| b.cmp(a)))
        .map(|(pos, _)| pos)
        .ok_or(GenerationError::StairsUnreachable)?;
    warn!(?ascend, ?descend, "stair sampling exhausted; using farthest reachable cell");
    commit(level, ascend, TileKind::AscendStair, Category::AscendStair);
    commit(level, descend, TileKind::DescendStair, Category::DescendStair);
    level.ascend = Some(ascend);
    level.descend = Some(descend);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::mapgen::placement::{place_rooms, stamp_earth};
    use crate::mapgen::tunnels::{StepCosts, adjust_convexes, link_rooms};

    fn prepared(catalog: &Catalog, seed: u64) -> GenerationSession<'_> {
        let biome = catalog.biome("dungeon").expect("dungeon biome");
        let mut session = GenerationSession::new(catalog, biome, 1, seed);
        stamp_earth(&mut session.level);
        place_rooms(&mut session);
        let tile = session.biome.tiles.tunnel;
        link_rooms(&mut session.level, &session.rooms, tile, StepCosts::default());
        adjust_convexes(&mut session, StepCosts::default());
        session
    }

    #[test]
    fn stairs_are_connected_and_protected() {
        let catalog = Catalog::builtin().expect("builtin catalog");
        for seed in 0..10 {
            let mut session = prepared(&catalog, seed);
            assert_eq!(place_stairs(&mut session), Ok(()), "seed {seed}");
            let level = &session.level;
            let ascend = level.ascend.expect("ascend placed");
            let descend = level.descend.expect("dungeon wants a descend stair");
            assert_ne!(ascend, descend);
            assert!(has_walkable_route(level, ascend, descend), "seed {seed}");
            assert!(level.is_protected(ascend) && level.is_protected(descend));
            assert_eq!(level.category_at(ascend), Category::AscendStair);
            assert_eq!(level.tile_at(descend), TileKind::DescendStair);
        }
    }

    #[test]
    fn no_rooms_means_no_stairs() {
        let catalog = Catalog::builtin().expect("builtin catalog");
        let biome = catalog.biome("dungeon").expect("dungeon biome");
        let mut session = GenerationSession::new(&catalog, biome, 1, 0);
        stamp_earth(&mut session.level);
        assert_eq!(place_stairs(&mut session), Err(GenerationError::StairsUnreachable));
    }
}
