use std::collections::VecDeque;

use levelgen::{Catalog, Category, EntityKind, Level, Pos, generate_level};
use proptest::prelude::*;

fn neighbors8(pos: Pos) -> impl Iterator<Item = Pos> {
    (-1..=1)
        .flat_map(move |dy| (-1..=1).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| dx != 0 || dy != 0)
        .map(move |(dx, dy)| pos.offset(dx, dy))
}

fn reachable_from(level: &Level, start: Pos) -> Vec<bool> {
    let mut seen = vec![false; level.width * level.height];
    let index = |pos: Pos| (pos.y as usize) * level.width + pos.x as usize;
    let mut queue = VecDeque::from([start]);
    seen[index(start)] = true;
    while let Some(current) = queue.pop_front() {
        for next in neighbors8(current) {
            if level.in_bounds(next) && level.is_walkable_and_safe(next) && !seen[index(next)] {
                seen[index(next)] = true;
                queue.push_back(next);
            }
        }
    }
    seen
}

fn check_level(level: &Level) -> Result<(), String> {
    for pos in level.positions() {
        let on_edge = pos.x == 0
            || pos.y == 0
            || pos.x as usize == level.width - 1
            || pos.y as usize == level.height - 1;
        if on_edge && level.category_at(pos) != Category::MapBorder {
            return Err(format!("border cell {pos:?} is {:?}", level.category_at(pos)));
        }
    }

    let ascend = level.ascend.ok_or("no ascend stair")?;
    if level.category_at(ascend) != Category::AscendStair || !level.is_protected(ascend) {
        return Err(format!("ascend stair at {ascend:?} is not a protected stair cell"));
    }
    if level.count_category(Category::AscendStair) != 1 {
        return Err("exactly one ascend stair expected".to_string());
    }

    let reachable = reachable_from(level, ascend);
    for pos in level.positions() {
        let structural = !matches!(level.category_at(pos), Category::Void | Category::MapBorder);
        let index = (pos.y as usize) * level.width + pos.x as usize;
        if structural && level.is_walkable_and_safe(pos) && !reachable[index] {
            return Err(format!("{pos:?} ({:?}) unreachable from the ascend stair", level.category_at(pos)));
        }
    }
    if let Some(descend) = level.descend {
        let index = (descend.y as usize) * level.width + descend.x as usize;
        if !reachable[index] {
            return Err("descend stair unreachable".to_string());
        }
    }

    for pos in level.positions().filter(|&p| level.category_at(p) == Category::Door) {
        if let Some(other) = neighbors8(pos).find(|&n| level.category_at(n) == Category::Door) {
            return Err(format!("doors at {pos:?} and {other:?} touch"));
        }
    }

    let mut monsters = 0;
    for (id, entity) in level.entities() {
        if level.entity_at(entity.pos) != Some(id) {
            return Err(format!("occupancy out of sync at {:?}", entity.pos));
        }
        match entity.kind {
            EntityKind::Door { .. } if level.category_at(entity.pos) != Category::Door => {
                return Err(format!("door entity off a door cell at {:?}", entity.pos));
            }
            EntityKind::Monster { difficulty, .. } => {
                monsters += 1;
                if difficulty == 0 {
                    return Err("monster with difficulty 0".to_string());
                }
            }
            _ => {}
        }
        if level.category_at(entity.pos).is_stair() {
            return Err(format!("entity standing on a stair at {:?}", entity.pos));
        }
    }
    if monsters != level.starting_monster_count {
        return Err(format!("{monsters} monsters but starting count {}", level.starting_monster_count));
    }

    for room in &level.rooms {
        if room.doors.len() != room.convexes.len() {
            return Err("room with a door missing its convex".to_string());
        }
        for convex in &room.convexes {
            if level.category_at(*convex) != Category::DoorConvex || !level.is_walkable_and_safe(*convex) {
                return Err(format!("convex {convex:?} lost its corridor cell"));
            }
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 24, ..ProptestConfig::default() })]

    #[test]
    fn generated_levels_hold_structural_invariants(
        seed in any::<u64>(),
        biome in prop::sample::select(vec!["dungeon", "caves", "lair"]),
        depth in 1_u32..12,
    ) {
        let catalog = Catalog::builtin().expect("builtin catalog");
        let level = generate_level(&catalog, seed, biome, depth)
            .map_err(|error| TestCaseError::fail(format!("{biome}/{depth}/{seed}: {error}")))?;
        prop_assert_eq!(level.biome.as_str(), biome);
        check_level(&level).map_err(|reason| TestCaseError::fail(format!("{biome}/{depth}/{seed}: {reason}")))?;
    }
}

#[test]
fn lair_has_no_descend_stair() {
    let catalog = Catalog::builtin().expect("builtin catalog");
    let level = generate_level(&catalog, 8, "lair", 3).expect("lair generates");
    assert!(level.descend.is_none());
    assert_eq!(level.count_category(Category::DescendStair), 0);
    check_level(&level).expect("lair invariants");
}
