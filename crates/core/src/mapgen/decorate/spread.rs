//! Core-and-feature spreading shared by grass, water, pits and holes.

use std::collections::BTreeSet;

use tracing::debug;

use crate::catalog::SpreadParams;
use crate::mapgen::grid::{diagonals, neighbors4, neighbors8};
use crate::types::{Category, Pos, TileKind};

use super::DecorationContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpreadKind {
    Grass,
    Water,
    Pit,
    Hole,
}

impl SpreadKind {
    fn feature(self) -> Category {
        match self {
            SpreadKind::Grass => Category::Grass,
            SpreadKind::Water => Category::Water,
            SpreadKind::Pit => Category::Pit,
            SpreadKind::Hole => Category::Hole,
        }
    }

    fn core(self) -> Category {
        match self {
            SpreadKind::Grass => Category::GrassCore,
            SpreadKind::Water => Category::WaterCore,
            SpreadKind::Pit => Category::PitCore,
            SpreadKind::Hole => Category::Hole,
        }
    }

    fn tile(self) -> TileKind {
        match self {
            SpreadKind::Grass => TileKind::Grass,
            SpreadKind::Water => TileKind::Water,
            SpreadKind::Pit => TileKind::Pit,
            SpreadKind::Hole => TileKind::Hole,
        }
    }

    /// Tile for cells fully surrounded by the same feature.
    fn deep_tile(self) -> Option<TileKind> {
        match self {
            SpreadKind::Water => Some(TileKind::DeepWater),
            SpreadKind::Pit => Some(TileKind::Chasm),
            SpreadKind::Grass | SpreadKind::Hole => None,
        }
    }

    fn may_cross_walls(self) -> bool {
        matches!(self, SpreadKind::Water | SpreadKind::Pit)
    }
}

/// Cells claimed by one spread pass and the seed cores they grew from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpreadOutcome {
    pub seeds: Vec<Pos>,
    pub cells: BTreeSet<Pos>,
}

fn is_eligible(context: &DecorationContext<'_>, kind: SpreadKind, no_border: bool, pos: Pos) -> bool {
    let level = &*context.level;
    if !level.in_bounds(pos) || level.is_occupied(pos) {
        return false;
    }
    if no_border && kind.may_cross_walls() {
        let category = level.category_at(pos);
        let structural =
            category == Category::MapBorder || category.is_door_like() || category.is_stair();
        return !structural && (!level.is_protected(pos) || context.room.owns(pos));
    }
    context.room.is_inner(pos) && level.category_at(pos) == Category::RoomInner
}

pub(super) fn spread(
    context: &mut DecorationContext<'_>,
    kind: SpreadKind,
    params: &SpreadParams,
) -> SpreadOutcome {
    let mut outcome = SpreadOutcome::default();
    let inner = context.room.inner_cells();
    let mut cores: Vec<Pos> = Vec::new();

    let seed_count = params.cores.sample(context.rng);
    for _ in 0..seed_count {
        let Some(&seed) = context.rng.choose(&inner) else {
            break;
        };
        if outcome.cells.contains(&seed) || !is_eligible(context, kind, false, seed) {
            continue;
        }
        outcome.cells.insert(seed);
        outcome.seeds.push(seed);
        cores.push(seed);
        context.level.set_category(seed, kind.core());
    }

    let rounds = params.scale.sample(context.rng);
    for _ in 0..rounds {
        let frontier = cores.clone();
        for core in frontier {
            for next in diagonals(core) {
                if context.rng.chance(params.density)
                    && !outcome.cells.contains(&next)
                    && is_eligible(context, kind, params.no_border, next)
                {
                    outcome.cells.insert(next);
                    context.level.set_category(next, kind.feature());
                }
            }
            for next in neighbors4(core) {
                if context.rng.chance(params.density)
                    && !outcome.cells.contains(&next)
                    && is_eligible(context, kind, params.no_border, next)
                {
                    outcome.cells.insert(next);
                    cores.push(next);
                    context.level.set_category(next, kind.core());
                }
            }
        }
    }

    for &pos in &outcome.cells {
        context.level.stamp(pos, kind.tile(), kind.feature());
    }
    if let Some(deep) = kind.deep_tile() {
        let interior: Vec<Pos> = outcome
            .cells
            .iter()
            .copied()
            .filter(|&pos| neighbors8(pos).iter().all(|around| outcome.cells.contains(around)))
            .collect();
        for pos in interior {
            context.level.stamp(pos, deep, kind.core());
        }
    }
    debug!(?kind, seeds = outcome.seeds.len(), cells = outcome.cells.len(), "spread pass");
    outcome
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::catalog::{BiomeTiles, IntRange};
    use crate::level::Level;
    use crate::mapgen::decorate::test_support::chamber_fixture;
    use crate::mapgen::population::DifficultyRoller;
    use crate::mapgen::room::Room;

    fn params(no_border: bool) -> SpreadParams {
        SpreadParams {
            cores: IntRange::new(1, 3),
            scale: IntRange::new(2, 4),
            density: 0.6,
            no_border,
        }
    }

    fn run(seed: u64, kind: SpreadKind, no_border: bool) -> (SpreadOutcome, Level, Room) {
        let (catalog, mut level, room, mut rng) = chamber_fixture(seed);
        let mut context = DecorationContext {
            level: &mut level,
            room: &room,
            terrain: catalog.terrain(room.terrain),
            tiles: BiomeTiles { wall: TileKind::Wall, floor: TileKind::Floor, tunnel: TileKind::Corridor },
            bestiary: &catalog.bestiary,
            difficulty: DifficultyRoller { bestiary: &catalog.bestiary, depth: 3, clamp: None, attempts: 8 },
            rng: &mut rng,
        };
        let outcome = spread(&mut context, kind, &params(no_border));
        (outcome, level, room)
    }

    #[test]
    fn every_spread_cell_chains_back_to_a_seed() {
        for seed in 0..20 {
            let (outcome, _, _) = run(seed, SpreadKind::Grass, false);
            let mut reached: BTreeSet<Pos> = outcome.seeds.iter().copied().collect();
            let mut queue: VecDeque<Pos> = outcome.seeds.iter().copied().collect();
            while let Some(pos) = queue.pop_front() {
                for next in neighbors8(pos) {
                    if outcome.cells.contains(&next) && reached.insert(next) {
                        queue.push_back(next);
                    }
                }
            }
            assert_eq!(reached, outcome.cells, "seed {seed}: detached spread cells");
        }
    }

    #[test]
    fn grass_stays_inside_the_room_and_cores_are_demoted() {
        for seed in 0..20 {
            let (outcome, level, room) = run(seed, SpreadKind::Grass, false);
            assert!(!outcome.cells.is_empty(), "seed {seed}: no grass at all");
            for pos in &outcome.cells {
                assert!(room.is_inner(*pos), "seed {seed}: grass escaped to {pos:?}");
                assert_eq!(level.tile_at(*pos), TileKind::Grass);
                assert_eq!(level.category_at(*pos), Category::Grass);
            }
            assert_eq!(level.count_category(Category::GrassCore), 0);
        }
    }

    #[test]
    fn water_deepens_only_where_fully_surrounded() {
        for seed in 0..20 {
            let (outcome, level, room) = run(seed, SpreadKind::Water, true);
            for pos in &outcome.cells {
                let surrounded = neighbors8(*pos).iter().all(|around| outcome.cells.contains(around));
                let expected = if surrounded { TileKind::DeepWater } else { TileKind::Water };
                assert_eq!(level.tile_at(*pos), expected, "seed {seed} at {pos:?}");
            }
            for convex in room.convexes() {
                assert_eq!(level.category_at(convex), Category::DoorConvex, "seed {seed}");
            }
            assert_eq!(level.count_category(Category::MapBorder), 2 * 30 + 2 * 18);
        }
    }
}
