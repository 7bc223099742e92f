use tracing::debug;

use crate::catalog::{ChestParams, LootTable};
use crate::level::EntityKind;
use crate::rng::GenRng;

use super::DecorationContext;

/// Item templates for one chest. No loot table means an empty chest.
pub fn roll_loot(rng: &mut GenRng, loot: Option<&LootTable>) -> Vec<String> {
    let Some(loot) = loot else {
        return Vec::new();
    };
    let rolls = loot.rolls.sample(rng);
    (0..rolls).filter_map(|_| loot.items.sample(rng).cloned()).collect()
}

/// One archetype is picked per room; every chest in the room shares it.
pub(super) fn place_chests(context: &mut DecorationContext<'_>, params: &ChestParams) -> usize {
    let Some(archetype) = params.archetypes.sample(context.rng).cloned() else {
        return 0;
    };
    let count = params.count.sample(context.rng) as usize;
    let mut free = context.free_inner_cells();
    context.rng.shuffle(&mut free);

    let mut placed = 0;
    for pos in free.into_iter().take(count) {
        let contents = roll_loot(context.rng, params.loot.as_ref());
        let chest = EntityKind::Chest { archetype: archetype.clone(), contents };
        if context.level.spawn(pos, chest).is_some() {
            placed += 1;
        }
    }
    debug!(archetype = %archetype, placed, "chests placed");
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BiomeTiles, IntRange, WeightTable};
    use crate::mapgen::decorate::test_support::chamber_fixture;
    use crate::mapgen::population::DifficultyRoller;
    use crate::types::TileKind;

    fn table(names: &[&str]) -> WeightTable<String> {
        names.iter().map(|name| (name.to_string(), 1)).collect()
    }

    #[test]
    fn chests_in_one_room_share_an_archetype() {
        let params = ChestParams {
            count: IntRange::new(3, 3),
            archetypes: table(&["oak", "iron", "gilded"]),
            loot: Some(LootTable { rolls: IntRange::new(1, 2), items: table(&["potion", "scroll"]) }),
        };
        for seed in 0..10 {
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
            assert_eq!(place_chests(&mut context, &params), 3);

            let chests: Vec<(&String, &Vec<String>)> = level
                .entities()
                .filter_map(|(_, entity)| match &entity.kind {
                    EntityKind::Chest { archetype, contents } => Some((archetype, contents)),
                    _ => None,
                })
                .collect();
            assert_eq!(chests.len(), 3);
            assert!(chests.iter().all(|(archetype, _)| *archetype == chests[0].0), "seed {seed}");
            assert!(chests.iter().all(|(_, contents)| (1..=2).contains(&contents.len())));
        }
    }

    #[test]
    fn missing_loot_table_gives_empty_chests() {
        let mut rng = GenRng::from_seed(1);
        assert!(roll_loot(&mut rng, None).is_empty());
    }
}
