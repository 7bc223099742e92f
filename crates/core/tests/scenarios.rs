use levelgen::mapgen::{DecorationContext, TerrainHook};
use levelgen::{Catalog, Category, EntityKind, GenRng, GenerationError, LevelGenerator, generate_level};

const SINGLE_ROOM: &str = r#"
    [[terrain]]
    id = "cell"
    width = [8, 12]
    height = [6, 9]
    shapes = { rectangular = 1 }
    has_door = false
    monsters = { count = [2, 4] }

    [[biome]]
    id = "oubliette"
    width = 30
    height = 20
    max_rooms = 1
    terrains = { cell = 1 }
    descending_stair = false
    respawn = { ratio = 0.5, interval = 10 }

    [[monster]]
    id = "rat"
    difficulty = 1

    [[monster]]
    id = "ghoul"
    difficulty = 3
"#;

#[test]
fn doorless_single_room_biome() {
    let catalog = Catalog::from_toml_str(SINGLE_ROOM).expect("catalog parses");
    for seed in 0..8 {
        let level = generate_level(&catalog, seed, "oubliette", 1).expect("single room generates");
        assert_eq!(level.rooms.len(), 1, "seed {seed}");
        assert_eq!(level.count_category(Category::Door), 0);
        assert_eq!(level.count_category(Category::DoorConvex), 0);
        assert_eq!(level.count_category(Category::AscendStair), 1);
        assert_eq!(level.count_category(Category::DescendStair), 0);
        assert!(level.descend.is_none());
        assert_eq!(level.count_category(Category::Tunnel), 0, "one room needs no corridor");
    }
}

#[test]
fn respawn_refills_only_below_the_threshold() {
    let catalog = Catalog::from_toml_str(SINGLE_ROOM).expect("catalog parses");
    let generator = LevelGenerator::new(catalog, 12);
    let mut level = generator.generate("oubliette", 1).expect("level generates");
    let starting = level.starting_monster_count;
    assert!(starting >= 2);
    let mut rng = GenRng::from_seed(3);

    assert_eq!(generator.respawn(&mut level, "oubliette", 100, &mut rng), Ok(0), "nobody died yet");

    let monsters: Vec<_> = level
        .entities()
        .filter(|(_, entity)| entity.kind.is_monster())
        .map(|(id, _)| id)
        .collect();
    for id in &monsters {
        level.despawn(*id);
    }
    assert_eq!(generator.respawn(&mut level, "oubliette", 5, &mut rng), Ok(0), "interval not reached");

    let threshold = (0.5 * starting as f64).ceil() as usize;
    let spawned = generator.respawn(&mut level, "oubliette", 10, &mut rng).expect("known biome");
    assert_eq!(spawned, threshold);
    assert_eq!(level.monster_count(), threshold);

    level.visible.iter_mut().for_each(|cell| *cell = true);
    for id in level.entities().filter(|(_, e)| e.kind.is_monster()).map(|(id, _)| id).collect::<Vec<_>>() {
        level.despawn(id);
    }
    assert_eq!(
        generator.respawn(&mut level, "oubliette", 10, &mut rng),
        Ok(0),
        "cells in view are never used"
    );

    assert_eq!(
        generator.respawn(&mut level, "elsewhere", 10, &mut rng),
        Err(GenerationError::UnknownBiome("elsewhere".to_string()))
    );
}

struct Beacon;

impl TerrainHook for Beacon {
    fn decorate(&self, context: &mut DecorationContext<'_>) {
        let anchor = context.room.anchor();
        context.level.spawn(anchor, EntityKind::Plant { template: "beacon".to_string() });
    }
}

#[test]
fn registered_hook_replaces_standard_decorations() {
    let text = SINGLE_ROOM.replace("has_door = false", "has_door = false\n    hook = \"beacon\"");
    let catalog = Catalog::from_toml_str(&text).expect("catalog parses");
    let generator = LevelGenerator::new(catalog, 5).with_hook("beacon", Beacon);
    let level = generator.generate("oubliette", 1).expect("level generates");
    let beacons = level
        .entities()
        .filter(|(_, entity)| matches!(&entity.kind, EntityKind::Plant { template } if template == "beacon"))
        .count();
    assert_eq!(beacons, 1);
}

#[test]
fn unknown_hook_falls_back_to_standard_decorations() {
    let text = SINGLE_ROOM.replace("has_door = false", "has_door = false\n    hook = \"missing\"");
    let catalog = Catalog::from_toml_str(&text).expect("catalog parses");
    assert!(generate_level(&catalog, 5, "oubliette", 1).is_ok());
}
