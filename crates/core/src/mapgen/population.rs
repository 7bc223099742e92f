//! Monster and item population, plus the mid-game respawn re-entry.

use tracing::{debug, warn};

use crate::catalog::{Bestiary, Biome, Catalog, DepthClamp};
use crate::level::{EntityKind, Level, PlacedRoom};
use crate::rng::GenRng;
use crate::types::Pos;

use super::room::Room;
use super::session::GenerationSession;

const DIFFICULTY_STD_DEV: f64 = 1.5;

/// Allowed difficulty band `[max(1, avg - 3), avg + 3]` with `avg = depth + toughness + 1`.
pub fn difficulty_band(depth: u32, toughness: i32) -> (u32, u32) {
    let average = i64::from(depth) + i64::from(toughness) + 1;
    let low = (average - 3).max(1);
    let high = (average + 3).max(low);
    (low as u32, high as u32)
}

/// One normally distributed difficulty roll, clamped to the band and then
/// to the biome's depth clamp when one applies.
pub fn sample_difficulty(
    rng: &mut GenRng,
    depth: u32,
    toughness: i32,
    clamp: Option<DepthClamp>,
) -> u32 {
    let (low, high) = difficulty_band(depth, toughness);
    let average = i64::from(depth) + i64::from(toughness) + 1;
    let rolled = rng.normal(average as f64, DIFFICULTY_STD_DEV).round() as i64;
    let difficulty = rolled.clamp(i64::from(low), i64::from(high)) as u32;
    match clamp {
        Some(clamp) => difficulty.clamp(clamp.min, clamp.max),
        None => difficulty,
    }
}

/// Difficulty rolling bound to one bestiary and depth.
#[derive(Clone, Copy, Debug)]
pub struct DifficultyRoller<'a> {
    pub bestiary: &'a Bestiary,
    pub depth: u32,
    pub clamp: Option<DepthClamp>,
    pub attempts: u32,
}

impl DifficultyRoller<'_> {
    /// Template and difficulty of one monster. Rolls landing on an empty
    /// difficulty are re-rolled; when the budget runs out the nearest
    /// populated difficulty is used instead.
    pub fn pick_monster(&self, rng: &mut GenRng, toughness: i32) -> Option<(String, u32)> {
        let mut last = 1;
        for _ in 0..self.attempts {
            let difficulty = sample_difficulty(rng, self.depth, toughness, self.clamp);
            if let Some(table) = self.bestiary.monsters_at(difficulty) {
                return table.sample(rng).map(|template| (template.clone(), difficulty));
            }
            last = difficulty;
        }

        let (low, high) = difficulty_band(self.depth, toughness);
        let fallback = self
            .bestiary
            .nearest_populated(last, low, high)
            .or_else(|| self.bestiary.nearest_populated(last, 1, u32::MAX));
        let Some(difficulty) = fallback else {
            warn!(depth = self.depth, "bestiary has no monsters; nothing spawned");
            return None;
        };
        warn!(rolled = last, used = difficulty, "no monsters at rolled difficulty; using nearest band");
        let table = self.bestiary.monsters_at(difficulty)?;
        table.sample(rng).map(|template| (template.clone(), difficulty))
    }
}

fn spawn_cells(level: &Level, inner: &[Pos]) -> Vec<Pos> {
    inner
        .iter()
        .copied()
        .filter(|&pos| {
            level.is_walkable_and_safe(pos)
                && !level.is_occupied(pos)
                && !level.category_at(pos).is_stair()
        })
        .collect()
}

pub(super) fn populate(session: &mut GenerationSession<'_>) {
    let roller = session.difficulty();
    let items = session.catalog.bestiary.items();
    for room_index in 0..session.rooms.len() {
        let terrain = session.terrain_of(room_index);
        let room: &Room = &session.rooms[room_index];
        let mut cells = spawn_cells(&session.level, &room.inner_cells());
        session.rng.shuffle(&mut cells);
        let mut cells = cells.into_iter();

        if let Some(rule) = terrain.monsters {
            let count = rule.count.sample(&mut session.rng);
            for _ in 0..count {
                let Some(cell) = cells.next() else {
                    debug!(room_index, "room ran out of free cells for monsters");
                    break;
                };
                if let Some((template, difficulty)) =
                    roller.pick_monster(&mut session.rng, rule.toughness)
                {
                    session.level.spawn(cell, EntityKind::Monster { template, difficulty });
                }
            }
        }

        if let Some(range) = terrain.items {
            let count = range.sample(&mut session.rng);
            for _ in 0..count {
                let Some(cell) = cells.next() else {
                    break;
                };
                if let Some(template) = items.sample(&mut session.rng) {
                    session.level.spawn(cell, EntityKind::Item { template: template.clone() });
                }
            }
        }
    }
    session.level.starting_monster_count = session.level.monster_count();
}

/// Refills monsters once the live count drops below `ratio * starting count`
/// and at least `interval` turns passed. Only cells out of view are used.
/// Returns how many monsters were spawned.
pub fn respawn(
    level: &mut Level,
    catalog: &Catalog,
    biome: &Biome,
    turns_since_last: u32,
    rng: &mut GenRng,
) -> usize {
    let policy = biome.respawn;
    if turns_since_last < policy.interval || level.starting_monster_count == 0 {
        return 0;
    }
    let threshold = (policy.ratio * level.starting_monster_count as f64).ceil() as usize;
    let live = level.monster_count();
    if live >= threshold {
        return 0;
    }

    let mut candidates: Vec<(Pos, i32)> = Vec::new();
    for room in &level.rooms {
        let Some(rule) = catalog.terrains.get(room.terrain.0).and_then(|terrain| terrain.monsters)
        else {
            continue;
        };
        candidates.extend(
            respawn_cells(level, room).into_iter().map(|pos| (pos, rule.toughness)),
        );
    }
    rng.shuffle(&mut candidates);

    let roller = DifficultyRoller {
        bestiary: &catalog.bestiary,
        depth: level.depth,
        clamp: biome.difficulty_clamp_at(level.depth),
        attempts: catalog.limits.difficulty_attempts,
    };
    let mut spawned = 0;
    for (pos, toughness) in candidates {
        if live + spawned >= threshold {
            break;
        }
        if let Some((template, difficulty)) = roller.pick_monster(rng, toughness)
            && level.spawn(pos, EntityKind::Monster { template, difficulty }).is_some()
        {
            spawned += 1;
        }
    }
    debug!(live, threshold, spawned, "respawn pass");
    spawned
}

fn respawn_cells(level: &Level, room: &PlacedRoom) -> Vec<Pos> {
    spawn_cells(level, &room.inner).into_iter().filter(|&pos| !level.is_visible(pos)).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn difficulty_draws_stay_in_band_and_peak_at_the_average() {
        let mut rng = GenRng::from_seed(2024);
        let (low, high) = difficulty_band(5, 0);
        assert_eq!((low, high), (3, 9));

        let mut histogram: BTreeMap<u32, u32> = BTreeMap::new();
        for _ in 0..10_000 {
            let difficulty = sample_difficulty(&mut rng, 5, 0, None);
            assert!((low..=high).contains(&difficulty), "difficulty {difficulty} escaped the band");
            *histogram.entry(difficulty).or_default() += 1;
        }

        let mode = histogram.iter().max_by_key(|(_, count)| **count).map(|(level, _)| *level);
        assert_eq!(mode, Some(6));
        let counts: Vec<u32> = (low..=high).map(|d| histogram.get(&d).copied().unwrap_or(0)).collect();
        let peak = (6 - low) as usize;
        assert!(counts[..=peak].windows(2).all(|pair| pair[0] <= pair[1]), "{histogram:?}");
        assert!(counts[peak..].windows(2).all(|pair| pair[0] >= pair[1]), "{histogram:?}");
    }

    #[test]
    fn shallow_band_never_drops_below_one() {
        assert_eq!(difficulty_band(0, -2), (1, 2));
        let mut rng = GenRng::from_seed(1);
        for _ in 0..500 {
            assert!(sample_difficulty(&mut rng, 0, -2, None) >= 1);
        }
    }

    #[test]
    fn depth_clamp_narrows_the_roll() {
        let mut rng = GenRng::from_seed(3);
        let clamp = DepthClamp { from_depth: 0, min: 4, max: 5 };
        for _ in 0..500 {
            let difficulty = sample_difficulty(&mut rng, 8, 0, Some(clamp));
            assert!((4..=5).contains(&difficulty));
        }
    }

    #[test]
    fn empty_band_falls_back_to_nearest_populated_difficulty() {
        let catalog = Catalog::from_toml_str(
            r#"
            [[monster]]
            id = "ogre"
            difficulty = 20
            "#,
        )
        .expect("bestiary-only catalog");
        let roller = DifficultyRoller {
            bestiary: &catalog.bestiary,
            depth: 1,
            clamp: None,
            attempts: 4,
        };
        let mut rng = GenRng::from_seed(11);
        assert_eq!(roller.pick_monster(&mut rng, 0), Some(("ogre".to_string(), 20)));
    }
}
