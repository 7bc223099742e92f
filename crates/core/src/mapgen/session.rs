use crate::catalog::{Biome, Catalog, GenerationLimits, Terrain};
use crate::level::Level;
use crate::rng::GenRng;

use super::blob::BlobLimits;
use super::population::DifficultyRoller;
use super::room::Room;

/// Owns the grid and the room list for one generation attempt. Stages borrow
/// it in turn; rooms are addressed by index.
pub(super) struct GenerationSession<'a> {
    pub(super) catalog: &'a Catalog,
    pub(super) biome: &'a Biome,
    pub(super) depth: u32,
    pub(super) rng: GenRng,
    pub(super) level: Level,
    pub(super) rooms: Vec<Room>,
}

impl<'a> GenerationSession<'a> {
    pub(super) fn new(catalog: &'a Catalog, biome: &'a Biome, depth: u32, seed: u64) -> Self {
        Self {
            catalog,
            biome,
            depth,
            rng: GenRng::from_seed(seed),
            level: Level::new(biome.width, biome.height, depth, &biome.id, biome.tiles.wall),
            rooms: Vec::new(),
        }
    }

    pub(super) fn limits(&self) -> GenerationLimits {
        self.catalog.limits
    }

    pub(super) fn blob_limits(&self) -> BlobLimits {
        BlobLimits {
            attempts: self.catalog.limits.blob_attempts,
            relaxations: self.catalog.limits.blob_relaxations,
        }
    }

    pub(super) fn terrain_of(&self, room_index: usize) -> &'a Terrain {
        self.catalog.terrain(self.rooms[room_index].terrain)
    }

    pub(super) fn difficulty(&self) -> DifficultyRoller<'a> {
        DifficultyRoller {
            bestiary: &self.catalog.bestiary,
            depth: self.depth,
            clamp: self.biome.difficulty_clamp_at(self.depth),
            attempts: self.catalog.limits.difficulty_attempts,
        }
    }

    pub(super) fn into_level(mut self) -> Level {
        self.level.rooms = self.rooms.iter().map(Room::to_placed).collect();
        self.level
    }
}
