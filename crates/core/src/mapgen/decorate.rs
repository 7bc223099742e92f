//! Terrain stage: per-room decoration passes or a registered hook.

mod chests;
mod scatter;
mod spread;

use tracing::{debug, warn};

use crate::catalog::{BiomeTiles, Bestiary, Decoration, Terrain};
use crate::level::Level;
use crate::rng::GenRng;
use crate::types::{Category, Pos};

use super::hooks::HookRegistry;
use super::population::DifficultyRoller;
use super::room::Room;
use super::session::GenerationSession;

pub use chests::roll_loot;
pub use scatter::ScatterKind;
pub use spread::{SpreadKind, SpreadOutcome};

/// What a decoration pass or hook may touch: one room, the level around it
/// and the session's random stream.
pub struct DecorationContext<'a> {
    pub level: &'a mut Level,
    pub room: &'a Room,
    pub terrain: &'a Terrain,
    pub tiles: BiomeTiles,
    pub bestiary: &'a Bestiary,
    pub difficulty: DifficultyRoller<'a>,
    pub rng: &'a mut GenRng,
}

impl DecorationContext<'_> {
    /// Plain floor cells of the room with nothing standing on them.
    pub fn free_inner_cells(&self) -> Vec<Pos> {
        self.room
            .inner_cells()
            .into_iter()
            .filter(|&pos| {
                self.level.category_at(pos) == Category::RoomInner
                    && self.level.is_walkable_and_safe(pos)
                    && !self.level.is_occupied(pos)
            })
            .collect()
    }

    /// Runs the terrain's configured passes in catalog order.
    pub fn apply_decorations(&mut self) {
        let terrain = self.terrain;
        for decoration in &terrain.decorations {
            match decoration {
                Decoration::Grass(params) => {
                    spread::spread(self, SpreadKind::Grass, params);
                }
                Decoration::Water(params) => {
                    spread::spread(self, SpreadKind::Water, params);
                }
                Decoration::Pit(params) => {
                    spread::spread(self, SpreadKind::Pit, params);
                }
                Decoration::Hole(params) => {
                    spread::spread(self, SpreadKind::Hole, params);
                }
                Decoration::Traps(params) => {
                    scatter::scatter(self, ScatterKind::Traps, params);
                }
                Decoration::Plants(params) => {
                    scatter::scatter(self, ScatterKind::Plants, params);
                }
                Decoration::Chests(params) => {
                    chests::place_chests(self, params);
                }
            }
        }
    }
}

pub(super) fn decorate_rooms(session: &mut GenerationSession<'_>, hooks: &HookRegistry) {
    let catalog = session.catalog;
    let difficulty = session.difficulty();
    let bestiary = &catalog.bestiary;
    let tiles = session.biome.tiles;
    for room_index in 0..session.rooms.len() {
        let terrain = session.terrain_of(room_index);
        let mut context = DecorationContext {
            level: &mut session.level,
            room: &session.rooms[room_index],
            terrain,
            tiles,
            bestiary,
            difficulty,
            rng: &mut session.rng,
        };
        if let Some(name) = terrain.hook.as_deref() {
            if let Some(hook) = hooks.get(name) {
                debug!(room_index, hook = name, "custom terrain hook");
                hook.decorate(&mut context);
                continue;
            }
            warn!(hook = name, terrain = %terrain.id, "unknown terrain hook; using standard decorations");
        }
        context.apply_decorations();
    }
}

#[cfg(test)]
pub(super) mod test_support {
    use super::*;
    use crate::catalog::{Catalog, ShapeKind, TerrainId};
    use crate::mapgen::blob::BlobLimits;
    use crate::mapgen::placement::{stamp_earth, stamp_room};
    use crate::mapgen::room::RoomRequest;
    use crate::types::TileKind;

    /// A 30x20 level holding one rectangular room of the builtin `chamber`
    /// terrain, stamped at (5, 5) and sized 14x10.
    pub(crate) fn chamber_fixture(seed: u64) -> (Catalog, Level, Room, GenRng) {
        let catalog = Catalog::builtin().expect("builtin catalog");
        let terrain_id: TerrainId = catalog.terrain_by_name("chamber").expect("chamber terrain");
        let mut rng = GenRng::from_seed(seed);
        let terrain = catalog.terrain(terrain_id);
        let request = RoomRequest {
            terrain_id,
            terrain,
            shape: ShapeKind::Rectangular,
            origin: Pos { y: 5, x: 5 },
            width: 14,
            height: 10,
            blob_limits: BlobLimits::default(),
        };
        let room = Room::build(&request, &mut rng).expect("rectangle builds");
        let mut level = Level::new(30, 20, 3, "test", TileKind::Wall);
        stamp_earth(&mut level);
        let tiles = BiomeTiles { wall: TileKind::Wall, floor: TileKind::Floor, tunnel: TileKind::Corridor };
        stamp_room(&mut level, &room, terrain, tiles);
        (catalog, level, room, rng)
    }
}
