//! Raw on-disk catalog shapes. Nothing here is used by generation directly;
//! `catalog.rs` validates these into typed domain values.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::TileKind;

fn default_true() -> bool {
    true
}

fn default_weight() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct CatalogFile {
    #[serde(default, rename = "terrain")]
    pub(super) terrains: Vec<TerrainDef>,
    #[serde(default, rename = "biome")]
    pub(super) biomes: Vec<BiomeDef>,
    #[serde(default, rename = "monster")]
    pub(super) monsters: Vec<MonsterDef>,
    #[serde(default, rename = "item")]
    pub(super) items: Vec<ItemDef>,
    #[serde(default)]
    pub(super) chests: BTreeMap<String, u32>,
    #[serde(default)]
    pub(super) limits: LimitsDef,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct TerrainDef {
    pub(super) id: String,
    pub(super) width: [u32; 2],
    pub(super) height: [u32; 2],
    pub(super) shapes: BTreeMap<String, u32>,
    #[serde(default)]
    pub(super) blob: Option<BlobDef>,
    #[serde(default = "default_true")]
    pub(super) has_door: bool,
    #[serde(default)]
    pub(super) door_count: BTreeMap<String, u32>,
    #[serde(default)]
    pub(super) protected: bool,
    #[serde(default = "default_true")]
    pub(super) allow_stairs: bool,
    #[serde(default)]
    pub(super) floor: Option<TileKind>,
    #[serde(default)]
    pub(super) monsters: Option<MonsterRuleDef>,
    #[serde(default)]
    pub(super) items: Option<ItemRuleDef>,
    #[serde(default)]
    pub(super) grass: Option<SpreadDef>,
    #[serde(default)]
    pub(super) water: Option<SpreadDef>,
    #[serde(default)]
    pub(super) pit: Option<SpreadDef>,
    #[serde(default)]
    pub(super) hole: Option<SpreadDef>,
    #[serde(default)]
    pub(super) traps: Option<ScatterDef>,
    #[serde(default)]
    pub(super) plants: Option<ScatterDef>,
    #[serde(default)]
    pub(super) chests: Option<ChestDef>,
    #[serde(default)]
    pub(super) hook: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct BlobDef {
    pub(super) min_density: f64,
    pub(super) max_density: f64,
    #[serde(default)]
    pub(super) smooth: bool,
    #[serde(default)]
    pub(super) gooify: Option<u32>,
    #[serde(default = "default_true")]
    pub(super) rotate: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct MonsterRuleDef {
    pub(super) count: [u32; 2],
    #[serde(default)]
    pub(super) toughness: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct ItemRuleDef {
    pub(super) count: [u32; 2],
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct SpreadDef {
    pub(super) cores: [u32; 2],
    pub(super) scale: [u32; 2],
    pub(super) density: f64,
    #[serde(default)]
    pub(super) no_border: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct ScatterDef {
    #[serde(default)]
    pub(super) min: u32,
    pub(super) max: u32,
    pub(super) chance: f64,
    pub(super) kinds: BTreeMap<String, u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct ChestDef {
    pub(super) count: [u32; 2],
    pub(super) archetypes: BTreeMap<String, u32>,
    #[serde(default)]
    pub(super) loot: Option<LootDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct LootDef {
    pub(super) rolls: [u32; 2],
    pub(super) items: BTreeMap<String, u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct BiomeDef {
    pub(super) id: String,
    pub(super) width: u32,
    pub(super) height: u32,
    pub(super) max_rooms: u32,
    pub(super) terrains: BTreeMap<String, u32>,
    #[serde(default)]
    pub(super) depth_terrains: Vec<DepthTerrainsDef>,
    #[serde(default)]
    pub(super) tiles: TilesDef,
    #[serde(default)]
    pub(super) difficulty_clamp: Vec<DepthClampDef>,
    #[serde(default)]
    pub(super) respawn: Option<RespawnDef>,
    #[serde(default = "default_true")]
    pub(super) descending_stair: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct DepthTerrainsDef {
    pub(super) from_depth: u32,
    pub(super) terrains: BTreeMap<String, u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct TilesDef {
    pub(super) wall: TileKind,
    pub(super) floor: TileKind,
    pub(super) tunnel: TileKind,
}

impl Default for TilesDef {
    fn default() -> Self {
        Self { wall: TileKind::Wall, floor: TileKind::Floor, tunnel: TileKind::Corridor }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct DepthClampDef {
    pub(super) from_depth: u32,
    pub(super) min: u32,
    pub(super) max: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct RespawnDef {
    pub(super) ratio: f64,
    pub(super) interval: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct MonsterDef {
    pub(super) id: String,
    pub(super) difficulty: u32,
    #[serde(default = "default_weight")]
    pub(super) weight: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct ItemDef {
    pub(super) id: String,
    #[serde(default = "default_weight")]
    pub(super) rarity: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct LimitsDef {
    #[serde(default)]
    pub(super) level_attempts: Option<u32>,
    #[serde(default)]
    pub(super) stair_attempts: Option<u32>,
    #[serde(default)]
    pub(super) blob_attempts: Option<u32>,
    #[serde(default)]
    pub(super) blob_relaxations: Option<u32>,
    #[serde(default)]
    pub(super) difficulty_attempts: Option<u32>,
}
