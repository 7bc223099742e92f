//! Biome descriptors: map size, room cap, terrain tables and respawn rules.

use std::collections::BTreeMap;

use tracing::warn;

use super::file::BiomeDef;
use super::terrain::{Terrain, TerrainId};
use super::weights::{WeightTable, validated_probability};
use crate::error::CatalogError;
use crate::types::TileKind;

/// Tiles a biome stamps for earth, room floors and carved tunnels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BiomeTiles {
    pub wall: TileKind,
    pub floor: TileKind,
    pub tunnel: TileKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthClamp {
    pub from_depth: u32,
    pub min: u32,
    pub max: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RespawnPolicy {
    /// Respawn triggers once live monsters drop below `ratio * starting count`.
    pub ratio: f64,
    /// Minimum turns between two respawn passes.
    pub interval: u32,
}

impl Default for RespawnPolicy {
    fn default() -> Self {
        Self { ratio: 0.5, interval: 50 }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Biome {
    pub id: String,
    pub width: usize,
    pub height: usize,
    pub max_rooms: u32,
    pub terrains: WeightTable<TerrainId>,
    /// Sorted by `from_depth`; the last entry not deeper than the level wins.
    pub depth_terrains: Vec<(u32, WeightTable<TerrainId>)>,
    pub tiles: BiomeTiles,
    pub difficulty_clamp: Vec<DepthClamp>,
    pub respawn: RespawnPolicy,
    pub generate_descending_stair: bool,
}

impl Biome {
    pub fn terrain_table(&self, depth: u32) -> &WeightTable<TerrainId> {
        self.depth_terrains
            .iter()
            .rev()
            .find(|(from_depth, _)| *from_depth <= depth)
            .map_or(&self.terrains, |(_, table)| table)
    }

    pub fn difficulty_clamp_at(&self, depth: u32) -> Option<DepthClamp> {
        self.difficulty_clamp.iter().rev().find(|clamp| clamp.from_depth <= depth).copied()
    }

    pub(super) fn from_def(def: BiomeDef, terrains: &[Terrain]) -> Result<Self, CatalogError> {
        if def.width < 16 || def.height < 12 {
            return Err(CatalogError::InvalidBiome {
                biome: def.id,
                reason: "maps must be at least 16x12".to_string(),
            });
        }

        for (slot, tile) in [("floor", def.tiles.floor), ("tunnel", def.tiles.tunnel)] {
            if !tile.is_walkable_and_safe() {
                return Err(CatalogError::InvalidBiome {
                    biome: def.id,
                    reason: format!("{slot} tile `{}` is not walkable and safe", tile.props().name),
                });
            }
        }

        let terrain_weights = resolve_terrains(&def.id, &def.terrains, terrains);
        if terrain_weights.is_empty() {
            return Err(CatalogError::NoTerrains { biome: def.id });
        }

        let mut depth_terrains = Vec::new();
        for block in &def.depth_terrains {
            let table = resolve_terrains(&def.id, &block.terrains, terrains);
            if table.is_empty() {
                warn!(biome = %def.id, from_depth = block.from_depth, "depth terrain block has no usable terrains; dropped");
                continue;
            }
            depth_terrains.push((block.from_depth, table));
        }
        depth_terrains.sort_by_key(|(from_depth, _)| *from_depth);

        let mut difficulty_clamp = Vec::with_capacity(def.difficulty_clamp.len());
        for clamp in &def.difficulty_clamp {
            if clamp.min == 0 || clamp.min > clamp.max {
                return Err(CatalogError::InvalidRange {
                    context: format!("biome `{}`.difficulty_clamp", def.id),
                    min: clamp.min,
                    max: clamp.max,
                });
            }
            difficulty_clamp.push(DepthClamp {
                from_depth: clamp.from_depth,
                min: clamp.min,
                max: clamp.max,
            });
        }
        difficulty_clamp.sort_by_key(|clamp| clamp.from_depth);

        let respawn = match &def.respawn {
            Some(respawn) => RespawnPolicy {
                ratio: validated_probability(
                    respawn.ratio,
                    &format!("biome `{}`.respawn.ratio", def.id),
                )?,
                interval: respawn.interval,
            },
            None => RespawnPolicy::default(),
        };

        Ok(Self {
            width: def.width as usize,
            height: def.height as usize,
            max_rooms: def.max_rooms,
            terrains: terrain_weights,
            depth_terrains,
            tiles: BiomeTiles { wall: def.tiles.wall, floor: def.tiles.floor, tunnel: def.tiles.tunnel },
            difficulty_clamp,
            respawn,
            generate_descending_stair: def.descending_stair,
            id: def.id,
        })
    }
}

fn resolve_terrains(
    biome: &str,
    weights: &BTreeMap<String, u32>,
    terrains: &[Terrain],
) -> WeightTable<TerrainId> {
    let mut table = WeightTable::new();
    for (name, weight) in weights {
        match terrains.iter().position(|terrain| &terrain.id == name) {
            Some(index) => table.push(TerrainId(index), *weight),
            None => warn!(biome, terrain = %name, "biome references unknown terrain; entry dropped"),
        }
    }
    table
}
