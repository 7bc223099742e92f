//! Declarative level configuration: terrains, biomes, entity templates and
//! retry limits, loaded from TOML and validated once up front.

mod bestiary;
mod biome;
mod file;
mod terrain;
mod weights;

use std::fs;
use std::path::Path;

use tracing::debug;

pub use bestiary::Bestiary;
pub use biome::{Biome, BiomeTiles, DepthClamp, RespawnPolicy};
pub use terrain::{
    BlobParams, ChestParams, Decoration, LootTable, MonsterRule, ScatterParams, ShapeKind,
    SpreadParams, Terrain, TerrainId,
};
pub use weights::{IntRange, WeightTable};

use crate::error::CatalogError;
use file::CatalogFile;

const BUILTIN_CATALOG: &str = include_str!("../assets/catalog.toml");

/// Upper bounds for every retry loop in the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationLimits {
    pub level_attempts: u32,
    pub stair_attempts: u32,
    pub blob_attempts: u32,
    pub blob_relaxations: u32,
    pub difficulty_attempts: u32,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            level_attempts: 24,
            stair_attempts: 200,
            blob_attempts: 400,
            blob_relaxations: 4,
            difficulty_attempts: 64,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Catalog {
    pub terrains: Vec<Terrain>,
    pub biomes: Vec<Biome>,
    pub bestiary: Bestiary,
    pub limits: GenerationLimits,
}

impl Catalog {
    /// The catalog shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(text)?;
        Self::from_file(file)
    }

    fn from_file(file: CatalogFile) -> Result<Self, CatalogError> {
        let mut terrains: Vec<Terrain> = Vec::with_capacity(file.terrains.len());
        for def in file.terrains {
            if terrains.iter().any(|terrain| terrain.id == def.id) {
                return Err(CatalogError::DuplicateId { what: "terrain", id: def.id });
            }
            terrains.push(Terrain::from_def(def)?);
        }

        let mut biomes: Vec<Biome> = Vec::with_capacity(file.biomes.len());
        for def in file.biomes {
            if biomes.iter().any(|biome| biome.id == def.id) {
                return Err(CatalogError::DuplicateId { what: "biome", id: def.id });
            }
            biomes.push(Biome::from_def(def, &terrains)?);
        }

        let bestiary = Bestiary::from_defs(file.monsters, file.items, &file.chests)?;

        let defaults = GenerationLimits::default();
        let limits = GenerationLimits {
            level_attempts: file.limits.level_attempts.unwrap_or(defaults.level_attempts).max(1),
            stair_attempts: file.limits.stair_attempts.unwrap_or(defaults.stair_attempts).max(1),
            blob_attempts: file.limits.blob_attempts.unwrap_or(defaults.blob_attempts).max(1),
            blob_relaxations: file.limits.blob_relaxations.unwrap_or(defaults.blob_relaxations),
            difficulty_attempts: file
                .limits
                .difficulty_attempts
                .unwrap_or(defaults.difficulty_attempts)
                .max(1),
        };

        debug!(terrains = terrains.len(), biomes = biomes.len(), "catalog validated");
        Ok(Self { terrains, biomes, bestiary, limits })
    }

    pub fn biome(&self, id: &str) -> Option<&Biome> {
        self.biomes.iter().find(|biome| biome.id == id)
    }

    pub fn terrain(&self, id: TerrainId) -> &Terrain {
        &self.terrains[id.0]
    }

    pub fn terrain_by_name(&self, name: &str) -> Option<TerrainId> {
        self.terrains.iter().position(|terrain| terrain.id == name).map(TerrainId)
    }
}
