//! Terrain descriptors: the declarative template behind every placed room.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::file::{BlobDef, ChestDef, ScatterDef, SpreadDef, TerrainDef};
use super::weights::{IntRange, WeightTable, validated_probability};
use crate::error::CatalogError;
use crate::types::TileKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TerrainId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangular,
    Circular,
    Blob,
    Perpendicular,
}

impl ShapeKind {
    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Rectangular => "rectangular",
            ShapeKind::Circular => "circular",
            ShapeKind::Blob => "blob",
            ShapeKind::Perpendicular => "perpendicular",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        [ShapeKind::Rectangular, ShapeKind::Circular, ShapeKind::Blob, ShapeKind::Perpendicular]
            .into_iter()
            .find(|kind| kind.name() == name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlobParams {
    pub min_density: f64,
    pub max_density: f64,
    pub smooth: bool,
    pub gooify: Option<usize>,
    pub rotate: bool,
}

impl Default for BlobParams {
    fn default() -> Self {
        Self { min_density: 0.45, max_density: 0.7, smooth: false, gooify: Some(2), rotate: true }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpreadParams {
    pub cores: IntRange,
    pub scale: IntRange,
    pub density: f64,
    pub no_border: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScatterParams {
    pub min: u32,
    pub max: u32,
    pub chance: f64,
    pub kinds: WeightTable<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LootTable {
    pub rolls: IntRange,
    pub items: WeightTable<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChestParams {
    pub count: IntRange,
    pub archetypes: WeightTable<String>,
    pub loot: Option<LootTable>,
}

/// One configured decoration pass, applied in catalog order.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoration {
    Grass(SpreadParams),
    Water(SpreadParams),
    Pit(SpreadParams),
    Hole(SpreadParams),
    Traps(ScatterParams),
    Plants(ScatterParams),
    Chests(ChestParams),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonsterRule {
    pub count: IntRange,
    pub toughness: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Terrain {
    pub id: String,
    pub width: IntRange,
    pub height: IntRange,
    pub shapes: WeightTable<ShapeKind>,
    pub blob: BlobParams,
    /// Door-count distribution; empty when the terrain has no doors.
    pub doors: WeightTable<usize>,
    pub protected: bool,
    pub allow_stairs: bool,
    pub floor: Option<TileKind>,
    pub monsters: Option<MonsterRule>,
    pub items: Option<IntRange>,
    pub decorations: Vec<Decoration>,
    pub hook: Option<String>,
}

impl Terrain {
    pub fn has_doors(&self) -> bool {
        !self.doors.is_empty()
    }

    pub fn chest_params(&self) -> Option<&ChestParams> {
        self.decorations.iter().find_map(|decoration| match decoration {
            Decoration::Chests(params) => Some(params),
            _ => None,
        })
    }

    pub(super) fn from_def(def: TerrainDef) -> Result<Self, CatalogError> {
        let context = format!("terrain `{}`", def.id);
        let width = IntRange::validated(def.width, &format!("{context}.width"))?;
        let height = IntRange::validated(def.height, &format!("{context}.height"))?;
        if width.min < 3 || height.min < 3 {
            return Err(CatalogError::InvalidRange {
                context: format!("{context}: rooms need at least 3x3 cells"),
                min: width.min.min(height.min),
                max: 3,
            });
        }

        if let Some(floor) = def.floor.filter(|floor| !floor.is_walkable_and_safe()) {
            return Err(CatalogError::InvalidTerrain {
                terrain: def.id,
                reason: format!("floor tile `{}` is not walkable and safe", floor.props().name),
            });
        }

        let mut shapes = WeightTable::new();
        for (name, weight) in &def.shapes {
            let kind = ShapeKind::parse(name).ok_or_else(|| CatalogError::UnknownName {
                context: format!("{context}.shapes"),
                what: "shape",
                name: name.clone(),
            })?;
            shapes.push(kind, *weight);
        }
        let shapes = shapes.require_non_empty(&format!("{context}.shapes"))?;

        let doors = if def.has_door { door_table(&def.door_count, &context)? } else { WeightTable::new() };

        let decorations = decorations_from_def(&def, &context)?;

        Ok(Self {
            blob: def.blob.map(|blob| blob_params(blob, &context)).transpose()?.unwrap_or_default(),
            monsters: def
                .monsters
                .map(|rule| {
                    Ok::<_, CatalogError>(MonsterRule {
                        count: IntRange::validated(rule.count, &format!("{context}.monsters"))?,
                        toughness: rule.toughness,
                    })
                })
                .transpose()?,
            items: def
                .items
                .map(|rule| IntRange::validated(rule.count, &format!("{context}.items")))
                .transpose()?,
            id: def.id,
            width,
            height,
            shapes,
            doors,
            protected: def.protected,
            allow_stairs: def.allow_stairs,
            floor: def.floor,
            decorations,
            hook: def.hook,
        })
    }
}

fn door_table(raw: &BTreeMap<String, u32>, context: &str) -> Result<WeightTable<usize>, CatalogError> {
    if raw.is_empty() {
        return Ok([(1, 3), (2, 4), (3, 2), (4, 1)].into_iter().collect());
    }
    let mut table = WeightTable::new();
    for (key, weight) in raw {
        let count = key.parse::<usize>().ok().filter(|count| (1..=4).contains(count)).ok_or_else(
            || CatalogError::UnknownName {
                context: format!("{context}.door_count"),
                what: "door count",
                name: key.clone(),
            },
        )?;
        table.push(count, *weight);
    }
    table.require_non_empty(&format!("{context}.door_count"))
}

fn blob_params(def: BlobDef, context: &str) -> Result<BlobParams, CatalogError> {
    let min_density = validated_probability(def.min_density, &format!("{context}.blob.min_density"))?;
    let max_density = validated_probability(def.max_density, &format!("{context}.blob.max_density"))?;
    if min_density > max_density || max_density == 0.0 {
        return Err(CatalogError::InvalidProbability {
            context: format!("{context}.blob: min_density must not exceed a non-zero max_density"),
            value: min_density,
        });
    }
    Ok(BlobParams {
        min_density,
        max_density,
        smooth: def.smooth,
        gooify: def.gooify.map(|gap| gap as usize),
        rotate: def.rotate,
    })
}

fn spread_params(def: &SpreadDef, context: &str) -> Result<SpreadParams, CatalogError> {
    Ok(SpreadParams {
        cores: IntRange::validated(def.cores, &format!("{context}.cores"))?,
        scale: IntRange::validated(def.scale, &format!("{context}.scale"))?,
        density: validated_probability(def.density, &format!("{context}.density"))?,
        no_border: def.no_border,
    })
}

fn scatter_params(def: &ScatterDef, context: &str) -> Result<ScatterParams, CatalogError> {
    if def.min > def.max {
        return Err(CatalogError::InvalidRange {
            context: context.to_string(),
            min: def.min,
            max: def.max,
        });
    }
    Ok(ScatterParams {
        min: def.min,
        max: def.max,
        chance: validated_probability(def.chance, &format!("{context}.chance"))?,
        kinds: string_table(&def.kinds, &format!("{context}.kinds"))?,
    })
}

fn chest_params(def: &ChestDef, context: &str) -> Result<ChestParams, CatalogError> {
    let loot = match &def.loot {
        Some(loot) => Some(LootTable {
            rolls: IntRange::validated(loot.rolls, &format!("{context}.loot.rolls"))?,
            items: string_table(&loot.items, &format!("{context}.loot.items"))?,
        }),
        None => None,
    };
    Ok(ChestParams {
        count: IntRange::validated(def.count, &format!("{context}.count"))?,
        archetypes: string_table(&def.archetypes, &format!("{context}.archetypes"))?,
        loot,
    })
}

pub(super) fn string_table(
    raw: &BTreeMap<String, u32>,
    context: &str,
) -> Result<WeightTable<String>, CatalogError> {
    raw.iter()
        .map(|(name, weight)| (name.clone(), *weight))
        .collect::<WeightTable<_>>()
        .require_non_empty(context)
}

fn decorations_from_def(def: &TerrainDef, context: &str) -> Result<Vec<Decoration>, CatalogError> {
    let mut decorations = Vec::new();
    if let Some(grass) = &def.grass {
        decorations.push(Decoration::Grass(spread_params(grass, &format!("{context}.grass"))?));
    }
    if let Some(water) = &def.water {
        decorations.push(Decoration::Water(spread_params(water, &format!("{context}.water"))?));
    }
    if let Some(pit) = &def.pit {
        decorations.push(Decoration::Pit(spread_params(pit, &format!("{context}.pit"))?));
    }
    if let Some(hole) = &def.hole {
        decorations.push(Decoration::Hole(spread_params(hole, &format!("{context}.hole"))?));
    }
    if let Some(traps) = &def.traps {
        decorations.push(Decoration::Traps(scatter_params(traps, &format!("{context}.traps"))?));
    }
    if let Some(plants) = &def.plants {
        decorations.push(Decoration::Plants(scatter_params(plants, &format!("{context}.plants"))?));
    }
    if let Some(chests) = &def.chests {
        decorations.push(Decoration::Chests(chest_params(chests, &format!("{context}.chests"))?));
    }
    Ok(decorations)
}
