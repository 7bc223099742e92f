//! Monster and item template tables consumed by entity population.

use std::collections::BTreeMap;

use super::file::{ItemDef, MonsterDef};
use super::weights::WeightTable;
use crate::error::CatalogError;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bestiary {
    monsters_by_difficulty: BTreeMap<u32, WeightTable<String>>,
    items: WeightTable<String>,
    chests: WeightTable<String>,
}

impl Bestiary {
    pub(super) fn from_defs(
        monsters: Vec<MonsterDef>,
        items: Vec<ItemDef>,
        chests: &BTreeMap<String, u32>,
    ) -> Result<Self, CatalogError> {
        let mut seen = Vec::with_capacity(monsters.len());
        let mut monsters_by_difficulty: BTreeMap<u32, WeightTable<String>> = BTreeMap::new();
        for monster in monsters {
            if seen.contains(&monster.id) {
                return Err(CatalogError::DuplicateId { what: "monster", id: monster.id });
            }
            if monster.difficulty == 0 {
                return Err(CatalogError::InvalidRange {
                    context: format!("monster `{}`.difficulty", monster.id),
                    min: 1,
                    max: 0,
                });
            }
            seen.push(monster.id.clone());
            monsters_by_difficulty
                .entry(monster.difficulty)
                .or_default()
                .push(monster.id, monster.weight);
        }
        monsters_by_difficulty.retain(|_, table| !table.is_empty());

        let mut item_table = WeightTable::new();
        let mut seen_items = Vec::with_capacity(items.len());
        for item in items {
            if seen_items.contains(&item.id) {
                return Err(CatalogError::DuplicateId { what: "item", id: item.id });
            }
            seen_items.push(item.id.clone());
            item_table.push(item.id, item.rarity);
        }

        let chests =
            chests.iter().map(|(name, weight)| (name.clone(), *weight)).collect::<WeightTable<_>>();

        Ok(Self { monsters_by_difficulty, items: item_table, chests })
    }

    pub fn monsters_at(&self, difficulty: u32) -> Option<&WeightTable<String>> {
        self.monsters_by_difficulty.get(&difficulty)
    }

    pub fn has_monsters_at(&self, difficulty: u32) -> bool {
        self.monsters_by_difficulty.contains_key(&difficulty)
    }

    /// Populated difficulty nearest to `difficulty` inside `min..=max`, lower wins ties.
    pub fn nearest_populated(&self, difficulty: u32, min: u32, max: u32) -> Option<u32> {
        self.monsters_by_difficulty
            .range(min..=max)
            .map(|(&level, _)| level)
            .min_by_key(|&level| (level.abs_diff(difficulty), level))
    }

    pub fn items(&self) -> &WeightTable<String> {
        &self.items
    }

    /// Archetypes used for chests that are not tied to a terrain.
    pub fn chests(&self) -> &WeightTable<String> {
        &self.chests
    }
}
