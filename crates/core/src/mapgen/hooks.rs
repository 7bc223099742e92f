//! Custom terrain decorators, selected by the `hook` name of a terrain.

use std::collections::BTreeMap;

use crate::level::EntityKind;
use crate::types::{Category, Pos};

use super::decorate::{DecorationContext, roll_loot};
use super::grid::{neighbors4, neighbors8};

/// Replaces the standard decoration passes for rooms whose terrain names it.
/// A hook may still call [`DecorationContext::apply_decorations`] itself.
pub trait TerrainHook {
    fn decorate(&self, context: &mut DecorationContext<'_>);
}

pub type HookRegistry = BTreeMap<String, Box<dyn TerrainHook>>;

/// Standard decorations, then a lattice of single-cell pillars every third
/// cell. Each pillar keeps a fully walkable ring so paths bend around it.
#[derive(Clone, Copy, Debug, Default)]
pub struct PillarHall;

impl TerrainHook for PillarHall {
    fn decorate(&self, context: &mut DecorationContext<'_>) {
        context.apply_decorations();
        let origin = context.room.origin;
        let pillars: Vec<Pos> = context
            .free_inner_cells()
            .into_iter()
            .filter(|pos| (pos.x - origin.x) % 3 == 2 && (pos.y - origin.y) % 3 == 2)
            .filter(|&pos| {
                neighbors8(pos).iter().all(|&around| {
                    context.room.is_inner(around) && context.level.is_walkable_and_safe(around)
                })
            })
            .collect();
        for pos in pillars {
            context.level.stamp(pos, context.tiles.wall, Category::RoomWall);
            context.level.set_tunnel_allowed(pos, false);
        }
    }
}

/// A single chest on the room's anchor and nothing else.
#[derive(Clone, Copy, Debug, Default)]
pub struct Shrine;

impl TerrainHook for Shrine {
    fn decorate(&self, context: &mut DecorationContext<'_>) {
        let anchor = context.room.anchor();
        if context.level.is_occupied(anchor) || !context.level.is_walkable_and_safe(anchor) {
            return;
        }
        let params = context.terrain.chest_params();
        let archetype = params
            .and_then(|params| params.archetypes.sample(context.rng).cloned())
            .unwrap_or_else(|| "shrine".to_string());
        let contents = match params.and_then(|params| params.loot.as_ref()) {
            Some(loot) => roll_loot(context.rng, Some(loot)),
            None => context.bestiary.items().sample(context.rng).cloned().into_iter().collect(),
        };
        context.level.spawn(anchor, EntityKind::Chest { archetype, contents });
    }
}

/// Standard decorations, then a monster on the anchor and on each free
/// orthogonal neighbour of it.
#[derive(Clone, Copy, Debug, Default)]
pub struct Camp;

impl TerrainHook for Camp {
    fn decorate(&self, context: &mut DecorationContext<'_>) {
        context.apply_decorations();
        let toughness = context.terrain.monsters.map_or(0, |rule| rule.toughness);
        let anchor = context.room.anchor();
        let mut posts = vec![anchor];
        posts.extend(neighbors4(anchor));
        for pos in posts {
            if !context.room.is_inner(pos)
                || !context.level.is_walkable_and_safe(pos)
                || context.level.is_occupied(pos)
            {
                continue;
            }
            if let Some((template, difficulty)) = context.difficulty.pick_monster(context.rng, toughness) {
                context.level.spawn(pos, EntityKind::Monster { template, difficulty });
            }
        }
    }
}

pub(super) fn builtin_hooks() -> HookRegistry {
    let mut hooks: HookRegistry = BTreeMap::new();
    hooks.insert("pillars".to_string(), Box::new(PillarHall));
    hooks.insert("shrine".to_string(), Box::new(Shrine));
    hooks.insert("camp".to_string(), Box::new(Camp));
    hooks
}
