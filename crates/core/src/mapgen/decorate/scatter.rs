use tracing::debug;

use crate::catalog::ScatterParams;
use crate::level::EntityKind;
use crate::types::{Category, Pos, TileKind};

use super::DecorationContext;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScatterKind {
    Traps,
    Plants,
}

fn place(context: &mut DecorationContext<'_>, kind: ScatterKind, params: &ScatterParams, pos: Pos) {
    let Some(template) = params.kinds.sample(context.rng).cloned() else {
        return;
    };
    match kind {
        ScatterKind::Traps => {
            context.level.stamp(pos, TileKind::Trap, Category::Trap);
            context.level.spawn(pos, EntityKind::Trap { template });
        }
        ScatterKind::Plants => {
            context.level.set_category(pos, Category::Plant);
            context.level.spawn(pos, EntityKind::Plant { template });
        }
    }
}

/// Places `min` features unconditionally, then tries the remaining free
/// cells with `chance` each until `max` is reached. Returns the count placed.
pub(super) fn scatter(
    context: &mut DecorationContext<'_>,
    kind: ScatterKind,
    params: &ScatterParams,
) -> usize {
    let mut free = context.free_inner_cells();
    let guaranteed = (params.min as usize).min(free.len());
    let limit = params.max as usize;
    let mut placed = 0;

    while placed < guaranteed {
        let index = context.rng.range_usize(0, free.len() - 1);
        let pos = free.swap_remove(index);
        place(context, kind, params, pos);
        placed += 1;
    }

    context.rng.shuffle(&mut free);
    for pos in free {
        if placed >= limit {
            break;
        }
        if context.rng.chance(params.chance) {
            place(context, kind, params, pos);
            placed += 1;
        }
    }
    debug!(?kind, placed, "scatter pass");
    placed
}
