//! One generation attempt: every stage in order, then the connectivity check.

use tracing::debug;

use crate::error::GenerationError;
use crate::level::Level;

use super::super::decorate::decorate_rooms;
use super::super::grid::unreachable_cells;
use super::super::hooks::HookRegistry;
use super::super::placement::{place_rooms, stamp_earth};
use super::super::population::populate;
use super::super::session::GenerationSession;
use super::super::stairs::place_stairs;
use super::super::tunnels::{StepCosts, adjust_convexes, link_rooms};
use super::{ProgressObserver, Stage};

pub(super) fn run(
    mut session: GenerationSession<'_>,
    hooks: &HookRegistry,
    costs: StepCosts,
    observer: &mut dyn ProgressObserver,
) -> Result<Level, GenerationError> {
    stamp_earth(&mut session.level);
    observer.stage_completed(Stage::Earth, &session.level);

    place_rooms(&mut session);
    observer.stage_completed(Stage::Rooms, &session.level);

    let tunnel_tile = session.biome.tiles.tunnel;
    link_rooms(&mut session.level, &session.rooms, tunnel_tile, costs);
    adjust_convexes(&mut session, costs);
    observer.stage_completed(Stage::Tunnels, &session.level);

    decorate_rooms(&mut session, hooks);
    observer.stage_completed(Stage::Terrain, &session.level);

    place_stairs(&mut session)?;
    observer.stage_completed(Stage::Stairs, &session.level);

    populate(&mut session);
    observer.stage_completed(Stage::Entities, &session.level);

    let level = session.into_level();
    validate(&level)?;
    Ok(level)
}

/// Every safe walkable structural cell must be reachable from the ascend stair.
pub(super) fn validate(level: &Level) -> Result<(), GenerationError> {
    let ascend = level.ascend.ok_or(GenerationError::StairsUnreachable)?;
    let unreachable = unreachable_cells(level, ascend);
    if !unreachable.is_empty() {
        debug!(count = unreachable.len(), first = ?unreachable.first(), "level failed connectivity");
        return Err(GenerationError::Disconnected { unreachable: unreachable.len() });
    }
    Ok(())
}
