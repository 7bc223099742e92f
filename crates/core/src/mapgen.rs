//! Procedural level generation split into one submodule per pipeline stage.

mod blob;
mod decorate;
mod generator;
mod grid;
mod hooks;
mod placement;
mod population;
mod room;
mod session;
mod shape;
mod stairs;
mod tunnels;

pub use blob::{
    BlobGrid, BlobLimits, BlobOptions, generate_blob_of_mass, generate_blob_of_size_fast,
    generate_blob_of_size_smooth,
};
pub use decorate::{DecorationContext, ScatterKind, SpreadKind, SpreadOutcome, roll_loot};
pub use generator::{LevelGenerator, NoProgress, ProgressObserver, Stage, generate_level};
pub use hooks::{Camp, HookRegistry, PillarHall, Shrine, TerrainHook};
pub use population::{DifficultyRoller, difficulty_band, respawn, sample_difficulty};
pub use room::{Room, RoomRequest};
pub use shape::{LocalCell, ShapeMask, Span};
pub use tunnels::{StepCosts, carve_path, find_tunnel_path, nearest_neighbor_chain};
