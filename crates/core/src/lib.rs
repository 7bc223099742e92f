//! Seeded, catalog-driven dungeon level generation.

pub mod catalog;
pub mod error;
pub mod level;
pub mod mapgen;
pub mod rng;
pub mod types;

pub use catalog::Catalog;
pub use error::{CatalogError, GenerationError};
pub use level::{Entity, EntityKind, Level, PlacedRoom};
pub use mapgen::{LevelGenerator, NoProgress, ProgressObserver, Stage, generate_level};
pub use rng::GenRng;
pub use types::*;
