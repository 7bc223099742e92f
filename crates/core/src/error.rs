use std::io;

use thiserror::Error;

/// Problems found while loading or validating a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{context}: range [{min}, {max}] has min greater than max")]
    InvalidRange { context: String, min: u32, max: u32 },
    #[error("{context}: probability {value} is outside 0..=1")]
    InvalidProbability { context: String, value: f64 },
    #[error("{context}: unknown {what} `{name}`")]
    UnknownName { context: String, what: &'static str, name: String },
    #[error("{context}: weight table is empty or has zero total weight")]
    EmptyWeights { context: String },
    #[error("duplicate {what} id `{id}`")]
    DuplicateId { what: &'static str, id: String },
    #[error("biome `{biome}` has no usable terrains")]
    NoTerrains { biome: String },
    #[error("biome `{biome}`: {reason}")]
    InvalidBiome { biome: String, reason: String },
    #[error("terrain `{terrain}`: {reason}")]
    InvalidTerrain { terrain: String, reason: String },
}

/// Hard failures of a generation request.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GenerationError {
    #[error("unknown biome `{0}`")]
    UnknownBiome(String),
    #[error("no blob with mass in [{min_mass}, {max_mass}] found after relaxing the window")]
    BlobSearchExhausted { min_mass: usize, max_mass: usize },
    #[error("invalid blob request: {0}")]
    InvalidBlobRequest(&'static str),
    #[error("{width}x{height} footprint is too small for a {shape} room")]
    RoomTooSmall { shape: &'static str, width: usize, height: usize },
    #[error("no connected ascend/descend pair could be placed")]
    StairsUnreachable,
    #[error("{unreachable} walkable cells are not reachable from the ascend stair")]
    Disconnected { unreachable: usize },
    #[error("level generation failed after {attempts} attempts: {last}")]
    AttemptsExhausted { attempts: u32, last: Box<GenerationError> },
}
