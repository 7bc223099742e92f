//! Level generation entry point: attempt loop, seeding and progress reporting.

mod pipeline;

use tracing::{info, info_span, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::catalog::Catalog;
use crate::error::GenerationError;
use crate::level::Level;
use crate::rng::{GenRng, derive_level_seed};

use super::hooks::{HookRegistry, TerrainHook, builtin_hooks};
use super::population;
use super::session::GenerationSession;
use super::tunnels::StepCosts;

/// Pipeline stages in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Earth,
    Rooms,
    Tunnels,
    Terrain,
    Stairs,
    Entities,
}

impl Stage {
    pub const ALL: [Stage; 6] =
        [Stage::Earth, Stage::Rooms, Stage::Tunnels, Stage::Terrain, Stage::Stairs, Stage::Entities];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Earth => "earth",
            Stage::Rooms => "rooms",
            Stage::Tunnels => "tunnels",
            Stage::Terrain => "terrain",
            Stage::Stairs => "stairs",
            Stage::Entities => "entities",
        }
    }
}

/// Called after every stage of every attempt with the level as it stands.
pub trait ProgressObserver {
    fn stage_completed(&mut self, stage: Stage, level: &Level);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn stage_completed(&mut self, _stage: Stage, _level: &Level) {}
}

pub struct LevelGenerator {
    catalog: Catalog,
    run_seed: u64,
    hooks: HookRegistry,
    costs: StepCosts,
}

impl LevelGenerator {
    pub fn new(catalog: Catalog, run_seed: u64) -> Self {
        Self { catalog, run_seed, hooks: builtin_hooks(), costs: StepCosts::default() }
    }

    /// Registers (or replaces) the hook terrains refer to as `name`.
    pub fn with_hook(mut self, name: impl Into<String>, hook: impl TerrainHook + 'static) -> Self {
        self.hooks.insert(name.into(), Box::new(hook));
        self
    }

    pub fn with_step_costs(mut self, costs: StepCosts) -> Self {
        self.costs = costs;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn run_seed(&self) -> u64 {
        self.run_seed
    }

    pub fn generate(&self, biome: &str, depth: u32) -> Result<Level, GenerationError> {
        self.generate_with_progress(biome, depth, &mut NoProgress)
    }

    /// Runs whole attempts with fresh derived seeds until one passes the
    /// connectivity check or the attempt limit is hit.
    pub fn generate_with_progress(
        &self,
        biome_id: &str,
        depth: u32,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Level, GenerationError> {
        let biome = self
            .catalog
            .biome(biome_id)
            .ok_or_else(|| GenerationError::UnknownBiome(biome_id.to_string()))?;
        let span = info_span!("generate_level", biome = biome_id, depth, seed = self.run_seed);
        let _guard = span.enter();

        let biome_code = xxh3_64(biome.id.as_bytes());
        let attempts = self.catalog.limits.level_attempts;
        let mut last_error = GenerationError::StairsUnreachable;
        for attempt in 0..attempts {
            let seed = derive_level_seed(self.run_seed, depth, biome_code, attempt);
            let session = GenerationSession::new(&self.catalog, biome, depth, seed);
            match pipeline::run(session, &self.hooks, self.costs, observer) {
                Ok(level) => {
                    info!(
                        attempt,
                        rooms = level.rooms.len(),
                        monsters = level.starting_monster_count,
                        fingerprint = level.fingerprint(),
                        "level generated"
                    );
                    return Ok(level);
                }
                Err(error) => {
                    warn!(attempt, %error, "generation attempt discarded");
                    last_error = error;
                }
            }
        }
        Err(GenerationError::AttemptsExhausted { attempts, last: Box::new(last_error) })
    }

    /// Mid-game monster refill for a level this generator produced.
    /// Returns the number of monsters spawned.
    pub fn respawn(
        &self,
        level: &mut Level,
        biome_id: &str,
        turns_since_last: u32,
        rng: &mut GenRng,
    ) -> Result<usize, GenerationError> {
        let biome = self
            .catalog
            .biome(biome_id)
            .ok_or_else(|| GenerationError::UnknownBiome(biome_id.to_string()))?;
        Ok(population::respawn(level, &self.catalog, biome, turns_since_last, rng))
    }
}

pub fn generate_level(
    catalog: &Catalog,
    run_seed: u64,
    biome: &str,
    depth: u32,
) -> Result<Level, GenerationError> {
    LevelGenerator::new(catalog.clone(), run_seed).generate(biome, depth)
}
