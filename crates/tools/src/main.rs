use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use levelgen::{Catalog, Entity, Level, LevelGenerator, PlacedRoom, Pos, ProgressObserver, Stage};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Generate one level and print it", long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value = "dungeon")]
    biome: String,
    #[arg(short, long, default_value_t = 1)]
    depth: u32,
    /// Catalog TOML to use instead of the built-in one
    #[arg(short, long)]
    catalog: Option<PathBuf>,
    /// Print the map after every pipeline stage
    #[arg(long)]
    progress: bool,
    /// Emit a JSON description instead of the ASCII map
    #[arg(long)]
    json: bool,
}

struct StagePrinter;

impl ProgressObserver for StagePrinter {
    fn stage_completed(&mut self, stage: Stage, level: &Level) {
        println!("== {} ==", stage.name());
        print!("{}", level.to_ascii());
    }
}

#[derive(Serialize)]
struct LevelSummary<'a> {
    biome: &'a str,
    depth: u32,
    seed: u64,
    width: usize,
    height: usize,
    fingerprint: String,
    ascend: Option<Pos>,
    descend: Option<Pos>,
    rooms: &'a [PlacedRoom],
    entities: Vec<&'a Entity>,
    map: Vec<&'a str>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let catalog = match &args.catalog {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("Failed to load catalog: {}", path.display()))?,
        None => Catalog::builtin().context("Built-in catalog is invalid")?,
    };
    let generator = LevelGenerator::new(catalog, args.seed);

    let level = if args.progress && !args.json {
        generator.generate_with_progress(&args.biome, args.depth, &mut StagePrinter)
    } else {
        generator.generate(&args.biome, args.depth)
    }
    .with_context(|| format!("Failed to generate {} at depth {}", args.biome, args.depth))?;

    if args.json {
        let ascii = level.to_ascii();
        let summary = LevelSummary {
            biome: &level.biome,
            depth: level.depth,
            seed: args.seed,
            width: level.width,
            height: level.height,
            fingerprint: format!("{:016x}", level.fingerprint()),
            ascend: level.ascend,
            descend: level.descend,
            rooms: &level.rooms,
            entities: level.entities().map(|(_, entity)| entity).collect(),
            map: ascii.lines().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if !args.progress {
        print!("{}", level.to_ascii());
    }
    println!(
        "{} depth {} | seed {} | {} rooms | {} monsters | fingerprint {:016x}",
        level.biome,
        level.depth,
        args.seed,
        level.rooms.len(),
        level.starting_monster_count,
        level.fingerprint()
    );
    Ok(())
}
