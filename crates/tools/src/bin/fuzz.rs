use std::collections::{BTreeMap, VecDeque};
use std::io;

use anyhow::{Result, bail};
use clap::Parser;
use levelgen::{Catalog, Category, GenRng, Level, LevelGenerator, Pos};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Generate many levels and report failures", long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 200)]
    levels: u32,
    #[arg(long, default_value_t = 10)]
    max_depth: u32,
}

fn around(pos: Pos) -> impl Iterator<Item = Pos> {
    (-1..=1)
        .flat_map(move |dy| (-1..=1).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| dx != 0 || dy != 0)
        .map(move |(dx, dy)| pos.offset(dx, dy))
}

fn violation(level: &Level) -> Option<String> {
    let index = |pos: Pos| (pos.y as usize) * level.width + pos.x as usize;
    if level.count_category(Category::AscendStair) != 1 {
        return Some("ascend stair count is wrong".to_string());
    }
    let ascend = level.ascend?;
    let mut seen = vec![false; level.width * level.height];
    seen[index(ascend)] = true;
    let mut queue = VecDeque::from([ascend]);
    while let Some(current) = queue.pop_front() {
        for next in around(current) {
            if level.in_bounds(next) && level.is_walkable_and_safe(next) && !seen[index(next)] {
                seen[index(next)] = true;
                queue.push_back(next);
            }
        }
    }
    for pos in level.positions() {
        let category = level.category_at(pos);
        let on_edge =
            pos.x == 0 || pos.y == 0 || pos.x as usize == level.width - 1 || pos.y as usize == level.height - 1;
        if on_edge && category != Category::MapBorder {
            return Some(format!("border broken at {pos:?}"));
        }
        let structural = !matches!(category, Category::Void | Category::MapBorder);
        if structural && level.is_walkable_and_safe(pos) && !seen[index(pos)] {
            return Some(format!("{pos:?} unreachable from the ascend stair"));
        }
        if category == Category::Door && around(pos).any(|n| level.category_at(n) == Category::Door) {
            return Some(format!("door at {pos:?} touches another door"));
        }
    }
    None
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let catalog = Catalog::builtin()?;
    let biomes: Vec<String> = catalog.biomes.iter().map(|biome| biome.id.clone()).collect();
    let mut picker = GenRng::from_seed(args.seed);
    let mut failures: BTreeMap<String, u32> = BTreeMap::new();
    let mut rooms_total = 0_usize;

    for index in 0..args.levels {
        let run_seed = picker.next_u64();
        let Some(biome) = picker.choose(&biomes) else {
            bail!("catalog has no biomes");
        };
        let depth = picker.range_usize(1, args.max_depth.max(1) as usize) as u32;
        let generator = LevelGenerator::new(catalog.clone(), run_seed);
        match generator.generate(biome, depth) {
            Ok(level) => {
                rooms_total += level.rooms.len();
                if let Some(reason) = violation(&level) {
                    bail!("{biome} depth {depth} seed {run_seed}: {reason}");
                }
            }
            Err(error) => {
                warn!(index, biome = %biome, depth, run_seed, %error, "generation failed");
                *failures.entry(biome.clone()).or_default() += 1;
            }
        }
    }

    let failed: u32 = failures.values().sum();
    info!(levels = args.levels, failed, rooms_total, "fuzz run finished");
    println!("{} levels, {} failed, {} rooms placed", args.levels, failed, rooms_total);
    for (biome, count) in &failures {
        println!("  {biome}: {count} failures");
    }
    if failed > 0 {
        bail!("{failed} levels failed to generate");
    }
    Ok(())
}
