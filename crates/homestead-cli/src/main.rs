//! # Homestead CLI
//!
//! Command-line driver for Homestead world generation.
//!
//! Subcommands:
//! - `parcel`: generate the parcel for one registration
//! - `spiral`: list spiral cells in allocation order
//! - `price`: price a parcel and show the factor breakdown
//! - `zones`: render a district zone table
//! - `stream`: walk a viewer across the world and report chunk streaming

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use homestead_common::{SeededRandom, WorldConfig, WorldPos, CONFIG_FILE};
use homestead_world::{ChunkStreamCache, ContentGenerator, DeferredBuilder, StreamUpdate};
use homestead_worldgen::{
    generate_zone_map_with_noise, price_with_base, ring_capacity, sub_zone_pure, ParcelGenerator,
    PriceFactors, PriceInputs, SpiralTable,
};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "homestead")]
#[command(about = "Deterministic homestead world generation and chunk streaming")]
struct Cli {
    /// World config file (defaults to ./homestead.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the parcel for one registration
    Parcel {
        /// World id
        #[arg(long, default_value = "world")]
        world: String,
        /// Owner id
        #[arg(long)]
        owner: String,
        /// Owner display name
        #[arg(long)]
        name: String,
        /// 1-based registration order
        #[arg(long)]
        order: u64,
    },
    /// List spiral cells in allocation order
    Spiral {
        /// Number of cells to list
        #[arg(short = 'n', long, default_value = "16")]
        count: usize,
    },
    /// Price a parcel
    Price {
        /// Ring of the parcel
        #[arg(long)]
        ring: u32,
        /// Parcels registered across the world
        #[arg(long, default_value = "0")]
        empire: u64,
        /// Parcels already sold in the ring
        #[arg(long, default_value = "0")]
        ring_sold: u64,
        /// Parcels the buyer owns
        #[arg(long, default_value = "0")]
        owned: u64,
    },
    /// Render a district zone table
    Zones {
        /// Table side length (defaults to the configured size)
        #[arg(long)]
        size: Option<u32>,
        /// Seed string for boundary noise
        #[arg(long, default_value = "homestead")]
        seed: String,
        /// Render the noise-free lookup around the origin instead
        #[arg(long)]
        pure: bool,
    },
    /// Walk the viewer along +X and report streaming
    Stream {
        /// Number of steps
        #[arg(long, default_value = "8")]
        steps: u32,
        /// World units per step
        #[arg(long, default_value = "16.0")]
        step: f64,
        /// Starting Z position
        #[arg(long, default_value = "8.0")]
        z: f64,
        /// Build chunks on worker threads
        #[arg(long)]
        deferred: bool,
        /// Worker threads for deferred builds
        #[arg(long, default_value = "4")]
        workers: usize,
    },
}

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("homestead=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?.install()?;
    debug!("Running {:?}", cli.command);

    match cli.command {
        Command::Parcel {
            world,
            owner,
            name,
            order,
        } => {
            let gen = ParcelGenerator::from_config(config)?;
            let parcel = gen.generate(&world, &owner, &name, order);
            println!("{}", serde_json::to_string_pretty(&parcel)?);
        },
        Command::Spiral { count } => {
            let table = SpiralTable::get(config.grid_size);
            for (i, pos) in table.positions().iter().take(count).enumerate() {
                let ring = homestead_worldgen::ring(*pos, config.grid_size);
                println!("{:>5}  ({:>3}, {:>3})  ring {ring}", i + 1, pos.x, pos.y);
            }
        },
        Command::Price {
            ring,
            empire,
            ring_sold,
            owned,
        } => {
            let inputs = PriceInputs {
                ring,
                empire_total_parcels: empire,
                ring_sold,
                ring_total: u64::from(ring_capacity(ring, config.grid_size)),
                owner_parcel_count: owned,
            };
            let f = PriceFactors::compute(&inputs);
            println!(
                "distance {:.3}  growth {:.3}  scarcity {:.3}  hoard {:.3}",
                f.distance, f.growth, f.scarcity, f.hoard
            );
            println!("price {}", price_with_base(config.base_price, &inputs));
        },
        Command::Zones { size, seed, pure } => {
            let size = size.unwrap_or(config.zone_table_size);
            if pure {
                print!("{}", render_pure_zones(size));
            } else {
                let mut rng = SeededRandom::from_seed_str(&seed);
                print!("{}", generate_zone_map_with_noise(size, &mut rng).render_ascii());
            }
        },
        Command::Stream {
            steps,
            step,
            z,
            deferred,
            workers,
        } => walk(config, steps, step, z, deferred.then_some(workers))?,
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<WorldConfig> {
    match path {
        Some(path) => WorldConfig::load_from(path)
            .with_context(|| format!("loading {}", path.display())),
        None if Path::new(CONFIG_FILE).exists() => {
            WorldConfig::load_from(CONFIG_FILE).with_context(|| format!("loading {CONFIG_FILE}"))
        },
        None => Ok(WorldConfig::default()),
    }
}

/// Glyph grid of the noise-free lookup, centred on chunk (0, 0).
fn render_pure_zones(size: u32) -> String {
    let half = (size / 2) as i32;
    let mut out = String::with_capacity((size * (size + 1)) as usize);
    for z in 0..size as i32 {
        for x in 0..size as i32 {
            out.push(sub_zone_pure(x - half, z - half).glyph());
        }
        out.push('\n');
    }
    out
}

fn walk(config: &WorldConfig, steps: u32, step: f64, z: f64, workers: Option<usize>) -> Result<()> {
    let mut cache = ChunkStreamCache::from_world_config(config)?;
    let gen = ContentGenerator::from_world_config(config);
    let positions = (0..=steps).map(|i| WorldPos::new(f64::from(i) * step, z));

    if let Some(workers) = workers {
        let mut source = DeferredBuilder::new(workers, move |coord| {
            Ok::<_, std::convert::Infallible>(gen.generate_chunk(coord))
        })?;
        for pos in positions {
            let update = cache.set_viewer_position(&mut source, pos);
            let delivered = source.settle(&mut cache, Duration::from_secs(5));
            report(&update, cache.loaded_count(), delivered);
        }
        cache.invalidate_all(&mut source);
    } else {
        let mut source = gen;
        for pos in positions {
            let update = cache.set_viewer_position(&mut source, pos);
            report(&update, cache.loaded_count(), 0);
        }
        cache.invalidate_all(&mut source);
    }

    let stats = cache.stats();
    info!(
        "Stream finished: requested {}, built {}, disposed {}, failed {}, late {}",
        stats.builds_requested, stats.built, stats.disposed, stats.failed, stats.late_disposed
    );
    Ok(())
}

fn report(update: &StreamUpdate, resident: usize, delivered: usize) {
    println!(
        "chunk {}  +{} built  {} requested  {} delivered  -{} disposed  {} failed  resident {resident}",
        update.center,
        update.built.len(),
        update.requested.len(),
        delivered,
        update.disposed.len(),
        update.failed.len(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_stream_flags() {
        let cli = Cli::parse_from(["homestead", "stream", "--deferred", "--workers", "2"]);
        assert!(matches!(
            cli.command,
            Command::Stream {
                deferred: true,
                workers: 2,
                steps: 8,
                ..
            }
        ));
    }

    #[test]
    fn test_pure_zone_render_shape() {
        let text = render_pure_zones(6);
        assert_eq!(text.lines().count(), 6);
        assert!(text.lines().all(|l| l.chars().count() == 6));
        // Market Square sits on chunk (0, 0), centre of the grid.
        assert_eq!(text.lines().nth(3).and_then(|l| l.chars().nth(3)), Some('C'));
    }
}
