use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use glade_common::{ConnectionId, ObjectId, Position};
use glade_kernel::objs::{AreaParams, Butterfly, FlowerSpawnArea};
use glade_kernel::{KindCatalog, PlayerFlag, World, WorldConfig};
use glade_persist::SnapshotStore;

#[derive(Parser)]
#[command(name = "glade-cli", about = "CLI tool for glade world operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Run a short simulation and print per-phase world state
    Simulate {
        /// Number of ticks to run
        #[arg(short, long, default_value = "20")]
        ticks: u64,
        /// Number of players to join
        #[arg(short, long, default_value = "3")]
        players: usize,
        /// RNG seed for deterministic runs
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
    /// Simulate, then write a snapshot into a store directory
    Save {
        /// Store directory
        path: std::path::PathBuf,
        /// Ticks to simulate before saving
        #[arg(short, long, default_value = "20")]
        ticks: u64,
        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
    /// Restore the latest snapshot from a store directory
    Load {
        /// Store directory
        path: std::path::PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("glade-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "kernel: tick={}",
                World::new(WorldConfig::default()).tick_count()
            );
            println!("persist: {}", glade_persist::crate_info());
            print!("kinds:");
            for kind in KindCatalog::builtin().kinds() {
                print!(" {kind}");
            }
            println!();
        }
        Commands::Simulate {
            ticks,
            players,
            seed,
        } => {
            let world = simulate(ticks, players, seed);
            println!(
                "After {} ticks: {} objects, {} players",
                world.tick_count(),
                world.object_count(),
                world.player_count()
            );
            for record in world.snapshot() {
                println!("  {} {} {:?}", record.kind, record.id.0, record.data);
            }
        }
        Commands::Save { path, ticks, seed } => {
            let world = simulate(ticks, 2, seed);
            let mut store = SnapshotStore::open(&path)?;
            store.take_snapshot(&world)?;
            println!(
                "Saved snapshot #{} at tick {} ({} objects) to {}",
                store.meta().snapshot_count,
                world.tick_count(),
                world.object_count(),
                path.display()
            );
        }
        Commands::Load { path } => {
            let store = SnapshotStore::open(&path)?;
            store.verify_integrity()?;
            let world = store.restore_latest(&KindCatalog::builtin(), WorldConfig::default())?;
            println!(
                "Restored tick {}: {} objects, {} players",
                world.tick_count(),
                world.object_count(),
                world.player_count()
            );
        }
    }

    Ok(())
}

/// Run a demo world: a flower patch, a butterfly, joining players, and a
/// pickup halfway through.
fn simulate(ticks: u64, players: usize, seed: u64) -> World {
    let mut world = World::with_seed(WorldConfig::default(), seed);

    world
        .spawn(Box::new(FlowerSpawnArea::new(
            ObjectId::new(),
            Position::ORIGIN,
            AreaParams::default(),
        )))
        .expect("fresh world accepts the patch");
    world
        .spawn(Box::new(Butterfly::new(
            ObjectId::new(),
            Position::new(1.0, 1.0),
        )))
        .expect("fresh world accepts the butterfly");

    // Join through the intent queue, the way connection contexts do.
    let queue = world.intents();
    let ids: Vec<ObjectId> = (0..players)
        .map(|i| queue.join(ConnectionId::new(), format!("player-{i}")))
        .collect();

    for tick in 0..ticks {
        if tick == ticks / 2 {
            if let Some(first) = ids.first() {
                queue.drop_item(*first, "acorn");
                queue.set_flag(*first, PlayerFlag::Interacting, true);
            }
        }
        world.tick();
    }
    world
}
