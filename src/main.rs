//! Homestead - headless settlement runner
//!
//! Loads a configuration and a layout, runs the tick pass, and logs how
//! much material the settlers have hauled into storage.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use homestead::city::StoreMode;
use homestead::core::error::Result;
use homestead::core::types::ResourceKind;
use homestead::core::SimulationConfig;
use homestead::ecs::world::World;
use homestead::simulation::tick::run_simulation_tick;
use homestead::simulation::SimulationEvent;
use homestead::world::LayoutLoader;

#[derive(Parser, Debug)]
#[command(name = "homestead")]
#[command(about = "Run a settlement of foraging workers headless")]
struct Args {
    /// Number of ticks to run
    #[arg(long, default_value_t = 2000)]
    ticks: u64,

    /// TOML simulation config (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON layout file (the built-in demo hamlet when omitted)
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Override the config seed
    #[arg(long)]
    seed: Option<u64>,

    /// Log a stock report every N ticks (0 disables)
    #[arg(long, default_value_t = 500)]
    report_every: u64,
}

#[derive(Debug, Default)]
struct EventTally {
    foraged: usize,
    deposited: usize,
    discarded: usize,
    piles_spent: usize,
}

impl EventTally {
    fn record(&mut self, event: &SimulationEvent) {
        match event {
            SimulationEvent::Foraged { .. } => self.foraged += 1,
            SimulationEvent::Deposited { .. } => self.deposited += 1,
            SimulationEvent::Discarded { .. } => self.discarded += 1,
            SimulationEvent::PileSpent { .. } => self.piles_spent += 1,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("homestead=info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load_from_toml(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let loader = LayoutLoader::new(config);
    let mut world = match &args.layout {
        Some(path) => loader.load_from_file(path)?,
        None => loader.load_demo()?,
    };

    tracing::info!("Homestead starting: {} ticks", args.ticks);

    let mut tally = EventTally::default();
    for _ in 0..args.ticks {
        for event in run_simulation_tick(&mut world) {
            tracing::debug!("{:?}", event);
            tally.record(&event);
        }
        if args.report_every > 0 && world.current_tick % args.report_every == 0 {
            report(&world, &tally);
        }
    }

    report(&world, &tally);
    Ok(())
}

fn report(world: &World, tally: &EventTally) {
    tracing::info!(
        "Tick {}: {} loads foraged, {} deposited, {} discarded, {} piles decayed",
        world.current_tick,
        tally.foraged,
        tally.deposited,
        tally.discarded,
        tally.piles_spent
    );
    for resource in ResourceKind::ALL {
        let stored: f32 = world
            .structures
            .iter()
            .filter(|s| s.store_mode() == Some(StoreMode::Warehouse))
            .filter_map(|s| s.store())
            .map(|store| store.get_actual_contents(Some(resource)))
            .sum();
        if stored > 0.0 {
            tracing::info!("  {} in storage: {:.2}", resource, stored);
        }
    }
}
