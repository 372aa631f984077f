//! burst-sim: runs the particle burst simulation headless

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use burst_engine::config::get_config;
use burst_engine::Simulation;

#[derive(Parser, Debug)]
#[command(name = "burst-sim", version, about = "Skinned mesh particle burst simulation")]
struct Cli {
    /// Directory holding input.txt and the files it references
    data_dir: PathBuf,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 600)]
    ticks: usize,

    /// Seed for reproducible particle colors and damping
    #[arg(short, long)]
    seed: Option<u64>,

    /// Start paused (ticks do not advance the simulation)
    #[arg(long)]
    paused: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = get_config();
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let mut simulation = Simulation::load(&cli.data_dir, config)
        .with_context(|| format!("Failed to load scene from {}", cli.data_dir.display()))?;
    simulation.set_running(!cli.paused);

    let fps = simulation.config().animation_fps.max(1.0) as usize;
    let mut exploding_ticks = 0usize;
    for tick in 0..cli.ticks {
        let exploding = simulation
            .tick()
            .with_context(|| format!("Simulation failed at tick {}", tick))?;
        if exploding {
            exploding_ticks += 1;
        }
        if tick % fps == 0 {
            log::info!(
                "t={:.2}, 爆散={}, 帧={}",
                simulation.time(),
                exploding,
                simulation.frame()
            );
        }
    }

    log::info!(
        "模拟结束: {} 步 (爆散 {} 步), {} 个粒子",
        cli.ticks,
        exploding_ticks,
        simulation.particles().len()
    );
    Ok(())
}
