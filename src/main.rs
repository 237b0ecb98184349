use gravwell::{bench_gravity, bench_tick};
use gravwell::{ScenarioConfig, SimulationEngine, SimulationPreset};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PresetArg {
    Solar,
    Binary,
    Galaxy,
    Empty,
}

impl From<PresetArg> for SimulationPreset {
    fn from(p: PresetArg) -> Self {
        match p {
            PresetArg::Solar => SimulationPreset::SolarSystem,
            PresetArg::Binary => SimulationPreset::BinaryStars,
            PresetArg::Galaxy => SimulationPreset::GalaxyCollision,
            PresetArg::Empty => SimulationPreset::Empty,
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Newtonian N-body sandbox with a gravity-well grid")]
struct Args {
    /// YAML scenario to load instead of a preset
    #[arg(short, long)]
    file: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "solar")]
    preset: PresetArg,

    /// Run without a window
    #[arg(long)]
    headless: bool,

    /// Ticks to run in headless mode
    #[arg(short, long, default_value_t = 1000)]
    ticks: u64,

    /// Write the final state here (headless mode)
    #[arg(long)]
    save: Option<PathBuf>,

    /// Run the benchmarks and exit
    #[arg(long)]
    bench: bool,
}

// load here to keep main clean
fn build_engine(args: &Args) -> Result<SimulationEngine> {
    let Some(path) = &args.file else {
        return Ok(SimulationEngine::with_preset(args.preset.into()));
    };

    let scenario = ScenarioConfig::load(path).with_context(|| format!("failed to load scenario {}", path.display()))?;
    let mut engine = SimulationEngine::default();
    engine
        .load_custom_preset(&scenario)
        .with_context(|| format!("invalid scenario {}", path.display()))?;
    Ok(engine)
}

fn run_headless(mut engine: SimulationEngine, args: &Args) -> Result<()> {
    info!(bodies = engine.body_count(), ticks = args.ticks, "headless run");

    let start_energy = engine.total_energy();
    for _ in 0..args.ticks {
        engine.tick(1.0 / 60.0);
    }

    let com = engine.center_of_mass();
    let energy = engine.total_energy();
    info!(
        bodies = engine.body_count(),
        com = ?[com.x, com.y, com.z],
        energy,
        drift = energy - start_energy,
        "headless run finished"
    );

    if let Some(path) = &args.save {
        engine
            .save_state(path)
            .with_context(|| format!("failed to save state to {}", path.display()))?;
    }

    Ok(())
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.bench {
        init_logging();
        bench_gravity();
        bench_tick();
        return Ok(());
    }

    #[cfg(feature = "viewer")]
    if !args.headless {
        // Bevy's LogPlugin installs the subscriber
        let engine = build_engine(&args)?;
        gravwell::run_3d(engine);
        return Ok(());
    }

    init_logging();
    let engine = build_engine(&args)?;
    run_headless(engine, &args)
}
