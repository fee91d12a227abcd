use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flock_core::{Director, Tap, World, WorldConfig};
use glam::Vec3;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const WARMUP_TICKS: u64 = 50;
const BENCHMARK_TICKS: u64 = 500;
/// Radians the scripted focal target moves per tick.
const ORBIT_RATE: f32 = 0.01;
const ORBIT_RADIUS: f32 = 0.05;
const ORBIT_HEIGHT: f32 = 0.05;

#[derive(Parser)]
#[command(name = "flock")]
#[command(about = "Headless boid flock runner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted session and report a summary
    Run {
        /// Path to config file (JSON); defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of ticks to simulate
        #[arg(long, default_value_t = 3000)]
        ticks: u64,

        /// Output directory for summary.json (optional)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Tap the focal target every N ticks (0 disables)
        #[arg(long, default_value_t = 0)]
        tap_every: u64,

        /// Advance the world state every N ticks (0 disables)
        #[arg(long, default_value_t = 600)]
        advance_every: u64,
    },
    /// Measure average tick time for several flock sizes
    Benchmark,
    /// Dump the default configuration to stdout
    DumpDefaultConfig,
}

/// Focal target circling above home, standing in for a tracked pointer.
fn orbit(home: Vec3, tick: u64) -> Vec3 {
    let angle = tick as f32 * ORBIT_RATE;
    home + Vec3::new(
        ORBIT_RADIUS * angle.cos(),
        ORBIT_HEIGHT,
        ORBIT_RADIUS * angle.sin(),
    )
}

fn load_config(path: Option<&PathBuf>) -> Result<WorldConfig> {
    let Some(path) = path else {
        return Ok(WorldConfig::default());
    };
    let file = File::open(path).with_context(|| format!("failed to open config file {path:?}"))?;
    let config: WorldConfig =
        serde_json::from_reader(BufReader::new(file)).context("failed to parse config")?;
    Ok(config)
}

fn run_session(
    config: WorldConfig,
    ticks: u64,
    tap_every: u64,
    advance_every: u64,
) -> Result<World> {
    let home = config.home;
    let world = World::new(config).context("config validation error")?;
    let mut director = Director::new(world);
    director.long_press();

    for tick in 1..=ticks {
        if advance_every > 0 && tick % advance_every == 0 {
            director.long_press();
        }
        if tap_every > 0 && tick % tap_every == 0 {
            let report = director.tap(Tap::Focal);
            if !report.died.is_empty() {
                info!(tick, died = ?report.died, "agents died");
            }
        }
        director.tick(orbit(home, tick));
    }
    Ok(director.into_world())
}

fn run_benchmark(agent_count: usize) -> Result<()> {
    let config = WorldConfig {
        agent_count,
        spatial_half_extent: 0.5,
        ..WorldConfig::default()
    };
    let home = config.home;
    let origin = config.spawn_origin;
    let mut world = World::new(config).context("benchmark config validation error")?;
    while world.spawn_next(origin).is_some() {}
    world.advance_world_state();

    for tick in 0..WARMUP_TICKS {
        world.tick(orbit(home, tick));
    }

    let mut total_index = 0u64;
    let mut total_targets = 0u64;
    let mut total_update = 0u64;
    let mut total_time = 0u64;
    for tick in WARMUP_TICKS..WARMUP_TICKS + BENCHMARK_TICKS {
        world.tick(orbit(home, tick));
        let t = world.last_timings();
        total_index += t.index_build_us;
        total_targets += t.target_resolve_us;
        total_update += t.agent_update_us;
        total_time += t.total_us;
    }

    let n = BENCHMARK_TICKS as f64;
    let avg_tick_us = total_time as f64 / n;
    println!("--- {agent_count} agents ---");
    println!(
        "  Avg tick:      {avg_tick_us:.1} us ({:.0} ticks/sec)",
        1_000_000.0 / avg_tick_us.max(f64::EPSILON)
    );
    println!(
        "  Breakdown:     index={:.1} us, targets={:.1} us, update={:.1} us",
        total_index as f64 / n,
        total_targets as f64 / n,
        total_update as f64 / n,
    );
    println!();
    Ok(())
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
    let cli = Cli::parse();

    match cli.command {
        Commands::DumpDefaultConfig => {
            let config = WorldConfig::default();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Benchmark => {
            if cfg!(debug_assertions) {
                eprintln!("WARNING: running in debug mode. Results are not representative.");
                eprintln!("         Use: cargo run -p flock-cli --release -- benchmark");
                eprintln!();
            }
            println!("Warmup: {WARMUP_TICKS} ticks, Benchmark: {BENCHMARK_TICKS} ticks");
            println!();
            for agent_count in [5, 25, 100, 400] {
                run_benchmark(agent_count)?;
            }
        }
        Commands::Run {
            config,
            ticks,
            out,
            tap_every,
            advance_every,
        } => {
            let world_config = load_config(config.as_ref())?;
            println!("Simulating {} agents for {ticks} ticks...", world_config.agent_count);

            let world = run_session(world_config, ticks, tap_every, advance_every)?;
            let summary = world.summary();

            if let Some(out_dir) = out {
                std::fs::create_dir_all(&out_dir).context("failed to create output directory")?;
                let summary_path = out_dir.join("summary.json");
                let file = File::create(summary_path).context("failed to create summary file")?;
                serde_json::to_writer_pretty(file, &summary).context("failed to write summary")?;
                println!("Run complete. Results saved to {out_dir:?}");
            } else {
                let dead = summary.phases.dead;
                let state = summary.world_state;
                println!(
                    "Run complete. State: {state:?}, spawned: {}, dead: {dead}, mean spacing: {:.4}",
                    summary.spawned, summary.mean_spacing
                );
            }
        }
    }
    Ok(())
}
