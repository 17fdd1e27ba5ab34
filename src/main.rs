use anyhow::{Context, Result};
use clap::Parser;
use ecosteer_core::config::AppConfig;
use ecosteer_core::metrics::init_logging;
use ecosteer_lib::sim::World;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path; built-in species are used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 1200)]
    ticks: u64,

    /// Agents spawned per species
    #[arg(short, long, default_value_t = 24)]
    population: usize,

    /// Only spawn these species (repeatable)
    #[arg(short, long)]
    species: Vec<String>,

    /// Override the engine seed
    #[arg(long)]
    seed: Option<u64>,

    /// Load herd components from this file before running, save them after
    #[arg(long)]
    save: Option<PathBuf>,

    /// Print a report every N ticks (0 disables)
    #[arg(long, default_value_t = 200)]
    report_every: u64,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            AppConfig::from_toml(&content)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => AppConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.engine.seed = seed;
    }
    Ok(config)
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let config = load_config(&args)?;

    let mut world = World::new(config)?;
    tracing::info!(fingerprint = %world.fingerprint(), "Configuration loaded");

    if args.species.is_empty() {
        world.populate(args.population)?;
    } else {
        for name in &args.species {
            world.spawn_herd(name, args.population)?;
        }
    }

    if let Some(path) = args.save.as_ref().filter(|p| p.exists()) {
        world.load_components(path)?;
    }

    for _ in 0..args.ticks {
        world.step();
        if args.report_every > 0 && world.tick % args.report_every == 0 {
            for line in &world.report().species {
                tracing::info!(
                    tick = world.tick,
                    species = %line.name,
                    alive = line.alive,
                    moving = line.moving,
                    mean_speed = line.mean_speed,
                    spread = line.spread,
                    "Herd report"
                );
            }
        }
    }

    if let Some(path) = &args.save {
        world.save_components(path)?;
    }

    let report = world.report();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "tick {}: {} agents, {} rules evaluated, {} quorum denials, {} leader changes",
            report.tick,
            report.agents,
            report.rules_evaluated,
            report.quorum_denials,
            report.leader_changes
        );
        for line in &report.species {
            println!(
                "  {:<10} alive {:>4}  moving {:>4}  mean speed {:.3}  spread {:.2}",
                line.name, line.alive, line.moving, line.mean_speed, line.spread
            );
        }
    }
    Ok(())
}
