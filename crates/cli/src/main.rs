#![deny(unsafe_code)]
//! CLI binary for the warpfield particle/field simulation.
//!
//! Subcommands:
//! - `render <preset>`: run a preset scenario headlessly, write a PNG
//! - `replay <scenario.json>`: run a scenario file, write a PNG
//! - `list`: print available presets and entity kinds

mod error;

use clap::{Parser, Subcommand};
use error::CliError;
use std::path::{Path, PathBuf};
use std::process;
use warpfield_core::{
    RenderStyle, Renderer, RunSummary, Scenario, SimConfig, Simulation, SpawnKind, Srgb,
};
use warpfield_scenes::Raster;

#[derive(Parser)]
#[command(name = "warpfield", about = "Particle and field simulation CLI")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by every subcommand that writes an image.
#[derive(clap::Args)]
struct OutputArgs {
    /// Output file path.
    #[arg(short, long, default_value = "warpfield.png")]
    output: PathBuf,

    /// Background colour as #rrggbb.
    #[arg(long, default_value = "#05050f")]
    background: String,

    /// Skip the warp grid.
    #[arg(long)]
    no_grid: bool,

    /// Skip the overlay text and pointer ring.
    #[arg(long)]
    no_hud: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run a preset for N ticks and write a PNG snapshot of the last frame.
    Render {
        /// Preset name (e.g. "travel").
        preset: String,

        /// World width in pixels; overrides the config file.
        #[arg(short = 'W', long)]
        width: Option<f64>,

        /// World height in pixels; overrides the config file.
        #[arg(short = 'H', long)]
        height: Option<f64>,

        /// Number of simulation ticks.
        #[arg(short, long)]
        ticks: Option<u64>,

        /// PRNG seed for deterministic output; overrides the config file.
        #[arg(long)]
        seed: Option<u64>,

        /// World config as a JSON file; missing keys use defaults.
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        out: OutputArgs,
    },
    /// Run a scenario JSON file and write a PNG snapshot of the last frame.
    Replay {
        /// Scenario file path.
        scenario: PathBuf,

        #[command(flatten)]
        out: OutputArgs,
    },
    /// List available presets and entity kinds.
    List,
}

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn read_json(path: &Path) -> Result<serde_json::Value, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::Input(format!("invalid JSON in {}: {e}", path.display())))
}

fn load_config(
    path: Option<&Path>,
    width: Option<f64>,
    height: Option<f64>,
    seed: Option<u64>,
) -> Result<SimConfig, CliError> {
    let mut config = match path {
        Some(path) => SimConfig::from_json(&read_json(path)?),
        None => SimConfig::default(),
    };
    if let Some(width) = width {
        config.width = width;
    }
    if let Some(height) = height {
        config.height = height;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

/// A finished run and the size of the image written for it.
#[derive(Debug)]
struct Rendered {
    summary: RunSummary,
    width: usize,
    height: usize,
}

/// Simulates `scenario`, renders the final frame and writes it as PNG.
fn run_scenario(scenario: &Scenario, out: &OutputArgs) -> Result<Rendered, CliError> {
    let background = Srgb::from_hex(&out.background)?;
    let playback = scenario.simulate()?;

    let renderer = Renderer::new(RenderStyle {
        grid: !out.no_grid,
        hud: !out.no_hud,
        ..RenderStyle::default()
    });
    let scene = playback.world.scene();
    let mut raster = Raster::new(
        scene.bounds.x.ceil() as usize,
        scene.bounds.y.ceil() as usize,
        background,
    )?;
    renderer.render(&scene, &mut raster);
    warpfield_scenes::snapshot::write_png(&raster, &out.output)?;

    let summary = playback.summary();
    tracing::debug!(?summary, "run finished");
    Ok(Rendered {
        summary,
        width: raster.width(),
        height: raster.height(),
    })
}

fn report(json: bool, scenario: &Scenario, run: &Rendered, output: &Path) -> Result<(), CliError> {
    let summary = &run.summary;
    if json {
        let info = serde_json::json!({
            "scenario": scenario.name,
            "width": run.width,
            "height": run.height,
            "seed": scenario.config.seed,
            "summary": summary,
            "output": output.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        eprintln!(
            "rendered {} ({}x{}, {} ticks, seed {}) -> {}",
            scenario.name,
            run.width,
            run.height,
            summary.ticks,
            scenario.config.seed,
            output.display()
        );
        eprintln!(
            "  spawned {}, expired {}, peak {}, final entities {}, final sources {}, dropped {}",
            summary.total_spawned,
            summary.total_expired,
            summary.peak_entities,
            summary.final_entities,
            summary.final_sources,
            summary.dropped_commands
        );
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let presets = warpfield_scenes::list_presets();
            let kinds: Vec<_> = SpawnKind::ALL.iter().map(|k| k.name()).collect();
            if cli.json {
                let info = serde_json::json!({
                    "presets": presets,
                    "entity_kinds": kinds,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Presets:");
                for name in presets {
                    println!("  {name}");
                }
                println!("Entity kinds:");
                println!("  {}", kinds.join(", "));
            }
        }
        Command::Render {
            preset,
            width,
            height,
            ticks,
            seed,
            config,
            out,
        } => {
            let config = load_config(config.as_deref(), width, height, seed)?;
            let mut scenario = warpfield_scenes::from_name(&preset, config)?;
            if let Some(ticks) = ticks {
                scenario.truncate(ticks);
            }
            let rendered = run_scenario(&scenario, &out)?;
            report(cli.json, &scenario, &rendered, &out.output)?;
        }
        Command::Replay { scenario, out } => {
            let value = read_json(&scenario)?;
            let scenario: Scenario = serde_json::from_value(value).map_err(|e| {
                CliError::Input(format!("invalid scenario {}: {e}", scenario.display()))
            })?;
            let rendered = run_scenario(&scenario, &out)?;
            report(cli.json, &scenario, &rendered, &out.output)?;
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
