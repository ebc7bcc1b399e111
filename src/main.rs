//! BrickForge command-line tool
//!
//! ```bash
//! # Export every part of a model into ./export_output/<Color>/
//! brickforge house.ldr
//!
//! # Also write the build manual, with a parts library
//! brickforge house.mpd out/ --instructions --library ~/ldraw
//! ```

use anyhow::Context;
use brickforge::{init_logging, run, MeshScene, RunRequest, SceneOptions, BUILD_DATE, VERSION};
use brickforge_settings::Config;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

/// Convert a brick model into color-bucketed print meshes and a build manual
#[derive(Parser, Debug)]
#[command(name = "brickforge")]
#[command(version, about, long_about = None)]
struct Args {
    /// Model file (.ldr, .mpd, .dat or .obj)
    input: PathBuf,

    /// Output directory
    #[arg(default_value = "export_output")]
    output: PathBuf,

    /// Generate the step-by-step manual
    #[arg(long)]
    instructions: bool,

    /// Config file (.toml or .json); defaults to the user config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// LDraw parts library root
    #[arg(long, value_name = "DIR")]
    library: Option<PathBuf>,

    /// Parts per synthesized step
    #[arg(long, value_name = "N")]
    batch_size: Option<usize>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, value_name = "L")]
    log_level: Option<String>,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl Args {
    /// Apply flag overrides on top of the loaded config
    fn apply(&self, config: &mut Config) {
        if let Some(library) = &self.library {
            config.library.path = Some(library.clone());
        }
        if let Some(batch_size) = self.batch_size {
            config.steps.batch_size = batch_size;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.log_json {
            config.logging.json = true;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (mut config, source) =
        Config::load_or_default(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    init_logging(&config.logging.level, config.logging.json)?;
    info!("BrickForge {} (built {})", VERSION, BUILD_DATE);
    if let Some(source) = source {
        debug!("Using config {}", source.display());
    }

    let mut engine = MeshScene::new(SceneOptions {
        library: config.library.path.clone(),
    });
    let request = RunRequest {
        input: args.input,
        output: args.output,
        instructions: args.instructions,
    };
    run(&mut engine, &request, &config)?;

    Ok(())
}
