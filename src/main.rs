use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use typescape::scene::RotationPolicy;
use typescape::{SceneConfig, TypescapeApp};

#[derive(Parser, Debug)]
#[command(name = "typescape")]
#[command(about = "Extruded 3D text among spinning shapes, with a live control panel")]
struct Cli {
    /// TOML config; defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Typeface JSON file, overrides `[font] path`
    #[arg(long)]
    font: Option<PathBuf>,

    /// Seed for the shape layout, overrides `[scene] seed`
    #[arg(long)]
    seed: Option<u64>,

    /// Derive rotations from elapsed time instead of accumulating per frame
    #[arg(long)]
    time_driven: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SceneConfig::default(),
    };
    if let Some(font) = cli.font {
        config.font.path = font;
    }
    if cli.seed.is_some() {
        config.scene.seed = cli.seed;
    }
    if cli.time_driven {
        config.scene.rotation_policy = RotationPolicy::TimeDriven;
    }

    info!(
        "Starting typescape ({:?} rotation, seed {:?})",
        config.scene.rotation_policy, config.scene.seed
    );
    TypescapeApp::new(config)?.run()?;
    Ok(())
}
