//! Fly Swarm Runtime
//!
//! Binary that loads settings, opens a window and drives the
//! simulate / cull / draw pipeline once per frame.

mod app;
mod headless;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use swarm_services::Settings;
use winit::event_loop::{ControlFlow, EventLoop};

#[derive(Debug, Parser)]
#[command(name = "swarm", version, about = "GPU fly swarm")]
struct Cli {
    /// Settings file (JSON). Missing file means defaults.
    #[arg(long, default_value = "swarm.json")]
    settings: PathBuf,

    /// Override the number of flies.
    #[arg(long)]
    population: Option<u32>,

    /// Draw the full population without frustum culling.
    #[arg(long)]
    no_cull: bool,

    /// Seed for the initial scatter.
    #[arg(long)]
    seed: Option<u64>,

    /// Run this many frames on the CPU backend without a window, then exit.
    #[arg(long, value_name = "FRAMES")]
    headless: Option<u32>,

    /// Write the effective settings back to the settings file, then exit.
    #[arg(long)]
    save_settings: bool,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(population) = self.population {
            settings.swarm.population = population;
        }
        if self.no_cull {
            settings.swarm.culling.enabled = false;
        }
        if self.seed.is_some() {
            settings.swarm.seed = self.seed;
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    tracing::info!("Fly Swarm v{}", swarm_core::VERSION);
    let cli = Cli::parse();

    let mut settings = Settings::load(&cli.settings)
        .with_context(|| format!("loading {}", cli.settings.display()))?;
    cli.apply(&mut settings);
    settings.validate().context("settings after command-line overrides")?;

    if cli.save_settings {
        settings
            .save(&cli.settings)
            .with_context(|| format!("saving {}", cli.settings.display()))?;
        tracing::info!(path = %cli.settings.display(), "settings saved");
        return Ok(());
    }

    if let Some(frames) = cli.headless {
        return headless::run(&settings, frames);
    }

    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = app::SwarmApp::new(settings);
    event_loop.run_app(&mut app).context("event loop")?;
    app.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_settings() {
        let cli = Cli::parse_from(["swarm", "--population", "64", "--no-cull", "--seed", "5"]);
        let mut settings = Settings::default();
        cli.apply(&mut settings);
        assert_eq!(settings.swarm.population, 64);
        assert!(!settings.swarm.culling.enabled);
        assert_eq!(settings.swarm.seed, Some(5));
    }

    #[test]
    fn defaults_leave_settings_alone() {
        let cli = Cli::parse_from(["swarm"]);
        let mut settings = Settings::default();
        cli.apply(&mut settings);
        assert_eq!(settings, Settings::default());
        assert_eq!(cli.settings, PathBuf::from("swarm.json"));
        assert!(!cli.save_settings);
    }

    #[test]
    fn saved_overrides_load_back() {
        let dir = std::env::temp_dir().join(format!("swarm-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("swarm.json");
        let path_arg = path.to_str().unwrap();

        let cli = Cli::parse_from([
            "swarm",
            "--settings",
            path_arg,
            "--population",
            "96",
            "--save-settings",
        ]);
        assert!(cli.save_settings);
        let mut settings = Settings::default();
        cli.apply(&mut settings);
        settings.save(&cli.settings).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.swarm.population, 96);
        assert_eq!(loaded, settings);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
