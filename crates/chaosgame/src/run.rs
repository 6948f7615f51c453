use std::io::{self, Write};

use anyhow::{Context, Result};
use chaoscore::RenderCore;
use renderer::Renderer;
use tracing_subscriber::EnvFilter;

use crate::bootstrap::{apply_overrides, resolve_preset};
use crate::cli::{Cli, Command, RunArgs};
use crate::paths::AppPaths;
use crate::presets;

pub fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    let paths = AppPaths::discover()?;
    tracing::debug!(config = %paths.config_dir().display(), "resolved chaosgame paths");

    match cli.command {
        Some(Command::Presets(command)) => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            presets::handle(&command.action, &paths, &mut out)
        }
        None => run_preset(&cli.run, &paths),
    }
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run_preset(args: &RunArgs, paths: &AppPaths) -> Result<()> {
    let (mut preset, origin) = resolve_preset(args.preset.as_deref(), paths)?;
    apply_overrides(&mut preset, args)?;
    tracing::info!(
        preset = %preset.name,
        source = %origin,
        recurrence = %preset.recurrence,
        particles = preset.particle_count,
        "resolved preset"
    );

    if args.check {
        let core = RenderCore::from_config(&preset).context("preset failed to initialise")?;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        writeln!(
            out,
            "{}: ok ({}, {} points, trails {}, step window {}, clear threshold {}, \
             drift push level {})",
            preset.name,
            preset.recurrence,
            core.buffer().capacity(),
            if core.buffer().trails() { "on" } else { "off" },
            preset.step_window(),
            core.backpressure().threshold(),
            preset.drift_push_level(),
        )?;
        return Ok(());
    }

    let mut renderer = Renderer::new(preset);
    renderer.run()
}
