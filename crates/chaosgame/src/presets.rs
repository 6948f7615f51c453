use std::io::Write;

use anyhow::{Context, Result};
use chaosconfig::PresetConfig;

use crate::bootstrap::resolve_preset;
use crate::cli::{PresetsAction, ShowArgs};
use crate::paths::AppPaths;

pub fn handle(action: &PresetsAction, paths: &AppPaths, out: &mut impl Write) -> Result<()> {
    match action {
        PresetsAction::List => list(paths, out),
        PresetsAction::Show(args) => show(args, paths, out),
        PresetsAction::Where => {
            writeln!(out, "{}", paths.presets_dir().display())?;
            Ok(())
        }
    }
}

fn list(paths: &AppPaths, out: &mut impl Write) -> Result<()> {
    for name in chaosconfig::builtin_names() {
        let preset = chaosconfig::builtin(name)
            .with_context(|| format!("built-in preset '{name}' failed to load"))?;
        writeln!(out, "{}", describe("built-in", name, &preset))?;
    }

    for path in paths.user_presets()? {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        match PresetConfig::from_path(&path) {
            Ok(preset) => writeln!(out, "{}", describe("user", &stem, &preset))?,
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "skipping invalid user preset"
                );
                writeln!(out, "user      {stem:<12} invalid: {err}")?;
            }
        }
    }
    Ok(())
}

fn describe(kind: &str, name: &str, preset: &PresetConfig) -> String {
    format!(
        "{kind:<9} {name:<12} {} ({} points)",
        preset.recurrence, preset.particle_count
    )
}

fn show(args: &ShowArgs, paths: &AppPaths, out: &mut impl Write) -> Result<()> {
    let (preset, _) = resolve_preset(Some(&args.preset), paths)?;
    let rendered = if args.json {
        serde_json::to_string_pretty(&preset).context("failed to serialise preset as JSON")?
    } else {
        toml::to_string_pretty(&preset).context("failed to serialise preset as TOML")?
    };
    writeln!(out, "{rendered}")?;
    Ok(())
}
