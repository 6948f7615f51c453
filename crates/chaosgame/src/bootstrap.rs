use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chaosconfig::PresetConfig;
use tracing::debug;

use crate::cli::RunArgs;
use crate::paths::AppPaths;

pub const DEFAULT_PRESET: &str = "dream";

/// Where a resolved preset came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetOrigin {
    Builtin(String),
    User(PathBuf),
    File(PathBuf),
}

impl fmt::Display for PresetOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetOrigin::Builtin(name) => write!(f, "built-in:{name}"),
            PresetOrigin::User(path) | PresetOrigin::File(path) => {
                write!(f, "{}", path.display())
            }
        }
    }
}

/// Resolves a preset reference. Explicit paths win, then user presets, then built-ins.
pub fn resolve_preset(
    reference: Option<&str>,
    paths: &AppPaths,
) -> Result<(PresetConfig, PresetOrigin)> {
    let reference = reference.map(str::trim).unwrap_or(DEFAULT_PRESET);
    if reference.is_empty() {
        bail!("preset name must not be empty");
    }

    if looks_like_path(reference) {
        let path = PathBuf::from(reference);
        let preset = PresetConfig::from_path(&path)
            .with_context(|| format!("failed to load preset file {}", path.display()))?;
        return Ok((preset, PresetOrigin::File(path)));
    }

    let user_path = paths.user_preset(reference);
    if user_path.is_file() {
        debug!(path = %user_path.display(), "using user preset");
        let preset = PresetConfig::from_path(&user_path)
            .with_context(|| format!("failed to load user preset {}", user_path.display()))?;
        return Ok((preset, PresetOrigin::User(user_path)));
    }

    let preset = chaosconfig::builtin(reference).map_err(|err| {
        anyhow!(
            "{err}; built-in presets are: {}",
            chaosconfig::builtin_names().collect::<Vec<_>>().join(", ")
        )
    })?;
    Ok((preset, PresetOrigin::Builtin(reference.to_ascii_lowercase())))
}

fn looks_like_path(reference: &str) -> bool {
    let path = Path::new(reference);
    path.extension().is_some_and(|ext| ext == "toml") || path.components().count() > 1
}

/// Applies command-line overrides on top of a preset and revalidates the result.
pub fn apply_overrides(preset: &mut PresetConfig, args: &RunArgs) -> Result<()> {
    if let Some(size) = args.size.as_deref() {
        let (width, height) = parse_surface_size(size)?;
        preset.window.width = width;
        preset.window.height = height;
    }
    if let Some(particles) = args.particles {
        preset.particle_count = particles;
    }
    if args.no_vsync {
        preset.render.vsync = false;
    }
    if let Some(run_for) = args.run_for {
        preset.session.run_for = Some(run_for);
    }
    if let Some(glow) = args.glow.as_ref() {
        preset.render.glow_texture = Some(glow.clone());
    }
    if let Some(title) = args.window_title.as_ref() {
        preset.window.title = title.clone();
    }

    preset
        .validate()
        .context("preset is invalid after applying command-line overrides")
}

pub fn parse_surface_size(spec: &str) -> Result<(u32, u32)> {
    let trimmed = spec.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| anyhow!("expected WxH format, e.g. 1280x720"))?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid width in size specification"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid height in size specification"))?;

    if width == 0 || height == 0 {
        bail!("surface dimensions must be greater than zero");
    }

    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn temp_paths() -> (TempDir, AppPaths) {
        let root = TempDir::new().unwrap();
        let paths = AppPaths::from_raw(root.path().to_path_buf());
        (root, paths)
    }

    #[test]
    fn parses_surface_sizes() {
        assert_eq!(parse_surface_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_surface_size(" 640 X 480 ").unwrap(), (640, 480));
        assert_eq!(parse_surface_size("800×600").unwrap(), (800, 600));
        assert!(parse_surface_size("0x600").is_err());
        assert!(parse_surface_size("wide").is_err());
    }

    #[test]
    fn defaults_to_builtin_dream() {
        let (_root, paths) = temp_paths();
        let (preset, origin) = resolve_preset(None, &paths).unwrap();
        assert_eq!(preset.name, "dream");
        assert_eq!(origin, PresetOrigin::Builtin("dream".into()));
    }

    #[test]
    fn user_preset_shadows_builtin() {
        let (_root, paths) = temp_paths();
        let mut source = chaosconfig::builtin_source("bubble").unwrap().to_string();
        source = source.replace("name = \"bubble\"", "name = \"my bubble\"");
        fs::create_dir_all(paths.presets_dir()).unwrap();
        fs::write(paths.user_preset("bubble"), source).unwrap();

        let (preset, origin) = resolve_preset(Some("bubble"), &paths).unwrap();
        assert_eq!(preset.name, "my bubble");
        assert_eq!(origin, PresetOrigin::User(paths.user_preset("bubble")));
    }

    #[test]
    fn explicit_path_is_loaded_directly() {
        let (root, paths) = temp_paths();
        let file = root.path().join("custom.toml");
        fs::write(&file, chaosconfig::builtin_source("dream").unwrap()).unwrap();

        let reference = file.to_string_lossy().into_owned();
        let (preset, origin) = resolve_preset(Some(&reference), &paths).unwrap();
        assert_eq!(preset.name, "dream");
        assert_eq!(origin, PresetOrigin::File(file));
    }

    #[test]
    fn unknown_name_lists_builtins() {
        let (_root, paths) = temp_paths();
        let err = resolve_preset(Some("lorenz"), &paths).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("lorenz"), "{message}");
        assert!(message.contains("dream"), "{message}");
    }

    #[test]
    fn overrides_apply_and_revalidate() {
        let mut preset = chaosconfig::builtin("dream").unwrap();
        let args = RunArgs {
            size: Some("320x200".into()),
            particles: Some(2048),
            no_vsync: true,
            run_for: Some(Duration::from_secs(5)),
            window_title: Some("test".into()),
            ..RunArgs::default()
        };
        apply_overrides(&mut preset, &args).unwrap();
        assert_eq!((preset.window.width, preset.window.height), (320, 200));
        assert_eq!(preset.particle_count, 2048);
        assert!(!preset.render.vsync);
        assert_eq!(preset.session.run_for, Some(Duration::from_secs(5)));
        assert_eq!(preset.window.title, "test");

        let zero = RunArgs {
            particles: Some(0),
            ..RunArgs::default()
        };
        assert!(apply_overrides(&mut preset, &zero).is_err());
    }
}
