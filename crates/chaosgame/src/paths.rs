use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "CHAOSGAME_CONFIG_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "ChaosGame";
const APPLICATION: &str = "chaosgame";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        if let Some(config_dir) = env_override(ENV_CONFIG_DIR) {
            return Ok(Self { config_dir });
        }
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self {
            config_dir: project_dirs.config_dir().to_path_buf(),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn presets_dir(&self) -> PathBuf {
        self.config_dir.join("presets")
    }

    /// Path a user preset named `name` would live at.
    pub fn user_preset(&self, name: &str) -> PathBuf {
        self.presets_dir().join(format!("{name}.toml"))
    }

    /// Sorted `*.toml` files in the user preset directory; a missing directory yields none.
    pub fn user_presets(&self) -> Result<Vec<PathBuf>> {
        let dir = self.presets_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut presets = Vec::new();
        for entry in fs::read_dir(&dir)
            .with_context(|| format!("failed to read preset directory {}", dir.display()))?
        {
            let path = entry
                .with_context(|| format!("failed to read entry in {}", dir.display()))?
                .path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
                presets.push(path);
            }
        }
        presets.sort();
        Ok(presets)
    }
}

#[cfg(test)]
impl AppPaths {
    pub fn from_raw(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.as_os_str().is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lists_only_toml_files_in_order() {
        let root = TempDir::new().unwrap();
        let paths = AppPaths::from_raw(root.path().to_path_buf());
        assert!(paths.user_presets().unwrap().is_empty());

        fs::create_dir_all(paths.presets_dir()).unwrap();
        fs::write(paths.presets_dir().join("zeta.toml"), "").unwrap();
        fs::write(paths.presets_dir().join("alpha.toml"), "").unwrap();
        fs::write(paths.presets_dir().join("notes.txt"), "").unwrap();
        fs::create_dir_all(paths.presets_dir().join("nested.toml")).unwrap();

        let found = paths.user_presets().unwrap();
        assert_eq!(
            found,
            vec![
                paths.presets_dir().join("alpha.toml"),
                paths.presets_dir().join("zeta.toml"),
            ]
        );
        assert_eq!(paths.user_preset("alpha"), found[0]);
    }
}
