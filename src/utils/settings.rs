//! Host settings: defaults, then `~/.dircat.toml`, then `.env` / `DIRCAT_DB`. Command-line flags are applied last by the CLI.

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::utils::config::PackagePaths;

/// Effective host settings.
#[derive(Clone, Debug)]
pub struct Settings {
    pub db_path: PathBuf,
    pub with_thumbnails: bool,
    pub exclude: Vec<String>,
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PackagePaths::get().default_db_path(),
            with_thumbnails: true,
            exclude: Vec::new(),
            verbose: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SettingsFile {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    db_path: Option<String>,
    thumbnails: Option<bool>,
    exclude: Option<Vec<String>>,
    verbose: Option<bool>,
}

/// Read and parse a settings file. A malformed file is an error, not a silent default.
pub(crate) fn load_settings_file(path: &Path) -> anyhow::Result<SettingsFile> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read settings file {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse settings file {}", path.display()))
}

/// Overwrite a settings field from the file when present.
macro_rules! apply_file_opt {
    ($section:expr, $settings:expr, $file_field:ident => $settings_field:ident) => {
        if let Some(v) = $section.$file_field.clone() {
            $settings.$settings_field = v;
        }
    };
}

fn apply_file(file: &SettingsFile, settings: &mut Settings) {
    let section = &file.settings;
    if let Some(ref p) = section.db_path {
        settings.db_path = expand_home(p);
    }
    apply_file_opt!(section, settings, thumbnails => with_thumbnails);
    apply_file_opt!(section, settings, exclude => exclude);
    apply_file_opt!(section, settings, verbose => verbose);
}

/// `~/x` → `<home>/x`; anything else as-is.
fn expand_home(p: &str) -> PathBuf {
    match (p.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(p),
    }
}

/// Read the store path override from the environment (`.env` in the working dir is loaded first).
fn db_path_from_env() -> Option<PathBuf> {
    let _ = dotenvy::dotenv();
    std::env::var(PackagePaths::get().db_env_var())
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(|s| expand_home(&s))
}

impl Settings {
    /// Defaults, overlaid with `config_path` (or the home settings file) and the environment.
    ///
    /// An explicit `config_path` must exist; the home settings file is optional. Either one
    /// failing to parse is an error.
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = Settings::default();
        let path = match config_path {
            Some(p) => Some(p.to_path_buf()),
            None => PackagePaths::get()
                .default_config_path()
                .filter(|p| p.is_file()),
        };
        if let Some(path) = path {
            apply_file(&load_settings_file(&path)?, &mut settings);
        }
        if let Some(db) = db_path_from_env() {
            settings.db_path = db;
        }
        Ok(settings)
    }

    /// Settings from a TOML string over the defaults (no environment). Used for tests and embedding.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        let file: SettingsFile = toml::from_str(s)?;
        let mut settings = Settings::default();
        apply_file(&file, &mut settings);
        Ok(settings)
    }
}
