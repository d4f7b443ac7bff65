//! Configuration for the entire program.
//!
//! Everything works with no config file at all; `carrel.toml` in the
//! working directory (or a `--config` path) overrides the defaults.
//! The `[database]` table feeds the sandbox service spec, `[sync]`
//! lists the script/notebook pairs a bare `carrel sync` handles.

use std::fs;
use std::path::{Path, PathBuf};

use sandbox::ServiceSpec;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const CONFIG_FILE: &str = "carrel.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Managed compose file, relative to the working directory.
    pub compose_file: PathBuf,
    pub database: ServiceSpec,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Extension of the script side of each pair.
    pub script_extension: String,
    /// Kernelspec display name for notebooks created from scratch.
    pub kernel_display_name: Option<String>,
    /// Either side of each managed pair.
    pub paths: Vec<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            script_extension: percent::DEFAULT_SCRIPT_EXTENSION.into(),
            kernel_display_name: None,
            paths: Vec::new(),
        }
    }
}

impl SyncConfig {
    /// Build the pair for `path` with this section's settings applied.
    pub fn pair(&self, path: &Path) -> percent::Result<percent::ScriptPair> {
        Ok(
            percent::ScriptPair::with_script_extension(path, &self.script_extension)?
                .with_kernel(self.kernel_display_name.clone()),
        )
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            compose_file: sandbox::COMPOSE_FILE.into(),
            database: ServiceSpec::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist; the implicit `./carrel.toml` is
    /// optional and silently falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "{} does not exist",
                        path.display()
                    )));
                }
                Self::from_file(path)
            }
            None => {
                let implicit = Path::new(CONFIG_FILE);
                if implicit.exists() {
                    Self::from_file(implicit)
                } else {
                    Ok(AppConfig::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Resolved configuration as TOML.
    pub fn show(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write a default config file, refusing to clobber an existing one.
    pub fn write_default(path: Option<&Path>) -> Result<PathBuf> {
        let path = path.unwrap_or(Path::new(CONFIG_FILE)).to_path_buf();
        if path.exists() {
            return Err(AppError::Config(format!(
                "{} already exists",
                path.display()
            )));
        }
        fs::write(&path, AppConfig::default().show()?)?;
        Ok(path)
    }
}
