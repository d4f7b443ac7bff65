//! Paired files on disk.
//!
//! A pair is a `.py` script and a `.ipynb` notebook sharing one base
//! name. Conversions here go through [`convert`](crate::convert) and
//! write only when the rendered output differs from what is already on
//! disk, so an up-to-date pair keeps its modification times.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use ipynb::{JsonMap, Notebook};
use tracing::debug;

use crate::Result;
use crate::convert::{notebook_to_script, script_to_notebook};
use crate::error::PercentError;
use crate::script::Script;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    ScriptToNotebook,
    NotebookToScript,
}

/// What a conversion did.
#[derive(Debug)]
pub struct SyncOutcome {
    pub direction: SyncDirection,
    pub written: PathBuf,
    /// False when the target already had exactly this content.
    pub changed: bool,
}

/// Extension of the script side unless configured otherwise.
pub const DEFAULT_SCRIPT_EXTENSION: &str = "py";

#[derive(Debug, Clone)]
pub struct ScriptPair {
    pub script: PathBuf,
    pub notebook: PathBuf,
    /// Kernelspec display name used when neither side carries one.
    pub kernel_display_name: Option<String>,
}

impl ScriptPair {
    /// Derive the pair from either side's path.
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::with_script_extension(path, DEFAULT_SCRIPT_EXTENSION)
    }

    /// Derive the pair using a configured script extension.
    pub fn with_script_extension(path: &Path, script_extension: &str) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("ipynb") => Ok(ScriptPair {
                script: path.with_extension(script_extension),
                notebook: path.to_path_buf(),
                kernel_display_name: None,
            }),
            Some(ext) if ext == script_extension => Ok(ScriptPair {
                script: path.to_path_buf(),
                notebook: path.with_extension("ipynb"),
                kernel_display_name: None,
            }),
            _ => Err(PercentError::UnpairablePath(path.display().to_string())),
        }
    }

    pub fn with_kernel(mut self, display_name: Option<String>) -> Self {
        self.kernel_display_name = display_name;
        self
    }

    /// Regenerate the notebook from the script.
    ///
    /// An existing notebook is read first so ids, outputs and
    /// notebook-only metadata carry over.
    pub fn to_notebook(&self) -> Result<SyncOutcome> {
        if !self.script.exists() {
            return Err(PercentError::MissingFile(self.script.display().to_string()));
        }
        let script = Script::read(&self.script)?;
        let existing = if self.notebook.exists() {
            Some(Notebook::read(&self.notebook)?)
        } else {
            None
        };

        let mut notebook = script_to_notebook(&script, existing.as_ref());
        self.apply_kernel(&mut notebook.metadata);
        let mut json = notebook.to_json_string()?;
        json.push('\n');
        self.finish(SyncDirection::ScriptToNotebook, &self.notebook, json)
    }

    /// Regenerate the script from the notebook.
    pub fn to_script(&self) -> Result<SyncOutcome> {
        if !self.notebook.exists() {
            return Err(PercentError::MissingFile(
                self.notebook.display().to_string(),
            ));
        }
        let mut notebook = Notebook::read(&self.notebook)?;
        self.apply_kernel(&mut notebook.metadata);
        let text = notebook_to_script(&notebook).render();
        self.finish(SyncDirection::NotebookToScript, &self.script, text)
    }

    /// Convert in the direction of the most recently modified side.
    ///
    /// When only one side exists, the other is created. When timestamps
    /// tie, the notebook wins: regenerating the script from it cannot
    /// lose outputs, while the reverse could.
    pub fn sync(&self) -> Result<SyncOutcome> {
        match (self.script.exists(), self.notebook.exists()) {
            (false, false) => Err(PercentError::MissingFile(self.script.display().to_string())),
            (true, false) => self.to_notebook(),
            (false, true) => self.to_script(),
            (true, true) => {
                if modified(&self.script)? > modified(&self.notebook)? {
                    self.to_notebook()
                } else {
                    self.to_script()
                }
            }
        }
    }

    /// Fill in a kernelspec when the metadata has none and the pair
    /// carries a configured display name.
    fn apply_kernel(&self, metadata: &mut JsonMap) {
        if metadata.contains_key("kernelspec") {
            return;
        }
        let Some(display_name) = &self.kernel_display_name else {
            return;
        };
        metadata.insert(
            "kernelspec".into(),
            serde_json::json!({
                "display_name": display_name,
                "language": "python",
                "name": "python3",
            }),
        );
    }

    fn finish(
        &self,
        direction: SyncDirection,
        target: &Path,
        content: String,
    ) -> Result<SyncOutcome> {
        let unchanged = match fs::read_to_string(target) {
            Ok(current) => current == content,
            Err(_) => false,
        };
        if unchanged {
            debug!(target = %target.display(), "target already up to date");
        } else {
            fs::write(target, content)?;
            debug!(target = %target.display(), ?direction, "target written");
        }
        Ok(SyncOutcome {
            direction,
            written: target.to_path_buf(),
            changed: !unchanged,
        })
    }
}

fn modified(path: &Path) -> std::io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}
