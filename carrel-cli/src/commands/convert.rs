use std::path::{Path, PathBuf};

use percent::SyncOutcome;

use crate::config::AppConfig;
use crate::error::{AppError, Result};

/// `carrel to-script`: notebooks in, percent scripts out.
pub fn to_script(config: &AppConfig, paths: &[PathBuf], output: Option<&Path>) -> Result<()> {
    check_output_arity(paths, output)?;
    for path in paths {
        require_extension(path, "ipynb")?;
        let mut pair = config.sync.pair(path)?;
        if let Some(out) = output {
            pair.script = out.to_path_buf();
        }
        report(&pair.to_script()?);
    }
    Ok(())
}

/// `carrel to-notebook`: percent scripts in, notebooks out.
pub fn to_notebook(config: &AppConfig, paths: &[PathBuf], output: Option<&Path>) -> Result<()> {
    check_output_arity(paths, output)?;
    for path in paths {
        require_extension(path, &config.sync.script_extension)?;
        let mut pair = config.sync.pair(path)?;
        if let Some(out) = output {
            pair.notebook = out.to_path_buf();
        }
        report(&pair.to_notebook()?);
    }
    Ok(())
}

fn check_output_arity(paths: &[PathBuf], output: Option<&Path>) -> Result<()> {
    if output.is_some() && paths.len() > 1 {
        return Err(AppError::InvalidInput(
            "--output only makes sense with a single input file".into(),
        ));
    }
    Ok(())
}

fn require_extension(path: &Path, expected: &str) -> Result<()> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(expected) {
        return Err(AppError::InvalidInput(format!(
            "{}: expected a .{expected} file",
            path.display()
        )));
    }
    Ok(())
}

fn report(outcome: &SyncOutcome) {
    if outcome.changed {
        println!("✓ Wrote {}", outcome.written.display());
    } else {
        println!("  {} is up to date", outcome.written.display());
    }
}
