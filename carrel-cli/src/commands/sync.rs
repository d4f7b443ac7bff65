use std::path::PathBuf;

use percent::SyncDirection;

use crate::config::AppConfig;
use crate::error::{AppError, Result};

pub fn run(config: &AppConfig, paths: &[PathBuf]) -> Result<()> {
    let paths = if paths.is_empty() {
        &config.sync.paths
    } else {
        paths
    };
    if paths.is_empty() {
        return Err(AppError::InvalidInput(
            "nothing to sync: pass file paths or list them under [sync] paths in carrel.toml"
                .into(),
        ));
    }

    for path in paths {
        let pair = config.sync.pair(path)?;
        let outcome = pair.sync()?;
        let source = match outcome.direction {
            SyncDirection::ScriptToNotebook => &pair.script,
            SyncDirection::NotebookToScript => &pair.notebook,
        };
        if outcome.changed {
            println!(
                "✓ Wrote {} (from {})",
                outcome.written.display(),
                source.display()
            );
        } else {
            println!("  {} is up to date", outcome.written.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SCRIPT: &str = "# %%\nx = 1\n";

    fn config_with_paths(paths: Vec<PathBuf>) -> AppConfig {
        let mut config = AppConfig::default();
        config.sync.paths = paths;
        config
    }

    #[test]
    fn test_sync_explicit_path_creates_notebook() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("demo.py");
        fs::write(&script, SCRIPT).unwrap();

        run(&AppConfig::default(), std::slice::from_ref(&script)).unwrap();
        assert!(dir.path().join("demo.ipynb").exists());
    }

    #[test]
    fn test_sync_falls_back_to_configured_paths() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("demo.py");
        fs::write(&script, SCRIPT).unwrap();

        let config = config_with_paths(vec![script.clone()]);
        run(&config, &[]).unwrap();
        assert!(dir.path().join("demo.ipynb").exists());
    }

    #[test]
    fn test_sync_applies_the_configured_kernel() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("demo.py");
        fs::write(&script, SCRIPT).unwrap();

        let mut config = config_with_paths(vec![script.clone()]);
        config.sync.kernel_display_name = Some("python-database-mastery".into());
        run(&config, &[]).unwrap();

        let notebook = fs::read_to_string(dir.path().join("demo.ipynb")).unwrap();
        assert!(notebook.contains("\"display_name\": \"python-database-mastery\""));
    }

    #[test]
    fn test_sync_with_nothing_configured_is_an_error() {
        let err = run(&AppConfig::default(), &[]).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
