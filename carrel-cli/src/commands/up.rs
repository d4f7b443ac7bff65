use sandbox::{ComposeDriver, ComposeFileState, ensure_compose_file};
use tracing::info;

use crate::commands::wait::wait_for_ready;
use crate::config::AppConfig;
use crate::error::Result;

pub async fn run(config: &AppConfig, wait: bool, force_compose: bool) -> Result<()> {
    let spec = &config.database;

    let state = ensure_compose_file(&config.compose_file, spec, force_compose)?;
    info!(file = %config.compose_file.display(), %state, "compose file ready");
    if state != ComposeFileState::Unchanged {
        println!("✓ {} {}", config.compose_file.display(), state);
    }

    let driver = ComposeDriver::detect(config.compose_file.clone()).await?;
    driver.up().await?;
    println!("✓ {} is starting", spec.container_name);

    if wait {
        wait_for_ready(spec).await
    } else {
        println!("Connection URL: {}", spec.redacted_url());
        println!("Run `carrel wait` to block until the database is ready");
        Ok(())
    }
}
