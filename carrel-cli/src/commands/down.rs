use sandbox::ComposeDriver;

use crate::config::AppConfig;
use crate::error::Result;

pub async fn run(config: &AppConfig, volumes: bool) -> Result<()> {
    let spec = &config.database;
    let driver = ComposeDriver::detect(config.compose_file.clone()).await?;
    driver.down(volumes).await?;

    if volumes {
        println!(
            "✓ {} stopped; volume {} removed, the next start is a fresh database",
            spec.container_name, spec.volume
        );
    } else {
        println!(
            "✓ {} stopped; data kept in volume {}",
            spec.container_name, spec.volume
        );
    }
    Ok(())
}
