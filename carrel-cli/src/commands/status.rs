use sandbox::{ComposeDriver, ProbeOutcome, check_once};
use serde::Serialize;

use crate::config::AppConfig;
use crate::error::Result;

#[derive(Serialize)]
struct StatusReport {
    container: String,
    health: String,
    reachable: bool,
    url: String,
    checked_at: String,
}

pub async fn run(config: &AppConfig, json: bool) -> Result<()> {
    let spec = &config.database;
    let driver = ComposeDriver::detect(config.compose_file.clone()).await?;

    let health = driver.inspect_health(&spec.container_name).await?;
    let outcome = check_once(spec).await;

    if json {
        let report = StatusReport {
            container: spec.container_name.clone(),
            health: health.to_string(),
            reachable: matches!(outcome, ProbeOutcome::Ready),
            url: spec.redacted_url(),
            checked_at: chrono::Utc::now().to_rfc3339(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Container: {} ({health})", spec.container_name);
    match outcome {
        ProbeOutcome::Ready => println!("Database:  reachable"),
        ProbeOutcome::Unreachable(error) => println!("Database:  unreachable ({error})"),
    }
    println!("URL:       {}", spec.redacted_url());

    let listing = driver.ps().await?;
    if !listing.trim().is_empty() {
        println!();
        print!("{listing}");
    }
    Ok(())
}
