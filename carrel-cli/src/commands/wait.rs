use std::time::Duration;

use indicatif::ProgressBar;
use sandbox::{ServiceSpec, wait_ready_with};

use crate::config::AppConfig;
use crate::error::Result;

pub async fn run(config: &AppConfig) -> Result<()> {
    wait_for_ready(&config.database).await
}

/// Block until the database answers, with a spinner narrating attempts.
pub async fn wait_for_ready(spec: &ServiceSpec) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Waiting for {}", spec.redacted_url()));

    let retries = spec.probe.retries;
    let result = wait_ready_with(spec, |attempt| {
        spinner.set_message(format!(
            "Attempt {}/{} failed: {} (retrying)",
            attempt.number, retries, attempt.error
        ));
    })
    .await;
    spinner.finish_and_clear();

    let readiness = result?;
    println!(
        "✓ Database ready after {} attempt(s) in {:.1}s",
        readiness.attempts,
        readiness.elapsed.as_secs_f64()
    );
    println!("Connection URL: {}", spec.redacted_url());
    Ok(())
}
