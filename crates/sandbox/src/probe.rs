//! Database readiness probing.
//!
//! The probe opens a real client connection and pings it, which proves
//! more than a socket check: authentication works and the declared
//! database exists. Timing follows the service's [`ProbeConfig`]: one
//! attempt per interval, each bounded by the attempt timeout, failed
//! for good after the configured number of consecutive misses.

use std::time::{Duration, Instant};

use sqlx::Connection;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use tokio::time::{sleep, timeout};
use tracing::debug;

use crate::Result;
use crate::error::SandboxError;
use crate::service::ServiceSpec;

/// A failed probe attempt, passed to the retry callback.
#[derive(Debug)]
pub struct Attempt {
    pub number: u32,
    pub error: String,
}

/// Successful probe summary.
#[derive(Debug)]
pub struct Readiness {
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Result of a single, non-retrying check.
#[derive(Debug)]
pub enum ProbeOutcome {
    Ready,
    Unreachable(String),
}

/// One connection attempt, bounded by the configured timeout.
async fn try_connect(options: &PgConnectOptions, attempt_timeout: Duration) -> std::result::Result<(), String> {
    let connect = async {
        let mut conn = PgConnection::connect_with(options).await?;
        conn.ping().await?;
        conn.close().await
    };
    match timeout(attempt_timeout, connect).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(error.to_string()),
        Err(_) => Err(format!("timed out after {}s", attempt_timeout.as_secs())),
    }
}

/// Check the database once.
pub async fn check_once(spec: &ServiceSpec) -> ProbeOutcome {
    match try_connect(&spec.connect_options(), spec.probe.timeout()).await {
        Ok(()) => ProbeOutcome::Ready,
        Err(error) => ProbeOutcome::Unreachable(error),
    }
}

/// Wait until the database accepts connections.
pub async fn wait_ready(spec: &ServiceSpec) -> Result<Readiness> {
    wait_ready_with(spec, |_| {}).await
}

/// Like [`wait_ready`], reporting each failed attempt to `on_retry`.
pub async fn wait_ready_with(
    spec: &ServiceSpec,
    mut on_retry: impl FnMut(&Attempt),
) -> Result<Readiness> {
    let options = spec.connect_options();
    let probe = &spec.probe;
    let started = Instant::now();
    let mut last_error = String::from("no attempts made");

    for number in 1..=probe.retries.max(1) {
        match try_connect(&options, probe.timeout()).await {
            Ok(()) => {
                let elapsed = started.elapsed();
                debug!(attempts = number, ?elapsed, "database is ready");
                return Ok(Readiness {
                    attempts: number,
                    elapsed,
                });
            }
            Err(error) => {
                debug!(attempt = number, %error, "probe attempt failed");
                on_retry(&Attempt {
                    number,
                    error: error.clone(),
                });
                last_error = error;
            }
        }
        if number < probe.retries {
            sleep(probe.interval()).await;
        }
    }

    Err(SandboxError::NotReady {
        attempts: probe.retries.max(1),
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ProbeConfig;
    use std::net::TcpListener;

    /// A spec pointing at a port nothing listens on.
    fn unreachable_spec() -> ServiceSpec {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        ServiceSpec {
            host: "127.0.0.1".into(),
            port,
            probe: ProbeConfig {
                interval_secs: 0,
                timeout_secs: 2,
                retries: 3,
            },
            ..ServiceSpec::default()
        }
    }

    #[tokio::test]
    async fn test_wait_ready_exhausts_and_reports_attempts() {
        let spec = unreachable_spec();
        let mut seen = Vec::new();

        let result = wait_ready_with(&spec, |attempt| seen.push(attempt.number)).await;
        match result {
            Err(SandboxError::NotReady {
                attempts,
                last_error,
            }) => {
                assert_eq!(attempts, 3);
                assert!(!last_error.is_empty());
            }
            other => panic!("Expected NotReady, got {other:?}"),
        }
        assert_eq!(seen, [1, 2, 3], "every failed attempt must be reported");
    }

    #[tokio::test]
    async fn test_check_once_reports_unreachable() {
        let spec = unreachable_spec();
        match check_once(&spec).await {
            ProbeOutcome::Unreachable(error) => assert!(!error.is_empty()),
            ProbeOutcome::Ready => panic!("nothing is listening on that port"),
        }
    }
}
