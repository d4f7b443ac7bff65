//! Local PostgreSQL sandbox provisioning.
//!
//! ## Purpose
//!
//! Course notebooks expect a throwaway PostgreSQL 13.4 instance with
//! fixed credentials on localhost:5432. This crate owns that contract:
//! it renders the compose file that declares the service, drives the
//! docker CLI to start and stop it, and probes readiness with a real
//! client connection.
//!
//! ## Operation
//!
//! [`ServiceSpec`] describes the service; everything else derives from
//! it. [`ensure_compose_file`] materializes the compose file,
//! [`ComposeDriver`] runs `up`/`down`/`ps`, and [`wait_ready`] blocks
//! until the database answers or the probe budget is spent. The named
//! volume keeps data across container recreation; `down` with volume
//! removal resets the database to empty.

pub mod compose;
pub mod docker;
pub mod error;
pub mod probe;
pub mod service;

pub use compose::{COMPOSE_FILE, ComposeFileState, ensure_compose_file, render_compose};
pub use docker::{ComposeDriver, HealthStatus};
pub use error::SandboxError;
pub use probe::{Attempt, ProbeOutcome, Readiness, check_once, wait_ready, wait_ready_with};
pub use service::{ProbeConfig, ServiceSpec};

/// Result type for sandbox operations
pub type Result<T> = std::result::Result<T, SandboxError>;
