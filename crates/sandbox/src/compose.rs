//! Compose file rendering and on-disk management.
//!
//! The compose file is generated from a [`ServiceSpec`] and treated as
//! managed output: [`ensure_compose_file`] writes it when missing,
//! leaves it alone when it already matches, and refuses to clobber a
//! hand-edited copy unless explicitly forced.

use std::fmt::Display;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::Result;
use crate::error::SandboxError;
use crate::service::{DATA_DIR, ServiceSpec};

/// Default compose file name, resolved relative to the working directory.
pub const COMPOSE_FILE: &str = "docker-compose.yml";

/// Render the compose document for a service.
///
/// The port mapping is quoted so YAML cannot read `5432:5432` as a
/// base-60 number.
pub fn render_compose(spec: &ServiceSpec) -> String {
    let ServiceSpec {
        image,
        service_name,
        container_name,
        port,
        user,
        password,
        database,
        volume,
        restart,
        probe,
        ..
    } = spec;
    let interval = probe.interval_secs;
    let timeout = probe.timeout_secs;
    let retries = probe.retries;

    format!(
        r#"services:
  {service_name}:
    image: {image}
    container_name: {container_name}
    restart: {restart}
    environment:
      POSTGRES_USER: {user}
      POSTGRES_PASSWORD: {password}
      POSTGRES_DB: {database}
    ports:
      - "{port}:{port}"
    volumes:
      - {volume}:{DATA_DIR}
    healthcheck:
      test: ["CMD-SHELL", "pg_isready -U {user} -d {database}"]
      interval: {interval}s
      timeout: {timeout}s
      retries: {retries}

volumes:
  {volume}:
"#
    )
}

/// What [`ensure_compose_file`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeFileState {
    Created,
    Unchanged,
    Overwritten,
}

impl Display for ComposeFileState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self {
            ComposeFileState::Created => "created",
            ComposeFileState::Unchanged => "unchanged",
            ComposeFileState::Overwritten => "overwritten",
        };
        f.write_str(state)
    }
}

/// Write the compose file for `spec` at `path`.
///
/// A file whose content differs from the managed rendering is reported
/// as drift and left untouched unless `force` is set.
pub fn ensure_compose_file(path: &Path, spec: &ServiceSpec, force: bool) -> Result<ComposeFileState> {
    let rendered = render_compose(spec);

    if !path.exists() {
        fs::write(path, &rendered)?;
        info!(path = %path.display(), "compose file created");
        return Ok(ComposeFileState::Created);
    }

    let current = fs::read_to_string(path)?;
    if current == rendered {
        debug!(path = %path.display(), "compose file up to date");
        return Ok(ComposeFileState::Unchanged);
    }
    if !force {
        return Err(SandboxError::ComposeDrift {
            path: path.to_path_buf(),
        });
    }

    fs::write(path, &rendered)?;
    info!(path = %path.display(), "compose file overwritten");
    Ok(ComposeFileState::Overwritten)
}
