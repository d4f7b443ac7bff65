//! Percent-format script codec and notebook pairing.
//!
//! ## Purpose
//!
//! Notebooks are awkward to diff and review; percent scripts are plain
//! Python with `# %%` cell markers and a small fenced metadata header.
//! This crate parses and renders that format and converts it to and
//! from the nbformat model in [`ipynb`], preserving cell ids, outputs
//! and notebook-only metadata across a round trip.
//!
//! ## Operation
//!
//! [`Script`] is the parsed script document. [`notebook_to_script`] and
//! [`script_to_notebook`] convert in memory; [`ScriptPair`] works on
//! paired files and picks a sync direction from modification times.

pub mod convert;
pub mod error;
pub mod header;
pub mod marker;
pub mod pair;
pub mod script;

pub use convert::{notebook_to_script, script_to_notebook};
pub use error::PercentError;
pub use header::ScriptHeader;
pub use marker::CellMarker;
pub use pair::{DEFAULT_SCRIPT_EXTENSION, ScriptPair, SyncDirection, SyncOutcome};
pub use script::{Script, ScriptCell};

/// Result type for script operations
pub type Result<T> = std::result::Result<T, PercentError>;
