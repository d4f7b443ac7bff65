//! Jupyter notebook (nbformat 4) document model and JSON codec.
//!
//! This crate provides the typed `Notebook`/`Cell` model shared by the
//! conversion tooling, along with parsing and serialization of `.ipynb`
//! files. Cell sources are modelled as plain strings; the on-disk
//! line-array representation is handled transparently by the codec.

pub mod document;
pub mod error;

pub use document::{Cell, CellType, JsonMap, NBFORMAT, NBFORMAT_MINOR, Notebook, new_cell_id};
pub use error::IpynbError;

/// Result type for notebook operations
pub type Result<T> = std::result::Result<T, IpynbError>;
