use std::fmt::Display;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::Result;
use crate::error::IpynbError;

/// The only major format version this crate reads and writes.
pub const NBFORMAT: u64 = 4;
/// Minor version emitted on write. Cell ids are mandatory from 4.5 on.
pub const NBFORMAT_MINOR: u64 = 5;

/// JSON object map used for notebook- and cell-level metadata.
///
/// `serde_json`'s default map keeps keys sorted, which matches how
/// notebook tooling normalizes documents on write.
pub type JsonMap = serde_json::Map<String, Value>;

/// Generate a fresh cell id: 8 hex characters drawn from a random UUID.
///
/// nbformat restricts ids to 1-64 chars of `[A-Za-z0-9-_]`; the short
/// random form is what notebook tooling itself produces.
pub fn new_cell_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellType {
    Code,
    Markdown,
    Raw,
}

impl CellType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellType::Code => "code",
            CellType::Markdown => "markdown",
            CellType::Raw => "raw",
        }
    }
}

impl Display for CellType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single notebook cell.
///
/// The variant is the on-disk `cell_type` tag. Only code cells carry an
/// execution count and outputs; both are preserved verbatim through a
/// notebook round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cell_type", rename_all = "lowercase")]
pub enum Cell {
    Code {
        #[serde(default)]
        execution_count: Option<i64>,
        #[serde(default)]
        id: String,
        #[serde(default)]
        metadata: JsonMap,
        #[serde(default)]
        outputs: Vec<Value>,
        #[serde(with = "multiline")]
        source: String,
    },
    Markdown {
        #[serde(default)]
        id: String,
        #[serde(default)]
        metadata: JsonMap,
        #[serde(with = "multiline")]
        source: String,
    },
    Raw {
        #[serde(default)]
        id: String,
        #[serde(default)]
        metadata: JsonMap,
        #[serde(with = "multiline")]
        source: String,
    },
}

impl Cell {
    /// Create a code cell with a fresh id, empty outputs and no execution count.
    pub fn code(source: impl Into<String>) -> Self {
        Cell::Code {
            id: new_cell_id(),
            metadata: JsonMap::new(),
            source: source.into(),
            execution_count: None,
            outputs: Vec::new(),
        }
    }

    /// Create a markdown cell with a fresh id.
    pub fn markdown(source: impl Into<String>) -> Self {
        Cell::Markdown {
            id: new_cell_id(),
            metadata: JsonMap::new(),
            source: source.into(),
        }
    }

    /// Create a raw cell with a fresh id.
    pub fn raw(source: impl Into<String>) -> Self {
        Cell::Raw {
            id: new_cell_id(),
            metadata: JsonMap::new(),
            source: source.into(),
        }
    }

    pub fn cell_type(&self) -> CellType {
        match self {
            Cell::Code { .. } => CellType::Code,
            Cell::Markdown { .. } => CellType::Markdown,
            Cell::Raw { .. } => CellType::Raw,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Cell::Code { id, .. } | Cell::Markdown { id, .. } | Cell::Raw { id, .. } => id,
        }
    }

    pub fn set_id(&mut self, new_id: String) {
        match self {
            Cell::Code { id, .. } | Cell::Markdown { id, .. } | Cell::Raw { id, .. } => {
                *id = new_id;
            }
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Cell::Code { source, .. }
            | Cell::Markdown { source, .. }
            | Cell::Raw { source, .. } => source,
        }
    }

    pub fn metadata(&self) -> &JsonMap {
        match self {
            Cell::Code { metadata, .. }
            | Cell::Markdown { metadata, .. }
            | Cell::Raw { metadata, .. } => metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut JsonMap {
        match self {
            Cell::Code { metadata, .. }
            | Cell::Markdown { metadata, .. }
            | Cell::Raw { metadata, .. } => metadata,
        }
    }
}

/// An nbformat 4 notebook document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub metadata: JsonMap,
    pub nbformat: u64,
    pub nbformat_minor: u64,
}

impl Default for Notebook {
    fn default() -> Self {
        Notebook {
            cells: Vec::new(),
            metadata: JsonMap::new(),
            nbformat: NBFORMAT,
            nbformat_minor: NBFORMAT_MINOR,
        }
    }
}

impl Notebook {
    /// Create an empty notebook with default format versions.
    pub fn new() -> Self {
        Notebook::default()
    }

    /// Parse a notebook from nbformat JSON.
    ///
    /// The major version is checked before the document is decoded so a
    /// legacy notebook fails with a clear error instead of a field-level
    /// one. Cells without an id (minor versions before 4.5) get a fresh
    /// id assigned.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        let major = value.get("nbformat").and_then(Value::as_u64).unwrap_or(0);
        if major != NBFORMAT {
            return Err(IpynbError::UnsupportedFormat(major));
        }

        let mut notebook: Notebook = serde_json::from_value(value)?;
        for cell in &mut notebook.cells {
            if cell.id().is_empty() {
                cell.set_id(new_cell_id());
            }
        }
        Ok(notebook)
    }

    /// Serialize to pretty-printed nbformat JSON (no trailing newline).
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a notebook file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Write the notebook file, ending with a trailing newline.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut json = self.to_json_string()?;
        json.push('\n');
        fs::write(path, json)?;
        Ok(())
    }
}

/// Cell sources are stored as plain strings in memory but written as the
/// line-array form nbformat tooling emits. Both forms are accepted on read.
mod multiline {
    use std::fmt;

    use serde::de::{SeqAccess, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S>(source: &str, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // split_inclusive keeps the embedded newlines, so the final line
        // carries one only when the source itself ends with one.
        serializer.collect_seq(source.split_inclusive('\n'))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SourceVisitor;

        impl<'de> Visitor<'de> for SourceVisitor {
            type Value = String;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a string or an array of strings")
            }

            fn visit_str<E>(self, v: &str) -> std::result::Result<String, E>
            where
                E: serde::de::Error,
            {
                Ok(v.to_owned())
            }

            fn visit_string<E>(self, v: String) -> std::result::Result<String, E>
            where
                E: serde::de::Error,
            {
                Ok(v)
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<String, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut out = String::new();
                while let Some(line) = seq.next_element::<String>()? {
                    out.push_str(&line);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_any(SourceVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_notebook_json(source_field: &str) -> String {
        format!(
            r#"{{
  "cells": [
    {{
      "cell_type": "code",
      "execution_count": 2,
      "id": "abcd1234",
      "metadata": {{}},
      "outputs": [],
      "source": {source_field}
    }}
  ],
  "metadata": {{}},
  "nbformat": 4,
  "nbformat_minor": 5
}}"#
        )
    }

    #[test]
    fn test_parse_source_as_line_array() {
        let json = minimal_notebook_json(r#"["import os\n", "print(os.name)"]"#);
        let notebook = Notebook::from_json_str(&json).unwrap();

        assert_eq!(notebook.cells.len(), 1);
        assert_eq!(notebook.cells[0].source(), "import os\nprint(os.name)");
        assert_eq!(notebook.cells[0].id(), "abcd1234");
    }

    #[test]
    fn test_parse_source_as_plain_string() {
        let json = minimal_notebook_json(r#""import os\nprint(os.name)""#);
        let notebook = Notebook::from_json_str(&json).unwrap();

        assert_eq!(notebook.cells[0].source(), "import os\nprint(os.name)");
    }

    #[test]
    fn test_round_trip_preserves_cells_and_outputs() {
        let json = r###"{
  "cells": [
    {
      "cell_type": "markdown",
      "id": "m1",
      "metadata": {"tags": ["intro"]},
      "source": ["## Setup\n", "Notes"]
    },
    {
      "cell_type": "code",
      "execution_count": 7,
      "id": "c1",
      "metadata": {},
      "outputs": [{"output_type": "stream", "name": "stdout", "text": ["ok\n"]}],
      "source": ["print('ok')"]
    }
  ],
  "metadata": {"kernelspec": {"display_name": "lab", "language": "python", "name": "python3"}},
  "nbformat": 4,
  "nbformat_minor": 5
}"###;
        let notebook = Notebook::from_json_str(json).unwrap();
        let reparsed = Notebook::from_json_str(&notebook.to_json_string().unwrap()).unwrap();

        assert_eq!(notebook, reparsed, "JSON round trip must be lossless");
        match &reparsed.cells[1] {
            Cell::Code {
                execution_count,
                outputs,
                ..
            } => {
                assert_eq!(*execution_count, Some(7));
                assert_eq!(outputs.len(), 1, "outputs must survive a round trip");
            }
            other => panic!("Expected code cell, got {:?}", other.cell_type()),
        }
    }

    #[test]
    fn test_source_without_trailing_newline_round_trips() {
        let mut notebook = Notebook::new();
        notebook.cells.push(Cell::code("a = 1\nb = 2"));
        notebook.cells.push(Cell::code("c = 3\n"));

        let reparsed = Notebook::from_json_str(&notebook.to_json_string().unwrap()).unwrap();
        assert_eq!(reparsed.cells[0].source(), "a = 1\nb = 2");
        assert_eq!(reparsed.cells[1].source(), "c = 3\n");
    }

    #[test]
    fn test_unknown_cell_type_is_an_error() {
        let json = minimal_notebook_json(r#""x""#).replace("\"code\"", "\"heading\"");
        let result = Notebook::from_json_str(&json);
        assert!(result.is_err(), "unknown cell_type must not parse");
    }

    #[test]
    fn test_unsupported_nbformat_major() {
        let json = minimal_notebook_json(r#""x""#).replace("\"nbformat\": 4", "\"nbformat\": 3");
        match Notebook::from_json_str(&json) {
            Err(IpynbError::UnsupportedFormat(3)) => {}
            other => panic!("Expected UnsupportedFormat(3), got {other:?}"),
        }
    }

    #[test]
    fn test_missing_cell_id_is_backfilled() {
        let json = r#"{
  "cells": [
    {"cell_type": "markdown", "metadata": {}, "source": ["hi"]}
  ],
  "metadata": {},
  "nbformat": 4,
  "nbformat_minor": 4
}"#;
        let notebook = Notebook::from_json_str(json).unwrap();
        assert!(
            !notebook.cells[0].id().is_empty(),
            "cells without an id must get one assigned"
        );
    }

    #[test]
    fn test_empty_notebook_is_valid() {
        let notebook =
            Notebook::from_json_str(r#"{"cells": [], "metadata": {}, "nbformat": 4, "nbformat_minor": 5}"#)
                .unwrap();
        assert!(notebook.cells.is_empty());
        assert_eq!(notebook.nbformat, NBFORMAT);
    }

    #[test]
    fn test_fresh_cell_ids_are_unique() {
        let a = new_cell_id();
        let b = new_cell_id();
        assert_eq!(a.len(), 8);
        assert_ne!(a, b, "two fresh ids should not collide");
    }

    #[test]
    fn test_empty_source_serializes_as_empty_array() {
        let mut notebook = Notebook::new();
        notebook.cells.push(Cell::code(""));
        let json = notebook.to_json_string().unwrap();
        assert!(
            json.contains("\"source\": []"),
            "empty source should serialize as []: {json}"
        );
    }
}
