//! Percent script documents.
//!
//! ## Layout
//!
//! A script is an optional fenced header followed by cells. Each cell
//! is a `# %%` marker line plus its body. Code bodies are stored
//! verbatim; markdown and raw bodies are comment-prefixed (`# ` per
//! line, a bare `#` for empty lines), which also makes it impossible
//! for markdown text to collide with the marker syntax.
//!
//! One blank line separates consecutive blocks. On parse that
//! separator is the last blank body line before the next marker, and
//! exactly one is dropped; any further blank lines belong to the cell
//! source. Rendering a parsed script therefore reproduces a
//! canonically formatted file byte for byte.
//!
//! ## Normalization
//!
//! CRLF line endings are read as LF, a missing final newline is
//! restored on write, and content above the first marker becomes an
//! unmarked code cell that gains a `# %%` marker when rewritten.

use std::fs;
use std::path::Path;

use ipynb::CellType;

use crate::Result;
use crate::error::PercentError;
use crate::header::{HEADER_FENCE, ScriptHeader};
use crate::marker::CellMarker;

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptCell {
    pub marker: CellMarker,
    pub source: String,
}

impl ScriptCell {
    pub fn new(cell_type: CellType, source: impl Into<String>) -> Self {
        ScriptCell {
            marker: CellMarker::new(cell_type),
            source: source.into(),
        }
    }
}

/// A parsed percent script.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    pub header: Option<ScriptHeader>,
    pub cells: Vec<ScriptCell>,
}

impl Script {
    pub fn parse(text: &str) -> Result<Self> {
        // str::lines treats both LF and CRLF as terminators.
        let lines: Vec<&str> = text.lines().collect();
        let mut idx = 0;

        let header = if lines.first() == Some(&HEADER_FENCE) {
            let close = lines[1..]
                .iter()
                .position(|line| *line == HEADER_FENCE)
                .map(|pos| pos + 1)
                .ok_or_else(|| PercentError::header(1, "unterminated header block"))?;
            idx = close + 1;
            Some(ScriptHeader::parse(&lines[1..close], 2)?)
        } else {
            None
        };

        let mut cells = Vec::new();

        // Anything between the header and the first marker is an
        // unmarked code cell, unless it is only blank separator lines.
        let leading_start = idx;
        while idx < lines.len() && !CellMarker::is_marker(lines[idx]) {
            idx += 1;
        }
        let mut leading = &lines[leading_start..idx];
        while leading.first() == Some(&"") {
            leading = &leading[1..];
        }
        if !leading.is_empty() {
            let source = finalize_body(leading, idx < lines.len(), CellType::Code);
            cells.push(ScriptCell::new(CellType::Code, source));
        }

        while idx < lines.len() {
            let marker = CellMarker::parse(lines[idx], idx + 1)?;
            idx += 1;
            let body_start = idx;
            while idx < lines.len() && !CellMarker::is_marker(lines[idx]) {
                idx += 1;
            }
            let source = finalize_body(
                &lines[body_start..idx],
                idx < lines.len(),
                marker.cell_type,
            );
            cells.push(ScriptCell { marker, source });
        }

        Ok(Script { header, cells })
    }

    /// Render the script, always ending with a newline.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(header) = &self.header {
            out.push_str(&header.render());
        }
        for (index, cell) in self.cells.iter().enumerate() {
            if self.header.is_some() || index > 0 {
                out.push('\n');
            }
            out.push_str(&cell.marker.render());
            out.push('\n');
            if cell.source.is_empty() {
                continue;
            }
            for line in cell.source.split('\n') {
                match cell.marker.cell_type {
                    CellType::Code => out.push_str(line),
                    CellType::Markdown | CellType::Raw => {
                        if line.is_empty() {
                            out.push('#');
                        } else {
                            out.push_str("# ");
                            out.push_str(line);
                        }
                    }
                }
                out.push('\n');
            }
        }
        out
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.render())?;
        Ok(())
    }
}

/// Turn body lines into a cell source: drop the one blank separator
/// line when another marker follows, uncomment markdown and raw
/// bodies, and join the rest with `\n`.
fn finalize_body(body: &[&str], has_next: bool, cell_type: CellType) -> String {
    let mut body = body;
    if has_next && body.last() == Some(&"") {
        body = &body[..body.len() - 1];
    }
    let lines: Vec<&str> = match cell_type {
        CellType::Code => body.to_vec(),
        CellType::Markdown | CellType::Raw => body.iter().map(|line| uncomment(line)).collect(),
    };
    lines.join("\n")
}

/// Strip one comment prefix. Lines without one pass through, matching
/// how permissively markdown regions are read elsewhere.
fn uncomment(line: &str) -> &str {
    line.strip_prefix("# ")
        .or_else(|| line.strip_prefix('#'))
        .unwrap_or(line)
}
