//! Conversions between scripts and notebooks.
//!
//! Scripts carry no outputs, execution counts or cell ids, so
//! converting a script over an existing notebook pairs cells by
//! position and reuses those fields instead of discarding them.

use ipynb::{Cell, CellType, Notebook, new_cell_id};
use serde_json::Value;

use crate::header::ScriptHeader;
use crate::marker::CellMarker;
use crate::script::{Script, ScriptCell};

/// Build the script representation of a notebook.
///
/// The header mirrors the notebook's jupytext and kernelspec metadata;
/// each cell's remaining metadata rides on its marker line, with the
/// `title` entry rendered as the marker title.
pub fn notebook_to_script(notebook: &Notebook) -> Script {
    let cells = notebook
        .cells
        .iter()
        .map(|cell| {
            let mut marker = CellMarker::new(cell.cell_type());
            for (key, value) in cell.metadata() {
                if key == "title" && value.is_string() {
                    marker.title = value.as_str().map(str::to_string);
                } else {
                    marker.attributes.insert(key.clone(), value.clone());
                }
            }
            ScriptCell {
                marker,
                source: cell.source().to_string(),
            }
        })
        .collect();

    Script {
        header: Some(ScriptHeader::from_metadata(&notebook.metadata)),
        cells,
    }
}

/// Build a notebook from a script, carrying state over from `existing`
/// when a previous notebook version is available.
///
/// Notebook metadata starts from the existing notebook so that keys the
/// script does not carry (language_info and friends) survive; header
/// keys overwrite their counterparts. Cells pair by position: a
/// matching cell type keeps its id, and an unchanged code source also
/// keeps its outputs and execution count.
pub fn script_to_notebook(script: &Script, existing: Option<&Notebook>) -> Notebook {
    let mut metadata = existing.map(|nb| nb.metadata.clone()).unwrap_or_default();
    if let Some(header) = &script.header {
        for (key, value) in &header.metadata {
            metadata.insert(key.clone(), value.clone());
        }
    }

    let cells = script
        .cells
        .iter()
        .enumerate()
        .map(|(index, cell)| {
            let previous = existing
                .and_then(|nb| nb.cells.get(index))
                .filter(|prev| prev.cell_type() == cell.marker.cell_type);
            build_cell(cell, previous)
        })
        .collect();

    Notebook {
        cells,
        metadata,
        ..Notebook::default()
    }
}

fn build_cell(cell: &ScriptCell, previous: Option<&Cell>) -> Cell {
    let id = previous
        .map(|prev| prev.id().to_string())
        .unwrap_or_else(new_cell_id);

    let mut metadata = cell.marker.attributes.clone();
    if let Some(title) = &cell.marker.title {
        metadata.insert("title".into(), Value::String(title.clone()));
    }

    let source = cell.source.clone();
    match cell.marker.cell_type {
        CellType::Code => {
            let (execution_count, outputs) = match previous {
                Some(Cell::Code {
                    execution_count,
                    outputs,
                    source: prev_source,
                    ..
                }) if *prev_source == source => (*execution_count, outputs.clone()),
                _ => (None, Vec::new()),
            };
            Cell::Code {
                execution_count,
                id,
                metadata,
                outputs,
                source,
            }
        }
        CellType::Markdown => Cell::Markdown {
            id,
            metadata,
            source,
        },
        CellType::Raw => Cell::Raw {
            id,
            metadata,
            source,
        },
    }
}
