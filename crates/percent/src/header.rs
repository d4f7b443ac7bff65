//! Script header block.
//!
//! Percent scripts open with a comment-fenced metadata mapping:
//!
//! ```text
//! # ---
//! # jupyter:
//! #   jupytext:
//! #     text_representation:
//! #       extension: .py
//! #       format_name: percent
//! #       format_version: '1.3'
//! #   kernelspec:
//! #     display_name: lab
//! #     language: python
//! #     name: python3
//! # ---
//! ```
//!
//! The content is a restricted YAML mapping: nested maps via two-space
//! indentation and scalar leaves. That subset covers everything the
//! header carries, so this module parses and renders it directly
//! instead of pulling in a full YAML implementation. Sequences are
//! accepted only in JSON flow style (`key: [1, 2]`).

use ipynb::JsonMap;
use serde_json::Value;

use crate::Result;
use crate::error::PercentError;

/// Opening and closing fence line of the header block.
pub const HEADER_FENCE: &str = "# ---";

/// Notebook metadata keys mirrored into the script header. Everything
/// else in the notebook's metadata stays notebook-only.
pub const HEADER_METADATA_KEYS: [&str; 2] = ["jupytext", "kernelspec"];

const INDENT: usize = 2;

/// The metadata mapping carried under the header's `jupyter:` key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScriptHeader {
    pub metadata: JsonMap,
}

impl ScriptHeader {
    /// Build the header to write for a notebook with the given metadata.
    ///
    /// Only [`HEADER_METADATA_KEYS`] are mirrored, and the jupytext
    /// `text_representation` entry is pinned to this tool's output
    /// format. Other jupytext keys (`jupytext_version` among them) pass
    /// through untouched.
    pub fn from_metadata(metadata: &JsonMap) -> Self {
        let mut header = JsonMap::new();
        for key in HEADER_METADATA_KEYS {
            if let Some(value) = metadata.get(key) {
                header.insert(key.to_string(), value.clone());
            }
        }

        let mut jupytext = match header.remove("jupytext") {
            Some(Value::Object(map)) => map,
            _ => JsonMap::new(),
        };
        let mut representation = match jupytext.remove("text_representation") {
            Some(Value::Object(map)) => map,
            _ => JsonMap::new(),
        };
        representation.insert("extension".into(), Value::String(".py".into()));
        representation.insert("format_name".into(), Value::String("percent".into()));
        representation.insert("format_version".into(), Value::String("1.3".into()));
        jupytext.insert("text_representation".into(), Value::Object(representation));
        header.insert("jupytext".into(), Value::Object(jupytext));

        ScriptHeader { metadata: header }
    }

    /// Parse the comment lines between the two fences.
    ///
    /// `start_line` is the 1-based script line number of the first
    /// content line, used for error positions.
    pub fn parse(raw_lines: &[&str], start_line: usize) -> Result<Self> {
        let mut entries = Vec::with_capacity(raw_lines.len());
        for (offset, raw) in raw_lines.iter().enumerate() {
            let line_no = start_line + offset;
            let content = uncomment(raw)
                .ok_or_else(|| PercentError::header(line_no, "expected a comment line"))?;
            if content.trim().is_empty() {
                continue;
            }
            entries.push(Entry::parse(content, line_no)?);
        }

        let mut idx = 0;
        let root = build_mapping(&entries, &mut idx, 0)?;
        if let Some(entry) = entries.get(idx) {
            return Err(PercentError::header(entry.line, "unexpected indentation"));
        }

        let mut metadata = JsonMap::new();
        for (key, value) in root {
            if key != "jupyter" {
                return Err(PercentError::header(
                    start_line,
                    format!("unsupported top-level header key: {key}"),
                ));
            }
            match value {
                Value::Object(map) => metadata = map,
                _ => {
                    return Err(PercentError::header(
                        start_line,
                        "the jupyter key must hold a mapping",
                    ));
                }
            }
        }
        Ok(ScriptHeader { metadata })
    }

    /// Render the full fenced block, trailing newline included.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(HEADER_FENCE);
        out.push('\n');
        out.push_str("# jupyter:\n");
        render_mapping(&mut out, &self.metadata, 1);
        out.push_str(HEADER_FENCE);
        out.push('\n');
        out
    }
}

struct Entry {
    indent: usize,
    key: String,
    /// `None` marks a `key:` line opening a nested mapping.
    scalar: Option<String>,
    line: usize,
}

impl Entry {
    fn parse(content: &str, line: usize) -> Result<Self> {
        let indent = content.len() - content.trim_start_matches(' ').len();
        let body = &content[indent..];
        if body.starts_with('-') {
            return Err(PercentError::header(
                line,
                "block sequences are not supported in the header",
            ));
        }
        let Some(colon) = body.find(':') else {
            return Err(PercentError::header(line, "expected `key: value`"));
        };
        let key = body[..colon].trim().to_string();
        if key.is_empty() {
            return Err(PercentError::header(line, "empty key"));
        }
        let rest = body[colon + 1..].trim();
        let scalar = if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        };
        Ok(Entry {
            indent,
            key,
            scalar,
            line,
        })
    }
}

fn build_mapping(entries: &[Entry], idx: &mut usize, indent: usize) -> Result<JsonMap> {
    let mut map = JsonMap::new();
    while let Some(entry) = entries.get(*idx) {
        if entry.indent < indent {
            break;
        }
        if entry.indent > indent {
            return Err(PercentError::header(entry.line, "unexpected indentation"));
        }
        *idx += 1;
        let value = match &entry.scalar {
            Some(text) => parse_scalar(text),
            None => Value::Object(build_mapping(entries, idx, indent + INDENT)?),
        };
        map.insert(entry.key.clone(), value);
    }
    Ok(map)
}

/// Strip the comment prefix: `# ` or a bare `#`.
fn uncomment(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix("# ") {
        Some(rest)
    } else if let Some(rest) = line.strip_prefix('#') {
        Some(rest)
    } else {
        None
    }
}

fn parse_scalar(text: &str) -> Value {
    if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        return Value::String(text[1..text.len() - 1].replace("''", "'"));
    }
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            return value;
        }
        return Value::String(text[1..text.len() - 1].to_string());
    }
    match text {
        "null" | "~" => return Value::Null,
        "true" | "True" => return Value::Bool(true),
        "false" | "False" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = text.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(f) = text.parse::<f64>()
        && let Some(n) = serde_json::Number::from_f64(f)
    {
        return Value::Number(n);
    }
    if text.starts_with('[') || text.starts_with('{') {
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            return value;
        }
    }
    Value::String(text.to_string())
}

fn render_mapping(out: &mut String, map: &JsonMap, depth: usize) {
    for (key, value) in map {
        out.push_str("# ");
        for _ in 0..depth * INDENT {
            out.push(' ');
        }
        out.push_str(key);
        out.push(':');
        match value {
            Value::Object(child) => {
                out.push('\n');
                render_mapping(out, child, depth + 1);
            }
            other => {
                out.push(' ');
                out.push_str(&render_scalar(other));
                out.push('\n');
            }
        }
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) if needs_quoting(s) => format!("'{}'", s.replace('\'', "''")),
        Value::String(s) => s.clone(),
        // Sequences fall back to JSON flow style, which YAML accepts.
        other => other.to_string(),
    }
}

/// A bare string needs single quotes when the YAML reader would turn it
/// into some other type, or when it starts with a reserved character.
fn needs_quoting(s: &str) -> bool {
    if s.is_empty() || s.trim() != s {
        return true;
    }
    if s.parse::<f64>().is_ok() {
        return true;
    }
    if matches!(
        s,
        "null" | "~" | "true" | "True" | "false" | "False" | "yes" | "Yes" | "no" | "No"
    ) {
        return true;
    }
    if s.contains(": ") || s.ends_with(':') || s.contains(" #") {
        return true;
    }
    let first = s.chars().next().unwrap_or(' ');
    "'\"#&*?|>%@!`,[]{}-".contains(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS_HEADER: &str = "\
# ---
# jupyter:
#   jupytext:
#     text_representation:
#       extension: .py
#       format_name: percent
#       format_version: '1.3'
#       jupytext_version: 1.17.1
#   kernelspec:
#     display_name: lab-env
#     language: python
#     name: python3
# ---
";

    fn content_lines(block: &str) -> Vec<&str> {
        block
            .lines()
            .filter(|line| *line != HEADER_FENCE)
            .collect()
    }

    #[test]
    fn test_parse_corpus_header() {
        let header = ScriptHeader::parse(&content_lines(CORPUS_HEADER), 2).unwrap();

        let kernelspec = header.metadata.get("kernelspec").unwrap();
        assert_eq!(kernelspec["display_name"], "lab-env");
        assert_eq!(kernelspec["name"], "python3");

        let representation = &header.metadata["jupytext"]["text_representation"];
        assert_eq!(representation["format_version"], "1.3");
        assert_eq!(representation["jupytext_version"], "1.17.1");
    }

    #[test]
    fn test_render_matches_canonical_layout() {
        let header = ScriptHeader::parse(&content_lines(CORPUS_HEADER), 2).unwrap();
        assert_eq!(
            header.render(),
            CORPUS_HEADER,
            "rendering a parsed header must reproduce it byte for byte"
        );
    }

    #[test]
    fn test_from_metadata_pins_text_representation() {
        let mut metadata = JsonMap::new();
        metadata.insert(
            "kernelspec".into(),
            serde_json::json!({"display_name": "lab", "language": "python", "name": "python3"}),
        );
        metadata.insert("language_info".into(), serde_json::json!({"version": "3.11"}));

        let header = ScriptHeader::from_metadata(&metadata);
        let representation = &header.metadata["jupytext"]["text_representation"];
        assert_eq!(representation["extension"], ".py");
        assert_eq!(representation["format_name"], "percent");
        assert_eq!(representation["format_version"], "1.3");
        assert!(
            !header.metadata.contains_key("language_info"),
            "only jupytext and kernelspec belong in the header"
        );
    }

    #[test]
    fn test_version_like_strings_are_quoted() {
        assert_eq!(render_scalar(&Value::String("1.3".into())), "'1.3'");
        assert_eq!(render_scalar(&Value::String("1.17.1".into())), "1.17.1");
        assert_eq!(render_scalar(&Value::String(".py".into())), ".py");
        assert_eq!(render_scalar(&Value::String(String::new())), "''");
        assert_eq!(render_scalar(&Value::Bool(true)), "true");
    }

    #[test]
    fn test_quoted_scalars_round_trip() {
        assert_eq!(parse_scalar("'1.3'"), Value::String("1.3".into()));
        assert_eq!(parse_scalar("'it''s'"), Value::String("it's".into()));
        assert_eq!(parse_scalar("42"), Value::Number(42.into()));
        assert_eq!(parse_scalar("python3"), Value::String("python3".into()));
    }

    #[test]
    fn test_unsupported_top_level_key() {
        let lines = ["# title: notes"];
        let err = ScriptHeader::parse(&lines, 2).unwrap_err();
        assert!(
            err.to_string().contains("unsupported top-level header key"),
            "got: {err}"
        );
    }

    #[test]
    fn test_bad_indentation_is_rejected() {
        let lines = ["# jupyter:", "#    kernelspec:", "#      name: python3"];
        assert!(ScriptHeader::parse(&lines, 2).is_err());
    }

    #[test]
    fn test_header_without_jupyter_key_is_empty() {
        let header = ScriptHeader::parse(&[], 2).unwrap();
        assert!(header.metadata.is_empty());
    }
}
