//! Cell marker lines.
//!
//! Every cell in a percent script opens with a `# %%` line. The marker
//! may carry an optional title, a cell-type tag and key=value
//! attributes:
//!
//! ```text
//! # %%
//! # %% Load the data
//! # %% [markdown]
//! # %% Overview [markdown] tags=["intro"]
//! ```
//!
//! Attribute values are JSON: quoted strings, numbers, booleans and
//! flow-style arrays all round-trip through cell metadata.

use ipynb::{CellType, JsonMap};
use serde_json::Value;

use crate::Result;
use crate::error::PercentError;

const MARKER: &str = "# %%";

#[derive(Debug, Clone, PartialEq)]
pub struct CellMarker {
    pub title: Option<String>,
    pub cell_type: CellType,
    pub attributes: JsonMap,
}

impl CellMarker {
    pub fn new(cell_type: CellType) -> Self {
        CellMarker {
            title: None,
            cell_type,
            attributes: JsonMap::new(),
        }
    }

    /// A line is a marker when it is `# %%` alone or followed by a space.
    ///
    /// `# %%time` is not a marker; that is a commented-out cell magic.
    pub fn is_marker(line: &str) -> bool {
        line == MARKER || line.starts_with("# %% ")
    }

    pub fn parse(line: &str, line_no: usize) -> Result<Self> {
        debug_assert!(Self::is_marker(line));
        let rest = line[MARKER.len()..].trim();

        let mut marker = CellMarker::new(CellType::Code);
        let mut title_tokens: Vec<String> = Vec::new();
        let mut in_tail = false;

        for token in tokenize(rest) {
            if !in_tail {
                match token.as_str() {
                    "[markdown]" | "[md]" => {
                        marker.cell_type = CellType::Markdown;
                        in_tail = true;
                        continue;
                    }
                    "[raw]" => {
                        marker.cell_type = CellType::Raw;
                        in_tail = true;
                        continue;
                    }
                    _ => {}
                }
                if looks_like_attribute(&token) {
                    in_tail = true;
                } else {
                    title_tokens.push(token);
                    continue;
                }
            }
            let (key, value) = parse_attribute(&token, line_no)?;
            marker.attributes.insert(key, value);
        }

        if !title_tokens.is_empty() {
            marker.title = Some(title_tokens.join(" "));
        }
        // A title that cannot sit bare on the marker line travels as a
        // `title` attribute instead; hoist it back out.
        if marker.title.is_none()
            && let Some(Value::String(text)) = marker.attributes.get("title")
        {
            marker.title = Some(text.clone());
            marker.attributes.remove("title");
        }
        Ok(marker)
    }

    pub fn render(&self) -> String {
        let mut out = String::from(MARKER);
        let mut quoted_title = None;
        if let Some(title) = &self.title {
            if title_is_plain(title) {
                out.push(' ');
                out.push_str(title);
            } else {
                quoted_title = Some(title);
            }
        }
        match self.cell_type {
            CellType::Code => {}
            CellType::Markdown => out.push_str(" [markdown]"),
            CellType::Raw => out.push_str(" [raw]"),
        }
        if let Some(title) = quoted_title {
            out.push_str(" title=");
            out.push_str(&Value::String(title.clone()).to_string());
        }
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push('=');
            // serde_json never emits spaces, so the value stays one token.
            out.push_str(&value.to_string());
        }
        out
    }
}

/// A title renders bare only when reparsing would read it back as the
/// same title: non-empty, single-space separated, no quotes, and no
/// token that reads as a type tag or attribute.
fn title_is_plain(title: &str) -> bool {
    if title.is_empty() || title.contains('"') || title.contains('\n') {
        return false;
    }
    let tokens: Vec<&str> = title.split_whitespace().collect();
    if tokens.join(" ") != title {
        return false;
    }
    !tokens.iter().any(|token| {
        matches!(*token, "[markdown]" | "[md]" | "[raw]") || looks_like_attribute(token)
    })
}

/// Split on whitespace, keeping double-quoted spans intact so values
/// like `title="run one"` stay a single token. Inside quotes a
/// backslash escapes the next character, matching what `serde_json`
/// writes for embedded quotes.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if in_quotes && c == '\\' {
            current.push(c);
            if let Some(escaped) = chars.next() {
                current.push(escaped);
            }
        } else if c == '"' {
            in_quotes = !in_quotes;
            current.push(c);
        } else if c.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// The first `key=` token ends the title and starts the attributes.
fn looks_like_attribute(token: &str) -> bool {
    match token.find('=') {
        Some(pos) if pos > 0 => token[..pos]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'),
        _ => false,
    }
}

fn parse_attribute(token: &str, line_no: usize) -> Result<(String, Value)> {
    let Some(pos) = token.find('=') else {
        return Err(PercentError::marker(
            line_no,
            format!("expected key=value, got `{token}`"),
        ));
    };
    let key = token[..pos].to_string();
    if key.is_empty() {
        return Err(PercentError::marker(line_no, "empty attribute key"));
    }
    let raw = &token[pos + 1..];
    let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.into()));
    Ok((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_code_marker() {
        let marker = CellMarker::parse("# %%", 1).unwrap();
        assert_eq!(marker.cell_type, CellType::Code);
        assert_eq!(marker.title, None);
        assert!(marker.attributes.is_empty());
        assert_eq!(marker.render(), "# %%");
    }

    #[test]
    fn test_markdown_tag() {
        let marker = CellMarker::parse("# %% [markdown]", 1).unwrap();
        assert_eq!(marker.cell_type, CellType::Markdown);
        assert_eq!(marker.render(), "# %% [markdown]");
    }

    #[test]
    fn test_md_alias_is_normalized() {
        let marker = CellMarker::parse("# %% [md]", 1).unwrap();
        assert_eq!(marker.cell_type, CellType::Markdown);
        assert_eq!(marker.render(), "# %% [markdown]");
    }

    #[test]
    fn test_title_before_tag() {
        let marker = CellMarker::parse("# %% Load the data [raw]", 3).unwrap();
        assert_eq!(marker.title.as_deref(), Some("Load the data"));
        assert_eq!(marker.cell_type, CellType::Raw);
        assert_eq!(marker.render(), "# %% Load the data [raw]");
    }

    #[test]
    fn test_attribute_values() {
        let marker =
            CellMarker::parse(r#"# %% Run [markdown] tags=["intro","db"] retries=3 slow=true"#, 1)
                .unwrap();
        assert_eq!(marker.title.as_deref(), Some("Run"));
        assert_eq!(marker.attributes["tags"], serde_json::json!(["intro", "db"]));
        assert_eq!(marker.attributes["retries"], serde_json::json!(3));
        assert_eq!(marker.attributes["slow"], serde_json::json!(true));
    }

    #[test]
    fn test_bare_attribute_value_is_a_string() {
        let marker = CellMarker::parse("# %% kind=setup", 1).unwrap();
        assert_eq!(marker.attributes["kind"], serde_json::json!("setup"));
        assert_eq!(marker.render(), r#"# %% kind="setup""#);
    }

    #[test]
    fn test_quoted_value_with_spaces() {
        let marker = CellMarker::parse(r#"# %% name="run one""#, 1).unwrap();
        assert_eq!(marker.attributes["name"], serde_json::json!("run one"));
        assert_eq!(marker.render(), r#"# %% name="run one""#);
    }

    #[test]
    fn test_equals_inside_title_stays_title() {
        // `y = x` reads as a title: the `=` token is not key=value shaped.
        let marker = CellMarker::parse("# %% y = x plot", 1).unwrap();
        assert_eq!(marker.title.as_deref(), Some("y = x plot"));
        assert!(marker.attributes.is_empty());
    }

    #[test]
    fn test_escaped_quote_inside_value_round_trips() {
        let mut marker = CellMarker::new(CellType::Code);
        marker
            .attributes
            .insert("note".into(), serde_json::json!("a \" b"));

        let line = marker.render();
        assert_eq!(line, r#"# %% note="a \" b""#);
        let reparsed = CellMarker::parse(&line, 1).unwrap();
        assert_eq!(reparsed, marker, "escapes must not end the quoted span");
    }

    #[test]
    fn test_title_containing_tag_token_round_trips() {
        let mut marker = CellMarker::new(CellType::Code);
        marker.title = Some("see [markdown] docs".into());

        let line = marker.render();
        assert_eq!(line, r#"# %% title="see [markdown] docs""#);
        assert_eq!(CellMarker::parse(&line, 1).unwrap(), marker);
    }

    #[test]
    fn test_title_with_irregular_spacing_round_trips() {
        let mut marker = CellMarker::new(CellType::Markdown);
        marker.title = Some("two  spaces".into());

        let line = marker.render();
        let reparsed = CellMarker::parse(&line, 1).unwrap();
        assert_eq!(reparsed, marker, "bare titles collapse spacing; quoted ones must not");
    }

    #[test]
    fn test_marker_detection() {
        assert!(CellMarker::is_marker("# %%"));
        assert!(CellMarker::is_marker("# %% [markdown]"));
        assert!(!CellMarker::is_marker("# %%time"));
        assert!(!CellMarker::is_marker("## %%"));
        assert!(!CellMarker::is_marker("print('# %%')"));
    }
}
