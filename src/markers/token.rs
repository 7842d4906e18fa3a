//! Asset reference token grammar.
//!
//! A token is `[[ASSET:<id>]]` where the id starts with an ASCII letter or
//! digit and continues with letters, digits, `_`, `.` or `-`. Any other `[[`
//! construct in block content is malformed.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Opening delimiter of every bracket construct.
pub const TOKEN_OPEN: &str = "[[";

const TOKEN_PREFIX: &str = "[[ASSET:";
const TOKEN_CLOSE: &str = "]]";
const SNIPPET_CHARS: usize = 40;

fn token_at_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[\[ASSET:([A-Za-z0-9][A-Za-z0-9_.\-]*)\]\]").expect("token pattern is valid")
    })
}

fn asset_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$").expect("id pattern is valid"))
}

/// Check whether an asset ID can be embedded in a token.
pub fn is_valid_asset_id(id: &str) -> bool {
    asset_id_pattern().is_match(id)
}

/// Token text for an asset ID.
pub fn token_for(asset_id: &str) -> String {
    format!("{}{}{}", TOKEN_PREFIX, asset_id, TOKEN_CLOSE)
}

/// A well-formed token found in text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerRef {
    /// Referenced asset ID
    pub asset_id: String,
    /// Byte range of the whole token
    pub range: Range<usize>,
}

/// A bracket construct found in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Construct {
    Token(MarkerRef),
    Malformed(String),
}

/// Walk every `[[` in the text and classify it.
pub(crate) fn scan(text: &str) -> Vec<Construct> {
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find(TOKEN_OPEN) {
        let start = pos + offset;
        let rest = &text[start..];

        if let Some(caps) = token_at_start().captures(rest) {
            let whole = caps.get(0).map_or(0, |m| m.end());
            let id = caps.get(1).map_or("", |m| m.as_str());
            found.push(Construct::Token(MarkerRef {
                asset_id: id.to_string(),
                range: start..start + whole,
            }));
            pos = start + whole;
        } else {
            let end = rest
                .find(TOKEN_CLOSE)
                .map_or(rest.len(), |e| e + TOKEN_CLOSE.len());
            let snippet: String = rest[..end].chars().take(SNIPPET_CHARS).collect();
            found.push(Construct::Malformed(snippet));
            pos = start + TOKEN_OPEN.len();
        }
    }

    found
}

/// Every well-formed token in the text, in order of appearance.
pub fn find_markers(text: &str) -> Vec<MarkerRef> {
    scan(text)
        .into_iter()
        .filter_map(|c| match c {
            Construct::Token(marker) => Some(marker),
            Construct::Malformed(_) => None,
        })
        .collect()
}

/// Remove tokens and the separators the injector placed around them.
pub fn strip_markers(text: &str) -> String {
    let markers = find_markers(text);
    if markers.is_empty() {
        return text.to_string();
    }

    // Merge adjacent tokens into runs.
    let mut runs: Vec<Range<usize>> = Vec::new();
    for marker in markers {
        match runs.last_mut() {
            Some(run) if run.end == marker.range.start => run.end = marker.range.end,
            _ => runs.push(marker.range),
        }
    }

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for run in runs {
        let mut start = run.start;
        let mut end = run.end;
        let before = &text[cursor..start];
        let at_line_start = text[..start].trim_end_matches([' ', '\t']).is_empty()
            || text[..start].ends_with('\n');

        if at_line_start && (text[end..].starts_with('\n') || text[end..].starts_with(' ')) {
            end += 1;
        } else if end == text.len() && before.ends_with('\n') {
            start -= 1;
        }

        out.push_str(&text[cursor..start]);
        cursor = end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_format() {
        assert_eq!(token_for("img-1"), "[[ASSET:img-1]]");
        assert!(is_valid_asset_id("p3_img.2-a"));
        assert!(!is_valid_asset_id(""));
        assert!(!is_valid_asset_id("-lead"));
        assert!(!is_valid_asset_id("has space"));
        assert!(!is_valid_asset_id("br]]acket"));
    }

    #[test]
    fn test_find_markers() {
        let text = "[[ASSET:a]][[ASSET:b]]\nBody [[ASSET:c]] end";
        let found = find_markers(text);
        let ids: Vec<&str> = found.iter().map(|m| m.asset_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(&text[found[2].range.clone()], "[[ASSET:c]]");
    }

    #[test]
    fn test_scan_malformed() {
        let text = "See [[figure 2]] and [[ASSET:ok]] and [[ASSET:bad id]] and [[";
        let constructs = scan(text);
        assert_eq!(constructs.len(), 4);
        assert_eq!(constructs[0], Construct::Malformed("[[figure 2]]".to_string()));
        assert!(matches!(&constructs[1], Construct::Token(m) if m.asset_id == "ok"));
        assert_eq!(constructs[2], Construct::Malformed("[[ASSET:bad id]]".to_string()));
        assert_eq!(constructs[3], Construct::Malformed("[[".to_string()));
    }

    #[test]
    fn test_single_brackets_ignored() {
        assert!(scan("A [note] and [1] reference").is_empty());
    }

    #[test]
    fn test_strip_markers() {
        assert_eq!(strip_markers("[[ASSET:a]][[ASSET:b]]\nBody text"), "Body text");
        assert_eq!(strip_markers("Heading\n[[ASSET:a]]"), "Heading");
        assert_eq!(strip_markers("  [[ASSET:a]] Figure 1. Caption"), "  Figure 1. Caption");
        assert_eq!(strip_markers("Inline [[ASSET:a]] token"), "Inline  token");
        assert_eq!(strip_markers("No tokens"), "No tokens");
    }
}
