//! Template parsing: distinguishes an exact object-reference (`{{ path }}`, the whole
//! string) from free text containing one or more `{{ expr }}` interpolations, and
//! renders the latter with silent-undefined semantics (never raises; unknown
//! identifiers render as empty text). The concrete mechanism mirrors a
//! `TemplateRenderer`-style silent-undefined Jinja engine without pulling in a
//! templating dependency, since the surface needed here is a single navigation path
//! per expression.

use once_cell::sync::Lazy;
use regex::Regex;

use super::data_source::DataSource;

static EXPR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{\s*([^{}]+?)\s*\}\}").unwrap());

/// An explicit "this whole value is one `{{ path }}` object reference" marker.
///
/// Distinguishes the object-reference fast path (§4.1: navigate and return the
/// referenced value unchanged, preserving its type) from general text interpolation,
/// without re-parsing the source string once the distinction has been made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub path: String,
}

impl Selector {
    /// Parses `s` as an exact-match object reference: the whole trimmed string is a
    /// single `{{ path }}`, with no other characters before or after.
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        let caps = EXPR.captures(trimmed)?;
        let whole = caps.get(0)?;
        if whole.start() == 0 && whole.end() == trimmed.len() {
            Some(Selector {
                path: caps.get(1)?.as_str().trim().to_string(),
            })
        } else {
            None
        }
    }
}

/// True if `s` contains at least one `{{ ... }}` expression.
pub fn contains_template(s: &str) -> bool {
    EXPR.is_match(s)
}

/// Renders `s` as text: each `{{ expr }}` is replaced by the stringified navigation
/// result, or the empty string if the path does not resolve. Never fails.
pub fn render_text(s: &str, data: &DataSource) -> String {
    EXPR.replace_all(s, |caps: &regex::Captures| {
        let path = caps[1].trim();
        match data.navigate(path) {
            Some(value) => stringify(&value),
            None => String::new(),
        }
    })
    .into_owned()
}

fn stringify(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
