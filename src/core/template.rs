use regex::{Captures, Regex};
use std::sync::LazyLock;

/// `{name}` markers; names never contain braces or whitespace.
static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}\s]+)\}").expect("marker pattern is valid"));

/// A calculated-property template, parsed once at declaration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    references: Vec<String>,
}

impl Template {
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let references = extract_references(&source);
        Self { source, references }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Distinct referenced names, in order of first appearance.
    pub fn references(&self) -> &[String] {
        &self.references
    }

    pub fn render<F>(&self, lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        interpolate(&self.source, lookup)
    }
}

pub fn extract_references(template: &str) -> Vec<String> {
    let mut references: Vec<String> = Vec::new();
    for caps in MARKER.captures_iter(template) {
        let name = &caps[1];
        if !references.iter().any(|r| r == name) {
            references.push(name.to_string());
        }
    }
    references
}

/// Substitutes every marker with `lookup(name)`, or empty text when the lookup
/// has nothing. Substituted text is never scanned again.
pub fn interpolate<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    MARKER
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            match lookup(name) {
                Some(value) => value,
                None => {
                    tracing::debug!("Unresolved reference {{{}}} substituted with empty text", name);
                    String::new()
                }
            }
        })
        .into_owned()
}
