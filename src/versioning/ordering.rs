// src/versioning/ordering.rs
//! Structured version-label comparison.
//!
//! Real-world labels mix plain dotted numerics ("2.14.1") with free text
//! ("2.0 beta", "v3"). Labels are tokenized into dot-separated components,
//! each either an integer or text. Components compare numerically when both
//! sides are numeric; any other pairing falls back to lexical comparison of
//! that component only — never of the whole label.

use std::cmp::Ordering;

/// One dot-separated component of a version label.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Component {
    Numeric(u64),
    Text(String),
}

impl Component {
    fn parse(raw: &str) -> Self {
        if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
            // Labels with absurdly long digit runs fall back to text
            match raw.parse::<u64>() {
                Ok(n) => Component::Numeric(n),
                Err(_) => Component::Text(raw.to_string()),
            }
        } else {
            Component::Text(raw.to_string())
        }
    }

    /// Textual form used when a numeric component meets a text component.
    fn as_text(&self) -> String {
        match self {
            Component::Numeric(n) => n.to_string(),
            Component::Text(s) => s.clone(),
        }
    }
}

fn compare_components(a: &Component, b: &Component) -> Ordering {
    match (a, b) {
        (Component::Numeric(x), Component::Numeric(y)) => x.cmp(y),
        (Component::Text(x), Component::Text(y)) => x.cmp(y),
        _ => a.as_text().cmp(&b.as_text()),
    }
}

/// A version label parsed into an ordered token sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTokens {
    components: Vec<Component>,
}

impl VersionTokens {
    pub fn parse(label: &str) -> Self {
        let components = label
            .trim()
            .split('.')
            .map(Component::parse)
            .collect();
        Self { components }
    }
}

impl PartialOrd for VersionTokens {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionTokens {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.components.iter().zip(other.components.iter()) {
            match compare_components(a, b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        // Equal prefix: the label with more components is the later release
        self.components.len().cmp(&other.components.len())
    }
}

/// Whether label `a` denotes a strictly later release than label `b`.
pub fn is_version_higher(a: &str, b: &str) -> bool {
    VersionTokens::parse(a) > VersionTokens::parse(b)
}
