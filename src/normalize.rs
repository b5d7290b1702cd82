//! Value Normalizer (spec §4.1).
//!
//! `normalize` is the single comparison gate used everywhere a textual
//! value is compared: attribute values, leaf text, CDATA contents when
//! `normalize_cdata_whitespace` is set.

use crate::config::XmlDiffConfig;

/// Canonicalize `value` under `config`. Null-preserving: `None` in,
/// `None` out (spec §4.1).
pub fn normalize(value: Option<&str>, config: &XmlDiffConfig) -> Option<String> {
    let mut current = value.map(str::to_string)?;

    if config.trim_values {
        current = current.trim().to_string();
    }
    if config.ignore_newlines {
        current = current.chars().filter(|c| *c != '\r' && *c != '\n').collect();
    }
    if config.ignore_whitespace {
        current = collapse_whitespace(&current);
    }
    if config.ignore_case {
        current = current.to_lowercase();
    }

    let mut result = Some(current);
    for normalizer in &config.value_normalizers {
        result = normalizer.normalize(result.as_deref());
    }
    result
}

/// Collapse runs of whitespace into a single space (spec §4.1).
fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Compare two optional values under `config`'s normalization pipeline.
pub fn values_equal(a: Option<&str>, b: Option<&str>, config: &XmlDiffConfig) -> bool {
    normalize(a, config) == normalize(b, config)
}
