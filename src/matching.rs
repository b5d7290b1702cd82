//! Matching Strategy (spec §4.4): scores how likely two elements are to
//! represent the same logical entity across revisions.

use crate::config::XmlDiffConfig;
use crate::node::XmlElement;
use crate::normalize::values_equal;

/// The engine treats any score below this as "never match" (spec §4.4,
/// §6: "0.0 = never match, >= 0.5 = match").
pub const MATCH_THRESHOLD: f64 = 0.5;

/// A pluggable element-similarity scorer (spec §9 design note: function
/// value or tagged variant; this crate uses a trait object, the same
/// shape as [`crate::config::ValueNormalizer`] and the teacher's
/// `PatternRule` trait).
///
/// Implementations must return `0.0` for a `None` operand and for a name
/// mismatch; a score of `0.0` always means "never match", any other
/// finite score is a candidate, with no fixed upper bound.
pub trait MatchingStrategy: Send + Sync {
    fn score(&self, e1: Option<&XmlElement>, e2: Option<&XmlElement>, config: &XmlDiffConfig) -> f64;
}

/// The default strategy (spec §4.4): name equality, key-attribute
/// equality, attribute-set overlap, leaf text equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMatchingStrategy;

impl MatchingStrategy for DefaultMatchingStrategy {
    fn score(&self, e1: Option<&XmlElement>, e2: Option<&XmlElement>, config: &XmlDiffConfig) -> f64 {
        default_score(e1, e2, config)
    }
}

/// Free function form, usable without constructing a [`DefaultMatchingStrategy`].
pub fn default_score(e1: Option<&XmlElement>, e2: Option<&XmlElement>, config: &XmlDiffConfig) -> f64 {
    let (e1, e2) = match (e1, e2) {
        (Some(a), Some(b)) => (a, b),
        _ => return 0.0,
    };

    if !e1.name.matches(&e2.name, config.namespace_comparison_mode) {
        return 0.0;
    }

    let mut score = 1.0;

    for key in &config.key_attribute_names {
        let a = e1.attributes.iter().find(|attr| attr.name.local == *key);
        let b = e2.attributes.iter().find(|attr| attr.name.local == *key);
        if let (Some(a), Some(b)) = (a, b) {
            if values_equal(Some(&a.value), Some(&b.value), config) {
                score += 10.0;
            }
        }
    }

    let a1 = comparable_attributes(e1, config);
    if !a1.is_empty() {
        let a2 = comparable_attributes(e2, config);
        let matched = a1
            .iter()
            .filter(|a| {
                a2.iter()
                    .any(|b| a.name.local == b.name.local && values_equal(Some(&a.value), Some(&b.value), config))
            })
            .count();
        score += matched as f64 / a1.len() as f64;
    }

    if !config.ignore_values && e1.is_leaf() && e2.is_leaf() {
        let t1 = e1.text_value();
        let t2 = e2.text_value();
        if values_equal(t1.as_deref(), t2.as_deref(), config) {
            score += 1.0;
        }
    }

    score
}

/// Attributes of `element` after excluding namespace declarations and
/// `config.excluded_attribute_names` (spec §4.4 step 5). Shared with the
/// diff engine's attribute-diffing pass (spec §4.5), which applies the
/// same exclusions.
pub(crate) fn comparable_attributes<'a>(
    element: &'a XmlElement,
    config: &XmlDiffConfig,
) -> Vec<&'a crate::node::XmlAttribute> {
    element
        .attributes
        .iter()
        .filter(|a| !a.name.is_namespace_declaration() && !config.is_excluded_attribute(&a.name.local))
        .collect()
}

pub fn is_match(score: f64) -> bool {
    score >= MATCH_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::XmlElement;

    #[test]
    fn none_operand_scores_zero() {
        let config = XmlDiffConfig::default();
        let e = XmlElement::new("a");
        assert_eq!(default_score(Some(&e), None, &config), 0.0);
        assert_eq!(default_score(None, None, &config), 0.0);
    }

    #[test]
    fn name_mismatch_scores_zero() {
        let config = XmlDiffConfig::default();
        let a = XmlElement::new("a");
        let b = XmlElement::new("b");
        assert_eq!(default_score(Some(&a), Some(&b), &config), 0.0);
    }

    #[test]
    fn key_attribute_boosts_score_above_threshold() {
        let config = XmlDiffConfig::builder().key_attribute_names(["id"]).build();
        let a = XmlElement::new("item").with_attribute("id", "1");
        let b = XmlElement::new("item").with_attribute("id", "1");
        assert!(is_match(default_score(Some(&a), Some(&b), &config)));
    }

    #[test]
    fn leaf_text_equality_contributes() {
        let config = XmlDiffConfig::default();
        let a = XmlElement::new("a").with_text("hello");
        let b = XmlElement::new("a").with_text("hello");
        let c = XmlElement::new("a").with_text("goodbye");
        let score_equal = default_score(Some(&a), Some(&b), &config);
        let score_diff = default_score(Some(&a), Some(&c), &config);
        assert!(score_equal > score_diff);
    }

    #[test]
    fn excluded_attributes_do_not_count() {
        let config = XmlDiffConfig::builder().excluded_attribute_names(["generated-at"]).build();
        let a = XmlElement::new("a").with_attribute("generated-at", "1");
        let b = XmlElement::new("a").with_attribute("generated-at", "2");
        // Only contributing term left is the base 1.0 name match.
        assert_eq!(default_score(Some(&a), Some(&b), &config), 1.0);
    }
}
