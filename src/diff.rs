//! Diff Engine (spec §4.5): recursively pairs the elements of two XML
//! documents and produces a hierarchical [`DiffMatch`] tree.
//!
//! Grounded in the teacher's `amalgamator::amalgamate_node`, which also
//! walks two trees top-down deciding Merged/Conflict per node — here the
//! walk is two-way (old vs new) rather than three-way, and the per-node
//! decision is a `DiffType` rather than a merge outcome. Sibling pairing
//! reuses [`crate::matching`] for scoring and [`crate::lcs`] for the
//! in-order alignment, the same way the teacher's `matcher::match_trees`
//! pairs CST children before `amalgamator` recurses into them.

use std::collections::{HashMap, HashSet};

use crate::config::{NodePreservationMode, NodePreservationSettings, XmlDiffConfig};
use crate::lcs::{lcs_by, longest_increasing_subsequence};
use crate::matching::{self, DefaultMatchingStrategy, MatchingStrategy};
use crate::node::{NonElementNode, XmlElement};
use crate::normalize::values_equal;
use crate::path;

/// Per-node or per-detail change classification (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffType {
    Unchanged,
    Added,
    Deleted,
    Modified,
}

/// One attribute's change, keyed by local name (spec §3). Only
/// non-`Unchanged` attributes appear here — an `Unchanged` attribute
/// contributes nothing to distinguish its element from identical, the
/// same way the recursion's own emptiness check treats "no diffs" as
/// the signal for `DiffType::Unchanged` (spec §4.5 Recursion).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDiff {
    pub name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub diff_type: DiffType,
}

/// A leaf element's text-content change (spec §3, §4.5). Always
/// `DiffType::Modified` when present; `None` means the values compared
/// equal under normalization, or one side isn't a leaf, or
/// `ignore_values` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDiff {
    pub old_text: String,
    pub new_text: String,
    pub diff_type: DiffType,
}

/// A comment/CDATA/processing-instruction change, when node
/// preservation is enabled (spec §6). Only non-`Unchanged` entries are
/// reported, same convention as [`AttributeDiff`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonElementDiff {
    pub diff_type: DiffType,
    pub old: Option<NonElementNode>,
    pub new: Option<NonElementNode>,
}

/// A node of the hierarchical diff tree (spec §3).
///
/// `original`/`modified` borrow directly from the input documents rather
/// than cloning them (spec §9 design note: "borrowed, not owned");
/// callers must keep both input trees alive for as long as they hold a
/// `DiffMatch`.
#[derive(Debug, Clone)]
pub struct DiffMatch<'a> {
    pub diff_type: DiffType,
    pub path: String,
    pub original: Option<&'a XmlElement>,
    pub modified: Option<&'a XmlElement>,
    pub attribute_diffs: Vec<AttributeDiff>,
    pub value_diff: Option<ValueDiff>,
    pub children: Vec<DiffMatch<'a>>,
    pub non_element_diffs: Vec<NonElementDiff>,
}

/// Diff two documents using the default matching strategy (spec §4.4).
///
/// Returns `Err(XmlDiffError::ConfigurationError)` if `config` is
/// internally contradictory (spec §7) — currently, a `key_attribute_names`
/// entry that also appears in `excluded_attribute_names`.
pub fn diff<'a>(
    original_root: &'a XmlElement,
    new_root: &'a XmlElement,
    config: &XmlDiffConfig,
) -> crate::error::Result<DiffMatch<'a>> {
    diff_with_strategy(original_root, new_root, config, &DefaultMatchingStrategy)
}

/// Diff two documents using a caller-supplied [`MatchingStrategy`] (spec
/// §4.4, §9: strategies are pluggable). See [`diff`] for the error
/// contract.
pub fn diff_with_strategy<'a>(
    original_root: &'a XmlElement,
    new_root: &'a XmlElement,
    config: &XmlDiffConfig,
    strategy: &dyn MatchingStrategy,
) -> crate::error::Result<DiffMatch<'a>> {
    config.validate()?;
    let root_path = path::root_path(&new_root.name);
    tracing::debug!(path = %root_path, "starting diff");
    Ok(diff_node(original_root, new_root, &root_path, config, strategy))
}

/// Diff a single matched pair of elements: attributes, leaf value,
/// non-element nodes, and children (spec §4.5 Recursion).
fn diff_node<'a>(
    old: &'a XmlElement,
    new: &'a XmlElement,
    path_str: &str,
    config: &XmlDiffConfig,
    strategy: &dyn MatchingStrategy,
) -> DiffMatch<'a> {
    let attribute_diffs = diff_attributes(old, new, config);
    let value_diff = diff_value(old, new, config);
    let non_element_diffs = diff_non_element_nodes(old, new, config);
    let children = diff_children(old, new, path_str, config, strategy);

    let unchanged = attribute_diffs.is_empty()
        && value_diff.is_none()
        && non_element_diffs.is_empty()
        && children.iter().all(|c| c.diff_type == DiffType::Unchanged);

    DiffMatch {
        diff_type: if unchanged { DiffType::Unchanged } else { DiffType::Modified },
        path: path_str.to_string(),
        original: Some(old),
        modified: Some(new),
        attribute_diffs,
        value_diff,
        children,
        non_element_diffs,
    }
}

/// Attribute diffing (spec §4.5): skip namespace declarations and
/// `excluded_attribute_names`, compare the rest by local name
/// (respecting `namespace_comparison_mode`).
fn diff_attributes(old: &XmlElement, new: &XmlElement, config: &XmlDiffConfig) -> Vec<AttributeDiff> {
    let old_attrs = matching::comparable_attributes(old, config);
    let new_attrs = matching::comparable_attributes(new, config);
    let mut seen_new = vec![false; new_attrs.len()];
    let mut diffs = Vec::new();

    for a in &old_attrs {
        match new_attrs
            .iter()
            .enumerate()
            .find(|(_, b)| a.name.matches(&b.name, config.namespace_comparison_mode))
        {
            Some((j, b)) => {
                seen_new[j] = true;
                if !values_equal(Some(&a.value), Some(&b.value), config) {
                    diffs.push(AttributeDiff {
                        name: a.name.local.clone(),
                        old_value: Some(a.value.clone()),
                        new_value: Some(b.value.clone()),
                        diff_type: DiffType::Modified,
                    });
                }
            }
            None => diffs.push(AttributeDiff {
                name: a.name.local.clone(),
                old_value: Some(a.value.clone()),
                new_value: None,
                diff_type: DiffType::Deleted,
            }),
        }
    }
    for (j, b) in new_attrs.iter().enumerate() {
        if !seen_new[j] {
            diffs.push(AttributeDiff {
                name: b.name.local.clone(),
                old_value: None,
                new_value: Some(b.value.clone()),
                diff_type: DiffType::Added,
            });
        }
    }
    diffs
}

/// Leaf value diffing (spec §4.5): only applies when both sides are
/// leaves (no element children on either side).
fn diff_value(old: &XmlElement, new: &XmlElement, config: &XmlDiffConfig) -> Option<ValueDiff> {
    if config.ignore_values || !old.is_leaf() || !new.is_leaf() {
        return None;
    }
    let old_text = old.text_value();
    let new_text = new.text_value();
    if values_equal(old_text.as_deref(), new_text.as_deref(), config) {
        return None;
    }
    Some(ValueDiff {
        old_text: old_text.unwrap_or_default(),
        new_text: new_text.unwrap_or_default(),
        diff_type: DiffType::Modified,
    })
}

/// Pair and recurse into element children (spec §4.5: "Pairing
/// children", "In-order alignment", "Ordering of children in the
/// output").
fn diff_children<'a>(
    old: &'a XmlElement,
    new: &'a XmlElement,
    parent_path: &str,
    config: &XmlDiffConfig,
    strategy: &dyn MatchingStrategy,
) -> Vec<DiffMatch<'a>> {
    let old_children = old.element_children();
    let new_children = new.element_children();

    // Pairing: for each new child in order, pick the best unmatched old
    // child scoring >= threshold, earliest position breaking ties.
    let mut old_matched: Vec<Option<usize>> = vec![None; old_children.len()];
    let mut new_matched: Vec<Option<usize>> = vec![None; new_children.len()];
    for (ni, n) in new_children.iter().enumerate() {
        let mut best: Option<(usize, f64)> = None;
        for (oi, o) in old_children.iter().enumerate() {
            if old_matched[oi].is_some() {
                continue;
            }
            let score = strategy.score(Some(o), Some(n), config);
            if score < matching::MATCH_THRESHOLD {
                continue;
            }
            if best.map(|(_, best_score)| score > best_score).unwrap_or(true) {
                best = Some((oi, score));
            }
        }
        if let Some((oi, _)) = best {
            old_matched[oi] = Some(ni);
            new_matched[ni] = Some(oi);
        }
    }

    // In-order alignment: the backbone is the longest increasing
    // subsequence of new-positions among matched pairs ordered by
    // old-position. Pairs off the backbone still recurse normally but
    // are forced to `Modified` to flag the reorder (spec: "must not
    // introduce spurious Added/Deleted for reorderings").
    let matched_pairs_by_old: Vec<(usize, usize)> = old_matched
        .iter()
        .enumerate()
        .filter_map(|(oi, mni)| mni.map(|ni| (oi, ni)))
        .collect();
    let new_idx_seq: Vec<usize> = matched_pairs_by_old.iter().map(|&(_, ni)| ni).collect();
    let backbone_old_indices: HashSet<usize> = longest_increasing_subsequence(&new_idx_seq)
        .into_iter()
        .map(|pos| matched_pairs_by_old[pos].0)
        .collect();

    // Present (Added + matched) nodes, in new-document order.
    let mut same_name_new: HashMap<&str, usize> = HashMap::new();
    let mut present: Vec<DiffMatch<'a>> = Vec::with_capacity(new_children.len());
    for (ni, n) in new_children.iter().enumerate() {
        let idx = {
            let counter = same_name_new.entry(n.name.local.as_str()).or_insert(0);
            *counter += 1;
            *counter
        };
        let child_path = path::child_path(parent_path, &n.name, idx);
        let node = match new_matched[ni] {
            Some(oi) => {
                let mut dm = diff_node(old_children[oi], n, &child_path, config, strategy);
                if !backbone_old_indices.contains(&oi) {
                    dm.diff_type = DiffType::Modified;
                }
                dm
            }
            None => build_added_subtree(n, &child_path),
        };
        present.push(node);
    }

    // Deleted nodes: path built from their position among same-named
    // siblings in the ORIGINAL document (spec §6), spliced back in just
    // before the next kept sibling (spec §4.5 "Ordering of children").
    let mut next_kept_old: Vec<Option<usize>> = vec![None; old_children.len()];
    {
        let mut next: Option<usize> = None;
        for oi in (0..old_children.len()).rev() {
            next_kept_old[oi] = next;
            if old_matched[oi].is_some() {
                next = Some(oi);
            }
        }
    }
    let mut same_name_old: HashMap<&str, usize> = HashMap::new();
    let mut deleted_by_anchor: HashMap<Option<usize>, Vec<DiffMatch<'a>>> = HashMap::new();
    for (oi, o) in old_children.iter().enumerate() {
        let idx = {
            let counter = same_name_old.entry(o.name.local.as_str()).or_insert(0);
            *counter += 1;
            *counter
        };
        if old_matched[oi].is_none() {
            let child_path = path::child_path(parent_path, &o.name, idx);
            deleted_by_anchor
                .entry(next_kept_old[oi])
                .or_default()
                .push(build_deleted_subtree(o, &child_path));
        }
    }

    let mut result = Vec::with_capacity(present.len());
    for (ni, node) in present.into_iter().enumerate() {
        if let Some(oi) = new_matched[ni] {
            if let Some(dels) = deleted_by_anchor.remove(&Some(oi)) {
                result.extend(dels);
            }
        }
        result.push(node);
    }
    if let Some(dels) = deleted_by_anchor.remove(&None) {
        result.extend(dels);
    }
    result
}

fn build_added_subtree<'a>(new: &'a XmlElement, path_str: &str) -> DiffMatch<'a> {
    DiffMatch {
        diff_type: DiffType::Added,
        path: path_str.to_string(),
        original: None,
        modified: Some(new),
        attribute_diffs: Vec::new(),
        value_diff: None,
        children: build_subtree_children(new, path_str, DiffType::Added),
        non_element_diffs: Vec::new(),
    }
}

fn build_deleted_subtree<'a>(old: &'a XmlElement, path_str: &str) -> DiffMatch<'a> {
    DiffMatch {
        diff_type: DiffType::Deleted,
        path: path_str.to_string(),
        original: Some(old),
        modified: None,
        attribute_diffs: Vec::new(),
        value_diff: None,
        children: build_subtree_children(old, path_str, DiffType::Deleted),
        non_element_diffs: Vec::new(),
    }
}

/// Recursively mark an entire subtree Added or Deleted, the way the
/// rest of a wholly-new (or wholly-removed) element is reported: no
/// attribute/value/non-element diffs, just the element and its children
/// carried at the same `DiffType`.
fn build_subtree_children<'a>(element: &'a XmlElement, parent_path: &str, diff_type: DiffType) -> Vec<DiffMatch<'a>> {
    let mut counter: HashMap<&str, usize> = HashMap::new();
    element
        .element_children()
        .into_iter()
        .map(|child| {
            let idx = {
                let c = counter.entry(child.name.local.as_str()).or_insert(0);
                *c += 1;
                *c
            };
            let child_path = path::child_path(parent_path, &child.name, idx);
            match diff_type {
                DiffType::Added => build_added_subtree(child, &child_path),
                DiffType::Deleted => build_deleted_subtree(child, &child_path),
                _ => unreachable!("build_subtree_children only used for Added/Deleted subtrees"),
            }
        })
        .collect()
}

/// Non-element node diffing (spec §6), gated on `node_preservation`.
fn diff_non_element_nodes(old: &XmlElement, new: &XmlElement, config: &XmlDiffConfig) -> Vec<NonElementDiff> {
    let settings = &config.node_preservation;
    if settings.mode == NodePreservationMode::None {
        return Vec::new();
    }
    let mut diffs = Vec::new();
    if matches!(settings.mode, NodePreservationMode::PreserveAll | NodePreservationMode::CommentsOnly) {
        diffs.extend(diff_comments(old, new, config, settings));
    }
    if matches!(settings.mode, NodePreservationMode::PreserveAll | NodePreservationMode::CDataOnly) {
        diffs.extend(diff_cdata(old, new, config, settings));
    }
    if matches!(
        settings.mode,
        NodePreservationMode::PreserveAll | NodePreservationMode::ProcessingInstructionsOnly
    ) {
        diffs.extend(diff_processing_instructions(old, new, config, settings));
    }
    diffs
}

fn comments_of(element: &XmlElement) -> Vec<String> {
    element
        .non_element_children()
        .into_iter()
        .filter_map(|(_, n)| match n {
            NonElementNode::Comment(c) => Some(c.clone()),
            _ => None,
        })
        .collect()
}

fn cdata_of(element: &XmlElement) -> Vec<String> {
    element
        .non_element_children()
        .into_iter()
        .filter_map(|(_, n)| match n {
            NonElementNode::CData(c) => Some(c.clone()),
            _ => None,
        })
        .collect()
}

fn processing_instructions_of(element: &XmlElement) -> Vec<(String, String)> {
    element
        .non_element_children()
        .into_iter()
        .filter_map(|(_, n)| match n {
            NonElementNode::ProcessingInstruction { target, data } => Some((target.clone(), data.clone())),
            _ => None,
        })
        .collect()
}

fn diff_comments(
    old: &XmlElement,
    new: &XmlElement,
    config: &XmlDiffConfig,
    settings: &NodePreservationSettings,
) -> Vec<NonElementDiff> {
    let old_c = comments_of(old);
    let new_c = comments_of(new);
    let eq = |a: &String, b: &String| values_equal(Some(a), Some(b), config);
    let entries = if settings.track_comment_position {
        ordered_diff(&old_c, &new_c, eq)
    } else {
        unordered_diff(&old_c, &new_c, eq)
    };
    entries
        .into_iter()
        .filter(|(t, _, _)| *t != DiffType::Unchanged)
        .map(|(t, o, n)| NonElementDiff {
            diff_type: t,
            old: o.map(NonElementNode::Comment),
            new: n.map(NonElementNode::Comment),
        })
        .collect()
}

fn diff_cdata(
    old: &XmlElement,
    new: &XmlElement,
    config: &XmlDiffConfig,
    settings: &NodePreservationSettings,
) -> Vec<NonElementDiff> {
    let old_c = cdata_of(old);
    let new_c = cdata_of(new);
    let eq = |a: &String, b: &String| {
        if settings.normalize_cdata_whitespace {
            values_equal(Some(a), Some(b), config)
        } else {
            a == b
        }
    };
    ordered_diff(&old_c, &new_c, eq)
        .into_iter()
        .filter(|(t, _, _)| *t != DiffType::Unchanged)
        .map(|(t, o, n)| NonElementDiff {
            diff_type: t,
            old: o.map(NonElementNode::CData),
            new: n.map(NonElementNode::CData),
        })
        .collect()
}

fn diff_processing_instructions(
    old: &XmlElement,
    new: &XmlElement,
    config: &XmlDiffConfig,
    settings: &NodePreservationSettings,
) -> Vec<NonElementDiff> {
    let target_allowed = |target: &str| match &settings.preserve_pi_targets {
        None => true,
        Some(allowed) => allowed.iter().any(|t| {
            if settings.case_sensitive_pi_targets {
                t == target
            } else {
                t.eq_ignore_ascii_case(target)
            }
        }),
    };
    let old_pi: Vec<(String, String)> = processing_instructions_of(old).into_iter().filter(|(t, _)| target_allowed(t)).collect();
    let new_pi: Vec<(String, String)> = processing_instructions_of(new).into_iter().filter(|(t, _)| target_allowed(t)).collect();
    let eq = |a: &(String, String), b: &(String, String)| {
        let target_eq = if settings.case_sensitive_pi_targets {
            a.0 == b.0
        } else {
            a.0.eq_ignore_ascii_case(&b.0)
        };
        target_eq && values_equal(Some(&a.1), Some(&b.1), config)
    };
    ordered_diff(&old_pi, &new_pi, eq)
        .into_iter()
        .filter(|(t, _, _)| *t != DiffType::Unchanged)
        .map(|(t, o, n)| NonElementDiff {
            diff_type: t,
            old: o.map(|(target, data)| NonElementNode::ProcessingInstruction { target, data }),
            new: n.map(|(target, data)| NonElementNode::ProcessingInstruction { target, data }),
        })
        .collect()
}

/// A position-sensitive flat diff over a generic slice, same idiom as
/// [`crate::text_diff::get_diffs`] one level up: LCS-align, then flush
/// deletions/insertions around each matched element.
fn ordered_diff<T: Clone>(old: &[T], new: &[T], eq: impl Fn(&T, &T) -> bool) -> Vec<(DiffType, Option<T>, Option<T>)> {
    let pairs = lcs_by(old, new, &eq);
    let mut result = Vec::new();
    let mut oi = 0usize;
    let mut ni = 0usize;
    for (mo, mn) in pairs {
        let mo_idx = slice_index_of(old, mo);
        let mn_idx = slice_index_of(new, mn);
        while oi < mo_idx {
            result.push((DiffType::Deleted, Some(old[oi].clone()), None));
            oi += 1;
        }
        while ni < mn_idx {
            result.push((DiffType::Added, None, Some(new[ni].clone())));
            ni += 1;
        }
        result.push((DiffType::Unchanged, Some(old[oi].clone()), Some(new[ni].clone())));
        oi += 1;
        ni += 1;
    }
    while oi < old.len() {
        result.push((DiffType::Deleted, Some(old[oi].clone()), None));
        oi += 1;
    }
    while ni < new.len() {
        result.push((DiffType::Added, None, Some(new[ni].clone())));
        ni += 1;
    }
    result
}

fn slice_index_of<T>(slice: &[T], item: &T) -> usize {
    let base = slice.as_ptr() as usize;
    let addr = item as *const T as usize;
    (addr - base) / std::mem::size_of::<T>()
}

/// A position-insensitive diff: each `new` item is matched against the
/// first unconsumed equal `old` item, regardless of order. Used for
/// comments when `track_comment_position` is false (spec §6).
fn unordered_diff<T: Clone>(old: &[T], new: &[T], eq: impl Fn(&T, &T) -> bool) -> Vec<(DiffType, Option<T>, Option<T>)> {
    let mut used = vec![false; old.len()];
    let mut result = Vec::new();
    for n in new {
        match old.iter().enumerate().find(|(i, o)| !used[*i] && eq(o, n)) {
            Some((idx, o)) => {
                used[idx] = true;
                result.push((DiffType::Unchanged, Some(o.clone()), Some(n.clone())));
            }
            None => result.push((DiffType::Added, None, Some(n.clone()))),
        }
    }
    for (i, o) in old.iter().enumerate() {
        if !used[i] {
            result.push((DiffType::Deleted, Some(o.clone()), None));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::XmlDiffConfig;
    use crate::node::XmlElement;

    fn assert_unchanged(d: &DiffMatch) {
        assert_eq!(d.diff_type, DiffType::Unchanged, "expected Unchanged at {}", d.path);
    }

    #[test]
    fn identity_diff_is_unchanged_recursively() {
        let config = XmlDiffConfig::default();
        let doc = XmlElement::new("r")
            .with_attribute("id", "1")
            .with_child(XmlElement::new("a").with_text("hi"));
        let d = diff(&doc, &doc, &config).unwrap();
        assert_unchanged(&d);
        assert_unchanged(&d.children[0]);
    }

    // spec §8 S1 — Added sibling.
    #[test]
    fn s1_added_sibling() {
        let config = XmlDiffConfig::default();
        let old_doc = XmlElement::new("r").with_child(XmlElement::new("a"));
        let new_doc = XmlElement::new("r")
            .with_child(XmlElement::new("a"))
            .with_child(XmlElement::new("b"));
        let d = diff(&old_doc, &new_doc, &config).unwrap();
        assert_eq!(d.diff_type, DiffType::Modified);
        assert_eq!(d.children.len(), 2);
        assert_eq!(d.children[0].diff_type, DiffType::Unchanged);
        assert_eq!(d.children[1].diff_type, DiffType::Added);
        assert_eq!(d.children[1].path, "/r[1]/b[1]");
    }

    // spec §8 S2 — key-attribute match overrides order.
    #[test]
    fn s2_key_attribute_match_overrides_order() {
        let config = XmlDiffConfig::builder().key_attribute_names(["id"]).build();
        let old_doc = XmlElement::new("r")
            .with_child(XmlElement::new("i").with_attribute("id", "1").with_attribute("v", "x"))
            .with_child(XmlElement::new("i").with_attribute("id", "2").with_attribute("v", "y"));
        let new_doc = XmlElement::new("r")
            .with_child(XmlElement::new("i").with_attribute("id", "2").with_attribute("v", "y"))
            .with_child(XmlElement::new("i").with_attribute("id", "1").with_attribute("v", "z"));
        let d = diff(&old_doc, &new_doc, &config).unwrap();
        assert!(d.children.iter().all(|c| c.diff_type != DiffType::Added && c.diff_type != DiffType::Deleted));
        let id1 = d
            .children
            .iter()
            .find(|c| c.modified.unwrap().attribute(&crate::node::QName::new("id"), config.namespace_comparison_mode).unwrap().value == "1")
            .unwrap();
        assert_eq!(id1.diff_type, DiffType::Modified);
        let id2 = d
            .children
            .iter()
            .find(|c| c.modified.unwrap().attribute(&crate::node::QName::new("id"), config.namespace_comparison_mode).unwrap().value == "2")
            .unwrap();
        assert_eq!(id2.diff_type, DiffType::Unchanged);
    }

    // spec §8 S3 — text normalization.
    #[test]
    fn s3_text_normalization() {
        let config = XmlDiffConfig::builder().ignore_whitespace(true).trim_values(true).build();
        let old_doc = XmlElement::new("r").with_text("  Hello  world ");
        let new_doc = XmlElement::new("r").with_text("Hello world");
        let d = diff(&old_doc, &new_doc, &config).unwrap();
        assert_unchanged(&d);
    }

    #[test]
    fn deleted_child_is_spliced_before_next_kept_sibling() {
        let config = XmlDiffConfig::default();
        let old_doc = XmlElement::new("r")
            .with_child(XmlElement::new("a"))
            .with_child(XmlElement::new("b"))
            .with_child(XmlElement::new("c"));
        let new_doc = XmlElement::new("r").with_child(XmlElement::new("a")).with_child(XmlElement::new("c"));
        let d = diff(&old_doc, &new_doc, &config).unwrap();
        let kinds: Vec<(DiffType, &str)> = d
            .children
            .iter()
            .map(|c| (c.diff_type, c.path.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (DiffType::Unchanged, "/r[1]/a[1]"),
                (DiffType::Deleted, "/r[1]/b[1]"),
                (DiffType::Unchanged, "/r[1]/c[1]"),
            ]
        );
    }

    #[test]
    fn trailing_delete_is_appended_at_the_end() {
        let config = XmlDiffConfig::default();
        let old_doc = XmlElement::new("r").with_child(XmlElement::new("a")).with_child(XmlElement::new("b"));
        let new_doc = XmlElement::new("r").with_child(XmlElement::new("a"));
        let d = diff(&old_doc, &new_doc, &config).unwrap();
        assert_eq!(d.children.len(), 2);
        assert_eq!(d.children[1].diff_type, DiffType::Deleted);
        assert_eq!(d.children[1].path, "/r[1]/b[1]");
    }

    #[test]
    fn attribute_added_deleted_modified() {
        let config = XmlDiffConfig::default();
        let old_doc = XmlElement::new("r").with_attribute("keep", "1").with_attribute("gone", "x").with_attribute("chg", "a");
        let new_doc = XmlElement::new("r").with_attribute("keep", "1").with_attribute("chg", "b").with_attribute("new", "y");
        let d = diff(&old_doc, &new_doc, &config).unwrap();
        assert_eq!(d.diff_type, DiffType::Modified);
        let by_name = |n: &str| d.attribute_diffs.iter().find(|a| a.name == n).unwrap();
        assert_eq!(by_name("gone").diff_type, DiffType::Deleted);
        assert_eq!(by_name("chg").diff_type, DiffType::Modified);
        assert_eq!(by_name("new").diff_type, DiffType::Added);
        assert!(d.attribute_diffs.iter().all(|a| a.name != "keep"));
    }

    #[test]
    fn non_element_preservation_tracks_comments() {
        use crate::config::{NodePreservationMode, NodePreservationSettings};
        use crate::node::NonElementNode;
        let settings = NodePreservationSettings {
            mode: NodePreservationMode::CommentsOnly,
            ..NodePreservationSettings::default()
        };
        let config = XmlDiffConfig::builder().node_preservation(settings).build();
        let old_doc = XmlElement::new("r").with_non_element(NonElementNode::Comment("keep".into()));
        let new_doc = XmlElement::new("r")
            .with_non_element(NonElementNode::Comment("keep".into()))
            .with_non_element(NonElementNode::Comment("added".into()));
        let d = diff(&old_doc, &new_doc, &config).unwrap();
        assert_eq!(d.non_element_diffs.len(), 1);
        assert_eq!(d.non_element_diffs[0].diff_type, DiffType::Added);
    }

    #[test]
    fn ignoring_values_suppresses_value_diff() {
        let config = XmlDiffConfig::builder().ignore_values(true).build();
        let old_doc = XmlElement::new("r").with_text("a");
        let new_doc = XmlElement::new("r").with_text("b");
        let d = diff(&old_doc, &new_doc, &config).unwrap();
        assert_unchanged(&d);
    }

    #[test]
    fn diff_rejects_contradictory_config_before_walking_the_tree() {
        let config = XmlDiffConfig::builder().key_attribute_names(["id"]).excluded_attribute_names(["id"]).build();
        let doc = XmlElement::new("r");
        let err = diff(&doc, &doc, &config).unwrap_err();
        assert!(matches!(err, crate::error::XmlDiffError::ConfigurationError { .. }));
    }
}
