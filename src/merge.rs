//! Three-Way Merge Engine (spec §4.6): combines `ours` and `theirs`
//! relative to `base` by diffing each against `base` and walking both
//! diff trees in lockstep.
//!
//! Grounded in the teacher's `amalgamator::amalgamate_node`, which walks
//! a `MergeScenario<CstNode>` top-down and at each node either emits a
//! clean merge or a `Conflict { base, left, right }` — this module keeps
//! that "decide per node, recurse independently of how the parent was
//! decided" shape, but classifies against `DiffMatch` trees (from
//! [`crate::diff`]) instead of raw CST equality, and reports conflicts as
//! data (spec §7: "Conflict: not an error") rather than bubbling an enum
//! up through the return type the way the teacher's `AmalgamResult` does.

use std::collections::HashMap;

use thiserror::Error;

use crate::config::XmlDiffConfig;
use crate::diff::{self, DiffMatch, DiffType};
use crate::error::XmlDiffError;
use crate::matching::{DefaultMatchingStrategy, MatchingStrategy};
use crate::node::{QName, XmlAttribute, XmlChild, XmlElement};
use crate::normalize::values_equal;
use crate::path;

/// Conflict taxonomy (spec §4.6). `DeleteDelete` is never constructed by
/// [`merge`] — matching deletions on both sides are agreement, not a
/// conflict (spec §9 Open Question b) — but the variant is kept for
/// completeness, same as the teacher keeps `ResolutionStrategy` variants
/// it doesn't always reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictType {
    AddAdd,
    ModifyModify,
    ModifyDelete,
    DeleteDelete,
    AttributeConflict,
    NamespaceConflict,
}

/// One unresolved (or resolver-handled) three-way disagreement (spec §6,
/// §4.6). `base`/`ours`/`theirs` carry element-level snapshots for
/// element conflicts; `attribute_*` carry the three values for an
/// `AttributeConflict`, leaving `base`/`ours`/`theirs` unset in that case.
#[derive(Debug, Clone)]
pub struct MergeConflict {
    pub path: String,
    pub conflict_type: ConflictType,
    pub base: Option<XmlElement>,
    pub ours: Option<XmlElement>,
    pub theirs: Option<XmlElement>,
    pub attribute_name: Option<String>,
    pub attribute_base: Option<String>,
    pub attribute_ours: Option<String>,
    pub attribute_theirs: Option<String>,
}

impl MergeConflict {
    fn element(path: String, conflict_type: ConflictType, base: Option<&XmlElement>, ours: Option<&XmlElement>, theirs: Option<&XmlElement>) -> Self {
        Self {
            path,
            conflict_type,
            base: base.cloned(),
            ours: ours.cloned(),
            theirs: theirs.cloned(),
            attribute_name: None,
            attribute_base: None,
            attribute_ours: None,
            attribute_theirs: None,
        }
    }

    fn attribute(path: String, name: &str, base: Option<String>, ours: Option<String>, theirs: Option<String>) -> Self {
        Self {
            path,
            conflict_type: ConflictType::AttributeConflict,
            base: None,
            ours: None,
            theirs: None,
            attribute_name: Some(name.to_string()),
            attribute_base: base,
            attribute_ours: ours,
            attribute_theirs: theirs,
        }
    }
}

/// Running totals (spec §6, §3). `unresolved`/`total_changes` are
/// derived, not stored, so the additivity invariant (spec §8 invariant 2)
/// can never drift out of sync with the fields it's computed from.
///
/// `resolved_conflicts` and `resolver_resolved` are disjoint subsets of
/// `conflict_count`: `resolved_conflicts` counts three-way touches where
/// both sides independently changed the same attribute, leaf text, or
/// added element away from `base` but landed on the *same* resulting
/// value — the engine settles these itself, without ever calling the
/// configured resolver. They still also count toward `auto_merged`
/// (nothing about the merged output or node-level classification differs
/// from an ordinary clean change) — `resolved_conflicts` is additional
/// bookkeeping distinguishing "both sides touched this and happened to
/// agree" from "only one side touched this at all", not a separate
/// disjoint output bucket. See DESIGN.md for the full rationale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStatistics {
    pub total_elements: usize,
    pub unchanged: usize,
    pub ours_only: usize,
    pub theirs_only: usize,
    pub auto_merged: usize,
    pub conflict_count: usize,
    pub resolved_conflicts: usize,
    pub resolver_resolved: usize,
}

impl MergeStatistics {
    pub fn unresolved(&self) -> usize {
        self.conflict_count - self.resolved_conflicts - self.resolver_resolved
    }

    pub fn total_changes(&self) -> usize {
        self.ours_only + self.theirs_only + self.auto_merged
    }
}

/// Unrecoverable merge failure (spec §7: "resolver throws"). A
/// `MergeResult` built from this carries no `merged_document`.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("conflict resolver failed at {path}: {message}")]
    ResolverFailed { path: String, message: String },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] XmlDiffError),
}

/// Outcome of a `merge()` call (spec §7: conflicts are data, not
/// errors). Exactly one of "failed" or "has a merged document" holds.
#[derive(Debug, Clone)]
pub struct MergeResult {
    pub merged_document: Option<XmlElement>,
    pub conflicts: Vec<MergeConflict>,
    pub statistics: MergeStatistics,
    error: Option<String>,
}

impl MergeResult {
    fn success(merged_document: XmlElement, conflicts: Vec<MergeConflict>, statistics: MergeStatistics) -> Self {
        Self {
            merged_document: Some(merged_document),
            conflicts,
            statistics,
            error: None,
        }
    }

    fn failure(error: MergeError) -> Self {
        Self {
            merged_document: None,
            conflicts: Vec::new(),
            statistics: MergeStatistics::default(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// What a [`ConflictResolver`] decided for one conflict (spec §6).
#[derive(Debug, Clone)]
pub enum ResolverOutcome {
    Base,
    Ours,
    Theirs,
    /// A freshly constructed replacement, at the same granularity as the
    /// conflict: a whole element for element-level conflicts.
    Custom(XmlElement),
    /// A single resolved attribute or text value, for `AttributeConflict`
    /// and the value half of a `ModifyModify` — there's no "element" to
    /// hand back at that granularity.
    Value(String),
    /// Remove the conflicting element/attribute entirely.
    Remove,
}

/// Pluggable conflict resolution (spec §6, §9). Fallible: a resolver
/// that errors surfaces as [`MergeError::ResolverFailed`], never
/// swallowed (spec §7 propagation policy).
pub trait ConflictResolver: Send + Sync {
    fn resolve(&self, conflict: &MergeConflict) -> Result<ResolverOutcome, String>;
}

/// Always takes `base` (spec §4.6 predefined resolvers).
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseResolver;

impl ConflictResolver for BaseResolver {
    fn resolve(&self, _conflict: &MergeConflict) -> Result<ResolverOutcome, String> {
        Ok(ResolverOutcome::Base)
    }
}

/// Always takes `ours`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OursResolver;

impl ConflictResolver for OursResolver {
    fn resolve(&self, _conflict: &MergeConflict) -> Result<ResolverOutcome, String> {
        Ok(ResolverOutcome::Ours)
    }
}

/// Always takes `theirs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TheirsResolver;

impl ConflictResolver for TheirsResolver {
    fn resolve(&self, _conflict: &MergeConflict) -> Result<ResolverOutcome, String> {
        Ok(ResolverOutcome::Theirs)
    }
}

/// Concatenates conflicting values with a configurable separator (spec
/// §4.6; default `" | "`). Resolves spec §9 Open Question (a): when both
/// sides introduce the same new attribute name with different values,
/// that's still an `AttributeConflict` (see [`merge_attributes`]) rather
/// than a silent "theirs wins" — this resolver then concatenates it the
/// same as any other conflicting attribute, so there is one policy, not
/// two.
#[derive(Debug, Clone)]
pub struct AutoMergeResolver {
    pub separator: String,
}

impl Default for AutoMergeResolver {
    fn default() -> Self {
        Self { separator: " | ".to_string() }
    }
}

impl ConflictResolver for AutoMergeResolver {
    fn resolve(&self, conflict: &MergeConflict) -> Result<ResolverOutcome, String> {
        match conflict.conflict_type {
            ConflictType::AttributeConflict => {
                let ours = conflict.attribute_ours.clone().unwrap_or_default();
                let theirs = conflict.attribute_theirs.clone().unwrap_or_default();
                Ok(ResolverOutcome::Value(format!("{ours}{}{theirs}", self.separator)))
            }
            ConflictType::ModifyModify => {
                // Value-only ModifyModify (element structure already
                // merged by the time this fires): concatenate the two
                // leaf texts, same policy as attributes.
                let ours_text = conflict.ours.as_ref().and_then(|e| e.text_value()).unwrap_or_default();
                let theirs_text = conflict.theirs.as_ref().and_then(|e| e.text_value()).unwrap_or_default();
                Ok(ResolverOutcome::Value(format!("{ours_text}{}{theirs_text}", self.separator)))
            }
            ConflictType::ModifyDelete => {
                // Prefer keeping content over silently dropping someone's
                // edit: take whichever side still has the element.
                match (&conflict.ours, &conflict.theirs) {
                    (Some(elem), None) | (None, Some(elem)) => Ok(ResolverOutcome::Custom(elem.clone())),
                    _ => Ok(ResolverOutcome::Base),
                }
            }
            ConflictType::AddAdd => {
                let ours = conflict.ours.as_ref();
                let theirs = conflict.theirs.as_ref();
                match (ours, theirs) {
                    (Some(o), Some(t)) => Ok(ResolverOutcome::Custom(union_elements(o, t, &self.separator))),
                    (Some(o), None) => Ok(ResolverOutcome::Custom(o.clone())),
                    (None, Some(t)) => Ok(ResolverOutcome::Custom(t.clone())),
                    (None, None) => Ok(ResolverOutcome::Remove),
                }
            }
            ConflictType::NamespaceConflict => Ok(ResolverOutcome::Ours),
            ConflictType::DeleteDelete => Ok(ResolverOutcome::Remove),
        }
    }
}

/// Unions two elements' attributes and children (spec §4.6: "Children
/// are unioned (all children of both sides appear, in a stable order)").
/// Used by [`AutoMergeResolver`] for `AddAdd`, where there is no common
/// base to three-way-merge against.
fn union_elements(ours: &XmlElement, theirs: &XmlElement, separator: &str) -> XmlElement {
    let mut attributes: Vec<XmlAttribute> = ours.attributes.clone();
    for t in &theirs.attributes {
        match attributes.iter_mut().find(|a| a.name.local == t.name.local) {
            Some(existing) if existing.value != t.value => {
                existing.value = format!("{}{separator}{}", existing.value, t.value);
            }
            Some(_) => {}
            None => attributes.push(t.clone()),
        }
    }
    let mut children = ours.children.clone();
    children.extend(theirs.children.clone());
    XmlElement {
        name: ours.name.clone(),
        attributes,
        children,
    }
}

/// Merge using the default matching strategy (spec §4.4).
pub fn merge(base: &XmlElement, ours: &XmlElement, theirs: &XmlElement, config: &XmlDiffConfig, resolver: Option<&dyn ConflictResolver>) -> MergeResult {
    merge_with_strategy(base, ours, theirs, config, &DefaultMatchingStrategy, resolver)
}

/// Merge using a caller-supplied [`MatchingStrategy`] (spec §9: pluggable).
pub fn merge_with_strategy(
    base: &XmlElement,
    ours: &XmlElement,
    theirs: &XmlElement,
    config: &XmlDiffConfig,
    strategy: &dyn MatchingStrategy,
    resolver: Option<&dyn ConflictResolver>,
) -> MergeResult {
    let d_o = match diff::diff_with_strategy(base, ours, config, strategy) {
        Ok(d) => d,
        Err(e) => return MergeResult::failure(MergeError::InvalidConfiguration(e)),
    };
    let d_t = match diff::diff_with_strategy(base, theirs, config, strategy) {
        Ok(d) => d,
        Err(e) => return MergeResult::failure(MergeError::InvalidConfiguration(e)),
    };
    let root_path = path::root_path(&base.name);
    let mut stats = MergeStatistics::default();
    let mut conflicts = Vec::new();

    tracing::debug!(path = %root_path, "starting merge");
    match merge_node(&d_o, &d_t, &root_path, config, strategy, resolver, &mut stats, &mut conflicts) {
        Ok(merged) => MergeResult::success(merged, conflicts, stats),
        Err(e) => MergeResult::failure(e),
    }
}

/// Merge one element present (matched or as the root) on both sides.
/// `d_o`/`d_t` are the corresponding nodes of `diff(base, ours)` and
/// `diff(base, theirs)` — both must share the same `original` (spec
/// §4.6: "walk both diff trees in lockstep, rooted at the same base
/// path").
fn merge_node<'a>(
    d_o: &DiffMatch<'a>,
    d_t: &DiffMatch<'a>,
    path_str: &str,
    config: &XmlDiffConfig,
    strategy: &dyn MatchingStrategy,
    resolver: Option<&dyn ConflictResolver>,
    stats: &mut MergeStatistics,
    conflicts: &mut Vec<MergeConflict>,
) -> Result<XmlElement, MergeError> {
    let base = d_o.original.expect("merge_node requires a base-present node");
    stats.total_elements += 1;

    let (attributes, attr_conflicts) = merge_attributes(path_str, base, d_o, d_t, config, resolver, stats, conflicts)?;
    let (text, value_conflict) = merge_text(path_str, base, d_o, d_t, config, resolver, stats, conflicts)?;
    let children = merge_children(base, d_o, d_t, path_str, config, strategy, resolver, stats, conflicts)?;
    let name = merge_namespace(path_str, base, d_o, d_t, resolver, stats, conflicts)?;

    let both_unchanged = d_o.diff_type == DiffType::Unchanged && d_t.diff_type == DiffType::Unchanged;
    let ours_only_changed = d_t.diff_type == DiffType::Unchanged && !both_unchanged;
    let theirs_only_changed = d_o.diff_type == DiffType::Unchanged && !both_unchanged;
    if both_unchanged {
        stats.unchanged += 1;
    } else if ours_only_changed {
        stats.ours_only += 1;
    } else if theirs_only_changed {
        stats.theirs_only += 1;
    } else if attr_conflicts == 0 && !value_conflict {
        stats.auto_merged += 1;
    }
    // else: this node's own changes conflicted; it contributes to
    // `conflicts` (already pushed above) rather than any of the clean
    // buckets, keeping `total_changes` additive (spec §8 invariant 2).

    let mut out_children = Vec::new();
    if let Some(text) = text {
        out_children.push(XmlChild::Text(text));
    }
    for c in &base.children {
        if let XmlChild::NonElement(n) = c {
            out_children.push(XmlChild::NonElement(n.clone()));
        }
    }
    out_children.extend(children.into_iter().map(XmlChild::Element));

    Ok(XmlElement {
        name,
        attributes,
        children: out_children,
    })
}

/// Attribute-level three-way merge (spec §4.6 "Attribute-level
/// three-way"). Returns the merged attribute list and the count of
/// conflicts raised at this node, so the caller can decide whether this
/// node counts as a clean `auto_merged` change.
fn merge_attributes(
    path_str: &str,
    base: &XmlElement,
    d_o: &DiffMatch,
    d_t: &DiffMatch,
    config: &XmlDiffConfig,
    resolver: Option<&dyn ConflictResolver>,
    stats: &mut MergeStatistics,
    conflicts: &mut Vec<MergeConflict>,
) -> Result<(Vec<XmlAttribute>, usize), MergeError> {
    let mut order: Vec<String> = base.attributes.iter().map(|a| a.name.local.clone()).collect();
    let mut values: HashMap<String, Option<String>> = base
        .attributes
        .iter()
        .map(|a| (a.name.local.clone(), Some(a.value.clone())))
        .collect();

    let mut conflict_count = 0usize;

    for diff_entry in d_o.attribute_diffs.iter().chain(d_t.attribute_diffs.iter()) {
        if !order.contains(&diff_entry.name) {
            order.push(diff_entry.name.clone());
        }
    }

    for name in order.clone() {
        let base_val = values.get(&name).cloned().flatten();
        let ours_entry = d_o.attribute_diffs.iter().find(|a| a.name == name);
        let theirs_entry = d_t.attribute_diffs.iter().find(|a| a.name == name);

        let resolved = match (ours_entry, theirs_entry) {
            (None, None) => base_val,
            (Some(o), None) => o.new_value.clone(),
            (None, Some(t)) => t.new_value.clone(),
            (Some(o), Some(t)) => {
                if values_equal(o.new_value.as_deref(), t.new_value.as_deref(), config) {
                    stats.conflict_count += 1;
                    stats.resolved_conflicts += 1;
                    o.new_value.clone()
                } else {
                    conflict_count += 1;
                    stats.conflict_count += 1;
                    let conflict = MergeConflict::attribute(
                        path::attribute_path(path_str, &name),
                        &name,
                        base_val.clone(),
                        o.new_value.clone(),
                        t.new_value.clone(),
                    );
                    conflicts.push(conflict.clone());
                    resolve_attribute_value(path_str, &conflict, resolver, config, stats)?
                }
            }
        };
        values.insert(name, resolved);
    }

    let attributes = order
        .into_iter()
        .filter_map(|name| values.remove(&name).flatten().map(|value| XmlAttribute { name: QName::new(name), value }))
        .collect();
    Ok((attributes, conflict_count))
}

fn resolve_attribute_value(
    path_str: &str,
    conflict: &MergeConflict,
    resolver: Option<&dyn ConflictResolver>,
    config: &XmlDiffConfig,
    stats: &mut MergeStatistics,
) -> Result<Option<String>, MergeError> {
    match resolver {
        None => Ok(conflict.attribute_base.clone()),
        Some(r) => {
            let outcome = r.resolve(conflict).map_err(|message| MergeError::ResolverFailed {
                path: path_str.to_string(),
                message,
            })?;
            stats.resolver_resolved += 1;
            Ok(match outcome {
                ResolverOutcome::Base => conflict.attribute_base.clone(),
                ResolverOutcome::Ours => conflict.attribute_ours.clone(),
                ResolverOutcome::Theirs => conflict.attribute_theirs.clone(),
                ResolverOutcome::Value(v) => Some(v),
                ResolverOutcome::Remove => None,
                ResolverOutcome::Custom(elem) => {
                    let name = conflict.attribute_name.as_deref().unwrap_or_default();
                    elem.attribute(&QName::new(name), config.namespace_comparison_mode).map(|a| a.value.clone())
                }
            })
        }
    }
}

/// Leaf-text three-way merge (spec §4.6 table row "modify text/attrs
/// differently"). Only fires when both sides recorded a `ValueDiff`;
/// otherwise this element isn't a leaf on both sides, or neither side
/// touched its text.
fn merge_text(
    path_str: &str,
    base: &XmlElement,
    d_o: &DiffMatch,
    d_t: &DiffMatch,
    config: &XmlDiffConfig,
    resolver: Option<&dyn ConflictResolver>,
    stats: &mut MergeStatistics,
    conflicts: &mut Vec<MergeConflict>,
) -> Result<(Option<String>, bool), MergeError> {
    let base_text = base.text_value();
    match (&d_o.value_diff, &d_t.value_diff) {
        (None, None) => Ok((base_text, false)),
        (Some(o), None) => Ok((Some(o.new_text.clone()), false)),
        (None, Some(t)) => Ok((Some(t.new_text.clone()), false)),
        (Some(o), Some(t)) => {
            if values_equal(Some(&o.new_text), Some(&t.new_text), config) {
                stats.conflict_count += 1;
                stats.resolved_conflicts += 1;
                Ok((Some(o.new_text.clone()), false))
            } else {
                stats.conflict_count += 1;
                let conflict = MergeConflict::element(
                    path_str.to_string(),
                    ConflictType::ModifyModify,
                    Some(base),
                    d_o.modified,
                    d_t.modified,
                );
                conflicts.push(conflict.clone());
                let resolved = resolve_value_conflict(path_str, &conflict, resolver, base_text, stats)?;
                Ok((resolved, true))
            }
        }
    }
}

fn resolve_value_conflict(
    path_str: &str,
    conflict: &MergeConflict,
    resolver: Option<&dyn ConflictResolver>,
    base_text: Option<String>,
    stats: &mut MergeStatistics,
) -> Result<Option<String>, MergeError> {
    match resolver {
        None => Ok(base_text),
        Some(r) => {
            let outcome = r.resolve(conflict).map_err(|message| MergeError::ResolverFailed {
                path: path_str.to_string(),
                message,
            })?;
            stats.resolver_resolved += 1;
            Ok(match outcome {
                ResolverOutcome::Base => base_text,
                ResolverOutcome::Ours => conflict.ours.as_ref().and_then(|e| e.text_value()),
                ResolverOutcome::Theirs => conflict.theirs.as_ref().and_then(|e| e.text_value()),
                ResolverOutcome::Value(v) => Some(v),
                ResolverOutcome::Custom(elem) => elem.text_value(),
                ResolverOutcome::Remove => None,
            })
        }
    }
}

/// Namespace three-way check (spec §4.6: "namespace URI divergence on
/// same prefix yields `NamespaceConflict`"). Fires when both sides moved
/// the element to a different namespace URI than base, and not to the
/// same one.
fn merge_namespace(
    path_str: &str,
    base: &XmlElement,
    d_o: &DiffMatch,
    d_t: &DiffMatch,
    resolver: Option<&dyn ConflictResolver>,
    stats: &mut MergeStatistics,
    conflicts: &mut Vec<MergeConflict>,
) -> Result<QName, MergeError> {
    let ours_name = d_o.modified.map(|e| &e.name).unwrap_or(&base.name);
    let theirs_name = d_t.modified.map(|e| &e.name).unwrap_or(&base.name);

    let ours_changed = ours_name.namespace_uri != base.name.namespace_uri;
    let theirs_changed = theirs_name.namespace_uri != base.name.namespace_uri;

    if ours_changed && theirs_changed && ours_name.namespace_uri != theirs_name.namespace_uri {
        stats.conflict_count += 1;
        let conflict = MergeConflict::element(path_str.to_string(), ConflictType::NamespaceConflict, Some(base), d_o.modified, d_t.modified);
        conflicts.push(conflict.clone());
        let resolved = match resolver {
            None => base.name.clone(),
            Some(r) => {
                let outcome = r
                    .resolve(&conflict)
                    .map_err(|message| MergeError::ResolverFailed { path: path_str.to_string(), message })?;
                stats.resolver_resolved += 1;
                match outcome {
                    ResolverOutcome::Base => base.name.clone(),
                    ResolverOutcome::Ours => ours_name.clone(),
                    ResolverOutcome::Theirs => theirs_name.clone(),
                    ResolverOutcome::Custom(elem) => elem.name.clone(),
                    ResolverOutcome::Value(_) | ResolverOutcome::Remove => base.name.clone(),
                }
            }
        };
        return Ok(QName {
            local: base.name.local.clone(),
            namespace_uri: resolved.namespace_uri,
            prefix: resolved.prefix,
        });
    }
    if ours_changed {
        Ok(ours_name.clone())
    } else if theirs_changed {
        Ok(theirs_name.clone())
    } else {
        Ok(base.name.clone())
    }
}

/// Three-way merge of element children (spec §4.6 table, walked over the
/// base children plus whatever either side added).
#[allow(clippy::too_many_arguments)]
fn merge_children<'a>(
    base: &'a XmlElement,
    d_o: &DiffMatch<'a>,
    d_t: &DiffMatch<'a>,
    parent_path: &str,
    config: &XmlDiffConfig,
    strategy: &dyn MatchingStrategy,
    resolver: Option<&dyn ConflictResolver>,
    stats: &mut MergeStatistics,
    conflicts: &mut Vec<MergeConflict>,
) -> Result<Vec<XmlElement>, MergeError> {
    let ptr_key = |e: &XmlElement| e as *const XmlElement as usize;

    let ours_by_base: HashMap<usize, &DiffMatch<'a>> = d_o.children.iter().filter_map(|c| c.original.map(|o| (ptr_key(o), c))).collect();
    let theirs_by_base: HashMap<usize, &DiffMatch<'a>> = d_t.children.iter().filter_map(|c| c.original.map(|o| (ptr_key(o), c))).collect();

    let mut merged = Vec::new();
    for base_child in base.element_children() {
        let key = ptr_key(base_child);
        let d_o_child = ours_by_base.get(&key).expect("diff covers every base child");
        let d_t_child = theirs_by_base.get(&key).expect("diff covers every base child");
        let child_path = d_o_child.path.clone();

        match (d_o_child.diff_type, d_t_child.diff_type) {
            (DiffType::Deleted, DiffType::Deleted) => {
                stats.total_elements += 1;
                stats.unchanged += 1;
            }
            (DiffType::Deleted, DiffType::Unchanged) => {
                stats.total_elements += 1;
                stats.ours_only += 1;
            }
            (DiffType::Unchanged, DiffType::Deleted) => {
                stats.total_elements += 1;
                stats.theirs_only += 1;
            }
            (DiffType::Deleted, DiffType::Modified) | (DiffType::Modified, DiffType::Deleted) => {
                stats.total_elements += 1;
                stats.conflict_count += 1;
                let (ours_side, theirs_side) = if d_o_child.diff_type == DiffType::Deleted {
                    (None, d_t_child.modified)
                } else {
                    (d_o_child.modified, None)
                };
                let conflict = MergeConflict::element(child_path.clone(), ConflictType::ModifyDelete, Some(base_child), ours_side, theirs_side);
                conflicts.push(conflict.clone());
                if let Some(elem) = resolve_element_conflict(&child_path, &conflict, resolver, stats)? {
                    merged.push(elem);
                }
            }
            _ => {
                merged.push(merge_node(d_o_child, d_t_child, &child_path, config, strategy, resolver, stats, conflicts)?);
            }
        }
    }

    let ours_added: Vec<&XmlElement> = d_o.children.iter().filter(|c| c.original.is_none()).filter_map(|c| c.modified).collect();
    let theirs_added: Vec<&XmlElement> = d_t.children.iter().filter(|c| c.original.is_none()).filter_map(|c| c.modified).collect();

    let paired = ours_added.len().min(theirs_added.len());
    for i in 0..paired {
        let o = ours_added[i];
        let t = theirs_added[i];
        let same_add = match diff::diff_with_strategy(o, t, config, strategy) {
            Ok(d) => d.diff_type == DiffType::Unchanged,
            Err(_) => false,
        };
        stats.total_elements += 1;
        if same_add {
            stats.conflict_count += 1;
            stats.resolved_conflicts += 1;
            stats.auto_merged += 1;
            merged.push(o.clone());
        } else {
            stats.conflict_count += 1;
            let path_guess = path::child_path(parent_path, &o.name, i + 1);
            let conflict = MergeConflict::element(path_guess.clone(), ConflictType::AddAdd, None, Some(o), Some(t));
            conflicts.push(conflict.clone());
            if let Some(elem) = resolve_element_conflict(&path_guess, &conflict, resolver, stats)? {
                merged.push(elem);
            }
        }
    }
    for o in &ours_added[paired..] {
        stats.total_elements += 1;
        stats.ours_only += 1;
        merged.push((*o).clone());
    }
    for t in &theirs_added[paired..] {
        stats.total_elements += 1;
        stats.theirs_only += 1;
        merged.push((*t).clone());
    }

    Ok(merged)
}

fn resolve_element_conflict(
    path_str: &str,
    conflict: &MergeConflict,
    resolver: Option<&dyn ConflictResolver>,
    stats: &mut MergeStatistics,
) -> Result<Option<XmlElement>, MergeError> {
    match resolver {
        None => Ok(conflict.base.clone()),
        Some(r) => {
            let outcome = r.resolve(conflict).map_err(|message| MergeError::ResolverFailed {
                path: path_str.to_string(),
                message,
            })?;
            stats.resolver_resolved += 1;
            Ok(match outcome {
                ResolverOutcome::Base => conflict.base.clone(),
                ResolverOutcome::Ours => conflict.ours.clone(),
                ResolverOutcome::Theirs => conflict.theirs.clone(),
                ResolverOutcome::Custom(elem) => Some(elem),
                ResolverOutcome::Value(_) => conflict.base.clone(),
                ResolverOutcome::Remove => None,
            })
        }
    }
}
