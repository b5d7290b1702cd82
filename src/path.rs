//! Path format (spec §6): `/name[i]/name[i]/…`, 1-based index among
//! same-named siblings, `{uri}localName` for namespaced elements, and
//! `/@attrname` suffixes for attribute-level conflicts.
//!
//! Grounded in `other_examples/.../xml-diff-core/diff-engine.rs`'s
//! `{parent}.{tag}[{i}]` path construction (this crate uses `/` instead
//! of `.` per spec §6's literal examples) and the teacher's root-path
//! seeding in `merge-engine::resolver`.

use crate::node::QName;

/// Append a child segment to `parent_path`, given the 1-based index of
/// this child among its same-named siblings in the *output* ordering
/// (spec §3: "the order they appear in the NEW document ... with
/// `Deleted` nodes spliced at positions reflecting their position in the
/// ORIGINAL").
pub fn child_path(parent_path: &str, name: &QName, index_among_same_name: usize) -> String {
    format!("{parent_path}/{}[{index_among_same_name}]", name.display_path_segment())
}

/// Root path: just the root element's own segment, no leading sibling
/// index ambiguity since there is exactly one root.
pub fn root_path(name: &QName) -> String {
    format!("/{}[1]", name.display_path_segment())
}

/// Attribute-conflict path suffix (spec §6).
pub fn attribute_path(element_path: &str, attribute_local_name: &str) -> String {
    format!("{element_path}/@{attribute_local_name}")
}
