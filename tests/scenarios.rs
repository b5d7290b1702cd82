//! End-to-end scenario tests (spec §8 S1-S6), exercised purely through
//! the public API — no access to module-private helpers. These
//! duplicate the intent of the inline unit tests in `src/diff.rs` and
//! `src/merge.rs` but pin the black-box contract a downstream crate
//! would actually depend on.

use xml_diff_merge::{diff, merge, AutoMergeResolver, ConflictType, DiffType, NamespaceComparisonMode, XmlDiffConfig};
use xml_diff_merge::{NonElementNode, XmlElement};

#[test]
fn s1_added_sibling_end_to_end() {
    let config = XmlDiffConfig::default();
    let old_doc = XmlElement::new("r").with_child(XmlElement::new("a"));
    let new_doc = XmlElement::new("r").with_child(XmlElement::new("a")).with_child(XmlElement::new("b"));

    let d = diff(&old_doc, &new_doc, &config).unwrap();
    assert_eq!(d.diff_type, DiffType::Modified);
    assert_eq!(d.children.len(), 2);
    assert_eq!(d.children[0].diff_type, DiffType::Unchanged);
    assert_eq!(d.children[1].diff_type, DiffType::Added);
    assert_eq!(d.children[1].path, "/r[1]/b[1]");
}

#[test]
fn s2_key_attribute_overrides_order_end_to_end() {
    let config = XmlDiffConfig::builder().key_attribute_names(["id"]).build();
    let old_doc = XmlElement::new("r")
        .with_child(XmlElement::new("i").with_attribute("id", "1").with_attribute("v", "x"))
        .with_child(XmlElement::new("i").with_attribute("id", "2").with_attribute("v", "y"));
    let new_doc = XmlElement::new("r")
        .with_child(XmlElement::new("i").with_attribute("id", "2").with_attribute("v", "y"))
        .with_child(XmlElement::new("i").with_attribute("id", "1").with_attribute("v", "z"));

    let d = diff(&old_doc, &new_doc, &config).unwrap();
    assert!(d.children.iter().all(|c| !matches!(c.diff_type, DiffType::Added | DiffType::Deleted)));
    assert_eq!(d.children.len(), 2);
}

#[test]
fn s3_whitespace_normalization_end_to_end() {
    let config = XmlDiffConfig::builder().ignore_whitespace(true).trim_values(true).build();
    let old_doc = XmlElement::new("r").with_text("  Hello  world ");
    let new_doc = XmlElement::new("r").with_text("Hello world");
    let d = diff(&old_doc, &new_doc, &config).unwrap();
    assert_eq!(d.diff_type, DiffType::Unchanged);
}

#[test]
fn s4_clean_three_way_merge_end_to_end() {
    let config = XmlDiffConfig::default();
    let base = XmlElement::new("r").with_child(XmlElement::new("a").with_attribute("v", "1"));
    let ours = XmlElement::new("r").with_child(XmlElement::new("a").with_attribute("v", "2"));
    let theirs = XmlElement::new("r").with_child(XmlElement::new("a").with_attribute("v", "1").with_attribute("w", "9"));

    let result = merge(&base, &ours, &theirs, &config, None);
    assert!(result.is_success());
    assert!(!result.has_conflicts());
    assert!(result.statistics.auto_merged >= 1);
    let merged = result.merged_document.unwrap();
    let a = merged.element_children()[0];
    assert_eq!(a.attribute(&xml_diff_merge::QName::new("v"), NamespaceComparisonMode::IgnorePrefix).unwrap().value, "2");
    assert_eq!(a.attribute(&xml_diff_merge::QName::new("w"), NamespaceComparisonMode::IgnorePrefix).unwrap().value, "9");
}

#[test]
fn s5_modify_modify_conflict_with_automerge_resolver() {
    let config = XmlDiffConfig::default();
    let base = XmlElement::new("r").with_child(XmlElement::new("a").with_attribute("v", "1"));
    let ours = XmlElement::new("r").with_child(XmlElement::new("a").with_attribute("v", "2"));
    let theirs = XmlElement::new("r").with_child(XmlElement::new("a").with_attribute("v", "3"));

    let resolver = AutoMergeResolver::default();
    let result = merge(&base, &ours, &theirs, &config, Some(&resolver));
    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.conflicts[0].conflict_type, ConflictType::AttributeConflict);
    assert_eq!(result.conflicts[0].path, "/r[1]/a[1]/@v");
    let merged = result.merged_document.unwrap();
    let a = merged.element_children()[0];
    assert_eq!(a.attribute(&xml_diff_merge::QName::new("v"), NamespaceComparisonMode::IgnorePrefix).unwrap().value, "2 | 3");
}

#[test]
fn s6_modify_delete_conflict_end_to_end() {
    let config = XmlDiffConfig::default();
    let base = XmlElement::new("r").with_child(XmlElement::new("a"));
    let ours = XmlElement::new("r");
    let theirs = XmlElement::new("r").with_child(XmlElement::new("a").with_attribute("t", "x"));

    let result = merge(&base, &ours, &theirs, &config, None);
    assert_eq!(result.conflicts.len(), 1);
    assert_eq!(result.conflicts[0].conflict_type, ConflictType::ModifyDelete);
    assert_eq!(result.conflicts[0].path, "/r[1]/a[1]");
}

#[test]
fn contradictory_config_is_rejected_before_diffing() {
    let config = XmlDiffConfig::builder().key_attribute_names(["id"]).excluded_attribute_names(["id"]).build();
    let doc = XmlElement::new("r");
    assert!(diff(&doc, &doc, &config).is_err());
}

#[test]
fn non_element_preservation_end_to_end() {
    use xml_diff_merge::{NodePreservationMode, NodePreservationSettings};

    let settings = NodePreservationSettings {
        mode: NodePreservationMode::PreserveAll,
        ..NodePreservationSettings::default()
    };
    let config = XmlDiffConfig::builder().node_preservation(settings).build();
    let old_doc = XmlElement::new("r").with_non_element(NonElementNode::Comment("note".into()));
    let new_doc = XmlElement::new("r");
    let d = diff(&old_doc, &new_doc, &config).unwrap();
    assert_eq!(d.non_element_diffs.len(), 1);
    assert_eq!(d.non_element_diffs[0].diff_type, DiffType::Deleted);
}
