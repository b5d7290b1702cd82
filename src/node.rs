//! The DOM-facing data model (spec §1 out-of-scope: "a standard XML
//! library exposing a DOM of elements, attributes, text, comments, CDATA
//! sections, and processing instructions"). This crate owns the shape of
//! that DOM the way the teacher's `CstNode` stands in for tree-sitter's
//! concrete syntax tree — a concrete, owned representation the diff and
//! merge engines operate over, rather than a generic trait seam. A host
//! with its own DOM type converts into this shape at the boundary.

use crate::config::NamespaceComparisonMode;
use serde::Serialize;

/// A namespace-qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QName {
    pub local: String,
    pub namespace_uri: Option<String>,
    /// The prefix as written in the source; display-only, never used for
    /// equality (per spec §4.4, prefixes are not semantically meaningful
    /// except under `NamespaceComparisonMode::Strict`, where we still key
    /// off URI + local name, not the prefix spelling).
    pub prefix: Option<String>,
}

impl QName {
    pub fn new(local: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            namespace_uri: None,
            prefix: None,
        }
    }

    pub fn with_namespace(local: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            namespace_uri: Some(uri.into()),
            prefix: None,
        }
    }

    pub fn matches(&self, other: &QName, mode: NamespaceComparisonMode) -> bool {
        match mode {
            NamespaceComparisonMode::IgnoreNamespace => self.local == other.local,
            NamespaceComparisonMode::IgnorePrefix | NamespaceComparisonMode::Strict => {
                self.local == other.local && self.namespace_uri == other.namespace_uri
            }
        }
    }

    /// Render per spec §6: `{uri}localName` when namespaced, else bare
    /// local name.
    pub fn display_path_segment(&self) -> String {
        match &self.namespace_uri {
            Some(uri) => format!("{{{uri}}}{}", self.local),
            None => self.local.clone(),
        }
    }

    /// True for `xmlns` / `xmlns:*` declarations, which attribute and
    /// matching logic must skip (spec §4.4, §4.5).
    pub fn is_namespace_declaration(&self) -> bool {
        self.prefix.as_deref() == Some("xmlns") || self.local == "xmlns"
    }
}

/// An element attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XmlAttribute {
    pub name: QName,
    pub value: String,
}

impl XmlAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: QName::new(name),
            value: value.into(),
        }
    }
}

/// A non-element node preserved positionally among an element's children
/// (spec §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NonElementNode {
    Comment(String),
    CData(String),
    ProcessingInstruction { target: String, data: String },
}

impl NonElementNode {
    pub fn kind_name(&self) -> &'static str {
        match self {
            NonElementNode::Comment(_) => "comment",
            NonElementNode::CData(_) => "cdata",
            NonElementNode::ProcessingInstruction { .. } => "processing-instruction",
        }
    }
}

/// One child of an [`XmlElement`]: either a nested element, a text run,
/// or a preserved non-element node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum XmlChild {
    Element(XmlElement),
    Text(String),
    NonElement(NonElementNode),
}

/// An XML element: name, attributes, and ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XmlElement {
    pub name: QName,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlChild>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: QName::new(name),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(XmlAttribute::new(name, value));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlChild::Text(text.into()));
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlChild::Element(child));
        self
    }

    pub fn with_non_element(mut self, node: NonElementNode) -> Self {
        self.children.push(XmlChild::NonElement(node));
        self
    }

    /// Element children, in document order.
    pub fn element_children(&self) -> Vec<&XmlElement> {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlChild::Element(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    /// Non-element children (comments, CDATA, PIs), in document order,
    /// each paired with its index among all children (used to diff
    /// position-sensitive preservation, spec §6).
    pub fn non_element_children(&self) -> Vec<(usize, &NonElementNode)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, c)| match c {
                XmlChild::NonElement(n) => Some((i, n)),
                _ => None,
            })
            .collect()
    }

    /// True iff this element has no element children (spec §4.4, §4.5:
    /// leaves are where value-diffing and the leaf-equality matching term
    /// apply).
    pub fn is_leaf(&self) -> bool {
        !self.children.iter().any(|c| matches!(c, XmlChild::Element(_)))
    }

    /// Concatenated text content, or `None` if this element has no text
    /// children at all (as opposed to empty text, which is `Some("")`).
    pub fn text_value(&self) -> Option<String> {
        let mut found = false;
        let mut buf = String::new();
        for c in &self.children {
            if let XmlChild::Text(t) = c {
                found = true;
                buf.push_str(t);
            }
        }
        found.then_some(buf)
    }

    pub fn attribute(&self, name: &QName, mode: NamespaceComparisonMode) -> Option<&XmlAttribute> {
        self.attributes.iter().find(|a| a.name.matches(name, mode))
    }
}
