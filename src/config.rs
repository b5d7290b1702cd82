//! Comparison configuration (spec §3, §6).

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// How element/attribute names are compared across namespaces (spec §4.4, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamespaceComparisonMode {
    /// Namespace URI and local name must both match.
    Strict,
    /// URI and local name must match; the prefix used to write the URI is
    /// irrelevant (this is ordinary XML equality).
    IgnorePrefix,
    /// Only the local name must match; namespace is ignored entirely.
    IgnoreNamespace,
}

impl Default for NamespaceComparisonMode {
    fn default() -> Self {
        NamespaceComparisonMode::IgnorePrefix
    }
}

/// Which non-element node kinds are tracked in the diff (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodePreservationMode {
    /// Comments, CDATA sections, and processing instructions are ignored.
    None,
    PreserveAll,
    CommentsOnly,
    CDataOnly,
    ProcessingInstructionsOnly,
}

impl Default for NodePreservationMode {
    fn default() -> Self {
        NodePreservationMode::None
    }
}

/// Settings that refine [`NodePreservationMode`] (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodePreservationSettings {
    pub mode: NodePreservationMode,
    /// If true, a comment moving to a different position among its
    /// siblings is `Modified`; if false, only content/presence matters.
    #[serde(default = "default_true")]
    pub track_comment_position: bool,
    /// If true, CDATA contents go through the same normalization pipeline
    /// as element text before comparison.
    #[serde(default)]
    pub normalize_cdata_whitespace: bool,
    /// If set, only processing instructions whose target is in this list
    /// are preserved/compared.
    #[serde(default)]
    pub preserve_pi_targets: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub case_sensitive_pi_targets: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NodePreservationSettings {
    fn default() -> Self {
        Self {
            mode: NodePreservationMode::None,
            track_comment_position: true,
            normalize_cdata_whitespace: false,
            preserve_pi_targets: None,
            case_sensitive_pi_targets: true,
        }
    }
}

/// A user-supplied value normalizer, applied after the built-ins in
/// registration order (spec §4.1). Must be null-safe and idempotent.
///
/// Registration plumbing (how a host discovers/loads these) is out of
/// scope per spec §1; this crate only specifies the contract and lets
/// callers build the chain directly via [`XmlDiffConfigBuilder::with_normalizer`].
pub trait ValueNormalizer: Send + Sync {
    fn normalize(&self, value: Option<&str>) -> Option<String>;
}

impl<F> ValueNormalizer for F
where
    F: Fn(Option<&str>) -> Option<String> + Send + Sync,
{
    fn normalize(&self, value: Option<&str>) -> Option<String> {
        self(value)
    }
}

/// Comparison configuration (spec §3). Immutable once built; safe to
/// share across concurrent `diff`/`merge` calls (spec §5).
#[derive(Clone, Serialize, Deserialize)]
pub struct XmlDiffConfig {
    #[serde(default)]
    pub ignore_whitespace: bool,
    #[serde(default)]
    pub ignore_newlines: bool,
    #[serde(default)]
    pub trim_values: bool,
    #[serde(default)]
    pub ignore_case: bool,
    #[serde(default)]
    pub ignore_values: bool,
    /// Must be true for correct semantics (spec §3); kept explicit rather
    /// than implied so callers can see the contract even though this
    /// engine always treats attribute sets as order-independent.
    #[serde(default = "default_true")]
    pub ignore_attribute_order: bool,
    #[serde(default)]
    pub key_attribute_names: Vec<String>,
    #[serde(default)]
    pub excluded_attribute_names: HashSet<String>,
    #[serde(default)]
    pub namespace_comparison_mode: NamespaceComparisonMode,
    #[serde(default)]
    pub node_preservation: NodePreservationSettings,
    /// Ordered chain of user normalizers, applied after built-ins.
    /// Not serializable (closures/trait objects); always empty when a
    /// config is deserialized — hosts re-register normalizers in code.
    #[serde(skip)]
    pub value_normalizers: Vec<Arc<dyn ValueNormalizer>>,
}

impl fmt::Debug for XmlDiffConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlDiffConfig")
            .field("ignore_whitespace", &self.ignore_whitespace)
            .field("ignore_newlines", &self.ignore_newlines)
            .field("trim_values", &self.trim_values)
            .field("ignore_case", &self.ignore_case)
            .field("ignore_values", &self.ignore_values)
            .field("ignore_attribute_order", &self.ignore_attribute_order)
            .field("key_attribute_names", &self.key_attribute_names)
            .field("excluded_attribute_names", &self.excluded_attribute_names)
            .field("namespace_comparison_mode", &self.namespace_comparison_mode)
            .field("node_preservation", &self.node_preservation)
            .field("value_normalizers", &self.value_normalizers.len())
            .finish()
    }
}

impl Default for XmlDiffConfig {
    fn default() -> Self {
        Self {
            ignore_whitespace: false,
            ignore_newlines: false,
            trim_values: false,
            ignore_case: false,
            ignore_values: false,
            ignore_attribute_order: true,
            key_attribute_names: Vec::new(),
            excluded_attribute_names: HashSet::new(),
            namespace_comparison_mode: NamespaceComparisonMode::default(),
            node_preservation: NodePreservationSettings::default(),
            value_normalizers: Vec::new(),
        }
    }
}

impl XmlDiffConfig {
    pub fn builder() -> XmlDiffConfigBuilder {
        XmlDiffConfigBuilder::default()
    }

    pub fn is_key_attribute(&self, name: &str) -> bool {
        self.key_attribute_names.iter().any(|k| k == name)
    }

    pub fn is_excluded_attribute(&self, name: &str) -> bool {
        self.excluded_attribute_names.contains(name)
    }

    /// Rejects contradictory settings before a `diff`/`merge` call walks a
    /// single node. Currently checks for a `key_attribute_names` entry that
    /// also appears in `excluded_attribute_names` — such an attribute would
    /// need to be both read for matching and dropped from comparison at the
    /// same time, which has no sensible resolution.
    pub fn validate(&self) -> crate::error::Result<()> {
        if let Some(name) = self.key_attribute_names.iter().find(|k| self.excluded_attribute_names.contains(k.as_str())) {
            return Err(crate::error::XmlDiffError::ConfigurationError {
                offending: name.clone(),
                message: "listed in both key_attribute_names and excluded_attribute_names".to_string(),
            });
        }
        Ok(())
    }
}

/// Ergonomic builder for [`XmlDiffConfig`] (spec §9 design note).
#[derive(Default)]
pub struct XmlDiffConfigBuilder {
    config: XmlDiffConfig,
}

impl XmlDiffConfigBuilder {
    pub fn ignore_whitespace(mut self, value: bool) -> Self {
        self.config.ignore_whitespace = value;
        self
    }

    pub fn ignore_newlines(mut self, value: bool) -> Self {
        self.config.ignore_newlines = value;
        self
    }

    pub fn trim_values(mut self, value: bool) -> Self {
        self.config.trim_values = value;
        self
    }

    pub fn ignore_case(mut self, value: bool) -> Self {
        self.config.ignore_case = value;
        self
    }

    pub fn ignore_values(mut self, value: bool) -> Self {
        self.config.ignore_values = value;
        self
    }

    pub fn key_attribute_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.key_attribute_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn excluded_attribute_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.excluded_attribute_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn namespace_comparison_mode(mut self, mode: NamespaceComparisonMode) -> Self {
        self.config.namespace_comparison_mode = mode;
        self
    }

    pub fn node_preservation(mut self, settings: NodePreservationSettings) -> Self {
        self.config.node_preservation = settings;
        self
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn ValueNormalizer>) -> Self {
        self.config.value_normalizers.push(normalizer);
        self
    }

    pub fn build(self) -> XmlDiffConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_ignores_attribute_order() {
        assert!(XmlDiffConfig::default().ignore_attribute_order);
    }

    #[test]
    fn builder_sets_key_attributes() {
        let config = XmlDiffConfig::builder()
            .key_attribute_names(["id"])
            .trim_values(true)
            .build();
        assert!(config.is_key_attribute("id"));
        assert!(config.trim_values);
    }

    #[test]
    fn validate_rejects_key_excluded_collision() {
        let config = XmlDiffConfig::builder()
            .key_attribute_names(["id"])
            .excluded_attribute_names(["id"])
            .build();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, crate::error::XmlDiffError::ConfigurationError { offending, .. } if offending == "id"));
    }

    #[test]
    fn validate_accepts_disjoint_key_and_excluded_names() {
        let config = XmlDiffConfig::builder()
            .key_attribute_names(["id"])
            .excluded_attribute_names(["xmlns"])
            .build();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = XmlDiffConfig::builder()
            .ignore_whitespace(true)
            .excluded_attribute_names(["xmlns"])
            .build();
        let json = serde_json::to_string(&config).unwrap();
        let restored: XmlDiffConfig = serde_json::from_str(&json).unwrap();
        assert!(restored.ignore_whitespace);
        assert!(restored.is_excluded_attribute("xmlns"));
        assert!(restored.value_normalizers.is_empty());
    }
}
