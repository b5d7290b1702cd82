//! Semantic XML diffing and three-way merge.
//!
//! This crate treats XML as a tree of logical elements rather than a
//! byte stream: it matches elements across two revisions by name, key
//! attributes, and structural similarity (not line position), produces a
//! hierarchical [`diff::DiffMatch`] tree, and combines two independently
//! modified revisions of a common ancestor with [`merge::merge`].
//!
//! Parsing XML text into the [`node::XmlElement`] tree, and serializing a
//! merged tree back to text, are out of scope — the engine operates
//! entirely on the in-memory DOM a caller hands it.

pub mod config;
pub mod diff;
pub mod error;
pub mod lcs;
pub mod matching;
pub mod merge;
pub mod node;
pub mod normalize;
pub mod path;
pub mod text_diff;

pub use config::{NamespaceComparisonMode, NodePreservationMode, NodePreservationSettings, ValueNormalizer, XmlDiffConfig, XmlDiffConfigBuilder};
pub use diff::{diff, diff_with_strategy, AttributeDiff, DiffMatch, DiffType, NonElementDiff, ValueDiff};
pub use error::{Result, XmlDiffError};
pub use matching::{DefaultMatchingStrategy, MatchingStrategy};
pub use merge::{
    merge, merge_with_strategy, AutoMergeResolver, BaseResolver, ConflictResolver, ConflictType, MergeConflict, MergeError, MergeResult, MergeStatistics,
    OursResolver, ResolverOutcome, TheirsResolver,
};
pub use node::{NonElementNode, QName, XmlAttribute, XmlChild, XmlElement};
