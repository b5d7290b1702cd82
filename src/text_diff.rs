//! Word-level Text Diff (spec §4.3), used both for report rendering of
//! value diffs and, internally, as the diff engine's representation of
//! text-node changes.
//!
//! Grounded in the teacher's `diff3.rs`, which already wraps
//! `similar::TextDiff` for line-level diffing and walks
//! `iter_all_changes()` bucketing by `ChangeTag`. This module applies the
//! same idiom one level down, over word/punctuation tokens instead of
//! lines.

use similar::{ChangeTag, TextDiff};

/// A token's change status relative to the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenDiffType {
    Unchanged,
    Added,
    Deleted,
}

/// One token and its change status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDiff {
    pub token: String,
    pub diff_type: TokenDiffType,
}

/// Split `text` into words and punctuation, discarding empty tokens
/// (spec §4.3: tokenize on `(\s+|[.,;!?:])`, keeping delimiters as
/// separate tokens). A run of consecutive whitespace is a single token
/// (the `\s+` quantifier); punctuation delimiters are single characters
/// (no `+` in that branch of the alternation).
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut whitespace_run = String::new();

    for c in text.chars() {
        if c.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            whitespace_run.push(c);
        } else {
            if !whitespace_run.is_empty() {
                tokens.push(std::mem::take(&mut whitespace_run));
            }
            if matches!(c, '.' | ',' | ';' | '!' | '?' | ':') {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            } else {
                current.push(c);
            }
        }
    }
    if !whitespace_run.is_empty() {
        tokens.push(whitespace_run);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Compute a flat, linear word-level diff between `old` and `new` (spec
/// §4.3). Tokens in `old` preceding the next matched token are `Deleted`;
/// tokens in `new` preceding it are `Added`; matched tokens are
/// `Unchanged`.
pub fn get_diffs(old: &str, new: &str) -> Vec<TokenDiff> {
    let old_tokens = tokenize(old);
    let new_tokens = tokenize(new);

    let diff = TextDiff::from_slices(&old_tokens, &new_tokens);

    diff.iter_all_changes()
        .map(|change| {
            let diff_type = match change.tag() {
                ChangeTag::Equal => TokenDiffType::Unchanged,
                ChangeTag::Delete => TokenDiffType::Deleted,
                ChangeTag::Insert => TokenDiffType::Added,
            };
            TokenDiff {
                token: change.value().to_string(),
                diff_type,
            }
        })
        .collect()
}

/// Reconstruct the tokenization of `old` from a diff (spec §8 invariant
/// 5): concatenate tokens tagged `Unchanged | Deleted`, in order.
pub fn reconstruct_old(diffs: &[TokenDiff]) -> String {
    diffs
        .iter()
        .filter(|d| d.diff_type != TokenDiffType::Added)
        .map(|d| d.token.as_str())
        .collect()
}

/// Reconstruct the tokenization of `new` from a diff (spec §8 invariant
/// 5): concatenate tokens tagged `Unchanged | Added`, in order.
pub fn reconstruct_new(diffs: &[TokenDiff]) -> String {
    diffs
        .iter()
        .filter(|d| d.diff_type != TokenDiffType::Deleted)
        .map(|d| d.token.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_words_and_punctuation() {
        let tokens = tokenize("Hello, world!");
        assert_eq!(tokens, vec!["Hello", ",", " ", "world", "!"]);
    }

    #[test]
    fn collapses_whitespace_runs_into_one_token() {
        let tokens = tokenize("a  b");
        assert_eq!(tokens, vec!["a", "  ", "b"]);
    }

    #[test]
    fn identical_strings_are_all_unchanged() {
        let diffs = get_diffs("hello world", "hello world");
        assert!(diffs.iter().all(|d| d.diff_type == TokenDiffType::Unchanged));
    }

    #[test]
    fn detects_word_substitution() {
        let diffs = get_diffs("the quick fox", "the slow fox");
        let added: Vec<_> = diffs
            .iter()
            .filter(|d| d.diff_type == TokenDiffType::Added)
            .map(|d| d.token.as_str())
            .collect();
        let deleted: Vec<_> = diffs
            .iter()
            .filter(|d| d.diff_type == TokenDiffType::Deleted)
            .map(|d| d.token.as_str())
            .collect();
        assert_eq!(added, vec!["slow"]);
        assert_eq!(deleted, vec!["quick"]);
    }

    #[test]
    fn reconstructs_both_sides() {
        let old = "the quick brown fox";
        let new = "the slow brown fox jumps";
        let diffs = get_diffs(old, new);
        assert_eq!(reconstruct_old(&diffs), tokenize(old).concat());
        assert_eq!(reconstruct_new(&diffs), tokenize(new).concat());
    }
}
