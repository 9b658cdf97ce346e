//! Cache id decomposition
//!
//! A cid is colon-delimited. Segments shaped `[name]=value` are contexts,
//! everything else non-empty is a key. A segment that opens with `[` runs at
//! least to the matching `]`, so context names may contain colons:
//! `entity_view:block:[languages:language_interface]=en` has one context.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Shape of a context segment: `[<no ']'>]=<no ':'>`
pub static CONTEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[[^\]]*\]=[^:]*$").expect("Invalid CONTEXT_RE regex"));

/// A cid split into its key and context segments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheId {
    /// Plain segments, left to right
    pub keys: Vec<String>,

    /// Bracketed context segments, left to right
    pub contexts: Vec<String>,
}

/// Whether a single segment is a context segment
pub fn is_context_segment(segment: &str) -> bool {
    CONTEXT_RE.is_match(segment)
}

/// Decompose a raw cid into keys and contexts
pub fn decompose(cid: &str) -> CacheId {
    let mut id = CacheId::default();

    for segment in split_segments(cid) {
        if is_context_segment(segment) {
            id.contexts.push(segment.to_string());
        } else {
            id.keys.push(segment.to_string());
        }
    }

    id
}

/// Split on `:` outside brackets, dropping empty segments
fn split_segments(cid: &str) -> Vec<&str> {
    let bytes = cid.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if i == start && bytes[i] == b'[' {
            // Unclosed brackets fall through to a plain split
            if let Some(close) = cid[i..].find(']') {
                i += close + 1;
                continue;
            }
        }
        if bytes[i] == b':' {
            segments.push(&cid[start..i]);
            start = i + 1;
        }
        i += 1;
    }
    segments.push(&cid[start..]);

    segments.into_iter().filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decompose_mixed() {
        let id = decompose("node:5:[langcode]=en:view");
        assert_eq!(id.keys, vec!["node", "5", "view"]);
        assert_eq!(id.contexts, vec!["[langcode]=en"]);
    }

    #[test]
    fn test_decompose_context_between_keys() {
        let id = decompose("a:[x]=1:b:c");
        assert_eq!(id.keys, vec!["a", "b", "c"]);
        assert_eq!(id.contexts, vec!["[x]=1"]);
        assert_eq!(id.keys.join(":"), "a:b:c");
    }

    #[test]
    fn test_decompose_context_name_with_colon() {
        let id = decompose("entity_view:block:bartik_branding:[languages:language_interface]=en:[theme]=bartik");
        assert_eq!(id.keys, vec!["entity_view", "block", "bartik_branding"]);
        assert_eq!(
            id.contexts,
            vec!["[languages:language_interface]=en", "[theme]=bartik"]
        );
    }

    #[test]
    fn test_decompose_drops_empty_segments() {
        let id = decompose(":a::b:");
        assert_eq!(id.keys, vec!["a", "b"]);
        assert!(id.contexts.is_empty());
        assert!(decompose("").keys.is_empty());
        assert!(decompose(":::").keys.is_empty());
    }

    #[test]
    fn test_decompose_empty_context_value() {
        let id = decompose("k:[user.roles]=");
        assert_eq!(id.keys, vec!["k"]);
        assert_eq!(id.contexts, vec!["[user.roles]="]);
    }

    #[test]
    fn test_decompose_bracket_without_value_is_key() {
        let id = decompose("k:[x]:y");
        assert_eq!(id.keys, vec!["k", "[x]", "y"]);
        assert!(id.contexts.is_empty());
    }

    #[test]
    fn test_decompose_unclosed_bracket_splits_plainly() {
        let id = decompose("a:[b:c");
        assert_eq!(id.keys, vec!["a", "[b", "c"]);
    }

    #[test]
    fn test_is_context_segment() {
        assert!(is_context_segment("[user]=42"));
        assert!(!is_context_segment("user=42"));
        assert!(!is_context_segment("[user]"));
        assert!(!is_context_segment("[a]b]=1"));
    }

    fn plain_segment() -> impl Strategy<Value = String> {
        "[a-z0-9_.]{1,8}"
    }

    fn context_segment() -> impl Strategy<Value = String> {
        ("[a-z_.]{1,8}", "[a-z0-9]{0,4}").prop_map(|(name, value)| format!("[{}]={}", name, value))
    }

    fn segments() -> impl Strategy<Value = Vec<(bool, String)>> {
        prop::collection::vec(
            prop_oneof![
                plain_segment().prop_map(|s| (false, s)),
                context_segment().prop_map(|s| (true, s)),
            ],
            0..10,
        )
    }

    proptest! {
        #[test]
        fn prop_keys_and_contexts_keep_order(parts in segments()) {
            let cid = parts.iter().map(|(_, s)| s.as_str()).collect::<Vec<_>>().join(":");
            let id = decompose(&cid);

            let expected_keys: Vec<String> =
                parts.iter().filter(|(ctx, _)| !ctx).map(|(_, s)| s.clone()).collect();
            let expected_contexts: Vec<String> =
                parts.iter().filter(|(ctx, _)| *ctx).map(|(_, s)| s.clone()).collect();

            prop_assert_eq!(id.keys.join(":"), expected_keys.join(":"));
            prop_assert_eq!(id.keys, expected_keys);
            prop_assert_eq!(id.contexts, expected_contexts);
        }

        #[test]
        fn prop_reparse_of_joined_keys_is_stable(parts in segments()) {
            let cid = parts.iter().map(|(_, s)| s.as_str()).collect::<Vec<_>>().join(":");
            let first = decompose(&cid);
            let second = decompose(&first.keys.join(":"));

            prop_assert_eq!(&second.keys, &first.keys);
            prop_assert!(second.contexts.is_empty());
        }
    }
}
