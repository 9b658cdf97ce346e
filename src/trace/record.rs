//! Trace records recovered from comments

use serde::{Deserialize, Serialize};

use crate::trace::cid::decompose;
use crate::trace::wire::{decode, Method, TraceError, TracePayload};

/// One cache operation observed on one element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub method: Method,

    /// Full cid as emitted by the store
    pub raw_id: String,

    /// Plain cid segments, left to right
    pub keys: Vec<String>,

    /// Bracketed context segments, left to right
    pub contexts: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl TraceRecord {
    /// Build a record from a decoded payload
    pub fn from_payload(payload: TracePayload) -> Self {
        let id = decompose(&payload.cid);
        Self {
            method: payload.method,
            raw_id: payload.cid,
            keys: id.keys,
            contexts: id.contexts,
            tags: payload.tags,
        }
    }

    /// Parse one comment's text.
    ///
    /// Returns `Ok(None)` for comments that are not trace comments.
    pub fn parse_comment(text: &str) -> Result<Option<Self>, TraceError> {
        Ok(decode(text)?.map(Self::from_payload))
    }

    /// Keys joined with `:`, the form used in element summaries
    pub fn joined_keys(&self) -> String {
        self.keys.join(":")
    }
}
