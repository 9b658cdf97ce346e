//! Wire contract between the traced store and the page scanner
//!
//! Format (comment body, surrounding whitespace allowed):
//! CACHE_DEBUG:{"method":"get|set|delete","cid":"...","tags":[...]|null}
//!
//! An optional integer field `v` carries the contract version. Absent means 1.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Literal prefix identifying a trace comment
pub const MARKER: &str = "CACHE_DEBUG:";

/// Highest contract version this build understands
pub const WIRE_VERSION: u32 = 1;

/// Cache operation carried by a trace comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Set,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Set => "set",
            Method::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while decoding a comment that carries the marker
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("malformed trace payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unsupported wire version {found} (this build reads up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}

impl TraceError {
    /// Stable issue code used in lint output
    pub fn code(&self) -> &'static str {
        match self {
            TraceError::Malformed(_) => "MALFORMED_TRACE",
            TraceError::UnsupportedVersion { .. } => "UNSUPPORTED_VERSION",
        }
    }
}

/// Decoded JSON body of a trace comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracePayload {
    pub method: Method,

    pub cid: String,

    /// Present for set (possibly empty), null for get and delete
    #[serde(default)]
    pub tags: Option<Vec<String>>,

    /// Contract version, omitted for version 1
    #[serde(default, rename = "v", skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl TracePayload {
    pub fn new(method: Method, cid: impl Into<String>, tags: Option<Vec<String>>) -> Self {
        Self {
            method,
            cid: cid.into(),
            tags,
            version: None,
        }
    }

    /// Effective contract version
    pub fn version(&self) -> u32 {
        self.version.unwrap_or(1)
    }
}

/// Return the JSON body if `text` is a trace comment
pub fn strip_marker(text: &str) -> Option<&str> {
    text.trim().strip_prefix(MARKER)
}

/// Decode a comment body.
///
/// `Ok(None)` means the comment is not a trace comment at all. An error means it
/// carries the marker but the body cannot be used.
pub fn decode(text: &str) -> Result<Option<TracePayload>, TraceError> {
    let Some(body) = strip_marker(text) else {
        return Ok(None);
    };

    let payload: TracePayload = serde_json::from_str(body)?;
    if payload.version() > WIRE_VERSION {
        return Err(TraceError::UnsupportedVersion {
            found: payload.version(),
            supported: WIRE_VERSION,
        });
    }

    Ok(Some(payload))
}

/// Encode a payload as a comment body (`CACHE_DEBUG:{...}`).
///
/// `<` and `>` are written as JSON unicode escapes so a cid can never close the
/// surrounding comment.
pub fn encode(payload: &TracePayload) -> Result<String, TraceError> {
    let json = serde_json::to_string(payload)?;
    let json = json.replace('<', "\\u003c").replace('>', "\\u003e");
    Ok(format!("{}{}", MARKER, json))
}

/// Encode a payload as a full HTML comment
pub fn encode_comment(payload: &TracePayload) -> Result<String, TraceError> {
    Ok(format!("<!-- {} -->", encode(payload)?))
}
