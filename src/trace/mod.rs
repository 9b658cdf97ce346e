//! Trace module - Cache-operation records carried in HTML comments
//!
//! A traced store writes one comment per get/set/delete:
//! <!-- CACHE_DEBUG:{"method":"get","cid":"node:5:[lang]=en","tags":null} -->
//!
//! Provides:
//! - wire: the versioned JSON-in-comment contract (encode/decode)
//! - cid: decomposition of a cache id into keys and contexts
//! - record: TraceRecord, the parsed form of one comment

pub mod cid;
pub mod record;
pub mod wire;
