//! Tracing decorator for cache bins
//!
//! Every get/set/delete writes one trace comment to the render output before
//! the call is delegated. The comment is a pure side channel: write failures
//! are logged and dropped, and the wrapped store's result is returned untouched.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::backend::memory::MemoryBackend;
use crate::backend::{CacheBackend, CacheEntry, CacheItem, CacheResult, Expire};
use crate::trace::wire::{encode_comment, Method, TracePayload};

/// Render output shared by every traced bin of one page render
pub type RenderOutput = Rc<RefCell<dyn Write>>;

/// Cache bin decorator that annotates the render output
pub struct DebugBackend<B: CacheBackend = MemoryBackend> {
    inner: B,
    output: RenderOutput,
}

impl<B: CacheBackend> DebugBackend<B> {
    pub fn new(inner: B, output: RenderOutput) -> Self {
        Self { inner, output }
    }

    #[cfg(test)]
    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn emit(&self, method: Method, cid: &str, tags: Option<&[String]>) {
        let payload = TracePayload::new(method, cid, tags.map(|t| t.to_vec()));
        let comment = match encode_comment(&payload) {
            Ok(comment) => comment,
            Err(e) => {
                tracing::warn!(%method, cid, error = %e, "failed to encode trace comment");
                return;
            }
        };

        let Ok(mut output) = self.output.try_borrow_mut() else {
            tracing::warn!(%method, cid, "render output busy, trace comment dropped");
            return;
        };
        if let Err(e) = output.write_all(comment.as_bytes()) {
            tracing::warn!(%method, cid, error = %e, "failed to write trace comment");
        }
    }
}

impl<B: CacheBackend> CacheBackend for DebugBackend<B> {
    fn get(&self, cid: &str, allow_invalid: bool) -> CacheResult<Option<CacheItem>> {
        self.emit(Method::Get, cid, None);
        self.inner.get(cid, allow_invalid)
    }

    fn get_multiple(
        &self,
        cids: &mut Vec<String>,
        allow_invalid: bool,
    ) -> CacheResult<HashMap<String, CacheItem>> {
        self.inner.get_multiple(cids, allow_invalid)
    }

    fn set(
        &mut self,
        cid: &str,
        data: serde_json::Value,
        expire: Expire,
        tags: &[String],
    ) -> CacheResult<()> {
        self.emit(Method::Set, cid, Some(tags));
        self.inner.set(cid, data, expire, tags)
    }

    fn set_multiple(&mut self, entries: Vec<CacheEntry>) -> CacheResult<()> {
        self.inner.set_multiple(entries)
    }

    fn delete(&mut self, cid: &str) -> CacheResult<()> {
        self.emit(Method::Delete, cid, None);
        self.inner.delete(cid)
    }

    fn delete_multiple(&mut self, cids: &[String]) -> CacheResult<()> {
        self.inner.delete_multiple(cids)
    }

    fn delete_all(&mut self) -> CacheResult<()> {
        self.inner.delete_all()
    }

    fn invalidate(&mut self, cid: &str) -> CacheResult<()> {
        self.inner.invalidate(cid)
    }

    fn invalidate_multiple(&mut self, cids: &[String]) -> CacheResult<()> {
        self.inner.invalidate_multiple(cids)
    }

    fn invalidate_all(&mut self) -> CacheResult<()> {
        self.inner.invalidate_all()
    }

    fn invalidate_tags(&mut self, tags: &[String]) -> CacheResult<()> {
        self.inner.invalidate_tags(tags)
    }

    fn garbage_collection(&mut self) -> CacheResult<()> {
        self.inner.garbage_collection()
    }

    fn remove_bin(&mut self) -> CacheResult<()> {
        self.inner.remove_bin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CacheError;
    use serde_json::json;

    fn buffer() -> Rc<RefCell<Vec<u8>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn traced(buf: &Rc<RefCell<Vec<u8>>>) -> DebugBackend {
        let output: RenderOutput = buf.clone();
        DebugBackend::new(MemoryBackend::new("render"), output)
    }

    fn written(buf: &Rc<RefCell<Vec<u8>>>) -> String {
        String::from_utf8(buf.borrow().clone()).unwrap()
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_emits_in_execution_order() {
        let buf = buffer();
        let mut cache = traced(&buf);

        assert!(cache.get("node:5", false).unwrap().is_none());
        cache
            .set("node:5", json!("body"), Expire::Permanent, &["node:5".to_string()])
            .unwrap();
        cache.delete("node:5").unwrap();

        assert_eq!(
            written(&buf),
            concat!(
                r#"<!-- CACHE_DEBUG:{"method":"get","cid":"node:5","tags":null} -->"#,
                r#"<!-- CACHE_DEBUG:{"method":"set","cid":"node:5","tags":["node:5"]} -->"#,
                r#"<!-- CACHE_DEBUG:{"method":"delete","cid":"node:5","tags":null} -->"#,
            )
        );
    }

    #[test]
    fn test_set_without_tags_emits_empty_list() {
        let buf = buffer();
        let mut cache = traced(&buf);
        cache.set("a", json!(1), Expire::Permanent, &[]).unwrap();
        assert!(written(&buf).contains(r#""tags":[]"#));
    }

    #[test]
    fn test_results_pass_through() {
        let buf = buffer();
        let mut cache = traced(&buf);
        cache.set("a", json!(42), Expire::Permanent, &[]).unwrap();
        assert_eq!(cache.get("a", false).unwrap().unwrap().data, json!(42));
        assert_eq!(cache.inner().len(), 1);
    }

    #[test]
    fn test_errors_pass_through_after_emitting() {
        let buf = buffer();
        let cache = traced(&buf);
        assert!(matches!(cache.get("", false), Err(CacheError::InvalidCid(_))));
        assert!(written(&buf).contains(r#""cid":"""#));
    }

    #[test]
    fn test_write_failure_does_not_change_result() {
        let output: RenderOutput = Rc::new(RefCell::new(FailingWriter));
        let mut cache = DebugBackend::new(MemoryBackend::new("render"), output);

        cache.set("a", json!(1), Expire::Permanent, &[]).unwrap();
        assert!(cache.get("a", false).unwrap().is_some());
    }

    #[test]
    fn test_untraced_operations_emit_nothing() {
        let buf = buffer();
        let mut cache = traced(&buf);
        let mut cids = vec!["a".to_string()];
        cache.get_multiple(&mut cids, false).unwrap();
        cache.invalidate_tags(&["x".to_string()]).unwrap();
        cache.garbage_collection().unwrap();
        assert!(written(&buf).is_empty());
    }
}
