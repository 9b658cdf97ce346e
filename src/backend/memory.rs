//! In-memory cache bin

use std::collections::HashMap;

use crate::backend::{CacheBackend, CacheEntry, CacheError, CacheItem, CacheResult, Expire};

/// Clock returning unix seconds
pub type Clock = fn() -> i64;

fn system_clock() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Cache bin held in a `HashMap`, lost when dropped
pub struct MemoryBackend {
    bin: String,
    items: HashMap<String, CacheItem>,
    clock: Clock,
}

impl MemoryBackend {
    pub fn new(bin: impl Into<String>) -> Self {
        Self::with_clock(bin, system_clock)
    }

    pub fn with_clock(bin: impl Into<String>, clock: Clock) -> Self {
        Self {
            bin: bin.into(),
            items: HashMap::new(),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Item as callers see it: validity folds in expiry, invalid items are hidden
    /// unless asked for.
    fn prepare_item(&self, item: &CacheItem, allow_invalid: bool) -> Option<CacheItem> {
        let mut prepared = item.clone();
        prepared.valid = item.valid && !item.expire.is_expired((self.clock)());

        if !allow_invalid && !prepared.valid {
            return None;
        }
        Some(prepared)
    }
}

fn check_cid(cid: &str) -> CacheResult<()> {
    if cid.is_empty() {
        return Err(CacheError::InvalidCid(cid.to_string()));
    }
    Ok(())
}

impl CacheBackend for MemoryBackend {
    fn get(&self, cid: &str, allow_invalid: bool) -> CacheResult<Option<CacheItem>> {
        check_cid(cid)?;
        Ok(self
            .items
            .get(cid)
            .and_then(|item| self.prepare_item(item, allow_invalid)))
    }

    fn get_multiple(
        &self,
        cids: &mut Vec<String>,
        allow_invalid: bool,
    ) -> CacheResult<HashMap<String, CacheItem>> {
        let mut found = HashMap::new();
        for cid in cids.iter() {
            if let Some(item) = self
                .items
                .get(cid)
                .and_then(|item| self.prepare_item(item, allow_invalid))
            {
                found.insert(cid.clone(), item);
            }
        }
        cids.retain(|cid| !found.contains_key(cid));
        Ok(found)
    }

    fn set(
        &mut self,
        cid: &str,
        data: serde_json::Value,
        expire: Expire,
        tags: &[String],
    ) -> CacheResult<()> {
        check_cid(cid)?;

        let mut tags = tags.to_vec();
        tags.sort();
        tags.dedup();

        self.items.insert(
            cid.to_string(),
            CacheItem {
                cid: cid.to_string(),
                data,
                created: (self.clock)(),
                expire,
                tags,
                valid: true,
            },
        );
        Ok(())
    }

    fn set_multiple(&mut self, entries: Vec<CacheEntry>) -> CacheResult<()> {
        for entry in entries {
            self.set(&entry.cid, entry.data, entry.expire, &entry.tags)?;
        }
        Ok(())
    }

    fn delete(&mut self, cid: &str) -> CacheResult<()> {
        check_cid(cid)?;
        self.items.remove(cid);
        Ok(())
    }

    fn delete_multiple(&mut self, cids: &[String]) -> CacheResult<()> {
        for cid in cids {
            self.items.remove(cid);
        }
        Ok(())
    }

    fn delete_all(&mut self) -> CacheResult<()> {
        tracing::debug!(bin = %self.bin, items = self.len(), "deleting all items");
        self.items.clear();
        Ok(())
    }

    fn invalidate(&mut self, cid: &str) -> CacheResult<()> {
        check_cid(cid)?;
        if let Some(item) = self.items.get_mut(cid) {
            item.valid = false;
        }
        Ok(())
    }

    fn invalidate_multiple(&mut self, cids: &[String]) -> CacheResult<()> {
        for cid in cids {
            if let Some(item) = self.items.get_mut(cid) {
                item.valid = false;
            }
        }
        Ok(())
    }

    fn invalidate_all(&mut self) -> CacheResult<()> {
        for item in self.items.values_mut() {
            item.valid = false;
        }
        Ok(())
    }

    fn invalidate_tags(&mut self, tags: &[String]) -> CacheResult<()> {
        for item in self.items.values_mut() {
            if item.tags.iter().any(|t| tags.contains(t)) {
                item.valid = false;
            }
        }
        Ok(())
    }

    fn garbage_collection(&mut self) -> CacheResult<()> {
        let now = (self.clock)();
        self.items.retain(|_, item| !item.expire.is_expired(now));
        Ok(())
    }

    fn remove_bin(&mut self) -> CacheResult<()> {
        tracing::debug!(bin = %self.bin, items = self.len(), "removing bin");
        self.items.clear();
        Ok(())
    }
}
